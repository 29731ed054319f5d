//! Amount parsing and formatting for portal values.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use super::FieldExtractor;
use super::patterns::LEADING_DECIMAL;
use crate::surface::{Element, probe_text};

/// Parse a portal amount such as `"1,234.50"` or `"1,234.50 EGP"`.
///
/// Thousands separators are removed and the leading number is taken;
/// trailing text is ignored. Returns `None` when no number leads the text.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let cleaned = text.replace(',', "");
    let caps = LEADING_DECIMAL.captures(&cleaned)?;
    let number = caps[1].trim_end_matches('.');
    Decimal::from_str(number).ok()
}

/// Format with exactly two decimals, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Split amount text into `(amount, currency)`.
///
/// The first currency token contained in the text is removed and reported;
/// without one, the text is the amount and `default_currency` applies.
pub fn split_currency(text: &str, tokens: &[String], default_currency: &str) -> (String, String) {
    match tokens.iter().find(|token| !token.is_empty() && text.contains(token.as_str())) {
        Some(token) => (
            text.replace(token.as_str(), "").trim().to_string(),
            token.clone(),
        ),
        None => (text.to_string(), default_currency.to_string()),
    }
}

/// Amount text of a cell together with its currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAmount {
    pub amount: String,
    pub currency: String,
}

/// Reads the amount cell: primary text, currency token stripped.
pub struct AmountExtractor<'a> {
    probes: &'a [String],
    tokens: &'a [String],
    default_currency: &'a str,
}

impl<'a> AmountExtractor<'a> {
    pub fn new(probes: &'a [String], tokens: &'a [String], default_currency: &'a str) -> Self {
        Self {
            probes,
            tokens,
            default_currency,
        }
    }
}

impl FieldExtractor for AmountExtractor<'_> {
    type Output = CellAmount;

    fn extract<E: Element>(&self, cell: &E) -> Option<CellAmount> {
        let text = probe_text(cell, self.probes)?;
        let (amount, currency) = split_currency(&text, self.tokens, self.default_currency);
        Some(CellAmount { amount, currency })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount(" 500.00 EGP"), Some(dec("500.00")));
        assert_eq!(parse_amount("12,345,678"), Some(dec("12345678")));
        assert_eq!(parse_amount("7."), Some(dec("7")));
        assert_eq!(parse_amount("-3.5"), Some(dec("-3.5")));
        assert_eq!(parse_amount("EGP 10"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("61.4035087")), "61.40");
        assert_eq!(format_amount(dec("0.005")), "0.01");
        assert_eq!(format_amount(dec("1000")), "1000.00");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_amount_cell() {
        use crate::surface::{HtmlSnapshot, Surface};

        let doc = HtmlSnapshot::parse(
            r#"<div class="cell"><span class="griCellTitleGray"> 1,140.00 EGP </span></div>
               <div class="cell"><span class="other">x</span></div>"#,
        );
        let probes = vec![".griCellTitleGray".to_string()];
        let tokens = vec!["EGP".to_string()];
        let extractor = AmountExtractor::new(&probes, &tokens, "EGP");

        let cells = doc.select(".cell");
        assert_eq!(
            extractor.extract(&cells[0]),
            Some(CellAmount {
                amount: "1,140.00".to_string(),
                currency: "EGP".to_string(),
            })
        );
        assert_eq!(extractor.extract(&cells[1]), None);
    }

    #[test]
    fn test_split_currency() {
        let tokens = vec!["EGP".to_string()];
        assert_eq!(
            split_currency("1,140.00 EGP", &tokens, "EGP"),
            ("1,140.00".to_string(), "EGP".to_string())
        );
        assert_eq!(
            split_currency("250.00", &tokens, "EGP"),
            ("250.00".to_string(), "EGP".to_string())
        );

        let tokens = vec!["USD".to_string(), "EGP".to_string()];
        assert_eq!(
            split_currency("USD 99.10", &tokens, "EGP"),
            ("99.10".to_string(), "USD".to_string())
        );
    }
}
