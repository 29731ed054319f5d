//! Estimated VAT derivation.
//!
//! The portal list does not expose tax amounts, so VAT is estimated from the
//! gross total with a fixed assumed rate (14% by default). Downstream
//! consumers rely on this approximation; it is not a tax computation.

use rust_decimal::Decimal;

use super::amounts::{format_amount, parse_amount};

/// Gross total split into estimated VAT and net value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrossSplit {
    pub vat: String,
    pub net: String,
}

/// VAT estimator for a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatEstimator {
    rate: Decimal,
}

impl VatEstimator {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// VAT contained in a gross amount: `gross × rate / (1 + rate)`.
    pub fn vat_of(&self, gross: Decimal) -> Option<Decimal> {
        gross
            .checked_mul(self.rate)?
            .checked_div(Decimal::ONE + self.rate)
    }

    /// Split a gross total into VAT and net, both with two decimals.
    ///
    /// Net is computed from the rounded VAT. Returns `None` when the total
    /// does not parse or is not positive.
    pub fn split_gross(&self, total: &str) -> Option<GrossSplit> {
        let gross = parse_amount(total).filter(|g| *g > Decimal::ZERO)?;
        let vat = format_amount(self.vat_of(gross)?);
        let net = gross.checked_sub(parse_amount(&vat)?)?;
        Some(GrossSplit {
            vat,
            net: format_amount(net),
        })
    }

    /// VAT of an amount as text; unparseable amounts count as zero.
    pub fn vat_text(&self, amount: &str) -> String {
        let value = parse_amount(amount).unwrap_or_default();
        format_amount(self.vat_of(value).unwrap_or_default())
    }

    /// Amount plus its estimated VAT, as text.
    pub fn with_vat_text(&self, amount: &str) -> String {
        let value = parse_amount(amount).unwrap_or_default();
        let vat = parse_amount(&self.vat_text(amount)).unwrap_or_default();
        format_amount(value + vat)
    }
}

impl Default for VatEstimator {
    fn default() -> Self {
        Self::new(Decimal::new(14, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_gross() {
        let vat = VatEstimator::default();
        assert_eq!(
            vat.split_gross("500.00"),
            Some(GrossSplit {
                vat: "61.40".to_string(),
                net: "438.60".to_string(),
            })
        );
        assert_eq!(
            vat.split_gross("1,140.00"),
            Some(GrossSplit {
                vat: "140.00".to_string(),
                net: "1000.00".to_string(),
            })
        );
    }

    #[test]
    fn test_split_gross_is_idempotent() {
        let vat = VatEstimator::default();
        let first = vat.split_gross("2,345.67");
        assert_eq!(first, vat.split_gross("2,345.67"));
        let split = first.unwrap();
        let vat_part = parse_amount(&split.vat).unwrap();
        let net_part = parse_amount(&split.net).unwrap();
        assert_eq!(vat_part + net_part, parse_amount("2345.67").unwrap());
    }

    #[test]
    fn test_no_split_for_zero_or_missing() {
        let vat = VatEstimator::default();
        assert_eq!(vat.split_gross("0"), None);
        assert_eq!(vat.split_gross("0.00"), None);
        assert_eq!(vat.split_gross(""), None);
        assert_eq!(vat.split_gross("n/a"), None);
    }

    #[test]
    fn test_vat_text() {
        let vat = VatEstimator::default();
        assert_eq!(vat.vat_text("500.00"), "61.40");
        assert_eq!(vat.vat_text(""), "0.00");
        assert_eq!(vat.with_vat_text("100"), "112.28");
    }

    #[test]
    fn test_custom_rate() {
        let vat = VatEstimator::new(Decimal::new(10, 2));
        assert_eq!(vat.vat_text("110"), "10.00");
    }
}
