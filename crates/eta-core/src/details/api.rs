//! Structured document endpoint.

use std::future::Future;

use serde::Deserialize;
use serde_json::Value;

use crate::error::RemoteError;
use crate::invoice::LineItemFactory;
use crate::models::invoice::LineItem;

/// Fetches the portal's structured document for an invoice.
///
/// Implementations send `Accept: application/json` and
/// `X-Requested-With: XMLHttpRequest` with the session's credentials.
pub trait DetailApi {
    fn fetch_document(&self, url: &str) -> impl Future<Output = Result<DocumentResponse, RemoteError>>;
}

/// The parts of a document response the resolver reads.
///
/// Amounts arrive as strings or numbers depending on the portal version,
/// so they are kept as raw JSON values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentResponse {
    pub invoice_lines: Option<Vec<DocumentLine>>,
    pub total_amount: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentLine {
    pub description: Option<Value>,
    pub item_name: Option<Value>,
    pub unit_type: Option<UnitType>,
    pub quantity: Option<Value>,
    pub unit_value: Option<UnitValue>,
    pub sales_total: Option<Value>,
    pub tax_totals: Option<Vec<TaxTotal>>,
    pub net_total: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnitType {
    pub code: Option<Value>,
    pub name: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnitValue {
    pub amount: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxTotal {
    pub tax_type: Option<String>,
    pub amount: Option<Value>,
}

/// Tax type of the value-added tax in the portal's tax breakdown.
const VAT_TAX_TYPE: &str = "T1";

/// Text of a JSON value; empty strings, zero, `false` and `null` count as
/// missing.
fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

impl DocumentResponse {
    /// Map the response to line items.
    ///
    /// Without lines, a non-empty `totalAmount` yields a single summary
    /// item.
    pub fn line_items(&self, factory: &LineItemFactory) -> Vec<LineItem> {
        let items: Vec<LineItem> = self
            .invoice_lines
            .iter()
            .flatten()
            .map(|line| line.to_line_item(factory))
            .collect();
        if !items.is_empty() {
            return items;
        }

        match value_text(self.total_amount.as_ref()) {
            Some(total) => vec![factory.summary(&total)],
            None => Vec::new(),
        }
    }
}

impl DocumentLine {
    fn to_line_item(&self, factory: &LineItemFactory) -> LineItem {
        let sales_total = value_text(self.sales_total.as_ref());
        let base = sales_total.as_deref().unwrap_or("");
        let vat = self
            .tax_totals
            .iter()
            .flatten()
            .find(|tax| tax.tax_type.as_deref() == Some(VAT_TAX_TYPE))
            .and_then(|tax| value_text(tax.amount.as_ref()));

        LineItem {
            item_name: value_text(self.description.as_ref())
                .or_else(|| value_text(self.item_name.as_ref()))
                .unwrap_or_default(),
            unit_code: self
                .unit_type
                .as_ref()
                .and_then(|u| value_text(u.code.as_ref()))
                .unwrap_or_else(|| factory.default_unit_code().to_string()),
            unit_name: self
                .unit_type
                .as_ref()
                .and_then(|u| value_text(u.name.as_ref()))
                .unwrap_or_else(|| factory.default_unit_name().to_string()),
            quantity: value_text(self.quantity.as_ref()).unwrap_or_else(|| "1".to_string()),
            unit_price: self
                .unit_value
                .as_ref()
                .and_then(|u| value_text(u.amount.as_ref()))
                .unwrap_or_else(|| "0".to_string()),
            total_value: sales_total.clone().unwrap_or_else(|| "0".to_string()),
            vat_amount: vat.unwrap_or_else(|| factory.vat().vat_text(base)),
            total_with_vat: value_text(self.net_total.as_ref())
                .unwrap_or_else(|| factory.vat().with_vat_text(base)),
        }
    }
}
