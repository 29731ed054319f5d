//! Line-item construction shared by the detail stages.

use rust_decimal::Decimal;

use super::rules::{VatEstimator, parse_amount};
use crate::models::config::{ExtractionConfig, ScraperConfig};
use crate::models::invoice::{InvoiceRecord, LineItem};

/// Builds line items with the configured defaults and VAT rule.
#[derive(Debug, Clone)]
pub struct LineItemFactory {
    extraction: ExtractionConfig,
    vat: VatEstimator,
}

impl LineItemFactory {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            extraction: config.extraction.clone(),
            vat: VatEstimator::new(config.extraction.vat_rate),
        }
    }

    pub fn vat(&self) -> &VatEstimator {
        &self.vat
    }

    pub fn default_unit_code(&self) -> &str {
        &self.extraction.default_unit_code
    }

    pub fn default_unit_name(&self) -> &str {
        &self.extraction.default_unit_name
    }

    /// Single item standing for a whole invoice total.
    pub fn summary(&self, total: &str) -> LineItem {
        LineItem {
            item_name: self.extraction.summary_item_name.clone(),
            unit_code: self.extraction.default_unit_code.clone(),
            unit_name: self.extraction.default_unit_name.clone(),
            quantity: "1".to_string(),
            unit_price: total.to_string(),
            total_value: total.to_string(),
            vat_amount: self.vat.vat_text(total),
            total_with_vat: total.to_string(),
        }
    }

    /// Summary item for a total only when it is a positive amount.
    pub fn positive_summary(&self, total: &str) -> Option<LineItem> {
        parse_amount(total)
            .filter(|value| *value > Decimal::ZERO)
            .map(|_| self.summary(total))
    }

    /// Summary item derived from a scanned record.
    pub fn from_record(&self, record: &InvoiceRecord) -> LineItem {
        let total = non_empty(&record.total_invoice).unwrap_or("0");
        let total_value = non_empty(&record.invoice_value)
            .or(non_empty(&record.total_invoice))
            .unwrap_or("0");
        let vat_amount = match non_empty(&record.vat_amount) {
            Some(vat) => vat.to_string(),
            None => self.vat.vat_text(&record.total_invoice),
        };

        LineItem {
            item_name: self.extraction.summary_item_name.clone(),
            unit_code: self.extraction.default_unit_code.clone(),
            unit_name: self.extraction.default_unit_name.clone(),
            quantity: "1".to_string(),
            unit_price: total.to_string(),
            total_value: total_value.to_string(),
            vat_amount,
            total_with_vat: total.to_string(),
        }
    }

    /// Item from the cell texts of a detail-table row.
    ///
    /// Rows with fewer than six cells, an empty name, or the header's name
    /// yield nothing.
    pub fn from_cells(&self, cells: &[String]) -> Option<LineItem> {
        if cells.len() < 6 {
            return None;
        }
        let name = cells[0].as_str();
        if name.is_empty() || name == self.extraction.header_item_name {
            return None;
        }

        let or = |i: usize, fallback: &str| non_empty(&cells[i]).unwrap_or(fallback).to_string();
        let value = cells[5].as_str();

        Some(LineItem {
            item_name: name.to_string(),
            unit_code: or(1, self.extraction.default_unit_code.as_str()),
            unit_name: or(2, self.extraction.default_unit_name.as_str()),
            quantity: or(3, "1"),
            unit_price: or(4, "0"),
            total_value: or(5, "0"),
            vat_amount: self.vat.vat_text(value),
            total_with_vat: self.vat.with_vat_text(value),
        })
    }
}

pub(crate) fn non_empty(s: &str) -> Option<&str> {
    Some(s).filter(|s| !s.is_empty())
}
