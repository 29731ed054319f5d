//! Row-to-record field extraction.

use tracing::{debug, warn};

use super::rules::{AmountExtractor, FieldExtractor, StatusExtractor, VatEstimator};
use crate::error::{Result, ScrapeError};
use crate::models::config::{ExtractionConfig, RowSelectors, ScraperConfig};
use crate::models::invoice::InvoiceRecord;
use crate::surface::{Element, probe_text};

/// Cell positions within a portal row.
mod cell {
    pub const IDS: usize = 0;
    pub const DATES: usize = 1;
    pub const TYPE: usize = 2;
    pub const AMOUNT: usize = 3;
    pub const SELLER: usize = 4;
    pub const BUYER: usize = 5;
    pub const SUBMISSION: usize = 6;
    pub const STATUS: usize = 7;
}

/// Turns one portal row into an [`InvoiceRecord`].
///
/// Extraction never fails past this boundary: a row that cannot be read is
/// logged and returned partially populated, leaving the validity gate to
/// decide whether it is kept.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    selectors: RowSelectors,
    extraction: ExtractionConfig,
    vat: VatEstimator,
}

impl RowExtractor {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            selectors: config.selectors.rows.clone(),
            extraction: config.extraction.clone(),
            vat: VatEstimator::new(config.extraction.vat_rate),
        }
    }

    pub fn selectors(&self) -> &RowSelectors {
        &self.selectors
    }

    /// Extract a record from a row at 1-based `index` on `page`.
    pub fn extract<E: Element>(&self, row: &E, index: usize, page: u32) -> InvoiceRecord {
        let mut record = InvoiceRecord::new(index, page);
        record.details_button = self.extraction.details_label.clone();

        if let Err(e) = self.fill(row, &mut record) {
            warn!("Row {} on page {}: {}", index, page, e);
        }
        record
    }

    fn fill<E: Element>(&self, row: &E, record: &mut InvoiceRecord) -> Result<()> {
        let cells = row.select(&self.selectors.cell);
        if cells.is_empty() {
            return Err(ScrapeError::StructuralMiss("no cells in row".to_string()));
        }
        debug!("Row {} has {} cells", record.index, cells.len());

        let sel = &self.selectors;
        let title = |c: &E| probe_text(c, &sel.title);
        let subtitle = |c: &E| probe_text(c, &sel.subtitle);

        if let Some(c) = cells.get(cell::IDS) {
            record.electronic_number = probe_text(c, &sel.electronic_id).unwrap_or_default();
            record.internal_number = subtitle(c).unwrap_or_default();
        }

        if let Some(c) = cells.get(cell::DATES) {
            if let Some(date) = title(c) {
                record.issue_date = date.clone();
                record.submission_date = date;
            }
            if let Some(time) = subtitle(c) {
                record.issue_date = format!("{} {}", record.issue_date, time);
            }
        }

        if let Some(c) = cells.get(cell::TYPE) {
            record.document_type = title(c).unwrap_or_default();
            record.document_version = subtitle(c).unwrap_or_default();
        }

        if let Some(c) = cells.get(cell::AMOUNT) {
            let amounts = AmountExtractor::new(
                &sel.title,
                &self.extraction.currency_tokens,
                &self.extraction.default_currency,
            );
            if let Some(amount) = amounts.extract(c) {
                record.invoice_value = amount.amount.clone();
                record.total_invoice = amount.amount;
                record.invoice_currency = amount.currency;
            }
        }

        if let Some(c) = cells.get(cell::SELLER) {
            record.seller_name = title(c).unwrap_or_default();
            record.seller_tax_number = subtitle(c).unwrap_or_default();
        }

        if let Some(c) = cells.get(cell::BUYER) {
            record.buyer_name = title(c).unwrap_or_default();
            record.buyer_tax_number = subtitle(c).unwrap_or_default();
        }

        if let Some(c) = cells.get(cell::SUBMISSION) {
            record.purchase_order_ref = probe_text(c, &sel.submission_ref).unwrap_or_default();
        }

        if let Some(c) = cells.get(cell::STATUS) {
            record.status = StatusExtractor::new(sel).extract(c).unwrap_or_default();
        }

        self.apply_derived(record);
        Ok(())
    }

    /// Derived and fixed fields.
    fn apply_derived(&self, record: &mut InvoiceRecord) {
        if let Some(split) = self.vat.split_gross(&record.total_invoice) {
            record.vat_amount = split.vat;
            record.invoice_value = split.net;
        }

        record.tax_discount = self.extraction.tax_discount.clone();
        record.seller_address = self.placeholder_address(&record.seller_name);
        record.buyer_address = self.placeholder_address(&record.buyer_name);
        record.electronic_signature = self.extraction.electronic_signature.clone();
    }

    fn placeholder_address(&self, name: &str) -> String {
        if name.is_empty() {
            String::new()
        } else {
            self.extraction.unknown_address.clone()
        }
    }
}
