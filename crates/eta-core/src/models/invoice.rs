//! Invoice data models matching the portal's export schema.
//!
//! Every scraped value is kept as a string: the portal formats dates and
//! amounts per locale and inconsistently, so nothing is parsed into a
//! calendar or numeric type at this layer.

use serde::{Deserialize, Serialize};

/// Status text for a document that was valid and later cancelled.
pub const STATUS_VALID_CANCELLED: &str = "Valid → Cancelled";

/// Status text for a valid document.
pub const STATUS_VALID: &str = "Valid";

/// One invoice row, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    /// 1-based position within the page it was read from.
    pub index: usize,

    /// Serial number shown in exports (same as `index`).
    pub serial_number: usize,

    /// Label of the details column.
    pub details_button: String,

    /// Document type (e.g. invoice, credit note).
    pub document_type: String,

    /// Document version.
    pub document_version: String,

    /// Status, one of a small open set (see [`STATUS_VALID_CANCELLED`]).
    pub status: String,

    /// Issue date, with the submission time appended when present.
    pub issue_date: String,

    /// Submission date.
    pub submission_date: String,

    /// Currency code.
    pub invoice_currency: String,

    /// Estimated net value (derived from the total).
    pub invoice_value: String,

    /// Estimated VAT (derived from the total).
    pub vat_amount: String,

    /// Tax discount, always zero.
    pub tax_discount: String,

    /// Gross total as shown by the portal.
    pub total_invoice: String,

    /// Issuer's internal number.
    pub internal_number: String,

    /// Portal-assigned electronic number (UUID).
    pub electronic_number: String,

    pub seller_tax_number: String,
    pub seller_name: String,
    pub seller_address: String,
    pub buyer_tax_number: String,
    pub buyer_name: String,
    pub buyer_address: String,

    /// Submission reference taken from the submission link.
    pub purchase_order_ref: String,
    pub purchase_order_desc: String,
    pub sales_order_ref: String,
    pub sales_order_desc: String,
    pub electronic_signature: String,
    pub food_drug_guide: String,
    pub external_link: String,

    /// Page the record was read from.
    pub page_number: u32,
}

impl InvoiceRecord {
    /// Create an empty record for a row position.
    pub fn new(index: usize, page_number: u32) -> Self {
        Self {
            index,
            serial_number: index,
            page_number,
            ..Self::default()
        }
    }

    /// A record is kept only if it carries an identifier or a total.
    pub fn is_valid(&self) -> bool {
        !self.electronic_number.is_empty()
            || !self.internal_number.is_empty()
            || !self.total_invoice.is_empty()
    }
}

/// One line of invoice detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_name: String,
    pub unit_code: String,
    pub unit_name: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_value: String,
    pub vat_amount: String,
    pub total_with_vat: String,
}

/// Pagination metadata read from the portal chrome.
///
/// Best-effort telemetry: `total_pages` may be wrong when the portal's
/// markup deviates from expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub total_count: usize,
    pub current_page: u32,
    pub total_pages: u32,

    /// Largest number of rows seen on one page this session, counting
    /// only pages that cannot be a short last page.
    #[serde(skip)]
    pub observed_page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            total_count: 0,
            current_page: 1,
            total_pages: 1,
            observed_page_size: 0,
        }
    }
}

impl PaginationState {
    /// Record the row count of the current page.
    ///
    /// Call after `total_count` and `current_page` are refreshed.
    pub fn observe_rows(&mut self, rows: usize) {
        if rows == 0 || self.may_be_short_last_page(rows) {
            return;
        }
        self.observed_page_size = self.observed_page_size.max(rows);
    }

    /// Whether `rows` on the current page fit a last page holding fewer
    /// rows than the pages before it.
    fn may_be_short_last_page(&self, rows: usize) -> bool {
        let earlier = self.current_page.saturating_sub(1) as usize;
        if earlier == 0 || self.total_count < rows {
            return false;
        }
        let before = self.total_count - rows;
        before % earlier == 0 && before / earlier > rows
    }

    /// Recompute `total_pages` from the total and the page size.
    pub fn recompute_pages(&mut self, default_page_size: usize) {
        let page_size = match self.observed_page_size {
            0 => default_page_size.max(1),
            n => n,
        };
        self.total_pages = self.total_count.div_ceil(page_size) as u32;
    }
}

/// Snapshot returned by `getInvoiceData` and `rescanPage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub invoices: Vec<InvoiceRecord>,
    pub total_count: usize,
    pub current_page: u32,
    pub total_pages: u32,
}
