//! Configuration structures for the scraper engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration for the scraper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// CSS selectors for the portal's markup.
    pub selectors: SelectorConfig,

    /// Poll intervals, timeouts and fixed delays.
    pub timing: TimingConfig,

    /// Normalization constants.
    pub extraction: ExtractionConfig,

    /// Remote endpoints.
    pub portal: PortalConfig,
}

/// All selectors, grouped by the component that uses them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub rows: RowSelectors,
    pub pagination: PaginationSelectors,
    pub monitor: MonitorSelectors,
    pub details: DetailSelectors,
}

/// Selectors for invoice rows and their cells.
///
/// Probe lists are tried in order; the first non-empty match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSelectors {
    /// Row-like unit.
    pub row: String,
    /// Cell unit within a row.
    pub cell: String,
    /// Electronic number link (cell 0).
    pub electronic_id: Vec<String>,
    /// Primary text of a cell.
    pub title: Vec<String>,
    /// Secondary text of a cell.
    pub subtitle: Vec<String>,
    /// Submission reference link (cell 6).
    pub submission_ref: Vec<String>,
    /// Explicit status text (cell 7).
    pub status_text: Vec<String>,
    /// Marker for a valid document.
    pub status_valid: String,
    /// Marker for a cancelled document.
    pub status_cancelled: String,
}

impl Default for RowSelectors {
    fn default() -> Self {
        Self {
            row: r#".ms-DetailsRow[role="row"]"#.to_string(),
            cell: ".ms-DetailsRow-cell".to_string(),
            electronic_id: vec![".internalId-link a".to_string()],
            title: vec![".griCellTitleGray".to_string()],
            subtitle: vec![".griCellSubTitle".to_string()],
            submission_ref: vec![".submissionId-link".to_string()],
            status_text: vec![".textStatus".to_string()],
            status_valid: ".status-Valid".to_string(),
            status_cancelled: ".status-Cancelled".to_string(),
        }
    }
}

/// Selectors for the pagination chrome and controls.
///
/// `{page}` in a page-control selector is replaced by the target page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSelectors {
    pub total_count_label: String,
    pub pagination_text: String,
    pub current_page: String,
    pub page_controls: Vec<String>,
    pub page_input: String,
    pub go_button: String,
    pub next_controls: Vec<String>,
    pub loading_indicators: String,
}

impl Default for PaginationSelectors {
    fn default() -> Self {
        Self {
            total_count_label: ".eta-pagination-totalrecordCount-label".to_string(),
            pagination_text: r#"[class*="pagination"]"#.to_string(),
            current_page: r#".eta-pageNumber.is-checked, .ms-Button--primary[aria-pressed="true"]"#
                .to_string(),
            page_controls: vec![
                r#"[aria-label="Page {page}"]"#.to_string(),
                r#".eta-pageNumber[data-page="{page}"]"#.to_string(),
            ],
            page_input: r#"input[type="number"][aria-label*="page"], .ms-TextField-field[type="number"]"#
                .to_string(),
            go_button: r#"[aria-label*="Go"], .ms-Button[type="submit"]"#.to_string(),
            next_controls: vec![
                r#"[aria-label="Next page"]"#.to_string(),
                r#"[aria-label="التالي"]"#.to_string(),
                r#".ms-Button[data-automation-id="nextPageButton"]"#.to_string(),
                ".eta-pageNumber.is-next".to_string(),
            ],
            loading_indicators:
                r#".ms-Spinner, .loading, [aria-label*="Loading"], [aria-label*="جاري التحميل"]"#
                    .to_string(),
        }
    }
}

impl PaginationSelectors {
    /// Page-control selectors for a concrete page number.
    pub fn page_controls_for(&self, page: u32) -> Vec<String> {
        self.page_controls
            .iter()
            .map(|tmpl| tmpl.replace("{page}", &page.to_string()))
            .collect()
    }
}

/// Class names and selectors that make a DOM mutation relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSelectors {
    pub row_class: String,
    pub list_cell_class: String,
    pub page_number_class: String,
    /// Descendant check for containers of a row.
    pub row_descendant: String,
}

impl Default for MonitorSelectors {
    fn default() -> Self {
        Self {
            row_class: "ms-DetailsRow".to_string(),
            list_cell_class: "ms-List-cell".to_string(),
            page_number_class: "eta-pageNumber".to_string(),
            row_descendant: ".ms-DetailsRow".to_string(),
        }
    }
}

/// Selectors for the invoice detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub items_table: String,
    pub item_rows: String,
    pub item_cells: String,
    pub cell_text: Vec<String>,
    pub total: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            items_table: r#".invoice-items-table, .ms-DetailsList, [data-automation-id="DetailsList"]"#
                .to_string(),
            item_rows: r#".ms-DetailsRow[role="row"], tr"#.to_string(),
            item_cells: ".ms-DetailsRow-cell, td".to_string(),
            cell_text: vec![
                ".griCellTitle".to_string(),
                ".griCellTitleGray".to_string(),
                ".ms-DetailsRow-cellContent".to_string(),
            ],
            total: r#"[data-automation-key="total"] .griCellTitleGray, .total-amount"#.to_string(),
        }
    }
}

/// Timing configuration, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Interval between condition checks.
    pub poll_interval_ms: u64,

    /// Budget of each readiness wait.
    pub ready_timeout_ms: u64,

    /// Extra settle delay after a page reports ready.
    pub settle_delay_ms: u64,

    /// Delay between next-page navigation and the following page.
    pub inter_page_delay_ms: u64,

    /// Debounce window for mutation-driven rescans.
    pub rescan_debounce_ms: u64,

    /// Lifetime bound of a secondary document load.
    pub detail_load_timeout_ms: u64,

    /// Settle delay after a secondary document reports loaded.
    pub detail_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            ready_timeout_ms: 10_000,
            settle_delay_ms: 1_000,
            inter_page_delay_ms: 1_500,
            rescan_debounce_ms: 1_000,
            detail_load_timeout_ms: 10_000,
            detail_settle_ms: 2_000,
        }
    }
}

/// Normalization constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Assumed VAT rate used to split gross totals (not observed).
    pub vat_rate: Decimal,

    /// Currency when no currency token is found in the amount.
    pub default_currency: String,

    /// Currency suffix tokens recognised in amount text.
    pub currency_tokens: Vec<String>,

    /// Page size assumed before any row has been observed.
    pub default_page_size: usize,

    /// Fixed tax-discount value.
    pub tax_discount: String,

    /// Address placeholder when a party name is known.
    pub unknown_address: String,

    /// Electronic-signature marker text.
    pub electronic_signature: String,

    /// Label of the details column.
    pub details_label: String,

    /// Name of a synthesized summary line item.
    pub summary_item_name: String,

    /// Item-name text of the detail table's header row.
    pub header_item_name: String,

    /// Unit code when none is given.
    pub default_unit_code: String,

    /// Unit name when none is given.
    pub default_unit_name: String,

    /// Progress message; `{page}` and `{total}` are substituted.
    pub progress_message: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(14, 2),
            default_currency: "EGP".to_string(),
            currency_tokens: vec!["EGP".to_string()],
            default_page_size: 10,
            tax_discount: "0".to_string(),
            unknown_address: "غير محدد".to_string(),
            electronic_signature: "موقع إلكترونياً".to_string(),
            details_label: "عرض".to_string(),
            summary_item_name: "إجمالي الفاتورة".to_string(),
            header_item_name: "اسم الصنف".to_string(),
            default_unit_code: "EA".to_string(),
            default_unit_name: "قطعة".to_string(),
            progress_message: "جاري معالجة الصفحة {page} من {total}...".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Render the progress message for a page.
    pub fn progress_message_for(&self, page: u32, total: u32) -> String {
        self.progress_message
            .replace("{page}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}

/// Portal endpoints; `{id}` is replaced by the invoice identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: String,
    pub document_api_path: String,
    pub document_page_path: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://invoicing.eta.gov.eg".to_string(),
            document_api_path: "/api/v1/documents/{id}".to_string(),
            document_page_path: "/documents/{id}".to_string(),
        }
    }
}

impl PortalConfig {
    /// URL of the structured document endpoint.
    pub fn document_api_url(&self, invoice_id: &str) -> String {
        self.join(&self.document_api_path, invoice_id)
    }

    /// URL of the human-facing detail page.
    pub fn document_page_url(&self, invoice_id: &str) -> String {
        self.join(&self.document_page_path, invoice_id)
    }

    fn join(&self, path: &str, invoice_id: &str) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            path.replace("{id}", invoice_id)
        )
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
