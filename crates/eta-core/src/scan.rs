//! Row scanning and pagination metadata.

use tracing::{debug, info, warn};

use crate::invoice::RowExtractor;
use crate::invoice::rules::{count_before_total, first_number, leading_integer};
use crate::models::config::{PaginationSelectors, ScraperConfig};
use crate::models::invoice::{InvoiceRecord, PaginationState};
use crate::surface::{Element, Surface};

/// Enumerates the rows of the current page and extracts valid records.
#[derive(Debug, Clone)]
pub struct RowScanner {
    extractor: RowExtractor,
    pagination: PaginationSelectors,
    default_page_size: usize,
}

impl RowScanner {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            extractor: RowExtractor::new(config),
            pagination: config.selectors.pagination.clone(),
            default_page_size: config.extraction.default_page_size,
        }
    }

    /// Scan the current page.
    ///
    /// Pagination metadata is refreshed first so records carry the page
    /// they were read from. Invalid records are dropped; document order is
    /// kept.
    pub fn scan<S: Surface>(&self, surface: &S, state: &mut PaginationState) -> Vec<InvoiceRecord> {
        self.refresh_pagination(surface, state);

        let rows = surface.select(&self.extractor.selectors().row);
        state.observe_rows(rows.len());
        state.recompute_pages(self.default_page_size);

        if rows.is_empty() {
            warn!("No invoice rows found on page {}", state.current_page);
            return Vec::new();
        }
        debug!("Found {} rows on page {}", rows.len(), state.current_page);

        let records: Vec<InvoiceRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| self.extractor.extract(row, i + 1, state.current_page))
            .filter(InvoiceRecord::is_valid)
            .collect();

        info!(
            "Extracted {} valid invoices from page {} of {} (total {})",
            records.len(),
            state.current_page,
            state.total_pages,
            state.total_count
        );
        records
    }

    /// Read the total count and current page from the portal chrome.
    ///
    /// Values that cannot be read keep their previous state.
    pub fn refresh_pagination<S: Surface>(&self, surface: &S, state: &mut PaginationState) {
        let sel = &self.pagination;

        if let Some(total) = surface
            .select_first(&sel.total_count_label)
            .and_then(|label| first_number(&label.text()))
        {
            state.total_count = total;
        }

        if state.total_count == 0 {
            if let Some(total) = surface
                .select_first(&sel.pagination_text)
                .and_then(|el| count_before_total(&el.text()))
            {
                state.total_count = total;
            }
        }

        if let Some(control) = surface.select_first(&sel.current_page) {
            state.current_page = leading_integer(&control.text())
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(1);
        }

        debug!(
            "Pagination: page {}, total count {}",
            state.current_page, state.total_count
        );
    }
}
