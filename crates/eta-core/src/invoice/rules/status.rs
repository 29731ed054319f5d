//! Document status resolution.

use super::FieldExtractor;
use crate::models::config::RowSelectors;
use crate::models::invoice::{STATUS_VALID, STATUS_VALID_CANCELLED};
use crate::surface::Element;

/// Resolves the status cell of a row.
///
/// Order matters: explicit status text, then the valid+cancelled marker
/// pair, then the valid marker alone, then the cell's own text.
pub struct StatusExtractor<'a> {
    selectors: &'a RowSelectors,
}

impl<'a> StatusExtractor<'a> {
    pub fn new(selectors: &'a RowSelectors) -> Self {
        Self { selectors }
    }
}

impl FieldExtractor for StatusExtractor<'_> {
    type Output = String;

    fn extract<E: Element>(&self, cell: &E) -> Option<String> {
        if let Some(node) = self
            .selectors
            .status_text
            .iter()
            .find_map(|sel| cell.select_first(sel))
        {
            return Some(node.trimmed_text());
        }

        let valid = cell.select_first(&self.selectors.status_valid).is_some();
        let cancelled = cell.select_first(&self.selectors.status_cancelled).is_some();
        if valid && cancelled {
            return Some(STATUS_VALID_CANCELLED.to_string());
        }
        if valid {
            return Some(STATUS_VALID.to_string());
        }

        Some(cell.trimmed_text()).filter(|text| !text.is_empty())
    }
}
