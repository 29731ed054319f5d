//! Secondary detail documents.

use std::future::Future;

use tracing::debug;

use crate::error::RemoteError;
use crate::invoice::LineItemFactory;
use crate::models::config::DetailSelectors;
use crate::models::invoice::LineItem;
use crate::surface::{Element, Surface};

/// Loads a human-facing detail page into an isolated document.
///
/// The document is torn down when the returned value is dropped, whether
/// extraction finished or the load was abandoned.
pub trait DocumentLoader {
    type Document: Surface;

    /// Load `url` and resolve once the document reports loaded.
    fn load(&self, url: &str) -> impl Future<Output = Result<Self::Document, RemoteError>>;
}

/// Read line items from a loaded detail document.
///
/// Falls back to a single summary item from the document's total when the
/// items table yields nothing and the total is positive.
pub fn extract_line_items<D: Surface>(
    doc: &D,
    selectors: &DetailSelectors,
    factory: &LineItemFactory,
) -> Vec<LineItem> {
    let mut items = Vec::new();

    if let Some(table) = doc.select_first(&selectors.items_table) {
        let content = selectors.cell_text.join(", ");
        for row in table.select(&selectors.item_rows) {
            let cells: Vec<String> = row
                .select(&selectors.item_cells)
                .iter()
                .map(|cell| match cell.select_first(&content) {
                    Some(inner) => inner.trimmed_text(),
                    None => cell.trimmed_text(),
                })
                .collect();
            items.extend(factory.from_cells(&cells));
        }
        debug!("Items table yielded {} line items", items.len());
    }

    if items.is_empty() {
        let total = doc
            .select_first(&selectors.total)
            .map(|el| el.trimmed_text())
            .unwrap_or_default();
        items.extend(factory.positive_summary(&total));
    }
    items
}
