//! Invoice field extraction module.

mod extractor;
mod line_items;
pub mod rules;

pub use extractor::RowExtractor;
pub use line_items::LineItemFactory;
pub(crate) use line_items::non_empty;
