//! Rule-based field readers for portal cells.

pub mod amounts;
pub mod patterns;
pub mod status;
pub mod vat;

pub use amounts::{AmountExtractor, CellAmount, format_amount, parse_amount, split_currency};
pub use patterns::{count_before_total, first_number, leading_integer};
pub use status::StatusExtractor;
pub use vat::{GrossSplit, VatEstimator};

use crate::surface::Element;

/// Trait for cell-level field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from one cell, `None` when it is absent.
    fn extract<E: Element>(&self, cell: &E) -> Option<Self::Output>;
}
