//! Data models and configuration.

pub mod config;
pub mod invoice;

pub use config::ScraperConfig;
pub use invoice::{InvoiceData, InvoiceRecord, LineItem, PaginationState};
