//! Core library for scraping the ETA e-invoicing portal.
//!
//! This crate provides:
//! - Row extraction into normalized invoice records
//! - Pagination telemetry and programmatic page navigation
//! - Multi-page collection with progress reporting
//! - Debounced change monitoring
//! - Line-item resolution through a cascade of detail sources
//! - The JSON command surface used by host integrations
//!
//! The engine is runtime-agnostic. Hosts provide a [`Surface`] over their
//! document, a [`Clock`], and the remote detail sources.

pub mod aggregate;
pub mod commands;
pub mod details;
pub mod error;
pub mod invoice;
pub mod models;
pub mod monitor;
pub mod pagination;
pub mod portal;
pub mod progress;
pub mod scan;
pub mod surface;
pub mod wait;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aggregate::CollectOutcome;
pub use commands::{Command, Dispatcher, Response};
pub use details::{DetailApi, DetailResolver, DetailStage, DocumentLoader, DocumentResponse};
pub use error::{ConfigError, RemoteError, Result, ScrapeError};
pub use invoice::{LineItemFactory, RowExtractor};
pub use models::{InvoiceData, InvoiceRecord, LineItem, PaginationState, ScraperConfig};
pub use monitor::{ChangeMonitor, PendingRescan, TraversalFlag};
pub use pagination::PaginationDriver;
pub use portal::PortalScraper;
pub use progress::{NullProgress, Progress, ProgressEvent, ProgressFn, ProgressUpdate};
pub use scan::RowScanner;
pub use surface::{Element, HtmlSnapshot, PagedSnapshot, Surface, SurfaceAction};
pub use wait::{Clock, ManualClock};
