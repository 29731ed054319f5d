//! The scraper instance bound to one render surface.

use tracing::debug;

use crate::models::config::ScraperConfig;
use crate::models::invoice::{InvoiceData, InvoiceRecord, PaginationState};
use crate::monitor::{ChangeMonitor, TraversalFlag};
use crate::pagination::PaginationDriver;
use crate::scan::RowScanner;
use crate::surface::Surface;
use crate::wait::Clock;

/// Scraper state for one portal page.
///
/// Holds the records of the last scan and of the last multi-page
/// collection, plus the pagination telemetry they were read with.
pub struct PortalScraper<S, C> {
    pub(crate) surface: S,
    pub(crate) clock: C,
    pub(crate) config: ScraperConfig,
    pub(crate) scanner: RowScanner,
    pub(crate) driver: PaginationDriver,
    pub(crate) state: PaginationState,
    pub(crate) invoices: Vec<InvoiceRecord>,
    pub(crate) all_pages: Vec<InvoiceRecord>,
    pub(crate) traversal: TraversalFlag,
}

impl<S: Surface, C: Clock> PortalScraper<S, C> {
    pub fn new(surface: S, clock: C, config: ScraperConfig) -> Self {
        Self {
            scanner: RowScanner::new(&config),
            driver: PaginationDriver::new(&config),
            surface,
            clock,
            config,
            state: PaginationState::default(),
            invoices: Vec::new(),
            all_pages: Vec::new(),
            traversal: TraversalFlag::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn pagination(&self) -> PaginationState {
        self.state
    }

    /// Records of the last scan.
    pub fn invoices(&self) -> &[InvoiceRecord] {
        &self.invoices
    }

    /// Records of the last multi-page collection.
    pub fn all_pages_data(&self) -> &[InvoiceRecord] {
        &self.all_pages
    }

    /// Flag shared with the change monitor.
    pub fn traversal(&self) -> TraversalFlag {
        self.traversal.clone()
    }

    /// A change monitor wired to this scraper's traversal flag.
    pub fn change_monitor(&self) -> ChangeMonitor {
        ChangeMonitor::new(&self.config, self.traversal.clone())
    }

    /// Scan the current page, replacing the held records.
    pub fn rescan(&mut self) -> &[InvoiceRecord] {
        self.invoices = self.scanner.scan(&self.surface, &mut self.state);
        &self.invoices
    }

    /// Held records of the current page with pagination telemetry.
    pub fn invoice_data(&self) -> InvoiceData {
        InvoiceData {
            invoices: self.invoices.clone(),
            total_count: self.state.total_count,
            current_page: self.state.current_page,
            total_pages: self.state.total_pages,
        }
    }

    /// Held record with the given electronic number, looking at the
    /// current page first and then the last collection.
    pub fn find_held(&self, electronic_number: &str) -> Option<&InvoiceRecord> {
        let found = self
            .invoices
            .iter()
            .chain(&self.all_pages)
            .find(|r| r.electronic_number == electronic_number);
        if found.is_none() {
            debug!("No held record for {}", electronic_number);
        }
        found
    }
}
