//! Multi-page collection.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Result, ScrapeError};
use crate::models::invoice::InvoiceRecord;
use crate::portal::PortalScraper;
use crate::progress::{Progress, ProgressUpdate};
use crate::surface::Surface;
use crate::wait::Clock;

/// Result of a multi-page collection, as returned by `getAllPagesData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectOutcome {
    pub success: bool,
    pub data: Vec<InvoiceRecord>,
    pub total_processed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectOutcome {
    fn completed(data: Vec<InvoiceRecord>) -> Self {
        Self {
            success: true,
            total_processed: data.len(),
            data,
            error: None,
        }
    }

    fn aborted(data: Vec<InvoiceRecord>, err: &ScrapeError) -> Self {
        Self {
            success: false,
            total_processed: data.len(),
            data,
            error: Some(err.to_string()),
        }
    }
}

impl<S: Surface, C: Clock> PortalScraper<S, C> {
    /// Visit every page of the list and accumulate its records.
    ///
    /// A single page is returned without navigating. Otherwise the list is
    /// rewound to page 1 and walked with the next-page control. A failing
    /// page is logged and skipped; only a detached surface aborts, keeping
    /// what was collected so far.
    pub async fn collect_all(&mut self, progress: &mut dyn Progress) -> CollectOutcome {
        let _guard = self.traversal.begin();
        self.all_pages.clear();

        self.rescan();
        let total_pages = self.state.total_pages;
        if total_pages <= 1 {
            info!("Single page, collected {} invoices", self.invoices.len());
            self.all_pages = self.invoices.clone();
            progress.finish(self.all_pages.len());
            return CollectOutcome::completed(self.all_pages.clone());
        }

        progress.begin(total_pages);
        if !self.driver.goto_page(&self.surface, &self.clock, 1).await {
            warn!("Could not rewind to page 1, collecting from page {}", self.state.current_page);
        }

        for page in 1..=total_pages {
            if !self.surface.is_attached() {
                let err = ScrapeError::SurfaceDetached;
                error!("Collection aborted on page {}: {}", page, err);
                progress.finish(self.all_pages.len());
                return CollectOutcome::aborted(self.all_pages.clone(), &err);
            }

            progress.page(&ProgressUpdate {
                current_page: page,
                total_pages,
                message: self.config.extraction.progress_message_for(page, total_pages),
            });

            if let Err(e) = self.process_page(page, total_pages).await {
                error!("Error processing page {}: {}", page, e);
            }
        }

        info!(
            "Collected {} invoices from {} pages",
            self.all_pages.len(),
            total_pages
        );
        progress.finish(self.all_pages.len());
        CollectOutcome::completed(self.all_pages.clone())
    }

    async fn process_page(&mut self, page: u32, total_pages: u32) -> Result<()> {
        self.driver.await_page_ready(&self.surface, &self.clock).await;
        self.rescan();
        self.all_pages.extend(self.invoices.iter().cloned());
        info!("Processed page {}, collected {} invoices", page, self.invoices.len());

        if page < total_pages {
            let moved = self.driver.goto_next_page(&self.surface, self.state.current_page);
            self.clock.sleep(self.config.timing.inter_page_delay_ms).await;
            if !moved {
                return Err(ScrapeError::Navigation(format!(
                    "no next-page control after page {page}"
                )));
            }
        }
        Ok(())
    }
}
