//! Progress reporting for multi-page collection.
//!
//! Hosts implement [`Progress`] to surface traversal status: the CLI draws
//! a progress bar, the browser host posts `progressUpdate` messages.

use serde::{Deserialize, Serialize};

/// Status of a traversal when a page is about to be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub current_page: u32,
    pub total_pages: u32,
    pub message: String,
}

/// Outbound `progressUpdate` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent<'a> {
    pub action: &'static str,
    pub progress: &'a ProgressUpdate,
}

impl<'a> ProgressEvent<'a> {
    pub const ACTION: &'static str = "progressUpdate";

    pub fn new(progress: &'a ProgressUpdate) -> Self {
        Self {
            action: Self::ACTION,
            progress,
        }
    }
}

/// Progress sink for long-running collection.
pub trait Progress {
    /// Called once the number of pages to visit is known.
    fn begin(&mut self, _total_pages: u32) {}

    /// Called before each page is processed.
    fn page(&mut self, _update: &ProgressUpdate) {}

    /// Called at the end, successful or not.
    fn finish(&mut self, _collected: usize) {}
}

/// A no-op progress sink.
pub struct NullProgress;

impl Progress for NullProgress {}

/// Records every update, in order.
impl Progress for Vec<ProgressUpdate> {
    fn page(&mut self, update: &ProgressUpdate) {
        self.push(update.clone());
    }
}

/// Adapts a closure to [`Progress`], called for each page update.
pub struct ProgressFn<F>(pub F);

impl<F: FnMut(&ProgressUpdate)> Progress for ProgressFn<F> {
    fn page(&mut self, update: &ProgressUpdate) {
        (self.0)(update)
    }
}
