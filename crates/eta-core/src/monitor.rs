//! Debounced change monitoring.
//!
//! The host observes structural mutations of the render surface and feeds
//! the added element nodes to a [`ChangeMonitor`]. The monitor decides
//! whether a batch is relevant and keeps a single trailing-edge schedule;
//! the host owns the actual timer and calls back with the schedule's token.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::models::config::{MonitorSelectors, ScraperConfig};
use crate::surface::Element;

/// Set while a multi-page traversal drives the surface.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct TraversalFlag(Rc<Cell<bool>>);

impl TraversalFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.0.get()
    }

    /// Mark a traversal as running until the guard is dropped.
    pub fn begin(&self) -> TraversalGuard {
        self.0.set(true);
        TraversalGuard(self.clone())
    }
}

/// Clears the traversal flag on drop.
#[derive(Debug)]
pub struct TraversalGuard(TraversalFlag);

impl Drop for TraversalGuard {
    fn drop(&mut self) {
        self.0.0.set(false);
    }
}

/// A scheduled rescan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRescan {
    /// Identifies this schedule; a newer schedule invalidates older tokens.
    pub token: u64,
    /// Time at which the rescan is due, in clock milliseconds.
    pub due_at_ms: u64,
}

/// Decides when mutations warrant a rescan.
#[derive(Debug)]
pub struct ChangeMonitor {
    selectors: MonitorSelectors,
    debounce_ms: u64,
    traversal: TraversalFlag,
    pending: Option<PendingRescan>,
    next_token: u64,
    connected: bool,
}

impl ChangeMonitor {
    pub fn new(config: &ScraperConfig, traversal: TraversalFlag) -> Self {
        Self {
            selectors: config.selectors.monitor.clone(),
            debounce_ms: config.timing.rescan_debounce_ms,
            traversal,
            pending: None,
            next_token: 0,
            connected: true,
        }
    }

    /// Whether an added node is a row, a list cell, a page-number control,
    /// or contains a row.
    pub fn is_relevant<E: Element>(&self, node: &E) -> bool {
        let sel = &self.selectors;
        node.has_class(&sel.row_class)
            || node.has_class(&sel.list_cell_class)
            || node.has_class(&sel.page_number_class)
            || node.select_first(&sel.row_descendant).is_some()
    }

    /// Feed one mutation batch.
    ///
    /// Returns the new schedule when the batch is relevant, replacing any
    /// pending one. Nothing is scheduled while a traversal runs or after
    /// [`disconnect`](Self::disconnect).
    pub fn observe<E: Element>(&mut self, added: &[E], now_ms: u64) -> Option<PendingRescan> {
        if !self.connected || !added.iter().any(|node| self.is_relevant(node)) {
            return None;
        }
        if self.traversal.is_active() {
            trace!("Mutation ignored during traversal");
            return None;
        }

        self.next_token += 1;
        let pending = PendingRescan {
            token: self.next_token,
            due_at_ms: now_ms + self.debounce_ms,
        };
        if self.pending.replace(pending).is_some() {
            trace!("Rescan rescheduled to {}", pending.due_at_ms);
        } else {
            debug!("Rescan scheduled at {}", pending.due_at_ms);
        }
        Some(pending)
    }

    /// Currently pending schedule.
    pub fn pending(&self) -> Option<PendingRescan> {
        self.pending
    }

    /// Timer callback for `token`. Returns whether the rescan should run.
    ///
    /// Stale tokens are ignored. A schedule that comes due while a
    /// traversal is running is dropped.
    pub fn fire(&mut self, token: u64) -> bool {
        match self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                !self.traversal.is_active()
            }
            _ => false,
        }
    }

    /// Fire the pending schedule if it is due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> bool {
        match self.pending {
            Some(pending) if pending.due_at_ms <= now_ms => self.fire(pending.token),
            _ => false,
        }
    }

    /// Stop observing. Returns the cleared schedule so the host can cancel
    /// its timer.
    pub fn disconnect(&mut self) -> Option<PendingRescan> {
        self.connected = false;
        self.pending.take()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HtmlSnapshot, Surface};
    use pretty_assertions::assert_eq;

    const NODES: &str = r#"
        <div id="row" class="ms-DetailsRow"></div>
        <div id="cell" class="ms-List-cell"></div>
        <button id="page" class="eta-pageNumber">2</button>
        <section id="container"><div class="ms-DetailsRow"></div></section>
        <div id="other" class="tooltip"><span>hi</span></div>
    "#;

    fn monitor() -> ChangeMonitor {
        ChangeMonitor::new(&ScraperConfig::default(), TraversalFlag::new())
    }

    #[test]
    fn test_relevance() {
        let doc = HtmlSnapshot::parse(NODES);
        let m = monitor();
        for id in ["#row", "#cell", "#page", "#container"] {
            assert!(m.is_relevant(&doc.select_first(id).unwrap()), "{id}");
        }
        assert!(!m.is_relevant(&doc.select_first("#other").unwrap()));
    }

    #[test]
    fn test_unrelated_nodes_never_schedule() {
        let doc = HtmlSnapshot::parse(NODES);
        let mut m = monitor();
        let other = doc.select("#other, #other span");
        assert_eq!(m.observe(&other, 0), None);
        assert_eq!(m.pending(), None);
        assert!(!m.take_due(10_000));
    }

    #[test]
    fn test_burst_coalesces_into_one_rescan() {
        let doc = HtmlSnapshot::parse(NODES);
        let rows = doc.select("#row");
        let mut m = monitor();

        let mut tokens = Vec::new();
        for t in [0, 200, 400, 600, 800] {
            tokens.push(m.observe(&rows, t).unwrap().token);
        }
        assert_eq!(m.pending().unwrap().due_at_ms, 1_800);

        // Timers of superseded schedules fire as no-ops.
        for stale in &tokens[..4] {
            assert!(!m.fire(*stale));
        }

        let mut rescans = 0;
        for now in (0..=3_000).step_by(100) {
            if m.take_due(now) {
                rescans += 1;
                assert_eq!(now, 1_800);
            }
        }
        assert_eq!(rescans, 1);
    }

    #[test]
    fn test_no_schedule_during_traversal() {
        let doc = HtmlSnapshot::parse(NODES);
        let rows = doc.select("#row");
        let flag = TraversalFlag::new();
        let mut m = ChangeMonitor::new(&ScraperConfig::default(), flag.clone());

        {
            let _guard = flag.begin();
            assert!(flag.is_active());
            assert_eq!(m.observe(&rows, 0), None);
        }
        assert!(!flag.is_active());
        assert!(m.observe(&rows, 0).is_some());
    }

    #[test]
    fn test_timer_firing_during_traversal_is_dropped() {
        let doc = HtmlSnapshot::parse(NODES);
        let rows = doc.select("#row");
        let flag = TraversalFlag::new();
        let mut m = ChangeMonitor::new(&ScraperConfig::default(), flag.clone());

        let pending = m.observe(&rows, 0).unwrap();
        let _guard = flag.begin();
        assert!(!m.fire(pending.token));
        assert_eq!(m.pending(), None);
    }

    #[test]
    fn test_disconnect_clears_pending() {
        let doc = HtmlSnapshot::parse(NODES);
        let rows = doc.select("#row");
        let mut m = monitor();

        let pending = m.observe(&rows, 0).unwrap();
        assert_eq!(m.disconnect(), Some(pending));
        assert!(!m.is_connected());
        assert!(!m.fire(pending.token));
        assert_eq!(m.observe(&rows, 5_000), None);
    }
}
