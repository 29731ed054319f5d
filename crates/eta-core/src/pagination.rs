//! Driving the portal's own pagination controls.

use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::models::config::{PaginationSelectors, ScraperConfig, TimingConfig};
use crate::surface::{Element, Surface};
use crate::wait::{Clock, poll_until};

/// Navigates the host UI and waits for its re-render.
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    selectors: PaginationSelectors,
    row_selector: String,
    timing: TimingConfig,
}

impl PaginationDriver {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            selectors: config.selectors.pagination.clone(),
            row_selector: config.selectors.rows.row.clone(),
            timing: config.timing.clone(),
        }
    }

    /// Navigate to `page` and wait until it is ready.
    ///
    /// Tries a direct page control first, then the numeric page input with
    /// its go control. Returns `false` when neither exists.
    pub async fn goto_page<S: Surface, C: Clock>(&self, surface: &S, clock: &C, page: u32) -> bool {
        let controls = self.selectors.page_controls_for(page).join(", ");
        if let Some(control) = surface.select_first(&controls) {
            debug!("Clicking control for page {}", page);
            surface.click(&control);
            self.await_page_ready(surface, clock).await;
            return true;
        }

        if let Some(input) = surface.select_first(&self.selectors.page_input) {
            debug!("Entering page {} in page input", page);
            surface.set_value(&input, &page.to_string());
            surface.dispatch(&input, "change");
            surface.dispatch(&input, "blur");

            if let Some(go) = surface.select_first(&self.selectors.go_button) {
                surface.click(&go);
            }
            self.await_page_ready(surface, clock).await;
            return true;
        }

        warn!("No control found to navigate to page {}", page);
        false
    }

    /// Click the next-page control, or the control for `current_page + 1`.
    ///
    /// Does not wait for the new page; the caller decides how long to let
    /// the portal settle.
    pub fn goto_next_page<S: Surface>(&self, surface: &S, current_page: u32) -> bool {
        let next = self.selectors.next_controls.join(", ");
        if let Some(control) = surface.select_first(&next) {
            if !control.is_disabled() {
                debug!("Clicking next-page control");
                surface.click(&control);
                return true;
            }
            debug!("Next-page control is disabled");
        }

        let target = current_page + 1;
        let controls = self.selectors.page_controls_for(target).join(", ");
        if let Some(control) = surface.select_first(&controls) {
            debug!("Clicking control for page {}", target);
            surface.click(&control);
            return true;
        }

        false
    }

    /// Wait until loading indicators are gone and rows are present, then
    /// let the page settle. Each wait is bounded; timeouts are not errors.
    pub async fn await_page_ready<S: Surface, C: Clock>(&self, surface: &S, clock: &C) {
        let interval = self.timing.poll_interval_ms;
        let timeout = self.timing.ready_timeout_ms;

        let idle = poll_until(clock, interval, timeout, || {
            surface.select(&self.selectors.loading_indicators).is_empty()
        })
        .await;
        if !idle {
            warn!(
                "{}",
                ScrapeError::Timeout {
                    what: "loading indicators to clear".to_string(),
                    timeout_ms: timeout,
                }
            );
        }

        let rows = poll_until(clock, interval, timeout, || {
            !surface.select(&self.row_selector).is_empty()
        })
        .await;
        if !rows {
            warn!(
                "{}",
                ScrapeError::Timeout {
                    what: "invoice rows".to_string(),
                    timeout_ms: timeout,
                }
            );
        }

        clock.sleep(self.timing.settle_delay_ms).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{row, session};
    use crate::surface::{HtmlSnapshot, PagedSnapshot, SurfaceAction};
    use crate::wait::ManualClock;
    use pretty_assertions::assert_eq;

    fn driver() -> PaginationDriver {
        PaginationDriver::new(&ScraperConfig::default())
    }

    fn paged(total: usize, per_page: usize) -> PagedSnapshot {
        PagedSnapshot::new(session(total, per_page), PaginationSelectors::default())
    }

    #[tokio::test]
    async fn test_goto_page_by_control() {
        let surface = paged(30, 10);
        let clock = ManualClock::new();

        assert!(driver().goto_page(&surface, &clock, 3).await);
        assert_eq!(surface.current_page(), 3);
        assert_eq!(surface.actions(), vec![SurfaceAction::Page(3)]);
        // Ready immediately: one settle delay and no polling.
        assert_eq!(clock.sleeps(), vec![1_000]);
    }

    #[tokio::test]
    async fn test_goto_page_by_input() {
        let page = |n: u32| {
            format!(
                r#"<html><body>
                     <span class="eta-pageNumber is-checked">{n}</span>
                     <input type="number" aria-label="page number" />
                     <button aria-label="Go">go</button>
                     {}
                   </body></html>"#,
                row(&format!("E{n}"), "", "")
            )
        };
        let surface = PagedSnapshot::new([page(1), page(2)], PaginationSelectors::default());
        let clock = ManualClock::new();

        assert!(driver().goto_page(&surface, &clock, 2).await);
        assert_eq!(surface.current_page(), 2);
        assert_eq!(
            surface.actions(),
            vec![
                SurfaceAction::SetValue("2".to_string()),
                SurfaceAction::Dispatch("change".to_string()),
                SurfaceAction::Dispatch("blur".to_string()),
                SurfaceAction::Go,
            ]
        );
    }

    #[tokio::test]
    async fn test_goto_page_without_controls() {
        let surface = HtmlSnapshot::parse("<html><body></body></html>");
        let clock = ManualClock::new();
        assert!(!driver().goto_page(&surface, &clock, 2).await);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_next_page() {
        let surface = paged(30, 10);
        assert!(driver().goto_next_page(&surface, 1));
        assert_eq!(surface.current_page(), 2);
        assert_eq!(surface.actions(), vec![SurfaceAction::Next]);
    }

    #[test]
    fn test_disabled_next_falls_back_to_page_control() {
        let page = r#"<html><body>
              <button aria-label="Next page" aria-disabled="true">›</button>
              <button aria-label="Page 1">1</button>
              <button aria-label="Page 2">2</button>
            </body></html>"#;
        let surface = PagedSnapshot::new([page, page], PaginationSelectors::default());
        assert!(driver().goto_next_page(&surface, 1));
        assert_eq!(surface.actions(), vec![SurfaceAction::Page(2)]);
    }

    #[test]
    fn test_no_next_on_last_page() {
        let surface = paged(20, 10);
        let last = surface.select_first(r#"[aria-label="Page 2"]"#).unwrap();
        surface.click(&last);
        assert!(!driver().goto_next_page(&surface, 2));
    }

    #[tokio::test]
    async fn test_await_page_ready_times_out_quietly() {
        let surface = HtmlSnapshot::parse(r#"<html><body><div class="ms-Spinner"></div></body></html>"#);
        let clock = ManualClock::new();
        driver().await_page_ready(&surface, &clock).await;
        // Both waits exhaust their budget, then the settle delay.
        assert_eq!(clock.now_ms(), 21_000);
    }
}
