//! Line-item resolution for a single invoice.
//!
//! Three sources are tried in order until one yields items: the portal's
//! structured document endpoint, the human-facing detail page loaded into
//! an isolated document, and finally a summary built from the records the
//! scraper already holds.

mod api;
mod document;

pub use api::{DetailApi, DocumentLine, DocumentResponse, TaxTotal, UnitType, UnitValue};
pub use document::{DocumentLoader, extract_line_items};

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{RemoteError, Result};
use crate::invoice::LineItemFactory;
use crate::models::config::{DetailSelectors, PortalConfig, ScraperConfig, TimingConfig};
use crate::models::invoice::{InvoiceRecord, LineItem};
use crate::wait::{Clock, with_timeout};

/// One source of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStage {
    Api,
    SecondaryDocument,
    HeldRecords,
}

impl DetailStage {
    /// Stages in the order they are tried.
    pub const CASCADE: [DetailStage; 3] = [
        DetailStage::Api,
        DetailStage::SecondaryDocument,
        DetailStage::HeldRecords,
    ];
}

impl fmt::Display for DetailStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetailStage::Api => "document API",
            DetailStage::SecondaryDocument => "detail page",
            DetailStage::HeldRecords => "held records",
        };
        f.write_str(name)
    }
}

/// Resolves line items through the detail cascade.
///
/// The resolver keeps its own clock for load bounds and settle delays, so
/// a host replaying list pages on virtual time still waits on real loads.
pub struct DetailResolver<A, L, C> {
    api: A,
    loader: L,
    clock: C,
    portal: PortalConfig,
    selectors: DetailSelectors,
    timing: TimingConfig,
    factory: LineItemFactory,
}

impl<A: DetailApi, L: DocumentLoader, C: Clock> DetailResolver<A, L, C> {
    pub fn new(api: A, loader: L, clock: C, config: &ScraperConfig) -> Self {
        Self {
            api,
            loader,
            clock,
            portal: config.portal.clone(),
            selectors: config.selectors.details.clone(),
            timing: config.timing.clone(),
            factory: LineItemFactory::new(config),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Line items for `invoice_id`, empty when no source has any.
    ///
    /// `held` is the scanned record with that electronic number, if any.
    /// Failures of individual stages are logged and never returned.
    pub async fn resolve(&self, invoice_id: &str, held: Option<&InvoiceRecord>) -> Vec<LineItem> {
        for stage in DetailStage::CASCADE {
            match self.run_stage(stage, invoice_id, held).await {
                Ok(items) if !items.is_empty() => {
                    info!("{} line items for {} from {}", items.len(), invoice_id, stage);
                    return items;
                }
                Ok(_) => debug!("{} had no line items for {}", stage, invoice_id),
                Err(e) => warn!("{} failed for {}: {}", stage, invoice_id, e),
            }
        }
        Vec::new()
    }

    /// Run a single stage of the cascade.
    pub async fn run_stage(
        &self,
        stage: DetailStage,
        invoice_id: &str,
        held: Option<&InvoiceRecord>,
    ) -> Result<Vec<LineItem>> {
        match stage {
            DetailStage::Api => self.from_api(invoice_id).await,
            DetailStage::SecondaryDocument => self.from_document(invoice_id).await,
            DetailStage::HeldRecords => Ok(held
                .map(|record| vec![self.factory.from_record(record)])
                .unwrap_or_default()),
        }
    }

    async fn from_api(&self, invoice_id: &str) -> Result<Vec<LineItem>> {
        let url = self.portal.document_api_url(invoice_id);
        debug!("Fetching {}", url);
        let response = self.api.fetch_document(&url).await?;
        Ok(response.line_items(&self.factory))
    }

    async fn from_document(&self, invoice_id: &str) -> Result<Vec<LineItem>> {
        let url = self.portal.document_page_url(invoice_id);
        debug!("Loading {}", url);

        let bound = self.timing.detail_load_timeout_ms;
        let load = async {
            let doc = self.loader.load(&url).await?;
            self.clock.sleep(self.timing.detail_settle_ms).await;
            Ok::<_, RemoteError>(extract_line_items(&doc, &self.selectors, &self.factory))
        };

        match with_timeout(&self.clock, bound, load).await {
            Some(items) => Ok(items?),
            None => Err(RemoteError::Timeout(bound).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::surface::{HtmlSnapshot, Surface};
    use crate::wait::ManualClock;
    use pretty_assertions::assert_eq;

    /// Scripted API: a canned response or an HTTP status.
    struct FakeApi {
        response: std::result::Result<&'static str, u16>,
        urls: RefCell<Vec<String>>,
    }

    impl FakeApi {
        fn ok(json: &'static str) -> Self {
            Self {
                response: Ok(json),
                urls: RefCell::new(Vec::new()),
            }
        }

        fn status(code: u16) -> Self {
            Self {
                response: Err(code),
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl DetailApi for FakeApi {
        async fn fetch_document(&self, url: &str) -> std::result::Result<DocumentResponse, RemoteError> {
            self.urls.borrow_mut().push(url.to_string());
            match self.response {
                Ok(json) => Ok(serde_json::from_str(json)?),
                Err(code) => Err(RemoteError::Status(code)),
            }
        }
    }

    /// Detail page that stays open until dropped.
    struct TrackedDoc {
        inner: HtmlSnapshot,
        open: Rc<Cell<usize>>,
    }

    impl Drop for TrackedDoc {
        fn drop(&mut self) {
            self.open.set(self.open.get() - 1);
        }
    }

    impl Surface for TrackedDoc {
        type Node<'a> = scraper::ElementRef<'a>;

        fn select<'a>(&'a self, selector: &str) -> Vec<Self::Node<'a>> {
            self.inner.select(selector)
        }

        fn click(&self, _node: &Self::Node<'_>) {}

        fn set_value(&self, _node: &Self::Node<'_>, _value: &str) {}

        fn dispatch(&self, _node: &Self::Node<'_>, _event: &str) {}
    }

    /// Loader serving one page, or hanging forever.
    struct FakeLoader {
        html: Option<&'static str>,
        open: Rc<Cell<usize>>,
    }

    impl FakeLoader {
        fn serving(html: &'static str) -> Self {
            Self {
                html: Some(html),
                open: Rc::new(Cell::new(0)),
            }
        }

        fn hanging() -> Self {
            Self {
                html: None,
                open: Rc::new(Cell::new(0)),
            }
        }
    }

    impl DocumentLoader for FakeLoader {
        type Document = TrackedDoc;

        async fn load(&self, _url: &str) -> std::result::Result<TrackedDoc, RemoteError> {
            self.open.set(self.open.get() + 1);
            let doc = TrackedDoc {
                inner: HtmlSnapshot::parse(self.html.unwrap_or("")),
                open: self.open.clone(),
            };
            if self.html.is_none() {
                let _doc = doc;
                std::future::pending::<()>().await;
                unreachable!();
            }
            Ok(doc)
        }
    }

    const DETAIL_PAGE: &str = r#"<div class="ms-DetailsList">
        <div class="ms-DetailsRow" role="row">
          <div class="ms-DetailsRow-cell">Steel bar</div>
          <div class="ms-DetailsRow-cell">KG</div>
          <div class="ms-DetailsRow-cell">Kilogram</div>
          <div class="ms-DetailsRow-cell">10</div>
          <div class="ms-DetailsRow-cell">30</div>
          <div class="ms-DetailsRow-cell">300</div>
        </div>
      </div>"#;

    fn resolver(api: FakeApi, loader: FakeLoader) -> DetailResolver<FakeApi, FakeLoader, ManualClock> {
        DetailResolver::new(api, loader, ManualClock::new(), &ScraperConfig::default())
    }

    fn held() -> InvoiceRecord {
        let mut record = InvoiceRecord::new(1, 1);
        record.electronic_number = "ABC".to_string();
        record.total_invoice = "570.00".to_string();
        record.invoice_value = "500.00".to_string();
        record.vat_amount = "70.00".to_string();
        record
    }

    #[tokio::test]
    async fn test_api_stage_wins() {
        let r = resolver(
            FakeApi::ok(r#"{"invoiceLines": [], "totalAmount": "500.00"}"#),
            FakeLoader::serving(DETAIL_PAGE),
        );
        let items = r.resolve("ABC", None).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].vat_amount, "61.40");
        assert_eq!(
            *r.api().urls.borrow(),
            vec!["https://invoicing.eta.gov.eg/api/v1/documents/ABC".to_string()]
        );
        assert_eq!(r.loader().open.get(), 0);
        assert!(r.clock().sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_api_failure_falls_through_to_document() {
        let r = resolver(FakeApi::status(401), FakeLoader::serving(DETAIL_PAGE));
        let items = r.resolve("ABC", Some(&held())).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name, "Steel bar");
        assert_eq!(items[0].unit_code, "KG");
        assert_eq!(items[0].total_with_vat, "336.84");
        // Settled before reading, and torn down afterwards.
        assert_eq!(r.clock().sleeps(), vec![2_000]);
        assert_eq!(r.loader().open.get(), 0);
    }

    #[tokio::test]
    async fn test_empty_api_falls_through() {
        let r = resolver(FakeApi::ok("{}"), FakeLoader::serving(DETAIL_PAGE));
        let items = r.resolve("ABC", None).await;
        assert_eq!(items[0].item_name, "Steel bar");
    }

    #[tokio::test]
    async fn test_document_timeout_falls_back_to_held_record() {
        let r = resolver(FakeApi::status(500), FakeLoader::hanging());
        let items = r.resolve("ABC", Some(&held())).await;

        assert_eq!(r.clock().now_ms(), 10_000);
        assert_eq!(r.loader().open.get(), 0);
        assert_eq!(
            items,
            vec![LineItem {
                item_name: "إجمالي الفاتورة".to_string(),
                unit_code: "EA".to_string(),
                unit_name: "قطعة".to_string(),
                quantity: "1".to_string(),
                unit_price: "570.00".to_string(),
                total_value: "500.00".to_string(),
                vat_amount: "70.00".to_string(),
                total_with_vat: "570.00".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_nothing_anywhere() {
        let r = resolver(FakeApi::status(404), FakeLoader::serving("<p>empty</p>"));
        let items = r.resolve("ZZZ", None).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_stage_errors_are_reported_per_stage() {
        let r = resolver(FakeApi::status(503), FakeLoader::hanging());

        let api = r.run_stage(DetailStage::Api, "ABC", None).await;
        assert!(matches!(
            api,
            Err(crate::error::ScrapeError::Remote(RemoteError::Status(503)))
        ));

        let doc = r.run_stage(DetailStage::SecondaryDocument, "ABC", None).await;
        assert!(matches!(
            doc,
            Err(crate::error::ScrapeError::Remote(RemoteError::Timeout(10_000)))
        ));
    }

    /// Wall clock over the tokio timer.
    struct WallClock;

    impl Clock for WallClock {
        fn now_ms(&self) -> u64 {
            0
        }

        fn sleep(&self, ms: u64) -> impl std::future::Future<Output = ()> {
            tokio::time::sleep(std::time::Duration::from_millis(ms))
        }
    }

    /// Loader that is pending once before serving, like any network load.
    struct YieldingLoader;

    impl DocumentLoader for YieldingLoader {
        type Document = HtmlSnapshot;

        async fn load(&self, _url: &str) -> std::result::Result<HtmlSnapshot, RemoteError> {
            tokio::task::yield_now().await;
            Ok(HtmlSnapshot::parse(DETAIL_PAGE))
        }
    }

    #[tokio::test]
    async fn test_pending_load_is_not_cut_short() {
        let config = ScraperConfig {
            timing: TimingConfig {
                detail_settle_ms: 1,
                ..TimingConfig::default()
            },
            ..ScraperConfig::default()
        };
        let r = DetailResolver::new(FakeApi::status(503), YieldingLoader, WallClock, &config);

        let items = r.resolve("ABC", None).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name, "Steel bar");
    }
}
