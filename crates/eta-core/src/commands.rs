//! Inbound command surface.
//!
//! Hosts receive JSON requests of the form `{"action": ..., ...}` and reply
//! with the serialized [`Response`]. The [`Dispatcher`] owns the scraper
//! and the detail resolver; no global instance exists.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::aggregate::CollectOutcome;
use crate::details::{DetailApi, DetailResolver, DocumentLoader};
use crate::error::ScrapeError;
use crate::models::invoice::{InvoiceData, LineItem};
use crate::portal::PortalScraper;
use crate::progress::{NullProgress, Progress};
use crate::surface::Surface;
use crate::wait::Clock;

/// A parsed inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Records held from the last scan.
    GetInvoiceData,
    /// Line items of one invoice.
    GetInvoiceDetails { invoice_id: String },
    /// Collect every page; `progress` requests `progressUpdate` events.
    GetAllPagesData { progress: bool },
    /// Scan the current page again.
    RescanPage,
}

impl Command {
    /// Parse a request object.
    pub fn parse(request: &Value) -> Result<Self, ScrapeError> {
        let action = request.get("action").and_then(Value::as_str).unwrap_or_default();

        match action {
            "getInvoiceData" => Ok(Command::GetInvoiceData),
            "rescanPage" => Ok(Command::RescanPage),
            "getInvoiceDetails" => match request.get("invoiceId") {
                Some(Value::String(id)) if !id.is_empty() => Ok(Command::GetInvoiceDetails {
                    invoice_id: id.clone(),
                }),
                Some(Value::Number(n)) => Ok(Command::GetInvoiceDetails {
                    invoice_id: n.to_string(),
                }),
                _ => Err(ScrapeError::MalformedCommand {
                    action: action.to_string(),
                    reason: "missing invoiceId".to_string(),
                }),
            },
            "getAllPagesData" => {
                let progress = request
                    .get("options")
                    .and_then(|o| o.get("progressCallback"))
                    .is_some_and(|v| match v {
                        Value::Bool(b) => *b,
                        Value::Null => false,
                        _ => true,
                    });
                Ok(Command::GetAllPagesData { progress })
            }
            other => Err(ScrapeError::UnknownCommand(other.to_string())),
        }
    }

    /// Whether the reply is produced asynchronously, so the host must keep
    /// its reply channel open.
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Command::GetInvoiceDetails { .. } | Command::GetAllPagesData { .. }
        )
    }

    /// Whether the command only reads records already held.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::GetInvoiceData)
    }
}

/// Reply to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Invoices { success: bool, data: InvoiceData },
    Details { success: bool, data: Vec<LineItem> },
    AllPages(CollectOutcome),
    Failure { success: bool, error: String },
}

impl Response {
    pub fn failure(err: &ScrapeError) -> Self {
        Response::Failure {
            success: false,
            error: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::Invoices { success, .. }
            | Response::Details { success, .. }
            | Response::Failure { success, .. } => *success,
            Response::AllPages(outcome) => outcome.success,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Routes commands to the scraper and the detail resolver.
///
/// `D` is the resolver's clock; it defaults to the scraper's.
pub struct Dispatcher<S, C, A, L, D = C> {
    scraper: PortalScraper<S, C>,
    resolver: DetailResolver<A, L, D>,
}

impl<S, C, A, L, D> Dispatcher<S, C, A, L, D>
where
    S: Surface,
    C: Clock,
    A: DetailApi,
    L: DocumentLoader,
    D: Clock,
{
    pub fn new(scraper: PortalScraper<S, C>, resolver: DetailResolver<A, L, D>) -> Self {
        Self { scraper, resolver }
    }

    pub fn scraper(&self) -> &PortalScraper<S, C> {
        &self.scraper
    }

    pub fn scraper_mut(&mut self) -> &mut PortalScraper<S, C> {
        &mut self.scraper
    }

    pub fn resolver(&self) -> &DetailResolver<A, L, D> {
        &self.resolver
    }

    /// Handle a raw request.
    ///
    /// `progress` receives page updates only when the request subscribed
    /// to them.
    pub async fn handle(&mut self, request: &Value, progress: &mut dyn Progress) -> Response {
        match Command::parse(request) {
            Ok(command) => self.execute(command, progress).await,
            Err(e) => {
                warn!("Rejected request: {}", e);
                Response::failure(&e)
            }
        }
    }

    /// Execute a parsed command.
    pub async fn execute(&mut self, command: Command, progress: &mut dyn Progress) -> Response {
        debug!("Executing {:?}", command);
        match command {
            Command::GetInvoiceData => Response::Invoices {
                success: true,
                data: self.scraper.invoice_data(),
            },
            Command::RescanPage => {
                self.scraper.rescan();
                Response::Invoices {
                    success: true,
                    data: self.scraper.invoice_data(),
                }
            }
            Command::GetInvoiceDetails { invoice_id } => {
                let held = self.scraper.find_held(&invoice_id).cloned();
                let items = self.resolver.resolve(&invoice_id, held.as_ref()).await;
                Response::Details {
                    success: true,
                    data: items,
                }
            }
            Command::GetAllPagesData { progress: subscribed } => {
                let outcome = if subscribed {
                    self.scraper.collect_all(progress).await
                } else {
                    self.scraper.collect_all(&mut NullProgress).await
                };
                Response::AllPages(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::DocumentResponse;
    use crate::error::RemoteError;
    use crate::fixtures::session;
    use crate::models::config::{PaginationSelectors, ScraperConfig};
    use crate::progress::ProgressUpdate;
    use crate::surface::{HtmlSnapshot, PagedSnapshot};
    use crate::wait::ManualClock;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct OfflineApi;

    impl DetailApi for OfflineApi {
        async fn fetch_document(&self, _url: &str) -> Result<DocumentResponse, RemoteError> {
            Err(RemoteError::Network("offline".to_string()))
        }
    }

    struct OfflineLoader;

    impl DocumentLoader for OfflineLoader {
        type Document = HtmlSnapshot;

        async fn load(&self, _url: &str) -> Result<HtmlSnapshot, RemoteError> {
            Err(RemoteError::Load("offline".to_string()))
        }
    }

    type TestDispatcher = Dispatcher<PagedSnapshot, ManualClock, OfflineApi, OfflineLoader>;

    fn dispatcher(total: usize) -> TestDispatcher {
        let config = ScraperConfig::default();
        let surface = PagedSnapshot::new(session(total, 10), PaginationSelectors::default());
        let mut scraper = PortalScraper::new(surface, ManualClock::new(), config.clone());
        scraper.rescan();
        let resolver = DetailResolver::new(OfflineApi, OfflineLoader, ManualClock::new(), &config);
        Dispatcher::new(scraper, resolver)
    }

    async fn send(d: &mut TestDispatcher, request: Value) -> Value {
        d.handle(&request, &mut NullProgress).await.to_value()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(&json!({"action": "getInvoiceData"})).unwrap(),
            Command::GetInvoiceData
        );
        assert_eq!(
            Command::parse(&json!({"action": "getInvoiceDetails", "invoiceId": "X1"})).unwrap(),
            Command::GetInvoiceDetails {
                invoice_id: "X1".to_string()
            }
        );
        assert_eq!(
            Command::parse(&json!({"action": "getAllPagesData", "options": {"progressCallback": true}}))
                .unwrap(),
            Command::GetAllPagesData { progress: true }
        );
        assert_eq!(
            Command::parse(&json!({"action": "getAllPagesData"})).unwrap(),
            Command::GetAllPagesData { progress: false }
        );
        assert!(matches!(
            Command::parse(&json!({"action": "getInvoiceDetails"})),
            Err(ScrapeError::MalformedCommand { .. })
        ));
        assert!(matches!(
            Command::parse(&json!({"nothing": 1})),
            Err(ScrapeError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_async_commands() {
        assert!(!Command::GetInvoiceData.is_async());
        assert!(!Command::RescanPage.is_async());
        assert!(Command::GetAllPagesData { progress: false }.is_async());
        assert!(
            Command::GetInvoiceDetails {
                invoice_id: "a".to_string()
            }
            .is_async()
        );
    }

    #[test]
    fn test_read_only_commands() {
        assert!(Command::GetInvoiceData.is_read_only());
        assert!(!Command::RescanPage.is_read_only());
        assert!(!Command::GetAllPagesData { progress: true }.is_read_only());
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let mut d = dispatcher(3);
        let reply = send(&mut d, json!({"action": "selfDestruct"})).await;
        assert_eq!(reply, json!({"success": false, "error": "Unknown action"}));
    }

    #[tokio::test]
    async fn test_get_invoice_data() {
        let mut d = dispatcher(3);
        let reply = send(&mut d, json!({"action": "getInvoiceData"})).await;
        assert_eq!(reply["success"], true);
        assert_eq!(reply["data"]["totalCount"], 3);
        assert_eq!(reply["data"]["currentPage"], 1);
        assert_eq!(reply["data"]["totalPages"], 1);
        assert_eq!(reply["data"]["invoices"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_details_fall_back_to_held_record() {
        let mut d = dispatcher(3);
        let reply = send(&mut d, json!({"action": "getInvoiceDetails", "invoiceId": "E2"})).await;
        assert_eq!(reply["success"], true);
        let items = reply["data"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["unitPrice"], "100.00");
        assert_eq!(items[0]["totalWithVat"], "100.00");
    }

    #[tokio::test]
    async fn test_details_unknown_invoice_is_still_success() {
        let mut d = dispatcher(3);
        let reply = send(&mut d, json!({"action": "getInvoiceDetails", "invoiceId": "nope"})).await;
        assert_eq!(reply, json!({"success": true, "data": []}));
    }

    #[tokio::test]
    async fn test_all_pages_with_progress() {
        let mut d = dispatcher(23);
        let mut updates: Vec<ProgressUpdate> = Vec::new();
        let request = json!({"action": "getAllPagesData", "options": {"progressCallback": true}});
        let reply = d.handle(&request, &mut updates).await.to_value();

        assert_eq!(reply["success"], true);
        assert_eq!(reply["totalProcessed"], 23);
        assert_eq!(reply["data"].as_array().unwrap().len(), 23);
        assert_eq!(updates.len(), 3);
    }

    #[tokio::test]
    async fn test_all_pages_without_subscription_sends_no_progress() {
        let mut d = dispatcher(23);
        let mut updates: Vec<ProgressUpdate> = Vec::new();
        let reply = d
            .handle(&json!({"action": "getAllPagesData"}), &mut updates)
            .await;
        assert!(reply.is_success());
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_rescan_page() {
        let mut d = dispatcher(23);
        let next = d
            .scraper()
            .surface()
            .select_first(r#"[aria-label="Next page"]"#)
            .unwrap();
        d.scraper().surface().click(&next);

        let reply = send(&mut d, json!({"action": "rescanPage"})).await;
        assert_eq!(reply["data"]["currentPage"], 2);
        assert_eq!(reply["data"]["invoices"][0]["electronicNumber"], "E11");
    }
}
