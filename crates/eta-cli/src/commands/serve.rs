//! Serve command - answer JSON commands over stdin/stdout.
//!
//! Each input line is one request such as `{"action": "getInvoiceData"}`.
//! Each reply is written as one line; `progressUpdate` events for a
//! subscribed `getAllPagesData` precede its reply.

use clap::Args;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use eta_core::{
    Dispatcher, PagedSnapshot, PortalScraper, ProgressEvent, ProgressFn, ProgressUpdate, Response,
};

use super::{RemoteArgs, expand_pages, load_config};
use crate::clock::HostClock;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Saved list pages or glob pattern, in page order once sorted
    #[arg(required = true)]
    pages: String,

    /// Keep the portal's delays instead of replaying on virtual time
    #[arg(long)]
    realtime: bool,

    #[command(flatten)]
    remote: RemoteArgs,
}

fn print_line<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Could not serialize reply: {}", e),
    }
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.remote.apply(&mut config);

    let pages = expand_pages(&args.pages)?;
    let surface = PagedSnapshot::from_files(&pages, config.selectors.pagination.clone())?;
    let mut scraper = PortalScraper::new(surface, HostClock::new(args.realtime), config.clone());
    scraper.rescan();
    info!(
        "Serving {} saved pages, {} invoices on the first",
        pages.len(),
        scraper.invoices().len()
    );

    let resolver = args.remote.resolver(&config)?;
    let mut dispatcher = Dispatcher::new(scraper, resolver);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring malformed request: {}", e);
                print_line(&Response::Failure {
                    success: false,
                    error: format!("invalid JSON request: {e}"),
                });
                continue;
            }
        };

        debug!("Request: {}", request);
        let mut progress = ProgressFn(|update: &ProgressUpdate| print_line(&ProgressEvent::new(update)));
        let reply = dispatcher.handle(&request, &mut progress).await;
        print_line(&reply);
    }

    Ok(())
}
