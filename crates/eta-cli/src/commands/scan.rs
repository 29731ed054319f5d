//! Scan command - extract the invoices shown on one saved list page.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use eta_core::{HtmlSnapshot, PortalScraper, Response};

use super::{emit, load_config, to_json};
use crate::clock::TokioClock;

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Saved HTML of a portal list page
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON reply
    #[arg(long)]
    pretty: bool,
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let page = HtmlSnapshot::from_file(&args.input)?;
    let mut scraper = PortalScraper::new(page, TokioClock::new(), config);
    scraper.rescan();

    let data = scraper.invoice_data();
    info!(
        "Page {}/{}: {} invoices of {}",
        data.current_page,
        data.total_pages,
        data.invoices.len(),
        data.total_count
    );

    let reply = Response::Invoices {
        success: true,
        data,
    };
    emit(&to_json(&reply, args.pretty)?, args.output.as_deref())
}
