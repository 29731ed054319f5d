//! Details command - resolve the line items of one invoice.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use eta_core::{Command, Dispatcher, HtmlSnapshot, NullProgress, PortalScraper, Response};

use super::{RemoteArgs, emit, load_config, to_json};
use crate::clock::TokioClock;

/// Arguments for the details command.
#[derive(Args)]
pub struct DetailsArgs {
    /// Electronic number of the invoice
    #[arg(required = true)]
    invoice_id: String,

    /// Saved list page holding the invoice, used when both remote sources fail
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON reply
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    remote: RemoteArgs,
}

pub async fn run(args: DetailsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.remote.apply(&mut config);

    let page = match &args.snapshot {
        Some(path) => HtmlSnapshot::from_file(path)?,
        None => HtmlSnapshot::parse(""),
    };
    let mut scraper = PortalScraper::new(page, TokioClock::new(), config.clone());
    scraper.rescan();
    if args.snapshot.is_some() && scraper.find_held(&args.invoice_id).is_none() {
        eprintln!(
            "{} {} is not on the saved page",
            style("⚠").yellow(),
            args.invoice_id
        );
    }

    let resolver = args.remote.resolver(&config)?;
    let mut dispatcher = Dispatcher::new(scraper, resolver);
    let command = Command::GetInvoiceDetails {
        invoice_id: args.invoice_id.clone(),
    };
    let reply = dispatcher.execute(command, &mut NullProgress).await;

    if let Response::Details { data, .. } = &reply {
        info!("{} line items for {}", data.len(), args.invoice_id);
    }
    emit(&to_json(&reply, args.pretty)?, args.output.as_deref())
}
