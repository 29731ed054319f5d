//! Collect command - walk every page of a saved portal session.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use eta_core::{PagedSnapshot, PortalScraper, Progress, ProgressUpdate, Response};

use super::{emit, expand_pages, load_config, to_json};
use crate::clock::HostClock;

/// Arguments for the collect command.
#[derive(Args)]
pub struct CollectArgs {
    /// Saved list pages or glob pattern, in page order once sorted
    #[arg(required = true)]
    pages: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON reply
    #[arg(long)]
    pretty: bool,

    /// Keep the portal's delays instead of replaying on virtual time
    #[arg(long)]
    realtime: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

/// Draws collection progress on stderr.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, total_pages: u32) {
        self.bar.set_length(total_pages as u64);
    }

    fn page(&mut self, update: &ProgressUpdate) {
        self.bar.set_position(update.current_page.saturating_sub(1) as u64);
        self.bar.set_message(update.message.clone());
    }

    fn finish(&mut self, collected: usize) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
        self.bar.finish_with_message(format!("{} invoices", collected));
    }
}

pub async fn run(args: CollectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let pages = expand_pages(&args.pages)?;
    if !args.quiet {
        eprintln!(
            "{} Replaying {} saved pages",
            style("ℹ").blue(),
            pages.len()
        );
    }

    let surface = PagedSnapshot::from_files(&pages, config.selectors.pagination.clone())?;
    let mut scraper = PortalScraper::new(surface, HostClock::new(args.realtime), config);
    scraper.rescan();

    let mut progress = BarProgress::new(args.quiet);
    let outcome = scraper.collect_all(&mut progress).await;
    debug!("Collection took {:?}", start.elapsed());

    if let Some(err) = &outcome.error {
        warn!("Collection incomplete: {}", err);
    }
    let success = outcome.success;

    emit(
        &to_json(&Response::AllPages(outcome), args.pretty)?,
        args.output.as_deref(),
    )?;

    if !success {
        anyhow::bail!("Collection did not complete");
    }
    Ok(())
}
