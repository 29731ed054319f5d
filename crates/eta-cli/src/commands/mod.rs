//! CLI subcommands.

pub mod collect;
pub mod config;
pub mod details;
pub mod scan;
pub mod serve;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use glob::glob;
use tracing::debug;

use eta_core::DetailResolver;
use eta_core::models::config::ScraperConfig;

use crate::clock::TokioClock;
use crate::remote::{HttpDetailApi, HttpDocumentLoader, PortalSession};

/// Detail resolver over the portal's HTTP sources.
pub type HttpResolver = DetailResolver<HttpDetailApi, HttpDocumentLoader, TokioClock>;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eta")
        .join("config.json")
}

/// Load the configuration from `--config`, the default location, or the
/// built-in defaults, in that order.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ScraperConfig> {
    if let Some(path) = config_path {
        return Ok(ScraperConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(ScraperConfig::from_file(&default_path)?)
    } else {
        Ok(ScraperConfig::default())
    }
}

/// Expand a glob pattern into a sorted list of saved pages.
pub fn expand_pages(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut pages: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    pages.sort();

    if pages.is_empty() {
        anyhow::bail!("No saved pages found for pattern: {}", pattern);
    }
    Ok(pages)
}

/// Write `content` to `output`, or to stdout.
pub fn emit(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Serialize a reply, pretty-printed on request.
pub fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

/// Credentials for the portal's detail sources.
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// Cookie header of a logged-in portal session
    #[arg(long, env = "ETA_COOKIE")]
    cookie: Option<String>,

    /// Bearer token for the document API
    #[arg(long, env = "ETA_TOKEN")]
    token: Option<String>,

    /// Portal base URL (overrides the config)
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl RemoteArgs {
    pub fn session(&self) -> PortalSession {
        PortalSession {
            cookie: self.cookie.clone(),
            token: self.token.clone(),
            timeout_ms: self.timeout * 1_000,
        }
    }

    /// Resolver for the configured portal. Detail loads are bounded in
    /// real time whatever clock the list pages replay on.
    pub fn resolver(&self, config: &ScraperConfig) -> anyhow::Result<HttpResolver> {
        let session = self.session();
        let client = session.client()?;
        Ok(DetailResolver::new(
            HttpDetailApi::new(client.clone(), &session),
            HttpDocumentLoader::new(client, &session),
            TokioClock::new(),
            config,
        ))
    }

    /// Apply overrides to the loaded configuration.
    pub fn apply(&self, config: &mut ScraperConfig) {
        if let Some(base_url) = &self.base_url {
            config.portal.base_url = base_url.clone();
        }
    }
}
