//! HTTP detail sources for the CLI host.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, COOKIE, HeaderMap, HeaderValue};
use tracing::debug;

use eta_core::{DetailApi, DocumentLoader, DocumentResponse, HtmlSnapshot, RemoteError};

/// Upper bound on a detail page body.
const MAX_DOCUMENT_BYTES: usize = 8 * 1024 * 1024;

/// Credentials and limits of a portal session.
#[derive(Debug, Clone)]
pub struct PortalSession {
    /// Raw `Cookie` header copied from a logged-in browser.
    pub cookie: Option<String>,
    /// Bearer token for the document API.
    pub token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl PortalSession {
    /// Build a client carrying the session's credentials on every request.
    pub fn client(&self) -> anyhow::Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &self.cookie {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }
        if let Some(token) = &self.token {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("eta-cli/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()?;
        Ok(client)
    }
}

fn transport_error(err: reqwest::Error, timeout_ms: u64) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(timeout_ms)
    } else {
        RemoteError::Network(err.to_string())
    }
}

/// Structured document endpoint over HTTP.
pub struct HttpDetailApi {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpDetailApi {
    pub fn new(client: reqwest::Client, session: &PortalSession) -> Self {
        Self {
            client,
            timeout_ms: session.timeout_ms,
        }
    }
}

impl DetailApi for HttpDetailApi {
    async fn fetch_document(&self, url: &str) -> Result<DocumentResponse, RemoteError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;
        debug!("Document API returned {} bytes", body.len());
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Loads detail pages over HTTP into parsed snapshots.
pub struct HttpDocumentLoader {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpDocumentLoader {
    pub fn new(client: reqwest::Client, session: &PortalSession) -> Self {
        Self {
            client,
            timeout_ms: session.timeout_ms,
        }
    }
}

impl DocumentLoader for HttpDocumentLoader {
    type Document = HtmlSnapshot;

    async fn load(&self, url: &str) -> Result<HtmlSnapshot, RemoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport_error(e, self.timeout_ms))?;
            if body.len() + chunk.len() > MAX_DOCUMENT_BYTES {
                return Err(RemoteError::Load(format!(
                    "document exceeds {} bytes",
                    MAX_DOCUMENT_BYTES
                )));
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Loaded {} ({} bytes)", url, body.len());
        Ok(HtmlSnapshot::parse(&String::from_utf8_lossy(&body)))
    }
}
