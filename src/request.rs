use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use url::Url;

use crate::{Result, ARCHIVE_HOST, CHECK_TIMEOUT_SECS, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, REQUEST_TIMEOUT_SECS};

/// A received HTTP response, whatever its status.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network collaborator. Transport failures come back as `Err`,
/// any received response (including non-success statuses) as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Page>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        })
    }

    pub fn default_agent() -> Result<Self> {
        Self::new(DEFAULT_USER_AGENT)
    }
}

/// `reqwest` backed transport. Every request carries the configured
/// user-agent and times out after `ClientConfig::timeout`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    // Client uses Arc so we can clone cheaply
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Requests a page and returns its status, headers and HTML.
    async fn get(&self, url: &Url) -> Result<Page> {
        debug!(%url, "GET");
        let res = self.client.get(url.clone()).send().await?;
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await?;
        Ok(Page { status, headers, body })
    }
}

/// Checks that the archive host accepts TCP connections. Only warns on failure.
pub async fn check_reachable() -> bool {
    let connect = TcpStream::connect((ARCHIVE_HOST, 80));
    match tokio::time::timeout(Duration::from_secs(CHECK_TIMEOUT_SECS), connect).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            warn!("No connection to {ARCHIVE_HOST}, check the network: {err}");
            false
        }
        Err(_) => {
            warn!("No connection to {ARCHIVE_HOST} within {CHECK_TIMEOUT_SECS}s, check the network");
            false
        }
    }
}

/// Multi-line description of a failed response for the run log.
pub fn diagnose_response(page: &Page, url: &Url) -> String {
    let mut msg = Vec::new();
    msg.push(format!("--- Diagnosis for request: {url} ---"));
    msg.push(format!("Status code: {}", page.status));
    msg.push("Headers:".to_string());
    for (name, value) in page.headers.iter() {
        msg.push(format!("  {}: {}", name, value.to_str().unwrap_or("<binary>")));
    }
    let body_lower = page.body.to_lowercase();
    if page.headers.contains_key("cf-ray") || body_lower.contains("cloudflare") {
        msg.push("Hint: Cloudflare may be blocking the request.".to_string());
    }
    if body_lower.contains("error") || body_lower.contains("denied") {
        let snippet: String = page.body.chars().take(300).collect::<String>().replace('\n', " ");
        msg.push(format!("Possible error text: {snippet} ..."));
    }
    msg.push("--- End of diagnosis ---".to_string());
    msg.join("\n")
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Scripted responses keyed by full URL. Unknown URLs fail like a refused connection.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        responses: HashMap<String, (u16, String)>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
            self.responses.insert(url.to_string(), (status, body.into()));
            self
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: &Url) -> Result<Page> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.responses.get(url.as_str()) {
                Some((status, body)) => Ok(Page {
                    status: *status,
                    headers: HeaderMap::new(),
                    body: body.clone(),
                }),
                None => Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into()),
            }
        }
    }
}
