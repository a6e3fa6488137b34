use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use scraper::{Html, Node};
use std::time::Duration;

use crate::error::Error;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// What one fetch observed. `None` fields mean the value could not be
/// obtained: both absent is the unreachable sentinel, a status without text
/// is a non-200 answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub text: Option<String>,
    pub status: Option<u16>,
}

impl Snapshot {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            status: Some(StatusCode::OK.as_u16()),
        }
    }

    pub fn status_only(status: u16) -> Self {
        Self {
            text: None,
            status: Some(status),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn is_unreachable(&self) -> bool {
        self.status.is_none()
    }
}

/// Retrieves a page. Implementations never fail: every failure is folded into
/// the returned [`Snapshot`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Snapshot;
}

/// Single-attempt HTTP GET with a fixed overall timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Snapshot {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{url}: request failed: {e}");
                return Snapshot::unreachable();
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!("{url}: HTTP {status}");
            return Snapshot::status_only(status.as_u16());
        }

        match response.text().await {
            Ok(body) => Snapshot::ok(extract_text(&body)),
            Err(e) => {
                warn!("{url}: failed to read body: {e}");
                Snapshot::unreachable()
            }
        }
    }
}

/// Strips markup from an HTML document, keeping its visible text.
///
/// Each non-blank line is trimmed and runs of whitespace are collapsed to a
/// single space, so layout-only edits to the markup do not show up as
/// content changes.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut raw = String::new();

    for node in doc.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
