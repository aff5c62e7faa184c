//! Paginated client for the content API.
//!
//! Each content type maps to one list endpoint. Listing is offset-paginated
//! with a server-side page cap; the client walks pages until the requested
//! maximum, the server-reported total, or an empty page ends the run.
//! Transient failures are retried with exponential backoff.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use cairn_shared::{CairnError, ContentType, FetchConfig, Result};

/// Server-side page size cap.
const PAGE_SIZE: usize = 100;

/// Attempts per page request before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between attempts.
const BACKOFF_BASE_MS: u64 = 500;

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// HTTP client for the content API, with pagination, rate limiting,
/// and retry built in.
pub struct ApiClient {
    client: Client,
    config: FetchConfig,
}

impl ApiClient {
    /// Create a client from runtime fetch configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CairnError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Fetch up to the configured maximum of raw documents for one
    /// content type, in listing order.
    #[instrument(skip_all, fields(content_type = %content_type))]
    pub async fn fetch_documents(&self, content_type: ContentType) -> Result<Vec<Value>> {
        self.fetch_documents_with(content_type, |_, _| {}).await
    }

    /// Like [`fetch_documents`](Self::fetch_documents), invoking `progress`
    /// after each page with (fetched so far, server-reported total if known).
    pub async fn fetch_documents_with<F>(
        &self,
        content_type: ContentType,
        mut progress: F,
    ) -> Result<Vec<Value>>
    where
        F: FnMut(usize, Option<u64>),
    {
        let max_items = self.config.max_items_per_category;
        let mut documents: Vec<Value> = Vec::new();
        let mut total: Option<u64> = None;

        while documents.len() < max_items {
            let limit = PAGE_SIZE.min(max_items - documents.len());
            let url = self.list_url(content_type, limit, documents.len())?;

            self.pace().await;
            let page = self.get_with_retry(&url).await?;

            let page_total = page.get("total").and_then(Value::as_u64);
            if page_total.is_some() {
                total = page_total;
            }

            let batch = page
                .get("documents")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            debug!(
                offset = documents.len(),
                batch = batch.len(),
                total,
                "fetched page"
            );

            if batch.is_empty() {
                break;
            }
            documents.extend(batch);
            progress(documents.len(), total);

            if let Some(total) = total {
                if documents.len() as u64 >= total {
                    break;
                }
            }
        }

        documents.truncate(max_items);
        info!(count = documents.len(), "collection complete");
        Ok(documents)
    }

    /// Build the list URL for one page of one content type.
    fn list_url(&self, content_type: ContentType, limit: usize, offset: usize) -> Result<Url> {
        let base = Url::parse(&self.config.base_url)
            .map_err(|e| CairnError::Network(format!("invalid base URL: {e}")))?;
        let mut url = base
            .join(endpoint(content_type))
            .map_err(|e| CairnError::Network(format!("invalid endpoint URL: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            query.append_pair("offset", &offset.to_string());
            if let Some(bbox) = &self.config.bbox {
                query.append_pair("bbox", &bbox.to_query());
            }
        }
        Ok(url)
    }

    /// Sleep long enough to honor the per-minute request budget.
    async fn pace(&self) {
        if self.config.rate_limit > 0 {
            let gap = Duration::from_millis(60_000 / u64::from(self.config.rate_limit));
            tokio::time::sleep(gap).await;
        }
    }

    /// GET a URL as JSON, retrying transient failures.
    ///
    /// Retried: connection errors, HTTP 5xx, and HTTP 429. A `Retry-After`
    /// header replaces the exponential backoff for the next attempt. Other
    /// client errors fail fast.
    async fn get_with_retry(&self, url: &Url) -> Result<Value> {
        let mut last_error = String::new();
        let mut wait_override: Option<Duration> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = wait_override
                    .take()
                    .unwrap_or_else(|| Duration::from_millis(BACKOFF_BASE_MS << attempt));
                debug!(attempt, backoff_ms = backoff.as_millis() as u64, "retrying");
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(url.as_str()).send().await {
                Ok(response) => match self.classify(url, response).await? {
                    PageOutcome::Body(value) => return Ok(value),
                    PageOutcome::Retry { reason, wait } => {
                        warn!(%url, attempt, reason = %reason, "transient failure");
                        last_error = reason;
                        wait_override = wait;
                    }
                },
                Err(e) => {
                    warn!(%url, attempt, error = %e, "request failed");
                    last_error = e.to_string();
                    wait_override = None;
                }
            }
        }

        Err(CairnError::Network(format!(
            "{url}: giving up after {MAX_ATTEMPTS} attempts: {last_error}"
        )))
    }

    /// Turn a response into a parsed body, a retryable condition, or a
    /// fatal error.
    async fn classify(&self, url: &Url, response: Response) -> Result<PageOutcome> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(PageOutcome::Retry {
                reason: format!("HTTP {status}"),
                wait: retry_after(&response),
            });
        }
        if status.is_server_error() {
            return Ok(PageOutcome::Retry {
                reason: format!("HTTP {status}"),
                wait: None,
            });
        }
        if !status.is_success() {
            return Err(CairnError::Network(format!("{url}: HTTP {status}")));
        }

        match response.json::<Value>().await {
            Ok(value) => Ok(PageOutcome::Body(value)),
            // A truncated body is as transient as a dropped connection.
            Err(e) => Ok(PageOutcome::Retry {
                reason: format!("body read failed: {e}"),
                wait: None,
            }),
        }
    }
}

enum PageOutcome {
    Body(Value),
    Retry {
        reason: String,
        /// Server-directed delay that stands in for the next backoff.
        wait: Option<Duration>,
    },
}

/// List endpoint path for a content type.
fn endpoint(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Route => "/routes",
        ContentType::Waypoint => "/waypoints",
        ContentType::Summit => "/summits",
        ContentType::Hut => "/huts",
        ContentType::Article => "/articles",
        ContentType::ClimbingSite => "/climbing_sites",
    }
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
