//! HTTP transport for the GitHub REST API.
//!
//! Retry policy: transient server errors (500, 502, 503, 504) and network
//! failures are retried a bounded number of times with exponential backoff;
//! 429 responses are waited out until the `X-RateLimit-Reset` time (plus a
//! one-second margin) and retried without consuming the retry budget.
//! Everything that reaches a caller is terminal.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use tally_core::{ApiError, ApiResult};

const USER_AGENT: &str = "tally";
const ACCEPT_HEADER: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Wait applied when a 429 response carries no usable reset header.
const RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(60);

/// Page size for list endpoints.
pub(crate) const PER_PAGE: usize = 100;

/// Error bodies are capped at this many bytes before being attached to an
/// [`ApiError::Api`].
const MAX_ERROR_BODY: usize = 4096;

/// Client for the GitHub REST API, scoped to one enterprise.
#[derive(Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    enterprise: String,
    token: String,
}

impl GithubClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the enterprise slug is empty or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        enterprise: impl Into<String>,
        token: impl Into<String>,
    ) -> ApiResult<Self> {
        let enterprise = enterprise.into();
        if enterprise.trim().is_empty() {
            return Err(ApiError::Config("enterprise slug is required".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            enterprise,
            token: token.into(),
        })
    }

    /// The enterprise slug this client is scoped to.
    #[must_use]
    pub fn enterprise(&self) -> &str {
        &self.enterprise
    }

    /// Builds a full URL for an enterprise-scoped endpoint.
    ///
    /// `enterprise_url("/settings/billing/cost-centers")`
    /// → `{base}/enterprises/{slug}/settings/billing/cost-centers`.
    pub(crate) fn enterprise_url(&self, path: &str) -> String {
        format!("{}/enterprises/{}{}", self.base_url, self.enterprise, path)
    }

    /// Builds a full URL from an API-relative path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self.execute(Method::GET, url, None::<&()>).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self.execute(Method::POST, url, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, ignoring the response payload.
    pub(crate) async fn post_no_content<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> ApiResult<()> {
        self.execute(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    /// DELETE with a JSON body, ignoring the response payload.
    pub(crate) async fn delete_no_content<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> ApiResult<()> {
        self.execute(Method::DELETE, url, Some(body)).await?;
        Ok(())
    }

    /// Fetches every page of a list endpoint that returns a bare JSON array.
    ///
    /// Pages are requested with `per_page`/`page` query parameters; the loop
    /// stops at the first short page. Remote ordering is preserved.
    pub(crate) async fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> ApiResult<Vec<T>> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let paged = format!("{url}{separator}per_page={PER_PAGE}&page={page}");
            debug!(url = %paged, "fetching page");
            let batch: Vec<T> = self.get(&paged).await?;
            let fetched = batch.len();
            items.extend(batch);

            if fetched < PER_PAGE {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Performs one logical request, absorbing retryable conditions.
    async fn execute<B: Serialize + Sync>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        let mut attempt = 0u32;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url)
                .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .header("X-GitHub-Api-Version", API_VERSION)
                .bearer_auth(&self.token);
            if let Some(b) = body {
                request = request.json(b);
            }

            debug!(%method, %url, "HTTP request");

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    if attempt + 1 < MAX_RETRIES {
                        let wait = backoff(attempt);
                        warn!(error = %e, attempt = attempt + 1, wait_secs = wait.as_secs(),
                              "transport error, retrying");
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            };

            let status = response.status();

            // Rate limit: sleep until the advertised reset, then retry the
            // identical request. Does not count against the retry budget.
            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = rate_limit_wait(response.headers());
                warn!(%url, wait_secs = wait.as_secs(), "rate limit hit, waiting for reset");
                tokio::time::sleep(wait).await;
                continue;
            }

            if is_retryable(status) && attempt + 1 < MAX_RETRIES {
                let wait = backoff(attempt);
                warn!(status = status.as_u16(), attempt = attempt + 1,
                      wait_secs = wait.as_secs(), %url, "retryable HTTP error, retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }

            let mut body_text = response.text().await.unwrap_or_default();
            body_text.truncate(MAX_ERROR_BODY);
            return Err(ApiError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }
    }
}

/// Server errors eligible for bounded retry.
fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Exponential backoff: base * 2^attempt.
fn backoff(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt)
}

/// How long to wait after a 429, from the `X-RateLimit-Reset` epoch header
/// plus a one-second safety margin.
fn rate_limit_wait(headers: &HeaderMap) -> Duration {
    let Some(reset) = headers
        .get("X-RateLimit-Reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
    else {
        return RATE_LIMIT_FALLBACK;
    };

    let now = chrono::Utc::now().timestamp();
    let wait = reset - now + 1;
    if wait <= 0 {
        Duration::from_secs(1)
    } else {
        Duration::from_secs(wait as u64)
    }
}
