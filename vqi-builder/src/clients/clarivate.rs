//! Clarivate Web of Science Journals API client
//!
//! Endpoints used:
//! - `GET /journals?jcrYear=&page=&limit=[&edition=]` journal listing
//! - `GET /journals/{id}/reports/year/{year}` per-journal report
//! - `GET /last-updated` data freshness marker
//!
//! Every request waits on one shared token bucket before it is sent. Each
//! method performs a single attempt; retrying is the caller's job.

use crate::enrich::{DetailSource, FetchJob};
use crate::error::{BuildError, BuildResult, FetchError};
use crate::paging::Page;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;
use vqi_common::config::{get_user_agent, ClarivateSettings};

/// JCR editions accepted by the listing filter
pub const EDITIONS: &[&str] = &["SCIE", "SSCI", "AHCI", "ESCI"];

const API_KEY_HEADER: &str = "X-ApiKey";

/// `/journals` response body
#[derive(Debug, Deserialize)]
struct JournalListResponse {
    metadata: Option<ListMetadata>,
    hits: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ListMetadata {
    total: Option<u64>,
}

/// Web of Science Journals API client
pub struct ClarivateClient {
    /// HTTP client with configured timeout and user agent
    client: Client,
    base_url: String,
    api_key: String,
    /// Shared by listing, report and freshness calls
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl ClarivateClient {
    /// Build a client from settings
    ///
    /// # Errors
    /// `BuildError::Configuration` if the API key is blank or the HTTP client
    /// cannot be constructed.
    pub fn new(api_key: impl Into<String>, settings: &ClarivateSettings) -> BuildResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(BuildError::Configuration("Clarivate API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(get_user_agent())
            .build()
            .map_err(|e| BuildError::Configuration(format!("HTTP client setup failed: {}", e)))?;

        let per_second = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter,
        })
    }

    /// Point the client at another server (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One page of the journal listing
    pub async fn list_journals(
        &self,
        year: u32,
        edition: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<Page<Value>, FetchError> {
        let mut query = vec![
            ("jcrYear", year.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(edition) = edition {
            query.push(("edition", edition.to_string()));
        }

        let body = self.get_json("/journals", &query).await?;
        let listing: JournalListResponse =
            serde_json::from_value(body).map_err(|e| FetchError::Parse(format!("journal listing: {}", e)))?;

        Ok(Page::new(
            listing.hits.unwrap_or_default(),
            listing.metadata.and_then(|m| m.total),
        ))
    }

    /// Full report for one journal and year
    pub async fn journal_report(&self, journal_id: &str, year: u32) -> Result<Value, FetchError> {
        let path = format!("/journals/{}/reports/year/{}", journal_id, year);
        self.get_json(&path, &[]).await
    }

    /// Data freshness marker, returned as sent
    pub async fn last_updated(&self) -> Result<Value, FetchError> {
        self.get_json("/last-updated", &[]).await
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Clarivate request");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();

            return Err(match FetchError::from_status(status.as_u16(), path, body) {
                FetchError::RateLimited { .. } => FetchError::RateLimited { retry_after_secs },
                other => other,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl DetailSource for ClarivateClient {
    type Detail = Value;

    async fn fetch_detail(&self, job: &FetchJob) -> Result<Value, FetchError> {
        self.journal_report(&job.id, job.year).await
    }
}
