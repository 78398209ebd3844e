//! Build passes
//!
//! One pass builds one index. File sources go straight from raw rows into a
//! [`MergeIndex`]; membership lists go from bare names into a membership
//! index. The Clarivate pass lists every journal, optionally fetches
//! each journal's report, and folds the compact metrics into a metric index.

use crate::clients::clarivate::{ClarivateClient, EDITIONS};
use crate::compact::CompactRecordBuilder;
use crate::enrich::{BoundedEnricher, EnrichConfig, FetchJob, FetchOutcome};
use crate::error::{BuildError, BuildResult};
use crate::index::{IndexSnapshot, MergeIndex, MergeStats};
use crate::lists::MembershipList;
use crate::normalize::normalize_venue_name;
use crate::paging::PagedFetcher;
use crate::rank::RankScale;
use crate::sources::RawRows;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};
use vqi_common::config::ClarivateSettings;
use vqi_common::time::{millis_to_duration, now_iso};

/// `source` label written for Clarivate builds
pub const CLARIVATE_SOURCE: &str = "Clarivate Web of Science Journals API (wos-journals/v1)";

/// Metadata written next to every index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMeta {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    /// ISO-8601 UTC build time
    pub fetched_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_count: Option<usize>,
    pub indexed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_reports: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
    /// Rows read from the input file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    /// Rows that merged into the index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_filename: Option<String>,
}

/// Result of a file-source pass
#[derive(Debug, Clone, PartialEq)]
pub struct RankBuild {
    pub snapshot: IndexSnapshot,
    pub stats: MergeStats,
}

impl RankBuild {
    /// Metadata for a rank build under `scale`
    pub fn meta(&self, source: &str, scale: &RankScale, input_filename: Option<&str>) -> BuildMeta {
        BuildMeta {
            scale: Some(scale.id.to_string()),
            ..self.file_meta(source, input_filename)
        }
    }

    /// Metadata for a membership build of `list`
    pub fn list_meta(&self, source: &str, list: &MembershipList, input_filename: Option<&str>) -> BuildMeta {
        BuildMeta {
            list: Some(list.id.to_string()),
            ..self.file_meta(source, input_filename)
        }
    }

    fn file_meta(&self, source: &str, input_filename: Option<&str>) -> BuildMeta {
        BuildMeta {
            source: source.to_string(),
            fetched_at: now_iso(),
            indexed_count: self.snapshot.len(),
            row_count: Some(self.stats.rows),
            merged_count: Some(self.stats.merged),
            input_filename: input_filename.map(str::to_string),
            ..BuildMeta::default()
        }
    }
}

/// Fold raw rows from one file into an index bound to `scale`
pub fn build_rank_index(scale: &'static RankScale, rows: &RawRows) -> RankBuild {
    let mut index = MergeIndex::for_scale(scale);
    for _ in 0..rows.skipped {
        index.note_malformed();
    }
    index.ingest_pairs(rows.pairs.iter().map(|(name, rank)| (name.as_str(), rank.as_str())));

    let stats = index.stats();
    info!(
        scale = scale.id,
        rows = stats.rows,
        merged = stats.merged,
        malformed = stats.malformed,
        unidentifiable = stats.unidentifiable,
        venues = index.len(),
        "Rank index built"
    );

    RankBuild {
        snapshot: index.snapshot(),
        stats,
    }
}

/// Fold membership list lines into a membership index
pub fn build_membership_index(list: &MembershipList, names: &[String]) -> RankBuild {
    let mut index = MergeIndex::for_membership();
    for name in names {
        index.ingest_member(name);
    }

    let stats = index.stats();
    info!(
        list = list.id,
        rows = stats.rows,
        unidentifiable = stats.unidentifiable,
        venues = index.len(),
        "Membership index built"
    );

    RankBuild {
        snapshot: index.snapshot(),
        stats,
    }
}

/// Upper-case and check a JCR edition filter; blank means no filter
pub fn validate_edition(edition: Option<&str>) -> BuildResult<Option<String>> {
    let Some(raw) = edition.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    let upper = raw.to_uppercase();
    if EDITIONS.contains(&upper.as_str()) {
        Ok(Some(upper))
    } else {
        Err(BuildError::Configuration(format!(
            "Invalid edition '{}' (expected {})",
            raw,
            EDITIONS.join("|")
        )))
    }
}

/// Clarivate pass options
#[derive(Debug, Clone, PartialEq)]
pub struct ClarivateOptions {
    /// JCR year
    pub year: u32,
    /// Validated edition filter
    pub edition: Option<String>,
    /// `/journals` page size
    pub page_size: u32,
    /// Fetch per-journal reports
    pub with_reports: bool,
    /// Report enrichment pool
    pub enrich: EnrichConfig,
    /// Attempts per listing page
    pub listing_retry: RetryPolicy,
}

impl ClarivateOptions {
    /// Options for `year` with tuning taken from `settings`
    pub fn from_settings(year: u32, settings: &ClarivateSettings) -> Self {
        let retry = RetryPolicy::with_retries(settings.retries);
        Self {
            year,
            edition: None,
            page_size: settings.page_size,
            with_reports: false,
            enrich: EnrichConfig {
                pool_size: settings.workers.max(1),
                retry,
                inter_request_delay: millis_to_duration(settings.request_delay_ms),
            },
            listing_retry: retry,
        }
    }
}

/// Result of a Clarivate pass
#[derive(Debug, Clone, PartialEq)]
pub struct ClarivateSync {
    /// Listing items in server order
    pub journals: Vec<Value>,
    /// Compact metrics keyed by normalized journal name
    pub snapshot: IndexSnapshot,
    /// Failed report fetches keyed by journal id
    pub errors: BTreeMap<String, String>,
    /// Reports fetched without a usable journal name
    pub unnamed: usize,
    pub meta: BuildMeta,
}

/// List every journal for a year and, optionally, index their reports
///
/// # Errors
/// - `BuildError::Configuration` for an invalid edition (before any request)
/// - `BuildError::Listing` when a listing page fails after retries
///
/// Report failures never fail the pass; they are returned in `errors`.
pub async fn sync_clarivate(client: &ClarivateClient, options: &ClarivateOptions) -> BuildResult<ClarivateSync> {
    let edition = validate_edition(options.edition.as_deref())?;
    let year = options.year;

    let last_updated = match client.last_updated().await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "Could not read last-updated marker");
            None
        }
    };

    info!(year, edition = ?edition, page_size = options.page_size, "Listing journals");

    let fetcher = PagedFetcher::new(options.page_size);
    let limit = fetcher.page_size();
    let edition_filter = edition.as_deref();
    let journals = fetcher
        .fetch_all(|page| async move {
            let operation = format!("journals page {}", page);
            retry_with_backoff(&operation, &options.listing_retry, || {
                client.list_journals(year, edition_filter, page, limit)
            })
            .await
        })
        .await
        .map_err(BuildError::Listing)?;

    let mut index = MergeIndex::for_metrics();
    let mut errors = BTreeMap::new();
    let mut unnamed = 0usize;

    if options.with_reports {
        let jobs = report_jobs(&journals, year);
        let builder = CompactRecordBuilder::default();

        // Listing order, not completion order, decides the first writer
        let outcomes = BoundedEnricher::new(options.enrich)
            .enrich_ordered(client, jobs)
            .await;

        for (job, outcome) in outcomes {
            match outcome {
                FetchOutcome::Success(report) => {
                    let name = report
                        .get("journal")
                        .and_then(|j| j.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    let key = normalize_venue_name(name);
                    if key.is_empty() {
                        unnamed += 1;
                        index.note_unidentifiable();
                        continue;
                    }
                    index.merge_metrics(&key, builder.build(&report));
                }
                FetchOutcome::Failure(reason) => {
                    errors.insert(job.id, reason);
                }
            }
        }
    }

    let snapshot = index.snapshot();

    info!(
        journals = journals.len(),
        indexed = snapshot.len(),
        failed = errors.len(),
        unnamed,
        "Clarivate sync complete"
    );

    let meta = BuildMeta {
        source: CLARIVATE_SOURCE.to_string(),
        year: Some(year),
        edition,
        fetched_at: now_iso(),
        last_updated,
        journal_count: Some(journals.len()),
        indexed_count: snapshot.len(),
        with_reports: Some(options.with_reports),
        error_count: options.with_reports.then_some(errors.len()),
        ..BuildMeta::default()
    };

    Ok(ClarivateSync {
        journals,
        snapshot,
        errors,
        unnamed,
        meta,
    })
}

/// One job per distinct non-empty listing id, in listing order
fn report_jobs(journals: &[Value], year: u32) -> Vec<FetchJob> {
    let mut seen = BTreeSet::new();
    journals
        .iter()
        .filter_map(|journal| match journal.get("id")? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .map(|id| FetchJob::new(id, year))
        .collect()
}
