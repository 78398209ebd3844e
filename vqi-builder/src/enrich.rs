//! Bounded per-item enrichment
//!
//! Fetches one detail record per [`FetchJob`] with at most `pool_size`
//! requests in flight. Each job is retried on transient errors; a job that
//! still fails is recorded as text in the error map and never stops its
//! siblings.
//!
//! Workers never touch shared state. Their outcomes are drained by a single
//! consumer loop, which is the only place results are written. Outcomes
//! arrive in completion order; [`BoundedEnricher::enrich_ordered`] restores
//! job order for folds where order matters.

use crate::error::FetchError;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// Completed-job interval between progress log lines
const PROGRESS_EVERY: usize = 250;

/// One item to enrich
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchJob {
    /// External item identifier
    pub id: String,
    /// Target year/period
    pub year: u32,
}

impl FetchJob {
    pub fn new(id: impl Into<String>, year: u32) -> Self {
        Self {
            id: id.into(),
            year,
        }
    }
}

/// Result of one job: exactly one of detail or error text
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<D> {
    Success(D),
    Failure(String),
}

/// Remote source of per-item detail records
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Detail record type
    type Detail: Send;

    /// Fetch the detail record for one job (single attempt)
    async fn fetch_detail(&self, job: &FetchJob) -> Result<Self::Detail, FetchError>;
}

/// Pool, retry and pacing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichConfig {
    /// Maximum concurrent jobs
    pub pool_size: usize,
    /// Attempts and backoff per job
    pub retry: RetryPolicy,
    /// Courtesy pause after each successful request
    pub inter_request_delay: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            pool_size: 3,
            retry: RetryPolicy::default(),
            inter_request_delay: Duration::ZERO,
        }
    }
}

/// Successes and terminal failures, keyed by job id
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentReport<D> {
    pub index: BTreeMap<String, D>,
    pub errors: BTreeMap<String, String>,
}

impl<D> Default for EnrichmentReport<D> {
    fn default() -> Self {
        Self {
            index: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }
}

impl<D> EnrichmentReport<D> {
    /// Record an outcome; a later outcome for the same id replaces the earlier
    /// one in whichever map it was in
    pub fn record(&mut self, job_id: String, outcome: FetchOutcome<D>) {
        match outcome {
            FetchOutcome::Success(detail) => {
                self.errors.remove(&job_id);
                self.index.insert(job_id, detail);
            }
            FetchOutcome::Failure(reason) => {
                self.index.remove(&job_id);
                self.errors.insert(job_id, reason);
            }
        }
    }
}

/// Worker-pool driver
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedEnricher {
    config: EnrichConfig,
}

impl BoundedEnricher {
    pub fn new(config: EnrichConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Run every job and collect the outcomes
    pub async fn enrich_all<S>(&self, source: &S, jobs: Vec<FetchJob>) -> EnrichmentReport<S::Detail>
    where
        S: DetailSource + ?Sized,
    {
        let mut report = EnrichmentReport::default();
        self.enrich_each(source, jobs, |job, outcome| report.record(job.id, outcome))
            .await;
        report
    }

    /// Run every job and return the outcomes in job order
    ///
    /// Completion order is discarded, so a fold over the result is the same
    /// on every run for a given job list.
    pub async fn enrich_ordered<S>(&self, source: &S, jobs: Vec<FetchJob>) -> Vec<(FetchJob, FetchOutcome<S::Detail>)>
    where
        S: DetailSource + ?Sized,
    {
        let mut slots: Vec<Option<(FetchJob, FetchOutcome<S::Detail>)>> = Vec::new();
        slots.resize_with(jobs.len(), || None);

        self.drive(source, jobs, |position, job, outcome| {
            slots[position] = Some((job, outcome));
        })
        .await;

        slots.into_iter().flatten().collect()
    }

    /// Run every job and hand each outcome to `sink` as it completes
    ///
    /// `sink` runs on the calling task only, one outcome at a time, so it may
    /// write to unsynchronized state such as a `MergeIndex`. It is called
    /// exactly once per job, in completion order.
    pub async fn enrich_each<S, F>(&self, source: &S, jobs: Vec<FetchJob>, mut sink: F)
    where
        S: DetailSource + ?Sized,
        F: FnMut(FetchJob, FetchOutcome<S::Detail>),
    {
        self.drive(source, jobs, |_, job, outcome| sink(job, outcome)).await;
    }

    /// Pool driver; `sink` also receives each job's position in `jobs`
    async fn drive<S, F>(&self, source: &S, jobs: Vec<FetchJob>, mut sink: F)
    where
        S: DetailSource + ?Sized,
        F: FnMut(usize, FetchJob, FetchOutcome<S::Detail>),
    {
        let total = jobs.len();
        let pool_size = self.config.pool_size.max(1);

        info!(jobs = total, pool_size, retries = self.config.retry.retries, "Starting enrichment");

        let mut outcomes = stream::iter(jobs.into_iter().enumerate())
            .map(|(position, job)| async move {
                let outcome = self.run_job(source, &job).await;
                (position, job, outcome)
            })
            .buffer_unordered(pool_size);

        let mut done = 0usize;
        let mut failed = 0usize;

        while let Some((position, job, outcome)) = outcomes.next().await {
            done += 1;
            if matches!(outcome, FetchOutcome::Failure(_)) {
                failed += 1;
            }
            if done % PROGRESS_EVERY == 0 {
                info!(progress = format!("{}/{}", done, total), failed, "Enrichment progress");
            }
            sink(position, job, outcome);
        }

        info!(
            total,
            succeeded = done - failed,
            failed,
            "Enrichment complete"
        );
    }

    async fn run_job<S>(&self, source: &S, job: &FetchJob) -> FetchOutcome<S::Detail>
    where
        S: DetailSource + ?Sized,
    {
        let operation = format!("detail {}", job.id);
        let result = retry_with_backoff(&operation, &self.config.retry, || source.fetch_detail(job)).await;

        match result {
            Ok(detail) => {
                debug!(job_id = %job.id, year = job.year, "Detail fetched");
                if !self.config.inter_request_delay.is_zero() {
                    tokio::time::sleep(self.config.inter_request_delay).await;
                }
                FetchOutcome::Success(detail)
            }
            Err(err) => {
                error!(job_id = %job.id, year = job.year, error = %err, "Enrichment failed");
                FetchOutcome::Failure(err.to_string())
            }
        }
    }
}
