//! Merge index: normalized venue key → merged record
//!
//! Rank observations fold with [`rank::best`](crate::rank::best), so the
//! stored rank is the best ever seen regardless of arrival order. Metric
//! observations fold field by field, first writer wins. Membership lists
//! (FT50, UTD24, ERA) only record that a venue is listed.
//!
//! The index is single-writer. Concurrent producers must funnel their results
//! through one task before calling `merge_*` (see `enrich`).

use crate::normalize::synonym_keys;
use crate::rank::{self, RankScale, RankValue};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// One numeric or symbolic metric field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Named metric fields; absent fields are omitted, never null
pub type MetricBag = BTreeMap<String, MetricValue>;

/// Value stored per key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VenueRecord {
    /// Best rank seen so far
    pub rank: Option<RankValue>,
    /// Compact metrics from metric-bearing sources
    pub metrics: MetricBag,
    /// Listed by a membership source
    pub member: bool,
}

/// Counters for one build pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    /// Raw rows offered to the index
    pub rows: usize,
    /// Rows that produced at least one merge
    pub merged: usize,
    /// Rows whose rank text was outside the scale vocabulary
    pub malformed: usize,
    /// Rows whose name normalized to nothing
    pub unidentifiable: usize,
}

/// Mapping from normalized key to merged record
#[derive(Debug, Default)]
pub struct MergeIndex {
    scale: Option<&'static RankScale>,
    membership: bool,
    records: BTreeMap<String, VenueRecord>,
    stats: MergeStats,
}

impl MergeIndex {
    /// Index for raw rank rows parsed with `scale`
    pub fn for_scale(scale: &'static RankScale) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    /// Index for metric bags
    pub fn for_metrics() -> Self {
        Self::default()
    }

    /// Index for one-venue-per-line membership lists
    pub fn for_membership() -> Self {
        Self {
            membership: true,
            ..Self::default()
        }
    }

    /// Scale bound at construction, if any
    pub fn scale(&self) -> Option<&'static RankScale> {
        self.scale
    }

    /// Fold a rank into `key`
    ///
    /// Empty keys and absent values are no-ops, as are values parsed by a
    /// scale other than the bound one. Returns `true` when the key now holds a
    /// rank.
    pub fn merge_rank(&mut self, key: &str, value: Option<RankValue>) -> bool {
        if key.is_empty() {
            return false;
        }
        let Some(value) = value else {
            return false;
        };
        if self.membership {
            warn!(key, incoming = value.scale, "Rank offered to a membership index ignored");
            return false;
        }
        if let Some(scale) = self.scale {
            if value.scale != scale.id {
                warn!(key, bound = scale.id, incoming = value.scale, "Rank from another scale ignored");
                return false;
            }
        }

        let record = self.records.entry(key.to_string()).or_default();
        if let Some(existing) = &record.rank {
            if !existing.comparable_with(&value) {
                warn!(
                    key,
                    existing = existing.scale,
                    incoming = value.scale,
                    "Rank from another scale ignored"
                );
                return true;
            }
        }
        record.rank = rank::best(record.rank.as_ref(), Some(&value));
        true
    }

    /// Fold a metric bag into `key`, keeping fields that are already set
    ///
    /// Returns `true` when the key exists afterwards.
    pub fn merge_metrics(&mut self, key: &str, bag: MetricBag) -> bool {
        if key.is_empty() {
            return false;
        }
        if bag.is_empty() && !self.records.contains_key(key) {
            return false;
        }

        let record = self.records.entry(key.to_string()).or_default();
        for (field, value) in bag {
            record.metrics.entry(field).or_insert(value);
        }
        true
    }

    /// Mark `key` as listed
    ///
    /// Idempotent. Empty keys are no-ops. Returns `true` when the key is
    /// listed afterwards.
    pub fn merge_member(&mut self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        if !self.membership {
            warn!(key, "Membership offered to a rank or metrics index ignored");
            return false;
        }
        self.records.entry(key.to_string()).or_default().member = true;
        true
    }

    /// Merge one membership line; `|`-separated synonyms each get a key
    pub fn ingest_member(&mut self, name: &str) {
        self.stats.rows += 1;

        let keys = synonym_keys(name);
        if keys.is_empty() {
            trace!(name, "Unidentifiable venue name");
            self.stats.unidentifiable += 1;
            return;
        }

        let mut merged = false;
        for key in &keys {
            merged |= self.merge_member(key);
        }
        if merged {
            self.stats.merged += 1;
        }
    }

    /// Parse and merge one `(name, rankText)` row
    ///
    /// `name` may list `|`-separated synonyms; each becomes its own key.
    /// Requires a scale bound with [`MergeIndex::for_scale`].
    pub fn ingest_pair(&mut self, name: &str, rank_text: &str) {
        self.stats.rows += 1;

        let Some(scale) = self.scale else {
            warn!("ingest_pair called on an index without a scale; row dropped");
            return;
        };

        let keys = synonym_keys(name);
        if keys.is_empty() {
            trace!(name, "Unidentifiable venue name");
            self.stats.unidentifiable += 1;
            return;
        }

        let Some(value) = scale.parse(rank_text) else {
            trace!(name, rank_text, scale = scale.id, "Malformed rank text");
            self.stats.malformed += 1;
            return;
        };

        for key in &keys {
            self.merge_rank(key, Some(value.clone()));
        }
        self.stats.merged += 1;
    }

    /// Merge a whole stream of raw rows
    pub fn ingest_pairs<I, N, R>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (N, R)>,
        N: AsRef<str>,
        R: AsRef<str>,
    {
        let before = self.stats;
        for (name, rank_text) in pairs {
            self.ingest_pair(name.as_ref(), rank_text.as_ref());
        }
        debug!(
            rows = self.stats.rows - before.rows,
            merged = self.stats.merged - before.merged,
            malformed = self.stats.malformed - before.malformed,
            unidentifiable = self.stats.unidentifiable - before.unidentifiable,
            keys = self.records.len(),
            "Merged record stream"
        );
    }

    /// Record a row whose venue could not be identified before reaching the index
    pub fn note_unidentifiable(&mut self) {
        self.stats.rows += 1;
        self.stats.unidentifiable += 1;
    }

    /// Record a row a reader could not split into name and rank
    pub fn note_malformed(&mut self) {
        self.stats.rows += 1;
        self.stats.malformed += 1;
    }

    pub fn get(&self, key: &str) -> Option<&VenueRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Immutable serializable copy of the current state
    pub fn snapshot(&self) -> IndexSnapshot {
        let entries = self
            .records
            .iter()
            .filter_map(|(key, record)| IndexEntry::from_record(record).map(|e| (key.clone(), e)))
            .collect();
        IndexSnapshot { entries }
    }
}

/// Stored form of one venue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndexEntry {
    /// Rank symbol (`"Q1"`, `"A*"`, `"4*"`)
    Symbol(String),
    /// Ordinal value (h5-index, register level)
    Ordinal(i64),
    /// Compact metric bag
    Metrics(MetricBag),
    /// Membership flag, always `true` when present
    Flag(bool),
}

impl IndexEntry {
    fn from_record(record: &VenueRecord) -> Option<Self> {
        if !record.metrics.is_empty() {
            let mut bag = record.metrics.clone();
            if let Some(rank) = &record.rank {
                bag.entry(rank.scale.to_string())
                    .or_insert_with(|| MetricValue::Text(rank.symbol.clone()));
            }
            return Some(IndexEntry::Metrics(bag));
        }

        if let Some(rank) = &record.rank {
            return Some(match rank.to_json() {
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(IndexEntry::Ordinal)
                    .unwrap_or_else(|| IndexEntry::Symbol(rank.symbol.clone())),
                _ => IndexEntry::Symbol(rank.symbol.clone()),
            });
        }

        record.member.then_some(IndexEntry::Flag(true))
    }
}

/// Frozen index contents, sorted by key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndexSnapshot {
    entries: BTreeMap<String, IndexEntry>,
}

impl IndexSnapshot {
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexEntry)> {
        self.entries.iter()
    }
}
