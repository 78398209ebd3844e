//! Compact metric records
//!
//! Projects a nested detail report into a flat [`MetricBag`]: selected
//! numeric fields plus one best quartile per rank family. Anything absent,
//! non-numeric or empty is omitted, so a bag never holds placeholders.

use crate::index::{MetricBag, MetricValue};
use crate::rank::{self, RankScale, JCR};
use serde_json::Value;

/// A numeric field read from `metrics.<group>.<path..>`
#[derive(Debug, PartialEq, Eq)]
pub struct NumericField {
    pub group: &'static str,
    pub path: &'static [&'static str],
    pub output: &'static str,
}

/// A rank family read from `ranks.<source>`: an array of category entries,
/// each with a `quartile`
#[derive(Debug, PartialEq, Eq)]
pub struct QuartileFamily {
    pub source: &'static str,
    pub output: &'static str,
}

/// Which fields to keep and how to name them
#[derive(Debug, PartialEq, Eq)]
pub struct CompactSchema {
    pub numeric: &'static [NumericField],
    pub quartiles: &'static [QuartileFamily],
    /// Scale used to fold quartile entries
    pub quartile_scale: &'static RankScale,
}

const fn field(group: &'static str, path: &'static [&'static str], output: &'static str) -> NumericField {
    NumericField { group, path, output }
}

const fn family(source: &'static str, output: &'static str) -> QuartileFamily {
    QuartileFamily { source, output }
}

/// Web of Science journal report layout
pub static CLARIVATE_JCR: CompactSchema = CompactSchema {
    numeric: &[
        field("impactMetrics", &["totalCites"], "totalCites"),
        field("impactMetrics", &["jif"], "jif"),
        field("impactMetrics", &["jifWithoutSelfCitations"], "jifWithoutSelfCitations"),
        field("impactMetrics", &["jif5Years"], "jif5Years"),
        field("impactMetrics", &["immediacyIndex"], "immediacyIndex"),
        field("impactMetrics", &["jci"], "jci"),
        field("influenceMetrics", &["eigenFactor"], "eigenFactor"),
        field("influenceMetrics", &["articleInfluence"], "articleInfluence"),
        field("sourceMetrics", &["jifPercentile"], "jifPercentile"),
        field("sourceMetrics", &["halfLife", "cited"], "citedHalfLife"),
        field("sourceMetrics", &["halfLife", "citing"], "citingHalfLife"),
    ],
    quartiles: &[
        family("jif", "jifQ"),
        family("jci", "jciQ"),
        family("articleInfluence", "aisQ"),
        family("immediacyIndex", "immediacyQ"),
        family("eigenFactorScore", "eigenQ"),
        family("esiCitations", "esiQ"),
    ],
    quartile_scale: &JCR,
};

/// Report → compact bag projector
#[derive(Debug, Clone, Copy)]
pub struct CompactRecordBuilder {
    schema: &'static CompactSchema,
}

impl Default for CompactRecordBuilder {
    fn default() -> Self {
        Self::new(&CLARIVATE_JCR)
    }
}

impl CompactRecordBuilder {
    pub fn new(schema: &'static CompactSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'static CompactSchema {
        self.schema
    }

    /// Build the compact bag for one report
    pub fn build(&self, report: &Value) -> MetricBag {
        let mut bag = MetricBag::new();

        let metrics = report.get("metrics");
        for f in self.schema.numeric {
            let value = metrics
                .and_then(|m| m.get(f.group))
                .and_then(|group| f.path.iter().try_fold(group, |node, step| node.get(step)))
                .and_then(metric_number);
            if let Some(n) = value {
                bag.insert(f.output.to_string(), MetricValue::Number(n));
            }
        }

        let ranks = report.get("ranks");
        for fam in self.schema.quartiles {
            let entries = ranks
                .and_then(|r| r.get(fam.source))
                .and_then(Value::as_array);
            let Some(entries) = entries else {
                continue;
            };
            let quartiles = entries
                .iter()
                .filter_map(|entry| entry.get("quartile"))
                .filter_map(Value::as_str);
            if let Some(best) = rank::best_symbol(self.schema.quartile_scale, quartiles) {
                bag.insert(fam.output.to_string(), MetricValue::Text(best));
            }
        }

        bag
    }
}

/// Numeric field value: JSON numbers or numeric strings (thousands separators
/// allowed). Empty, non-numeric and non-finite values yield `None`.
pub fn metric_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}
