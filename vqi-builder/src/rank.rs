//! Ranking scales and best-of resolution
//!
//! Each ranking system is one immutable [`RankScale`] table. Adding a system
//! means adding a table to [`CATALOGUE`]; parsing and comparison are shared.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Closed ranking vocabulary family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scheme {
    /// Q1 best .. Q4 worst
    Quartile,
    /// Letter grades, best first
    Tier,
    /// Enumerated numeric bands where `4*` outranks `4`
    NumericBand,
    /// Positive integers, larger is better
    Ordinal,
}

/// Ordering table for one ranking system
#[derive(Debug, PartialEq, Eq)]
pub struct RankScale {
    /// Short identifier used on the command line and in file names
    pub id: &'static str,
    /// Human readable system name
    pub label: &'static str,
    /// Vocabulary family
    pub scheme: Scheme,
    /// Canonical symbols, best first. Empty for quartile and ordinal scales.
    symbols: &'static [&'static str],
    /// Alternate spellings mapped onto canonical symbols
    aliases: &'static [(&'static str, &'static str)],
}

/// A parsed rank observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankValue {
    /// Text as it appeared in the source
    pub raw: String,
    /// Canonical symbol (`Q1`, `A*`, `4*`, `57`)
    pub symbol: String,
    /// Vocabulary family
    pub scheme: Scheme,
    /// Id of the scale that parsed this value
    pub scale: &'static str,
    /// Lower is better
    pub position: i64,
}

static QUARTILE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bQ([1-4])\b").expect("quartile pattern is valid"));

pub static SJR: RankScale = RankScale {
    id: "sjr",
    label: "SCImago Journal Rank (SJR)",
    scheme: Scheme::Quartile,
    symbols: &[],
    aliases: &[],
};

pub static JCR: RankScale = RankScale {
    id: "jcr",
    label: "Journal Citation Reports quartile",
    scheme: Scheme::Quartile,
    symbols: &[],
    aliases: &[],
};

pub static CORE: RankScale = RankScale {
    id: "core",
    label: "CORE/ICORE Conference Rankings",
    scheme: Scheme::Tier,
    symbols: &["A*", "A", "B", "C"],
    aliases: &[],
};

pub static ABDC: RankScale = RankScale {
    id: "abdc",
    label: "ABDC Journal Quality List",
    scheme: Scheme::Tier,
    symbols: &["A*", "A", "B", "C", "D"],
    aliases: &[],
};

pub static CCF: RankScale = RankScale {
    id: "ccf",
    label: "China Computer Federation Rankings",
    scheme: Scheme::Tier,
    symbols: &["A", "B", "C"],
    aliases: &[],
};

pub static VHB: RankScale = RankScale {
    id: "vhb",
    label: "VHB JOURQUAL",
    scheme: Scheme::Tier,
    symbols: &["A+", "A", "B", "C", "D", "E"],
    aliases: &[("A*", "A+")],
};

pub static ABS: RankScale = RankScale {
    id: "abs",
    label: "ABS Academic Journal Guide",
    scheme: Scheme::NumericBand,
    symbols: &["4*", "4", "3", "2", "1"],
    aliases: &[],
};

pub static H5: RankScale = RankScale {
    id: "h5",
    label: "Google Scholar 5-year h-index",
    scheme: Scheme::Ordinal,
    symbols: &[],
    aliases: &[],
};

pub static NORWEGIAN: RankScale = RankScale {
    id: "norwegian",
    label: "Norwegian Register for Scientific Journals",
    scheme: Scheme::Ordinal,
    symbols: &[],
    aliases: &[],
};

/// Every known scale
pub static CATALOGUE: &[&RankScale] = &[&SJR, &JCR, &CORE, &ABDC, &CCF, &VHB, &ABS, &H5, &NORWEGIAN];

impl RankScale {
    /// Look up a scale by id (case-insensitive)
    pub fn by_id(id: &str) -> Option<&'static RankScale> {
        CATALOGUE
            .iter()
            .copied()
            .find(|scale| scale.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Canonical symbols, best first
    pub fn symbols(&self) -> &'static [&'static str] {
        self.symbols
    }

    /// Parse source text into a rank value
    ///
    /// Text outside the scale's vocabulary yields `None`; that is how malformed
    /// cells are absorbed.
    pub fn parse(&self, raw: &str) -> Option<RankValue> {
        let (symbol, position) = match self.scheme {
            Scheme::Quartile => parse_quartile(raw)?,
            Scheme::Tier | Scheme::NumericBand => self.parse_enumerated(raw)?,
            Scheme::Ordinal => parse_ordinal(raw)?,
        };

        Some(RankValue {
            raw: raw.to_string(),
            symbol,
            scheme: self.scheme,
            scale: self.id,
            position,
        })
    }

    fn parse_enumerated(&self, raw: &str) -> Option<(String, i64)> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if compact.is_empty() {
            return None;
        }

        let canonical = self
            .aliases
            .iter()
            .find(|(alias, _)| *alias == compact)
            .map(|(_, target)| *target)
            .unwrap_or(compact.as_str());

        self.symbols
            .iter()
            .position(|s| *s == canonical)
            .map(|idx| (canonical.to_string(), idx as i64))
    }
}

fn parse_quartile(raw: &str) -> Option<(String, i64)> {
    let upper = raw.trim().to_uppercase();
    let caps = QUARTILE_TOKEN.captures(&upper)?;
    let digit: i64 = caps[1].parse().ok()?;
    Some((format!("Q{}", digit), digit))
}

fn parse_ordinal(raw: &str) -> Option<(String, i64)> {
    let value: i64 = raw.trim().parse().ok()?;
    if value <= 0 {
        return None;
    }
    Some((value.to_string(), -value))
}

impl RankValue {
    /// Whether two values may be compared
    ///
    /// Quartiles share one universal ordering; enumerated and ordinal values
    /// must come from the same table.
    pub fn comparable_with(&self, other: &RankValue) -> bool {
        self.scheme == other.scheme && (self.scheme == Scheme::Quartile || self.scale == other.scale)
    }

    /// Total order used by [`best`]: position, then symbol, then raw text
    fn rank_cmp(&self, other: &RankValue) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.symbol.cmp(&other.symbol))
            .then_with(|| self.raw.cmp(&other.raw))
    }

    /// JSON form stored in an index: numbers for ordinals, symbols otherwise
    pub fn to_json(&self) -> serde_json::Value {
        match self.scheme {
            Scheme::Ordinal => serde_json::Value::from(-self.position),
            _ => serde_json::Value::String(self.symbol.clone()),
        }
    }
}

/// Best of two optional values
///
/// An absent side never displaces a present one. Values from different
/// scales are not compared; the left value is kept.
pub fn best(a: Option<&RankValue>, b: Option<&RankValue>) -> Option<RankValue> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), Some(b)) => {
            if !a.comparable_with(b) {
                tracing::warn!(left = a.scale, right = b.scale, "Ignoring rank from a different scale");
                return Some(a.clone());
            }
            if b.rank_cmp(a) == Ordering::Less {
                Some(b.clone())
            } else {
                Some(a.clone())
            }
        }
    }
}

/// Best canonical symbol among raw texts under one scale, `None` if none parse
pub fn best_symbol<'a, I>(scale: &RankScale, raws: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    raws.into_iter()
        .fold(None, |acc: Option<RankValue>, raw| best(acc.as_ref(), scale.parse(raw).as_ref()))
        .map(|v| v.symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartile_parsing() {
        assert_eq!(SJR.parse("Q1").unwrap().symbol, "Q1");
        assert_eq!(SJR.parse(" q3 ").unwrap().position, 3);
        assert_eq!(SJR.parse("SJR Q2").unwrap().symbol, "Q2");
        assert!(SJR.parse("-").is_none());
        assert!(SJR.parse("Q5").is_none());
        assert!(SJR.parse("Q12").is_none());
        assert!(SJR.parse("").is_none());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!(CORE.parse("a*").unwrap().symbol, "A*");
        assert_eq!(CORE.parse(" A * ").unwrap().symbol, "A*");
        assert!(CORE.parse("D").is_none());
        assert!(CORE.parse("Unranked").is_none());
        assert_eq!(ABDC.parse("D").unwrap().position, 4);
        assert!(CCF.parse("A*").is_none());
    }

    #[test]
    fn test_vhb_star_alias() {
        let v = VHB.parse("A*").unwrap();
        assert_eq!(v.symbol, "A+");
        assert_eq!(v.raw, "A*");
        assert_eq!(v.position, 0);
    }

    #[test]
    fn test_abs_bands_are_not_lexicographic() {
        let star = ABS.parse("4*").unwrap();
        let four = ABS.parse("4").unwrap();
        let one = ABS.parse("1").unwrap();
        assert!(star.position < four.position);
        assert!(four.position < one.position);
        assert_eq!(best(Some(&four), Some(&star)).unwrap().symbol, "4*");
        assert_eq!(best(Some(&star), Some(&four)).unwrap().symbol, "4*");
        assert!(ABS.parse("5").is_none());
    }

    #[test]
    fn test_best_keeps_left_across_scales() {
        let tier = CORE.parse("A").unwrap();
        let band = ABS.parse("4*").unwrap();
        assert_eq!(best(Some(&tier), Some(&band)).unwrap().symbol, "A");
        assert_eq!(best(Some(&band), Some(&tier)).unwrap().symbol, "4*");
    }

    #[test]
    fn test_ordinal_higher_is_better() {
        let low = H5.parse("12").unwrap();
        let high = H5.parse("87").unwrap();
        assert_eq!(best(Some(&low), Some(&high)).unwrap().symbol, "87");
        assert_eq!(high.to_json(), serde_json::json!(87));
        assert!(H5.parse("0").is_none());
        assert!(H5.parse("-3").is_none());
        assert!(H5.parse("n/a").is_none());
    }

    #[test]
    fn test_best_with_absent_side() {
        let q2 = SJR.parse("Q2").unwrap();
        assert_eq!(best(Some(&q2), None), Some(q2.clone()));
        assert_eq!(best(None, Some(&q2)), Some(q2.clone()));
        assert_eq!(best(None, None), None);
    }

    #[test]
    fn test_best_tie_is_commutative_on_raw_text() {
        let upper = SJR.parse("Q1").unwrap();
        let lower = SJR.parse("q1").unwrap();
        assert_eq!(best(Some(&upper), Some(&lower)), best(Some(&lower), Some(&upper)));
    }

    #[test]
    fn test_quartiles_compare_across_quartile_scales() {
        let sjr = SJR.parse("Q3").unwrap();
        let jcr = JCR.parse("Q1").unwrap();
        assert!(sjr.comparable_with(&jcr));
        assert_eq!(best(Some(&sjr), Some(&jcr)).unwrap().symbol, "Q1");
    }

    #[test]
    fn test_tiers_from_different_tables_are_not_comparable() {
        let core = CORE.parse("A").unwrap();
        let ccf = CCF.parse("A").unwrap();
        assert!(!core.comparable_with(&ccf));
    }

    #[test]
    fn test_best_symbol() {
        assert_eq!(
            best_symbol(&JCR, ["Q3", "", "Q2", "garbage"]),
            Some("Q2".to_string())
        );
        assert_eq!(best_symbol(&JCR, ["-", "n/a"]), None);
    }

    #[test]
    fn test_catalogue_lookup() {
        assert_eq!(RankScale::by_id("CORE").unwrap().id, "core");
        assert_eq!(RankScale::by_id(" abs ").unwrap().scheme, Scheme::NumericBand);
        assert!(RankScale::by_id("unknown").is_none());
        assert_eq!(CATALOGUE.len(), 9);
    }
}
