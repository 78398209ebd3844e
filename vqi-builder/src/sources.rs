//! Readers turning source files into raw `(name, rankText)` rows, or into
//! bare venue names for membership lists
//!
//! Readers only split rows. They do not normalize names or parse ranks; the
//! merge index does that and counts what it rejects. Rows a reader cannot
//! split at all are counted in [`RawRows::skipped`].

use crate::error::{BuildError, BuildResult};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// SCImago column holding the journal title
pub const SCIMAGO_TITLE: &str = "Title";

/// SCImago column holding the best quartile over all categories
pub const SCIMAGO_QUARTILE: &str = "SJR Best Quartile";

/// Raw rows read from one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRows {
    /// `(name, rankText)` in file order
    pub pairs: Vec<(String, String)>,
    /// Rows dropped because they had no name/rank cells
    pub skipped: usize,
}

impl RawRows {
    fn push(&mut self, name: &str, rank_text: &str) {
        self.pairs.push((name.trim().to_string(), rank_text.trim().to_string()));
    }
}

/// `Venue,Rank` list file (header row optional)
pub fn read_rank_list(path: &Path) -> BuildResult<RawRows> {
    let file = std::fs::File::open(path)?;
    let rows = parse_rank_list(file)?;
    debug!(path = %path.display(), rows = rows.pairs.len(), skipped = rows.skipped, "Read rank list");
    Ok(rows)
}

/// `Venue,Rank` rows from any reader
///
/// The venue cell may hold `|`-separated synonyms. A first row whose venue cell
/// reads `Venue` is taken as a header.
pub fn parse_rank_list<R: Read>(reader: R) -> BuildResult<RawRows> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = RawRows::default();
    for (row_idx, record) in rdr.records().enumerate() {
        let record = record?;
        if row_idx == 0 && record.get(0).is_some_and(|c| c.eq_ignore_ascii_case("venue")) {
            continue;
        }
        match (record.get(0), record.get(1)) {
            (Some(name), Some(rank)) => rows.push(name, rank),
            _ => rows.skipped += 1,
        }
    }
    Ok(rows)
}

/// SCImago Journal Rank CSV export
pub fn read_scimago(path: &Path) -> BuildResult<RawRows> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let rows = parse_scimago(&text)?;
    debug!(path = %path.display(), rows = rows.pairs.len(), skipped = rows.skipped, "Read SCImago export");
    Ok(rows)
}

/// `(Title, SJR Best Quartile)` rows from SCImago export text
///
/// The delimiter is sniffed from the header line.
///
/// # Errors
/// `BuildError::InvalidInput` naming the headers found when either column is
/// missing.
pub fn parse_scimago(text: &str) -> BuildResult<RawRows> {
    let text = text.trim_start_matches('\u{feff}');
    let header_line = text.lines().next().unwrap_or_default();
    let delimiter = sniff_delimiter(header_line);

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (Some(title_idx), Some(quartile_idx)) = (column(SCIMAGO_TITLE), column(SCIMAGO_QUARTILE)) else {
        let have: Vec<&str> = headers.iter().collect();
        return Err(BuildError::InvalidInput(format!(
            "SCImago export is missing '{}' or '{}' columns. Have: {:?}",
            SCIMAGO_TITLE, SCIMAGO_QUARTILE, have
        )));
    };

    let mut rows = RawRows::default();
    for record in rdr.records() {
        let record = record?;
        match (record.get(title_idx), record.get(quartile_idx)) {
            (Some(title), Some(quartile)) => rows.push(title, quartile),
            _ => rows.skipped += 1,
        }
    }
    Ok(rows)
}

/// Pick the delimiter occurring most often in `sample` among `;`, `,` and tab
///
/// Ties go to the earlier candidate, so `;` wins when nothing matches.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let mut best = b';';
    let mut best_count = 0usize;
    for candidate in [b';', b',', b'\t'] {
        let count = sample.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// One-venue-per-line membership list (FT50, UTD24, ERA, predatory lists)
pub fn read_membership_list(path: &Path) -> BuildResult<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let names = parse_membership_list(&String::from_utf8_lossy(&bytes));
    debug!(path = %path.display(), names = names.len(), "Read membership list");
    Ok(names)
}

/// Venue names from membership list text
///
/// Blank lines and `#` comments are dropped. A leading `12. ` numbering is
/// stripped. Lines may hold `|`-separated synonyms; they are kept intact for
/// the merge index to split.
pub fn parse_membership_list(text: &str) -> Vec<String> {
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| strip_numbering(line).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn strip_numbering(line: &str) -> &str {
    match line.split_once('.') {
        Some((number, rest))
            if !number.is_empty()
                && number.bytes().all(|b| b.is_ascii_digit())
                && (rest.is_empty() || rest.starts_with(char::is_whitespace)) =>
        {
            rest.trim_start()
        }
        _ => line,
    }
}

/// Google-Scholar-Orderer rankings JSON
pub fn read_orderer(path: &Path) -> BuildResult<RawRows> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let rows = parse_orderer(&value);
    debug!(path = %path.display(), rows = rows.pairs.len(), skipped = rows.skipped, "Read Orderer rankings");
    Ok(rows)
}

/// `(fullName, h5)` rows from the `conferences` and `journals` sections
///
/// Sections may be objects keyed by acronym or plain arrays. The h5 text is
/// passed through unvalidated; non-positive values are rejected at merge time.
pub fn parse_orderer(data: &Value) -> RawRows {
    let mut rows = RawRows::default();

    for section in ["conferences", "journals"] {
        let entries: Vec<&Value> = match data.get(section) {
            Some(Value::Object(map)) => map.values().collect(),
            Some(Value::Array(items)) => items.iter().collect(),
            _ => continue,
        };

        for entry in entries {
            let name = entry.get("fullName").and_then(Value::as_str);
            let h5 = match entry.get("h5") {
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(Value::String(s)) => Some(s.clone()),
                _ => None,
            };
            match (name, h5) {
                (Some(name), Some(h5)) => rows.push(name, &h5),
                _ => rows.skipped += 1,
            }
        }
    }

    rows
}
