//! Index files on disk
//!
//! Every file is pretty JSON written to `<name>.tmp` and renamed into place, so
//! readers never see a half-written index.

use crate::error::BuildResult;
use crate::index::IndexSnapshot;
use crate::pipeline::BuildMeta;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// `{ "meta": .., "index": .. }` document
#[derive(Debug, Serialize)]
pub struct IndexDocument<'a> {
    pub meta: &'a BuildMeta,
    pub index: &'a IndexSnapshot,
}

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> BuildResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    std::fs::rename(&temp_path, path)?;

    info!(path = %path.display(), bytes = json.len(), "Wrote");
    Ok(())
}

/// Write an index document
pub fn write_index(path: &Path, meta: &BuildMeta, index: &IndexSnapshot) -> BuildResult<()> {
    write_json_atomic(path, &IndexDocument { meta, index })
}

/// Write `errors_<year>.json` into `dir` when there is anything to report
pub fn write_errors(dir: &Path, year: u32, errors: &BTreeMap<String, String>) -> BuildResult<Option<PathBuf>> {
    if errors.is_empty() {
        return Ok(None);
    }
    let path = dir.join(format!("errors_{}.json", year));
    write_json_atomic(&path, errors)?;
    Ok(Some(path))
}

/// `<stem>_<year>[_<edition>].json`
pub fn yearly_file_name(stem: &str, year: u32, edition: Option<&str>) -> String {
    match edition {
        Some(edition) => format!("{}_{}_{}.json", stem, year, edition),
        None => format!("{}_{}.json", stem, year),
    }
}
