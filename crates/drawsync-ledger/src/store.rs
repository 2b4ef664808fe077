//! Ledger file store.
//!
//! The file is a JSON array of draw records sorted ascending. It is read in
//! full at run start and rewritten wholesale at run end through a sibling
//! temp file + rename, so a crash mid-write never leaves a truncated ledger.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use drawsync_schemas::DrawRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::Ledger;

/// Load the ledger at `path`. A missing or blank file is an empty ledger.
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        info!(path = %path.display(), "no ledger file yet; starting empty");
        return Ok(Ledger::new());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("read ledger failed: {}", path.display()))?;
    let raw = raw.trim_start_matches('\u{feff}');
    if raw.trim().is_empty() {
        return Ok(Ledger::new());
    }

    let records: Vec<DrawRecord> = serde_json::from_str(raw)
        .with_context(|| format!("parse ledger json failed: {}", path.display()))?;
    let read = records.len();
    let ledger = Ledger::from_records(records);
    if ledger.len() != read {
        warn!(
            path = %path.display(),
            duplicates = read - ledger.len(),
            "ledger file held duplicate draw numbers; last entry kept"
        );
    }
    Ok(ledger)
}

/// Atomically replace the ledger file at `path`.
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    write_json_atomic(path, &ledger.to_vec())
}

/// Pretty-print `value` to `path` via a temp file in the same directory.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("create dir failed: {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("serialize json failed")?;
    let tmp = temp_path(path);
    fs::write(&tmp, format!("{json}\n"))
        .with_context(|| format!("write temp file failed: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replace file failed: {}", path.display()))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger.json".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
