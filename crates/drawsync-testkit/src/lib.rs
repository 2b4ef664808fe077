//! Test support: deterministic draw fixtures and scripted in-memory mirrors.
//!
//! Scenario tests that span several crates live under `tests/` here.

mod scripted;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use drawsync_ledger::Ledger;
use drawsync_schemas::DrawRecord;
use drawsync_source::DrawSource;

pub use scripted::{CallCounts, ScriptedSource};

/// Date of draw 1; draws are weekly after that.
pub fn first_draw_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2002, 12, 7).expect("valid fixture date")
}

/// Deterministic, valid record for draw `n`.
///
/// Main numbers are `(7n + 11k) mod 45 + 1` for k in 0..6 (always distinct),
/// the bonus uses offset 21.
pub fn fixture_draw(n: u32) -> DrawRecord {
    fixture_with_bonus_offset(n, 21)
}

/// Same draw number, numbers and date as [`fixture_draw`] but a different
/// bonus, so the two never share a signature.
pub fn fixture_variant(n: u32) -> DrawRecord {
    fixture_with_bonus_offset(n, 30)
}

/// A third distinct value for draw `n`.
pub fn fixture_variant2(n: u32) -> DrawRecord {
    fixture_with_bonus_offset(n, 39)
}

fn fixture_with_bonus_offset(n: u32, offset: u32) -> DrawRecord {
    let base = (n as u64 * 7) % 45;
    let mut numbers = [0u8; 6];
    for (k, slot) in numbers.iter_mut().enumerate() {
        *slot = ((base + 11 * k as u64) % 45 + 1) as u8;
    }
    let bonus = ((base + offset as u64) % 45 + 1) as u8;
    let date = first_draw_date() + Duration::days(7 * (n as i64 - 1));
    DrawRecord::new(n, date, numbers, bonus).expect("fixture record is valid")
}

/// Records `from..=to`.
pub fn fixture_range(from: u32, to: u32) -> Vec<DrawRecord> {
    (from..=to).map(fixture_draw).collect()
}

/// Ledger holding draws `1..=n`.
pub fn ledger_through(n: u32) -> Ledger {
    Ledger::from_records(fixture_range(1, n))
}

/// Priority-ordered trait objects for a controller, keeping the concrete
/// handles with the caller for call-count assertions.
pub fn as_sources(sources: &[Arc<ScriptedSource>]) -> Vec<Arc<dyn DrawSource>> {
    sources
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn DrawSource>)
        .collect()
}

/// Write `ledger` as a ledger file at `path`.
pub fn write_ledger_file(path: &std::path::Path, ledger: &Ledger) -> anyhow::Result<()> {
    drawsync_ledger::save_ledger(path, ledger)
}
