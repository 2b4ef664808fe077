//! Ledger façade: the single merge boundary for draw records.
//!
//! # Invariants
//! - One record per draw number.
//! - Keys only grow: a merge replaces records for shared numbers but never
//!   removes a number that was already present.
//! - Iteration is ascending by draw number (stable output for files and
//!   test comparisons).
//!
//! Gaps in the numbering are tolerated; [`Ledger::gap_ranges`] reports them
//! as runs so the controller can try to close them and flag what remains.

use std::collections::BTreeMap;

use drawsync_schemas::DrawRecord;
use serde::{Deserialize, Serialize};

/// Draw number → record, ordered ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DrawRecord>", into = "Vec<DrawRecord>")]
pub struct Ledger {
    draws: BTreeMap<u32, DrawRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from arbitrary records; later duplicates win.
    pub fn from_records<I: IntoIterator<Item = DrawRecord>>(records: I) -> Self {
        let mut l = Self::new();
        l.extend(records);
        l
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Highest known draw number (0 when empty).
    pub fn latest_draw_no(&self) -> u32 {
        self.draws.keys().next_back().copied().unwrap_or(0)
    }

    pub fn latest(&self) -> Option<&DrawRecord> {
        self.draws.values().next_back()
    }

    pub fn get(&self, draw_no: u32) -> Option<&DrawRecord> {
        self.draws.get(&draw_no)
    }

    pub fn contains(&self, draw_no: u32) -> bool {
        self.draws.contains_key(&draw_no)
    }

    /// Records ascending by draw number.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DrawRecord> + ExactSizeIterator {
        self.draws.values()
    }

    pub fn draw_numbers(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.draws.keys().copied()
    }

    /// The last `k` draw numbers, ascending.
    pub fn tail_numbers(&self, k: usize) -> Vec<u32> {
        let mut tail: Vec<u32> = self.draws.keys().rev().take(k).copied().collect();
        tail.reverse();
        tail
    }

    /// Highest draw number not above `limit` (0 when there is none).
    pub fn highest_at_or_below(&self, limit: u32) -> u32 {
        self.draws
            .range(..=limit)
            .next_back()
            .map(|(&no, _)| no)
            .unwrap_or(0)
    }

    /// Runs of missing draw numbers between 1 and [`Ledger::latest_draw_no`],
    /// ascending. One entry per run, never one per number.
    pub fn gap_ranges(&self) -> impl Iterator<Item = GapRange> + '_ {
        let mut prev = 0u32;
        self.draws.keys().filter_map(move |&no| {
            let run = (no > prev + 1).then(|| GapRange {
                first: prev + 1,
                last: no - 1,
            });
            prev = no;
            run
        })
    }

    /// Number of missing draw numbers below the highest record.
    pub fn gap_count(&self) -> u64 {
        self.gap_ranges().map(|g| g.count()).sum()
    }

    /// Missing draw numbers, ascending, produced lazily.
    pub fn missing(&self) -> impl Iterator<Item = u32> + '_ {
        self.gap_ranges().flat_map(|g| g.first..=g.last)
    }

    /// In-place merge: incoming records override existing ones.
    pub fn apply(&mut self, incoming: &[DrawRecord]) {
        self.extend(incoming.iter().cloned());
    }

    pub fn to_vec(&self) -> Vec<DrawRecord> {
        self.draws.values().cloned().collect()
    }

    fn extend<I: IntoIterator<Item = DrawRecord>>(&mut self, records: I) {
        for r in records {
            self.draws.insert(r.draw_no(), r);
        }
    }
}

impl From<Vec<DrawRecord>> for Ledger {
    fn from(records: Vec<DrawRecord>) -> Self {
        Ledger::from_records(records)
    }
}

impl From<Ledger> for Vec<DrawRecord> {
    fn from(l: Ledger) -> Self {
        l.draws.into_values().collect()
    }
}

/// Inclusive run of missing draw numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRange {
    pub first: u32,
    pub last: u32,
}

impl GapRange {
    pub fn count(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }
}

/// Pure merge: returns `current` with `incoming` applied on top.
///
/// Incoming wins for every shared draw number (the merge is how corrections
/// land); numbers only present in `current` are kept untouched.
pub fn merge(current: &Ledger, incoming: &[DrawRecord]) -> Ledger {
    let mut out = current.clone();
    out.apply(incoming);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
