use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use drawsync_schemas::{MAX_NUMBER, MIN_NUMBER};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOWS: [usize; 3] = [10, 20, 30];
pub const DEFAULT_DECAY: f64 = 0.9;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Window sizes, counted in most recent draws.
    pub windows: Vec<usize>,
    /// Per-draw decay factor; the k-th newest draw in a window weighs `decay^k`.
    pub decay: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            decay: DEFAULT_DECAY,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatsConfigError {
    NoWindows,
    ZeroWindow,
    DecayOutOfRange(f64),
}

impl fmt::Display for StatsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsConfigError::NoWindows => write!(f, "at least one stats window is required"),
            StatsConfigError::ZeroWindow => write!(f, "stats window sizes must be > 0"),
            StatsConfigError::DecayOutOfRange(d) => {
                write!(f, "stats decay must lie strictly between 0 and 1, got {d}")
            }
        }
    }
}

impl std::error::Error for StatsConfigError {}

impl StatsConfig {
    pub fn validate(&self) -> Result<(), StatsConfigError> {
        if self.windows.is_empty() {
            return Err(StatsConfigError::NoWindows);
        }
        if self.windows.contains(&0) {
            return Err(StatsConfigError::ZeroWindow);
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(StatsConfigError::DecayOutOfRange(self.decay));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Number → occurrence count. Every number of the pool is present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(pub BTreeMap<u8, u32>);

impl Default for FrequencyTable {
    fn default() -> Self {
        Self((MIN_NUMBER..=MAX_NUMBER).map(|n| (n, 0)).collect())
    }
}

impl FrequencyTable {
    pub fn count(&self, n: u8) -> u32 {
        self.0.get(&n).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&c| c as u64).sum()
    }

    pub(crate) fn bump(&mut self, n: u8) {
        *self.0.entry(n).or_insert(0) += 1;
    }
}

/// Number → decay-weighted occurrence. Every number of the pool is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedTable(pub BTreeMap<u8, f64>);

impl Default for WeightedTable {
    fn default() -> Self {
        Self((MIN_NUMBER..=MAX_NUMBER).map(|n| (n, 0.0)).collect())
    }
}

impl WeightedTable {
    pub fn weight(&self, n: u8) -> f64 {
        self.0.get(&n).copied().unwrap_or(0.0)
    }

    pub(crate) fn add(&mut self, n: u8, w: f64) {
        *self.0.entry(n).or_insert(0.0) += w;
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub draw_count: usize,
    pub main: FrequencyTable,
    pub bonus: FrequencyTable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Requested size.
    pub size: usize,
    /// Draws actually covered (less than `size` on a short ledger).
    pub draw_count: usize,
    pub first_draw_no: Option<u32>,
    pub last_draw_no: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub main: FrequencyTable,
    pub bonus: FrequencyTable,
    pub weighted_main: WeightedTable,
    pub weighted_bonus: WeightedTable,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub overall: OverallStats,
    pub windows: Vec<WindowStats>,
}
