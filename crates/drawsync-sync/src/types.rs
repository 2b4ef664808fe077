use std::collections::BTreeMap;
use std::fmt;

use drawsync_consensus::ConsensusSummary;
use drawsync_ledger::GapRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Config / errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Gap (target − local highest) above which a bulk fetch replaces
    /// draw-by-draw filling.
    pub bootstrap_threshold: u32,
    /// Number of newest ledger records re-checked against the mirrors.
    pub tail_window: usize,
    /// Upper bound on interior gaps fetched per run.
    pub max_gap_repair: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bootstrap_threshold: 120,
            tail_window: 5,
            max_gap_repair: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// Empty ledger and no mirror produced a latest draw.
    NoDataAvailable,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NoDataAvailable => write!(
                f,
                "no draw data available: local ledger is empty and no source returned the latest draw"
            ),
        }
    }
}

impl std::error::Error for SyncError {}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Nominal,
    Degraded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Incremental,
    Bootstrap,
    /// No mirror answered the latest-draw query; the local ledger was used as is.
    LocalOnly,
}

/// Why a run is degraded. Stable codes; the message is for humans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum HealthReason {
    LatestUnavailable,
    LatestNotAgreed { draw_no: u32, support: usize },
    BootstrapFailed,
    FillStalled { draw_no: u32 },
    TailPatched { draw_no: u32 },
    TailDisputed { draw_no: u32 },
    BehindTarget { local: u32, target: u32 },
    /// The ledger holds records numbered past the resolved latest draw.
    AheadOfTarget { highest: u32, target: u32 },
    LedgerGaps { count: u64 },
}

impl HealthReason {
    pub fn code(&self) -> &'static str {
        match self {
            HealthReason::LatestUnavailable => "latest_unavailable",
            HealthReason::LatestNotAgreed { .. } => "latest_not_agreed",
            HealthReason::BootstrapFailed => "bootstrap_failed",
            HealthReason::FillStalled { .. } => "fill_stalled",
            HealthReason::TailPatched { .. } => "tail_patched",
            HealthReason::TailDisputed { .. } => "tail_disputed",
            HealthReason::BehindTarget { .. } => "behind_target",
            HealthReason::AheadOfTarget { .. } => "ahead_of_target",
            HealthReason::LedgerGaps { .. } => "ledger_gaps",
        }
    }
}

impl fmt::Display for HealthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthReason::LatestUnavailable => write!(f, "latest unavailable, using local cache"),
            HealthReason::LatestNotAgreed { draw_no, support } => write!(
                f,
                "latest draw {draw_no} not agreed by sources (support {support})"
            ),
            HealthReason::BootstrapFailed => {
                write!(f, "bootstrap failed on every source, filling incrementally")
            }
            HealthReason::FillStalled { draw_no } => {
                write!(f, "no source returned draw {draw_no}, fill stopped")
            }
            HealthReason::TailPatched { draw_no } => {
                write!(f, "draw {draw_no} corrected by source majority")
            }
            HealthReason::TailDisputed { draw_no } => {
                write!(f, "sources disagree on draw {draw_no}, ledger kept")
            }
            HealthReason::BehindTarget { local, target } => {
                write!(f, "ledger ends at draw {local}, behind latest {target}")
            }
            HealthReason::AheadOfTarget { highest, target } => {
                write!(f, "ledger holds draw {highest}, past latest {target}")
            }
            HealthReason::LedgerGaps { count } => write!(f, "ledger has {count} missing draw(s)"),
        }
    }
}

/// A reason as persisted: the tagged reason plus its message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonRecord {
    #[serde(flatten)]
    pub reason: HealthReason,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailCounters {
    pub attempted: usize,
    /// Agreed majority matched the ledger.
    pub validated: usize,
    /// Fewer than two sources answered.
    pub skipped: usize,
    /// Agreed majority differed from the ledger and replaced it.
    pub patched: usize,
    /// Sources answered but reached no agreed majority.
    pub mismatched: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapRepairCounters {
    pub attempted: usize,
    pub repaired: usize,
}

/// Cap on gap runs listed in a report; the count is always exact.
pub const MAX_REPORTED_GAP_RANGES: usize = 20;

/// Run-scoped health. Built up step by step by the controller and written
/// into the statistics document; never read back as input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub run_id: Uuid,
    pub status: HealthStatus,
    /// Insertion order, duplicates dropped.
    pub reasons: Vec<ReasonRecord>,
    pub mode: SyncMode,
    pub bootstrap_source: Option<String>,
    /// Highest draw number in the ledger as loaded.
    pub local_latest_draw_no: u32,
    pub target_draw_no: Option<u32>,
    pub consensus: Option<ConsensusSummary>,
    /// Source name → failure messages, in the order they happened.
    pub source_errors: BTreeMap<String, Vec<String>>,
    /// Draws appended by incremental fill.
    pub filled: usize,
    pub gap_repair: GapRepairCounters,
    pub tail: TailCounters,
    /// Missing draw numbers left after the run.
    pub remaining_gap_count: u64,
    /// Lowest runs of missing numbers, at most [`MAX_REPORTED_GAP_RANGES`].
    pub remaining_gaps: Vec<GapRange>,
}

impl HealthReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            status: HealthStatus::Nominal,
            reasons: Vec::new(),
            mode: SyncMode::Incremental,
            bootstrap_source: None,
            local_latest_draw_no: 0,
            target_draw_no: None,
            consensus: None,
            source_errors: BTreeMap::new(),
            filled: 0,
            gap_repair: GapRepairCounters::default(),
            tail: TailCounters::default(),
            remaining_gap_count: 0,
            remaining_gaps: Vec::new(),
        }
    }

    /// Report for a run that never touched the network.
    pub fn offline(run_id: Uuid, local_latest_draw_no: u32) -> Self {
        Self {
            mode: SyncMode::LocalOnly,
            local_latest_draw_no,
            ..Self::new(run_id)
        }
    }

    /// Record `reason` unless already present. Any reason degrades the run.
    pub fn push_reason(&mut self, reason: HealthReason) {
        if self.reasons.iter().any(|r| r.reason == reason) {
            return;
        }
        let message = reason.to_string();
        self.reasons.push(ReasonRecord { reason, message });
        self.status = HealthStatus::Degraded;
    }

    pub fn has_reason(&self, code: &str) -> bool {
        self.reasons.iter().any(|r| r.reason.code() == code)
    }

    pub fn record_source_error(&mut self, source: &str, message: String) {
        self.source_errors
            .entry(source.to_string())
            .or_default()
            .push(message);
    }

    pub fn is_degraded(&self) -> bool {
        self.status == HealthStatus::Degraded
    }
}
