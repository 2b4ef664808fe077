//! Statistics document: the run's published output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use drawsync_ledger::{store::write_json_atomic, Ledger};
use drawsync_schemas::DrawRecord;
use drawsync_stats::{OverallStats, Statistics, WindowStats};
use drawsync_sync::HealthReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATS_SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub generated_at_utc: DateTime<Utc>,
    pub config_hash: String,
    pub health: HealthReport,
    pub last_draw: Option<DrawRecord>,
    pub total_draws: usize,
    pub overall: OverallStats,
    pub windows: Vec<WindowStats>,
}

pub struct BuildStatsDocumentArgs<'a> {
    pub config_hash: &'a str,
    pub ledger: &'a Ledger,
    pub statistics: Statistics,
    pub health: HealthReport,
    pub generated_at_utc: DateTime<Utc>,
}

pub fn build_stats_document(args: BuildStatsDocumentArgs<'_>) -> StatsDocument {
    StatsDocument {
        schema_version: STATS_SCHEMA_VERSION,
        run_id: args.health.run_id,
        generated_at_utc: args.generated_at_utc,
        config_hash: args.config_hash.to_string(),
        last_draw: args.ledger.latest().cloned(),
        total_draws: args.ledger.len(),
        overall: args.statistics.overall,
        windows: args.statistics.windows,
        health: args.health,
    }
}

/// Atomically replace the statistics file at `path`.
pub fn write_stats_document(path: &Path, doc: &StatsDocument) -> Result<()> {
    write_json_atomic(path, doc)
        .with_context(|| format!("write stats document failed: {}", path.display()))
}

pub fn read_stats_document(path: &Path) -> Result<StatsDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read stats document failed: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parse stats document failed: {}", path.display()))
}
