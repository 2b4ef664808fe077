use anyhow::Result;
use drawsync_ledger::load_ledger;
use drawsync_sync::HealthReport;
use uuid::Uuid;

use super::{publish_stats, RunContext};

/// Recompute statistics from the ledger on disk. Never touches the network
/// or the ledger file.
pub fn run_stats(ctx: &RunContext) -> Result<()> {
    let ledger = load_ledger(&ctx.ledger_path)?;
    let health = HealthReport::offline(Uuid::new_v4(), ledger.latest_draw_no());
    publish_stats(ctx, &ledger, health)
}
