use anyhow::Result;
use drawsync_ledger::{load_ledger, save_ledger};
use drawsync_sync::SyncController;
use tracing::{info, warn};

use super::{publish_stats, RunContext};

/// Full run: load → sync → persist ledger → statistics.
///
/// A fatal sync error returns before anything is written.
pub async fn run_sync(ctx: &RunContext) -> Result<()> {
    let ledger = load_ledger(&ctx.ledger_path)?;
    let sources = ctx.build_sources()?;
    if sources.is_empty() {
        warn!("no sources configured; only the local ledger is available");
    }
    info!(
        config_hash = %ctx.loaded.config_hash,
        sources = sources.len(),
        ledger = %ctx.ledger_path.display(),
        "sync run"
    );

    let controller = SyncController::new(sources, ctx.sync_config());
    let outcome = controller.run(ledger).await?;

    save_ledger(&ctx.ledger_path, &outcome.ledger)?;
    info!(path = %ctx.ledger_path.display(), draws = outcome.ledger.len(), "ledger written");

    publish_stats(ctx, &outcome.ledger, outcome.health)
}
