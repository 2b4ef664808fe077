//! Command handler modules for the drawsync binary.
//!
//! Shared wiring (config → paths, mirrors, controller settings, output)
//! lives here. Command-specific logic lives in the submodules.

pub mod stats;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use drawsync_artifacts::{build_stats_document, write_stats_document, BuildStatsDocumentArgs};
use drawsync_config::{AppConfig, LoadedConfig};
use drawsync_ledger::Ledger;
use drawsync_source::{DrawSource, HttpDrawSource};
use drawsync_stats::aggregate;
use drawsync_sync::{HealthReport, SyncConfig};
use tracing::info;

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

pub struct RunContext {
    pub loaded: LoadedConfig,
    pub app: AppConfig,
    pub ledger_path: PathBuf,
    pub stats_path: PathBuf,
}

impl RunContext {
    /// Load layered config and apply CLI path overrides.
    pub fn load(
        config_paths: &[String],
        ledger: Option<PathBuf>,
        stats: Option<PathBuf>,
    ) -> Result<Self> {
        let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        let loaded = drawsync_config::load_layered_yaml(&path_refs)?;
        let app = AppConfig::from_loaded(&loaded)?;

        let ledger_path = ledger.unwrap_or_else(|| app.storage.ledger_path.clone());
        let stats_path = stats.unwrap_or_else(|| app.storage.stats_path.clone());

        Ok(Self {
            loaded,
            app,
            ledger_path,
            stats_path,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            bootstrap_threshold: self.app.sync.bootstrap_threshold,
            tail_window: self.app.sync.tail_window,
            max_gap_repair: self.app.sync.max_gap_repair,
        }
    }

    /// HTTP mirrors in configured priority order.
    pub fn build_sources(&self) -> Result<Vec<Arc<dyn DrawSource>>> {
        let retry = self.app.http.retry_policy();
        let mut out: Vec<Arc<dyn DrawSource>> = Vec::with_capacity(self.app.sources.len());
        for s in &self.app.sources {
            let headers = s.resolved_headers(&self.app.http)?;
            let src = HttpDrawSource::new(s.name.clone(), s.endpoints(), &headers, retry.clone())
                .with_context(|| format!("build source '{}' failed", s.name))?;
            out.push(Arc::new(src));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Aggregate `ledger`, write the statistics document, print result lines.
pub fn publish_stats(ctx: &RunContext, ledger: &Ledger, health: HealthReport) -> Result<()> {
    let statistics = aggregate(ledger, &ctx.app.stats);
    let doc = build_stats_document(BuildStatsDocumentArgs {
        config_hash: &ctx.loaded.config_hash,
        ledger,
        statistics,
        health,
        generated_at_utc: Utc::now(),
    });
    write_stats_document(&ctx.stats_path, &doc)?;
    info!(path = %ctx.stats_path.display(), "statistics written");

    print_summary(&doc.health, ledger, &ctx.ledger_path, &ctx.stats_path);
    Ok(())
}

fn print_summary(health: &HealthReport, ledger: &Ledger, ledger_path: &Path, stats_path: &Path) {
    let reasons: Vec<&str> = health.reasons.iter().map(|r| r.reason.code()).collect();
    let target = health
        .target_draw_no
        .map(|n| n.to_string())
        .unwrap_or_else(|| "none".to_string());

    println!("run_id={}", health.run_id);
    println!("status={}", status_str(health));
    println!("mode={}", mode_str(health));
    println!("total_draws={}", ledger.len());
    println!("latest_draw_no={}", ledger.latest_draw_no());
    println!("target_draw_no={target}");
    println!("reasons={}", reasons.join(","));
    println!("ledger_path={}", ledger_path.display());
    println!("stats_path={}", stats_path.display());
}

fn status_str(h: &HealthReport) -> &'static str {
    if h.is_degraded() {
        "degraded"
    } else {
        "nominal"
    }
}

fn mode_str(h: &HealthReport) -> &'static str {
    match h.mode {
        drawsync_sync::SyncMode::Incremental => "incremental",
        drawsync_sync::SyncMode::Bootstrap => "bootstrap",
        drawsync_sync::SyncMode::LocalOnly => "local_only",
    }
}
