//! Bootstrap path.
//!
//! GREEN when:
//! - an empty ledger is filled from the first mirror whose bulk list works
//! - a ledger further behind than the threshold is bootstrapped too
//! - when no bulk list works the run degrades and fills draw by draw

use std::sync::Arc;

use drawsync_ledger::Ledger;
use drawsync_source::SourceError;
use drawsync_sync::{HealthReason, HealthStatus, SyncConfig, SyncController, SyncMode};
use drawsync_testkit::{as_sources, fixture_range, ledger_through, ScriptedSource};

#[tokio::test]
async fn empty_ledger_bootstraps_from_second_source() {
    let a = Arc::new(
        ScriptedSource::new("a")
            .with_draws(fixture_range(1, 100))
            .failing_all(SourceError::Status(503)),
    );
    let b = Arc::new(ScriptedSource::new("b").with_draws(fixture_range(1, 100)));
    let ctl = SyncController::new(as_sources(&[a.clone(), b.clone()]), SyncConfig::default());

    let out = ctl.run(Ledger::new()).await.unwrap();

    assert_eq!(out.ledger, ledger_through(100));
    let h = &out.health;
    assert_eq!(h.mode, SyncMode::Bootstrap);
    assert_eq!(h.bootstrap_source.as_deref(), Some("b"));
    assert_eq!(h.filled, 0);
    assert_eq!(h.status, HealthStatus::Nominal, "reasons: {:?}", h.reasons);
    assert_eq!(h.source_errors["a"], vec!["fetch_all: http status 503".to_string()]);

    assert_eq!(a.calls().fetch_all, 1);
    assert_eq!(b.calls().fetch_all, 1);
}

#[tokio::test]
async fn first_working_bulk_source_wins() {
    let a = Arc::new(ScriptedSource::new("a").with_draws(fixture_range(1, 30)));
    let b = Arc::new(ScriptedSource::new("b").with_draws(fixture_range(1, 30)));
    let ctl = SyncController::new(as_sources(&[a.clone(), b.clone()]), SyncConfig::default());

    let out = ctl.run(Ledger::new()).await.unwrap();
    assert_eq!(out.health.bootstrap_source.as_deref(), Some("a"));
    assert_eq!(b.calls().fetch_all, 0);
}

#[tokio::test]
async fn gap_above_threshold_bootstraps() {
    let a = Arc::new(ScriptedSource::new("a").with_draws(fixture_range(1, 200)));
    let b = Arc::new(ScriptedSource::new("b").with_draws(fixture_range(1, 200)));
    let cfg = SyncConfig {
        bootstrap_threshold: 120,
        ..SyncConfig::default()
    };
    let ctl = SyncController::new(as_sources(&[a.clone(), b]), cfg);

    let out = ctl.run(ledger_through(10)).await.unwrap();
    assert_eq!(out.health.mode, SyncMode::Bootstrap);
    assert_eq!(out.ledger.len(), 200);
    assert_eq!(a.calls().fetch_all, 1);
}

#[tokio::test]
async fn gap_at_threshold_fills_incrementally() {
    let a = Arc::new(ScriptedSource::new("a").with_draws(fixture_range(1, 30)));
    let b = Arc::new(ScriptedSource::new("b").with_draws(fixture_range(1, 30)));
    let cfg = SyncConfig {
        bootstrap_threshold: 20,
        ..SyncConfig::default()
    };
    let ctl = SyncController::new(as_sources(&[a.clone(), b]), cfg);

    let out = ctl.run(ledger_through(10)).await.unwrap();
    assert_eq!(out.health.mode, SyncMode::Incremental);
    assert_eq!(out.health.filled, 20);
    assert_eq!(out.ledger.len(), 30);
    assert_eq!(a.calls().fetch_all, 0);
}

#[tokio::test]
async fn bootstrap_failure_falls_back_to_incremental() {
    let a = Arc::new(ScriptedSource::new("a").with_draws(fixture_range(1, 3)).without_bulk());
    let b = Arc::new(ScriptedSource::new("b").with_draws(fixture_range(1, 3)).without_bulk());
    let ctl = SyncController::new(as_sources(&[a, b]), SyncConfig::default());

    let out = ctl.run(Ledger::new()).await.unwrap();

    assert_eq!(out.ledger, ledger_through(3));
    let h = &out.health;
    assert_eq!(h.mode, SyncMode::Incremental);
    assert_eq!(h.filled, 3);
    assert_eq!(h.status, HealthStatus::Degraded);
    let reasons: Vec<&HealthReason> = h.reasons.iter().map(|r| &r.reason).collect();
    assert_eq!(reasons, vec![&HealthReason::BootstrapFailed]);
}
