use std::sync::Arc;

use drawsync_consensus::{resolve_draw, resolve_latest, signature, ConsensusOutcome};
use drawsync_ledger::Ledger;
use drawsync_schemas::DrawRecord;
use drawsync_source::{DrawSource, SourceError, SourceResult};
use futures_util::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{HealthReason, HealthReport, SyncConfig, SyncError, SyncMode, MAX_REPORTED_GAP_RANGES};

/// Result of one run: the merged ledger (to be persisted by the caller) and
/// the run's health.
#[derive(Clone, Debug)]
pub struct SyncOutcome {
    pub ledger: Ledger,
    pub health: HealthReport,
}

/// Drives one synchronization run over a prioritized set of mirrors.
///
/// Mirror order is fallback order: bootstrap and draw-by-draw fetches try
/// sources front to back. The latest-draw query and tail validation ask
/// every source at once.
pub struct SyncController {
    sources: Vec<Arc<dyn DrawSource>>,
    cfg: SyncConfig,
}

impl SyncController {
    pub fn new(sources: Vec<Arc<dyn DrawSource>>, cfg: SyncConfig) -> Self {
        Self { sources, cfg }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.cfg
    }

    pub async fn run(&self, current: Ledger) -> Result<SyncOutcome, SyncError> {
        self.run_with_id(current, Uuid::new_v4()).await
    }

    pub async fn run_with_id(
        &self,
        current: Ledger,
        run_id: Uuid,
    ) -> Result<SyncOutcome, SyncError> {
        let mut ledger = current;
        let mut health = HealthReport::new(run_id);
        health.local_latest_draw_no = ledger.latest_draw_no();

        info!(
            %run_id,
            sources = self.sources.len(),
            local_draws = ledger.len(),
            local_latest = health.local_latest_draw_no,
            "sync start"
        );

        // ----- target -----
        let latest = self.fetch_latest_all(&mut health).await;
        let consensus = resolve_latest(&latest);

        match &consensus {
            None if ledger.is_empty() => {
                warn!(%run_id, "no source returned the latest draw and the ledger is empty");
                return Err(SyncError::NoDataAvailable);
            }
            None => {
                health.mode = SyncMode::LocalOnly;
                degrade(&mut health, HealthReason::LatestUnavailable);
            }
            Some(c) => {
                info!(
                    draw_no = c.draw_no,
                    support = c.support,
                    agreed = c.agreed,
                    "latest draw resolved"
                );
                health.target_draw_no = Some(c.draw_no);
                health.consensus = Some(c.summary());
                if !c.agreed {
                    degrade(
                        &mut health,
                        HealthReason::LatestNotAgreed {
                            draw_no: c.draw_no,
                            support: c.support,
                        },
                    );
                }
                self.acquire(&mut ledger, c.draw_no, &mut health).await;
            }
        }

        // ----- patch -----
        if let Some(c) = &consensus {
            patch_target(&mut ledger, c);
        }

        // ----- tail -----
        self.validate_tail(&mut ledger, &mut health).await;

        // ----- finalize -----
        if let Some(target) = health.target_draw_no {
            let local = ledger.highest_at_or_below(target);
            if local < target {
                degrade(&mut health, HealthReason::BehindTarget { local, target });
            }
            let highest = ledger.latest_draw_no();
            if highest > target {
                degrade(&mut health, HealthReason::AheadOfTarget { highest, target });
            }
        }
        health.remaining_gap_count = ledger.gap_count();
        health.remaining_gaps = ledger.gap_ranges().take(MAX_REPORTED_GAP_RANGES).collect();
        if health.remaining_gap_count > 0 {
            let count = health.remaining_gap_count;
            degrade(&mut health, HealthReason::LedgerGaps { count });
        }

        info!(
            %run_id,
            status = ?health.status,
            mode = ?health.mode,
            draws = ledger.len(),
            latest = ledger.latest_draw_no(),
            reasons = health.reasons.len(),
            "sync done"
        );
        Ok(SyncOutcome { ledger, health })
    }

    // ---------------------------------------------------------------------
    // Steps
    // ---------------------------------------------------------------------

    /// Ask every source for its latest draw concurrently. Results come back
    /// in source order; failures are recorded and dropped.
    async fn fetch_latest_all(&self, health: &mut HealthReport) -> Vec<SourceResult<DrawRecord>> {
        let calls = self.sources.iter().map(|s| async move {
            let res = s.fetch_latest().await;
            (s.name(), res)
        });

        let mut out = Vec::new();
        for (name, res) in join_all(calls).await {
            match res {
                Ok(rec) => {
                    debug!(source = name, draw_no = rec.draw_no(), "latest");
                    out.push(SourceResult::new(name, rec));
                }
                Err(e) => source_failed(health, name, "fetch_latest", &e),
            }
        }
        out
    }

    /// Bring the ledger up to `target`: bulk bootstrap when the ledger is
    /// empty or too far behind, then bounded gap repair, then draw-by-draw.
    ///
    /// Progress is measured against the highest record at or below `target`,
    /// so a stray record numbered past it never blocks the fill.
    async fn acquire(&self, ledger: &mut Ledger, target: u32, health: &mut HealthReport) {
        let gap = target.saturating_sub(ledger.highest_at_or_below(target));
        if ledger.is_empty() || gap > self.cfg.bootstrap_threshold {
            info!(gap, threshold = self.cfg.bootstrap_threshold, "bootstrapping from bulk source");
            match self.bootstrap(health).await {
                Some((source, records)) => {
                    info!(source = %source, draws = records.len(), "bootstrap merged");
                    ledger.apply(&records);
                    health.mode = SyncMode::Bootstrap;
                    health.bootstrap_source = Some(source);
                }
                None => degrade(health, HealthReason::BootstrapFailed),
            }
        }

        self.repair_gaps(ledger, target, health).await;
        self.fill(ledger, target, health).await;
    }

    /// First source (in priority order) whose bulk list is non-empty.
    async fn bootstrap(&self, health: &mut HealthReport) -> Option<(String, Vec<DrawRecord>)> {
        for s in &self.sources {
            match s.fetch_all().await {
                Ok(records) if !records.is_empty() => {
                    return Some((s.name().to_string(), records));
                }
                Ok(_) => {
                    warn!(source = s.name(), "bulk list empty");
                    health.record_source_error(s.name(), "fetch_all: empty bulk list".to_string());
                }
                Err(e) => source_failed(health, s.name(), "fetch_all", &e),
            }
        }
        None
    }

    /// Interior gaps below the fill start, lowest first, bounded by
    /// `max_gap_repair`.
    async fn repair_gaps(&self, ledger: &mut Ledger, target: u32, health: &mut HealthReport) {
        let base = ledger.highest_at_or_below(target);
        let gaps: Vec<u32> = ledger
            .missing()
            .take_while(|&n| n < base)
            .take(self.cfg.max_gap_repair)
            .collect();
        if gaps.is_empty() {
            return;
        }
        info!(count = gaps.len(), first = gaps[0], "repairing ledger gaps");

        for n in gaps {
            health.gap_repair.attempted += 1;
            if let Some(rec) = self.fetch_first(n, health).await {
                ledger.apply(std::slice::from_ref(&rec));
                health.gap_repair.repaired += 1;
            }
        }
    }

    /// Draw-by-draw from the highest record at or below `target` up to and
    /// including `target`. Stops at the first draw no source can provide.
    async fn fill(&self, ledger: &mut Ledger, target: u32, health: &mut HealthReport) {
        let start = ledger.highest_at_or_below(target).saturating_add(1);
        for n in start..=target {
            match self.fetch_first(n, health).await {
                Some(rec) => {
                    ledger.apply(std::slice::from_ref(&rec));
                    health.filled += 1;
                }
                None => {
                    degrade(health, HealthReason::FillStalled { draw_no: n });
                    break;
                }
            }
        }
    }

    /// Draw `n` from the first source that has it.
    async fn fetch_first(&self, n: u32, health: &mut HealthReport) -> Option<DrawRecord> {
        for s in &self.sources {
            match s.fetch_one(n).await {
                Ok(rec) if rec.draw_no() == n => return Some(rec),
                Ok(rec) => health.record_source_error(
                    s.name(),
                    format!("fetch_one({n}): returned draw {}", rec.draw_no()),
                ),
                Err(e) => source_failed(health, s.name(), &format!("fetch_one({n})"), &e),
            }
        }
        None
    }

    /// Re-check the newest `tail_window` records against every source.
    async fn validate_tail(&self, ledger: &mut Ledger, health: &mut HealthReport) {
        for n in ledger.tail_numbers(self.cfg.tail_window) {
            health.tail.attempted += 1;
            let responses = self.fetch_one_all(n, health).await;
            if responses.len() < 2 {
                debug!(draw_no = n, responses = responses.len(), "tail check skipped");
                health.tail.skipped += 1;
                continue;
            }

            let Some(outcome) = resolve_draw(&responses) else {
                health.tail.skipped += 1;
                continue;
            };
            if !outcome.agreed {
                health.tail.mismatched += 1;
                degrade(health, HealthReason::TailDisputed { draw_no: n });
                continue;
            }

            let matches = ledger
                .get(n)
                .map(|cur| signature(cur) == outcome.signature)
                .unwrap_or(false);
            if matches {
                health.tail.validated += 1;
            } else {
                ledger.apply(std::slice::from_ref(&outcome.record));
                health.tail.patched += 1;
                degrade(health, HealthReason::TailPatched { draw_no: n });
            }
        }
    }

    async fn fetch_one_all(&self, n: u32, health: &mut HealthReport) -> Vec<SourceResult<DrawRecord>> {
        let calls = self.sources.iter().map(|s| async move {
            let res = s.fetch_one(n).await;
            (s.name(), res)
        });

        let mut out = Vec::new();
        for (name, res) in join_all(calls).await {
            match res {
                Ok(rec) if rec.draw_no() == n => out.push(SourceResult::new(name, rec)),
                Ok(rec) => health.record_source_error(
                    name,
                    format!("fetch_one({n}): returned draw {}", rec.draw_no()),
                ),
                Err(e) => source_failed(health, name, &format!("fetch_one({n})"), &e),
            }
        }
        out
    }
}

fn patch_target(ledger: &mut Ledger, c: &ConsensusOutcome) {
    let differs = ledger
        .get(c.draw_no)
        .map(|cur| signature(cur) != c.signature)
        .unwrap_or(true);
    if differs {
        debug!(draw_no = c.draw_no, "merging consensus record");
    }
    ledger.apply(std::slice::from_ref(&c.record));
}

fn degrade(health: &mut HealthReport, reason: HealthReason) {
    warn!(code = reason.code(), "{reason}");
    health.push_reason(reason);
}

fn source_failed(health: &mut HealthReport, source: &str, op: &str, err: &SourceError) {
    warn!(source, op, error = %err, "source call failed");
    health.record_source_error(source, format!("{op}: {err}"));
}
