use drawsync_ledger::Ledger;
use drawsync_schemas::DrawRecord;

use crate::{FrequencyTable, OverallStats, Statistics, StatsConfig, WeightedTable, WindowStats};

/// Compute overall and windowed frequency statistics from `ledger`.
///
/// Total: an empty ledger yields zero tables and empty window bounds.
pub fn aggregate(ledger: &Ledger, cfg: &StatsConfig) -> Statistics {
    let mut overall = OverallStats {
        draw_count: ledger.len(),
        ..OverallStats::default()
    };
    for rec in ledger.iter() {
        count_into(rec, &mut overall.main, &mut overall.bonus);
    }

    // Newest first; windows are prefixes of this list.
    let newest_first: Vec<&DrawRecord> = ledger.iter().rev().collect();
    let windows = cfg
        .windows
        .iter()
        .map(|&size| window(&newest_first, size, cfg.decay))
        .collect();

    Statistics { overall, windows }
}

fn window(newest_first: &[&DrawRecord], size: usize, decay: f64) -> WindowStats {
    let slice = &newest_first[..size.min(newest_first.len())];

    let mut main = FrequencyTable::default();
    let mut bonus = FrequencyTable::default();
    let mut weighted_main = WeightedTable::default();
    let mut weighted_bonus = WeightedTable::default();

    let mut w = 1.0;
    for rec in slice {
        count_into(rec, &mut main, &mut bonus);
        for &n in rec.numbers() {
            weighted_main.add(n, w);
        }
        weighted_bonus.add(rec.bonus(), w);
        w *= decay;
    }

    let newest = slice.first();
    let oldest = slice.last();

    WindowStats {
        size,
        draw_count: slice.len(),
        first_draw_no: oldest.map(|r| r.draw_no()),
        last_draw_no: newest.map(|r| r.draw_no()),
        start_date: oldest.map(|r| r.date()),
        end_date: newest.map(|r| r.date()),
        main,
        bonus,
        weighted_main,
        weighted_bonus,
    }
}

fn count_into(rec: &DrawRecord, main: &mut FrequencyTable, bonus: &mut FrequencyTable) {
    for &n in rec.numbers() {
        main.bump(n);
    }
    bonus.bump(rec.bonus());
}
