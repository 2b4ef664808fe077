use std::collections::BTreeMap;

use drawsync_schemas::DrawRecord;
use drawsync_source::SourceResult;

use crate::{ConsensusOutcome, Signature, AGREEMENT_THRESHOLD};

/// Exact-match signature over the canonical (sorted) record.
pub fn signature(rec: &DrawRecord) -> Signature {
    let nums = rec
        .numbers()
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",");
    Signature(format!(
        "{}|{}|{}|{}",
        rec.draw_no(),
        nums,
        rec.bonus(),
        rec.date().format("%Y-%m-%d")
    ))
}

struct Bucket<'a> {
    signature: Signature,
    record: &'a DrawRecord,
    sources: Vec<&'a str>,
}

fn push_source_once<'a>(sources: &mut Vec<&'a str>, s: &'a str) {
    if !sources.contains(&s) {
        sources.push(s);
    }
}

/// Signature majority over `results`.
///
/// Buckets are kept in first-seen order; the bucket with the most distinct
/// mirrors wins and a tie keeps the earlier bucket.
fn majority<'a, I>(results: I) -> Option<ConsensusOutcome>
where
    I: IntoIterator<Item = &'a SourceResult<DrawRecord>>,
{
    let mut buckets: Vec<Bucket<'a>> = Vec::new();

    for r in results {
        let sig = signature(&r.value);
        match buckets.iter_mut().find(|b| b.signature == sig) {
            Some(b) => push_source_once(&mut b.sources, &r.source),
            None => buckets.push(Bucket {
                signature: sig,
                record: &r.value,
                sources: vec![r.source.as_str()],
            }),
        }
    }

    let mut winner: Option<&Bucket<'a>> = None;
    for b in &buckets {
        // Strictly greater: equal support keeps the earlier signature.
        if winner.map_or(true, |w| b.sources.len() > w.sources.len()) {
            winner = Some(b);
        }
    }

    winner.map(|w| {
        let support = w.sources.len();
        ConsensusOutcome {
            draw_no: w.record.draw_no(),
            signature: w.signature.clone(),
            record: w.record.clone(),
            support,
            agreed: support >= AGREEMENT_THRESHOLD,
            sources: w.sources.iter().map(|s| s.to_string()).collect(),
        }
    })
}

/// Majority decision for one logical draw fetched from several mirrors.
///
/// Returns `None` only for empty input.
pub fn resolve_draw(results: &[SourceResult<DrawRecord>]) -> Option<ConsensusOutcome> {
    majority(results)
}

/// Decide the latest published draw.
///
/// Prefers the highest draw number reported by at least two distinct
/// mirrors; otherwise falls back to the highest number seen anywhere
/// (best effort, `agreed` will be false unless the signature majority
/// says otherwise). The winning value inside that number is decided by
/// [`resolve_draw`]'s majority rule.
pub fn resolve_latest(results: &[SourceResult<DrawRecord>]) -> Option<ConsensusOutcome> {
    let mut groups: BTreeMap<u32, Vec<&SourceResult<DrawRecord>>> = BTreeMap::new();
    for r in results {
        groups.entry(r.value.draw_no()).or_default().push(r);
    }

    let distinct_sources = |group: &[&SourceResult<DrawRecord>]| {
        let mut seen: Vec<&str> = Vec::new();
        for r in group {
            push_source_once(&mut seen, &r.source);
        }
        seen.len()
    };

    let chosen = groups
        .iter()
        .rev()
        .find(|(_, g)| distinct_sources(g.as_slice()) >= AGREEMENT_THRESHOLD)
        .or_else(|| groups.iter().next_back())
        .map(|(_, g)| g)?;

    majority(chosen.iter().copied())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(no: u32, nums: [u8; 6], bonus: u8) -> DrawRecord {
        DrawRecord::new(no, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(), nums, bonus).unwrap()
    }

    fn tagged(src: &str, r: DrawRecord) -> SourceResult<DrawRecord> {
        SourceResult::new(src, r)
    }

    #[test]
    fn signature_is_canonical() {
        let a = rec(1100, [43, 17, 26, 29, 30, 31], 12);
        let b = rec(1100, [17, 26, 29, 30, 31, 43], 12);
        assert_eq!(signature(&a), signature(&b));
        assert_eq!(signature(&a).as_str(), "1100|17,26,29,30,31,43|12|2024-01-06");
    }

    #[test]
    fn empty_input_has_no_outcome() {
        assert!(resolve_latest(&[]).is_none());
        assert!(resolve_draw(&[]).is_none());
    }

    #[test]
    fn same_mirror_twice_counts_once() {
        let a = rec(5, [1, 2, 3, 4, 5, 6], 7);
        let out = resolve_draw(&[tagged("m1", a.clone()), tagged("m1", a)]).unwrap();
        assert_eq!(out.support, 1);
        assert!(!out.agreed);
    }

    #[test]
    fn tie_goes_to_first_seen_signature() {
        let a = rec(5, [1, 2, 3, 4, 5, 6], 7);
        let b = rec(5, [1, 2, 3, 4, 5, 6], 8);
        let out = resolve_draw(&[
            tagged("m1", b.clone()),
            tagged("m2", a.clone()),
            tagged("m3", a),
            tagged("m4", b.clone()),
        ])
        .unwrap();
        assert_eq!(out.record, b);
        assert_eq!(out.support, 2);
        assert_eq!(out.sources, vec!["m1".to_string(), "m4".to_string()]);
    }

    #[test]
    fn latest_prefers_agreed_number_over_lone_higher_number() {
        let r100 = rec(100, [1, 2, 3, 4, 5, 6], 7);
        let r101 = rec(101, [8, 9, 10, 11, 12, 13], 14);
        let out = resolve_latest(&[
            tagged("m1", r101),
            tagged("m2", r100.clone()),
            tagged("m3", r100.clone()),
        ])
        .unwrap();
        assert_eq!(out.draw_no, 100);
        assert!(out.agreed);
        assert_eq!(out.record, r100);
    }

    #[test]
    fn latest_falls_back_to_highest_seen() {
        let out = resolve_latest(&[
            tagged("m1", rec(99, [1, 2, 3, 4, 5, 6], 7)),
            tagged("m2", rec(101, [1, 2, 3, 4, 5, 6], 7)),
            tagged("m3", rec(100, [1, 2, 3, 4, 5, 6], 7)),
        ])
        .unwrap();
        assert_eq!(out.draw_no, 101);
        assert_eq!(out.support, 1);
        assert!(!out.agreed);
    }

    #[test]
    fn number_agreement_with_split_values_is_not_agreed() {
        // Two mirrors agree on the number but not on the content.
        let out = resolve_latest(&[
            tagged("m1", rec(101, [1, 2, 3, 4, 5, 6], 7)),
            tagged("m2", rec(101, [1, 2, 3, 4, 5, 6], 9)),
        ])
        .unwrap();
        assert_eq!(out.draw_no, 101);
        assert_eq!(out.record.bonus(), 7);
        assert!(!out.agreed);
    }
}
