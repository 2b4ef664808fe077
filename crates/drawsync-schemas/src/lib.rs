//! drawsync-schemas
//!
//! Canonical draw record shared by every drawsync crate.
//!
//! A [`DrawRecord`] can only be built through [`DrawRecord::new`], which
//! validates the number pool and stores the main numbers ascending. The
//! serde path goes through the same constructor, so a ledger file that
//! violates the invariant fails to load instead of leaking bad records.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lowest number in the draw pool.
pub const MIN_NUMBER: u8 = 1;
/// Highest number in the draw pool.
pub const MAX_NUMBER: u8 = 45;
/// Count of main numbers per draw.
pub const MAIN_COUNT: usize = 6;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invariant violations surfaced by [`DrawRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Draw numbers start at 1.
    ZeroDrawNo,
    /// A main number is outside `[MIN_NUMBER, MAX_NUMBER]`.
    NumberOutOfRange { value: u8 },
    /// The same main number appears twice.
    DuplicateNumber { value: u8 },
    /// The bonus number is outside `[MIN_NUMBER, MAX_NUMBER]`.
    BonusOutOfRange { value: u8 },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::ZeroDrawNo => write!(f, "draw_no must be > 0"),
            RecordError::NumberOutOfRange { value } => write!(
                f,
                "main number {value} outside {MIN_NUMBER}..={MAX_NUMBER}"
            ),
            RecordError::DuplicateNumber { value } => {
                write!(f, "main number {value} appears more than once")
            }
            RecordError::BonusOutOfRange { value } => write!(
                f,
                "bonus number {value} outside {MIN_NUMBER}..={MAX_NUMBER}"
            ),
        }
    }
}

impl std::error::Error for RecordError {}

// ---------------------------------------------------------------------------
// DrawRecord
// ---------------------------------------------------------------------------

/// One published draw.
///
/// `numbers` is always sorted ascending and holds six distinct values.
/// `bonus` is drawn independently and may coincide with a main number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DrawRecordRepr", into = "DrawRecordRepr")]
pub struct DrawRecord {
    draw_no: u32,
    date: NaiveDate,
    numbers: [u8; MAIN_COUNT],
    bonus: u8,
}

impl DrawRecord {
    pub fn new(
        draw_no: u32,
        date: NaiveDate,
        mut numbers: [u8; MAIN_COUNT],
        bonus: u8,
    ) -> Result<Self, RecordError> {
        if draw_no == 0 {
            return Err(RecordError::ZeroDrawNo);
        }
        for &n in &numbers {
            if !in_pool(n) {
                return Err(RecordError::NumberOutOfRange { value: n });
            }
        }
        numbers.sort_unstable();
        for w in numbers.windows(2) {
            if w[0] == w[1] {
                return Err(RecordError::DuplicateNumber { value: w[0] });
            }
        }
        if !in_pool(bonus) {
            return Err(RecordError::BonusOutOfRange { value: bonus });
        }
        Ok(Self {
            draw_no,
            date,
            numbers,
            bonus,
        })
    }

    pub fn draw_no(&self) -> u32 {
        self.draw_no
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Main numbers in canonical ascending order.
    pub fn numbers(&self) -> &[u8; MAIN_COUNT] {
        &self.numbers
    }

    pub fn bonus(&self) -> u8 {
        self.bonus
    }

    /// True when `n` is one of the six main numbers.
    pub fn contains(&self, n: u8) -> bool {
        self.numbers.binary_search(&n).is_ok()
    }
}

impl fmt::Display for DrawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {:?} + {}",
            self.draw_no, self.date, self.numbers, self.bonus
        )
    }
}

fn in_pool(n: u8) -> bool {
    (MIN_NUMBER..=MAX_NUMBER).contains(&n)
}

/// On-disk shape of a [`DrawRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DrawRecordRepr {
    draw_no: u32,
    date: NaiveDate,
    numbers: [u8; MAIN_COUNT],
    bonus: u8,
}

impl TryFrom<DrawRecordRepr> for DrawRecord {
    type Error = RecordError;

    fn try_from(r: DrawRecordRepr) -> Result<Self, Self::Error> {
        DrawRecord::new(r.draw_no, r.date, r.numbers, r.bonus)
    }
}

impl From<DrawRecord> for DrawRecordRepr {
    fn from(r: DrawRecord) -> Self {
        Self {
            draw_no: r.draw_no,
            date: r.date,
            numbers: r.numbers,
            bonus: r.bonus,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn new_sorts_main_numbers() {
        let r = DrawRecord::new(1, date("2002-12-07"), [40, 10, 23, 29, 33, 37], 16).unwrap();
        assert_eq!(r.numbers(), &[10, 23, 29, 33, 37, 40]);
        assert!(r.contains(29));
        assert!(!r.contains(16));
    }

    #[test]
    fn bonus_may_repeat_a_main_number() {
        let r = DrawRecord::new(2, date("2002-12-14"), [9, 13, 21, 25, 32, 42], 9);
        assert!(r.is_ok());
    }

    #[test]
    fn rejects_duplicates_range_and_zero() {
        let d = date("2002-12-07");
        assert_eq!(
            DrawRecord::new(1, d, [1, 1, 2, 3, 4, 5], 6).unwrap_err(),
            RecordError::DuplicateNumber { value: 1 }
        );
        assert_eq!(
            DrawRecord::new(1, d, [0, 1, 2, 3, 4, 5], 6).unwrap_err(),
            RecordError::NumberOutOfRange { value: 0 }
        );
        assert_eq!(
            DrawRecord::new(1, d, [1, 2, 3, 4, 5, 46], 6).unwrap_err(),
            RecordError::NumberOutOfRange { value: 46 }
        );
        assert_eq!(
            DrawRecord::new(1, d, [1, 2, 3, 4, 5, 6], 46).unwrap_err(),
            RecordError::BonusOutOfRange { value: 46 }
        );
        assert_eq!(
            DrawRecord::new(0, d, [1, 2, 3, 4, 5, 6], 7).unwrap_err(),
            RecordError::ZeroDrawNo
        );
    }

    #[test]
    fn json_shape_is_stable() {
        let r = DrawRecord::new(1, date("2002-12-07"), [40, 10, 23, 29, 33, 37], 16).unwrap();
        let s = serde_json::to_string(&r).unwrap();
        assert_eq!(
            s,
            r#"{"draw_no":1,"date":"2002-12-07","numbers":[10,23,29,33,37,40],"bonus":16}"#
        );
        let back: DrawRecord = serde_json::from_str(&s).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn deserialize_enforces_invariant() {
        let bad = r#"{"draw_no":3,"date":"2002-12-21","numbers":[1,1,2,3,4,5],"bonus":7}"#;
        assert!(serde_json::from_str::<DrawRecord>(bad).is_err());
    }

    #[test]
    fn deserialize_sorts_unsorted_file_entries() {
        let raw = r#"{"draw_no":3,"date":"2002-12-21","numbers":[45,1,2,3,4,5],"bonus":7}"#;
        let r: DrawRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(r.numbers(), &[1, 2, 3, 4, 5, 45]);
    }
}
