//! Canonical draw normalization for mirror payloads.
//!
//! This module converts one mirror's JSON draw object into a [`DrawRecord`].
//! Mirrors disagree on field names (`drwNo` vs `draw_no`, six scalar
//! `drwtNo1..6` fields vs a `numbers` array) and on date shape (ISO
//! timestamp vs plain date); every known alias is accepted here so adapters
//! stay symmetric.
//!
//! It does **not**:
//! - fetch data (see `http.rs`)
//! - decide which mirror to trust (see `drawsync-consensus`)
//!
//! A rejection is reported as `Err(NormalizeError)`; callers treat it as
//! "no data from this attempt", never as a fatal condition.

use std::fmt;

use chrono::NaiveDate;
use drawsync_schemas::{DrawRecord, RecordError, MAIN_COUNT};
use serde_json::{Map, Value};

const DRAW_NO_KEYS: &[&str] = &["draw_no", "drawNo", "drwNo", "round", "no"];
const DATE_KEYS: &[&str] = &["date", "draw_date", "drawDate", "drwNoDate"];
const NUMBERS_KEYS: &[&str] = &["numbers", "nums", "main", "winning_numbers"];
const NUMBER_FIELD_PREFIXES: &[&str] = &["drwtNo", "num", "n"];
const BONUS_KEYS: &[&str] = &["bonus", "bonus_no", "bonusNo", "bnusNo", "bonus_number"];
const WRAPPER_KEYS: &[&str] = &["data", "draw", "result"];
const LIST_KEYS: &[&str] = &["draws", "data", "results", "items"];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a payload could not be turned into a [`DrawRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Payload (or list element) is not a JSON object.
    NotAnObject,
    /// Bulk payload is neither an array nor an object wrapping one.
    NotAList,
    /// A required field is absent under every known alias.
    MissingField { field: &'static str },
    /// Draw number is not a finite positive integer.
    InvalidDrawNo { raw: String },
    /// Main numbers did not contain exactly six values.
    WrongNumberCount { got: usize },
    /// A numeric field was non-numeric, NaN or infinite.
    NonFiniteNumber { field: &'static str, raw: String },
    /// Date could not be truncated to `YYYY-MM-DD`.
    InvalidDate { raw: String },
    /// Values parsed but violate the draw invariant.
    Record(RecordError),
    /// One element of a bulk payload failed.
    Element { index: usize, source: Box<NormalizeError> },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::NotAnObject => write!(f, "payload is not a JSON object"),
            NormalizeError::NotAList => write!(f, "bulk payload is not a list of draws"),
            NormalizeError::MissingField { field } => write!(f, "missing field '{field}'"),
            NormalizeError::InvalidDrawNo { raw } => {
                write!(f, "draw number is not a positive integer: '{raw}'")
            }
            NormalizeError::WrongNumberCount { got } => {
                write!(f, "expected {MAIN_COUNT} main numbers, got {got}")
            }
            NormalizeError::NonFiniteNumber { field, raw } => {
                write!(f, "field '{field}' is not a finite number: '{raw}'")
            }
            NormalizeError::InvalidDate { raw } => {
                write!(f, "date is not truncatable to YYYY-MM-DD: '{raw}'")
            }
            NormalizeError::Record(e) => write!(f, "record invariant: {e}"),
            NormalizeError::Element { index, source } => {
                write!(f, "element {index}: {source}")
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

impl From<RecordError> for NormalizeError {
    fn from(e: RecordError) -> Self {
        NormalizeError::Record(e)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a single mirror draw object.
pub fn normalize(raw: &Value) -> Result<DrawRecord, NormalizeError> {
    let obj = unwrap_record(raw)?;

    let draw_no_raw = lookup(obj, DRAW_NO_KEYS).ok_or(NormalizeError::MissingField {
        field: "draw_no",
    })?;
    let draw_no = parse_draw_no(draw_no_raw)?;

    let numbers = extract_numbers(obj)?;

    let date_raw = lookup(obj, DATE_KEYS).ok_or(NormalizeError::MissingField { field: "date" })?;
    let date = parse_date(date_raw)?;

    let bonus_raw = lookup(obj, BONUS_KEYS).ok_or(NormalizeError::MissingField { field: "bonus" })?;
    let bonus = coerce_ball(bonus_raw, "bonus")?;

    Ok(DrawRecord::new(draw_no, date, numbers, bonus)?)
}

/// Normalize a bulk payload: a top-level array, or an object wrapping one.
///
/// All-or-nothing: one bad element rejects the whole payload, because a
/// bulk answer is accepted wholesale from a single mirror.
pub fn normalize_list(raw: &Value) -> Result<Vec<DrawRecord>, NormalizeError> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .ok_or(NormalizeError::NotAList)?,
        _ => return Err(NormalizeError::NotAList),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            normalize(item).map_err(|e| NormalizeError::Element {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn unwrap_record(raw: &Value) -> Result<&Map<String, Value>, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;
    if lookup(obj, DRAW_NO_KEYS).is_some() {
        return Ok(obj);
    }
    // One level of envelope, e.g. {"data": {...}}.
    for k in WRAPPER_KEYS {
        if let Some(inner) = obj.get(*k).and_then(Value::as_object) {
            return Ok(inner);
        }
    }
    Ok(obj)
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .filter(|v| !v.is_null())
}

fn raw_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_finite(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

fn parse_draw_no(v: &Value) -> Result<u32, NormalizeError> {
    let invalid = || NormalizeError::InvalidDrawNo { raw: raw_text(v) };
    let f = as_finite(v).ok_or_else(invalid)?;
    if f <= 0.0 || f.fract() != 0.0 || f > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(f as u32)
}

/// Coerce a ball value to an integer (truncating) and fit it into `u8`.
/// Range checks against the pool are left to [`DrawRecord::new`].
fn coerce_ball(v: &Value, field: &'static str) -> Result<u8, NormalizeError> {
    let f = as_finite(v).ok_or_else(|| NormalizeError::NonFiniteNumber {
        field,
        raw: raw_text(v),
    })?;
    let t = f.trunc();
    // Out-of-u8 values map to 0, which the pool check rejects.
    Ok(if (0.0..=u8::MAX as f64).contains(&t) {
        t as u8
    } else {
        0
    })
}

fn extract_numbers(obj: &Map<String, Value>) -> Result<[u8; MAIN_COUNT], NormalizeError> {
    let values: Vec<&Value> = if let Some(arr) = lookup(obj, NUMBERS_KEYS) {
        arr.as_array()
            .ok_or_else(|| NormalizeError::NonFiniteNumber {
                field: "numbers",
                raw: raw_text(arr),
            })?
            .iter()
            .collect()
    } else {
        let prefix = NUMBER_FIELD_PREFIXES
            .iter()
            .find(|p| obj.contains_key(&format!("{p}1")))
            .ok_or(NormalizeError::MissingField { field: "numbers" })?;
        (1..=MAIN_COUNT)
            .filter_map(|i| obj.get(&format!("{prefix}{i}")))
            .collect()
    };

    if values.len() != MAIN_COUNT {
        return Err(NormalizeError::WrongNumberCount { got: values.len() });
    }

    let mut out = [0u8; MAIN_COUNT];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = coerce_ball(v, "numbers")?;
    }
    Ok(out)
}

fn parse_date(v: &Value) -> Result<NaiveDate, NormalizeError> {
    let s = v.as_str().ok_or_else(|| NormalizeError::InvalidDate { raw: raw_text(v) })?;
    let head = s
        .trim()
        .get(..10)
        .ok_or_else(|| NormalizeError::InvalidDate { raw: s.to_string() })?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|_| NormalizeError::InvalidDate { raw: s.to_string() })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
