//! drawsync-consensus
//!
//! Majority resolver over draws fetched from independent mirrors.
//!
//! Architectural decisions:
//! - Trust threshold is two distinct mirrors producing byte-identical records
//! - One signature-majority routine serves both the latest-draw decision and
//!   per-draw tail validation
//! - Ties go to the earliest-discovered signature (input order), never to
//!   mirror priority
//!
//! Deterministic, pure logic. No IO. No mirror calls.

mod engine;
mod types;

pub use engine::{resolve_draw, resolve_latest, signature};
pub use types::*;
