//! drawsync-sync
//!
//! The synchronization controller: one batch run that brings the local
//! ledger up to the draw the mirrors agree is latest, then re-checks the
//! newest records against the mirrors.
//!
//! It does **not**:
//! - read or write files (callers load and persist the ledger)
//! - schedule itself (one call to [`SyncController::run`] per run)
//! - abort on mirror failures, except when there is nothing at all to work
//!   with ([`SyncError::NoDataAvailable`])

mod controller;
mod types;

pub use controller::{SyncController, SyncOutcome};
pub use types::*;
