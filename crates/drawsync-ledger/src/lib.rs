//! drawsync-ledger
//!
//! The persisted, de-duplicated draw ledger.
//!
//! - [`Ledger`] is keyed by draw number and iterates ascending.
//! - [`merge`] is the only way records enter it; incoming records win for
//!   shared keys and no existing key is ever dropped.
//! - [`store`] reads and atomically rewrites the ledger file.

mod ledger;
pub mod store;

pub use ledger::{merge, GapRange, Ledger};
pub use store::{load_ledger, save_ledger};
