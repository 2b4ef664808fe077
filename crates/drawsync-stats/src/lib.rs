//! drawsync-stats
//!
//! Frequency statistics derived from the ledger. Always recomputed in full
//! from the ledger's current contents; nothing here is incremental or
//! persisted between runs.

mod aggregate;
mod types;

pub use aggregate::aggregate;
pub use types::*;
