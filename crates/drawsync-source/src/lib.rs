//! drawsync-source
//!
//! Mirror adapters for draw ingestion.
//!
//! This crate owns the [`DrawSource`] capability, the record normalizer and
//! the HTTP mirror adapter. It does **not** merge or persist anything;
//! the sync controller fetches through adapters and hands records to
//! `drawsync-consensus` and `drawsync-ledger`.

pub mod http;
pub mod normalizer;
pub mod provider;
pub mod retry;

pub use http::{HttpDrawSource, HttpEndpoints};
pub use normalizer::{normalize, normalize_list, NormalizeError};
pub use provider::{DrawSource, SourceError, SourceResult};
pub use retry::RetryPolicy;
