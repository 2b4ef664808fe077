//! Source boundary for draw ingestion.
//!
//! This module defines **only** the capability trait every mirror adapter
//! implements, the per-call error type, and the [`SourceResult`] tag.
//! No HTTP, no normalization, no consensus logic belong here.

use std::fmt;

use drawsync_schemas::DrawRecord;

use crate::normalizer::NormalizeError;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`DrawSource`] call may return.
///
/// Callers do not branch on the variant: every error means "no data from
/// this adapter for this call". The variants exist for logs and the health
/// report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network or transport failure (connect, TLS, body read).
    Transport(String),
    /// The per-attempt timeout elapsed.
    Timeout { timeout_ms: u64 },
    /// Non-2xx HTTP status.
    Status(u16),
    /// Body looked like an HTML page (interstitial / error page).
    HtmlBody,
    /// Body was not valid JSON.
    Decode(String),
    /// JSON parsed but the normalizer rejected it.
    Rejected(NormalizeError),
    /// The adapter cannot serve this call as configured.
    Config(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Transport(msg) => write!(f, "transport error: {msg}"),
            SourceError::Timeout { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            SourceError::Status(code) => write!(f, "http status {code}"),
            SourceError::HtmlBody => write!(f, "html body where json was expected"),
            SourceError::Decode(msg) => write!(f, "decode error: {msg}"),
            SourceError::Rejected(e) => write!(f, "payload rejected: {e}"),
            SourceError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Transport trouble, timeouts and non-2xx answers may clear on a retry;
    /// a body that was served but unusable will not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Transport(_) | SourceError::Timeout { .. } | SourceError::Status(_)
        )
    }
}

impl From<NormalizeError> for SourceError {
    fn from(e: NormalizeError) -> Self {
        SourceError::Rejected(e)
    }
}

// ---------------------------------------------------------------------------
// SourceResult
// ---------------------------------------------------------------------------

/// A fetched value tagged with the adapter that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResult<T> {
    pub source: String,
    pub value: T,
}

impl<T> SourceResult<T> {
    pub fn new(source: impl Into<String>, value: T) -> Self {
        Self {
            source: source.into(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// One independent mirror of the draw data.
///
/// Object-safe so the controller holds `Arc<dyn DrawSource>` in priority
/// order; `Send + Sync` so fan-out calls can run concurrently.
#[async_trait::async_trait]
pub trait DrawSource: Send + Sync {
    /// Stable adapter name used in logs, health reports and consensus.
    fn name(&self) -> &str;

    /// Every draw the mirror knows about.
    async fn fetch_all(&self) -> Result<Vec<DrawRecord>, SourceError>;

    /// The most recently published draw.
    async fn fetch_latest(&self) -> Result<DrawRecord, SourceError>;

    /// A single draw by number.
    async fn fetch_one(&self, draw_no: u32) -> Result<DrawRecord, SourceError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
