//! HTTP-backed mirror adapter.
//!
//! Each mirror exposes three GET endpoints (bulk list, latest draw, draw by
//! number). Bodies are checked for HTML before JSON decoding because some
//! mirrors answer with an interstitial page and a 200 status.

use std::collections::BTreeMap;

use async_trait::async_trait;
use drawsync_schemas::DrawRecord;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::normalizer::{normalize, normalize_list};
use crate::provider::{DrawSource, SourceError};
use crate::retry::RetryPolicy;

/// Placeholder replaced by the draw number in [`HttpEndpoints::draw_url`].
pub const DRAW_NO_PLACEHOLDER: &str = "{n}";

/// Endpoint set for one mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpoints {
    /// Bulk list of every draw. `None` if the mirror has no bulk endpoint.
    pub bulk_url: Option<String>,
    pub latest_url: String,
    /// Template containing [`DRAW_NO_PLACEHOLDER`].
    pub draw_url: String,
}

impl HttpEndpoints {
    pub fn draw_url_for(&self, draw_no: u32) -> String {
        self.draw_url
            .replace(DRAW_NO_PLACEHOLDER, &draw_no.to_string())
    }
}

/// A mirror reached over HTTP.
///
/// Request headers may carry credentials; they are never logged.
#[derive(Debug, Clone)]
pub struct HttpDrawSource {
    name: String,
    endpoints: HttpEndpoints,
    headers: HeaderMap,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl HttpDrawSource {
    pub fn new(
        name: impl Into<String>,
        endpoints: HttpEndpoints,
        headers: &BTreeMap<String, String>,
        retry: RetryPolicy,
    ) -> Result<Self, SourceError> {
        let name = name.into();
        if !endpoints.draw_url.contains(DRAW_NO_PLACEHOLDER) {
            return Err(SourceError::Config(format!(
                "source '{name}': draw_url must contain {DRAW_NO_PLACEHOLDER}"
            )));
        }

        let mut header_map = HeaderMap::new();
        for (k, v) in headers {
            let hn = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| SourceError::Config(format!("source '{name}': header '{k}': {e}")))?;
            let mut hv = HeaderValue::from_str(v)
                .map_err(|e| SourceError::Config(format!("source '{name}': header '{k}': {e}")))?;
            hv.set_sensitive(true);
            header_map.insert(hn, hv);
        }

        Ok(Self {
            name,
            endpoints,
            headers: header_map,
            retry,
            http: reqwest::Client::new(),
        })
    }

    pub fn endpoints(&self) -> &HttpEndpoints {
        &self.endpoints
    }

    /// GET `url` under the retry policy and return the decoded JSON body.
    /// Only transient failures are retried.
    async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
        self.retry
            .retry_async_if(SourceError::is_transient, |attempt, timeout| async move {
                debug!(
                    source = %self.name,
                    attempt,
                    timeout_ms = timeout.as_millis() as u64,
                    url,
                    "GET"
                );
                let res = self.get_once(url, timeout).await;
                if let Err(e) = &res {
                    warn!(source = %self.name, attempt, url, error = %e, "request failed");
                }
                res
            })
            .await
    }

    async fn get_once(
        &self,
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Value, SourceError> {
        let timeout_ms = timeout.as_millis() as u64;
        let resp = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout_ms))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| transport_error(e, timeout_ms))?;
        decode_body(&body)
    }
}

#[async_trait]
impl DrawSource for HttpDrawSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self) -> Result<Vec<DrawRecord>, SourceError> {
        let url = self.endpoints.bulk_url.as_deref().ok_or_else(|| {
            SourceError::Config(format!("source '{}' has no bulk endpoint", self.name))
        })?;
        let body = self.get_json(url).await?;
        Ok(normalize_list(&body)?)
    }

    async fn fetch_latest(&self) -> Result<DrawRecord, SourceError> {
        let body = self.get_json(&self.endpoints.latest_url).await?;
        Ok(normalize(&body)?)
    }

    async fn fetch_one(&self, draw_no: u32) -> Result<DrawRecord, SourceError> {
        let url = self.endpoints.draw_url_for(draw_no);
        let body = self.get_json(&url).await?;
        let rec = normalize(&body)?;
        // Some mirrors answer an unknown number with their latest draw.
        if rec.draw_no() != draw_no {
            return Err(SourceError::Decode(format!(
                "asked for draw {draw_no}, got draw {}",
                rec.draw_no()
            )));
        }
        Ok(rec)
    }
}

// ---------------------------------------------------------------------------
// Body handling
// ---------------------------------------------------------------------------

/// True when the body starts with markup (after leading whitespace / BOM).
pub fn looks_like_html(body: &str) -> bool {
    body.trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with('<')
}

/// HTML check first, then JSON decode.
pub fn decode_body(body: &str) -> Result<Value, SourceError> {
    if looks_like_html(body) {
        return Err(SourceError::HtmlBody);
    }
    serde_json::from_str(body.trim_start_matches('\u{feff}'))
        .map_err(|e| SourceError::Decode(e.to_string()))
}

fn transport_error(e: reqwest::Error, timeout_ms: u64) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout { timeout_ms }
    } else {
        SourceError::Transport(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests (no network)
// ---------------------------------------------------------------------------
