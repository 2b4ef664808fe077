//! Typed view over the merged config.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use drawsync_source::{HttpEndpoints, RetryPolicy};
use drawsync_stats::StatsConfig;
use serde::{Deserialize, Serialize};

use crate::LoadedConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub http: HttpSettings,
    /// Mirrors in priority order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub ledger_path: PathBuf,
    pub stats_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("data/draws.json"),
            stats_path: PathBuf::from("data/stats.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub bootstrap_threshold: u32,
    pub tail_window: usize,
    pub max_gap_repair: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            bootstrap_threshold: 120,
            tail_window: 5,
            max_gap_repair: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    pub base_timeout_ms: u64,
    pub timeout_step_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_timeout_ms: 8_000,
            timeout_step_ms: 4_000,
            max_retries: 2,
            retry_delay_ms: 500,
            user_agent: concat!("drawsync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.base_timeout_ms),
            Duration::from_millis(self.timeout_step_ms),
            self.max_retries,
            Duration::from_millis(self.retry_delay_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub bulk_url: Option<String>,
    pub latest_url: String,
    /// Must contain `{n}`.
    pub draw_url: String,
    /// Values may reference `${ENV_VAR}`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SourceConfig {
    pub fn endpoints(&self) -> HttpEndpoints {
        HttpEndpoints {
            bulk_url: self.bulk_url.clone(),
            latest_url: self.latest_url.clone(),
            draw_url: self.draw_url.clone(),
        }
    }

    /// Header values with `${ENV_VAR}` expanded from the process environment,
    /// plus `User-Agent` unless the source sets its own.
    pub fn resolved_headers(&self, http: &HttpSettings) -> Result<BTreeMap<String, String>> {
        self.resolved_headers_with(http, |k| std::env::var(k).ok())
    }

    pub fn resolved_headers_with<F>(
        &self,
        http: &HttpSettings,
        lookup: F,
    ) -> Result<BTreeMap<String, String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = BTreeMap::new();
        for (k, v) in &self.headers {
            let expanded = expand_env(v, &lookup)
                .with_context(|| format!("source '{}': header '{}'", self.name, k))?;
            out.insert(k.clone(), expanded);
        }
        let has_ua = out.keys().any(|k| k.eq_ignore_ascii_case("user-agent"));
        if !has_ua && !http.user_agent.is_empty() {
            out.insert("User-Agent".to_string(), http.user_agent.clone());
        }
        Ok(out)
    }
}

impl AppConfig {
    /// Deserialize and validate the merged config.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg: AppConfig = serde_json::from_value(loaded.config_json.clone())
            .context("config does not match the expected shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.stats.validate().context("invalid stats config")?;
        if self.sync.tail_window == 0 {
            bail!("CONFIG_INVALID sync.tail_window must be > 0");
        }

        let mut names = BTreeSet::new();
        for s in &self.sources {
            if s.name.trim().is_empty() {
                bail!("CONFIG_INVALID source name must not be empty");
            }
            if !names.insert(s.name.as_str()) {
                bail!("CONFIG_INVALID duplicate source name: {}", s.name);
            }
            if !s.draw_url.contains(drawsync_source::http::DRAW_NO_PLACEHOLDER) {
                bail!(
                    "CONFIG_INVALID source '{}': draw_url must contain {}",
                    s.name,
                    drawsync_source::http::DRAW_NO_PLACEHOLDER
                );
            }
        }
        Ok(())
    }
}

/// Expand `${NAME}` placeholders using `lookup`. An unset variable is an
/// error naming the variable (never its value).
pub fn expand_env<F>(raw: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            bail!("unterminated ${{...}} placeholder");
        };
        let name = &after[..end];
        if name.is_empty() {
            bail!("empty ${{}} placeholder");
        }
        match lookup(name) {
            Some(v) => out.push_str(&v),
            None => bail!("environment variable {name} is not set"),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
