//! drawsync-config
//!
//! Layered YAML configuration. Documents are merged in order (later layers
//! override earlier ones), hashed over their canonical JSON form, and
//! checked for literal secrets before anything else sees them.
//!
//! [`AppConfig`] is the typed view consumed by the binary.

mod app;
mod secrets;

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

pub use app::{
    expand_env, AppConfig, HttpSettings, SourceConfig, StorageConfig, SyncSettings,
};
pub use secrets::enforce_no_secret_literals;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value in `b` replaces `a` wholesale
/// (so a later `sources:` list replaces the earlier list).
fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is ordered by key, so compact output is stable.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_overrides_leaves_and_replaces_lists() {
        let a = json!({"sync": {"tail_window": 5, "bootstrap_threshold": 120}, "sources": [{"name": "a"}]});
        let b = json!({"sync": {"tail_window": 3}, "sources": [{"name": "b"}]});
        let m = deep_merge(a, b);
        assert_eq!(m["sync"]["tail_window"], 3);
        assert_eq!(m["sync"]["bootstrap_threshold"], 120);
        assert_eq!(m["sources"].as_array().unwrap().len(), 1);
        assert_eq!(m["sources"][0]["name"], "b");
    }

    #[test]
    fn empty_layer_is_ignored() {
        let a = load_layered_yaml_from_strings(&["sync:\n  tail_window: 4\n", ""]).unwrap();
        assert_eq!(a.config_json["sync"]["tail_window"], 4);
    }
}
