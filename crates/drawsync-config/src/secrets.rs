//! Literal-secret guard.
//!
//! Config files are committed next to the ledger, so they must never carry
//! credentials. Mirror headers reference environment variables instead
//! (`Authorization: "Bearer ${MIRROR_TOKEN}"`), expanded at adapter
//! construction.

use anyhow::{bail, Result};
use serde_json::Value;

/// Known secret-like prefixes. A leaf string starting with one of these
/// aborts loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "gho_",       // GitHub OAuth
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
    "xoxp-",      // Slack user token
];

/// Header names whose values must come from the environment.
const CREDENTIAL_HEADERS: &[&str] = &["authorization", "x-api-key", "api-key", "x-auth-token"];

pub fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_string_leaves(v, "", &mut leaves);

    for (ptr, s) in leaves {
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
        if is_credential_header(&ptr) && !s.contains("${") {
            bail!(
                "CONFIG_SECRET_DETECTED leaf={} value=REDACTED (credential headers must reference ${{ENV_VAR}})",
                ptr
            );
        }
    }
    Ok(())
}

fn collect_string_leaves<'a>(v: &'a Value, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_string_leaves(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_string_leaves(vv, &format!("{prefix}/{i}"), out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.as_str())),
        _ => {}
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

/// `/sources/<i>/headers/<name>` with a credential-bearing name.
fn is_credential_header(ptr: &str) -> bool {
    let parts: Vec<&str> = ptr.split('/').collect();
    match parts.as_slice() {
        ["", "sources", _, "headers", name] => {
            let name = name.to_ascii_lowercase();
            CREDENTIAL_HEADERS.contains(&name.as_str())
        }
        _ => false,
    }
}
