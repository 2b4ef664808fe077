//! The `drawsync` binary end to end.
//!
//! GREEN when:
//! - `config-hash` prints a 64-hex hash
//! - `stats` works fully offline from the ledger file
//! - `sync` with every mirror down and a local ledger exits 0, degraded,
//!   and still writes both files
//! - `sync` with every mirror down and no ledger exits non-zero and writes
//!   nothing

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use drawsync_testkit::{ledger_through, write_ledger_file};
use predicates::prelude::*;

/// Config whose mirrors point at a closed local port.
fn write_config(dir: &Path) -> String {
    let ledger = dir.join("draws.json");
    let stats = dir.join("stats.json");
    let yaml = format!(
        r#"
storage:
  ledger_path: '{}'
  stats_path: '{}'
http:
  base_timeout_ms: 500
  timeout_step_ms: 0
  max_retries: 0
  retry_delay_ms: 0
sources:
  - name: "down-a"
    latest_url: "http://127.0.0.1:9/latest"
    draw_url: "http://127.0.0.1:9/draw/{{n}}"
  - name: "down-b"
    latest_url: "http://127.0.0.1:9/b/latest"
    draw_url: "http://127.0.0.1:9/b/draw/{{n}}"
"#,
        ledger.display(),
        stats.display()
    );
    let path = dir.join("drawsync.yaml");
    fs::write(&path, yaml).unwrap();
    path.to_string_lossy().to_string()
}

fn drawsync() -> Command {
    let mut cmd = Command::cargo_bin("drawsync").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn config_hash_prints_hash() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());

    drawsync()
        .args(["config-hash", cfg.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::is_match("config_hash=[0-9a-f]{64}\n").unwrap());
}

#[test]
fn stats_runs_offline() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());
    write_ledger_file(&dir.path().join("draws.json"), &ledger_through(12)).unwrap();

    drawsync()
        .args(["stats", "--config", cfg.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("status=nominal"))
        .stdout(predicate::str::contains("mode=local_only"))
        .stdout(predicate::str::contains("total_draws=12"));

    let raw = fs::read_to_string(dir.path().join("stats.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["schema_version"], 1);
    assert_eq!(v["total_draws"], 12);
    assert_eq!(v["last_draw"]["draw_no"], 12);
    assert_eq!(v["windows"][0]["draw_count"], 10);
}

#[test]
fn sync_with_mirrors_down_uses_local_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());
    let ledger_path = dir.path().join("draws.json");
    write_ledger_file(&ledger_path, &ledger_through(20)).unwrap();
    let before = fs::read_to_string(&ledger_path).unwrap();

    drawsync()
        .args(["sync", "--config", cfg.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("status=degraded"))
        .stdout(predicate::str::contains("mode=local_only"))
        .stdout(predicate::str::contains("reasons=latest_unavailable"));

    assert_eq!(fs::read_to_string(&ledger_path).unwrap(), before);
    let raw = fs::read_to_string(dir.path().join("stats.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        v["health"]["reasons"][0]["message"],
        "latest unavailable, using local cache"
    );
}

#[test]
fn sync_with_nothing_at_all_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());

    drawsync()
        .args(["sync", "--config", cfg.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no draw data available"));

    assert!(!dir.path().join("draws.json").exists());
    assert!(!dir.path().join("stats.json").exists());
}

#[test]
fn path_flags_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());
    let alt_ledger = dir.path().join("alt").join("ledger.json");
    let alt_stats = dir.path().join("alt").join("stats.json");
    write_ledger_file(&alt_ledger, &ledger_through(3)).unwrap();

    drawsync()
        .args(["stats", "--config", cfg.as_str(), "--ledger"])
        .arg(&alt_ledger)
        .arg("--stats")
        .arg(&alt_stats)
        .assert()
        .success()
        .stdout(predicate::str::contains("total_draws=3"));

    assert!(alt_stats.exists());
    assert!(!dir.path().join("stats.json").exists());
}
