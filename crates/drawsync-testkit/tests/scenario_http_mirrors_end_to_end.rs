//! Full run over HTTP mirrors, through to the files on disk.
//!
//! GREEN when:
//! - two mock mirrors in different JSON shapes agree and the missing draw is
//!   appended
//! - the ledger file and statistics document are written and read back
//! - a mirror serving an HTML page is recorded as a source error, not fatal

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use drawsync_artifacts::{
    build_stats_document, read_stats_document, write_stats_document, BuildStatsDocumentArgs,
};
use drawsync_ledger::{load_ledger, save_ledger};
use drawsync_schemas::DrawRecord;
use drawsync_source::{DrawSource, HttpDrawSource, HttpEndpoints, RetryPolicy};
use drawsync_stats::{aggregate, StatsConfig};
use drawsync_sync::{HealthStatus, SyncConfig, SyncController};
use drawsync_testkit::{fixture_draw, ledger_through, write_ledger_file};
use httpmock::prelude::*;
use serde_json::{json, Value};

fn plain_shape(r: &DrawRecord) -> Value {
    serde_json::to_value(r).unwrap()
}

fn scalar_shape(r: &DrawRecord) -> Value {
    let n = r.numbers();
    json!({
        "returnValue": "success",
        "drwNo": r.draw_no(),
        "drwNoDate": r.date().format("%Y-%m-%d").to_string(),
        "drwtNo1": n[0], "drwtNo2": n[1], "drwtNo3": n[2],
        "drwtNo4": n[3], "drwtNo5": n[4], "drwtNo6": n[5],
        "bnusNo": r.bonus()
    })
}

async fn serve(server: &MockServer, latest: u32, shape: fn(&DrawRecord) -> Value) {
    let body = shape(&fixture_draw(latest)).to_string();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/latest");
            then.status(200).body(body);
        })
        .await;
    for n in 1..=latest {
        let body = shape(&fixture_draw(n)).to_string();
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/draw/{n}"));
                then.status(200).body(body);
            })
            .await;
    }
}

fn mirror(name: &str, server: &MockServer) -> Arc<dyn DrawSource> {
    Arc::new(
        HttpDrawSource::new(
            name,
            HttpEndpoints {
                bulk_url: None,
                latest_url: server.url("/latest"),
                draw_url: server.url("/draw/{n}"),
            },
            &BTreeMap::new(),
            RetryPolicy::new(Duration::from_secs(2), Duration::ZERO, 0, Duration::ZERO),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn two_http_mirrors_append_and_publish() {
    let s1 = MockServer::start_async().await;
    let s2 = MockServer::start_async().await;
    serve(&s1, 8, plain_shape).await;
    serve(&s2, 8, scalar_shape).await;

    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("draws.json");
    let stats_path = dir.path().join("stats.json");
    write_ledger_file(&ledger_path, &ledger_through(7)).unwrap();

    let ctl = SyncController::new(vec![mirror("one", &s1), mirror("two", &s2)], SyncConfig::default());
    let out = ctl.run(load_ledger(&ledger_path).unwrap()).await.unwrap();

    assert_eq!(out.health.status, HealthStatus::Nominal, "{:?}", out.health.reasons);
    assert_eq!(out.ledger, ledger_through(8));
    assert_eq!(out.health.tail.validated, 5);

    save_ledger(&ledger_path, &out.ledger).unwrap();
    let doc = build_stats_document(BuildStatsDocumentArgs {
        config_hash: "test",
        ledger: &out.ledger,
        statistics: aggregate(&out.ledger, &StatsConfig::default()),
        health: out.health.clone(),
        generated_at_utc: Utc::now(),
    });
    write_stats_document(&stats_path, &doc).unwrap();

    assert_eq!(load_ledger(&ledger_path).unwrap(), ledger_through(8));
    let back = read_stats_document(&stats_path).unwrap();
    assert_eq!(back.total_draws, 8);
    assert_eq!(back.last_draw, Some(fixture_draw(8)));
    assert_eq!(back.health.run_id, out.health.run_id);
}

#[tokio::test]
async fn html_mirror_is_a_source_error() {
    let good1 = MockServer::start_async().await;
    let good2 = MockServer::start_async().await;
    let html = MockServer::start_async().await;
    serve(&good1, 4, plain_shape).await;
    serve(&good2, 4, scalar_shape).await;
    html.mock_async(|when, then| {
        when.method(GET);
        then.status(200)
            .header("content-type", "text/html")
            .body("<!DOCTYPE html><html><body>maintenance</body></html>");
    })
    .await;

    let ctl = SyncController::new(
        vec![mirror("html", &html), mirror("good1", &good1), mirror("good2", &good2)],
        SyncConfig::default(),
    );
    let out = ctl.run(ledger_through(3)).await.unwrap();

    assert_eq!(out.ledger, ledger_through(4));
    assert_eq!(out.health.status, HealthStatus::Nominal);
    let errs = &out.health.source_errors["html"];
    assert!(errs.iter().all(|e| e.contains("html body")), "{errs:?}");
    assert!(!out.health.source_errors.contains_key("good1"));
}
