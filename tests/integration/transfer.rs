use std::sync::Arc;

use intact_core::digest::{checksum_bytes, is_well_formed};
use intact_core::telemetry::{
    METRIC_FILES_PROCESSED, METRIC_TRANSFER_DURATION, SPAN_PREPARE, SPAN_SAVE_AND_VERIFY,
    SPAN_TRANSFER,
};
use intact_core::NoopTelemetry;
use intact_ctl::Uploader;

use crate::*;

// ══════════════════════════════════════════════════════════════════════════════
//  Round trips through the real server
// ══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_batch_round_trip() {
    let server = TestServer::start().await;
    let small = payload(5 * 1024, 1);
    let medium = payload(300 * 1024, 2);
    let text = b"plain text, repeated. ".repeat(500);
    let src = source_dir(&[
        ("small.bin", &small),
        ("medium.bin", &medium),
        ("notes.txt", &text),
        ("empty.dat", b""),
    ]);

    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    assert_eq!(outcomes.len(), 4);
    for o in &outcomes {
        assert!(o.success, "{} failed: {:?}", o.filename, o.error_detail);
        assert_eq!(o.http_status, Some(200));
        assert_eq!(o.error_detail, None);
        let sent = std::fs::read(src.path().join(&o.filename)).unwrap();
        assert_eq!(o.server_checksum.as_deref(), Some(checksum_bytes(&sent).as_str()));
    }

    // decompressed bytes on disk are exactly the originals
    assert_eq!(
        server.output_files(),
        ["empty.dat", "medium.bin", "notes.txt", "small.bin"]
    );
    for name in server.output_files() {
        let sent = std::fs::read(src.path().join(&name)).unwrap();
        let stored = std::fs::read(server.output_path().join(&name)).unwrap();
        assert_eq!(sent, stored, "{name} differs after transfer");
    }

    assert_eq!(server.state.stats.snapshot(), (4, 0, 0));
    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_large_file_streams_end_to_end() {
    let server = TestServer::start().await;
    let big = payload(12 * 1024 * 1024, 7);
    let src = source_dir(&[("big.bin", &big)]);

    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success, "{:?}", outcomes[0].error_detail);
    let stored = std::fs::read(server.output_path().join("big.bin")).unwrap();
    assert_eq!(stored.len(), big.len());
    assert_eq!(checksum_bytes(&stored), checksum_bytes(&big));

    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_reupload_overwrites() {
    let server = TestServer::start().await;
    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();

    let first = source_dir(&[("data.bin", b"first version")]);
    assert!(uploader.run(first.path()).await.unwrap()[0].success);
    let second = source_dir(&[("data.bin", b"second, longer version")]);
    assert!(uploader.run(second.path()).await.unwrap()[0].success);

    let stored = std::fs::read(server.output_path().join("data.bin")).unwrap();
    assert_eq!(stored, b"second, longer version");
    assert_eq!(server.output_files(), ["data.bin"]);

    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_telemetry_boundaries() {
    let server_telemetry = Arc::new(RecordingTelemetry::default());
    let client_telemetry = Arc::new(RecordingTelemetry::default());
    let server = TestServer::start_with(server_telemetry.clone()).await;
    let src = source_dir(&[("one.bin", &payload(10_000, 3)), ("two.bin", &payload(20_000, 4))]);

    let uploader = Uploader::new(&server.client_config(), client_telemetry.clone()).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();
    assert!(outcomes.iter().all(|o| o.success));

    assert_eq!(client_telemetry.spans_named(SPAN_PREPARE), ["one.bin", "two.bin"]);
    assert_eq!(client_telemetry.spans_named(SPAN_TRANSFER), ["one.bin", "two.bin"]);
    let observations = client_telemetry.observations.lock().unwrap().clone();
    assert_eq!(observations.len(), 2);
    assert!(observations
        .iter()
        .all(|(name, _, secs)| *name == METRIC_TRANSFER_DURATION && *secs >= 0.0));

    assert_eq!(server_telemetry.spans_named(SPAN_SAVE_AND_VERIFY).len(), 2);
    assert_eq!(server_telemetry.counter(METRIC_FILES_PROCESSED), 2);
    // the server never counts on the client's behalf
    assert_eq!(client_telemetry.counter(METRIC_FILES_PROCESSED), 0);

    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_status_endpoint_reports_counts() {
    let server = TestServer::start().await;
    let src = source_dir(&[("a.txt", b"alpha"), ("b.txt", b"bravo")]);
    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    uploader.run(src.path()).await.unwrap();

    let status: serde_json::Value = reqwest::get(format!("http://{}/status", server.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["verified"], 2);
    assert_eq!(status["mismatched"], 0);
    assert_eq!(status["rejected"], 0);

    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_server_checksums_are_well_formed() {
    let server = TestServer::start().await;
    let src = source_dir(&[("x.bin", &payload(4096, 9))]);
    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    let sum = outcomes[0].server_checksum.as_deref().unwrap();
    assert!(is_well_formed(sum), "bad digest {sum}");

    drop(uploader);
    server.stop().await;
}
