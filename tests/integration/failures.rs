use std::sync::Arc;

use intact_core::codec::{compress, CompressionLevel};
use intact_core::digest::checksum_bytes;
use intact_core::envelope::{
    BODY_INTERNAL_ERROR, BODY_MISMATCH, BODY_MISSING_FILENAME, CHECKSUM_HEADER,
    CONTENT_ENCODING_HEADER, FILENAME_HEADER,
};
use intact_core::{NoopTelemetry, TransferEnvelope};
use intact_ctl::{ClientError, FailureKind, Uploader};

use crate::*;

// ══════════════════════════════════════════════════════════════════════════════
//  Integrity & rejection
// ══════════════════════════════════════════════════════════════════════════════

fn flip_first_hex(checksum: &str) -> String {
    let mut chars: Vec<char> = checksum.chars().collect();
    chars[0] = if chars[0] == '0' { '1' } else { '0' };
    chars.into_iter().collect()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    compress(data, &mut out, CompressionLevel::Default, 4096).unwrap();
    out
}

/// A single altered hex digit in the envelope is caught; the file stays on
/// disk with the correct bytes.
#[tokio::test]
async fn test_flipped_checksum_is_mismatch() {
    let server = TestServer::start().await;
    let data = payload(50_000, 11);
    let src = source_dir(&[("report.bin", &data)]);

    let good = checksum_bytes(&data);
    let envelope = TransferEnvelope::new("report.bin", flip_first_hex(&good)).unwrap();

    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    let outcome = uploader.send(&src.path().join("report.bin"), &envelope).await;

    assert!(!outcome.success);
    assert_eq!(outcome.http_status, Some(400));
    assert_eq!(outcome.error_detail.as_deref(), Some(BODY_MISMATCH));
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Integrity));
    assert_eq!(outcome.server_checksum.as_deref(), Some(good.as_str()));

    let stored = std::fs::read(server.output_path().join("report.bin")).unwrap();
    assert_eq!(stored, data);
    assert_eq!(server.state.stats.snapshot(), (0, 1, 0));

    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_empty_checksum_never_verifies() {
    let server = TestServer::start().await;
    let src = source_dir(&[("doc.txt", b"some content")]);
    let envelope = TransferEnvelope::new("doc.txt", "").unwrap();

    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    let outcome = uploader.send(&src.path().join("doc.txt"), &envelope).await;

    assert_eq!(outcome.http_status, Some(400));
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Integrity));

    drop(uploader);
    server.stop().await;
}

#[tokio::test]
async fn test_missing_source_dir_aborts_run() {
    let server = TestServer::start().await;
    let parent = tempfile::tempdir().unwrap();

    let uploader = Uploader::new(&server.client_config(), Arc::new(NoopTelemetry)).unwrap();
    let err = uploader
        .run(&parent.path().join("client_files"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Configuration(_)));
    assert!(server.output_files().is_empty());
    assert_eq!(server.state.stats.snapshot(), (0, 0, 0));

    drop(uploader);
    server.stop().await;
}

/// File N failing with a 500 does not stop N+1..last.
#[tokio::test]
async fn test_batch_isolation() {
    let stub = StubServer::start(&["b.txt"]).await;
    let src = source_dir(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c"), ("d.txt", b"d")]);

    let uploader =
        Uploader::new(&client_config(&stub.upload_url()), Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    assert_eq!(stub.seen(), ["a.txt", "b.txt", "c.txt", "d.txt"]);
    let results: Vec<(&str, bool, Option<u16>)> = outcomes
        .iter()
        .map(|o| (o.filename.as_str(), o.success, o.http_status))
        .collect();
    assert_eq!(
        results,
        [
            ("a.txt", true, Some(200)),
            ("b.txt", false, Some(500)),
            ("c.txt", true, Some(200)),
            ("d.txt", true, Some(200)),
        ]
    );
    assert_eq!(outcomes[1].error_detail.as_deref(), Some(BODY_INTERNAL_ERROR));
    assert_eq!(outcomes[1].failure_kind(), Some(FailureKind::Rejected));
}

/// A server that goes away mid-batch fails the remaining files individually.
#[tokio::test]
async fn test_server_gone_is_per_file_transport_failure() {
    let server = TestServer::start().await;
    let config = server.client_config();
    server.stop().await;

    let src = source_dir(&[("x.bin", b"x"), ("y.bin", b"y")]);
    let uploader = Uploader::new(&config, Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    for o in &outcomes {
        assert_eq!(o.failure_kind(), Some(FailureKind::Transport));
        assert_eq!(o.http_status, None);
    }
}

// ── Raw requests ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_filename_header_is_400() {
    let server = TestServer::start().await;
    let data = b"orphan";

    let resp = reqwest::Client::new()
        .post(server.upload_url())
        .header(CHECKSUM_HEADER, checksum_bytes(data))
        .header(CONTENT_ENCODING_HEADER, "gzip")
        .body(gzip(data))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(resp.text().await.unwrap(), BODY_MISSING_FILENAME);
    assert!(server.output_files().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_corrupt_gzip_is_500_and_leaves_nothing() {
    let server = TestServer::start().await;
    let data = payload(64 * 1024, 5);
    let mut body = gzip(&data);
    body.truncate(body.len() / 2);

    let resp = reqwest::Client::new()
        .post(server.upload_url())
        .header(FILENAME_HEADER, "half.bin")
        .header(CHECKSUM_HEADER, checksum_bytes(&data))
        .header(CONTENT_ENCODING_HEADER, "gzip")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 500);
    assert_eq!(resp.text().await.unwrap(), BODY_INTERNAL_ERROR);
    // neither the destination nor a staging file survives
    assert!(server.output_files().is_empty());
    assert_eq!(server.state.stats.snapshot(), (0, 0, 1));
    server.stop().await;
}

#[tokio::test]
async fn test_traversal_name_stays_in_output_dir() {
    let server = TestServer::start().await;
    let data = b"not a password file";

    let resp = reqwest::Client::new()
        .post(server.upload_url())
        .header(FILENAME_HEADER, "../../etc/passwd")
        .header(CHECKSUM_HEADER, checksum_bytes(data))
        .header(CONTENT_ENCODING_HEADER, "gzip")
        .body(gzip(data))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(server.output_files(), ["passwd"]);
    server.stop().await;
}
