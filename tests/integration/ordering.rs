use std::sync::Arc;

use intact_core::NoopTelemetry;
use intact_ctl::Uploader;

use crate::*;

// ══════════════════════════════════════════════════════════════════════════════
//  Ordering
// ══════════════════════════════════════════════════════════════════════════════

/// Files go out in byte-wise sorted filename order, regardless of the order
/// they were created in.
#[tokio::test]
async fn test_sequential_run_is_sorted() {
    let stub = StubServer::start(&[]).await;
    let src = source_dir(&[
        ("zeta.log", b"z"),
        ("alpha.log", b"a"),
        ("Beta.log", b"B"),
        ("10.log", b"10"),
        ("2.log", b"2"),
    ]);
    std::fs::create_dir(src.path().join("subdir")).unwrap();

    let uploader =
        Uploader::new(&client_config(&stub.upload_url()), Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    let expected = ["10.log", "2.log", "Beta.log", "alpha.log", "zeta.log"];
    assert_eq!(stub.seen(), expected);
    let names: Vec<&str> = outcomes.iter().map(|o| o.filename.as_str()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_order_is_reproducible() {
    let stub = StubServer::start(&[]).await;
    let src = source_dir(&[("c", b"3"), ("a", b"1"), ("b", b"2")]);
    let uploader =
        Uploader::new(&client_config(&stub.upload_url()), Arc::new(NoopTelemetry)).unwrap();

    uploader.run(src.path()).await.unwrap();
    uploader.run(src.path()).await.unwrap();
    assert_eq!(stub.seen(), ["a", "b", "c", "a", "b", "c"]);
}

/// With several files in flight the outcomes still come back sorted and
/// every file lands intact.
#[tokio::test]
async fn test_parallel_run_keeps_outcome_order() {
    let server = TestServer::start().await;
    let files: Vec<(String, Vec<u8>)> = (0..12)
        .map(|i| (format!("part-{i:02}.bin"), payload(8_000 + i * 3_000, i as u32)))
        .collect();
    let refs: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    let src = source_dir(&refs);

    let mut config = server.client_config();
    config.concurrency = 4;
    let uploader = Uploader::new(&config, Arc::new(NoopTelemetry)).unwrap();
    let outcomes = uploader.run(src.path()).await.unwrap();

    let names: Vec<&str> = outcomes.iter().map(|o| o.filename.as_str()).collect();
    let expected: Vec<&str> = files.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, expected);
    assert!(outcomes.iter().all(|o| o.success));

    for (name, data) in &files {
        let stored = std::fs::read(server.output_path().join(name)).unwrap();
        assert_eq!(&stored, data, "{name} differs");
    }
    assert_eq!(server.state.stats.snapshot(), (12, 0, 0));

    drop(uploader);
    server.stop().await;
}
