//! Integration tests for the ingestion pipeline: filtering, durability
//! before fanout, and resilience to store write failures.

use barents_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use barents_ingest::{FeedRegistry, IngestPipeline};
use barents_store::query_history;
use barents_types::Sighting;
use tokio::sync::mpsc;

const NORDIC_FRAME: &str = r#"{
    "MetaData": {"ShipName": "MS NORDIC", "MMSI": 123456789, "latitude": 70.1, "longitude": 20.5},
    "Message": {"PositionReport": {"Sog": 12.4, "TrueHeading": 88, "Cog": 90, "NavigationalStatus": 0}}
}"#;

const FISKEBAS_FRAME: &str = r#"{
    "MetaData": {"ShipName": "FISKEBAS", "latitude": 69.3, "longitude": 18.2}
}"#;

const UNKNOWN_FRAME: &str =
    r#"{"MetaData": {"ShipName": "Unknown", "latitude": 70.0, "longitude": 20.0}}"#;

const NO_POSITION_FRAME: &str = r#"{"MetaData": {"ShipName": "MS NORDIC", "latitude": 70.0}}"#;

/// A migrated on-disk pool in a temp dir (kept alive by the returned guard).
fn test_pool() -> (DbPool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("barents.db");
    let pool = create_pool(
        path.to_str().expect("path should be valid utf-8"),
        DbRuntimeSettings::default(),
    )
    .expect("pool creation should succeed");
    {
        let conn = pool.get().expect("should get connection");
        run_migrations(&conn).expect("migrations should succeed");
    }
    (pool, dir)
}

#[tokio::test]
async fn accepted_frames_are_stored_then_broadcast_and_rejects_are_dropped() {
    let (pool, _dir) = test_pool();
    let feed = FeedRegistry::new();

    let (viewer_tx, mut viewer_rx) = mpsc::channel(64);
    feed.register(viewer_tx).await;

    let (frame_tx, frame_rx) = mpsc::channel(16);
    let pipeline = IngestPipeline::new(pool.clone(), feed.clone(), frame_rx);
    let handle = tokio::spawn(pipeline.run());

    for frame in [NORDIC_FRAME, UNKNOWN_FRAME, NO_POSITION_FRAME, FISKEBAS_FRAME] {
        frame_tx.send(frame.to_string()).await.expect("send should succeed");
    }
    drop(frame_tx);
    handle.await.expect("pipeline task should finish cleanly");

    // Exactly the two accepted frames were broadcast, in ingest order.
    let mut broadcasts = Vec::new();
    while let Ok(json) = viewer_rx.try_recv() {
        broadcasts.push(serde_json::from_str::<Sighting>(&json).expect("broadcast should be a sighting"));
    }
    assert_eq!(broadcasts.len(), 2, "rejected frames must not be broadcast");
    assert_eq!(broadcasts[0].name, "MS NORDIC");
    assert_eq!(broadcasts[0].mmsi, Some(123_456_789));
    assert_eq!(broadcasts[0].speed, Some(12.4));
    assert_eq!(broadcasts[1].name, "FISKEBAS");
    assert_eq!(broadcasts[1].speed, None, "missing speed stays unknown");

    // Every broadcast sighting is independently retrievable from the log.
    let conn = pool.get().expect("should get connection");
    for sighting in &broadcasts {
        let trail = query_history(&conn, &sighting.name).expect("query should succeed");
        assert!(
            trail.contains(sighting),
            "broadcast sighting for {} must already be durable",
            sighting.name
        );
    }

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM sightings", [], |row| row.get(0))
        .expect("should count rows");
    assert_eq!(total, 2, "only accepted frames reach the store");
}

#[tokio::test]
async fn store_failure_suppresses_broadcast_but_not_subsequent_ingestion() {
    let (pool, _dir) = test_pool();
    let feed = FeedRegistry::new();

    let (viewer_tx, mut viewer_rx) = mpsc::channel(64);
    feed.register(viewer_tx).await;

    // Hide the table so the first append fails.
    {
        let conn = pool.get().expect("should get connection");
        conn.execute("ALTER TABLE sightings RENAME TO sightings_hidden", [])
            .expect("rename should succeed");
    }

    // Capacity 1 makes the channel a synchronization point: once the third
    // send completes, the first frame has been fully processed.
    let (frame_tx, frame_rx) = mpsc::channel(1);
    let pipeline = IngestPipeline::new(pool.clone(), feed.clone(), frame_rx);
    let handle = tokio::spawn(pipeline.run());

    frame_tx.send(NORDIC_FRAME.to_string()).await.expect("send should succeed");
    frame_tx.send(UNKNOWN_FRAME.to_string()).await.expect("send should succeed");
    frame_tx.send(UNKNOWN_FRAME.to_string()).await.expect("send should succeed");

    // Restore the table; the pipeline must still be running.
    {
        let conn = pool.get().expect("should get connection");
        conn.execute("ALTER TABLE sightings_hidden RENAME TO sightings", [])
            .expect("rename back should succeed");
    }

    frame_tx.send(FISKEBAS_FRAME.to_string()).await.expect("send should succeed");
    drop(frame_tx);
    handle.await.expect("pipeline task should survive the failed append");

    // Only the post-recovery sighting was broadcast or stored.
    let first = viewer_rx.try_recv().expect("one broadcast expected");
    let sighting: Sighting = serde_json::from_str(&first).expect("broadcast should be a sighting");
    assert_eq!(sighting.name, "FISKEBAS");
    assert!(viewer_rx.try_recv().is_err(), "failed append must not be broadcast");

    let conn = pool.get().expect("should get connection");
    let names: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT name FROM sightings")
            .expect("prepare should succeed");
        stmt.query_map([], |row| row.get(0))
            .expect("query should succeed")
            .map(|r| r.expect("row should read"))
            .collect()
    };
    assert_eq!(names, vec!["FISKEBAS"]);
}
