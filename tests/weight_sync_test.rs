use anyhow::Result;
use bingo_tracker::{HttpSync, LocalStorage, SyncStatus, WeightLog};
use chrono::NaiveDate;
use httpmock::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
}

fn storage(dir: &TempDir) -> LocalStorage {
    LocalStorage::new(dir.path().to_string_lossy().into_owned())
}

#[tokio::test]
async fn test_record_posts_entry_to_endpoint() -> Result<()> {
    let dir = TempDir::new()?;
    let server = MockServer::start();
    let post_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/exec")
            .header("content-type", "text/plain")
            .json_body(serde_json::json!({"date": "2026-07-01", "weight": 70.0, "bmi": 23.4}));
        then.status(200);
    });

    let backend = HttpSync::new(server.url("/exec"), Duration::from_secs(5))?;
    let mut log = WeightLog::open(storage(&dir), 173.0)
        .await?
        .with_backend(Arc::new(backend));

    let handle = log.record(day(1), Some(70.0)).await?.expect("push scheduled");
    handle.await?;

    post_mock.assert();
    assert!(matches!(log.sync_status(), SyncStatus::Delivered { status: 200, .. }));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_endpoint_keeps_local_save() -> Result<()> {
    let dir = TempDir::new()?;
    // nothing listens on port 9 on a test box
    let backend = HttpSync::new("http://127.0.0.1:9/exec", Duration::from_secs(2))?;
    let mut log = WeightLog::open(storage(&dir), 173.0)
        .await?
        .with_backend(Arc::new(backend));

    log.record(day(2), Some(71.2)).await?.expect("push scheduled").await?;

    assert!(matches!(log.sync_status(), SyncStatus::Failed { .. }));
    let reopened = WeightLog::open(storage(&dir), 173.0).await?;
    assert_eq!(reopened.entry(day(2)).unwrap().weight, 71.2);
    Ok(())
}

#[tokio::test]
async fn test_pull_merges_remote_over_local() -> Result<()> {
    let dir = TempDir::new()?;
    let server = MockServer::start();
    let get_mock = server.mock(|when, then| {
        when.method(GET).path("/exec");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "2026-07-01": {"weight": 69.0, "bmi": "23.1"},
                "2026-07-05": {"weight": 68.4, "bmi": 22.9}
            }));
    });

    let mut log = WeightLog::open(storage(&dir), 173.0).await?;
    log.record(day(1), Some(70.0)).await?;
    log.record(day(3), Some(69.8)).await?;

    let backend = HttpSync::new(server.url("/exec"), Duration::from_secs(5))?;
    let mut log = WeightLog::open(storage(&dir), 173.0)
        .await?
        .with_backend(Arc::new(backend));
    assert_eq!(log.sync_from_remote().await?, 2);
    get_mock.assert();

    let reopened = WeightLog::open(storage(&dir), 173.0).await?;
    assert_eq!(reopened.entries().len(), 3);
    assert_eq!(reopened.entry(day(1)).unwrap().weight, 69.0);
    assert_eq!(reopened.entry(day(3)).unwrap().weight, 69.8);
    assert_eq!(reopened.entry(day(5)).unwrap().bmi, 22.9);
    Ok(())
}

#[tokio::test]
async fn test_pull_server_error_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/exec");
        then.status(500);
    });

    let backend = HttpSync::new(server.url("/exec"), Duration::from_secs(5))?;
    let mut log = WeightLog::open(storage(&dir), 173.0)
        .await?
        .with_backend(Arc::new(backend));
    assert!(log.sync_from_remote().await.is_err());
    assert!(matches!(log.sync_status(), SyncStatus::Failed { .. }));
    assert!(log.entries().is_empty());
    Ok(())
}
