use crate::core::weight::{calculate_bmi, date_key};
use crate::domain::model::WeightEntry;
use crate::domain::ports::{Storage, SyncBackend, SyncPayload};
use crate::utils::error::{Result, TrackerError};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const WEIGHT_SLOT: &str = "taiwanCountdownData";

/// Last thing the remote side channel did.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Pending,
    Delivered { at: DateTime<Utc>, status: u16 },
    Pulled { at: DateTime<Utc>, entries: usize },
    Failed { reason: String },
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "Not synced"),
            SyncStatus::Pending => write!(f, "Saving..."),
            SyncStatus::Delivered { at, .. } => write!(f, "Saved! ({})", at.format("%H:%M:%S")),
            SyncStatus::Pulled { entries, .. } => write!(f, "Synced {} entries", entries),
            SyncStatus::Failed { reason } => write!(f, "Error (Saved Locally): {}", reason),
        }
    }
}

/// Daily weight entries keyed by `YYYY-MM-DD`.
///
/// The local slot is the source of truth. The optional backend is a
/// best-effort mirror: failures land in [`SyncStatus`] and are never retried.
pub struct WeightLog<S: Storage> {
    storage: S,
    key: String,
    height_cm: f64,
    entries: BTreeMap<String, WeightEntry>,
    backend: Option<Arc<dyn SyncBackend>>,
    status: Arc<Mutex<SyncStatus>>,
}

impl<S: Storage> WeightLog<S> {
    pub async fn open(storage: S, height_cm: f64) -> Result<Self> {
        let entries = match storage.read_slot(WEIGHT_SLOT).await? {
            Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Stored weight log is malformed, starting empty: {}", e);
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };

        Ok(Self {
            storage,
            key: WEIGHT_SLOT.to_string(),
            height_cm,
            entries,
            backend: None,
            status: Arc::new(Mutex::new(SyncStatus::Idle)),
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn SyncBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn entries(&self) -> &BTreeMap<String, WeightEntry> {
        &self.entries
    }

    pub fn entry(&self, day: NaiveDate) -> Option<&WeightEntry> {
        self.entries.get(&date_key(day))
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|_| SyncStatus::Failed {
                reason: "status unavailable".to_string(),
            })
    }

    /// 儲存一天的體重；沒有有效體重就刪掉那天
    ///
    /// Returns the handle of the background push when a backend is set.
    pub async fn record(
        &mut self,
        day: NaiveDate,
        weight: Option<f64>,
    ) -> Result<Option<JoinHandle<()>>> {
        let key = date_key(day);
        let entry = weight.and_then(|w| {
            calculate_bmi(w, self.height_cm).map(|bmi| WeightEntry { weight: w, bmi })
        });

        match entry {
            Some(entry) => {
                tracing::info!("⚖️ {} -> {}kg (BMI {:.1})", key, entry.weight, entry.bmi);
                self.entries.insert(key.clone(), entry);
            }
            None => {
                tracing::info!("🗑️ Cleared {}", key);
                self.entries.remove(&key);
            }
        }
        self.persist().await?;

        let Some(backend) = self.backend.clone() else {
            return Ok(None);
        };
        let payload = SyncPayload {
            date: key,
            weight: entry.map(|e| e.weight),
            bmi: entry.map(|e| e.bmi),
        };
        set_status(&self.status, SyncStatus::Pending);
        let status = Arc::clone(&self.status);

        Ok(Some(tokio::spawn(async move {
            let next = match backend.push(&payload).await {
                Ok(receipt) if (200..400).contains(&receipt.status) => {
                    tracing::info!("☁️ Pushed {} (HTTP {})", payload.date, receipt.status);
                    SyncStatus::Delivered {
                        at: Utc::now(),
                        status: receipt.status,
                    }
                }
                Ok(receipt) => {
                    tracing::warn!("Remote rejected {} with HTTP {}", payload.date, receipt.status);
                    SyncStatus::Failed {
                        reason: format!("HTTP {}", receipt.status),
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Error saving {} to remote: {}", payload.date, e);
                    SyncStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            set_status(&status, next);
        })))
    }

    /// Waits at most `limit` for a push from [`record`](Self::record), then
    /// reports the status. A push still in flight is left running.
    pub async fn wait_for_push(&self, handle: JoinHandle<()>, limit: Duration) -> SyncStatus {
        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Sync task ended abnormally: {}", e),
            Err(_) => tracing::warn!("Sync still pending after {:?}", limit),
        }
        self.sync_status()
    }

    /// Pulls the remote mapping and lays it over the local entries.
    pub async fn sync_from_remote(&mut self) -> Result<usize> {
        let backend = self
            .backend
            .clone()
            .ok_or_else(|| TrackerError::MissingConfigError {
                field: "sync.endpoint".to_string(),
            })?;

        tracing::info!("Syncing with cloud...");
        set_status(&self.status, SyncStatus::Pending);
        let remote = match backend.pull().await {
            Ok(remote) => remote,
            Err(e) => {
                tracing::error!("❌ Error syncing with cloud: {}", e);
                set_status(
                    &self.status,
                    SyncStatus::Failed {
                        reason: e.to_string(),
                    },
                );
                return Err(TrackerError::SyncError {
                    message: e.to_string(),
                });
            }
        };

        let merged = remote.len();
        self.entries.extend(remote);
        self.persist().await?;
        set_status(
            &self.status,
            SyncStatus::Pulled {
                at: Utc::now(),
                entries: merged,
            },
        );
        tracing::info!("Sync complete, {} remote entries merged", merged);
        Ok(merged)
    }

    async fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.entries)?;
        self.storage.write_slot(&self.key, &bytes).await
    }
}

fn set_status(status: &Mutex<SyncStatus>, next: SyncStatus) {
    if let Ok(mut current) = status.lock() {
        *current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStorage;
    use crate::domain::ports::SyncReceipt;
    use async_trait::async_trait;

    struct FakeRemote {
        delay: Duration,
        status: u16,
        remote: Option<BTreeMap<String, WeightEntry>>,
        pushed: Mutex<Vec<SyncPayload>>,
    }

    #[async_trait]
    impl SyncBackend for FakeRemote {
        async fn push(&self, payload: &SyncPayload) -> Result<SyncReceipt> {
            tokio::time::sleep(self.delay).await;
            self.pushed.lock().unwrap().push(payload.clone());
            Ok(SyncReceipt { status: self.status })
        }

        async fn pull(&self) -> Result<BTreeMap<String, WeightEntry>> {
            self.remote.clone().ok_or_else(|| TrackerError::SyncError {
                message: "offline".to_string(),
            })
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    #[tokio::test]
    async fn test_record_and_clear_without_backend() {
        let storage = MemoryStorage::new();
        let mut log = WeightLog::open(storage.clone(), 173.0).await.unwrap();
        assert!(log.record(day(1), Some(70.0)).await.unwrap().is_none());
        assert_eq!(log.entry(day(1)).unwrap().bmi, 23.4);

        log.record(day(1), Some(0.0)).await.unwrap();
        assert!(log.entry(day(1)).is_none());
        assert_eq!(storage.write_count(), 2);
        assert_eq!(log.sync_status(), SyncStatus::Idle);
    }

    #[tokio::test]
    async fn test_push_failure_keeps_local_entry() {
        let storage = MemoryStorage::new();
        let remote = Arc::new(FakeRemote {
            delay: Duration::ZERO,
            status: 500,
            remote: None,
            pushed: Mutex::new(Vec::new()),
        });
        let mut log = WeightLog::open(storage.clone(), 173.0)
            .await
            .unwrap()
            .with_backend(remote.clone());

        let handle = log.record(day(2), Some(68.5)).await.unwrap().unwrap();
        handle.await.unwrap();

        assert!(matches!(log.sync_status(), SyncStatus::Failed { .. }));
        assert!(log.entry(day(2)).is_some());
        let reopened = WeightLog::open(storage, 173.0).await.unwrap();
        assert!(reopened.entry(day(2)).is_some());
        assert_eq!(remote.pushed.lock().unwrap()[0].date, "2026-07-02");
    }

    #[tokio::test]
    async fn test_cleared_day_pushes_nulls() {
        let remote = Arc::new(FakeRemote {
            delay: Duration::ZERO,
            status: 200,
            remote: None,
            pushed: Mutex::new(Vec::new()),
        });
        let mut log = WeightLog::open(MemoryStorage::new(), 173.0)
            .await
            .unwrap()
            .with_backend(remote.clone());
        log.record(day(3), None).await.unwrap().unwrap().await.unwrap();

        let pushed = remote.pushed.lock().unwrap();
        assert_eq!(pushed[0].weight, None);
        assert_eq!(pushed[0].bmi, None);
        assert!(matches!(log.sync_status(), SyncStatus::Delivered { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_remote_wins_on_merge() {
        let local = serde_json::json!({
            "2026-07-01": {"weight": 70.0, "bmi": 23.4},
            "2026-07-02": {"weight": 69.0, "bmi": "23.1"}
        });
        let storage =
            MemoryStorage::new().with_slot(WEIGHT_SLOT, local.to_string().as_bytes());
        let mut remote_entries = BTreeMap::new();
        remote_entries.insert("2026-07-02".to_string(), WeightEntry { weight: 68.0, bmi: 22.7 });
        remote_entries.insert("2026-07-03".to_string(), WeightEntry { weight: 67.5, bmi: 22.6 });
        let remote = Arc::new(FakeRemote {
            delay: Duration::ZERO,
            status: 200,
            remote: Some(remote_entries),
            pushed: Mutex::new(Vec::new()),
        });

        let mut log = WeightLog::open(storage, 173.0).await.unwrap().with_backend(remote);
        assert_eq!(log.sync_from_remote().await.unwrap(), 2);
        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.entry(day(1)).unwrap().weight, 70.0);
        assert_eq!(log.entry(day(2)).unwrap().weight, 68.0);
    }

    #[tokio::test]
    async fn test_pull_failure_leaves_local_state() {
        let storage = MemoryStorage::new();
        let remote = Arc::new(FakeRemote {
            delay: Duration::ZERO,
            status: 200,
            remote: None,
            pushed: Mutex::new(Vec::new()),
        });
        let mut log = WeightLog::open(storage.clone(), 173.0)
            .await
            .unwrap()
            .with_backend(remote);
        log.record(day(1), Some(70.0)).await.unwrap().unwrap().await.unwrap();
        let writes = storage.write_count();

        assert!(log.sync_from_remote().await.is_err());
        assert_eq!(storage.write_count(), writes);
        assert!(log.entry(day(1)).is_some());
        assert!(log.sync_status().to_string().starts_with("Error (Saved Locally)"));
    }

    #[tokio::test]
    async fn test_wait_for_push_is_bounded() {
        let remote = Arc::new(FakeRemote {
            delay: Duration::from_secs(30),
            status: 200,
            remote: None,
            pushed: Mutex::new(Vec::new()),
        });
        let mut log = WeightLog::open(MemoryStorage::new(), 173.0)
            .await
            .unwrap()
            .with_backend(remote);
        let handle = log.record(day(4), Some(70.0)).await.unwrap().unwrap();

        let started = std::time::Instant::now();
        let status = log.wait_for_push(handle, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(status, SyncStatus::Pending);
        assert!(log.entry(day(4)).is_some());
    }

    #[tokio::test]
    async fn test_wait_for_push_reports_delivery() {
        let remote = Arc::new(FakeRemote {
            delay: Duration::from_millis(10),
            status: 200,
            remote: None,
            pushed: Mutex::new(Vec::new()),
        });
        let mut log = WeightLog::open(MemoryStorage::new(), 173.0)
            .await
            .unwrap()
            .with_backend(remote);
        let handle = log.record(day(5), Some(70.0)).await.unwrap().unwrap();
        let status = log.wait_for_push(handle, Duration::from_secs(5)).await;
        assert!(matches!(status, SyncStatus::Delivered { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_sync_without_backend_is_config_error() {
        let mut log = WeightLog::open(MemoryStorage::new(), 173.0).await.unwrap();
        assert!(matches!(
            log.sync_from_remote().await,
            Err(TrackerError::MissingConfigError { .. })
        ));
    }
}
