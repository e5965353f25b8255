use crate::domain::model::{Student, WeightEntry};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named key-value slots. A write replaces the whole slot.
pub trait Storage: Send + Sync {
    fn read_slot(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_slot(
        &self,
        key: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Fire-and-forget cue raised when a student completes a new line.
pub trait Celebration: Send + Sync {
    fn celebrate(&self, student: &Student, lines: usize);
}

/// Ignores every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quiet;

impl Celebration for Quiet {
    fn celebrate(&self, _student: &Student, _lines: usize) {}
}

/// Body of an outbound calendar push. `weight` and `bmi` are null for a cleared day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub date: String,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
}

/// What the transport observed for a push. The body is never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReceipt {
    pub status: u16,
}

#[async_trait]
pub trait SyncBackend: Send + Sync {
    async fn push(&self, payload: &SyncPayload) -> Result<SyncReceipt>;
    async fn pull(&self) -> Result<BTreeMap<String, WeightEntry>>;
}

pub trait ConfigProvider: Send + Sync {
    fn class_id(&self) -> &str;
    fn class_name(&self) -> Option<&str>;
    fn data_dir(&self) -> &str;
    fn default_password(&self) -> &str;
    fn height_cm(&self) -> f64;
    fn target_date(&self) -> chrono::NaiveDate;
    fn sync_endpoint(&self) -> Option<&str>;
    fn sync_timeout(&self) -> std::time::Duration;
}
