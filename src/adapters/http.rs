use crate::domain::model::WeightEntry;
use crate::domain::ports::{SyncBackend, SyncPayload, SyncReceipt};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Calendar mirror behind a single URL: POST one day, GET the whole mapping.
#[derive(Debug, Clone)]
pub struct HttpSync {
    endpoint: String,
    client: Client,
}

impl HttpSync {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SyncBackend for HttpSync {
    async fn push(&self, payload: &SyncPayload) -> Result<SyncReceipt> {
        // the endpoint parses the raw body itself
        let body = serde_json::to_string(payload)?;
        tracing::debug!("POST {} {}", self.endpoint, body);
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        Ok(SyncReceipt {
            status: response.status().as_u16(),
        })
    }

    async fn pull(&self) -> Result<BTreeMap<String, WeightEntry>> {
        tracing::debug!("GET {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
