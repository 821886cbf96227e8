//! HTTP document store sink

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::DocumentSink;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::WritableRecord;

/// Remote document store client issuing one bulk upsert per batch.
///
/// The store endpoint receives the batch as a single JSON document array
/// and is expected to upsert each record under its URI. Whether the store
/// applies the batch transactionally is its own contract; this client only
/// distinguishes whole-batch success from whole-batch failure.
pub struct HttpDocumentSink {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct BulkWriteRequest<'a> {
    documents: &'a [WritableRecord],
}

impl HttpDocumentSink {
    /// Create a client for the configured store endpoint
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn bulk_url(&self) -> String {
        format!("{}/v1/documents/bulk", self.base_url)
    }
}

#[async_trait]
impl DocumentSink for HttpDocumentSink {
    async fn write_batch(&self, records: &[WritableRecord]) -> Result<()> {
        let response = self
            .client
            .post(self.bulk_url())
            .json(&BulkWriteRequest { documents: records })
            .send()
            .await
            .map_err(|e| {
                Error::sink_write(format!("bulk write of {} records: {}", records.len(), e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::sink_write(format!(
                "store returned {status} for a batch of {} records: {body}",
                records.len()
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/health", self.base_url);
        Ok(self
            .client
            .get(url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "http-store"
    }
}
