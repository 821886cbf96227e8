//! Local filesystem document sink

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::DocumentSink;
use crate::error::{Error, Result};
use crate::types::{ContentFormat, WritableRecord};

/// Filesystem store writing each record's content under its URI, with a
/// JSON sidecar carrying the tags and format.
///
/// Writes are plain create-or-overwrite, matching the upsert contract.
/// Useful for tests and local runs without a remote store.
pub struct LocalDocumentSink {
    storage_dir: PathBuf,
}

#[derive(Serialize)]
struct RecordMeta<'a> {
    uri: &'a str,
    format: ContentFormat,
    collections: &'a [String],
    metadata: &'a HashMap<String, String>,
}

impl LocalDocumentSink {
    /// Create the store, making the storage directory if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    fn doc_path(&self, uri: &str) -> PathBuf {
        self.storage_dir.join(uri)
    }

    fn meta_path(&self, uri: &str) -> PathBuf {
        self.storage_dir.join(format!("{uri}.meta.json"))
    }

    /// Storage directory backing this sink
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

#[async_trait]
impl DocumentSink for LocalDocumentSink {
    async fn write_batch(&self, records: &[WritableRecord]) -> Result<()> {
        for record in records {
            let meta = serde_json::to_vec_pretty(&RecordMeta {
                uri: record.uri(),
                format: record.format(),
                collections: record.collections(),
                metadata: record.metadata(),
            })?;

            tokio::fs::write(self.doc_path(record.uri()), record.content())
                .await
                .map_err(|e| Error::sink_write(format!("writing '{}': {}", record.uri(), e)))?;
            tokio::fs::write(self.meta_path(record.uri()), meta)
                .await
                .map_err(|e| Error::sink_write(format!("writing '{}': {}", record.uri(), e)))?;
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.storage_dir.is_dir())
    }

    fn name(&self) -> &str {
        "local-fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(uri: &str, content: &str) -> WritableRecord {
        WritableRecord::new(
            uri.to_string(),
            content.to_string(),
            ContentFormat::Xhtml,
            vec!["docs".to_string()],
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn test_writes_content_and_sidecar() {
        let dir = TempDir::new().unwrap();
        let sink = LocalDocumentSink::new(dir.path()).unwrap();

        sink.write_batch(&[record("a.xhtml", "<html/>")]).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("a.xhtml")).unwrap();
        assert_eq!(content, "<html/>");

        let meta: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("a.xhtml.meta.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(meta["format"], "xhtml");
        assert_eq!(meta["collections"][0], "docs");
    }

    #[tokio::test]
    async fn test_overwrite_is_an_upsert() {
        let dir = TempDir::new().unwrap();
        let sink = LocalDocumentSink::new(dir.path()).unwrap();

        sink.write_batch(&[record("a.xhtml", "first")]).await.unwrap();
        sink.write_batch(&[record("a.xhtml", "second")]).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("a.xhtml")).unwrap();
        assert_eq!(content, "second");
    }

    #[tokio::test]
    async fn test_health_check_reflects_directory() {
        let dir = TempDir::new().unwrap();
        let sink = LocalDocumentSink::new(dir.path().join("store")).unwrap();
        assert!(sink.health_check().await.unwrap());
    }
}
