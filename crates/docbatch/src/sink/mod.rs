//! Document store sinks and the batching writer
//!
//! A sink accepts ordered batches of writable records and performs a
//! create-or-overwrite upsert per record. The bulk call is all-or-nothing
//! from the pipeline's perspective; any internal partial-success behavior
//! is the sink implementation's contract to document.

mod batch;
mod http;
mod local;

pub use batch::BatchWriter;
pub use http::HttpDocumentSink;
pub use local::LocalDocumentSink;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::WritableRecord;

/// Bulk write contract for a document store.
///
/// Implementations:
/// - `HttpDocumentSink`: remote store over HTTP
/// - `LocalDocumentSink`: local filesystem
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Upsert one ordered batch of records.
    ///
    /// Success persists the whole batch; failure fails the whole batch.
    async fn write_batch(&self, records: &[WritableRecord]) -> Result<()>;

    /// Check if the sink is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Sink name for logging
    fn name(&self) -> &str;
}
