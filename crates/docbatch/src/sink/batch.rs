//! Size-bounded batching in front of a document sink

use std::sync::Arc;

use super::DocumentSink;
use crate::error::Result;
use crate::types::WritableRecord;

/// Accumulates records and issues one bulk write per full batch.
///
/// `offer` flushes exactly when the buffer reaches capacity; `drain`
/// flushes any non-empty remainder at end of stream. Records are flushed
/// in offer order. A failed bulk write surfaces to the caller and
/// terminates the run; batches already flushed are not rolled back
/// (at-least-once delivery across batch boundaries).
pub struct BatchWriter {
    sink: Arc<dyn DocumentSink>,
    capacity: usize,
    buffer: Vec<WritableRecord>,
    records_written: u64,
    batches_flushed: u64,
}

impl BatchWriter {
    /// Create a writer with the given batch capacity.
    ///
    /// Capacity must be positive; the run config validates this before the
    /// writer is constructed.
    pub fn new(sink: Arc<dyn DocumentSink>, capacity: usize) -> Self {
        Self {
            sink,
            capacity,
            buffer: Vec::with_capacity(capacity),
            records_written: 0,
            batches_flushed: 0,
        }
    }

    /// Append one record, flushing when the buffer reaches capacity
    pub async fn offer(&mut self, record: WritableRecord) -> Result<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush any non-empty remainder. Called once, at normal end of stream.
    pub async fn drain(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        tracing::debug!(
            "flushing batch of {} records to {}",
            self.buffer.len(),
            self.sink.name()
        );
        self.sink.write_batch(&self.buffer).await?;
        self.records_written += self.buffer.len() as u64;
        self.batches_flushed += 1;
        self.buffer.clear();
        Ok(())
    }

    /// Records delivered across all flushed batches
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Bulk calls issued so far
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed
    }

    /// Records buffered but not yet flushed
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sink::testing::RecordingSink;
    use crate::types::ContentFormat;
    use std::collections::HashMap;

    fn record(n: usize) -> WritableRecord {
        WritableRecord::new(
            format!("r{n}.json"),
            "{}".to_string(),
            ContentFormat::Json,
            vec!["test".to_string()],
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn test_flush_sizes_for_25_records_capacity_10() {
        let sink = Arc::new(RecordingSink::new());
        let mut writer = BatchWriter::new(sink.clone(), 10);

        for n in 0..25 {
            writer.offer(record(n)).await.unwrap();
        }
        writer.drain().await.unwrap();

        assert_eq!(sink.batch_sizes(), vec![10, 10, 5]);
        assert_eq!(writer.records_written(), 25);
        assert_eq!(writer.batches_flushed(), 3);
        assert_eq!(writer.pending(), 0);
    }

    #[tokio::test]
    async fn test_order_preserved_within_and_across_batches() {
        let sink = Arc::new(RecordingSink::new());
        let mut writer = BatchWriter::new(sink.clone(), 4);

        for n in 0..10 {
            writer.offer(record(n)).await.unwrap();
        }
        writer.drain().await.unwrap();

        let expected: Vec<String> = (0..10).map(|n| format!("r{n}.json")).collect();
        assert_eq!(sink.uris(), expected);
    }

    #[tokio::test]
    async fn test_exact_multiple_leaves_nothing_for_drain() {
        let sink = Arc::new(RecordingSink::new());
        let mut writer = BatchWriter::new(sink.clone(), 5);

        for n in 0..10 {
            writer.offer(record(n)).await.unwrap();
        }
        assert_eq!(writer.batches_flushed(), 2);

        writer.drain().await.unwrap();
        assert_eq!(sink.batch_sizes(), vec![5, 5]);
    }

    #[tokio::test]
    async fn test_drain_without_records_issues_no_call() {
        let sink = Arc::new(RecordingSink::new());
        let mut writer = BatchWriter::new(sink.clone(), 10);
        writer.drain().await.unwrap();
        assert!(sink.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_capacity_one_flushes_every_offer() {
        let sink = Arc::new(RecordingSink::new());
        let mut writer = BatchWriter::new(sink.clone(), 1);

        for n in 0..3 {
            writer.offer(record(n)).await.unwrap();
        }
        assert_eq!(sink.batch_sizes(), vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn test_failed_flush_surfaces_and_keeps_earlier_batches() {
        let sink = Arc::new(RecordingSink::failing_after(1));
        let mut writer = BatchWriter::new(sink.clone(), 2);

        writer.offer(record(0)).await.unwrap();
        writer.offer(record(1)).await.unwrap();

        writer.offer(record(2)).await.unwrap();
        let err = writer.offer(record(3)).await.unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));

        // The first batch stays persisted; the failed one was never recorded
        assert_eq!(sink.batch_sizes(), vec![2]);
        assert_eq!(writer.records_written(), 2);
    }
}
