//! Pipeline orchestration: one run from resolution to drained sink

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{DecodeMode, RunConfig};
use crate::decode::{AvroDecoder, DecodeFailure, DocumentDecoder, RecordDecoder};
use crate::error::{Error, Result};
use crate::resolver::ResourceResolver;
use crate::sink::{BatchWriter, DocumentSink};
use crate::transform::RecordTransform;

/// Orchestrator lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Run identity handed to lifecycle listeners
#[derive(Debug, Clone)]
pub struct RunInfo {
    /// Unique id for this run
    pub id: Uuid,
    /// Decoding strategy in effect
    pub mode: DecodeMode,
    /// Source path being ingested
    pub source: PathBuf,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub records_written: u64,
    pub batches_flushed: u64,
    pub decode_failures: Vec<DecodeFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<String>,
}

/// Start-of-run and end-of-run notification hooks.
///
/// Callbacks are synchronous and observational only; they carry no resource
/// release responsibility. The finish callback also fires for failed runs.
pub trait RunListener: Send + Sync {
    fn on_start(&self, _run: &RunInfo) {}
    fn on_finish(&self, _run: &RunInfo, _report: &RunReport) {}
}

/// Listener logging run boundaries through tracing
pub struct LoggingListener;

impl RunListener for LoggingListener {
    fn on_start(&self, run: &RunInfo) {
        tracing::info!(
            "run {} started: {} mode over '{}'",
            run.id,
            run.mode,
            run.source.display()
        );
    }

    fn on_finish(&self, run: &RunInfo, report: &RunReport) {
        match report.state {
            RunState::Completed => tracing::info!(
                "run {} completed: {} records in {} batches, {} skipped",
                run.id,
                report.records_written,
                report.batches_flushed,
                report.decode_failures.len()
            ),
            _ => tracing::error!(
                "run {} failed after {} records: {}",
                run.id,
                report.records_written,
                report.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Drives one run: resolver -> decoder -> transformer -> batch writer.
///
/// Strictly sequential pull loop, single use. A second `run()` call on the
/// same instance is a configuration error.
pub struct IngestPipeline {
    config: RunConfig,
    sink: Arc<dyn DocumentSink>,
    listeners: Vec<Box<dyn RunListener>>,
    state: RunState,
    run_id: Uuid,
}

impl IngestPipeline {
    /// Create a pipeline bound to one run config and one sink
    pub fn new(config: RunConfig, sink: Arc<dyn DocumentSink>) -> Self {
        Self {
            config,
            sink,
            listeners: Vec::new(),
            state: RunState::NotStarted,
            run_id: Uuid::new_v4(),
        }
    }

    /// Register a lifecycle listener
    pub fn with_listener(mut self, listener: Box<dyn RunListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Unique id of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Execute the run to completion.
    ///
    /// Per-unit decode failures are contained and reported in the returned
    /// `RunReport`; configuration, container, and sink errors terminate the
    /// run and propagate after the finish notification fires.
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.state != RunState::NotStarted {
            return Err(Error::config("pipeline instance has already run"));
        }
        self.config.validate()?;

        self.state = RunState::Running;
        let started_at = Utc::now();
        let info = RunInfo {
            id: self.run_id,
            mode: self.config.mode,
            source: self.config.source_path.clone(),
        };
        for listener in &self.listeners {
            listener.on_start(&info);
        }

        let outcome = self.execute().await;

        let (state, stats, error) = match &outcome {
            Ok(stats) => (RunState::Completed, stats.clone(), None),
            Err(e) => (RunState::Failed, RunStats::default(), Some(e.to_string())),
        };
        self.state = state;

        let report = RunReport {
            run_id: self.run_id,
            state,
            records_written: stats.records_written,
            batches_flushed: stats.batches_flushed,
            decode_failures: stats.failures,
            started_at,
            finished_at: Utc::now(),
            error,
        };
        // Finish notification fires even on failure; it is observational only
        for listener in &self.listeners {
            listener.on_finish(&info, &report);
        }

        outcome.map(|_| report)
    }

    async fn execute(&self) -> Result<RunStats> {
        let mut decoder: Box<dyn RecordDecoder> = match self.config.mode {
            DecodeMode::Avro => Box::new(AvroDecoder::open(&self.config.source_path)?),
            DecodeMode::Document => {
                let resolver = ResourceResolver::from_config(&self.config)?;
                Box::new(DocumentDecoder::new(resolver))
            }
        };
        let transform =
            RecordTransform::new(self.config.mode, self.config.collections.clone());
        let mut writer = BatchWriter::new(self.sink.clone(), self.config.batch_size);

        while let Some(unit) = decoder.next_unit()? {
            let record = transform.transform(unit);
            writer.offer(record).await?;
        }
        writer.drain().await?;

        Ok(RunStats {
            records_written: writer.records_written(),
            batches_flushed: writer.batches_flushed(),
            failures: decoder.failures().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Default)]
struct RunStats {
    records_written: u64,
    batches_flushed: u64,
    failures: Vec<DecodeFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::RecordingSink;
    use apache_avro::types::Record;
    use apache_avro::{Schema, Writer};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn write_avro_container(path: &std::path::Path, count: i64) {
        let schema = Schema::parse_str(
            r#"{"type":"record","name":"event","fields":[{"name":"id","type":"long"}]}"#,
        )
        .unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for i in 0..count {
            let mut record = Record::new(&schema).unwrap();
            record.put("id", i);
            writer.append(record).unwrap();
        }
        fs::write(path, writer.into_inner().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_25_documents_flush_as_10_10_5() {
        let dir = TempDir::new().unwrap();
        for i in 0..25 {
            fs::write(dir.path().join(format!("doc{i:02}.txt")), b"text").unwrap();
        }

        let sink = Arc::new(RecordingSink::new());
        let config = RunConfig::new(dir.path(), DecodeMode::Document);
        let mut pipeline = IngestPipeline::new(config, sink.clone());
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.state, RunState::Completed);
        assert_eq!(report.records_written, 25);
        assert_eq!(sink.batch_sizes(), vec![10, 10, 5]);
        assert!(report.decode_failures.is_empty());
    }

    #[tokio::test]
    async fn test_avro_container_12_records_two_flushes_distinct_uris() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("events.avro");
        write_avro_container(&container, 12);

        let sink = Arc::new(RecordingSink::new());
        let config = RunConfig::new(&container, DecodeMode::Avro)
            .with_collections(vec!["avro".to_string()]);
        let mut pipeline = IngestPipeline::new(config, sink.clone());
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.state, RunState::Completed);
        assert_eq!(sink.batch_sizes(), vec![10, 2]);

        let uris = sink.uris();
        let distinct: HashSet<_> = uris.iter().collect();
        assert_eq!(distinct.len(), 12);
        assert!(uris.iter().all(|u| u.ends_with(".json")));
    }

    #[tokio::test]
    async fn test_corrupt_artifact_contained_run_completes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"one").unwrap();
        fs::write(dir.path().join("b.txt"), b"two").unwrap();
        fs::write(dir.path().join("c.txt"), b"three").unwrap();
        fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();

        let sink = Arc::new(RecordingSink::new());
        let config = RunConfig::new(dir.path(), DecodeMode::Document);
        let mut pipeline = IngestPipeline::new(config, sink.clone());
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.state, RunState::Completed);
        assert_eq!(report.records_written, 3);
        assert_eq!(report.decode_failures.len(), 1);
        assert_eq!(report.decode_failures[0].name, "broken.pdf");
        assert_eq!(pipeline.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_document_reruns_produce_same_uris() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::write(dir.path().join("b.txt"), b"beta").unwrap();

        let mut all_uris = Vec::new();
        for _ in 0..2 {
            let sink = Arc::new(RecordingSink::new());
            let config = RunConfig::new(dir.path(), DecodeMode::Document);
            let mut pipeline = IngestPipeline::new(config, sink.clone());
            pipeline.run().await.unwrap();

            let mut uris = sink.uris();
            uris.sort();
            all_uris.push(uris);
        }
        assert_eq!(all_uris[0], all_uris[1]);
        assert_eq!(
            all_uris[0],
            vec!["a.txt.xhtml".to_string(), "b.txt.xhtml".to_string()]
        );
    }

    #[tokio::test]
    async fn test_sink_failure_terminates_run_keeps_earlier_batches() {
        let dir = TempDir::new().unwrap();
        for i in 0..12 {
            fs::write(dir.path().join(format!("doc{i:02}.txt")), b"text").unwrap();
        }

        let sink = Arc::new(RecordingSink::failing_after(1));
        let config = RunConfig::new(dir.path(), DecodeMode::Document).with_batch_size(5);
        let mut pipeline = IngestPipeline::new(config, sink.clone());

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));
        assert_eq!(pipeline.state(), RunState::Failed);
        // First batch persisted, nothing rolled back
        assert_eq!(sink.batch_sizes(), vec![5]);
    }

    #[tokio::test]
    async fn test_missing_source_fails_before_any_record() {
        let sink = Arc::new(RecordingSink::new());
        let config = RunConfig::new("/does/not/exist", DecodeMode::Document);
        let mut pipeline = IngestPipeline::new(config, sink.clone());

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(pipeline.state(), RunState::Failed);
        assert!(sink.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_runs_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();

        let sink = Arc::new(RecordingSink::new());
        let config = RunConfig::new(dir.path(), DecodeMode::Document);
        let mut pipeline = IngestPipeline::new(config, sink);

        pipeline.run().await.unwrap();
        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_listeners_fire_on_failure_too() {
        use parking_lot::Mutex;

        struct EventListener(Arc<Mutex<Vec<String>>>);
        impl RunListener for EventListener {
            fn on_start(&self, _run: &RunInfo) {
                self.0.lock().push("start".to_string());
            }
            fn on_finish(&self, _run: &RunInfo, report: &RunReport) {
                self.0.lock().push(format!("finish:{}", report.state));
            }
        }

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(RecordingSink::new());
        let config = RunConfig::new("/does/not/exist", DecodeMode::Document);
        let mut pipeline = IngestPipeline::new(config, sink)
            .with_listener(Box::new(EventListener(events.clone())));

        pipeline.run().await.unwrap_err();
        assert_eq!(
            *events.lock(),
            vec!["start".to_string(), "finish:failed".to_string()]
        );
    }
}
