//! Command-line entry point for running one ingestion pipeline

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use docbatch::{
    DecodeMode, DocumentSink, HttpDocumentSink, IngestPipeline, LocalDocumentSink,
    LoggingListener, RunConfig, StoreConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Avro object container, one JSON record per datum
    Avro,
    /// Arbitrary documents, one XHTML record per file
    Document,
}

impl From<ModeArg> for DecodeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Avro => DecodeMode::Avro,
            ModeArg::Document => DecodeMode::Document,
        }
    }
}

/// Ingest documents or record containers into a document store in batches
#[derive(Debug, Parser)]
#[command(name = "docbatch", version, about)]
struct Cli {
    /// Source path: a directory, a single document, or an Avro container
    #[arg(long)]
    input: Option<PathBuf>,

    /// Regex matched against base filenames; non-matching files are skipped
    #[arg(long)]
    pattern: Option<String>,

    /// Decoding strategy
    #[arg(long, value_enum, default_value_t = ModeArg::Document)]
    mode: ModeArg,

    /// Collection tag to attach to every record (repeatable)
    #[arg(long = "collection")]
    collections: Vec<String>,

    /// Records per bulk write
    #[arg(long, default_value_t = 10)]
    batch_size: usize,

    /// Remote store base URL; without it, records go to --output-dir
    #[arg(long)]
    store_url: Option<String>,

    /// Local output directory used when no store URL is given
    #[arg(long, default_value = "docbatch-out")]
    output_dir: PathBuf,

    /// TOML run-config file; command-line flags are ignored when set
    #[arg(long, conflicts_with_all = ["input", "pattern", "collections", "batch_size"])]
    config: Option<PathBuf>,
}

impl Cli {
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        if let Some(path) = &self.config {
            return Ok(RunConfig::from_toml_path(path)?);
        }
        let input = self
            .input
            .clone()
            .context("either --input or --config is required")?;

        let mut config = RunConfig::new(input, self.mode.into()).with_batch_size(self.batch_size);
        if let Some(pattern) = &self.pattern {
            config = config.with_pattern(pattern.clone());
        }
        if !self.collections.is_empty() {
            config = config.with_collections(self.collections.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.run_config()?;

    let sink: Arc<dyn DocumentSink> = match &cli.store_url {
        Some(url) => Arc::new(HttpDocumentSink::new(&StoreConfig::new(url.clone()))?),
        None => Arc::new(LocalDocumentSink::new(&cli.output_dir)?),
    };

    let mut pipeline =
        IngestPipeline::new(config, sink).with_listener(Box::new(LoggingListener));
    let report = pipeline.run().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
