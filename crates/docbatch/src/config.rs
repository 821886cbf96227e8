//! Run and store configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Decoding strategy, selected explicitly at configuration time.
///
/// Never auto-detected from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Structured-binary mode: one Avro object container, one JSON record
    /// per contained datum
    Avro,
    /// Document-extraction mode: one XHTML record per resolved source file
    Document,
}

impl std::fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Avro => write!(f, "avro"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Declarative configuration for one run, bound at run start and immutable
/// for the lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Source path: a directory (recursed to unbounded depth) or a single file
    pub source_path: PathBuf,
    /// Optional regex matched against base filenames; non-matching artifacts
    /// are skipped. Absent means accept all.
    #[serde(default)]
    pub file_pattern: Option<String>,
    /// Classification tags attached verbatim to every written record
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
    /// Batch capacity for the writer (records per bulk call)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Decoding strategy
    pub mode: DecodeMode,
}

fn default_collections() -> Vec<String> {
    vec!["ingest".to_string()]
}

fn default_batch_size() -> usize {
    10
}

impl RunConfig {
    /// Create a config with default tags and batch capacity
    pub fn new(source_path: impl Into<PathBuf>, mode: DecodeMode) -> Self {
        Self {
            source_path: source_path.into(),
            file_pattern: None,
            collections: default_collections(),
            batch_size: default_batch_size(),
            mode,
        }
    }

    /// Set the filename pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = Some(pattern.into());
        self
    }

    /// Set the classification tags
    pub fn with_collections(mut self, collections: Vec<String>) -> Self {
        self.collections = collections;
        self
    }

    /// Set the batch capacity
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Load a run config from a TOML file
    pub fn from_toml_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read config '{}': {}", path.display(), e)))?;
        toml::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid config '{}': {}", path.display(), e)))
    }

    /// Validate invariants that must hold before any record is processed
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        if self.collections.is_empty() {
            return Err(Error::config("at least one collection tag is required"));
        }
        Ok(())
    }
}

/// Remote document store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store base URL
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl StoreConfig {
    /// Create settings for a store endpoint with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
