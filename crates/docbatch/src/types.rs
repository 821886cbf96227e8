//! Pipeline data model: resolved artifacts, decoded units, writable records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One resolved source artifact, in discovery order.
///
/// Holds no open handle; the decoder opens and fully consumes the byte
/// stream when the artifact is processed.
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    /// Base filename (the pattern filter matches against this, not the path)
    pub name: String,
    /// Full path of the resolved resource
    pub path: PathBuf,
    /// Position in discovery order, starting at 0
    pub index: usize,
}

impl ArtifactRef {
    /// Read the artifact's full byte stream
    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Content payload of a decoded unit
#[derive(Debug, Clone)]
pub enum DecodedContent {
    /// Extracted plain text
    Text(String),
    /// Structured record value
    Json(serde_json::Value),
}

/// One decoded record or whole-document extraction.
///
/// Created by a decoder, consumed exactly once by the transformer.
#[derive(Debug, Clone)]
pub struct DecodedUnit {
    /// Content payload
    pub content: DecodedContent,
    /// Logical name of the originating artifact, when one exists
    pub source_name: Option<String>,
    /// Decode-time metadata (source filename, detected format, counts)
    pub metadata: HashMap<String, String>,
}

/// Serialization format of a written record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// JSON document
    Json,
    /// XHTML markup document
    Xhtml,
    /// Raw text document
    Text,
}

impl ContentFormat {
    /// Destination filename extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xhtml => "xhtml",
            Self::Text => "txt",
        }
    }

    /// MIME type reported to the store
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xhtml => "application/xhtml+xml",
            Self::Text => "text/plain",
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// The unit handed to the sink: destination URI, serialized content,
/// classification tags.
///
/// The URI is assigned at construction and cannot be changed afterwards;
/// there is deliberately no setter.
#[derive(Debug, Clone, Serialize)]
pub struct WritableRecord {
    uri: String,
    content: String,
    format: ContentFormat,
    collections: Vec<String>,
    metadata: HashMap<String, String>,
}

impl WritableRecord {
    /// Create a record. `collections` must be non-empty; the transformer
    /// guarantees this by attaching the run's tags verbatim.
    pub fn new(
        uri: String,
        content: String,
        format: ContentFormat,
        collections: Vec<String>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            uri,
            content,
            format,
            collections,
            metadata,
        }
    }

    /// Destination identifier within the store
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Serialized content blob
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Serialization format tag
    pub fn format(&self) -> ContentFormat {
        self.format
    }

    /// Classification tags attached to the record
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Per-record addressing metadata
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}
