//! docbatch: batched document ingestion into remote document stores
//!
//! The pipeline resolves a source path (plus an optional filename pattern)
//! into a lazy artifact sequence, decodes each artifact into one or more
//! records, and delivers the records to a document store in bounded,
//! ordered batches. Two decoding strategies are supported: Avro object
//! containers (one record per contained datum, rendered as JSON) and
//! arbitrary document extraction (one XHTML record per source file).

pub mod config;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod sink;
pub mod transform;
pub mod types;

pub use config::{DecodeMode, RunConfig, StoreConfig};
pub use decode::{AvroDecoder, DecodeFailure, DocumentDecoder, RecordDecoder};
pub use error::{Error, Result};
pub use pipeline::{
    IngestPipeline, LoggingListener, RunInfo, RunListener, RunReport, RunState,
};
pub use resolver::ResourceResolver;
pub use sink::{BatchWriter, DocumentSink, HttpDocumentSink, LocalDocumentSink};
pub use transform::RecordTransform;
pub use types::{ArtifactRef, ContentFormat, DecodedContent, DecodedUnit, WritableRecord};
