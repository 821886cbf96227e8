//! Record decoders for the two ingestion modes
//!
//! Both decoders are stateful, single-pass and not restartable. They expose
//! a pull contract: `next_unit` returns the next decoded record or `None`
//! at end of sequence.

mod avro;
mod document;
pub mod extract;

pub use avro::AvroDecoder;
pub use document::DocumentDecoder;

use serde::Serialize;

use crate::error::Result;
use crate::types::DecodedUnit;

/// One artifact that could not be decoded during a run
#[derive(Debug, Clone, Serialize)]
pub struct DecodeFailure {
    /// Base filename of the failed artifact
    pub name: String,
    /// What went wrong
    pub message: String,
}

/// Pull contract shared by both decoding strategies.
///
/// In document-extraction mode a failed artifact is recorded and skipped;
/// `failures()` reports what was skipped. In structured-binary mode any
/// decode error is run-terminating and `failures()` stays empty.
pub trait RecordDecoder {
    /// Next decoded unit, or `None` at end of sequence
    fn next_unit(&mut self) -> Result<Option<DecodedUnit>>;

    /// Artifacts skipped so far with the reason for each
    fn failures(&self) -> &[DecodeFailure];
}
