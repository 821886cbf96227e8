//! Document-extraction decoding over the resolver's artifact sequence

use std::collections::HashMap;

use super::extract;
use super::{DecodeFailure, RecordDecoder};
use crate::error::Result;
use crate::resolver::ResourceResolver;
use crate::types::{DecodedContent, DecodedUnit};

/// Consumes one artifact at a time from the resolver and yields exactly one
/// decoded unit per successfully-extracted artifact.
///
/// A read or extraction failure on one artifact is contained: it is
/// recorded, logged, and the decoder moves on to the next artifact without
/// aborting the sequence.
pub struct DocumentDecoder {
    resolver: ResourceResolver,
    failures: Vec<DecodeFailure>,
}

impl DocumentDecoder {
    /// Create a decoder over a resolved artifact sequence
    pub fn new(resolver: ResourceResolver) -> Self {
        Self {
            resolver,
            failures: Vec::new(),
        }
    }

    fn record_failure(&mut self, name: String, message: String) {
        tracing::warn!("skipping '{}': {}", name, message);
        self.failures.push(DecodeFailure { name, message });
    }
}

impl RecordDecoder for DocumentDecoder {
    fn next_unit(&mut self) -> Result<Option<DecodedUnit>> {
        loop {
            let Some(artifact) = self.resolver.next() else {
                return Ok(None);
            };

            // Bytes are fully read and dropped before the next artifact;
            // an IO failure here is the same per-unit case as a parse failure
            let bytes = match artifact.read_bytes() {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.record_failure(artifact.name, e.to_string());
                    continue;
                }
            };

            match extract::extract(&artifact.name, &bytes) {
                Ok(extracted) => {
                    let mut metadata: HashMap<String, String> = extracted.metadata;
                    metadata.insert("source".to_string(), artifact.name.clone());
                    metadata.insert(
                        "source-content-type".to_string(),
                        mime_guess::from_path(&artifact.path)
                            .first_or_octet_stream()
                            .to_string(),
                    );

                    return Ok(Some(DecodedUnit {
                        content: DecodedContent::Text(extracted.text),
                        source_name: Some(artifact.name),
                        metadata,
                    }));
                }
                Err(e) => {
                    self.record_failure(artifact.name, e.to_string());
                    continue;
                }
            }
        }
    }

    fn failures(&self) -> &[DecodeFailure] {
        &self.failures
    }
}
