//! Resource resolution: lazy, pattern-filtered artifact discovery
//!
//! Expands a source path into an ordered artifact sequence using walkdir,
//! then applies an optional regex filter against base filenames. Filtering
//! happens inside `next()`, so the consumer's contract is always "next
//! matching artifact or end of sequence".

use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::types::ArtifactRef;

/// Lazy iterator over accepted artifacts.
///
/// Discovery order is filesystem-enumeration order; no sorting, no
/// deduplication.
#[derive(Debug)]
pub struct ResourceResolver {
    walker: walkdir::IntoIter,
    pattern: Option<Regex>,
    next_index: usize,
}

impl ResourceResolver {
    /// Resolve a source path with an optional base-filename regex.
    ///
    /// Fails fast with a configuration error when the path does not exist,
    /// cannot be read, or the pattern does not compile. The pattern must
    /// match the entire filename, not a substring.
    pub fn new(source_path: &Path, file_pattern: Option<&str>) -> Result<Self> {
        let meta = std::fs::metadata(source_path).map_err(|e| {
            Error::config(format!(
                "cannot resolve source path '{}': {}",
                source_path.display(),
                e
            ))
        })?;
        if meta.is_dir() {
            // Surface permission problems now rather than as an empty walk
            std::fs::read_dir(source_path).map_err(|e| {
                Error::config(format!(
                    "cannot read source directory '{}': {}",
                    source_path.display(),
                    e
                ))
            })?;
        }

        let pattern = match file_pattern {
            Some(p) => Some(Regex::new(&format!("^(?:{p})$")).map_err(|e| {
                Error::config(format!("invalid filename pattern '{p}': {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            walker: WalkDir::new(source_path).into_iter(),
            pattern,
            next_index: 0,
        })
    }

    /// Resolve from a run config
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::new(&config.source_path, config.file_pattern.as_deref())
    }

    fn accepts(&self, name: &str) -> bool {
        self.pattern.as_ref().map_or(true, |re| re.is_match(name))
    }
}

impl Iterator for ResourceResolver {
    type Item = ArtifactRef;

    fn next(&mut self) -> Option<ArtifactRef> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if !self.accepts(&name) {
                        tracing::debug!("skipping '{}': does not match filename pattern", name);
                        continue;
                    }
                    let index = self.next_index;
                    self.next_index += 1;
                    return Some(ArtifactRef {
                        name,
                        path: entry.into_path(),
                        index,
                    });
                }
                Err(e) => {
                    // Mid-walk failures on individual entries are not
                    // run-terminating
                    tracing::warn!("walk error: {e}");
                    continue;
                }
            }
        }
    }
}
