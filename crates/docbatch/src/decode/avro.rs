//! Structured-binary decoding of Avro object containers

use apache_avro::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{DecodeFailure, RecordDecoder};
use crate::error::{Error, Result};
use crate::types::{DecodedContent, DecodedUnit};

/// Streams typed records out of one Avro object container, one at a time.
///
/// The container's writer schema describes the records; each is rendered as
/// a canonical JSON value. Exactly one container is processed per run; the
/// reader holds the file open for the decoder's lifetime and closes it on
/// drop. A corrupt container is run-terminating, since the stream is not
/// independently resumable past a bad block.
pub struct AvroDecoder {
    reader: Reader<'static, BufReader<File>>,
    path: PathBuf,
    container_name: String,
    records_read: u64,
}

impl std::fmt::Debug for AvroDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvroDecoder")
            .field("path", &self.path)
            .field("container_name", &self.container_name)
            .field("records_read", &self.records_read)
            .finish_non_exhaustive()
    }
}

impl AvroDecoder {
    /// Open a container file and read its embedded schema
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::config(format!(
                "structured-binary mode requires a container file, got '{}'",
                path.display()
            )));
        }
        let file = File::open(path).map_err(|e| {
            Error::config(format!("cannot open container '{}': {}", path.display(), e))
        })?;
        let reader = Reader::new(BufReader::new(file))
            .map_err(|e| Error::container(path.display().to_string(), e.to_string()))?;

        let container_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            container_name,
            records_read: 0,
        })
    }

    /// Records decoded so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

impl RecordDecoder for AvroDecoder {
    fn next_unit(&mut self) -> Result<Option<DecodedUnit>> {
        match self.reader.next() {
            None => Ok(None),
            Some(Ok(value)) => {
                let json = serde_json::Value::try_from(value).map_err(|e| {
                    Error::container(self.path.display().to_string(), e.to_string())
                })?;
                self.records_read += 1;

                let mut metadata = HashMap::new();
                metadata.insert("container".to_string(), self.container_name.clone());
                metadata.insert("record-number".to_string(), self.records_read.to_string());

                Ok(Some(DecodedUnit {
                    content: DecodedContent::Json(json),
                    source_name: Some(self.container_name.clone()),
                    metadata,
                }))
            }
            Some(Err(e)) => Err(Error::container(
                self.path.display().to_string(),
                e.to_string(),
            )),
        }
    }

    fn failures(&self) -> &[DecodeFailure] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::types::Record;
    use apache_avro::{Schema, Writer};
    use std::fs;
    use tempfile::TempDir;

    const EVENT_SCHEMA: &str = r#"
    {
        "type": "record",
        "name": "event",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "label", "type": "string"}
        ]
    }
    "#;

    fn write_container(path: &Path, count: i64) {
        let schema = Schema::parse_str(EVENT_SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for i in 0..count {
            let mut record = Record::new(&schema).unwrap();
            record.put("id", i);
            record.put("label", format!("event-{i}"));
            writer.append(record).unwrap();
        }
        fs::write(path, writer.into_inner().unwrap()).unwrap();
    }

    #[test]
    fn test_streams_all_records_as_json() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("events.avro");
        write_container(&container, 3);

        let mut decoder = AvroDecoder::open(&container).unwrap();
        let mut ids = Vec::new();
        while let Some(unit) = decoder.next_unit().unwrap() {
            match unit.content {
                DecodedContent::Json(v) => ids.push(v["id"].as_i64().unwrap()),
                other => panic!("expected JSON content, got {other:?}"),
            }
        }

        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(decoder.records_read(), 3);
        assert!(decoder.failures().is_empty());
    }

    #[test]
    fn test_unit_metadata_names_the_container() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("events.avro");
        write_container(&container, 1);

        let mut decoder = AvroDecoder::open(&container).unwrap();
        let unit = decoder.next_unit().unwrap().unwrap();
        assert_eq!(unit.source_name.as_deref(), Some("events.avro"));
        assert_eq!(unit.metadata.get("container").unwrap(), "events.avro");
    }

    #[test]
    fn test_corrupt_container_is_terminal() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("broken.avro");
        fs::write(&container, b"not an avro container").unwrap();

        let err = AvroDecoder::open(&container).unwrap_err();
        assert!(matches!(err, Error::Container { .. }));
    }

    #[test]
    fn test_missing_container_is_config_error() {
        let err = AvroDecoder::open(Path::new("/no/such/file.avro")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let err = AvroDecoder::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
