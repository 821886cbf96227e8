//! Transformation of decoded units into writable records
//!
//! Pure construction: destination URI assignment, content rendering, and
//! verbatim tag attachment. No I/O.

use quick_xml::escape::escape;
use uuid::Uuid;

use crate::config::DecodeMode;
use crate::types::{ContentFormat, DecodedContent, DecodedUnit, WritableRecord};

/// Maps decoded units to writable records for one run.
///
/// The URI policy is fixed per mode: structured-binary records get a
/// freshly generated identifier (`{uuid}.json`), document extractions get
/// the source artifact's logical name (`{name}.xhtml`). Document-mode
/// naming is therefore deterministic across re-runs, and artifacts sharing
/// a base name overwrite each other in the sink.
pub struct RecordTransform {
    mode: DecodeMode,
    collections: Vec<String>,
}

impl RecordTransform {
    /// Bind the run's mode and classification tags
    pub fn new(mode: DecodeMode, collections: Vec<String>) -> Self {
        Self { mode, collections }
    }

    /// Build the writable record for one decoded unit
    pub fn transform(&self, unit: DecodedUnit) -> WritableRecord {
        match self.mode {
            DecodeMode::Avro => self.transform_record(unit),
            DecodeMode::Document => self.transform_document(unit),
        }
    }

    fn transform_record(&self, unit: DecodedUnit) -> WritableRecord {
        let format = ContentFormat::Json;
        let uri = format!("{}.{}", Uuid::new_v4(), format.extension());
        let content = match unit.content {
            DecodedContent::Json(value) => value.to_string(),
            DecodedContent::Text(text) => text,
        };

        let mut metadata = unit.metadata;
        metadata.insert("content-type".to_string(), format.mime_type().to_string());

        WritableRecord::new(uri, content, format, self.collections.clone(), metadata)
    }

    fn transform_document(&self, unit: DecodedUnit) -> WritableRecord {
        let format = ContentFormat::Xhtml;
        let name = unit
            .source_name
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let uri = format!("{}.{}", name, format.extension());

        let body = match unit.content {
            DecodedContent::Text(text) => text,
            DecodedContent::Json(value) => value.to_string(),
        };
        let content = render_xhtml(&name, &body);

        let mut metadata = unit.metadata;
        metadata.insert("content-type".to_string(), format.mime_type().to_string());

        WritableRecord::new(uri, content, format, self.collections.clone(), metadata)
    }
}

/// Render extracted text as a minimal XHTML document, one paragraph per
/// source line, with all text content escaped.
fn render_xhtml(title: &str, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">\n");
    out.push_str("<head><title>");
    out.push_str(&escape(title));
    out.push_str("</title></head>\n<body>\n");
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        out.push_str("<p>");
        out.push_str(&escape(line.trim()));
        out.push_str("</p>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}
