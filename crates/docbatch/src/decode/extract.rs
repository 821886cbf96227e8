//! Best-effort content extraction for arbitrary document formats
//!
//! Format detection is extension-based, never content-sniffed. Each
//! extractor produces readable text plus cheap metadata; rendering to the
//! output serialization happens in the transformer.

use calamine::Reader as _;
use std::collections::HashMap;
use std::io::Read;

use crate::error::{Error, Result};

/// Source document format, detected from the file extension only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Html,
    Csv,
    Markdown,
    Text,
}

impl SourceFormat {
    /// Detect from a filename's extension
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" | "xls" => Some(Self::Xlsx),
            "html" | "htm" => Some(Self::Html),
            "csv" => Some(Self::Csv),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" | "text" | "log" => Some(Self::Text),
            _ => None,
        }
    }

    /// Short label recorded in unit metadata
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }
}

/// Extraction output for one artifact
#[derive(Debug)]
pub struct Extracted {
    /// Readable text content
    pub text: String,
    /// Detected format
    pub format: SourceFormat,
    /// Cheap extraction metadata (page/sheet/slide counts)
    pub metadata: HashMap<String, String>,
}

/// Extract readable text and metadata from one artifact's bytes.
///
/// Any failure here is a per-unit error: the caller skips the artifact and
/// continues with the rest of the sequence.
pub fn extract(name: &str, data: &[u8]) -> Result<Extracted> {
    let format = SourceFormat::from_name(name)
        .ok_or_else(|| Error::decode(name, "unsupported file type"))?;

    let mut metadata = HashMap::new();
    metadata.insert("format".to_string(), format.label().to_string());

    let text = match format {
        SourceFormat::Pdf => extract_pdf(name, data, &mut metadata)?,
        SourceFormat::Docx => extract_docx(name, data)?,
        SourceFormat::Pptx => extract_pptx(name, data, &mut metadata)?,
        SourceFormat::Xlsx => extract_xlsx(name, data, &mut metadata)?,
        SourceFormat::Html => extract_html(data),
        SourceFormat::Csv => extract_csv(data)?,
        SourceFormat::Markdown | SourceFormat::Text => {
            String::from_utf8_lossy(data).into_owned()
        }
    };

    if text.trim().is_empty() {
        return Err(Error::decode(name, "no readable text content"));
    }

    Ok(Extracted {
        text,
        format,
        metadata,
    })
}

fn extract_pdf(
    name: &str,
    data: &[u8],
    metadata: &mut HashMap<String, String>,
) -> Result<String> {
    let raw = pdf_extract::extract_text_from_mem(data)
        .map_err(|e| Error::decode(name, e.to_string()))?;

    // Cheap page-count probe; extraction itself does not need the document
    if let Ok(doc) = lopdf::Document::load_mem(data) {
        metadata.insert("pages".to_string(), doc.get_pages().len().to_string());
    }

    let text = raw
        .replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(text)
}

fn extract_docx(name: &str, data: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(data).map_err(|e| Error::decode(name, e.to_string()))?;

    let mut text = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

fn extract_pptx(
    name: &str,
    data: &[u8],
    metadata: &mut HashMap<String, String>,
) -> Result<String> {
    let cursor = std::io::Cursor::new(data);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| Error::decode(name, e.to_string()))?;

    // Slide entries are unordered in the archive; sort by slide number
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    slide_names.sort_by_key(|n| {
        n.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(0)
    });

    let mut text = String::new();
    for slide_name in &slide_names {
        let mut xml = String::new();
        if let Ok(mut file) = archive.by_name(slide_name) {
            if file.read_to_string(&mut xml).is_err() {
                continue;
            }
        }
        let slide_text = slide_text_from_xml(&xml);
        if !slide_text.is_empty() {
            text.push_str(&slide_text);
            text.push('\n');
        }
    }

    metadata.insert("slides".to_string(), slide_names.len().to_string());
    Ok(text)
}

/// Pull the `<a:t>` text runs out of one slide's XML
fn slide_text_from_xml(xml: &str) -> String {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parts = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::Text(e)) if in_text_run => {
                if let Ok(text) = e.unescape() {
                    let trimmed = text.trim().to_string();
                    if !trimmed.is_empty() {
                        parts.push(trimmed);
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text_run = false,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    parts.join(" ")
}

fn extract_xlsx(
    name: &str,
    data: &[u8],
    metadata: &mut HashMap<String, String>,
) -> Result<String> {
    let cursor = std::io::Cursor::new(data.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::decode(name, e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    metadata.insert("sheets".to_string(), sheet_names.len().to_string());

    let mut text = String::new();
    for sheet_name in sheet_names {
        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            text.push_str(&sheet_name);
            text.push('\n');
            for row in range.rows() {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| match cell {
                        calamine::Data::Empty => String::new(),
                        calamine::Data::String(s) => s.clone(),
                        calamine::Data::Float(f) => f.to_string(),
                        calamine::Data::Int(i) => i.to_string(),
                        calamine::Data::Bool(b) => b.to_string(),
                        calamine::Data::DateTime(dt) => dt.to_string(),
                        _ => String::new(),
                    })
                    .collect();
                if !cells.iter().all(String::is_empty) {
                    text.push_str(&cells.join(" | "));
                    text.push('\n');
                }
            }
        }
    }
    Ok(text)
}

fn extract_html(data: &[u8]) -> String {
    let html = String::from_utf8_lossy(data);
    let document = scraper::Html::parse_document(&html);

    let body_selector = scraper::Selector::parse("body").unwrap();
    let mut text = String::new();
    if let Some(body) = document.select(&body_selector).next() {
        for fragment in body.text() {
            let trimmed = fragment.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }
    }
    text
}

fn extract_csv(data: &[u8]) -> Result<String> {
    let mut reader = csv::Reader::from_reader(data);
    let mut text = String::new();

    if let Ok(headers) = reader.headers() {
        text.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
        text.push('\n');
    }
    for record in reader.records().flatten() {
        text.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
        text.push('\n');
    }
    Ok(text)
}
