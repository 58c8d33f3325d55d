use crate::error::TitleBlockError;
use crate::extraction::PdfTokenizer;
use crate::model::{Page, Rect, Token};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// PDF tokenizer using `pdftotext -bbox` (from poppler-utils).
///
/// poppler reports word boxes with a top-left origin; they are flipped into
/// PDF page space here.
pub struct PdftotextTokenizer;

impl PdftotextTokenizer {
    pub fn new() -> Self {
        PdftotextTokenizer
    }
}

impl Default for PdftotextTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfTokenizer for PdftotextTokenizer {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<Page>, TitleBlockError> {
        let mut tmpfile = tempfile::NamedTempFile::new()
            .map_err(|e| TitleBlockError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| TitleBlockError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TitleBlockError::PdftotextNotFound
                } else {
                    TitleBlockError::Extraction(format!("pdftotext -bbox failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(TitleBlockError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_xml(&xml)?;
        debug!(pages = pages.len(), "pdftotext tokenized document");
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Word box as poppler reports it (top-left origin).
#[derive(Debug, Clone)]
struct RawWord {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

fn parse_bbox_xml(xml: &str) -> Result<Vec<Page>, TitleBlockError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<Page> = Vec::new();
    let mut current_word: Option<RawWord> = None;
    let mut word_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => pages.push(page_from_tag(&e, pages.len() + 1)),
                b"word" => {
                    current_word = word_from_tag(&e);
                    word_text.clear();
                }
                _ => {}
            },
            // An empty page element carries no words.
            Ok(Event::Empty(e)) if e.name().as_ref() == b"page" => {
                pages.push(page_from_tag(&e, pages.len() + 1));
            }
            Ok(Event::Text(e)) if current_word.is_some() => {
                let text = e.unescape().unwrap_or_default();
                word_text.push_str(&text);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"word" => {
                if let (Some(raw), Some(page)) = (current_word.take(), pages.last_mut()) {
                    let text = word_text.trim();
                    if !text.is_empty() {
                        page.tokens.push(Token::new(text, flip(&raw, page.height)));
                    }
                }
                word_text.clear();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(TitleBlockError::Extraction(format!(
                    "malformed pdftotext output at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    Ok(pages)
}

fn page_from_tag(tag: &BytesStart<'_>, page_number: usize) -> Page {
    Page {
        page_number,
        width: parse_attr_f64(tag, "width").unwrap_or(0.0),
        height: parse_attr_f64(tag, "height").unwrap_or(0.0),
        tokens: Vec::new(),
    }
}

fn word_from_tag(tag: &BytesStart<'_>) -> Option<RawWord> {
    Some(RawWord {
        x_min: parse_attr_f64(tag, "xMin")?,
        y_min: parse_attr_f64(tag, "yMin")?,
        x_max: parse_attr_f64(tag, "xMax")?,
        y_max: parse_attr_f64(tag, "yMax")?,
    })
}

fn parse_attr_f64(tag: &BytesStart<'_>, name: &str) -> Option<f64> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok()?.trim().parse().ok())
}

/// Convert a top-left-origin box into bottom-left-origin page space.
fn flip(raw: &RawWord, page_height: f64) -> Rect {
    Rect::new(
        raw.x_min,
        page_height - raw.y_max,
        raw.x_max,
        page_height - raw.y_min,
    )
}
