use titleblock_core::batch::{BatchReport, ConversionStatus};
use titleblock_core::model::DocumentRegions;

/// One header line per page followed by one token per line.
pub fn format_documents(documents: &[DocumentRegions]) -> String {
    let mut out = String::new();
    for doc in documents {
        for page in &doc.pages {
            if doc.pages.len() > 1 {
                out.push_str(&format!(
                    "Extracted text from {} (page {}):\n",
                    doc.path, page.page_number
                ));
            } else {
                out.push_str(&format!("Extracted text from {}:\n", doc.path));
            }
            for token in &page.tokens {
                out.push_str(&token.text);
                out.push('\n');
            }
        }
    }
    out
}

pub fn print_documents(documents: &[DocumentRegions]) {
    print!("{}", format_documents(documents));
}

pub fn format_batch(report: &BatchReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            ConversionStatus::Converted { output } => format!(
                "Successfully converted {} to {}",
                outcome.source.display(),
                output.display()
            ),
            ConversionStatus::Failed { reason } => {
                format!("Failed to convert {}: {}", outcome.source.display(), reason)
            }
            ConversionStatus::Skipped { reason } => {
                format!("Skipped {}: {}", outcome.source.display(), reason)
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    for w in &report.warnings {
        out.push_str(&format!("warning: {w}\n"));
    }
    out
}

pub fn print_batch(report: &BatchReport) {
    print!("{}", format_batch(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use titleblock_core::batch::ConversionOutcome;
    use titleblock_core::model::{PageRegion, Rect, RegionSpec, Token};

    fn page(number: usize, words: &[&str]) -> PageRegion {
        PageRegion {
            page_number: number,
            width: 600.0,
            height: 800.0,
            region: Rect::new(300.0, 0.0, 600.0, 300.0),
            tokens: words
                .iter()
                .map(|w| Token::new(*w, Rect::new(400.0, 10.0, 450.0, 20.0)))
                .collect(),
        }
    }

    #[test]
    fn test_single_page_document_lists_one_token_per_line() {
        let doc = DocumentRegions {
            path: "a.pdf".into(),
            spec: RegionSpec::default(),
            pages: vec![page(1, &["DWG-001", "REV", "B"])],
        };
        assert_eq!(
            format_documents(&[doc]),
            "Extracted text from a.pdf:\nDWG-001\nREV\nB\n"
        );
    }

    #[test]
    fn test_multi_page_document_numbers_pages() {
        let doc = DocumentRegions {
            path: "b.pdf".into(),
            spec: RegionSpec::default(),
            pages: vec![page(1, &["X"]), page(2, &[])],
        };
        let text = format_documents(&[doc]);
        assert!(text.contains("Extracted text from b.pdf (page 1):\nX\n"));
        assert!(text.ends_with("Extracted text from b.pdf (page 2):\n"));
    }

    #[test]
    fn test_batch_lines() {
        let report = BatchReport {
            outcomes: vec![
                ConversionOutcome {
                    source: PathBuf::from("a.tif"),
                    converter: Some("tiff".into()),
                    status: ConversionStatus::Converted {
                        output: PathBuf::from("a.pdf"),
                    },
                },
                ConversionOutcome {
                    source: PathBuf::from("b.dwg"),
                    converter: None,
                    status: ConversionStatus::Skipped {
                        reason: "no converter configured for .dwg files".into(),
                    },
                },
            ],
            warnings: vec![],
        };
        assert_eq!(
            format_batch(&report),
            "Successfully converted a.tif to a.pdf\nSkipped b.dwg: no converter configured for .dwg files\n"
        );
    }
}
