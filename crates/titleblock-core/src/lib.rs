pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod extraction;
pub mod model;
pub mod region;
pub mod walk;

use batch::{BatchOptions, BatchReport, ConverterPlan};
use error::TitleBlockError;
use extraction::PdfTokenizer;
use model::{DocumentRegions, PageRegion, RegionSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Main API entry point: tokenize a PDF and keep the words inside the
/// configured region of every page.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    tokenizer: &dyn PdfTokenizer,
    spec: &RegionSpec,
) -> Result<Vec<PageRegion>, TitleBlockError> {
    let pages = tokenizer.extract_pages(pdf_bytes)?;

    let mut out = Vec::with_capacity(pages.len());
    for page in &pages {
        let (region, tokens) = region::extract_region(page, spec)?;
        debug!(
            page = page.page_number,
            total = page.tokens.len(),
            kept = tokens.len(),
            "region extracted"
        );
        out.push(PageRegion {
            page_number: page.page_number,
            width: page.width,
            height: page.height,
            region,
            tokens,
        });
    }
    Ok(out)
}

/// [`extract_pdf`] for a file on disk.
pub fn extract_file(
    path: &Path,
    tokenizer: &dyn PdfTokenizer,
    spec: &RegionSpec,
) -> Result<DocumentRegions, TitleBlockError> {
    let pdf_bytes = std::fs::read(path)?;
    let pages = extract_pdf(&pdf_bytes, tokenizer, spec)?;
    Ok(DocumentRegions {
        path: path.display().to_string(),
        spec: *spec,
        pages,
    })
}

/// A PDF the extraction step could not read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of converting a folder and then reading every PDF in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub conversion: BatchReport,
    pub documents: Vec<DocumentRegions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ExtractionFailure>,
}

/// Convert the folder, then extract region text from every PDF in the
/// output folder (including PDFs that were there before).
pub fn run_directory(
    dir: &Path,
    plans: Vec<ConverterPlan>,
    tokenizer: &dyn PdfTokenizer,
    spec: &RegionSpec,
    options: &BatchOptions,
) -> Result<RunReport, TitleBlockError> {
    let conversion = batch::convert_directory(dir, plans, options)?;

    let pdf_dir = options.out_dir.as_deref().unwrap_or(dir);
    let pdfs = walk::find_files(pdf_dir, &["pdf".to_string()], options.recursive)?;

    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for path in pdfs {
        match extract_file(&path, tokenizer, spec) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "extraction failed");
                failures.push(ExtractionFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(RunReport {
        conversion,
        documents,
        failures,
    })
}
