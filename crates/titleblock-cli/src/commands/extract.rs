use std::path::PathBuf;

use titleblock_core::error::TitleBlockError;
use titleblock_core::extraction::pdftotext::PdftotextTokenizer;

use crate::output;
use crate::RegionArgs;

pub fn run(
    pdf_files: &[PathBuf],
    region: &RegionArgs,
    output_format: &str,
) -> Result<(), TitleBlockError> {
    let (_, spec) = super::resolve(region)?;
    let tokenizer = PdftotextTokenizer::new();

    let mut documents = Vec::with_capacity(pdf_files.len());
    for path in pdf_files {
        documents.push(titleblock_core::extract_file(path, &tokenizer, &spec)?);
    }

    match output_format {
        "json" => output::json::print(&documents)?,
        _ => output::text::print_documents(&documents),
    }

    Ok(())
}
