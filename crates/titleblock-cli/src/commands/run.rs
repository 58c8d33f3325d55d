use std::path::Path;

use titleblock_core::batch::{plans_from_config, BatchOptions};
use titleblock_core::error::TitleBlockError;
use titleblock_core::extraction::pdftotext::PdftotextTokenizer;

use crate::output;
use crate::{BatchArgs, RegionArgs};

pub fn run(
    dir: &Path,
    region: &RegionArgs,
    batch: &BatchArgs,
    output_format: &str,
) -> Result<(), TitleBlockError> {
    let (config, spec) = super::resolve(region)?;
    let options = BatchOptions::from(batch);
    let tokenizer = PdftotextTokenizer::new();

    let report = titleblock_core::run_directory(
        dir,
        plans_from_config(&config),
        &tokenizer,
        &spec,
        &options,
    )?;

    match output_format {
        "json" => output::json::print(&report)?,
        _ => {
            output::text::print_batch(&report.conversion);
            output::text::print_documents(&report.documents);
            for failure in &report.failures {
                eprintln!(
                    "Failed to read {}: {}",
                    failure.path.display(),
                    failure.reason
                );
            }
        }
    }

    Ok(())
}
