use std::path::Path;

use titleblock_core::batch::{convert_directory, plans_from_config, BatchOptions};
use titleblock_core::error::TitleBlockError;

use crate::output;
use crate::BatchArgs;

pub fn run(
    dir: &Path,
    config_file: Option<&Path>,
    batch: &BatchArgs,
    output_format: &str,
) -> Result<(), TitleBlockError> {
    let config = super::load_or_default(config_file)?;
    let options = BatchOptions::from(batch);
    let report = convert_directory(dir, plans_from_config(&config), &options)?;

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::text::print_batch(&report),
    }

    if report.failed() > 0 {
        eprintln!(
            "{} converted, {} failed, {} skipped",
            report.converted(),
            report.failed(),
            report.skipped()
        );
    }

    Ok(())
}
