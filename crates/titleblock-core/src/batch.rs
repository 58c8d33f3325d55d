//! Folder-level conversion: find drawings and scans, convert each with the
//! converter that claims its extension, and write the PDFs.

use crate::config::schema::Config;
use crate::convert::command::CommandConverter;
use crate::convert::raster::TiffConverter;
use crate::convert::{has_extension, with_session, CadConverter, ConverterSession};
use crate::error::TitleBlockError;
use crate::walk::find_files;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Source extensions the batch always looks for, converter or not.
pub const SOURCE_EXTENSIONS: &[&str] = &["slddrw", "dwg", "tif", "tiff"];

type StartFn = Box<dyn FnOnce() -> Result<Box<dyn CadConverter>, TitleBlockError>>;

/// A converter that has not been started yet.
///
/// Starting may launch an external application, so it only happens when the
/// folder actually contains files for it.
pub struct ConverterPlan {
    pub name: String,
    pub extensions: Vec<String>,
    start: StartFn,
}

impl ConverterPlan {
    pub fn new(
        name: impl Into<String>,
        extensions: Vec<String>,
        start: impl FnOnce() -> Result<Box<dyn CadConverter>, TitleBlockError> + 'static,
    ) -> Self {
        ConverterPlan {
            name: name.into(),
            extensions,
            start: Box::new(start),
        }
    }
}

/// Converter plans for `config`: the external converters in order, then the
/// built-in TIFF rasterizer if enabled.
pub fn plans_from_config(config: &Config) -> Vec<ConverterPlan> {
    let mut plans: Vec<ConverterPlan> = config
        .converters
        .iter()
        .cloned()
        .map(|def| {
            let name = def.name.clone();
            let extensions = def.extensions.clone();
            ConverterPlan::new(name, extensions, move || {
                Ok(Box::new(CommandConverter::start(def)?) as Box<dyn CadConverter>)
            })
        })
        .collect();

    if config.tiff.enabled {
        let settings = config.tiff.clone();
        plans.push(ConverterPlan::new(
            "tiff",
            settings.extensions.clone(),
            move || Ok(Box::new(TiffConverter::new(&settings)) as Box<dyn CadConverter>),
        ));
    }

    plans
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub recursive: bool,
    /// Write PDFs here instead of next to each source file.
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionStatus {
    Converted { output: PathBuf },
    Failed { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    #[serde(default)]
    pub converter: Option<String>,
    #[serde(flatten)]
    pub status: ConversionStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<ConversionOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Converted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&ConversionStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Where the PDF for `source` (found under `root`) is written.
///
/// With an output folder, the source's path below `root` is kept, so
/// same-named drawings from different subfolders do not collide.
pub fn output_path(source: &Path, root: &Path, out_dir: Option<&Path>) -> PathBuf {
    let Some(out) = out_dir else {
        return source.with_extension("pdf");
    };
    let relative = match source.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) => source.file_name().map(Path::new).unwrap_or(source),
    };
    out.join(relative).with_extension("pdf")
}

/// Convert every recognised source file in `dir`.
///
/// A file that fails to convert is recorded and the batch moves on. Each
/// converter is started at most once and shut down before the next one
/// starts.
pub fn convert_directory(
    dir: &Path,
    plans: Vec<ConverterPlan>,
    options: &BatchOptions,
) -> Result<BatchReport, TitleBlockError> {
    let mut extensions: Vec<String> = SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect();
    for plan in &plans {
        extensions.extend(plan.extensions.iter().cloned());
    }
    let mut pending = find_files(dir, &extensions, options.recursive)?;
    info!(dir = %dir.display(), files = pending.len(), "found source files");

    if let Some(ref out) = options.out_dir {
        std::fs::create_dir_all(out)?;
    }

    let mut report = BatchReport::default();
    // output -> source, for every PDF this batch has claimed
    let mut written: HashMap<PathBuf, PathBuf> = HashMap::new();

    for plan in plans {
        let (mine, rest): (Vec<PathBuf>, Vec<PathBuf>) = pending
            .into_iter()
            .partition(|p| has_extension(p, &plan.extensions));
        pending = rest;
        if mine.is_empty() {
            continue;
        }

        let converter = match (plan.start)() {
            Ok(c) => c,
            Err(e) => {
                warn!(converter = %plan.name, error = %e, "converter failed to start");
                for source in mine {
                    report.outcomes.push(ConversionOutcome {
                        source,
                        converter: Some(plan.name.clone()),
                        status: ConversionStatus::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
                continue;
            }
        };

        let closed = with_session(converter, |session| {
            for source in mine {
                let output = output_path(&source, dir, options.out_dir.as_deref());
                let status = match written.get(&output) {
                    Some(first) => {
                        warn!(
                            source = %source.display(),
                            output = %output.display(),
                            "output already written in this batch"
                        );
                        ConversionStatus::Failed {
                            reason: format!(
                                "output {} already written by {}",
                                output.display(),
                                first.display()
                            ),
                        }
                    }
                    None => {
                        let status = convert_one(session, &source, &output);
                        if matches!(status, ConversionStatus::Converted { .. }) {
                            written.insert(output, source.clone());
                        }
                        status
                    }
                };
                report.outcomes.push(ConversionOutcome {
                    source,
                    converter: Some(plan.name.clone()),
                    status,
                });
            }
            Ok(())
        });
        // Per-file errors are recorded above; only shutdown can fail here.
        if let Err(e) = closed {
            warn!(converter = %plan.name, error = %e, "converter shutdown failed");
            report
                .warnings
                .push(format!("converter '{}' shutdown failed: {}", plan.name, e));
        }
    }

    for source in pending {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        warn!(source = %source.display(), "no converter configured, skipping");
        report.outcomes.push(ConversionOutcome {
            source,
            converter: None,
            status: ConversionStatus::Skipped {
                reason: format!("no converter configured for .{ext} files"),
            },
        });
    }

    Ok(report)
}

fn convert_one(session: &mut ConverterSession, source: &Path, output: &Path) -> ConversionStatus {
    let result = session.convert(source).and_then(|bytes| {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, bytes)?;
        Ok(output.to_path_buf())
    });
    match result {
        Ok(output) => {
            info!(
                source = %source.display(),
                output = %output.display(),
                converter = session.name(),
                "converted"
            );
            ConversionStatus::Converted { output }
        }
        Err(e) => {
            warn!(source = %source.display(), error = %e, "conversion failed");
            ConversionStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_extension() {
        let root = Path::new("/d");
        assert_eq!(
            output_path(Path::new("/d/part.SLDDRW"), root, None),
            PathBuf::from("/d/part.pdf")
        );
        assert_eq!(
            output_path(Path::new("/d/scan.tif"), root, Some(Path::new("/out"))),
            PathBuf::from("/out/scan.pdf")
        );
    }

    #[test]
    fn test_output_path_keeps_subfolders_under_out_dir() {
        let root = Path::new("/d");
        let out = Some(Path::new("/out"));
        assert_eq!(
            output_path(Path::new("/d/site-a/sheet1.slddrw"), root, out),
            PathBuf::from("/out/site-a/sheet1.pdf")
        );
        assert_eq!(
            output_path(Path::new("/d/site-b/sheet1.slddrw"), root, out),
            PathBuf::from("/out/site-b/sheet1.pdf")
        );
        // Subfolder sources still land next to themselves without an out dir.
        assert_eq!(
            output_path(Path::new("/d/site-a/sheet1.slddrw"), root, None),
            PathBuf::from("/d/site-a/sheet1.pdf")
        );
    }

    #[test]
    fn test_plans_from_default_config() {
        let plans = plans_from_config(&Config::default());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].name, "tiff");
    }

    #[test]
    fn test_report_serializes_flat_status() {
        let report = BatchReport {
            outcomes: vec![ConversionOutcome {
                source: PathBuf::from("a.dwg"),
                converter: None,
                status: ConversionStatus::Skipped {
                    reason: "none".into(),
                },
            }],
            warnings: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["status"], "skipped");
        assert_eq!(json["outcomes"][0]["reason"], "none");
        assert!(json.get("warnings").is_none());
    }
}
