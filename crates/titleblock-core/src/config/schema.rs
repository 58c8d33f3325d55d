use crate::model::RegionSpec;
use serde::{Deserialize, Serialize};

/// Top-level tool configuration, read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub region: RegionSpec,
    #[serde(default)]
    pub tiff: TiffSettings,
    /// External CAD converters, tried in order; the first one claiming a
    /// file's extension converts it.
    #[serde(default)]
    pub converters: Vec<ConverterDef>,
}

/// Settings for the built-in TIFF rasterizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiffSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tiff_extensions")]
    pub extensions: Vec<String>,
    /// Resolution assumed when a TIFF carries no resolution tags.
    #[serde(default = "default_dpi")]
    pub default_dpi: f64,
}

impl Default for TiffSettings {
    fn default() -> Self {
        TiffSettings {
            enabled: true,
            extensions: default_tiff_extensions(),
            default_dpi: default_dpi(),
        }
    }
}

/// An external program that turns one CAD file into a PDF.
///
/// `args` may reference `{input}`, `{output}`, `{outdir}` and `{stem}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterDef {
    pub name: String,
    pub extensions: Vec<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// File name the program writes inside `{outdir}`. Default: `{stem}.pdf`.
    #[serde(default)]
    pub output_name: Option<String>,
    /// Run once before the first conversion (e.g. launch the CAD host).
    #[serde(default)]
    pub startup: Option<CommandDef>,
    /// Run once after the last conversion (e.g. quit the CAD host).
    #[serde(default)]
    pub shutdown: Option<CommandDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A named built-in region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionPreset {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub region: RegionSpec,
}

fn default_true() -> bool {
    true
}

fn default_tiff_extensions() -> Vec<String> {
    vec!["tif".into(), "tiff".into()]
}

fn default_dpi() -> f64 {
    72.0
}
