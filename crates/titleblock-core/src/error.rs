use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TitleBlockError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("converter program '{program}' not found on PATH")]
    ConverterNotFound { program: String },

    #[error("failed to convert {source_path}: {reason}")]
    ConversionFailed { source_path: PathBuf, reason: String },

    #[error("converter '{name}' {stage} command failed: {reason}")]
    ConverterCommand {
        name: String,
        stage: &'static str,
        reason: String,
    },

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("TIFF decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
