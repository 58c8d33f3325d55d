pub mod command;
pub mod raster;

use crate::error::TitleBlockError;
use std::path::Path;
use tracing::{debug, warn};

/// A source-to-PDF conversion backend: a CAD application driven through
/// automation, or the built-in TIFF rasterizer.
pub trait CadConverter {
    /// Name of this converter (for diagnostics and reports).
    fn name(&self) -> &str;

    /// File extensions this converter accepts, lowercase, without the dot.
    fn extensions(&self) -> &[String];

    /// Convert one source file and return the PDF bytes.
    fn convert(&mut self, source: &Path) -> Result<Vec<u8>, TitleBlockError>;

    /// Release whatever the converter started (e.g. quit the CAD application).
    fn shutdown(&mut self) -> Result<(), TitleBlockError> {
        Ok(())
    }
}

/// Scoped ownership of a started converter.
///
/// `shutdown` runs exactly once: on [`ConverterSession::close`], or on drop
/// if the session is abandoned by an early return or a panic.
pub struct ConverterSession {
    converter: Box<dyn CadConverter>,
    open: bool,
}

impl ConverterSession {
    pub fn new(converter: Box<dyn CadConverter>) -> Self {
        debug!(converter = converter.name(), "converter session opened");
        ConverterSession {
            converter,
            open: true,
        }
    }

    pub fn name(&self) -> &str {
        self.converter.name()
    }

    pub fn convert(&mut self, source: &Path) -> Result<Vec<u8>, TitleBlockError> {
        self.converter.convert(source)
    }

    /// Shut the converter down and report the outcome.
    pub fn close(mut self) -> Result<(), TitleBlockError> {
        self.open = false;
        debug!(converter = self.converter.name(), "converter session closed");
        self.converter.shutdown()
    }
}

impl Drop for ConverterSession {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = self.converter.shutdown() {
            warn!(
                converter = self.converter.name(),
                error = %e,
                "converter shutdown failed"
            );
        }
    }
}

/// Run `f` with a session around `converter`; the converter is shut down
/// whether `f` succeeds or fails.
pub fn with_session<T>(
    converter: Box<dyn CadConverter>,
    f: impl FnOnce(&mut ConverterSession) -> Result<T, TitleBlockError>,
) -> Result<T, TitleBlockError> {
    let mut session = ConverterSession::new(converter);
    let result = f(&mut session);
    let closed = session.close();
    let value = result?;
    closed?;
    Ok(value)
}

/// True if `path` has one of `extensions` (case-insensitive, dot optional).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
