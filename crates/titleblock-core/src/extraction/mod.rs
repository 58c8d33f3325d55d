pub mod pdftotext;

use crate::error::TitleBlockError;
use crate::model::Page;

/// Trait for PDF tokenization backends.
pub trait PdfTokenizer: Send + Sync {
    /// Split PDF bytes into pages of word tokens, in page order.
    ///
    /// Token boxes must use PDF page space: origin bottom-left, y up.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<Page>, TitleBlockError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
