//! Error types for the sitescan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SiteScanError`] — **Fatal**: the document cannot be scanned at all
//!   (missing file, not a PDF, pdfium unavailable, page rasterisation broke).
//!   Returned as `Err(SiteScanError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (the recognition
//!   engine errored, the refined region collapsed to nothing) but the scan
//!   moves on to the next page. Stored inside
//!   [`crate::output::PageReport`] so callers can see why a page was skipped.
//!
//! "No address found" is neither: it is a normal terminal state with an
//! empty [`crate::output::ExtractionResult`].

use crate::geometry::PixelBox;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sitescan library.
#[derive(Debug, Error)]
pub enum SiteScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is not a document type we can scan.
    #[error("Not a supported file: '{path}' ({reason})")]
    UnsupportedInput { path: PathBuf, reason: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterizationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Point sitescan at an existing copy with --pdfium-lib <DIR> or\n\
PDFIUM_LIB_PATH=/path/to/dir, or install libpdfium system-wide.\n"
    )]
    RasterizerUnavailable(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A keyword profile file could not be read or parsed.
    #[error("Failed to load keyword profile '{path}': {detail}")]
    ProfileLoadFailed { path: PathBuf, detail: String },

    // ── Control flow ──────────────────────────────────────────────────────
    /// The cancel flag was raised between two pages.
    #[error("Scan cancelled after {scanned_pages} page(s)")]
    Cancelled { scanned_pages: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which recognition pass a [`PageError::RecognitionFailed`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStage {
    /// The full-page pass used to find the anchor keyword.
    FullPage,
    /// The focused pass over the cropped region.
    Focused,
}

impl std::fmt::Display for RecognitionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionStage::FullPage => f.write_str("full-page"),
            RecognitionStage::Focused => f.write_str("focused"),
        }
    }
}

/// A non-fatal error for a single page.
///
/// The scan always continues with the next page after one of these.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The text localization engine failed on this page's image.
    #[error("Page {page}: {stage} recognition failed: {detail}")]
    RecognitionFailed {
        page: usize,
        stage: RecognitionStage,
        detail: String,
    },

    /// The refined region has zero width or height.
    #[error("Page {page}: refined region {region} is empty")]
    EmptyRegion { page: usize, region: PixelBox },
}

/// Error reported by a [`crate::engine::TextLocalizer`] implementation.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The engine could not be started or reached.
    #[error("recognition engine unavailable: {0}")]
    Unavailable(String),

    /// The engine ran but reported a failure.
    #[error("recognition engine failed: {0}")]
    Engine(String),

    /// The engine's output could not be understood.
    #[error("unreadable recognition output: {0}")]
    Malformed(String),

    /// Preparing the image for the engine failed.
    #[error("could not prepare image for recognition: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
