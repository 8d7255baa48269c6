//! Document-level entry points.
//!
//! These wrap the synchronous orchestrator in [`crate::scan`]: validate the
//! input, bind pdfium, open the document and hand its lazily rendered pages
//! to [`scan_pages`]. pdfium and the recognition engine both block, so the
//! async variants run the whole scan inside `tokio::task::spawn_blocking`.

use crate::config::ExtractionConfig;
use crate::engine::TextLocalizer;
use crate::error::SiteScanError;
use crate::output::ExtractionOutput;
use crate::pipeline::input;
use crate::pipeline::render::PdfRasterizer;
use crate::scan::scan_pages;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Extract the site address from a PDF file.
///
/// # Returns
/// `Ok(ExtractionOutput)` whenever the document could be scanned, including
/// when no page produced an address (`output.result` is then empty).
///
/// # Errors
/// Fatal, document-level failures only: unsupported or unreadable input,
/// pdfium unavailable, encrypted or corrupt PDF, a page that cannot be
/// rasterised, or cancellation.
///
/// # Example
/// ```rust,no_run
/// use sitescan::{extract_address, CommandLocalizer, ExtractionConfig};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ocr = Arc::new(CommandLocalizer::new("easyocr-json").args(["--lang", "ja"]));
/// let output = extract_address("drawing.pdf", ocr, &ExtractionConfig::default()).await?;
/// if let (Some(k), Some(a)) = (output.result.keyword(), output.result.address()) {
///     println!("{k}: {a}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_address(
    input_path: impl AsRef<Path>,
    localizer: Arc<dyn TextLocalizer>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SiteScanError> {
    let pdf_path = input::resolve_input(input_path)?;
    let config = config.clone();

    tokio::task::spawn_blocking(move || scan_file(&pdf_path, localizer.as_ref(), &config))
        .await
        .map_err(|e| SiteScanError::Internal(format!("spawn_blocking panicked: {}", e)))?
}

/// Synchronous wrapper around [`extract_address`].
///
/// Does not need a tokio runtime: the scan is blocking work already.
pub fn extract_address_sync(
    input_path: impl AsRef<Path>,
    localizer: &dyn TextLocalizer,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SiteScanError> {
    let pdf_path = input::resolve_input(input_path)?;
    scan_file(&pdf_path, localizer, config)
}

/// Extract the site address from PDF bytes held in memory.
///
/// The bytes are written to a managed temporary file which is removed when
/// this function returns. The document identifier in the output is the
/// temporary path.
pub async fn extract_from_bytes(
    bytes: &[u8],
    localizer: Arc<dyn TextLocalizer>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SiteScanError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("sitescan-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| SiteScanError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SiteScanError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `extract_address` returns
    extract_address(tmp.path(), localizer, config).await
}

/// Extract and write the [`ExtractionOutput`] to `output_path` as JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    localizer: Arc<dyn TextLocalizer>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SiteScanError> {
    let output = extract_address(input_path, localizer, config).await?;
    let path = output_path.as_ref();
    let json = serde_json::to_vec_pretty(&output)
        .map_err(|e| SiteScanError::Internal(format!("serialise output: {e}")))?;
    write_atomic(path, &json).await?;
    Ok(output)
}

/// The PDF's embedded text layer, if any page has one.
///
/// Independent of address extraction: no rasterisation and no recognition
/// engine are involved.
pub async fn extract_text(
    input_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Option<String>, SiteScanError> {
    let pdf_path = input::resolve_input(input_path)?;
    let password = config.password.clone();
    let hint = config.pdfium_library_path.clone();
    let (dpi, max_px) = (config.dpi, config.max_rendered_pixels);

    tokio::task::spawn_blocking(move || {
        let rasterizer = PdfRasterizer::bind(hint.as_deref())?;
        let document = rasterizer.open(&pdf_path, password.as_deref(), dpi, max_px)?;
        document.text_layer()
    })
    .await
    .map_err(|e| SiteScanError::Internal(format!("spawn_blocking panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn scan_file(
    pdf_path: &Path,
    localizer: &dyn TextLocalizer,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SiteScanError> {
    info!("Starting extraction: {}", pdf_path.display());
    let rasterizer = PdfRasterizer::bind(config.pdfium_library_path.as_deref())?;
    let document = rasterizer.open(
        pdf_path,
        config.password.as_deref(),
        config.dpi,
        config.max_rendered_pixels,
    )?;
    scan_pages(
        &pdf_path.display().to_string(),
        document.pages(),
        localizer,
        config,
    )
}

pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SiteScanError> {
    let write_err = |e| SiteScanError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tmp_sibling(path);
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
