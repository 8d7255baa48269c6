//! Input resolution: make sure the user-supplied path is a readable PDF.
//!
//! pdfium produces confusing errors for non-PDF input, so we check the
//! extension and the `%PDF` magic bytes up front and report
//! [`SiteScanError::UnsupportedInput`] before any rasterisation starts.

use crate::error::SiteScanError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate `path` and return it as an owned `PathBuf`.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, SiteScanError> {
    let path = path.as_ref().to_path_buf();

    if !has_pdf_extension(&path) {
        return Err(SiteScanError::UnsupportedInput {
            path,
            reason: "expected a .pdf file".into(),
        });
    }

    if !path.exists() {
        return Err(SiteScanError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() {
                return Err(SiteScanError::UnsupportedInput {
                    path,
                    reason: "file is shorter than a PDF header".into(),
                });
            }
            if &magic != b"%PDF" {
                return Err(SiteScanError::UnsupportedInput {
                    path,
                    reason: format!("missing %PDF header, first bytes: {magic:?}"),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SiteScanError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(SiteScanError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Case-insensitive `.pdf` extension check.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
