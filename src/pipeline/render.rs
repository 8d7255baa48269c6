//! PDF rasterisation via pdfium.
//!
//! Pages are rendered lazily, one at a time, as the orchestrator asks for
//! them. The scan stops at the first page that yields an address, so pages
//! after that one are never rasterised at all.
//!
//! ## Threading
//!
//! pdfium is not async-safe. Everything here is blocking; the async entry
//! points in [`crate::extract`] run it inside `tokio::task::spawn_blocking`.
//!
//! ## Locating the pdfium library
//!
//! First match wins:
//!
//! 1. the explicit hint (`--pdfium-lib` / `ExtractionConfig::pdfium_library_path`),
//!    either the library file or the directory holding it
//! 2. `PDFIUM_LIB_PATH`
//! 3. the current directory
//! 4. the system library search path

use crate::error::SiteScanError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A bound pdfium library.
pub struct PdfRasterizer {
    pdfium: Pdfium,
}

impl PdfRasterizer {
    /// Bind pdfium, honouring an optional library location hint.
    pub fn bind(hint: Option<&Path>) -> Result<Self, SiteScanError> {
        let env_hint = std::env::var_os("PDFIUM_LIB_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let bindings = match hint.map(Path::to_path_buf).or(env_hint) {
            Some(location) => Pdfium::bind_to_library(library_file(&location)),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| SiteScanError::RasterizerUnavailable(format!("{e:?}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Open a PDF for rendering at `dpi`, capping either edge at `max_pixels`.
    pub fn open<'s>(
        &'s self,
        pdf_path: &Path,
        password: Option<&'s str>,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<RasterDocument<'s>, SiteScanError> {
        let document = self
            .pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        SiteScanError::WrongPassword {
                            path: pdf_path.to_path_buf(),
                        }
                    } else {
                        SiteScanError::PasswordRequired {
                            path: pdf_path.to_path_buf(),
                        }
                    }
                } else {
                    SiteScanError::CorruptPdf {
                        path: pdf_path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })?;

        let page_count = document.pages().len() as usize;
        info!("PDF loaded: {} ({} pages)", pdf_path.display(), page_count);

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / 72.0)
            .set_maximum_width(pixel_limit(max_pixels))
            .set_maximum_height(pixel_limit(max_pixels));

        Ok(RasterDocument {
            document,
            page_count,
            render_config,
        })
    }
}

fn pixel_limit(max_pixels: u32) -> i32 {
    i32::try_from(max_pixels).unwrap_or(i32::MAX)
}

fn library_file(location: &Path) -> PathBuf {
    if location.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(location)
    } else {
        location.to_path_buf()
    }
}

/// An open PDF whose pages can be rendered on demand.
pub struct RasterDocument<'a> {
    document: PdfDocument<'a>,
    page_count: usize,
    render_config: PdfRenderConfig,
}

impl<'a> RasterDocument<'a> {
    /// Render one page (0-based index).
    pub fn render_page(&self, idx: usize) -> Result<DynamicImage, SiteScanError> {
        let page = self
            .document
            .pages()
            .get(idx as u16)
            .map_err(|e| SiteScanError::RasterizationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&self.render_config)
            .map_err(|e| SiteScanError::RasterizationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    /// Lazily render every page in order.
    pub fn pages<'b>(&'b self) -> impl Iterator<Item = Result<DynamicImage, SiteScanError>> + 'b + use<'b, 'a>
    where
        'a: 'b,
    {
        (0..self.page_count).map(move |idx| self.render_page(idx))
    }

    /// The document's embedded text layer, pages joined with newlines.
    ///
    /// Pages without text are skipped. Returns `None` when no page has any,
    /// which is the normal case for scanned drawings.
    pub fn text_layer(&self) -> Result<Option<String>, SiteScanError> {
        let mut parts = Vec::new();
        for (idx, page) in self.document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| SiteScanError::RasterizationFailed {
                    page: idx + 1,
                    detail: format!("text extraction: {:?}", e),
                })?
                .all();
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }
        Ok(join_text_pages(parts))
    }
}

fn join_text_pages(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
