//! Cropping the refined region out of a page image.

use crate::error::PageError;
use crate::geometry::PixelBox;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cut `region` out of `image`.
///
/// A region with zero width or height is reported as
/// [`PageError::EmptyRegion`] rather than producing a 0-pixel image the
/// recognition engine would choke on.
pub fn crop_region(
    image: &DynamicImage,
    region: PixelBox,
    page_num: usize,
) -> Result<DynamicImage, PageError> {
    let region = region.clamp_to(image.width(), image.height());
    if region.is_empty() {
        return Err(PageError::EmptyRegion {
            page: page_num,
            region,
        });
    }
    debug!(
        "Page {}: cropping {} ({}x{} px)",
        page_num,
        region,
        region.width(),
        region.height()
    );
    Ok(image.crop_imm(region.x_min, region.y_min, region.width(), region.height()))
}

/// Write a focused crop to `dir` for later inspection.
///
/// Failures are logged and otherwise ignored: diagnostics never change the
/// outcome of a page.
pub fn save_crop(
    dir: &Path,
    document: &str,
    page_num: usize,
    crop: &DynamicImage,
) -> Option<PathBuf> {
    let path = dir.join(crop_file_name(document, page_num));
    let result = std::fs::create_dir_all(dir)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            crop.save_with_format(&path, image::ImageFormat::Png)
                .map_err(|e| e.to_string())
        });
    match result {
        Ok(()) => {
            debug!("Saved crop to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Could not save crop {}: {}", path.display(), e);
            None
        }
    }
}

fn crop_file_name(document: &str, page_num: usize) -> String {
    let stem = Path::new(document)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{stem}_p{page_num:03}.png")
}
