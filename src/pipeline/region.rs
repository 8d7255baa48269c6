//! Region refinement: turn an anchor box into the crop for the focused pass.
//!
//! The order of operations is fixed:
//!
//! 1. add the matched keyword's offsets (zero if it has none)
//! 2. clamp to the image
//! 3. truncate to integer pixels and clamp again
//! 4. grow by the margin on every side and clamp a third time
//!
//! Each clamp keeps `min <= max`, so the result is a valid (possibly empty)
//! box for any offsets, including ones larger than the page.

use crate::config::KeywordProfile;
use crate::geometry::PixelBox;
use crate::pipeline::anchor::AnchorBox;

/// Compute the refined crop region for `anchor` on a `width × height` image.
pub fn refine_region(
    anchor: &AnchorBox,
    profile: &KeywordProfile,
    width: u32,
    height: u32,
    margin: u32,
) -> PixelBox {
    let offsets = profile.offsets_for(&anchor.matched_keyword);
    anchor
        .rect
        .offset(offsets)
        .clamp_to(width, height)
        .to_pixels(width, height)
        .expand(margin, width, height)
}
