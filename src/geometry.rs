//! Axis-aligned box arithmetic shared by the anchor, region and crop stages.
//!
//! Recognition engines report text regions as polygons in the coordinate
//! space of the image they scanned. The pipeline reduces those to
//! axis-aligned boxes ([`Rect`], floating point) and finally to integer pixel
//! boxes ([`PixelBox`]) that can be handed to the cropper.
//!
//! Every clamping helper here keeps `min <= max` on both axes, whatever the
//! input. Keyword offsets are free-form configuration and may be negative or
//! far larger than the page, so the invariant has to hold for any input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A polygon vertex in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Per-keyword adjustment added to an anchor box, in pixels.
///
/// `left`/`top` are added to the minimum edges and `right`/`bottom` to the
/// maximum edges, so `(-50, -20, 3300, 35)` grows the box 50 px to the left,
/// 20 px up, 3300 px to the right and 35 px down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxOffsets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoxOffsets {
    pub const ZERO: BoxOffsets = BoxOffsets {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl From<(i32, i32, i32, i32)> for BoxOffsets {
    fn from((left, top, right, bottom): (i32, i32, i32, i32)) -> Self {
        Self::new(left, top, right, bottom)
    }
}

/// Floating-point axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Bounding rectangle of a quadrilateral.
    ///
    /// Returns `None` unless the polygon has exactly four vertices; anything
    /// else is treated as a text match without usable geometry.
    pub fn from_quad(points: &[Point]) -> Option<Self> {
        if points.len() != 4 {
            return None;
        }
        let (mut x_min, mut y_min) = (f64::INFINITY, f64::INFINITY);
        let (mut x_max, mut y_max) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            x_min = x_min.min(p.x);
            y_min = y_min.min(p.y);
            x_max = x_max.max(p.x);
            y_max = y_max.max(p.y);
        }
        Some(Self::new(x_min, y_min, x_max, y_max))
    }

    /// Add per-edge offsets without any clamping.
    pub fn offset(self, offsets: BoxOffsets) -> Self {
        Self {
            x_min: self.x_min + f64::from(offsets.left),
            y_min: self.y_min + f64::from(offsets.top),
            x_max: self.x_max + f64::from(offsets.right),
            y_max: self.y_max + f64::from(offsets.bottom),
        }
    }

    /// Clamp every edge into `[0, width] × [0, height]`.
    ///
    /// If an offset pushed a max edge below its min edge, the max edge is
    /// pulled up to the min edge, leaving a degenerate (zero-area) box.
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        let x_min = clamp_f64(self.x_min, w);
        let y_min = clamp_f64(self.y_min, h);
        let x_max = clamp_f64(self.x_max, w).max(x_min);
        let y_max = clamp_f64(self.y_max, h).max(y_min);
        Self::new(x_min, y_min, x_max, y_max)
    }

    /// Truncate to integer pixels and clamp again.
    pub fn to_pixels(self, width: u32, height: u32) -> PixelBox {
        PixelBox {
            x_min: self.x_min as u32,
            y_min: self.y_min as u32,
            x_max: self.x_max as u32,
            y_max: self.y_max as u32,
        }
        .clamp_to(width, height)
    }
}

// NaN collapses to 0.
fn clamp_f64(v: f64, upper: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, upper)
    }
}

/// Integer pixel box, half-open on the max edges (`x_max` is one past the
/// last column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl PixelBox {
    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    /// True when the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let x_min = self.x_min.min(width);
        let y_min = self.y_min.min(height);
        Self {
            x_min,
            y_min,
            x_max: self.x_max.min(width).max(x_min),
            y_max: self.y_max.min(height).max(y_min),
        }
    }

    /// Grow by `margin` on all four sides, then clamp to the image.
    pub fn expand(self, margin: u32, width: u32, height: u32) -> Self {
        Self {
            x_min: self.x_min.saturating_sub(margin),
            y_min: self.y_min.saturating_sub(margin),
            x_max: self.x_max.saturating_add(margin),
            y_max: self.y_max.saturating_add(margin),
        }
        .clamp_to(width, height)
    }
}

impl fmt::Display for PixelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}
