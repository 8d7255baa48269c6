//! Text localization engine seam.
//!
//! The recognition model itself is not part of this crate. Anything that can
//! turn an image into `(polygon, text)` pairs plugs in through
//! [`TextLocalizer`]. Results must come back in a stable reading order: the
//! anchor search takes the first match in that order.
//!
//! [`CommandLocalizer`] is the stock adapter. It hands each image to an
//! external program (an EasyOCR or PaddleOCR wrapper script, for instance)
//! and reads the program's JSON output.

use crate::error::RecognitionError;
use crate::geometry::Point;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::process::Command;
use tracing::debug;

/// One detected text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Region outline in the scanned image's pixel space. Usually four
    /// points; other cardinalities are allowed but carry no usable geometry.
    pub polygon: Vec<Point>,
    /// Recognised text.
    pub text: String,
    /// Engine confidence in `0.0..=1.0`, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RecognitionResult {
    pub fn new(polygon: Vec<Point>, text: impl Into<String>) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence: None,
        }
    }

    /// Convenience for an axis-aligned rectangle given as two corners.
    pub fn rect(x_min: f64, y_min: f64, x_max: f64, y_max: f64, text: impl Into<String>) -> Self {
        Self::new(
            vec![
                Point::new(x_min, y_min),
                Point::new(x_max, y_min),
                Point::new(x_max, y_max),
                Point::new(x_min, y_max),
            ],
            text,
        )
    }
}

/// A text localization engine.
///
/// Calls are synchronous and may take arbitrarily long. Implementations must
/// be `Send + Sync` because the async entry points drive them from a
/// blocking-pool thread.
pub trait TextLocalizer: Send + Sync {
    /// Detect and recognise every text region in `image`, in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognitionResult>, RecognitionError>;

    /// Short engine name for logs.
    fn name(&self) -> &str {
        "text-localizer"
    }
}

// ── External command adapter ─────────────────────────────────────────────

/// Runs an external OCR program once per image.
///
/// The program is invoked as `<program> <args>... <image.png>` and must print
/// a JSON array on stdout. Each element is either an object
///
/// ```json
/// {"polygon": [[10, 20], [90, 20], [90, 40], [10, 40]], "text": "建築地", "confidence": 0.93}
/// ```
///
/// or an EasyOCR `readtext(detail=1)` tuple
///
/// ```json
/// [[[10, 20], [90, 20], [90, 40], [10, 40]], "建築地", 0.93]
/// ```
#[derive(Debug, Clone)]
pub struct CommandLocalizer {
    program: OsString,
    args: Vec<OsString>,
    name: String,
}

impl CommandLocalizer {
    pub fn new(program: impl Into<OsString>) -> Self {
        let program = program.into();
        let name = format!("command:{}", program.to_string_lossy());
        Self {
            program,
            args: Vec::new(),
            name,
        }
    }

    /// Append arguments placed before the image path.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl TextLocalizer for CommandLocalizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognitionResult>, RecognitionError> {
        let tmp = tempfile::Builder::new()
            .prefix("sitescan-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(tmp.path(), image::ImageFormat::Png)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(tmp.path())
            .output()
            .map_err(|e| {
                RecognitionError::Unavailable(format!(
                    "failed to run {}: {e}",
                    self.program.to_string_lossy()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Engine(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let results = parse_command_output(&stdout)?;
        debug!(
            "{} recognised {} regions in {}x{} image",
            self.name,
            results.len(),
            image.width(),
            image.height()
        );
        Ok(results)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireResult {
    Object {
        polygon: Vec<[f64; 2]>,
        text: String,
        #[serde(default)]
        confidence: Option<f32>,
    },
    Triple(Vec<[f64; 2]>, String, Option<f32>),
    Pair(Vec<[f64; 2]>, String),
}

impl From<WireResult> for RecognitionResult {
    fn from(w: WireResult) -> Self {
        let (points, text, confidence) = match w {
            WireResult::Object {
                polygon,
                text,
                confidence,
            } => (polygon, text, confidence),
            WireResult::Triple(polygon, text, confidence) => (polygon, text, confidence),
            WireResult::Pair(polygon, text) => (polygon, text, None),
        };
        RecognitionResult {
            polygon: points.into_iter().map(|[x, y]| Point::new(x, y)).collect(),
            text,
            confidence,
        }
    }
}

/// Parse the JSON emitted by an OCR command.
pub fn parse_command_output(stdout: &str) -> Result<Vec<RecognitionResult>, RecognitionError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let wire: Vec<WireResult> =
        serde_json::from_str(trimmed).map_err(|e| RecognitionError::Malformed(e.to_string()))?;
    Ok(wire.into_iter().map(RecognitionResult::from).collect())
}
