//! Configuration types for site-address extraction.
//!
//! All scan behaviour is controlled through [`ExtractionConfig`], built via
//! its [`ExtractionConfigBuilder`]. The anchor keywords and their box
//! offsets live in a separate [`KeywordProfile`] value so the same profile
//! can be shared (behind an `Arc`) by every document in a batch.
//!
//! A built config is never mutated by the pipeline: scanning a document is a
//! pure function of (document, configuration, recognition engine).

use crate::error::SiteScanError;
use crate::geometry::BoxOffsets;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Pixels added on every side of the offset-adjusted anchor box.
pub const DEFAULT_MARGIN: u32 = 100;

/// Fragments must be strictly longer than this many characters to count as
/// address candidates.
pub const DEFAULT_MIN_CANDIDATE_LEN: usize = 3;

/// Default rasterisation resolution. Offsets in the default profile are
/// tuned for pages rendered at this DPI.
pub const DEFAULT_DPI: u32 = 600;

/// Configuration for extracting the site address from a document.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use sitescan::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(300)
///     .margin(80)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–1200. Default: 600.
    ///
    /// The keyword offsets are expressed in pixels, so changing the DPI
    /// without rescaling the profile moves the focused region.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 16000.
    ///
    /// A 600-DPI render of an A1 drawing is roughly 14 000 × 19 800 px; the
    /// cap keeps pdfium from allocating unbounded bitmaps for oversized sheets.
    pub max_rendered_pixels: u32,

    /// Margin added around the refined region before cropping. Default: 100.
    pub margin: u32,

    /// Focused-pass fragments need more than this many characters. Default: 3.
    pub min_candidate_len: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Directory containing the pdfium shared library.
    ///
    /// When `None`, `PDFIUM_LIB_PATH` is consulted, then the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Anchor keywords and their offsets.
    pub profile: Arc<KeywordProfile>,

    /// When set, every focused crop is written here as a PNG.
    pub crop_dir: Option<PathBuf>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Checked between pages; raising it stops the scan with
    /// [`SiteScanError::Cancelled`].
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            max_rendered_pixels: 16_000,
            margin: DEFAULT_MARGIN,
            min_candidate_len: DEFAULT_MIN_CANDIDATE_LEN,
            password: None,
            pdfium_library_path: None,
            profile: Arc::new(KeywordProfile::default()),
            crop_dir: None,
            progress_callback: None,
            cancel_flag: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("margin", &self.margin)
            .field("min_candidate_len", &self.min_candidate_len)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("profile", &self.profile)
            .field("crop_dir", &self.crop_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .field("cancel_flag", &self.cancel_flag.is_some())
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 1200);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(100, i32::MAX as u32);
        self
    }

    pub fn margin(mut self, margin: u32) -> Self {
        self.config.margin = margin;
        self
    }

    pub fn min_candidate_len(mut self, len: usize) -> Self {
        self.config.min_candidate_len = len;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn profile(mut self, profile: KeywordProfile) -> Self {
        self.config.profile = Arc::new(profile);
        self
    }

    pub fn crop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.crop_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel_flag = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, SiteScanError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 1200 {
            return Err(SiteScanError::InvalidConfig(format!(
                "DPI must be 72–1200, got {}",
                c.dpi
            )));
        }
        c.profile.validate()?;
        Ok(self.config)
    }
}

// ── Keyword profile ──────────────────────────────────────────────────────

/// Priority-ordered anchor keywords plus the box offsets for each.
///
/// Earlier keywords win when one recognised fragment contains several.
/// Keywords without an offsets entry use [`BoxOffsets::ZERO`].
///
/// On disk a profile is JSON:
///
/// ```json
/// {
///   "keywords": ["建築地住所", "建築地"],
///   "offsets": { "建築地": { "left": -50, "top": -20, "right": 3300, "bottom": 35 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordProfile {
    keywords: Vec<String>,
    #[serde(default)]
    offsets: BTreeMap<String, BoxOffsets>,
}

/// Construction-site anchor terms, highest priority first: "building site
/// address", "building site", "application site", "site map",
/// "construction site".
const SITE_KEYWORDS: [&str; 5] = ["建築地住所", "建築地", "申請地", "現場地図", "建設地"];

/// The labels sit at the left of a wide table row; the address runs far to
/// the right of them on the same line.
const SITE_OFFSETS: BoxOffsets = BoxOffsets::new(-50, -20, 3300, 35);

impl Default for KeywordProfile {
    fn default() -> Self {
        Self {
            keywords: SITE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            offsets: SITE_KEYWORDS
                .iter()
                .map(|k| (k.to_string(), SITE_OFFSETS))
                .collect(),
        }
    }
}

impl KeywordProfile {
    /// Build and validate a profile.
    pub fn new<K, S>(
        keywords: impl IntoIterator<Item = K>,
        offsets: impl IntoIterator<Item = (S, BoxOffsets)>,
    ) -> Result<Self, SiteScanError>
    where
        K: Into<String>,
        S: Into<String>,
    {
        let profile = Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            offsets: offsets.into_iter().map(|(k, o)| (k.into(), o)).collect(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Parse and validate a JSON profile.
    pub fn from_json_str(json: &str) -> Result<Self, SiteScanError> {
        let profile: Self = serde_json::from_str(json)
            .map_err(|e| SiteScanError::InvalidConfig(format!("keyword profile: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Read, parse and validate a JSON profile file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SiteScanError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SiteScanError::ProfileLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_json_str(&text).map_err(|e| SiteScanError::ProfileLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Keywords in priority order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Offsets for `keyword`, or zero offsets if it has none.
    pub fn offsets_for(&self, keyword: &str) -> BoxOffsets {
        self.offsets.get(keyword).copied().unwrap_or_default()
    }

    /// True if `text` contains any keyword.
    pub fn mentions_any(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    fn validate(&self) -> Result<(), SiteScanError> {
        if self.keywords.is_empty() {
            return Err(SiteScanError::InvalidConfig(
                "keyword profile must contain at least one keyword".into(),
            ));
        }
        let mut seen = HashSet::new();
        for k in &self.keywords {
            if k.trim().is_empty() {
                return Err(SiteScanError::InvalidConfig(
                    "keyword profile contains an empty keyword".into(),
                ));
            }
            if !seen.insert(k.as_str()) {
                return Err(SiteScanError::InvalidConfig(format!(
                    "keyword '{k}' is listed twice"
                )));
            }
        }
        Ok(())
    }
}
