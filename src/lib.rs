//! # sitescan
//!
//! Find the construction-site address on scanned Japanese architectural
//! drawings.
//!
//! Drawings and permit applications label the site with a fixed term such as
//! 建築地 or 申請地 and print the address to the right of it on the same table
//! row. Running OCR over a whole 600-DPI sheet finds the label reliably but
//! reads the small address text poorly, so this crate runs recognition twice:
//! once over the whole page to locate the label, then again over a crop of
//! the row next to it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the path is a readable PDF
//!  ├─ 2. Render   rasterise pages lazily via pdfium (spawn_blocking)
//!  ├─ 3. Anchor   full-page OCR, first result containing a keyword
//!  ├─ 4. Region   keyword offsets + clamp + margin
//!  ├─ 5. Focus    OCR on the cropped region
//!  ├─ 6. Address  keep address-like fragments, normalise to a place name
//!  └─ 7. Output   {keyword: address} from the first page that succeeds
//! ```
//!
//! The OCR engine is not bundled. Plug one in through [`TextLocalizer`], or
//! point [`CommandLocalizer`] at a script that prints JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sitescan::{extract_address, CommandLocalizer, ExtractionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ocr = Arc::new(CommandLocalizer::new("./ocr.py"));
//!     let output = extract_address("drawing.pdf", ocr, &ExtractionConfig::default()).await?;
//!     println!("{}", serde_json::to_string(&output.result)?);
//!     eprintln!("scanned {} pages", output.stats.scanned_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sitescan` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! sitescan = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, KeywordProfile};
pub use engine::{CommandLocalizer, RecognitionResult, TextLocalizer};
pub use error::{PageError, RecognitionError, RecognitionStage, SiteScanError};
pub use extract::{
    extract_address, extract_address_sync, extract_from_bytes, extract_text, extract_to_file,
};
pub use geometry::{BoxOffsets, PixelBox, Point, Rect};
pub use output::{ExtractionOutput, ExtractionResult, ExtractionStats, PageOutcome, PageReport};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use scan::scan_pages;
pub use stream::{extract_stream, DocumentResult, DocumentStream};
