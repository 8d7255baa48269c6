//! Output types: per-page outcomes, the extraction result and run stats.

use crate::error::PageError;
use crate::geometry::PixelBox;
use crate::pipeline::anchor::AnchorBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    /// An address was extracted; the scan stops here.
    Extracted { keyword: String, address: String },
    /// No recognised text contains an anchor keyword.
    NoAnchor,
    /// A keyword matched but its polygon was not a quadrilateral.
    NoGeometry { keyword: String },
    /// The focused pass produced no address-like fragments.
    NoCandidates { keyword: String },
    /// Candidates existed but normalised to an empty string.
    EmptyAddress { keyword: String },
    /// A page-local error; the scan continues with the next page.
    Failed { error: PageError },
}

impl PageOutcome {
    /// Whether this page ended the scan.
    pub fn is_success(&self) -> bool {
        matches!(self, PageOutcome::Extracted { .. })
    }

    /// Short label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            PageOutcome::Extracted { .. } => "address found",
            PageOutcome::NoAnchor => "no keyword",
            PageOutcome::NoGeometry { .. } => "keyword without box",
            PageOutcome::NoCandidates { .. } => "no address text",
            PageOutcome::EmptyAddress { .. } => "empty address",
            PageOutcome::Failed { .. } => "failed",
        }
    }
}

/// Diagnostic record for one scanned page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,
    pub outcome: PageOutcome,
    /// Anchor box, when one was located.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorBox>,
    /// Refined crop region, when one was computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<PixelBox>,
    /// Candidate fragments from the focused pass, in pass order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
    /// Wall-clock time spent on this page, rasterisation excluded.
    pub duration_ms: u64,
}

impl PageReport {
    pub fn new(page_num: usize, outcome: PageOutcome) -> Self {
        Self {
            page_num,
            outcome,
            anchor: None,
            region: None,
            candidates: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Keyword → address mapping with at most one entry.
///
/// Empty means no page produced an address. Serialises as a plain JSON
/// object, e.g. `{"建築地": "東京都渋谷区"}` or `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult(BTreeMap<String, String>);

impl ExtractionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn found(keyword: impl Into<String>, address: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(keyword.into(), address.into());
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The matched keyword, if an address was found.
    pub fn keyword(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    /// The normalised address, if one was found.
    pub fn address(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.0.get(keyword).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Run statistics for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document, when known before scanning.
    pub total_pages: Option<usize>,
    /// Pages actually scanned (the scan stops at the first success).
    pub scanned_pages: usize,
    /// Pages that ended in [`PageOutcome::Failed`].
    pub failed_pages: usize,
    pub total_duration_ms: u64,
}

/// Everything produced by scanning one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Document identifier (usually the input path).
    pub document: String,
    pub result: ExtractionResult,
    pub pages: Vec<PageReport>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    pub fn is_found(&self) -> bool {
        !self.result.is_empty()
    }
}
