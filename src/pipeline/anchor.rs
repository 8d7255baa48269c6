//! Keyword anchor search.
//!
//! Walks recognition results in the engine's reading order and stops at the
//! first result containing any keyword. Within that one result the keyword
//! list's priority decides which keyword is reported. A later result holding
//! a higher-priority keyword never overrides an earlier match.

use crate::config::KeywordProfile;
use crate::engine::RecognitionResult;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned box around the text that carried the anchor keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorBox {
    pub rect: Rect,
    pub matched_keyword: String,
    pub matched_text: String,
}

/// Result of an anchor search on one page.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorSearch {
    /// No result mentions any keyword.
    NotFound,
    /// The first keyword-bearing result has no usable four-point polygon.
    /// The search still stops there.
    NoGeometry { keyword: String, text: String },
    /// Anchor located.
    Found(AnchorBox),
}

impl AnchorSearch {
    pub fn anchor(&self) -> Option<&AnchorBox> {
        match self {
            AnchorSearch::Found(a) => Some(a),
            _ => None,
        }
    }
}

/// Find the first anchor keyword in `results`.
pub fn locate_anchor(results: &[RecognitionResult], profile: &KeywordProfile) -> AnchorSearch {
    let hit = results.iter().find_map(|r| {
        profile
            .keywords()
            .iter()
            .find(|k| r.text.contains(k.as_str()))
            .map(|k| (r, k))
    });

    let Some((result, keyword)) = hit else {
        return AnchorSearch::NotFound;
    };

    match Rect::from_quad(&result.polygon) {
        Some(rect) => AnchorSearch::Found(AnchorBox {
            rect,
            matched_keyword: keyword.clone(),
            matched_text: result.text.clone(),
        }),
        None => AnchorSearch::NoGeometry {
            keyword: keyword.clone(),
            text: result.text.clone(),
        },
    }
}
