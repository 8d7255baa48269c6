//! Single-page processing: two recognition passes around a keyword anchor.
//!
//! [`process_page`] never returns an error. A page that fails (engine error,
//! empty crop) becomes [`PageOutcome::Failed`] so one bad page cannot abort
//! the document; the orchestrator moves on to the next page.

use crate::config::ExtractionConfig;
use crate::engine::TextLocalizer;
use crate::error::{PageError, RecognitionStage};
use crate::output::{PageOutcome, PageReport};
use crate::pipeline::{address, anchor, crop, region};
use anchor::AnchorSearch;
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the anchor → region → crop → focused pass → normalise sequence on
/// one rendered page.
///
/// `document` is only used for crop file names and logs.
pub fn process_page(
    page_num: usize,
    document: &str,
    image: &DynamicImage,
    localizer: &dyn TextLocalizer,
    config: &ExtractionConfig,
) -> PageReport {
    let start = Instant::now();
    let mut report = scan(page_num, document, image, localizer, config);
    report.duration_ms = start.elapsed().as_millis() as u64;
    report
}

fn scan(
    page_num: usize,
    document: &str,
    image: &DynamicImage,
    localizer: &dyn TextLocalizer,
    config: &ExtractionConfig,
) -> PageReport {
    let profile = config.profile.as_ref();

    // ── Pass 1: whole page ───────────────────────────────────────────────
    let full = match localizer.recognize(image) {
        Ok(results) => results,
        Err(e) => {
            warn!("Page {}: {} failed on full page: {}", page_num, localizer.name(), e);
            return failed(page_num, RecognitionStage::FullPage, e.to_string());
        }
    };
    debug!("Page {}: {} regions on full page", page_num, full.len());

    let anchor = match anchor::locate_anchor(&full, profile) {
        AnchorSearch::Found(a) => a,
        AnchorSearch::NotFound => return PageReport::new(page_num, PageOutcome::NoAnchor),
        AnchorSearch::NoGeometry { keyword, text } => {
            debug!(
                "Page {}: '{}' matched in {:?} but the region has no four-point box",
                page_num, keyword, text
            );
            return PageReport::new(page_num, PageOutcome::NoGeometry { keyword });
        }
    };
    let keyword = anchor.matched_keyword.clone();
    debug!("Page {}: anchor '{}' at {:?}", page_num, keyword, anchor.rect);

    // ── Region + crop ────────────────────────────────────────────────────
    let refined = region::refine_region(
        &anchor,
        profile,
        image.width(),
        image.height(),
        config.margin,
    );

    let mut report = PageReport::new(page_num, PageOutcome::NoCandidates { keyword: keyword.clone() });
    report.anchor = Some(anchor);
    report.region = Some(refined);

    let cropped = match crop::crop_region(image, refined, page_num) {
        Ok(c) => c,
        Err(e) => {
            warn!("{}", e);
            report.outcome = PageOutcome::Failed { error: e };
            return report;
        }
    };

    if let Some(dir) = &config.crop_dir {
        crop::save_crop(dir, document, page_num, &cropped);
    }

    // ── Pass 2: focused region ───────────────────────────────────────────
    let focused = match localizer.recognize(&cropped) {
        Ok(results) => results,
        Err(e) => {
            warn!("Page {}: {} failed on focused region: {}", page_num, localizer.name(), e);
            report.outcome = PageOutcome::Failed {
                error: PageError::RecognitionFailed {
                    page: page_num,
                    stage: RecognitionStage::Focused,
                    detail: e.to_string(),
                },
            };
            return report;
        }
    };

    report.candidates = address::select_candidates(&focused, profile, config.min_candidate_len);
    if report.candidates.is_empty() {
        debug!("Page {}: no address candidates near '{}'", page_num, keyword);
        return report;
    }

    let normalized = address::normalize_address(&report.candidates.join(" "), profile);
    report.outcome = if normalized.is_empty() {
        debug!(
            "Page {}: candidates {:?} normalised to nothing",
            page_num, report.candidates
        );
        PageOutcome::EmptyAddress { keyword }
    } else {
        info!("Page {}: {} → {}", page_num, keyword, normalized);
        PageOutcome::Extracted {
            keyword,
            address: normalized,
        }
    };
    report
}

fn failed(page_num: usize, stage: RecognitionStage, detail: String) -> PageReport {
    PageReport::new(
        page_num,
        PageOutcome::Failed {
            error: PageError::RecognitionFailed {
                page: page_num,
                stage,
                detail,
            },
        },
    )
}
