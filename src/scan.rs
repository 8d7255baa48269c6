//! Page orchestrator: walk a document's pages until one yields an address.
//!
//! Pages are strictly sequential. The first [`PageOutcome::Extracted`] ends
//! the scan and later pages are never pulled from the iterator, so with a
//! lazy page source they are never rasterised either.
//!
//! A page-level failure is recorded in that page's report and the scan moves
//! on. A rasterisation error from the page source is fatal for the document.

use crate::config::ExtractionConfig;
use crate::engine::TextLocalizer;
use crate::error::SiteScanError;
use crate::output::{ExtractionOutput, ExtractionResult, ExtractionStats, PageOutcome};
use crate::pipeline::page::process_page;
use image::DynamicImage;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scan `pages` in order and stop at the first extracted address.
///
/// `document` identifies the document in logs, progress events and the
/// returned [`ExtractionOutput`]. The page count reported to callbacks comes
/// from the iterator's size hint when it is exact.
///
/// # Errors
/// - any `Err` yielded by `pages` (typically [`SiteScanError::RasterizationFailed`])
/// - [`SiteScanError::Cancelled`] when the config's cancel flag is raised
///   between two pages
pub fn scan_pages<I>(
    document: &str,
    pages: I,
    localizer: &dyn TextLocalizer,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SiteScanError>
where
    I: IntoIterator<Item = Result<DynamicImage, SiteScanError>>,
{
    let start = Instant::now();
    let pages = pages.into_iter();
    let total_pages = match pages.size_hint() {
        (lo, Some(hi)) if lo == hi => Some(lo),
        _ => None,
    };
    info!(
        "Scanning {} ({} pages) with {}",
        document,
        total_pages.map_or_else(|| "?".to_string(), |n| n.to_string()),
        localizer.name()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(document, total_pages);
    }

    let mut reports = Vec::new();
    let mut result = ExtractionResult::empty();

    for (idx, page) in pages.enumerate() {
        let page_num = idx + 1;

        if let Some(flag) = &config.cancel_flag {
            if flag.load(Ordering::SeqCst) {
                info!("{}: cancelled before page {}", document, page_num);
                return Err(SiteScanError::Cancelled {
                    scanned_pages: reports.len(),
                });
            }
        }

        let image = page?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages.unwrap_or(0));
        }

        let report = process_page(page_num, document, &image, localizer, config);
        debug!(
            "{} page {}: {} ({}ms)",
            document,
            page_num,
            report.outcome.label(),
            report.duration_ms
        );
        if let PageOutcome::Failed { error } = &report.outcome {
            warn!("{}: {}", document, error);
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total_pages.unwrap_or(0), &report.outcome);
        }

        let extracted = match &report.outcome {
            PageOutcome::Extracted { keyword, address } => {
                Some(ExtractionResult::found(keyword.as_str(), address.as_str()))
            }
            _ => None,
        };
        reports.push(report);

        if let Some(found) = extracted {
            result = found;
            break;
        }
    }

    let stats = ExtractionStats {
        total_pages,
        scanned_pages: reports.len(),
        failed_pages: reports
            .iter()
            .filter(|r| matches!(r.outcome, PageOutcome::Failed { .. }))
            .count(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    match (result.keyword(), result.address()) {
        (Some(keyword), Some(address)) => info!(
            "{}: {} → {} (page {} of {})",
            document,
            keyword,
            address,
            stats.scanned_pages,
            total_pages.map_or_else(|| "?".to_string(), |n| n.to_string())
        ),
        _ => info!(
            "{}: no address found in {} pages ({} failed)",
            document, stats.scanned_pages, stats.failed_pages
        ),
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(document, stats.scanned_pages, !result.is_empty());
    }

    Ok(ExtractionOutput {
        document: document.to_string(),
        result,
        pages: reports,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecognitionResult;
    use crate::error::RecognitionError;

    /// Reads text from the image's width so each page can carry its own script.
    struct ByWidth;

    impl TextLocalizer for ByWidth {
        fn recognize(
            &self,
            image: &DynamicImage,
        ) -> Result<Vec<RecognitionResult>, RecognitionError> {
            match image.width() {
                // full page with an anchor
                4000 => Ok(vec![RecognitionResult::rect(
                    100.0, 100.0, 200.0, 150.0, "建築地",
                )]),
                // focused crop of that anchor under the default profile
                _ if image.height() < 1000 => Ok(vec![RecognitionResult::rect(
                    0.0, 0.0, 10.0, 10.0, "福岡県福岡市中央区 1-1",
                )]),
                _ => Ok(vec![]),
            }
        }
    }

    fn blank(w: u32) -> Result<DynamicImage, SiteScanError> {
        Ok(DynamicImage::new_luma8(w, 1200))
    }

    #[test]
    fn empty_document_is_exhausted() {
        let out = scan_pages("e.pdf", Vec::new(), &ByWidth, &ExtractionConfig::default()).unwrap();
        assert!(out.result.is_empty());
        assert_eq!(out.stats.scanned_pages, 0);
        assert_eq!(out.stats.total_pages, Some(0));
    }

    #[test]
    fn stops_at_first_success() {
        let pages = vec![blank(900), blank(4000), blank(4000)];
        let out = scan_pages("d.pdf", pages, &ByWidth, &ExtractionConfig::default()).unwrap();
        assert_eq!(out.result.get("建築地"), Some("福岡県福岡市中央区"));
        assert_eq!(out.stats.scanned_pages, 2);
        assert_eq!(out.pages[0].outcome, PageOutcome::NoAnchor);
    }

    #[test]
    fn rasterisation_error_aborts() {
        let pages = vec![
            blank(900),
            Err(SiteScanError::RasterizationFailed {
                page: 2,
                detail: "bad stream".into(),
            }),
            blank(4000),
        ];
        let err = scan_pages("d.pdf", pages, &ByWidth, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, SiteScanError::RasterizationFailed { page: 2, .. }));
    }
}
