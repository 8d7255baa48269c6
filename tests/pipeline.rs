//! Orchestrator tests with an in-memory recognition engine.
//!
//! Pages are synthetic images; the fake engine tells full pages from crops by
//! height and tells pages apart by width, so each page can carry its own
//! scripted text without any real OCR or pdfium.

use image::DynamicImage;
use sitescan::{
    scan_pages, BoxOffsets, ExtractionConfig, ExtractionProgressCallback, KeywordProfile,
    PageError, PageOutcome, PixelBox, Point, RecognitionError, RecognitionResult,
    RecognitionStage, SiteScanError, TextLocalizer,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PAGE_H: u32 = 3000;

// ── Fake engine ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeOcr {
    /// Full-page results keyed by page width.
    pages: HashMap<u32, Vec<RecognitionResult>>,
    /// Returned for every focused crop.
    focused: Vec<RecognitionResult>,
    /// Page widths whose full-page pass errors.
    failing: HashSet<u32>,
    /// Widths of every full page seen, in call order.
    full_calls: Mutex<Vec<u32>>,
    /// Dimensions of every crop seen.
    crop_calls: Mutex<Vec<(u32, u32)>>,
}

impl FakeOcr {
    fn page(mut self, width: u32, results: Vec<RecognitionResult>) -> Self {
        self.pages.insert(width, results);
        self
    }

    fn focused(mut self, results: Vec<RecognitionResult>) -> Self {
        self.focused = results;
        self
    }

    fn failing(mut self, width: u32) -> Self {
        self.failing.insert(width);
        self
    }

    fn full_calls(&self) -> Vec<u32> {
        self.full_calls.lock().unwrap().clone()
    }
}

impl TextLocalizer for FakeOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognitionResult>, RecognitionError> {
        if image.height() != PAGE_H {
            self.crop_calls
                .lock()
                .unwrap()
                .push((image.width(), image.height()));
            return Ok(self.focused.clone());
        }
        let width = image.width();
        self.full_calls.lock().unwrap().push(width);
        if self.failing.contains(&width) {
            return Err(RecognitionError::Engine("CUDA out of memory".into()));
        }
        Ok(self.pages.get(&width).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn page(width: u32) -> Result<DynamicImage, SiteScanError> {
    Ok(DynamicImage::new_luma8(width, PAGE_H))
}

fn zero_offset_config() -> ExtractionConfig {
    let profile = KeywordProfile::new(
        ["建築地住所", "建築地", "申請地"],
        [
            ("建築地住所", BoxOffsets::ZERO),
            ("建築地", BoxOffsets::ZERO),
            ("申請地", BoxOffsets::ZERO),
        ],
    )
    .unwrap();
    ExtractionConfig::builder().profile(profile).build().unwrap()
}

fn anchor(text: &str) -> Vec<RecognitionResult> {
    vec![
        RecognitionResult::rect(40.0, 40.0, 90.0, 60.0, "図面番号 A-101"),
        RecognitionResult::rect(300.0, 500.0, 900.0, 560.0, text),
    ]
}

fn address(text: &str) -> Vec<RecognitionResult> {
    vec![
        RecognitionResult::rect(0.0, 0.0, 80.0, 40.0, "建築地"),
        RecognitionResult::rect(100.0, 0.0, 700.0, 40.0, text),
    ]
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn anchored_page_yields_normalised_address() {
    let ocr = FakeOcr::default()
        .page(2000, anchor("建築地 東京都渋谷区1-2-3 先"))
        .focused(address("東京都渋谷区1-2-3 先"));

    let out = scan_pages("a.pdf", vec![page(2000)], &ocr, &zero_offset_config()).unwrap();

    assert_eq!(out.result.keyword(), Some("建築地"));
    let addr = out.result.address().unwrap();
    assert!(addr.starts_with("東京都渋谷区"), "got {addr}");

    let report = &out.pages[0];
    let region = report.region.unwrap();
    assert!(!region.is_empty());
    assert_eq!(
        region,
        PixelBox {
            x_min: 200,
            y_min: 400,
            x_max: 1000,
            y_max: 660
        }
    );
    assert_eq!(*ocr.crop_calls.lock().unwrap(), vec![(800, 260)]);
    assert_eq!(report.candidates, vec!["東京都渋谷区1-2-3 先".to_string()]);
}

#[test]
fn page_without_keyword_moves_on() {
    let ocr = FakeOcr::default()
        .page(
            2001,
            vec![RecognitionResult::rect(0.0, 0.0, 10.0, 10.0, "配置図 S=1/100")],
        )
        .page(2002, anchor("申請地"))
        .focused(vec![RecognitionResult::rect(
            0.0, 0.0, 10.0, 10.0, "福岡県北九州市小倉北区 3-1",
        )]);

    let out = scan_pages(
        "b.pdf",
        vec![page(2001), page(2002)],
        &ocr,
        &zero_offset_config(),
    )
    .unwrap();

    assert_eq!(out.pages[0].outcome, PageOutcome::NoAnchor);
    assert!(out.pages[0].anchor.is_none());
    assert!(out.pages[0].region.is_none());
    assert_eq!(out.result.get("申請地"), Some("福岡県北九州市小倉北区"));
}

#[test]
fn corner_anchor_clamps_without_error() {
    let profile = KeywordProfile::new(["建築地"], [("建築地", BoxOffsets::new(-50, -20, 0, 0))])
        .unwrap();
    let config = ExtractionConfig::builder().profile(profile).build().unwrap();
    let ocr = FakeOcr::default().page(
        1000,
        vec![RecognitionResult::rect(0.0, 0.0, 10.0, 10.0, "建築地")],
    );

    let out = scan_pages("c.pdf", vec![page(1000)], &ocr, &config).unwrap();
    assert_eq!(
        out.pages[0].region,
        Some(PixelBox {
            x_min: 0,
            y_min: 0,
            x_max: 110,
            y_max: 110
        })
    );
}

#[test]
fn later_pages_are_never_rendered_or_recognised() {
    let ocr = FakeOcr::default()
        .page(3002, anchor("建築地"))
        .page(3003, anchor("建築地"))
        .focused(address("大阪府大阪市北区梅田1丁目"));

    let rendered = AtomicUsize::new(0);
    let pages = (1..=5).map(|i| {
        rendered.fetch_add(1, Ordering::SeqCst);
        page(3000 + i)
    });

    let out = scan_pages("five.pdf", pages, &ocr, &zero_offset_config()).unwrap();

    assert_eq!(out.result.address(), Some("大阪府大阪市北区梅田"));
    assert_eq!(out.stats.scanned_pages, 2);
    assert_eq!(out.stats.total_pages, Some(5));
    assert_eq!(ocr.full_calls(), vec![3001, 3002]);
    assert_eq!(rendered.load(Ordering::SeqCst), 2);
}

#[test]
fn recognition_failure_is_recorded_and_skipped() {
    let ocr = FakeOcr::default()
        .failing(4001)
        .page(4002, anchor("建築地住所"))
        .focused(address("長崎県佐世保市 5-10"));

    let out = scan_pages(
        "f.pdf",
        vec![page(4001), page(4002)],
        &ocr,
        &zero_offset_config(),
    )
    .unwrap();

    match &out.pages[0].outcome {
        PageOutcome::Failed {
            error: PageError::RecognitionFailed { page, stage, detail },
        } => {
            assert_eq!(*page, 1);
            assert_eq!(*stage, RecognitionStage::FullPage);
            assert!(detail.contains("out of memory"));
        }
        other => panic!("expected a failed page, got {other:?}"),
    }
    assert_eq!(out.stats.failed_pages, 1);
    assert_eq!(out.result.get("建築地住所"), Some("長崎県佐世保市"));
}

#[test]
fn collapsed_region_fails_page_and_scan_continues() {
    let profile = KeywordProfile::new(
        ["建築地", "申請地"],
        [
            ("建築地", BoxOffsets::ZERO),
            ("申請地", BoxOffsets::new(0, 0, -1000, -1000)),
        ],
    )
    .unwrap();
    let config = ExtractionConfig::builder()
        .profile(profile)
        .margin(0)
        .build()
        .unwrap();
    let ocr = FakeOcr::default()
        .page(6001, anchor("申請地"))
        .page(6002, anchor("建築地"))
        .focused(address("東京都港区六本木6-10-1"));

    let out = scan_pages("g.pdf", vec![page(6001), page(6002)], &ocr, &config).unwrap();

    match &out.pages[0].outcome {
        PageOutcome::Failed {
            error: PageError::EmptyRegion { page, region },
        } => {
            assert_eq!(*page, 1);
            assert!(region.is_empty());
        }
        other => panic!("expected an empty region, got {other:?}"),
    }
    assert_eq!(out.stats.failed_pages, 1);
    assert_eq!(out.stats.scanned_pages, 2);
    assert_eq!(ocr.crop_calls.lock().unwrap().len(), 1);
    assert!(out.result.get("建築地").unwrap().starts_with("東京都港区"));
}

#[test]
fn non_quad_anchor_counts_as_not_found() {
    let ocr = FakeOcr::default()
        .page(
            5001,
            vec![RecognitionResult::new(
                vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 20.0)],
                "建築地",
            )],
        )
        .focused(address("東京都港区"));

    let out = scan_pages("g.pdf", vec![page(5001)], &ocr, &zero_offset_config()).unwrap();

    assert!(out.result.is_empty());
    assert_eq!(
        out.pages[0].outcome,
        PageOutcome::NoGeometry {
            keyword: "建築地".into()
        }
    );
    assert!(ocr.crop_calls.lock().unwrap().is_empty());
}

#[test]
fn exhausted_document_has_empty_result() {
    let ocr = FakeOcr::default()
        .page(6001, anchor("建築地"))
        .focused(vec![RecognitionResult::rect(0.0, 0.0, 5.0, 5.0, "2024-10-01")]);

    let out = scan_pages(
        "h.pdf",
        vec![page(6001), page(6002)],
        &ocr,
        &zero_offset_config(),
    )
    .unwrap();

    assert!(out.result.is_empty());
    assert_eq!(serde_json::to_string(&out.result).unwrap(), "{}");
    assert_eq!(
        out.pages[0].outcome,
        PageOutcome::NoCandidates {
            keyword: "建築地".into()
        }
    );
    assert_eq!(out.pages[1].outcome, PageOutcome::NoAnchor);
    assert_eq!(out.stats.scanned_pages, 2);
}

#[test]
fn result_order_beats_keyword_priority_across_results() {
    let ocr = FakeOcr::default()
        .page(
            7001,
            vec![
                RecognitionResult::rect(10.0, 10.0, 100.0, 40.0, "申請地"),
                RecognitionResult::rect(10.0, 900.0, 100.0, 940.0, "建築地住所"),
            ],
        )
        .focused(vec![RecognitionResult::rect(0.0, 0.0, 5.0, 5.0, "北海道札幌市中央区")]);

    let out = scan_pages("i.pdf", vec![page(7001)], &ocr, &zero_offset_config()).unwrap();
    assert_eq!(out.result.keyword(), Some("申請地"));
}

// ── Progress & cancellation ──────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    cancel_after: Option<(usize, Arc<AtomicBool>)>,
}

impl ExtractionProgressCallback for Recorder {
    fn on_document_start(&self, document: &str, total_pages: Option<usize>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {document} {total_pages:?}"));
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.events.lock().unwrap().push(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, _total_pages: usize, outcome: &PageOutcome) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {page_num} {}", outcome.label()));
        if let Some((after, flag)) = &self.cancel_after {
            if page_num == *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }

    fn on_document_complete(&self, document: &str, scanned_pages: usize, found: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("end {document} {scanned_pages} {found}"));
    }
}

#[test]
fn progress_events_follow_the_scan() {
    let recorder = Arc::new(Recorder::default());
    let mut config = zero_offset_config();
    config.progress_callback = Some(Arc::clone(&recorder) as Arc<dyn ExtractionProgressCallback>);

    let ocr = FakeOcr::default()
        .page(8002, anchor("建築地"))
        .focused(address("東京都渋谷区神南1-1"));

    scan_pages("p.pdf", vec![page(8001), page(8002), page(8003)], &ocr, &config).unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start p.pdf Some(3)".to_string(),
            "page 1".into(),
            "done 1 no keyword".into(),
            "page 2".into(),
            "done 2 address found".into(),
            "end p.pdf 2 true".into(),
        ]
    );
}

#[test]
fn cancel_flag_stops_between_pages() {
    let flag = Arc::new(AtomicBool::new(false));
    let recorder = Arc::new(Recorder {
        cancel_after: Some((1, Arc::clone(&flag))),
        ..Default::default()
    });
    let config = ExtractionConfig::builder()
        .cancel_flag(Arc::clone(&flag))
        .progress_callback(recorder)
        .build()
        .unwrap();
    let ocr = FakeOcr::default();

    let err = scan_pages("x.pdf", vec![page(9001), page(9002)], &ocr, &config).unwrap_err();

    assert!(matches!(err, SiteScanError::Cancelled { scanned_pages: 1 }));
    assert_eq!(ocr.full_calls(), vec![9001]);
}

#[test]
fn flag_raised_before_start_scans_nothing() {
    let config = ExtractionConfig::builder()
        .cancel_flag(Arc::new(AtomicBool::new(true)))
        .build()
        .unwrap();
    let ocr = FakeOcr::default();
    let err = scan_pages("y.pdf", vec![page(9101)], &ocr, &config).unwrap_err();
    assert!(matches!(err, SiteScanError::Cancelled { scanned_pages: 0 }));
    assert!(ocr.full_calls().is_empty());
}

// ── Diagnostics ──────────────────────────────────────────────────────────────

#[test]
fn crops_are_written_for_inspection() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = zero_offset_config();
    config.crop_dir = Some(dir.path().join("crops"));
    let ocr = FakeOcr::default()
        .page(2000, anchor("建築地"))
        .focused(address("京都府京都市左京区"));

    let out = scan_pages("/data/site plan.pdf", vec![page(2000)], &ocr, &config).unwrap();
    assert!(out.is_found());
    assert!(dir.path().join("crops/site plan_p001.png").exists());
}

#[test]
fn output_serialises_with_page_reports() {
    let ocr = FakeOcr::default()
        .page(2000, anchor("建築地"))
        .focused(address("沖縄県那覇市泉崎1-2-2"));
    let out = scan_pages("j.pdf", vec![page(2000)], &ocr, &zero_offset_config()).unwrap();

    let json: serde_json::Value = serde_json::to_value(&out).unwrap();
    assert_eq!(json["result"]["建築地"], "沖縄県那覇市泉崎");
    assert_eq!(json["pages"][0]["outcome"]["status"], "extracted");
    assert_eq!(json["stats"]["scanned_pages"], 1);
}
