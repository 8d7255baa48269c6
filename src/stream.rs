//! Batch API: scan many documents, emitting each result as it completes.
//!
//! Documents run concurrently (up to `concurrency` at once) but each one is
//! scanned by the sequential orchestrator, so first-success-wins still holds
//! inside every document. Results arrive in completion order; `input` tells
//! them apart.

use crate::config::ExtractionConfig;
use crate::engine::TextLocalizer;
use crate::error::SiteScanError;
use crate::extract::extract_address;
use crate::output::ExtractionOutput;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// The outcome for one document in a batch.
#[derive(Debug)]
pub struct DocumentResult {
    pub input: PathBuf,
    pub result: Result<ExtractionOutput, SiteScanError>,
}

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Scan `inputs`, yielding one [`DocumentResult`] per input as it finishes.
///
/// A fatal error on one document is reported in its `DocumentResult` and does
/// not stop the batch. `concurrency` is clamped to at least 1.
///
/// # Example
/// ```rust,no_run
/// use sitescan::{extract_stream, CommandLocalizer, ExtractionConfig};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let ocr = Arc::new(CommandLocalizer::new("easyocr-json"));
/// let inputs = vec!["a.pdf".into(), "b.pdf".into()];
/// let mut results = extract_stream(inputs, ocr, &ExtractionConfig::default(), 2);
/// while let Some(doc) = results.next().await {
///     match doc.result {
///         Ok(out) => println!("{}: {:?}", doc.input.display(), out.result.address()),
///         Err(e) => eprintln!("{}: {e}", doc.input.display()),
///     }
/// }
/// # }
/// ```
pub fn extract_stream(
    inputs: Vec<PathBuf>,
    localizer: Arc<dyn TextLocalizer>,
    config: &ExtractionConfig,
    concurrency: usize,
) -> DocumentStream {
    let concurrency = concurrency.max(1);
    info!(
        "Starting batch: {} documents, concurrency {}",
        inputs.len(),
        concurrency
    );
    let config = config.clone();

    let s = stream::iter(inputs.into_iter().map(move |input| {
        let localizer = Arc::clone(&localizer);
        let cfg = config.clone();
        async move {
            let result = extract_address(&input, localizer, &cfg).await;
            DocumentResult { input, result }
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecognitionResult;
    use crate::error::RecognitionError;
    use image::DynamicImage;

    struct Unused;

    impl TextLocalizer for Unused {
        fn recognize(&self, _: &DynamicImage) -> Result<Vec<RecognitionResult>, RecognitionError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let inputs = vec![
            PathBuf::from("/nowhere/a.pdf"),
            PathBuf::from("b.docx"),
            PathBuf::from("/nowhere/c.pdf"),
        ];
        let results: Vec<DocumentResult> =
            extract_stream(inputs, Arc::new(Unused), &ExtractionConfig::default(), 0)
                .collect()
                .await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.result.is_err()));
        let docx = results
            .iter()
            .find(|r| r.input == PathBuf::from("b.docx"))
            .unwrap();
        assert!(matches!(
            docx.result,
            Err(SiteScanError::UnsupportedInput { .. })
        ));
    }

    #[tokio::test]
    async fn empty_batch_is_empty_stream() {
        let results: Vec<DocumentResult> =
            extract_stream(Vec::new(), Arc::new(Unused), &ExtractionConfig::default(), 4)
                .collect()
                .await;
        assert!(results.is_empty());
    }
}
