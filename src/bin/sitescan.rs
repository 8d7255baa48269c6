//! CLI binary for sitescan.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints one line per document.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use sitescan::{
    extract_stream, extract_text, CommandLocalizer, DocumentResult, ExtractionConfig,
    ExtractionProgressCallback, KeywordProfile, PageOutcome, ProgressCallback, TextLocalizer,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar for the whole batch: its position counts finished documents, its
/// message shows the page currently being scanned.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(total_documents: usize) -> Arc<Self> {
        let bar = ProgressBar::new(total_documents as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn document_done(&self, line: String) {
        self.bar.println(line);
        self.bar.inc(1);
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_document_start(&self, document: &str, total_pages: Option<usize>) {
        let pages = total_pages.map_or_else(|| "?".to_string(), |n| n.to_string());
        self.bar.set_message(format!("{document} ({pages} pages)"));
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, outcome: &PageOutcome) {
        if let PageOutcome::Failed { error } = outcome {
            self.bar.println(format!(
                "    {} page {:>3}/{:<3}  {}",
                red("✗"),
                page_num,
                total_pages,
                dim(&error.to_string())
            ));
        } else if outcome.is_success() {
            self.bar.set_message(format!(
                "page {page_num}/{total_pages}: {}",
                outcome.label()
            ));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan one drawing with an EasyOCR wrapper script
  sitescan --ocr-command ./easyocr_json.py drawing.pdf

  # Pass extra arguments to the OCR command
  sitescan --ocr-command python3 --ocr-arg ocr.py --ocr-arg --gpu drawing.pdf

  # Batch, four documents at a time, JSON report to a file
  sitescan --ocr-command ./ocr.sh -c 4 --json -o sites.json plans/*.pdf

  # Custom keywords and offsets
  sitescan --ocr-command ./ocr.sh --profile keywords.json drawing.pdf

  # Save the focused crops to inspect what the OCR saw
  sitescan --ocr-command ./ocr.sh --crop-dir crops/ drawing.pdf

  # Dump the embedded text layer instead (no OCR needed)
  sitescan --text-only drawing.pdf

OCR COMMAND CONTRACT:
  The command is run as `<cmd> <ocr-arg>... <image.png>` and must print a
  JSON array on stdout, one entry per text region in reading order:
    [{"polygon": [[x,y],[x,y],[x,y],[x,y]], "text": "建築地", "confidence": 0.9}, ...]
  EasyOCR readtext() tuples are accepted too:
    [[[[x,y],[x,y],[x,y],[x,y]], "建築地", 0.9], ...]

KEYWORD PROFILE (--profile):
  {"keywords": ["建築地住所", "建築地"],
   "offsets": {"建築地": {"left": -50, "top": -20, "right": 3300, "bottom": 35}}}
  Offsets are in pixels at the chosen --dpi.

OUTPUT:
  One line per document: <file>\t<keyword>\t<address>
  Keyword and address are empty when nothing was found.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Directory (or file) of an existing libpdfium
  RUST_LOG                Override log filter (e.g. sitescan=debug)
"#;

/// Extract the construction-site address from scanned PDF drawings.
#[derive(Parser, Debug)]
#[command(
    name = "sitescan",
    version,
    about = "Extract the construction-site address from scanned PDF drawings",
    long_about = "Find a site label such as 建築地 or 申請地 with a full-page OCR pass, \
crop the table row next to it, OCR that crop again and normalise the result into a \
place name. The first page that yields an address wins.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to scan.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// OCR program run once per image (required unless --text-only).
    #[arg(long, env = "SITESCAN_OCR_COMMAND", required_unless_present = "text_only")]
    ocr_command: Option<String>,

    /// Extra argument for the OCR program, placed before the image path. Repeatable.
    #[arg(long = "ocr-arg", allow_hyphen_values = true)]
    ocr_args: Vec<String>,

    /// Rendering DPI (72–1200). Keyword offsets are in pixels at this DPI.
    #[arg(long, env = "SITESCAN_DPI", default_value_t = 600,
          value_parser = clap::value_parser!(u32).range(72..=1200))]
    dpi: u32,

    /// Pixels added around the refined region before cropping.
    #[arg(long, env = "SITESCAN_MARGIN", default_value_t = 100)]
    margin: u32,

    /// Directory or file of the pdfium shared library.
    #[arg(long, env = "SITESCAN_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// JSON keyword profile replacing the built-in keywords.
    #[arg(long, env = "SITESCAN_PROFILE")]
    profile: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "SITESCAN_PASSWORD")]
    password: Option<String>,

    /// Save every focused crop here as PNG.
    #[arg(long, env = "SITESCAN_CROP_DIR")]
    crop_dir: Option<PathBuf>,

    /// Write results to this file instead of stdout.
    #[arg(short, long, env = "SITESCAN_OUTPUT")]
    output: Option<PathBuf>,

    /// Output a JSON array (with per-page diagnostics) instead of lines.
    #[arg(long, env = "SITESCAN_JSON")]
    json: bool,

    /// Print the embedded text layer of each PDF; no OCR is run.
    #[arg(long)]
    text_only: bool,

    /// Number of documents scanned at once.
    #[arg(short, long, env = "SITESCAN_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SITESCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SITESCAN_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, env = "SITESCAN_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.text_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(|| CliProgressCallback::new(cli.inputs.len()));
    let cancel = Arc::new(AtomicBool::new(false));
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
        Arc::clone(&cancel),
    )?;

    // Ctrl-C stops every document at its next page boundary.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let (rendered, failures) = if cli.text_only {
        run_text_only(&cli, &config).await
    } else {
        run_extraction(&cli, &config, progress.as_deref()).await?
    };

    if let Some(cb) = &progress {
        cb.bar.finish_and_clear();
    }

    // ── Emit ─────────────────────────────────────────────────────────────
    match &cli.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(path, &rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if failures > 0 {
        if !cli.quiet {
            eprintln!(
                "{} {}/{} documents could not be scanned",
                red("✘"),
                failures,
                cli.inputs.len()
            );
        }
        std::process::exit(1);
    }
    Ok(())
}

/// Scan every input; returns the rendered report and the number of documents
/// that failed fatally.
async fn run_extraction(
    cli: &Cli,
    config: &ExtractionConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<(String, usize)> {
    let program = cli
        .ocr_command
        .clone()
        .context("--ocr-command is required unless --text-only is given")?;
    let localizer: Arc<dyn TextLocalizer> =
        Arc::new(CommandLocalizer::new(program).args(cli.ocr_args.iter()));

    let mut stream = extract_stream(
        cli.inputs.clone(),
        localizer,
        config,
        cli.concurrency,
    );

    let mut results: Vec<DocumentResult> = Vec::with_capacity(cli.inputs.len());
    while let Some(doc) = stream.next().await {
        let line = summary_line(&doc);
        match progress {
            Some(cb) => cb.document_done(line),
            None if cli.quiet || cli.json => {
                if let Err(e) = &doc.result {
                    eprintln!("{}: {}", doc.input.display(), e);
                }
            }
            None => eprintln!("{line}"),
        }
        results.push(doc);
    }

    // Report in input order regardless of completion order.
    results.sort_by_key(|doc| {
        cli.inputs
            .iter()
            .position(|p| p == &doc.input)
            .unwrap_or(usize::MAX)
    });
    let failures = results.iter().filter(|d| d.result.is_err()).count();

    let rendered = if cli.json {
        let items: Vec<_> = results
            .iter()
            .map(|doc| match &doc.result {
                Ok(out) => json!({
                    "input": doc.input.display().to_string(),
                    "result": out.result,
                    "pages": out.pages,
                    "stats": out.stats,
                }),
                Err(e) => json!({
                    "input": doc.input.display().to_string(),
                    "error": e.to_string(),
                }),
            })
            .collect();
        let mut s = serde_json::to_string_pretty(&items).context("Failed to serialise output")?;
        s.push('\n');
        s
    } else {
        results
            .iter()
            .filter_map(|doc| doc.result.as_ref().ok().map(|out| (doc, out)))
            .map(|(doc, out)| {
                format!(
                    "{}\t{}\t{}\n",
                    doc.input.display(),
                    out.result.keyword().unwrap_or(""),
                    out.result.address().unwrap_or("")
                )
            })
            .collect()
    };

    Ok((rendered, failures))
}

/// Dump each input's embedded text layer.
async fn run_text_only(cli: &Cli, config: &ExtractionConfig) -> (String, usize) {
    let mut failures = 0;
    let mut items = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        match extract_text(input, config).await {
            Ok(text) => items.push((input, text)),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", input.display(), e);
            }
        }
    }

    let rendered = if cli.json {
        let arr: Vec<_> = items
            .iter()
            .map(|(input, text)| json!({ "input": input.display().to_string(), "text": text }))
            .collect();
        serde_json::to_string_pretty(&arr)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .unwrap_or_default()
    } else {
        let single = cli.inputs.len() == 1;
        let mut out = String::new();
        for (input, text) in items {
            if !single {
                out.push_str(&format!("==> {} <==\n", input.display()));
            }
            if let Some(text) = text {
                out.push_str(&text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out
    };
    (rendered, failures)
}

fn summary_line(doc: &DocumentResult) -> String {
    let name = doc.input.display().to_string();
    match &doc.result {
        Ok(out) => match (out.result.keyword(), out.result.address()) {
            (Some(keyword), Some(address)) => format!(
                "  {} {}  {} {}  {}",
                green("✓"),
                bold(&name),
                cyan(keyword),
                address,
                dim(&format!(
                    "page {}, {:.1}s",
                    out.stats.scanned_pages,
                    out.stats.total_duration_ms as f64 / 1000.0
                )),
            ),
            _ => format!(
                "  {} {}  {}",
                dim("·"),
                bold(&name),
                dim(&format!(
                    "no address in {} pages ({} failed)",
                    out.stats.scanned_pages, out.stats.failed_pages
                )),
            ),
        },
        Err(e) => format!("  {} {}  {}", red("✗"), bold(&name), red(&first_line(e))),
    }
}

fn first_line(e: &impl std::fmt::Display) -> String {
    e.to_string().lines().next().unwrap_or_default().to_string()
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: Arc<AtomicBool>,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .margin(cli.margin)
        .cancel_flag(cancel);

    if let Some(ref path) = cli.profile {
        let profile = KeywordProfile::from_json_file(path)
            .with_context(|| format!("Failed to load keyword profile {}", path.display()))?;
        builder = builder.profile(profile);
    }
    if let Some(ref dir) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(dir);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref dir) = cli.crop_dir {
        builder = builder.crop_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
