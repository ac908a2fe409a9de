use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use makbuz_core::FieldName;
use makbuz_ocr::{reconcile, PassOutcome, ScanConfig, ScanReport, SegmentationMode};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Read Turkish receipts and invoices from several OCR passes.
#[derive(Debug, Parser)]
#[clap(version)]
struct Cli {
    /// Scan configuration (TOML). Defaults to `config.toml` in the user's
    /// config directory, then to built-in settings.
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level. `RUST_LOG` overrides this.
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Print the report on a single line.
    #[clap(long, global = true)]
    compact: bool,

    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Reconcile transcriptions already on disk, one file per pass.
    Merge {
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Segmentation mode each file was recognized with, in file order.
        /// Passes of itemless modes are not parsed for line items.
        #[clap(long, value_delimiter = ',')]
        modes: Vec<u8>,
    },
    /// Recognize an image once per configured segmentation mode.
    Scan {
        image: PathBuf,

        /// Directory holding the Tesseract language data.
        #[clap(long)]
        tessdata: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
    debug!(?cli, "parsed options");

    let config = load_config(cli.config.as_deref())?;

    let report = match cli.cmd {
        Cmd::Merge { files, modes } => merge(&files, &modes, &config).await?,
        Cmd::Scan { image, tessdata } => scan(&image, tessdata, config).await?,
    };

    if let Some(total) = report.fields.get(FieldName::Total) {
        info!(kind = %report.kind, %total, "document read");
    }
    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = explicit {
        return ScanConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }

    let default_path = directories::ProjectDirs::from("com", "makbuz", "Makbuz")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .filter(|path| path.is_file());
    match default_path {
        Some(path) => {
            debug!(path = %path.display(), "using user config");
            ScanConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))
        }
        None => Ok(ScanConfig::default()),
    }
}

async fn merge(files: &[PathBuf], modes: &[u8], config: &ScanConfig) -> Result<ScanReport> {
    let mut texts = Vec::with_capacity(files.len());
    for path in files {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading transcription {}", path.display()))?;
        texts.push(text);
    }
    let outcomes = pair_with_modes(texts, modes)?;
    Ok(reconcile(outcomes, config)?)
}

/// One outcome per transcription, tagged with its mode when modes are given.
fn pair_with_modes(texts: Vec<String>, modes: &[u8]) -> Result<Vec<PassOutcome>> {
    if modes.is_empty() {
        return Ok(texts.into_iter().map(PassOutcome::external).collect());
    }
    if modes.len() != texts.len() {
        bail!("{} modes given for {} transcriptions", modes.len(), texts.len());
    }
    texts
        .into_iter()
        .zip(modes)
        .map(|(text, &mode)| {
            let mode = SegmentationMode::new(mode)
                .with_context(|| format!("segmentation mode {mode} is out of range"))?;
            Ok(PassOutcome::recognized(mode, text))
        })
        .collect()
}

#[cfg(feature = "tesseract")]
async fn scan(image: &Path, tessdata: Option<String>, config: ScanConfig) -> Result<ScanReport> {
    use makbuz_ocr::recognizer::tesseract_backend::TesseractRecognizer;
    use makbuz_ocr::ScanPipeline;

    let pipeline = ScanPipeline::new(TesseractRecognizer::new(tessdata), config);
    info!(
        image = %image.display(),
        language = %pipeline.config().language,
        modes = pipeline.config().segmentation_modes.len(),
        "scanning"
    );
    Ok(pipeline.scan_file(image).await?)
}

#[cfg(not(feature = "tesseract"))]
async fn scan(image: &Path, _tessdata: Option<String>, _config: ScanConfig) -> Result<ScanReport> {
    Err(makbuz_ocr::OcrError::NotAvailable)
        .with_context(|| format!("cannot scan {}: built without the `tesseract` feature", image.display()))
}
