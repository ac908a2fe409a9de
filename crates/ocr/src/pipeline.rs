use std::path::Path;
use std::sync::Arc;

use makbuz_core::{items_total, FieldName, FieldValue};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::config::ScanConfig;
use crate::extract::Extractor;
use crate::items::{parse_items, select_line_items};
use crate::merge::{merge_fields, MergeError};
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{PassOutcome, PassResult, PassStatus, PassSummary, ScanReport};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no usable recognition pass out of {attempted}")]
    NoUsablePasses { attempted: usize },
    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),
}

/// Runs one recognition pass per configured segmentation mode and reconciles
/// the transcriptions into a single report.
pub struct ScanPipeline<R: OcrBackend> {
    recognizer: Arc<R>,
    config: ScanConfig,
}

impl<R: OcrBackend + 'static> ScanPipeline<R> {
    pub fn new(recognizer: R, config: ScanConfig) -> Self {
        Self { recognizer: Arc::new(recognizer), config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan an image on disk.
    pub async fn scan_file(&self, path: &Path) -> Result<ScanReport, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.scan_image(&bytes).await
    }

    /// Scan raw image bytes. Passes run concurrently on the blocking pool and
    /// are all joined before anything is merged.
    pub async fn scan_image(&self, data: &[u8]) -> Result<ScanReport, PipelineError> {
        let image: Arc<[u8]> = Arc::from(data);

        let handles: Vec<_> = self
            .config
            .segmentation_modes
            .iter()
            .map(|&mode| {
                let recognizer = Arc::clone(&self.recognizer);
                let image = Arc::clone(&image);
                let language = self.config.language.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    recognizer.recognize(&image, &language, mode)
                });
                (mode, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (mode, handle) in handles {
            let transcription = match handle.await {
                Ok(result) => result,
                Err(e) => Err(OcrError::Engine(format!("recognition task failed: {e}"))),
            };
            outcomes.push(PassOutcome { mode: Some(mode), transcription });
        }

        reconcile(outcomes, &self.config)
    }
}

/// Turn the outcomes of several passes over the same document into one
/// report.
///
/// Failed and blank passes are reported but take no part in the vote. The
/// document kind is decided over all usable passes before any field is
/// extracted, so every pass is read with the same rule set.
pub fn reconcile(
    outcomes: Vec<PassOutcome>,
    config: &ScanConfig,
) -> Result<ScanReport, PipelineError> {
    let attempted = outcomes.len();
    let texts: Vec<&str> = outcomes.iter().filter_map(usable_text).collect();
    if texts.is_empty() {
        for outcome in &outcomes {
            warn!(mode = ?outcome.mode, "pass produced nothing usable");
        }
        return Err(PipelineError::NoUsablePasses { attempted });
    }

    let kind = classify(&texts);
    debug!(%kind, usable = texts.len(), "document classified");

    let mut passes: Vec<PassResult> = Vec::with_capacity(texts.len());
    let mut summaries = Vec::with_capacity(attempted);
    for outcome in outcomes {
        let mode = outcome.mode;
        let status = match outcome.transcription {
            Ok(text) if !text.trim().is_empty() => {
                let fields = Extractor::extract_for(&text, kind);
                let items = (kind.is_receipt() && mode.map_or(true, |m| config.yields_items(m)))
                    .then(|| parse_items(&text));
                let status = PassStatus::Ok {
                    fields_found: fields.filled(),
                    items_found: items.as_ref().map(Vec::len),
                };
                passes.push(PassResult { mode, fields, items });
                status
            }
            Ok(_) => {
                warn!(?mode, "pass returned no text; excluded from the vote");
                PassStatus::Failed { error: "empty transcription".into() }
            }
            Err(e) => {
                warn!(?mode, error = %e, "pass failed; excluded from the vote");
                PassStatus::Failed { error: e.to_string() }
            }
        };
        summaries.push(PassSummary { mode, status });
    }

    let field_maps: Vec<_> = passes.iter().map(|p| p.fields.clone()).collect();
    let mut fields = merge_fields(&field_maps)?;

    let mut line_items = Vec::new();
    let mut total_from_items = false;
    if kind.is_receipt() {
        let candidates: Vec<_> = passes.iter().filter_map(|p| p.items.clone()).collect();
        line_items = select_line_items(&candidates, fields.total());

        if fields.total().is_none() && !line_items.is_empty() {
            if let Some(total) = items_total(&line_items) {
                let total = total.round_dp(2);
                debug!(%total, "total taken from line items");
                fields.set(FieldName::Total, FieldValue::Amount(total));
                total_from_items = true;
            }
        }
    }

    info!(
        %kind,
        usable = passes.len(),
        attempted,
        fields = fields.filled(),
        items = line_items.len(),
        "scan reconciled"
    );

    Ok(ScanReport { kind, fields, line_items, total_from_items, passes: summaries })
}

fn usable_text(outcome: &PassOutcome) -> Option<&str> {
    outcome
        .transcription
        .as_deref()
        .ok()
        .filter(|text| !text.trim().is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
