use makbuz_core::{DocumentKind, FieldMap, LineItem};
use serde::Serialize;

use crate::recognizer::{OcrError, SegmentationMode};

/// What one recognition pass produced: a transcription or an engine failure.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    /// `None` when the transcription came from outside the pipeline.
    pub mode: Option<SegmentationMode>,
    pub transcription: Result<String, OcrError>,
}

impl PassOutcome {
    pub fn recognized(mode: SegmentationMode, text: impl Into<String>) -> Self {
        Self { mode: Some(mode), transcription: Ok(text.into()) }
    }

    pub fn failed(mode: SegmentationMode, error: OcrError) -> Self {
        Self { mode: Some(mode), transcription: Err(error) }
    }

    /// A transcription obtained elsewhere, e.g. read from a file.
    pub fn external(text: impl Into<String>) -> Self {
        Self { mode: None, transcription: Ok(text.into()) }
    }
}

/// One usable pass after extraction. Lives until the merge consumes it.
#[derive(Debug, Clone)]
pub struct PassResult {
    pub mode: Option<SegmentationMode>,
    pub fields: FieldMap,
    /// `None` when items were not parsed for this pass.
    pub items: Option<Vec<LineItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassStatus {
    Ok {
        fields_found: usize,
        items_found: Option<usize>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub mode: Option<SegmentationMode>,
    #[serde(flatten)]
    pub status: PassStatus,
}

impl PassSummary {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, PassStatus::Ok { .. })
    }
}

/// The reconciled result of scanning one document.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub kind: DocumentKind,
    pub fields: FieldMap,
    pub line_items: Vec<LineItem>,
    /// The total was missing from every pass and was taken from the items.
    pub total_from_items: bool,
    pub passes: Vec<PassSummary>,
}

impl ScanReport {
    pub fn usable_passes(&self) -> usize {
        self.passes.iter().filter(|p| p.is_ok()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_summary_serializes_flat() {
        let ok = PassSummary {
            mode: SegmentationMode::new(6),
            status: PassStatus::Ok { fields_found: 3, items_found: None },
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["mode"], 6);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["fields_found"], 3);

        let failed = PassSummary {
            mode: None,
            status: PassStatus::Failed { error: "boom".into() },
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert!(json["mode"].is_null());
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn outcome_constructors() {
        let mode = SegmentationMode::AUTO;
        assert!(PassOutcome::recognized(mode, "x").transcription.is_ok());
        assert!(PassOutcome::failed(mode, OcrError::NotAvailable).transcription.is_err());
        assert!(PassOutcome::external("x").mode.is_none());
    }
}
