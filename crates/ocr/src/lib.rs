//! Multi-pass OCR reconciliation for Turkish receipts and invoices.

/// Define a lazily compiled, process-wide regex accessor.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

/// `FİŞ NO` and the shapes OCR bends it into.
macro_rules! receipt_label {
    () => {
        r"F[İIıil1|]{0,3}[ŞşSs5]\s*N[O0]"
    };
}

pub mod classify;
pub mod config;
pub mod extract;
pub mod items;
pub mod labels;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use classify::classify;
pub use config::{ConfigError, ScanConfig};
pub use extract::Extractor;
pub use items::{parse_items, select_line_items};
pub use merge::{merge_fields, MergeError};
pub use pipeline::{reconcile, PipelineError, ScanPipeline};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, ScriptedRecognizer, SegmentationMode};
pub use types::{PassOutcome, PassResult, PassStatus, PassSummary, ScanReport};
