use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Unsupported segmentation mode: {0}")]
    UnsupportedMode(SegmentationMode),
    #[error("Tesseract not available; build with the `tesseract` feature")]
    NotAvailable,
}

/// Tesseract page segmentation mode (`--psm`), 0–13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SegmentationMode(u8);

impl SegmentationMode {
    pub const MAX: u8 = 13;

    /// Fully automatic page segmentation.
    pub const AUTO: SegmentationMode = SegmentationMode(3);
    /// A single column of text of variable sizes.
    pub const SINGLE_COLUMN: SegmentationMode = SegmentationMode(4);
    /// A single uniform block of text.
    pub const SINGLE_BLOCK: SegmentationMode = SegmentationMode(6);
    /// As much text as possible, in no particular order.
    pub const SPARSE_TEXT: SegmentationMode = SegmentationMode(11);

    pub fn new(mode: u8) -> Option<Self> {
        (mode <= Self::MAX).then_some(SegmentationMode(mode))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "psm {}", self.0)
    }
}

impl TryFrom<u8> for SegmentationMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SegmentationMode::new(value)
            .ok_or_else(|| format!("Segmentation mode out of range (0–13): {value}"))
    }
}

impl From<SegmentationMode> for u8 {
    fn from(mode: SegmentationMode) -> Self {
        mode.0
    }
}

/// Abstraction over an OCR backend.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized
/// text for one language and segmentation mode.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image_bytes: &[u8],
        language: &str,
        mode: SegmentationMode,
    ) -> Result<String, OcrError>;
}

// ── Mock backends (always available, used for tests) ─────────────────────────

/// Returns a pre-set string for every mode.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(
        &self,
        _image_bytes: &[u8],
        _language: &str,
        _mode: SegmentationMode,
    ) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

/// Returns a different transcription (or failure) per segmentation mode,
/// standing in for the way real passes disagree.
#[derive(Default)]
pub struct ScriptedRecognizer {
    outcomes: HashMap<SegmentationMode, Result<String, OcrError>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, mode: SegmentationMode, text: impl Into<String>) -> Self {
        self.outcomes.insert(mode, Ok(text.into()));
        self
    }

    pub fn with_failure(mut self, mode: SegmentationMode, error: OcrError) -> Self {
        self.outcomes.insert(mode, Err(error));
        self
    }
}

impl OcrBackend for ScriptedRecognizer {
    fn recognize(
        &self,
        _image_bytes: &[u8],
        _language: &str,
        mode: SegmentationMode,
    ) -> Result<String, OcrError> {
        self.outcomes
            .get(&mode)
            .cloned()
            .unwrap_or(Err(OcrError::UnsupportedMode(mode)))
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, SegmentationMode};
    use leptess::{LepTess, Variable};

    /// Opens a fresh engine handle per call, so concurrent passes never share
    /// engine state.
    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(
            &self,
            image_bytes: &[u8],
            language: &str,
            mode: SegmentationMode,
        ) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), language)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditPagesegMode, &mode.value().to_string())
                .map_err(|_| OcrError::UnsupportedMode(mode))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("MİGROS\nTOPLAM *5,50");
        assert_eq!(
            r.recognize(b"fake image data", "tur", SegmentationMode::AUTO).unwrap(),
            "MİGROS\nTOPLAM *5,50"
        );
    }

    #[test]
    fn mock_ignores_image_and_mode() {
        let r = MockRecognizer::new("hello");
        assert_eq!(r.recognize(b"anything", "tur", SegmentationMode::SPARSE_TEXT).unwrap(), "hello");
        assert_eq!(r.recognize(b"", "eng", SegmentationMode::SINGLE_BLOCK).unwrap(), "hello");
    }

    #[test]
    fn scripted_per_mode() {
        let r = ScriptedRecognizer::new()
            .with_text(SegmentationMode::AUTO, "auto")
            .with_failure(SegmentationMode::SINGLE_BLOCK, OcrError::Engine("boom".into()));
        assert_eq!(r.recognize(b"", "tur", SegmentationMode::AUTO).unwrap(), "auto");
        assert_eq!(
            r.recognize(b"", "tur", SegmentationMode::SINGLE_BLOCK),
            Err(OcrError::Engine("boom".into()))
        );
        assert_eq!(
            r.recognize(b"", "tur", SegmentationMode::SPARSE_TEXT),
            Err(OcrError::UnsupportedMode(SegmentationMode::SPARSE_TEXT))
        );
    }

    #[test]
    fn segmentation_mode_range() {
        assert_eq!(SegmentationMode::new(13).map(u8::from), Some(13));
        assert!(SegmentationMode::new(14).is_none());
        assert!(serde_json::from_str::<SegmentationMode>("42").is_err());
        assert_eq!(serde_json::to_string(&SegmentationMode::SPARSE_TEXT).unwrap(), "11");
    }
}
