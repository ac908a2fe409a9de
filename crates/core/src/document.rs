use serde::{Deserialize, Serialize};
use std::fmt;

/// The two document families the extractor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Retail receipt (fiş), identified by its receipt-number label.
    Receipt,
    /// Invoice (fatura).
    Invoice,
}

impl DocumentKind {
    pub fn is_receipt(self) -> bool {
        matches!(self, DocumentKind::Receipt)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Receipt => write!(f, "receipt"),
            DocumentKind::Invoice => write!(f, "invoice"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receipt" | "fiş" | "fis" => Ok(DocumentKind::Receipt),
            "invoice" | "fatura" => Ok(DocumentKind::Invoice),
            other => Err(format!("Unknown document kind: '{other}'")),
        }
    }
}
