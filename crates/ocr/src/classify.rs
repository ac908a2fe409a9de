use makbuz_core::DocumentKind;

use crate::labels;

/// Whether the transcription carries a receipt-number label anywhere.
pub fn is_receipt(text: &str) -> bool {
    labels::has_receipt_label(text)
}

/// Classify a document from all of its transcriptions. One pass that sees
/// the receipt label is enough.
pub fn classify<S: AsRef<str>>(transcriptions: &[S]) -> DocumentKind {
    if transcriptions.iter().any(|t| is_receipt(t.as_ref())) {
        DocumentKind::Receipt
    } else {
        DocumentKind::Invoice
    }
}
