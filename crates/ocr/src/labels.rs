//! Label regexes shared by the extractor, the item parser and the classifier.
//!
//! Labels are matched loosely: thermal printers and Tesseract together turn
//! `FİŞ NO` into `F1S NO`, `FIS N0`, `F|Ş NO` and worse.

use regex::Regex;

re!(re_receipt_label, concat!("(?i)", receipt_label!()));

re!(re_receipt_header, concat!("(?i)", receipt_label!(), r"\s*:?\s*\d+"));

re!(re_order_header, r"(?i)sipari[şs]\s+numara(?:sı|si)");

re!(re_tax_summary,
    r"(?i)(?:toplam\s+kdv|topkdv|topkdu|topvp|topkov|topkdy|topkdi|toopkdv|topküv|topkdw|topkdı|topkvu|topkd)");

re!(re_total_word, r"(?i)\btoplam\b");

/// Compound labels that merely contain "toplam" (sub-total, VAT total, …),
/// including their common misreads, when they end the text before a match.
re!(re_compound_total_prefix,
    r"(?i)(?:ara|4ra|afa|kdv(?:['’`´]l[iıİ]?)?|kdu|kdy|kdi|kdw|kdn|kdx)\s\z");

pub fn has_receipt_label(text: &str) -> bool {
    re_receipt_label().is_match(text)
}

pub fn is_receipt_header(line: &str) -> bool {
    re_receipt_header().is_match(line)
}

pub fn is_order_header(line: &str) -> bool {
    re_order_header().is_match(line)
}

pub fn is_tax_summary(line: &str) -> bool {
    re_tax_summary().is_match(line)
}

pub fn mentions_total(line: &str) -> bool {
    re_total_word().is_match(line)
}

/// Whether `preceding` ends with a compound total label and a single space,
/// i.e. a `toplam` starting right after it is not the grand total.
pub fn ends_with_compound_total_label(preceding: &str) -> bool {
    re_compound_total_prefix().is_match(preceding)
}
