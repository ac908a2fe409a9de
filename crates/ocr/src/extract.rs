use std::sync::OnceLock;

use makbuz_core::{DocumentKind, FieldMap, FieldName, FieldValue, VatRate};
use regex::Regex;
use tracing::debug;

use crate::labels;
use crate::normalize::{correct_confused_characters, parse_amount, repair_date};

/// Tax IDs that show up on nearly every scanned document without belonging to
/// the issuer: the receiving company's own VKN, printed in the buyer block.
pub const DENYLISTED_TAX_IDS: &[&str] = &["5240008809"];

/// Invoice series prefixes are at most this many letters.
const MAX_SERIES_CHARS: usize = 4;

// ── Rule table ───────────────────────────────────────────────────────────────

/// Which document family a rule is searched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    Receipt,
    Invoice,
}

impl Scope {
    pub fn admits(self, kind: DocumentKind) -> bool {
        match self {
            Scope::Any => true,
            Scope::Receipt => kind == DocumentKind::Receipt,
            Scope::Invoice => kind == DocumentKind::Invoice,
        }
    }
}

/// Extra condition on the text preceding a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Free,
    /// Reject a `toplam` that is the tail of a compound label such as
    /// `ARA TOPLAM` or `KDV'Lİ TOPLAM`.
    NotCompoundTotal,
}

impl Context {
    fn admits(self, preceding: &str) -> bool {
        match self {
            Context::Free => true,
            Context::NotCompoundTotal => !labels::ends_with_compound_total_label(preceding),
        }
    }
}

/// How a captured substring becomes a validated [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Glyph correction, then date repair; must end up digits and periods.
    Date,
    /// Glyph correction, then locale-aware amount parsing.
    Amount,
    /// Glyph correction, then a legal VAT code or nothing.
    VatRate,
    /// Glyph correction, digits only, denylist applied.
    TaxId,
    /// Glyph correction only.
    Text,
    /// Letter series plus number: separators dropped, series upper-cased,
    /// glyph correction on the number, which must end up all digits.
    SeriesNumber,
    /// Hex UUID: lower-cased. The capture admits only hex digits and
    /// hyphens, which glyph correction would rewrite (`B`, `-`), so none is
    /// applied.
    Uuid,
}

impl Normalizer {
    pub fn apply(self, raw: &str) -> Option<FieldValue> {
        match self {
            Normalizer::Date => {
                let fixed = correct_confused_characters(raw);
                if !fixed.chars().all(|c| c.is_ascii_digit() || c == '.') {
                    return None;
                }
                Some(FieldValue::Date(repair_date(&fixed)))
            }
            Normalizer::Amount => {
                parse_amount(&correct_confused_characters(raw)).map(FieldValue::Amount)
            }
            Normalizer::VatRate => correct_confused_characters(raw)
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(VatRate::new)
                .map(FieldValue::Rate),
            Normalizer::TaxId => {
                let digits: String = correct_confused_characters(raw)
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                if digits.is_empty() || DENYLISTED_TAX_IDS.contains(&digits.as_str()) {
                    return None;
                }
                Some(FieldValue::Text(digits))
            }
            Normalizer::Text => {
                Some(FieldValue::Text(correct_confused_characters(raw).trim().to_string()))
            }
            Normalizer::SeriesNumber => {
                let compact: String =
                    raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
                let split = compact
                    .char_indices()
                    .enumerate()
                    .find(|&(n, (_, c))| n == MAX_SERIES_CHARS || c.is_ascii_digit())
                    .map_or(compact.len(), |(_, (i, _))| i);
                let (series, number) = compact.split_at(split);
                let number = correct_confused_characters(number);
                let all_digits = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
                if series.is_empty() || !all_digits {
                    return None;
                }
                Some(FieldValue::Text(format!("{}{number}", series.to_uppercase())))
            }
            Normalizer::Uuid => Some(FieldValue::Text(raw.to_lowercase())),
        }
    }
}

/// One row of the extraction table. `patterns` are tried in order and the
/// first one that matches decides the field; group 1 holds the value.
#[derive(Debug)]
pub struct FieldRule {
    pub field: FieldName,
    pub scope: Scope,
    pub patterns: &'static [&'static str],
    pub context: Context,
    pub normalizer: Normalizer,
    compiled: OnceLock<Vec<Regex>>,
}

pub static RULES: [FieldRule; 10] = [
    FieldRule::new(
        FieldName::Date,
        Scope::Any,
        &[r"\b([\dOoIilİSB]{2}[./-][\dOoIilİSB]{2}[./-][\dOoIilİSB]{4})\b"],
        Context::Free,
        Normalizer::Date,
    ),
    FieldRule::new(
        FieldName::ReceiptNumber,
        Scope::Receipt,
        &[concat!("(?i)", receipt_label!(), r"[^\d\n]{0,5}\s*(\d{1,4})\b")],
        Context::Free,
        Normalizer::Text,
    ),
    FieldRule::new(
        FieldName::Total,
        Scope::Any,
        &[r"(?i)\btoplam(?:\s+tutar)?\b[^\d]{0,3}[*x»:/-]?\s*([\dOolIıİi., \t]{1,20}\d)"],
        Context::NotCompoundTotal,
        Normalizer::Amount,
    ),
    FieldRule::new(
        FieldName::TaxTotal,
        Scope::Any,
        &[concat!(
            r"(?i)(?:toplam\s+kdv|topkdv|topkdu|topvp|topkov|topkdy|topkdi|toopkdv|topküv|topkdw|topkdı|topkvu|topkd)",
            r"[^\dO]{0,3}[*x»]?\s*([\dOolIıİi., \t]{1,15}\d)"
        )],
        Context::Free,
        Normalizer::Amount,
    ),
    FieldRule::new(
        FieldName::VatRate,
        Scope::Invoice,
        &[r"(?i)kdv\s*oran[ıiİl1][^\d\n]{0,40}(?:\n[^\d\n]{0,40}){0,3}[^0-9]{0,10}(\d{1,2})\b"],
        Context::Free,
        Normalizer::VatRate,
    ),
    FieldRule::new(
        FieldName::InvoiceNumber,
        Scope::Invoice,
        &[
            r"(?i)(?:fatura\s*(?:no|nu|n0)|fat\s*no)[^\w]{0,4}[:\-]?\s*([A-ZİŞĞÜÇÖ]{1,4}[\s\-]?[\dOoIilİSB]{10,16})",
            r"\b[İIı]?\s*([A-ZİŞĞÜÇÖ]{3}\d{13})\b",
        ],
        Context::Free,
        Normalizer::SeriesNumber,
    ),
    FieldRule::new(
        FieldName::TradeRegistryNumber,
        Scope::Any,
        &[concat!(
            r"(?i)(?:ticaret\s*sicil\s*no|t\.?\s*s\.?\s*no|tic\s*sic\s*no|tsn|sicil\s*no)",
            r"[^\d]{0,3}[*x»:]?\s*([\dOolIıİi]{6})\b"
        )],
        Context::Free,
        Normalizer::Text,
    ),
    FieldRule::new(
        FieldName::MersisNumber,
        Scope::Any,
        &[r"(?i)(?:mersis\s*no|mersis\s*number|mersis\s*nu|mers\s*no)[^\d]{0,3}[*x»:]?\s*(\d{16})\b"],
        Context::Free,
        Normalizer::Text,
    ),
    FieldRule::new(
        FieldName::Ettn,
        Scope::Any,
        &[concat!(
            r"[eEfF][\s.:,;_-]*[tT1İil][\s.:,;_-]*[tT1İil][\s.:,;_-]*[nNhHmM][\s.:,;_-]*[:\-]?\s*",
            r"([a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})"
        )],
        Context::Free,
        Normalizer::Uuid,
    ),
    FieldRule::new(
        FieldName::TaxId,
        Scope::Any,
        &[r"(?i)(?:vergi\s*kimlik\s*no|vkn)[^\dOolIıİ]{0,3}[*x»:]?\s*([0-9OolIıİ]{10})\b"],
        Context::Free,
        Normalizer::TaxId,
    ),
];

impl FieldRule {
    pub const fn new(
        field: FieldName,
        scope: Scope,
        patterns: &'static [&'static str],
        context: Context,
        normalizer: Normalizer,
    ) -> Self {
        Self { field, scope, patterns, context, normalizer, compiled: OnceLock::new() }
    }

    fn regexes(&self) -> &[Regex] {
        self.compiled.get_or_init(|| {
            self.patterns
                .iter()
                .map(|p| Regex::new(p).expect("invalid regex"))
                .collect()
        })
    }

    /// The raw captured value for this rule, before normalization.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regexes()
            .iter()
            .find_map(|re| first_admitted_capture(re, text, self.context))
    }

    /// Match and normalize. `None` covers both a miss and a rejected value.
    pub fn apply(&self, text: &str) -> Option<FieldValue> {
        let raw = self.capture(text)?;
        let value = self.normalizer.apply(raw);
        if value.is_none() {
            debug!(field = %self.field, raw, "captured value rejected");
        }
        value
    }
}

/// First match of `re` whose preceding text satisfies `context`.
fn first_admitted_capture<'t>(re: &Regex, text: &'t str, context: Context) -> Option<&'t str> {
    let mut at = 0;
    while at <= text.len() {
        let caps = re.captures_at(text, at)?;
        let whole = caps.get(0)?;
        if context.admits(&text[..whole.start()]) {
            return caps.get(1).map(|m| m.as_str());
        }
        at = whole.start()
            + text[whole.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
    }
    None
}

// ── Public extraction API ────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Run every rule over one transcription.
    pub fn extract(text: &str) -> FieldMap {
        Self::extract_with(text, |_| true)
    }

    /// Run only the rules that apply to `kind`.
    pub fn extract_for(text: &str, kind: DocumentKind) -> FieldMap {
        Self::extract_with(text, |rule| rule.scope.admits(kind))
    }

    fn extract_with(text: &str, wanted: impl Fn(&FieldRule) -> bool) -> FieldMap {
        let mut fields = FieldMap::seeded();
        for rule in RULES.iter().filter(|r| wanted(r)) {
            if let Some(value) = rule.apply(text) {
                fields.set(rule.field, value);
            }
        }
        fields
    }

    pub fn rule(field: FieldName) -> Option<&'static FieldRule> {
        RULES.iter().find(|r| r.field == field)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
