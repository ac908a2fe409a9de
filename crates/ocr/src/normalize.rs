//! Character-level OCR repair and locale-aware number parsing.
//!
//! Every extractor funnels its captured text through these helpers, so they
//! are total: bad input comes back unchanged or as `None`, never as a panic.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Glyphs Tesseract routinely confuses with digits on thermal-printed
/// receipts, plus date separators folded onto `.`.
const CONFUSABLES: &[(char, char)] = &[
    ('O', '0'),
    ('o', '0'),
    ('I', '1'),
    ('i', '1'),
    ('İ', '1'),
    ('l', '1'),
    ('S', '5'),
    ('B', '8'),
    ('/', '.'),
    ('-', '.'),
];

/// Map visually confusable characters onto the digit they stand for.
/// Digits and periods are never remapped, so the function is a no-op on
/// already-corrected numeric text.
pub fn correct_confused_characters(text: &str) -> String {
    text.chars()
        .map(|c| {
            CONFUSABLES
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}

/// Repair single-glyph corruption in a `DD.MM.YYYY` date.
///
/// Only 10-character input is touched; anything else is returned as-is and
/// callers are expected to have filtered by shape. Separators are rewritten
/// to `.`. The year is forced into the 2000s with a decade of 0–2, and a day
/// whose tens digit cannot exist is given a leading `0`.
pub fn repair_date(date: &str) -> String {
    let chars: Vec<char> = date.chars().collect();
    if chars.len() != 10 {
        return date.to_string();
    }

    let mut day: Vec<char> = chars[0..2].to_vec();
    let month: String = chars[3..5].iter().collect();
    let mut year: Vec<char> = chars[6..10].to_vec();

    if year[..2] != ['2', '0'] {
        year[0] = '2';
        year[1] = '0';
    }
    if !matches!(year[2], '0' | '1' | '2') {
        year[2] = '2';
    }
    if !matches!(day[0], '0' | '1' | '2' | '3') {
        day[0] = '0';
    }

    let day: String = day.into_iter().collect();
    let year: String = year.into_iter().collect();
    format!("{day}.{month}.{year}")
}

/// Parse an amount written with either `,` or `.` as the decimal separator.
///
/// When both appear, the later one is the decimal separator and the other is
/// thousands grouping. A lone comma is a decimal comma. Anything that is not a
/// digit or period is then dropped. `None` means unparseable, never zero.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let normalized = match (token.rfind('.'), token.rfind(',')) {
        (Some(dot), Some(comma)) if dot > comma => token.replace(',', ""),
        (Some(_), Some(_)) => token.replace('.', "").replace(',', "."),
        (None, Some(_)) => token.replace(',', "."),
        _ => token.to_string(),
    };

    let cleaned: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Assemble an item amount from an integer part that may carry `.` grouping
/// and a two-digit fractional part.
pub fn grouped_amount(int_part: &str, frac_part: &str) -> Option<Decimal> {
    let int_part = int_part.replace('.', "");
    if int_part.is_empty() {
        return None;
    }
    Decimal::from_str(&format!("{int_part}.{frac_part}")).ok()
}
