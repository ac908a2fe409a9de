//! Majority vote across the field maps of several recognition passes.

use std::collections::BTreeSet;
use std::str::FromStr;

use makbuz_core::{FieldMap, FieldName, FieldValue};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("No passes to merge: a consensus needs at least one field map")]
    NoPasses,
}

/// Leading digits Tesseract inserts in front of amounts, usually a misread
/// currency or `*` glyph.
const ARTIFACT_DIGITS: [char; 2] = ['1', '4'];

/// Merge per-pass field maps into one consensus map.
///
/// Each field present in any pass is voted on independently; a pass that
/// lacks the key votes null. Values are ranked by vote count, ties going to
/// the value seen first. Null can win. For amounts, if dropping a leading
/// `1` or `4` from one of the two leading candidates gives an amount some
/// pass read, that amount wins regardless of its own vote count.
pub fn merge_fields(passes: &[FieldMap]) -> Result<FieldMap, MergeError> {
    if passes.is_empty() {
        return Err(MergeError::NoPasses);
    }

    let names: BTreeSet<FieldName> = passes.iter().flat_map(FieldMap::names).collect();

    Ok(names
        .into_iter()
        .map(|name| {
            let votes = passes.iter().map(|p| p.get(name));
            (name, consensus(name, votes).cloned())
        })
        .collect())
}

/// Distinct votes with their counts, ordered by count then first appearance.
pub fn rank_votes<'a>(
    votes: impl IntoIterator<Item = Option<&'a FieldValue>>,
) -> Vec<(Option<&'a FieldValue>, usize)> {
    let mut tally: Vec<(Option<&FieldValue>, usize)> = Vec::new();
    for vote in votes {
        match tally.iter_mut().find(|(v, _)| *v == vote) {
            Some(entry) => entry.1 += 1,
            None => tally.push((vote, 1)),
        }
    }
    // Stable: equal counts keep first-seen order.
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
}

fn consensus<'a>(
    name: FieldName,
    votes: impl IntoIterator<Item = Option<&'a FieldValue>>,
) -> Option<&'a FieldValue> {
    let ranked = rank_votes(votes);
    let (winner, _) = *ranked.first()?;

    for (candidate, _) in ranked.iter().take(2) {
        let Some(stripped) = candidate.and_then(strip_artifact_digit) else {
            continue;
        };
        if let Some((original, _)) = ranked
            .iter()
            .find(|(v, _)| v.and_then(FieldValue::as_amount) == Some(stripped))
        {
            debug!(field = %name, from = ?candidate, to = ?original, "leading-digit override");
            return *original;
        }
    }

    winner
}

/// The amount obtained by dropping a leading `1`/`4` from the two-decimal
/// rendering of `value`, if it has one and the rest is still a number.
pub fn strip_artifact_digit(value: &FieldValue) -> Option<Decimal> {
    let FieldValue::Amount(amount) = value else {
        return None;
    };
    let text = format!("{amount:.2}");
    let rest = text.strip_prefix(ARTIFACT_DIGITS)?;
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(rest).ok()
}
