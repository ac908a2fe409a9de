use std::ops::Range;

use makbuz_core::{items_total, LineItem, VatRate};
use rust_decimal::Decimal;
use regex::Regex;

use crate::labels;
use crate::normalize::grouped_amount;

re!(re_item,
    r"^(.+?)\s+[&x*%]{0,3}\s*([14]?(?:0[018]|1[08]|20)|[018])\s.*?([\d.]+)\s*,\s*(\d{2})\D*$");

/// `3 X 10,95` style quantity expansions printed above the real item line.
re!(re_arithmetic, r"^\d+\s*[Xx]\b");

/// Descriptions shorter than this are almost always OCR debris.
const MIN_DESCRIPTION_CHARS: usize = 5;

/// Extract line items from one transcription, in source order.
pub fn parse_items(text: &str) -> Vec<LineItem> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match item_block(&lines) {
        Some(block) => lines[block].iter().filter_map(|l| parse_item_line(l)).collect(),
        None => Vec::new(),
    }
}

/// Index range of the lines between the item header and the summary block.
///
/// The header is the order-number line, else the receipt-number line, else
/// the first line (usually the merchant name). The block ends before the
/// first tax-summary line, else the first line mentioning the total, else at
/// the end. Items lie strictly between the two; `None` when the end does not
/// come after the header.
pub fn item_block(lines: &[&str]) -> Option<Range<usize>> {
    let header = lines
        .iter()
        .position(|l| labels::is_order_header(l))
        .or_else(|| lines.iter().position(|l| labels::is_receipt_header(l)));

    let end = lines
        .iter()
        .position(|l| labels::is_tax_summary(l))
        .or_else(|| lines.iter().position(|l| labels::mentions_total(l)))
        .unwrap_or(lines.len());

    let start = header.unwrap_or(0);
    (end > start).then(|| start + 1..end)
}

/// Parse a single body line: description, optional markers, VAT code, amount.
pub fn parse_item_line(line: &str) -> Option<LineItem> {
    if re_arithmetic().is_match(line) {
        return None;
    }

    let caps = re_item().captures(line)?;
    let description = caps.get(1)?.as_str().trim();
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        return None;
    }

    let vat_rate = parse_rate_token(caps.get(2)?.as_str())?;
    let amount = grouped_amount(caps.get(3)?.as_str(), caps.get(4)?.as_str())?;

    Some(LineItem::new(description, vat_rate, amount))
}

/// A three-digit token carries a spurious leading `1` or `4` (a misread `%`).
fn parse_rate_token(token: &str) -> Option<VatRate> {
    let token = match token.len() {
        3 if token.starts_with(['1', '4']) => &token[1..],
        _ => token,
    };
    VatRate::new(token.parse().ok()?)
}

// ── Cross-pass selection ──────────────────────────────────────────────────────

/// Choose one item list among the candidates produced by several passes.
///
/// With a known total the list whose sum is closest to it wins. Without one,
/// the sum reported by the most passes wins and its first list is returned.
/// Earlier candidates win ties; empty candidates and candidates whose sum
/// overflows are ignored.
pub fn select_line_items(candidates: &[Vec<LineItem>], total: Option<Decimal>) -> Vec<LineItem> {
    let non_empty = candidates
        .iter()
        .filter(|c| !c.is_empty())
        .filter_map(|c| items_total(c).map(|sum| (c, sum)));

    let chosen = match total {
        Some(total) => non_empty.fold(None, |best: Option<(&Vec<LineItem>, Decimal)>, (c, sum)| {
            let Some(diff) = sum.checked_sub(total).map(|d| d.abs()) else {
                return best;
            };
            match best {
                Some((_, best_diff)) if best_diff <= diff => best,
                _ => Some((c, diff)),
            }
        })
        .map(|(c, _)| c),
        None => {
            let mut groups: Vec<(Decimal, &Vec<LineItem>, usize)> = Vec::new();
            for (c, sum) in non_empty {
                match groups.iter_mut().find(|(s, _, _)| *s == sum) {
                    Some(group) => group.2 += 1,
                    None => groups.push((sum, c, 1)),
                }
            }
            groups
                .iter()
                .fold(None, |best: Option<&(Decimal, &Vec<LineItem>, usize)>, g| match best {
                    Some(b) if b.2 >= g.2 => best,
                    _ => Some(g),
                })
                .map(|(_, c, _)| *c)
        }
    };

    chosen.cloned().unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(desc: &str, rate: u8, amount: &str) -> LineItem {
        LineItem::new(desc, VatRate::new(rate).unwrap(), dec(amount))
    }

    const RECEIPT: &str = "MARKET A.Ş.
TARİH: 05.03.2024
FİŞ NO: 0042
Ekmek x 08 2,50
SUT 1LT 108 19,95
3 X 10,95
CIKOLATA %18 10,95
TOPKDV *2,53
TOPLAM *33,40
";

    // ── Single line ──────────────────────────────────────────────────────────

    #[test]
    fn simple_item_line() {
        assert_eq!(parse_item_line("Ekmek x 08 2,50"), Some(item("Ekmek", 8, "2.50")));
    }

    #[test]
    fn grouped_amount_and_marker() {
        assert_eq!(
            parse_item_line("DOMATES KG *18 1.234,50"),
            Some(item("DOMATES KG", 18, "1234.50"))
        );
    }

    #[test]
    fn corrupted_three_digit_rate_is_stripped() {
        assert_eq!(parse_item_line("SUT 1LT 108 19,95"), Some(item("SUT 1LT", 8, "19.95")));
        assert_eq!(parse_item_line("CIKOLATA 418 12,00"), Some(item("CIKOLATA", 18, "12.00")));
    }

    #[test]
    fn illegal_rate_is_no_item() {
        assert_eq!(parse_item_line("KALEM KUTU 15 2,50"), None);
    }

    #[test]
    fn arithmetic_lines_skipped() {
        assert_eq!(parse_item_line("3 X 10,95"), None);
        assert_eq!(parse_item_line("2x 08 4,50"), None);
    }

    #[test]
    fn short_description_rejected() {
        assert_eq!(parse_item_line("Su x 08 2,50"), None);
    }

    #[test]
    fn amount_needs_two_decimals() {
        assert_eq!(parse_item_line("Ekmek x 08 2,5"), None);
        assert_eq!(parse_item_line("Ekmek x 08 250"), None);
    }

    // ── Block ────────────────────────────────────────────────────────────────

    #[test]
    fn parses_block_between_header_and_summary() {
        let items = parse_items(RECEIPT);
        assert_eq!(
            items,
            vec![
                item("Ekmek", 8, "2.50"),
                item("SUT 1LT", 8, "19.95"),
                item("CIKOLATA", 18, "10.95"),
            ]
        );
        assert_eq!(items_total(&items), Some(dec("33.40")));
    }

    #[test]
    fn order_header_takes_precedence() {
        let lines = ["FİŞ NO: 1", "Ekmek x 08 2,50", "Sipariş Numarası: 55", "Peynir x 08 9,90", "TOPLAM 9,90"];
        assert_eq!(item_block(&lines), Some(3..4));
    }

    #[test]
    fn no_header_skips_the_first_line() {
        let text = "MIGROS MARKET x 08 2,50\nEkmek x 08 3,50\nTOPLAM 3,50";
        assert_eq!(parse_items(text), vec![item("Ekmek", 8, "3.50")]);
        assert_eq!(parse_items("Ekmek x 08 2,50"), vec![]);
        assert_eq!(item_block(&["TOPLAM 3,50"]), None);
        assert_eq!(item_block(&[]), None);
    }

    #[test]
    fn no_summary_runs_to_end() {
        let lines = ["FİŞ NO: 3", "Ekmek x 08 2,50", "Peynir x 08 9,90"];
        assert_eq!(item_block(&lines), Some(1..3));
    }

    #[test]
    fn summary_before_header_yields_nothing() {
        let text = "TOPLAM 5,00\nFİŞ NO: 12\nEkmek x 08 2,50";
        assert_eq!(item_block(&text.lines().collect::<Vec<_>>()), None);
        assert!(parse_items(text).is_empty());
    }

    #[test]
    fn blank_lines_ignored_and_empty_text_ok() {
        assert!(parse_items("").is_empty());
        assert_eq!(parse_items("MARKET\n\n\n  Ekmek x 08 2,50  \n\n").len(), 1);
    }

    // ── Selection ────────────────────────────────────────────────────────────

    #[test]
    fn selection_prefers_sum_closest_to_total() {
        let a = vec![item("Ekmek", 8, "2.50")];
        let b = vec![item("Ekmek", 8, "2.50"), item("Peynir", 8, "9.90")];
        let chosen = select_line_items(&[a, b.clone(), vec![]], Some(dec("12.40")));
        assert_eq!(chosen, b);
    }

    #[test]
    fn selection_ties_go_to_earliest() {
        let a = vec![item("Ekmek", 8, "10.00")];
        let b = vec![item("Simit", 8, "14.00")];
        assert_eq!(select_line_items(&[a.clone(), b], Some(dec("12.00"))), a);
    }

    #[test]
    fn selection_without_total_uses_most_common_sum() {
        let a = vec![item("Ekmek", 8, "2.50")];
        let b = vec![item("Peynir", 8, "9.90")];
        let b2 = vec![item("Peynir kg", 8, "9.90")];
        let chosen = select_line_items(&[a, b.clone(), b2], None);
        assert_eq!(chosen, b);
    }

    #[test]
    fn overflowing_candidates_are_skipped() {
        let huge = dec("9999999999999999999999999999");
        let noisy: Vec<LineItem> = (0..10).map(|_| LineItem::new("URUNLER", VatRate::new(8).unwrap(), huge)).collect();
        let sane = vec![item("Ekmek", 8, "2.50")];

        assert_eq!(select_line_items(&[noisy.clone(), sane.clone()], Some(dec("2.50"))), sane);
        assert_eq!(select_line_items(&[noisy.clone(), sane.clone()], None), sane);
        assert!(select_line_items(&[noisy], None).is_empty());
    }

    #[test]
    fn selection_of_nothing_is_empty() {
        assert!(select_line_items(&[], None).is_empty());
        assert!(select_line_items(&[vec![], vec![]], Some(dec("5.00"))).is_empty());
    }
}
