use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::vat::VatRate;

/// One expense line from the body of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub vat_rate: VatRate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, vat_rate: VatRate, amount: Decimal) -> Self {
        Self { description: description.into(), vat_rate, amount }
    }
}

/// Sum of the amounts of a sequence of items. `None` if the sum overflows,
/// which only OCR noise can produce.
pub fn items_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_of_items() {
        let eight = VatRate::new(8).unwrap();
        let items = vec![
            LineItem::new("EKMEK", eight, Decimal::new(250, 2)),
            LineItem::new("SUT 1LT", eight, Decimal::new(1995, 2)),
        ];
        assert_eq!(items_total(&items), Some(Decimal::new(2245, 2)));
        assert_eq!(items_total(&[]), Some(Decimal::ZERO));
    }

    #[test]
    fn overflowing_total_is_none() {
        let items = vec![
            LineItem::new("URUNLER", VatRate::new(8).unwrap(), Decimal::MAX),
            LineItem::new("URUNLER", VatRate::new(8).unwrap(), Decimal::MAX),
        ];
        assert_eq!(items_total(&items), None);
    }

    #[test]
    fn serializes_amount_as_number() {
        let item = LineItem::new("Ekmek", VatRate::new(8).unwrap(), Decimal::new(250, 2));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["description"], "Ekmek");
        assert_eq!(json["vat_rate"], 8);
        assert_eq!(json["amount"].as_f64(), Some(2.5));
    }
}
