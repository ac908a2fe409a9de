use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::vat::VatRate;

/// The fixed set of fields extracted from a document. Declaration order is
/// the order fields appear in every [`FieldMap`] and in serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Document date (Tarih), canonical `DD.MM.YYYY`.
    Date,
    /// Receipt number (Fiş No).
    ReceiptNumber,
    /// Grand total (Toplam).
    Total,
    /// Total VAT (Toplam KDV).
    TaxTotal,
    /// VAT rate code (KDV Oranı).
    VatRate,
    /// Invoice number (Fatura No).
    InvoiceNumber,
    /// Trade registry number (Ticaret Sicil No).
    TradeRegistryNumber,
    /// Central registry system number (Mersis No).
    MersisNumber,
    /// E-invoice unique transaction number (ETTN).
    Ettn,
    /// Tax identification number (Vergi Kimlik No).
    TaxId,
}

impl FieldName {
    pub const ALL: [FieldName; 10] = [
        FieldName::Date,
        FieldName::ReceiptNumber,
        FieldName::Total,
        FieldName::TaxTotal,
        FieldName::VatRate,
        FieldName::InvoiceNumber,
        FieldName::TradeRegistryNumber,
        FieldName::MersisNumber,
        FieldName::Ettn,
        FieldName::TaxId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Date => "date",
            FieldName::ReceiptNumber => "receipt_number",
            FieldName::Total => "total",
            FieldName::TaxTotal => "tax_total",
            FieldName::VatRate => "vat_rate",
            FieldName::InvoiceNumber => "invoice_number",
            FieldName::TradeRegistryNumber => "trade_registry_number",
            FieldName::MersisNumber => "mersis_number",
            FieldName::Ettn => "ettn",
            FieldName::TaxId => "tax_id",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown field: '{s}'"))
    }
}

/// A validated field value. Raw OCR text never reaches this type: each variant
/// is only produced after the owning field's normalization step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Canonical `DD.MM.YYYY`.
    Date(String),
    Amount(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Rate(VatRate),
    Text(String),
}

impl FieldValue {
    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Date(s) | FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Date(s) | FieldValue::Text(s) => f.write_str(s),
            FieldValue::Amount(d) => write!(f, "{d:.2}"),
            FieldValue::Rate(r) => write!(f, "{r}"),
        }
    }
}

/// Field name → validated value or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<FieldName, Option<FieldValue>>);

impl FieldMap {
    /// Every known field present and null.
    pub fn seeded() -> Self {
        FieldName::ALL.into_iter().map(|name| (name, None)).collect()
    }

    pub fn get(&self, name: FieldName) -> Option<&FieldValue> {
        self.0.get(&name).and_then(Option::as_ref)
    }

    /// Whether the key is present, null or not.
    pub fn contains(&self, name: FieldName) -> bool {
        self.0.contains_key(&name)
    }

    pub fn set(&mut self, name: FieldName, value: FieldValue) {
        self.0.insert(name, Some(value));
    }

    pub fn insert(&mut self, name: FieldName, value: Option<FieldValue>) {
        self.0.insert(name, value);
    }

    pub fn clear(&mut self, name: FieldName) {
        if let Some(slot) = self.0.get_mut(&name) {
            *slot = None;
        }
    }

    pub fn names(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, Option<&FieldValue>)> {
        self.0.iter().map(|(k, v)| (*k, v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields holding a value.
    pub fn filled(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }

    /// The document date as a calendar date, if present and real.
    pub fn date(&self) -> Option<NaiveDate> {
        let s = self.get(FieldName::Date)?.as_str()?;
        NaiveDate::parse_from_str(s, "%d.%m.%Y").ok()
    }

    pub fn total(&self) -> Option<Decimal> {
        self.get(FieldName::Total)?.as_amount()
    }
}

impl FromIterator<(FieldName, Option<FieldValue>)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (FieldName, Option<FieldValue>)>>(iter: I) -> Self {
        FieldMap(iter.into_iter().collect())
    }
}
