use serde::{Deserialize, Serialize};
use std::fmt;

/// A Turkish VAT (KDV) rate category. Only the legal percentages can be
/// constructed; anything else read off a document is rejected, never rounded
/// to the nearest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VatRate(u8);

impl VatRate {
    pub const LEGAL: [u8; 6] = [0, 1, 8, 10, 18, 20];

    pub fn new(percent: u8) -> Option<Self> {
        Self::LEGAL.contains(&percent).then_some(VatRate(percent))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for VatRate {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        VatRate::new(value).ok_or_else(|| format!("Illegal VAT rate: {value}"))
    }
}

impl From<VatRate> for u8 {
    fn from(rate: VatRate) -> Self {
        rate.0
    }
}

impl std::str::FromStr for VatRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("Not a VAT rate: '{s}'"))?;
        VatRate::try_from(n)
    }
}
