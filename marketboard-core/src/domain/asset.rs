use serde::{Deserialize, Serialize};

/// Asset category of a board. Drives how price ranges are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    Equity,
    Index,
    Forex,
    Crypto,
    Commodity,
}

impl AssetClass {
    /// Number of decimals used when formatting low/high ranges.
    ///
    /// FX rates are quoted to four decimals; everything else is priced in
    /// whole currency units.
    pub fn price_precision(self) -> usize {
        match self {
            AssetClass::Forex => 4,
            AssetClass::Equity | AssetClass::Index | AssetClass::Crypto | AssetClass::Commodity => 2,
        }
    }
}
