use serde::{Deserialize, Serialize};

pub const COPPER_WEIGHT: f64 = 0.88;
pub const TIN_WEIGHT: f64 = 0.12;

/// Monthly average metal prices in USD per tonne.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommodityMonth {
    pub month: u32,
    pub copper: f64,
    pub tin: f64,
}

impl CommodityMonth {
    /// Bronze-weighted index: copper 88%, tin 12%.
    pub fn weighted_index(&self) -> f64 {
        self.copper * COPPER_WEIGHT + self.tin * TIN_WEIGHT
    }
}
