//! Uniswap v3 fee tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pool fee tier; each tier fixes the pool's tick spacing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier {
    /// 0.01%
    Lowest,
    /// 0.05%
    #[default]
    Low,
    /// 0.3%
    Medium,
    /// 1%
    High,
}

impl FeeTier {
    /// Fee in hundredths of a basis point, as passed to the factory
    pub fn fee(&self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10_000,
        }
    }

    pub fn tick_spacing(&self) -> i32 {
        match self {
            FeeTier::Lowest => 1,
            FeeTier::Low => 10,
            FeeTier::Medium => 60,
            FeeTier::High => 200,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = self.fee() as f64 / 10_000.0;
        match self {
            FeeTier::Lowest => write!(f, "lowest ({}%)", pct),
            FeeTier::Low => write!(f, "low ({}%)", pct),
            FeeTier::Medium => write!(f, "medium ({}%)", pct),
            FeeTier::High => write!(f, "high ({}%)", pct),
        }
    }
}
