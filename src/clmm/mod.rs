//! Concentrated liquidity (Uniswap v3) math and position planning
//!
//! Integer math follows the v3 core/periphery libraries so that planned
//! ticks and liquidity match what the contracts compute on chain.

pub mod fee;
pub mod liquidity;
pub mod plan;
pub mod tick_math;

pub use fee::FeeTier;
pub use plan::{plan_pool, PairInfo, PoolPlan, PositionPlan};
