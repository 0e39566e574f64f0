//! Pool and position ladder planning
//!
//! Prices in configuration are human "WETH per token". Uniswap stores the
//! raw ratio token1/token0 in smallest units, so the plan first orders the
//! pair, then converts every price into that convention before taking ticks.

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::debug;

use super::fee::FeeTier;
use super::liquidity::{amounts_for_liquidity, max_liquidity_for_amounts};
use super::tick_math::{
    nearest_usable_tick, price_to_tick, sqrt_ratio_at_tick, tick_at_sqrt_ratio, MAX_SQRT_RATIO,
    MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};
use crate::config::ClmmConfig;
use crate::error::{Error, Result};

/// Inputs that do not come from configuration
#[derive(Debug, Clone, Copy)]
pub struct PairInfo {
    pub token: Address,
    pub token_decimals: u8,
    pub weth: Address,
}

/// One concentrated position of the ladder
#[derive(Debug, Clone, Serialize)]
pub struct PositionPlan {
    pub index: u32,
    /// WETH per token
    pub lower_price: f64,
    pub upper_price: f64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolPlan {
    pub token0: Address,
    pub token1: Address,
    pub token_is_token0: bool,
    pub fee_tier: FeeTier,
    pub initial_price: f64,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub positions: Vec<PositionPlan>,
}

impl PoolPlan {
    /// Total (token, WETH) the ladder needs, in raw units
    pub fn totals(&self) -> (U256, U256) {
        let (sum0, sum1) = self
            .positions
            .iter()
            .fold((U256::ZERO, U256::ZERO), |(a, b), p| {
                (a + p.amount0, b + p.amount1)
            });
        if self.token_is_token0 {
            (sum0, sum1)
        } else {
            (sum1, sum0)
        }
    }
}

/// Converts human WETH-per-token prices into the pool's raw token1/token0
struct PriceScale {
    token_is_token0: bool,
    /// 10^(weth_decimals - token_decimals)
    decimals_factor: f64,
}

impl PriceScale {
    fn raw(&self, weth_per_token: f64) -> f64 {
        let raw = weth_per_token * self.decimals_factor;
        if self.token_is_token0 {
            raw
        } else {
            1.0 / raw
        }
    }

    /// Tick range for a human price range; inversion swaps the bounds
    fn tick_range(&self, lower: f64, upper: f64, spacing: i32) -> Result<(i32, i32)> {
        let (a, b) = (self.raw(lower), self.raw(upper));
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let min_usable = nearest_usable_tick(MIN_TICK, spacing);
        let max_usable = nearest_usable_tick(MAX_TICK, spacing);

        let tick_lower = nearest_usable_tick(price_to_tick(lo)?, spacing).max(min_usable);
        let mut tick_upper = nearest_usable_tick(price_to_tick(hi)?, spacing).min(max_usable);
        if tick_upper <= tick_lower {
            tick_upper = tick_lower + spacing;
        }
        if tick_upper > max_usable {
            return Err(Error::Clmm(format!(
                "Price range {}..{} is outside the usable ticks",
                lower, upper
            )));
        }
        Ok((tick_lower, tick_upper))
    }
}

/// sqrt(price) * 2^96 for a raw token1/token0 price
pub fn encode_sqrt_price_x96(price: f64) -> Result<U256> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::Clmm(format!("Invalid price {}", price)));
    }
    let value = f64_to_u256(price.sqrt() * 2f64.powi(96))
        .ok_or_else(|| Error::Clmm(format!("Price {} overflows sqrtPriceX96", price)))?;

    if value < MIN_SQRT_RATIO || value >= MAX_SQRT_RATIO {
        return Err(Error::Clmm(format!(
            "Price {} outside the representable range",
            price
        )));
    }
    Ok(value)
}

/// Truncating conversion of a non-negative finite float
fn f64_to_u256(value: f64) -> Option<U256> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value < 1.0 {
        return Some(U256::ZERO);
    }

    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);

    if exponent >= 0 {
        if exponent > 256 - 53 {
            return None;
        }
        Some(U256::from(mantissa) << exponent as usize)
    } else {
        Some(U256::from(mantissa >> (-exponent) as u32))
    }
}

/// Human amount to raw units, truncating
pub fn to_raw_amount(amount: f64, decimals: u8) -> Result<U256> {
    f64_to_u256(amount * 10f64.powi(decimals as i32))
        .ok_or_else(|| Error::Clmm(format!("Invalid amount {}", amount)))
}

/// Build the pool initialization and the position ladder
pub fn plan_pool(config: &ClmmConfig, pair: PairInfo) -> Result<PoolPlan> {
    if pair.token == pair.weth {
        return Err(Error::Clmm("Token and WETH are the same address".to_string()));
    }
    if config.initial_price <= 0.0 || config.price_range_multiplier <= 1.0 {
        return Err(Error::Clmm(
            "initial_price must be positive and multiplier greater than 1".to_string(),
        ));
    }

    let token_is_token0 = pair.token < pair.weth;
    let (token0, token1) = if token_is_token0 {
        (pair.token, pair.weth)
    } else {
        (pair.weth, pair.token)
    };

    let scale = PriceScale {
        token_is_token0,
        decimals_factor: 10f64.powi(config.weth_decimals as i32 - pair.token_decimals as i32),
    };

    let sqrt_price_x96 = encode_sqrt_price_x96(scale.raw(config.initial_price))?;
    let tick = tick_at_sqrt_ratio(sqrt_price_x96)?;
    let spacing = config.fee_tier.tick_spacing();

    debug!(
        "Pool {}/{} fee {} sqrtPriceX96 {} tick {}",
        token0, token1, config.fee_tier, sqrt_price_x96, tick
    );

    let mut positions = Vec::with_capacity(config.num_positions as usize);
    let mut lower_price = config.initial_price;

    for index in 0..config.num_positions {
        let upper_price = lower_price * config.price_range_multiplier;

        // Halve the WETH budget for each wider, higher range
        let weth_amount = config.base_weth_amount / 2f64.powi(index as i32);
        let token_amount = weth_amount / lower_price;

        let weth_raw = to_raw_amount(weth_amount, config.weth_decimals)?;
        let token_raw = to_raw_amount(token_amount, pair.token_decimals)?;
        let (budget0, budget1) = if token_is_token0 {
            (token_raw, weth_raw)
        } else {
            (weth_raw, token_raw)
        };

        let (tick_lower, tick_upper) = scale.tick_range(lower_price, upper_price, spacing)?;
        let sqrt_a = sqrt_ratio_at_tick(tick_lower)?;
        let sqrt_b = sqrt_ratio_at_tick(tick_upper)?;

        let liquidity =
            max_liquidity_for_amounts(sqrt_price_x96, sqrt_a, sqrt_b, budget0, budget1)?;
        let (amount0, amount1) = amounts_for_liquidity(sqrt_price_x96, sqrt_a, sqrt_b, liquidity)?;

        positions.push(PositionPlan {
            index,
            lower_price,
            upper_price,
            tick_lower,
            tick_upper,
            liquidity,
            amount0,
            amount1,
        });

        lower_price = upper_price;
    }

    Ok(PoolPlan {
        token0,
        token1,
        token_is_token0,
        fee_tier: config.fee_tier,
        initial_price: config.initial_price,
        sqrt_price_x96,
        tick,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn weth() -> Address {
        Address::from_str("0x4200000000000000000000000000000000000006").unwrap()
    }

    fn pair(token: &str) -> PairInfo {
        PairInfo {
            token: Address::from_str(token).unwrap(),
            token_decimals: 6,
            weth: weth(),
        }
    }

    #[test]
    fn test_encode_sqrt_price() {
        let one = encode_sqrt_price_x96(1.0).unwrap();
        assert_eq!(one, U256::from(1u8) << 96);
        assert_eq!(tick_at_sqrt_ratio(one).unwrap(), 0);

        let four = encode_sqrt_price_x96(4.0).unwrap();
        assert_eq!(four, U256::from(2u8) << 96);

        assert!(encode_sqrt_price_x96(0.0).is_err());
        assert!(encode_sqrt_price_x96(1e300).is_err());
    }

    #[test]
    fn test_f64_to_u256() {
        assert_eq!(f64_to_u256(0.5), Some(U256::ZERO));
        assert_eq!(f64_to_u256(12345.9), Some(U256::from(12345u32)));
        assert_eq!(f64_to_u256(2f64.powi(100)), Some(U256::from(1u8) << 100));
        assert_eq!(f64_to_u256(-1.0), None);
        assert_eq!(f64_to_u256(f64::INFINITY), None);
    }

    #[test]
    fn test_to_raw_amount() {
        assert_eq!(
            to_raw_amount(0.01, 18).unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert_eq!(to_raw_amount(2.5, 6).unwrap(), U256::from(2_500_000u64));
    }

    #[test]
    fn test_token_below_weth_is_token0() {
        let config = ClmmConfig::default();
        let plan = plan_pool(&config, pair("0x0000000000000000000000000000000000000001")).unwrap();

        assert!(plan.token_is_token0);
        assert_eq!(plan.token1, weth());
        assert_eq!(plan.positions.len(), 5);

        // raw price = 0.04 * 10^12 = 4e10 WETH-wei per token unit
        let expected_tick = price_to_tick(4e10).unwrap();
        assert!((plan.tick - expected_tick).abs() <= 1);

        for window in plan.positions.windows(2) {
            assert!(window[0].tick_upper <= window[1].tick_lower + 10);
            assert!(window[1].tick_lower > window[0].tick_lower);
        }
        for position in &plan.positions {
            assert_eq!(position.tick_lower % 10, 0);
            assert_eq!(position.tick_upper % 10, 0);
            assert!(position.liquidity > 0);
        }

        // ranges sit at or above the starting price: mostly token, little WETH
        let (token_total, weth_total) = plan.totals();
        assert!(token_total > U256::ZERO);
        assert!(weth_total <= to_raw_amount(config.base_weth_amount, 18).unwrap());
    }

    #[test]
    fn test_token_above_weth_inverts_price() {
        let config = ClmmConfig::default();
        let plan = plan_pool(&config, pair("0xffffffffffffffffffffffffffffffffffffffff")).unwrap();

        assert!(!plan.token_is_token0);
        assert_eq!(plan.token0, weth());
        assert!(plan.tick < 0);
        let expected_tick = price_to_tick(1.0 / 4e10).unwrap();
        assert!((plan.tick - expected_tick).abs() <= 1);

        // higher WETH prices mean lower ticks once inverted
        assert!(plan.positions[1].tick_upper <= plan.positions[0].tick_lower + 10);
        for position in &plan.positions {
            assert!(position.tick_lower < position.tick_upper);
        }
        let (token_total, _) = plan.totals();
        assert!(token_total > U256::ZERO);
    }

    #[test]
    fn test_budgets_halve() {
        let config = ClmmConfig {
            num_positions: 3,
            ..ClmmConfig::default()
        };
        let plan = plan_pool(&config, pair("0x0000000000000000000000000000000000000001")).unwrap();
        assert_eq!(plan.positions.len(), 3);
        assert_eq!(plan.positions[0].lower_price, 0.04);
        assert_eq!(plan.positions[2].upper_price, 0.32);
    }

    #[test]
    fn test_rejects_same_token() {
        let config = ClmmConfig::default();
        let pair = PairInfo {
            token: weth(),
            token_decimals: 18,
            weth: weth(),
        };
        assert!(plan_pool(&config, pair).is_err());
    }
}
