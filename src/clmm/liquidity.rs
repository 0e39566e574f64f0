//! Liquidity <-> token amounts for a position range (LiquidityAmounts)

use alloy::primitives::{U256, U512};

use crate::error::{Error, Result};

const RESOLUTION: usize = 96;

fn q96() -> U256 {
    U256::from(1u8) << RESOLUTION
}

fn widen(value: U256) -> U512 {
    U512::from_limbs_slice(value.as_limbs())
}

/// floor(a * b / denominator) without intermediate overflow
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(Error::Clmm("mul_div by zero".to_string()));
    }
    let result = widen(a) * widen(b) / widen(denominator);
    let limbs = result.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return Err(Error::Clmm("mul_div overflow".to_string()));
    }
    Ok(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

fn ordered(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

fn to_liquidity(value: U256) -> Result<u128> {
    value
        .try_into()
        .map_err(|_| Error::Clmm(format!("Liquidity {} exceeds uint128", value)))
}

/// Liquidity provided by `amount0` of token0 across [sqrt_a, sqrt_b]
pub fn liquidity_for_amount0(sqrt_a: U256, sqrt_b: U256, amount0: U256) -> Result<u128> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);
    if sqrt_a == sqrt_b {
        return Err(Error::Clmm("Empty price range".to_string()));
    }
    let intermediate = mul_div(sqrt_a, sqrt_b, q96())?;
    to_liquidity(mul_div(amount0, intermediate, sqrt_b - sqrt_a)?)
}

/// Liquidity provided by `amount1` of token1 across [sqrt_a, sqrt_b]
pub fn liquidity_for_amount1(sqrt_a: U256, sqrt_b: U256, amount1: U256) -> Result<u128> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);
    if sqrt_a == sqrt_b {
        return Err(Error::Clmm("Empty price range".to_string()));
    }
    to_liquidity(mul_div(amount1, q96(), sqrt_b - sqrt_a)?)
}

/// Largest liquidity obtainable from both budgets at the current price
pub fn max_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_a: U256,
    sqrt_b: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);

    if sqrt_price <= sqrt_a {
        liquidity_for_amount0(sqrt_a, sqrt_b, amount0)
    } else if sqrt_price < sqrt_b {
        let liquidity0 = liquidity_for_amount0(sqrt_price, sqrt_b, amount0)?;
        let liquidity1 = liquidity_for_amount1(sqrt_a, sqrt_price, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        liquidity_for_amount1(sqrt_a, sqrt_b, amount1)
    }
}

pub fn amount0_for_liquidity(sqrt_a: U256, sqrt_b: U256, liquidity: u128) -> Result<U256> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);
    if sqrt_a.is_zero() {
        return Err(Error::Clmm("Zero sqrt price".to_string()));
    }
    let numerator = U256::from(liquidity) << RESOLUTION;
    Ok(mul_div(numerator, sqrt_b - sqrt_a, sqrt_b)? / sqrt_a)
}

pub fn amount1_for_liquidity(sqrt_a: U256, sqrt_b: U256, liquidity: u128) -> Result<U256> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);
    mul_div(U256::from(liquidity), sqrt_b - sqrt_a, q96())
}

/// Token amounts backing `liquidity` at the current price
pub fn amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_a: U256,
    sqrt_b: U256,
    liquidity: u128,
) -> Result<(U256, U256)> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);

    if sqrt_price <= sqrt_a {
        Ok((amount0_for_liquidity(sqrt_a, sqrt_b, liquidity)?, U256::ZERO))
    } else if sqrt_price < sqrt_b {
        Ok((
            amount0_for_liquidity(sqrt_price, sqrt_b, liquidity)?,
            amount1_for_liquidity(sqrt_a, sqrt_price, liquidity)?,
        ))
    } else {
        Ok((U256::ZERO, amount1_for_liquidity(sqrt_a, sqrt_b, liquidity)?))
    }
}
