//! Tick <-> sqrt price conversion (Q64.96), bit-exact with Uniswap's TickMath

use alloy::primitives::U256;

use crate::error::{Error, Result};

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// `sqrt_ratio_at_tick(MIN_TICK)`
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);

/// `sqrt_ratio_at_tick(MAX_TICK)`
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    0x5d951d5263988d26,
    0xefd1fc6a50648849,
    0x00000000fffd8963,
    0,
]);

/// 1/sqrt(1.0001)^(2^i) as Q128.128 for bit i of |tick|
const RATIO_MULTIPLIERS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// sqrt(1.0001^tick) * 2^96
pub fn sqrt_ratio_at_tick(tick: i32) -> Result<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(Error::Clmm(format!("Tick {} out of range", tick)));
    }

    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u8) << 128
    };

    for (bit, multiplier) in RATIO_MULTIPLIERS {
        if abs_tick & bit != 0 {
            ratio = (ratio * U256::from(multiplier)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let round_up = if ratio & U256::from(u32::MAX) == U256::ZERO {
        U256::ZERO
    } else {
        U256::from(1u8)
    };
    Ok((ratio >> 32) + round_up)
}

/// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`
pub fn tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(Error::Clmm(format!(
            "sqrt price {} out of range",
            sqrt_price_x96
        )));
    }

    // sqrt_ratio_at_tick is strictly increasing
    let (mut lo, mut hi) = (MIN_TICK, MAX_TICK);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Round to the closest multiple of `tick_spacing` (halves round up),
/// staying within [MIN_TICK, MAX_TICK]
pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> i32 {
    let quotient = tick.div_euclid(tick_spacing);
    let remainder = tick.rem_euclid(tick_spacing);
    let rounded = if remainder * 2 >= tick_spacing {
        (quotient + 1) * tick_spacing
    } else {
        quotient * tick_spacing
    };

    if rounded < MIN_TICK {
        rounded + tick_spacing
    } else if rounded > MAX_TICK {
        rounded - tick_spacing
    } else {
        rounded
    }
}

/// floor(log_1.0001(price)); `price` is a raw token1/token0 ratio
pub fn price_to_tick(price: f64) -> Result<i32> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::Clmm(format!("Invalid price {}", price)));
    }
    let tick = (price.ln() / 1.0001f64.ln()).floor();
    if tick < MIN_TICK as f64 || tick > MAX_TICK as f64 {
        return Err(Error::Clmm(format!("Price {} outside tick range", price)));
    }
    Ok(tick as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q96: u128 = 1 << 96;

    #[test]
    fn test_tick_zero_is_one() {
        assert_eq!(sqrt_ratio_at_tick(0).unwrap(), U256::from(Q96));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(sqrt_ratio_at_tick(MIN_TICK).unwrap(), MIN_SQRT_RATIO);
        assert_eq!(
            sqrt_ratio_at_tick(MAX_TICK).unwrap().to_string(),
            "1461446703485210103287273052203988822378723970342"
        );
        assert_eq!(sqrt_ratio_at_tick(MAX_TICK).unwrap(), MAX_SQRT_RATIO);
        assert!(sqrt_ratio_at_tick(MAX_TICK + 1).is_err());
        assert!(sqrt_ratio_at_tick(MIN_TICK - 1).is_err());
    }

    #[test]
    fn test_known_values() {
        // Reference values from the TickMath test suite
        assert_eq!(
            sqrt_ratio_at_tick(50).unwrap().to_string(),
            "79426470787362580746886972461"
        );
        assert_eq!(
            sqrt_ratio_at_tick(-50).unwrap().to_string(),
            "79030349367926598376800521322"
        );
    }

    #[test]
    fn test_tick_at_sqrt_ratio_inverts() {
        for tick in [MIN_TICK, -200_000, -1, 0, 1, 60, 276_324, MAX_TICK - 1] {
            let ratio = sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(tick_at_sqrt_ratio(ratio).unwrap(), tick);
            if tick < MAX_TICK - 1 {
                assert_eq!(tick_at_sqrt_ratio(ratio + U256::from(1u8)).unwrap(), tick);
            }
        }
        assert!(tick_at_sqrt_ratio(MAX_SQRT_RATIO).is_err());
        assert!(tick_at_sqrt_ratio(U256::from(1u8)).is_err());
    }

    #[test]
    fn test_nearest_usable_tick() {
        assert_eq!(nearest_usable_tick(5, 10), 10);
        assert_eq!(nearest_usable_tick(4, 10), 0);
        assert_eq!(nearest_usable_tick(-5, 10), 0);
        assert_eq!(nearest_usable_tick(-6, 10), -10);
        assert_eq!(nearest_usable_tick(-887_272, 10), -887_270);
        assert_eq!(nearest_usable_tick(887_272, 60), 887_220);
        assert_eq!(nearest_usable_tick(-887_272, 60), -887_220);
        assert_eq!(nearest_usable_tick(123, 1), 123);
    }

    #[test]
    fn test_price_to_tick() {
        assert_eq!(price_to_tick(1.0).unwrap(), 0);
        assert_eq!(price_to_tick(1.0001f64.powi(100) * 1.000_000_01).unwrap(), 100);
        assert!(price_to_tick(1.0001f64.powi(-100) * 1.000_000_01).unwrap() >= -100);
        assert!(price_to_tick(0.0).is_err());
        assert!(price_to_tick(f64::NAN).is_err());
    }
}
