use bigdecimal::{BigDecimal, One, Zero};
use num_bigint::BigInt;
use std::ops::{Div, Mul};

/// Significant digits kept by the repeated multiplications of `big_decimal_exponated`.
pub const DECIMAL_PRECISION: u64 = 100;

pub fn safe_div(amount0: &BigDecimal, amount1: &BigDecimal) -> BigDecimal {
    return if amount1.is_zero() {
        BigDecimal::zero()
    } else {
        amount0.clone().div(amount1.clone())
    };
}

pub fn exponent_to_big_decimal(decimals: u32) -> BigDecimal {
    BigDecimal::new(BigInt::one(), -(decimals as i64))
}

/// Raw on-chain amount to a human amount, `amount / 10^decimals`.
pub fn convert_token_to_decimal(amount: &BigInt, decimals: u32) -> BigDecimal {
    BigDecimal::new(amount.clone(), decimals as i64)
}

pub fn big_int_to_decimal(value: &BigInt) -> BigDecimal {
    BigDecimal::new(value.clone(), 0)
}

pub fn big_decimal_exponated(value: &BigDecimal, power: i32) -> BigDecimal {
    if power == 0 {
        return BigDecimal::one();
    }

    let mut result = BigDecimal::one();
    let mut base = value.clone();
    let mut exponent = power.unsigned_abs();
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.mul(&base).with_prec(DECIMAL_PRECISION);
        }
        base = base.clone().mul(&base).with_prec(DECIMAL_PRECISION);
        exponent >>= 1;
    }

    if power < 0 {
        return safe_div(&BigDecimal::one(), &result);
    }
    return result;
}

/// Price of token0 in token1 at a tick boundary, `1.0001^tick_idx`.
pub fn compute_price_from_tick_idx(tick_idx: i32) -> BigDecimal {
    let base = BigDecimal::new(BigInt::from(10001), 4);
    big_decimal_exponated(&base, tick_idx)
}

pub fn fee_tier_to_tick_spacing(fee_tier: u32) -> i32 {
    match fee_tier {
        10000 => 200,
        3000 => 60,
        500 => 10,
        100 => 1,
        // unknown tiers are treated as the finest grid
        _ => 1,
    }
}
