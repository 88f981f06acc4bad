use crate::cache::EntityCache;
use crate::config::Config;
use crate::error::Error;
use crate::math;
use crate::model::{Bundle, Pool, Token, BUNDLE_ID};
use bigdecimal::{BigDecimal, One, Zero};
use num_bigint::BigInt;
use std::ops::{Add, Div, Mul};
use std::str::FromStr;

const Q192: &str = "6277101735386680763835789423207666416102355444464034512896";

/// Returns `(token0_price, token1_price)`: token0 per token1 and token1 per token0.
pub fn sqrt_price_x96_to_token_prices(
    sqrt_price: &BigInt,
    token_0: &Token,
    token_1: &Token,
) -> (BigDecimal, BigDecimal) {
    log::debug!(
        "Computing prices for {} {} and {} {}",
        token_0.symbol,
        token_0.decimals,
        token_1.symbol,
        token_1.decimals
    );

    let sqrt_price = math::big_int_to_decimal(sqrt_price);
    let price: BigDecimal = sqrt_price.clone().mul(sqrt_price);
    let denominator = BigDecimal::from_str(Q192).unwrap_or_else(|_| BigDecimal::one());

    let price1 = price
        .div(denominator)
        .mul(math::exponent_to_big_decimal(token_0.decimals))
        .div(math::exponent_to_big_decimal(token_1.decimals));

    log::debug!("price1: {}", price1);
    let price0 = math::safe_div(&BigDecimal::one(), &price1);

    return (price0, price1);
}

/// Accepts tokens and USD amounts, returns the amount that counts towards tracked volume.
/// Both tokens whitelisted: the average. One whitelisted: that side. Neither: zero.
pub fn get_tracked_amount_usd(
    config: &Config,
    token0_id: &str,
    amount0_usd: &BigDecimal,
    token1_id: &str,
    amount1_usd: &BigDecimal,
) -> BigDecimal {
    let whitelisted0 = config.is_whitelisted(token0_id);
    let whitelisted1 = config.is_whitelisted(token1_id);

    if whitelisted0 && whitelisted1 {
        return amount0_usd.clone().add(amount1_usd).div(BigDecimal::from(2));
    }
    if whitelisted0 {
        return amount0_usd.clone();
    }
    if whitelisted1 {
        return amount1_usd.clone();
    }
    return BigDecimal::zero();
}

/// ETH price of a token, taken from the whitelist pool holding the most ETH worth of the
/// paired token. Equal amounts keep the first pool seen.
pub fn find_eth_per_token(
    cache: &EntityCache,
    config: &Config,
    token_id: &str,
) -> Result<BigDecimal, Error> {
    if token_id == config.weth_address {
        return Ok(BigDecimal::one());
    }

    if config.is_stable_coin(token_id) {
        let bundle = cache.get_or_fail::<Bundle>(BUNDLE_ID)?;
        return Ok(math::safe_div(&BigDecimal::one(), &bundle.eth_price_usd));
    }

    let token = cache.get_or_fail::<Token>(token_id)?;
    let mut largest_liquidity_eth = config.minimum_eth_locked.clone();
    let mut price_so_far = BigDecimal::zero();

    for pool_id in &token.whitelist_pools {
        let pool = cache.get_or_fail::<Pool>(pool_id)?;
        if pool.liquidity.is_zero() {
            continue;
        }

        if pool.token0_id == token_id {
            // whitelisted side is token1
            let token1 = cache.get_or_fail::<Token>(&pool.token1_id)?;
            let eth_locked = pool
                .total_value_locked_token1
                .clone()
                .mul(&token1.derived_eth);
            if eth_locked > largest_liquidity_eth {
                largest_liquidity_eth = eth_locked;
                price_so_far = pool.token1_price.clone().mul(&token1.derived_eth);
            }
        }
        if pool.token1_id == token_id {
            let token0 = cache.get_or_fail::<Token>(&pool.token0_id)?;
            let eth_locked = pool
                .total_value_locked_token0
                .clone()
                .mul(&token0.derived_eth);
            if eth_locked > largest_liquidity_eth {
                largest_liquidity_eth = eth_locked;
                price_so_far = pool.token0_price.clone().mul(&token0.derived_eth);
            }
        }
    }

    Ok(price_so_far)
}

/// ETH/USD from the reference pool, zero until that pool is known.
pub fn get_eth_price_in_usd(cache: &EntityCache, config: &Config) -> BigDecimal {
    match cache.get::<Pool>(&config.reference_pool) {
        None => BigDecimal::zero(),
        Some(pool) => pool.token0_price.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WETH_ADDRESS;
    use crate::test_utils::{pool_with_tokens, token};

    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const SPAM_A: &str = "0x00000000000000000000000000000000000000aa";
    const SPAM_B: &str = "0x00000000000000000000000000000000000000bb";

    #[test]
    fn test_tracked_amount_usd() {
        let config = Config::default();
        let d = |v: i32| BigDecimal::from(v);

        assert_eq!(d(100), get_tracked_amount_usd(&config, WETH_ADDRESS, &d(100), SPAM_A, &d(50)));
        assert_eq!(d(50), get_tracked_amount_usd(&config, SPAM_A, &d(100), WETH_ADDRESS, &d(50)));
        assert_eq!(d(0), get_tracked_amount_usd(&config, SPAM_A, &d(100), SPAM_B, &d(50)));
        assert_eq!(d(101), get_tracked_amount_usd(&config, WETH_ADDRESS, &d(100), USDC, &d(102)));
    }

    #[test]
    fn test_sqrt_price_prices_are_reciprocal() {
        let token0 = token(SPAM_A, 18);
        let token1 = token(USDC, 6);
        // 2^96, a raw price of exactly 1
        let sqrt_price = BigInt::from_str("79228162514264337593543950336").unwrap();

        let (price0, price1) = sqrt_price_x96_to_token_prices(&sqrt_price, &token0, &token1);
        assert_eq!(BigDecimal::from(1_000_000_000_000i64), price1);
        assert_eq!(BigDecimal::from_str("0.000000000001").unwrap(), price0);
        assert_eq!(
            BigDecimal::one(),
            price0.mul(price1).with_prec(50)
        );
    }

    #[test]
    fn test_zero_sqrt_price_yields_zero_prices() {
        let (price0, price1) = sqrt_price_x96_to_token_prices(
            &BigInt::zero(),
            &token(SPAM_A, 18),
            &token(SPAM_B, 18),
        );
        assert!(price0.is_zero());
        assert!(price1.is_zero());
    }

    #[test]
    fn test_find_eth_per_token() {
        let config = Config::default();
        let mut cache = EntityCache::new();
        let mut bundle = Bundle::new();
        bundle.eth_price_usd = BigDecimal::from(2000);
        cache.add(bundle);

        assert_eq!(BigDecimal::one(), find_eth_per_token(&cache, &config, WETH_ADDRESS).unwrap());
        assert_eq!(
            BigDecimal::from_str("0.0005").unwrap(),
            find_eth_per_token(&cache, &config, USDC).unwrap()
        );

        // two whitelist pools with the same ETH locked, the first one wins
        let mut weth = token(WETH_ADDRESS, 18);
        weth.derived_eth = BigDecimal::one();
        let mut spam = token(SPAM_A, 18);
        spam.whitelist_pools = vec!["0xp1".to_string(), "0xp2".to_string(), "0xp3".to_string()];

        let mut p1 = pool_with_tokens("0xp1", SPAM_A, WETH_ADDRESS);
        p1.liquidity = BigInt::from(1);
        p1.total_value_locked_token1 = BigDecimal::from(100);
        p1.token1_price = BigDecimal::from(3);
        let mut p2 = p1.clone();
        p2.id = "0xp2".to_string();
        p2.token1_price = BigDecimal::from(7);
        let mut p3 = p1.clone();
        p3.id = "0xp3".to_string();
        p3.liquidity = BigInt::zero();
        p3.total_value_locked_token1 = BigDecimal::from(1000);
        p3.token1_price = BigDecimal::from(11);

        cache.add(weth);
        cache.add(spam);
        cache.add(p1);
        cache.add(p2);
        cache.add(p3);

        assert_eq!(BigDecimal::from(3), find_eth_per_token(&cache, &config, SPAM_A).unwrap());
    }

    #[test]
    fn test_find_eth_per_token_below_floor() {
        let config = Config::default();
        let mut cache = EntityCache::new();
        let mut weth = token(WETH_ADDRESS, 18);
        weth.derived_eth = BigDecimal::one();
        let mut spam = token(SPAM_A, 18);
        spam.whitelist_pools = vec!["0xp1".to_string()];
        let mut p1 = pool_with_tokens("0xp1", WETH_ADDRESS, SPAM_A);
        p1.liquidity = BigInt::from(1);
        p1.total_value_locked_token0 = BigDecimal::from(60);
        p1.token0_price = BigDecimal::from(3);
        cache.add(weth);
        cache.add(spam);
        cache.add(p1);

        assert!(find_eth_per_token(&cache, &config, SPAM_A).unwrap().is_zero());
        assert!(find_eth_per_token(&cache, &config, SPAM_B).is_err());
    }

    #[test]
    fn test_eth_price_in_usd_defaults_to_zero() {
        let config = Config::default();
        let mut cache = EntityCache::new();
        assert!(get_eth_price_in_usd(&cache, &config).is_zero());

        let mut pool = pool_with_tokens(&config.reference_pool, USDC, WETH_ADDRESS);
        pool.token0_price = BigDecimal::from(1800);
        cache.add(pool);
        assert_eq!(BigDecimal::from(1800), get_eth_price_in_usd(&cache, &config));
    }
}
