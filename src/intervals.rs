//! Day and hour bucket snapshots. Every function returns the row for the bucket holding
//! `block.timestamp`, creating it zeroed on first use, after copying the live state of
//! its subject into it. Volume style fields are left to the caller.

use crate::cache::EntityCache;
use crate::config::Config;
use crate::error::Error;
use crate::eth::BlockHeader;
use crate::keyer;
use crate::model::{
    Bundle, Factory, Pool, PoolDayData, PoolHourData, Tick, TickDayData, Token, TokenDayData,
    TokenHourData, UniswapDayData, BUNDLE_ID,
};
use std::ops::Mul;

pub const SECONDS_PER_DAY: u64 = 86400;
pub const SECONDS_PER_HOUR: u64 = 3600;

pub fn day_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

pub fn hour_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_HOUR
}

/// Bucket indices used for snapshot ids. Shared by prefetch and fold so both agree on
/// which rows a batch touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Buckets {
    hourly: bool,
}

impl Buckets {
    pub fn new(config: &Config) -> Self {
        Buckets {
            hourly: config.hourly_buckets,
        }
    }

    pub fn day(&self, timestamp: u64) -> u64 {
        day_index(timestamp)
    }

    pub fn hour(&self, timestamp: u64) -> u64 {
        if self.hourly {
            hour_index(timestamp)
        } else {
            day_index(timestamp)
        }
    }

    pub fn hour_start(&self, timestamp: u64) -> u64 {
        self.hour(timestamp)
            * if self.hourly {
                SECONDS_PER_HOUR
            } else {
                SECONDS_PER_DAY
            }
    }
}

pub fn update_uniswap_day_data<'a>(
    cache: &'a mut EntityCache,
    buckets: &Buckets,
    factory_id: &str,
    block: &BlockHeader,
) -> Result<&'a mut UniswapDayData, Error> {
    let factory = cache.get_or_fail::<Factory>(factory_id)?;
    let tvl_usd = factory.total_value_locked_usd.clone();
    let tx_count = factory.tx_count;

    let day = buckets.day(block.timestamp);
    let id = keyer::snapshot_id(factory_id, day);
    let row = cache.get_or_create(&id, || UniswapDayData {
        id: id.clone(),
        date: day * SECONDS_PER_DAY,
        ..Default::default()
    })?;
    row.tvl_usd = tvl_usd;
    row.tx_count = tx_count;
    Ok(row)
}

pub fn update_pool_day_data<'a>(
    cache: &'a mut EntityCache,
    buckets: &Buckets,
    pool_id: &str,
    block: &BlockHeader,
) -> Result<&'a mut PoolDayData, Error> {
    let pool = cache.get_or_fail::<Pool>(pool_id)?.clone();

    let day = buckets.day(block.timestamp);
    let id = keyer::snapshot_id(pool_id, day);
    let row = cache.get_or_create(&id, || PoolDayData {
        id: id.clone(),
        date: day * SECONDS_PER_DAY,
        pool_id: pool_id.to_string(),
        ..Default::default()
    })?;

    row.price.observe(&pool.token0_price);
    row.liquidity = pool.liquidity;
    row.sqrt_price = pool.sqrt_price;
    row.fee_growth_global0_x128 = pool.fee_growth_global0_x128;
    row.fee_growth_global1_x128 = pool.fee_growth_global1_x128;
    row.token0_price = pool.token0_price;
    row.token1_price = pool.token1_price;
    row.tick = pool.tick;
    row.tvl_usd = pool.total_value_locked_usd;
    row.tx_count = pool.tx_count;
    Ok(row)
}

pub fn update_pool_hour_data<'a>(
    cache: &'a mut EntityCache,
    buckets: &Buckets,
    pool_id: &str,
    block: &BlockHeader,
) -> Result<&'a mut PoolHourData, Error> {
    let pool = cache.get_or_fail::<Pool>(pool_id)?.clone();

    let hour = buckets.hour(block.timestamp);
    let id = keyer::snapshot_id(pool_id, hour);
    let row = cache.get_or_create(&id, || PoolHourData {
        id: id.clone(),
        period_start_unix: buckets.hour_start(block.timestamp),
        pool_id: pool_id.to_string(),
        ..Default::default()
    })?;

    row.price.observe(&pool.token0_price);
    row.liquidity = pool.liquidity;
    row.sqrt_price = pool.sqrt_price;
    row.fee_growth_global0_x128 = pool.fee_growth_global0_x128;
    row.fee_growth_global1_x128 = pool.fee_growth_global1_x128;
    row.token0_price = pool.token0_price;
    row.token1_price = pool.token1_price;
    row.tick = pool.tick;
    row.tvl_usd = pool.total_value_locked_usd;
    row.tx_count = pool.tx_count;
    Ok(row)
}

pub fn update_token_day_data<'a>(
    cache: &'a mut EntityCache,
    buckets: &Buckets,
    token_id: &str,
    block: &BlockHeader,
) -> Result<&'a mut TokenDayData, Error> {
    let eth_price_usd = cache.get_or_fail::<Bundle>(BUNDLE_ID)?.eth_price_usd.clone();
    let token = cache.get_or_fail::<Token>(token_id)?;
    let price_usd = token.derived_eth.clone().mul(&eth_price_usd);
    let total_value_locked = token.total_value_locked.clone();
    let total_value_locked_usd = token.total_value_locked_usd.clone();

    let day = buckets.day(block.timestamp);
    let id = keyer::snapshot_id(token_id, day);
    let row = cache.get_or_create(&id, || TokenDayData {
        id: id.clone(),
        date: day * SECONDS_PER_DAY,
        token_id: token_id.to_string(),
        ..Default::default()
    })?;

    row.price.observe(&price_usd);
    row.price_usd = price_usd;
    row.total_value_locked = total_value_locked;
    row.total_value_locked_usd = total_value_locked_usd;
    Ok(row)
}

pub fn update_token_hour_data<'a>(
    cache: &'a mut EntityCache,
    buckets: &Buckets,
    token_id: &str,
    block: &BlockHeader,
) -> Result<&'a mut TokenHourData, Error> {
    let eth_price_usd = cache.get_or_fail::<Bundle>(BUNDLE_ID)?.eth_price_usd.clone();
    let token = cache.get_or_fail::<Token>(token_id)?;
    let price_usd = token.derived_eth.clone().mul(&eth_price_usd);
    let total_value_locked = token.total_value_locked.clone();
    let total_value_locked_usd = token.total_value_locked_usd.clone();

    let hour = buckets.hour(block.timestamp);
    let id = keyer::snapshot_id(token_id, hour);
    let row = cache.get_or_create(&id, || TokenHourData {
        id: id.clone(),
        period_start_unix: buckets.hour_start(block.timestamp),
        token_id: token_id.to_string(),
        ..Default::default()
    })?;

    row.price.observe(&price_usd);
    row.price_usd = price_usd;
    row.total_value_locked = total_value_locked;
    row.total_value_locked_usd = total_value_locked_usd;
    Ok(row)
}

pub fn update_tick_day_data<'a>(
    cache: &'a mut EntityCache,
    buckets: &Buckets,
    tick_id: &str,
    block: &BlockHeader,
) -> Result<&'a mut TickDayData, Error> {
    let tick = cache.get_or_fail::<Tick>(tick_id)?.clone();

    let day = buckets.day(block.timestamp);
    let id = keyer::snapshot_id(tick_id, day);
    let row = cache.get_or_create(&id, || TickDayData {
        id: id.clone(),
        date: day * SECONDS_PER_DAY,
        pool_id: tick.pool_id.clone(),
        tick_id: tick_id.to_string(),
        ..Default::default()
    })?;

    row.liquidity_gross = tick.liquidity_gross;
    row.liquidity_net = tick.liquidity_net;
    row.volume_token0 = tick.volume_token0;
    row.volume_token1 = tick.volume_token1;
    row.volume_usd = tick.volume_usd;
    row.fees_usd = tick.fees_usd;
    row.fee_growth_outside0_x128 = tick.fee_growth_outside0_x128;
    row.fee_growth_outside1_x128 = tick.fee_growth_outside1_x128;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn block(timestamp: u64) -> BlockHeader {
        BlockHeader {
            height: timestamp / 12,
            hash: "0xabc".to_string(),
            timestamp,
        }
    }

    fn cache_with_pool(price: i32) -> EntityCache {
        let mut cache = EntityCache::new();
        cache.add(Pool {
            id: "0xpool".to_string(),
            token0_price: BigDecimal::from(price),
            ..Default::default()
        });
        cache
    }

    #[test]
    fn test_bucket_indices() {
        let buckets = Buckets::new(&Config::default());
        assert_eq!(1, buckets.day(86400));
        assert_eq!(0, buckets.day(86399));
        assert_eq!(24, buckets.hour(86400 + 3599));
        assert_eq!(86400, buckets.hour_start(86400 + 3599));

        let collapsed = Buckets::new(&Config {
            hourly_buckets: false,
            ..Config::default()
        });
        assert_eq!(1, collapsed.hour(86400 + 3599));
        assert_eq!(86400, collapsed.hour_start(86400 + 3599));
    }

    #[test]
    fn test_same_day_updates_one_row_and_next_day_starts_fresh() {
        let buckets = Buckets::new(&Config::default());
        let mut cache = cache_with_pool(5);

        update_pool_day_data(&mut cache, &buckets, "0xpool", &block(100)).unwrap();
        {
            let pool = cache.get_mut::<Pool>("0xpool").unwrap();
            pool.token0_price = BigDecimal::from(2);
            pool.tx_count = 2;
        }
        let row = update_pool_day_data(&mut cache, &buckets, "0xpool", &block(200)).unwrap();
        assert_eq!(Some(BigDecimal::from(5)), row.price.high);
        assert_eq!(Some(BigDecimal::from(2)), row.price.low);
        assert_eq!(Some(BigDecimal::from(5)), row.price.open);
        assert_eq!(2, row.tx_count);

        let row = update_pool_day_data(&mut cache, &buckets, "0xpool", &block(86400 + 5)).unwrap();
        assert_eq!("0xpool#1", row.id);
        assert_eq!(86400, row.date);
        assert_eq!(Some(BigDecimal::from(2)), row.price.high);
        assert_eq!(Some(BigDecimal::from(2)), row.price.low);
        assert_eq!(2, cache.values::<PoolDayData>().count());
    }

    #[test]
    fn test_hour_rows_use_hour_index() {
        let buckets = Buckets::new(&Config::default());
        let mut cache = cache_with_pool(1);

        let row = update_pool_hour_data(&mut cache, &buckets, "0xpool", &block(7300)).unwrap();
        assert_eq!("0xpool#2", row.id);
        assert_eq!(7200, row.period_start_unix);
    }

    #[test]
    fn test_token_rows_need_a_bundle() {
        let buckets = Buckets::new(&Config::default());
        let mut cache = EntityCache::new();
        cache.add(Token {
            id: "0xtoken".to_string(),
            derived_eth: BigDecimal::from(2),
            ..Default::default()
        });
        assert!(update_token_day_data(&mut cache, &buckets, "0xtoken", &block(10)).is_err());

        let mut bundle = Bundle::new();
        bundle.eth_price_usd = BigDecimal::from(1500);
        cache.add(bundle);
        let row = update_token_hour_data(&mut cache, &buckets, "0xtoken", &block(10)).unwrap();
        assert_eq!(BigDecimal::from(3000), row.price_usd);
        assert_eq!(Some(BigDecimal::from(3000)), row.price.close);
    }

    #[test]
    fn test_uniswap_day_copies_factory_totals() {
        let buckets = Buckets::new(&Config::default());
        let mut cache = EntityCache::new();
        let mut factory = Factory::new("0xfactory");
        factory.tx_count = 7;
        factory.total_value_locked_usd = BigDecimal::from(42);
        cache.add(factory);

        let row = update_uniswap_day_data(&mut cache, &buckets, "0xfactory", &block(86400 * 3)).unwrap();
        assert_eq!("0xfactory#3", row.id);
        assert_eq!(7, row.tx_count);
        assert_eq!(BigDecimal::from(42), row.tvl_usd);
    }
}
