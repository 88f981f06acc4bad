//! Persisted entities. Relations are plain id strings resolved through the entity cache.

use crate::eth::{BlockHeader, LogTransaction};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn into_record(self) -> Record;
    fn from_record(record: Record) -> Option<Self>;
    fn from_record_ref(record: &Record) -> Option<&Self>;
    fn from_record_mut(record: &mut Record) -> Option<&mut Self>;
}

entities!(
    Bundle,
    Factory,
    Token,
    Pool,
    Tick,
    Position,
    Transaction,
    Mint,
    Burn,
    Swap,
    UniswapDayData,
    PoolDayData,
    PoolHourData,
    TokenDayData,
    TokenHourData,
    TickDayData,
    PositionSnapshot,
);

impl EntityKind {
    /// Kinds written once with `insert_many` and never re-saved.
    pub fn is_insert_only(&self) -> bool {
        matches!(
            self,
            EntityKind::Transaction | EntityKind::Mint | EntityKind::Burn | EntityKind::Swap
        )
    }
}

pub const BUNDLE_ID: &str = "1";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    pub id: String,
    pub eth_price_usd: BigDecimal,
}

impl Bundle {
    pub fn new() -> Self {
        Bundle {
            id: BUNDLE_ID.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Factory {
    pub id: String,
    pub pool_count: u64,
    pub tx_count: u64,
    pub total_volume_usd: BigDecimal,
    pub total_volume_eth: BigDecimal,
    pub total_fees_usd: BigDecimal,
    pub total_fees_eth: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub total_value_locked_usd: BigDecimal,
    pub total_value_locked_eth: BigDecimal,
    pub total_value_locked_usd_untracked: BigDecimal,
    pub total_value_locked_eth_untracked: BigDecimal,
    pub owner: String,
}

impl Factory {
    pub fn new(id: &str) -> Self {
        Factory {
            id: id.to_string(),
            owner: crate::config::ZERO_ADDRESS.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub total_supply: BigInt,
    pub volume: BigDecimal,
    pub volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub tx_count: u64,
    pub pool_count: u64,
    pub total_value_locked: BigDecimal,
    pub total_value_locked_usd: BigDecimal,
    pub total_value_locked_usd_untracked: BigDecimal,
    pub derived_eth: BigDecimal,
    /// Pools pairing this token with a whitelisted one, in creation order.
    pub whitelist_pools: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pool {
    pub id: String,
    pub created_at_timestamp: u64,
    pub created_at_block_number: u64,
    pub token0_id: String,
    pub token1_id: String,
    pub fee_tier: u32,
    pub liquidity: BigInt,
    pub sqrt_price: BigInt,
    pub fee_growth_global0_x128: BigInt,
    pub fee_growth_global1_x128: BigInt,
    pub token0_price: BigDecimal,
    pub token1_price: BigDecimal,
    pub tick: Option<i32>,
    pub observation_index: u64,
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub tx_count: u64,
    pub collected_fees_token0: BigDecimal,
    pub collected_fees_token1: BigDecimal,
    pub collected_fees_usd: BigDecimal,
    pub total_value_locked_token0: BigDecimal,
    pub total_value_locked_token1: BigDecimal,
    pub total_value_locked_eth: BigDecimal,
    pub total_value_locked_usd: BigDecimal,
    pub total_value_locked_usd_untracked: BigDecimal,
    pub total_value_locked_eth_untracked: BigDecimal,
    pub liquidity_provider_count: u64,
}

impl Pool {
    pub fn new(id: &str, token0_id: &str, token1_id: &str, fee_tier: u32, block: &BlockHeader) -> Self {
        Pool {
            id: id.to_string(),
            token0_id: token0_id.to_string(),
            token1_id: token1_id.to_string(),
            fee_tier,
            created_at_timestamp: block.timestamp,
            created_at_block_number: block.height,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tick {
    pub id: String,
    pub pool_id: String,
    pub tick_idx: i32,
    pub created_at_timestamp: u64,
    pub created_at_block_number: u64,
    pub liquidity_gross: BigInt,
    pub liquidity_net: BigInt,
    pub price0: BigDecimal,
    pub price1: BigDecimal,
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub collected_fees_token0: BigDecimal,
    pub collected_fees_token1: BigDecimal,
    pub collected_fees_usd: BigDecimal,
    pub liquidity_provider_count: u64,
    pub fee_growth_outside0_x128: BigInt,
    pub fee_growth_outside1_x128: BigInt,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Position {
    /// NFT token id, in decimal.
    pub id: String,
    pub owner: String,
    pub pool_id: String,
    pub token0_id: String,
    pub token1_id: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: BigInt,
    pub deposited_token0: BigDecimal,
    pub deposited_token1: BigDecimal,
    pub withdrawn_token0: BigDecimal,
    pub withdrawn_token1: BigDecimal,
    pub collected_fees_token0: BigDecimal,
    pub collected_fees_token1: BigDecimal,
    pub fee_growth_inside0_last_x128: BigInt,
    pub fee_growth_inside1_last_x128: BigInt,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub gas_used: BigInt,
    pub gas_price: BigInt,
}

impl Transaction {
    pub fn new(block: &BlockHeader, transaction: &LogTransaction) -> Self {
        Transaction {
            id: transaction.hash.clone(),
            block_number: block.height,
            timestamp: block.timestamp,
            gas_used: transaction.gas.clone(),
            gas_price: transaction.gas_price.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mint {
    pub id: String,
    pub transaction_id: String,
    pub timestamp: u64,
    pub pool_id: String,
    pub token0_id: String,
    pub token1_id: String,
    pub owner: String,
    pub sender: String,
    pub origin: String,
    pub amount: BigInt,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub amount_usd: BigDecimal,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub log_index: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Burn {
    pub id: String,
    pub transaction_id: String,
    pub timestamp: u64,
    pub pool_id: String,
    pub token0_id: String,
    pub token1_id: String,
    pub owner: String,
    pub origin: String,
    pub amount: BigInt,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub amount_usd: BigDecimal,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub log_index: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Swap {
    pub id: String,
    pub transaction_id: String,
    pub timestamp: u64,
    pub pool_id: String,
    pub token0_id: String,
    pub token1_id: String,
    pub sender: String,
    pub recipient: String,
    pub origin: String,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub amount_usd: BigDecimal,
    pub sqrt_price_x96: BigInt,
    pub tick: i32,
    pub log_index: u32,
}

/// Price range of a bucket. `None` is the sentinel of a bucket that has not observed a
/// price yet: high behaves as -inf and low as +inf.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ohlc {
    pub open: Option<BigDecimal>,
    pub high: Option<BigDecimal>,
    pub low: Option<BigDecimal>,
    pub close: Option<BigDecimal>,
}

impl Ohlc {
    pub fn observe(&mut self, price: &BigDecimal) {
        if self.open.is_none() {
            self.open = Some(price.clone());
        }
        if self.high.as_ref().map_or(true, |high| price > high) {
            self.high = Some(price.clone());
        }
        if self.low.as_ref().map_or(true, |low| price < low) {
            self.low = Some(price.clone());
        }
        self.close = Some(price.clone());
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniswapDayData {
    pub id: String,
    /// Unix seconds at the start of the day.
    pub date: u64,
    pub volume_eth: BigDecimal,
    pub volume_usd: BigDecimal,
    pub volume_usd_untracked: BigDecimal,
    pub fees_usd: BigDecimal,
    pub tx_count: u64,
    pub tvl_usd: BigDecimal,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolDayData {
    pub id: String,
    pub date: u64,
    pub pool_id: String,
    pub liquidity: BigInt,
    pub sqrt_price: BigInt,
    pub token0_price: BigDecimal,
    pub token1_price: BigDecimal,
    pub tick: Option<i32>,
    pub fee_growth_global0_x128: BigInt,
    pub fee_growth_global1_x128: BigInt,
    pub tvl_usd: BigDecimal,
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub tx_count: u64,
    pub price: Ohlc,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolHourData {
    pub id: String,
    pub period_start_unix: u64,
    pub pool_id: String,
    pub liquidity: BigInt,
    pub sqrt_price: BigInt,
    pub token0_price: BigDecimal,
    pub token1_price: BigDecimal,
    pub tick: Option<i32>,
    pub fee_growth_global0_x128: BigInt,
    pub fee_growth_global1_x128: BigInt,
    pub tvl_usd: BigDecimal,
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub tx_count: u64,
    pub price: Ohlc,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenDayData {
    pub id: String,
    pub date: u64,
    pub token_id: String,
    pub volume: BigDecimal,
    pub volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub total_value_locked: BigDecimal,
    pub total_value_locked_usd: BigDecimal,
    pub price_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub price: Ohlc,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenHourData {
    pub id: String,
    pub period_start_unix: u64,
    pub token_id: String,
    pub volume: BigDecimal,
    pub volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub total_value_locked: BigDecimal,
    pub total_value_locked_usd: BigDecimal,
    pub price_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub price: Ohlc,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickDayData {
    pub id: String,
    pub date: u64,
    pub pool_id: String,
    pub tick_id: String,
    pub liquidity_gross: BigInt,
    pub liquidity_net: BigInt,
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub fees_usd: BigDecimal,
    pub fee_growth_outside0_x128: BigInt,
    pub fee_growth_outside1_x128: BigInt,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionSnapshot {
    pub id: String,
    pub owner: String,
    pub pool_id: String,
    pub position_id: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub liquidity: BigInt,
    pub deposited_token0: BigDecimal,
    pub deposited_token1: BigDecimal,
    pub withdrawn_token0: BigDecimal,
    pub withdrawn_token1: BigDecimal,
    pub collected_fees_token0: BigDecimal,
    pub collected_fees_token1: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_record_round_trip_keeps_kind() {
        let record = Bundle::new().into_record();
        assert_eq!(EntityKind::Bundle, record.kind());
        assert_eq!("1", record.id());
        assert!(Pool::from_record_ref(&record).is_none());
        assert!(Bundle::from_record(record).is_some());
    }

    #[test]
    fn test_flush_order_and_insert_only() {
        assert!(EntityKind::Bundle < EntityKind::Pool);
        assert!(EntityKind::Swap < EntityKind::PoolDayData);
        assert!(EntityKind::Mint.is_insert_only());
        assert!(!EntityKind::Pool.is_insert_only());
        assert_eq!(17, EntityKind::ALL.len());
    }

    #[test]
    fn test_ohlc_first_observation_replaces_sentinels() {
        let mut ohlc = Ohlc::default();
        ohlc.observe(&BigDecimal::from_str("-5").unwrap());
        assert_eq!(ohlc.high, ohlc.low);
        assert_eq!(Some(BigDecimal::from_str("-5").unwrap()), ohlc.open);

        ohlc.observe(&BigDecimal::from(3));
        ohlc.observe(&BigDecimal::from(1));
        assert_eq!(Some(BigDecimal::from(3)), ohlc.high);
        assert_eq!(Some(BigDecimal::from_str("-5").unwrap()), ohlc.low);
        assert_eq!(Some(BigDecimal::from(1)), ohlc.close);
        assert_eq!(Some(BigDecimal::from_str("-5").unwrap()), ohlc.open);
    }
}
