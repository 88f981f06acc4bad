use crate::abi::factory::events::PoolCreated;
use crate::abi::pool::events::{Burn, Initialize, Mint, Swap};
use crate::abi::position_manager::events::{
    Collect, DecreaseLiquidity, IncreaseLiquidity, Transfer,
};
use crate::block_map::BlockMap;
use crate::config::Config;
use crate::eth::{Block, DecodeError, Log, LogTransaction};
use crate::keyer;

#[derive(Clone, Debug, PartialEq)]
pub enum PoolEventType {
    Initialize(Initialize),
    Mint(Mint),
    Burn(Burn),
    Swap(Swap),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoolEvent {
    pub pool_id: String,
    pub log_index: u32,
    /// Always set for Mint, Burn and Swap.
    pub transaction: Option<LogTransaction>,
    pub r#type: PoolEventType,
}

impl PoolEvent {
    /// `None` when the log is not a pool event.
    pub fn decode(log: &Log) -> Option<Result<PoolEvent, DecodeError>> {
        let r#type = if Initialize::match_log(log) {
            Initialize::decode(log).map(PoolEventType::Initialize)
        } else if Mint::match_log(log) {
            Mint::decode(log).map(PoolEventType::Mint)
        } else if Burn::match_log(log) {
            Burn::decode(log).map(PoolEventType::Burn)
        } else if Swap::match_log(log) {
            Swap::decode(log).map(PoolEventType::Swap)
        } else {
            return None;
        };

        Some(r#type.and_then(|r#type| {
            if !matches!(r#type, PoolEventType::Initialize(_)) && log.transaction.is_none() {
                return Err(DecodeError::new(format!(
                    "log {} of {} has no transaction",
                    log.log_index, log.address
                )));
            }
            Ok(PoolEvent {
                pool_id: log.address.clone(),
                log_index: log.log_index,
                transaction: log.transaction.clone(),
                r#type,
            })
        }))
    }

    pub fn transaction_hash(&self) -> Option<&str> {
        self.transaction.as_ref().map(|trx| trx.hash.as_str())
    }

    /// Ticks read by the fold: the current tick for Initialize and Swap, both bounds for
    /// Mint and Burn.
    pub fn tick_ids(&self) -> Vec<String> {
        match &self.r#type {
            PoolEventType::Initialize(event) => vec![keyer::tick_id(&self.pool_id, event.tick)],
            PoolEventType::Swap(event) => vec![keyer::tick_id(&self.pool_id, event.tick)],
            PoolEventType::Mint(event) => vec![
                keyer::tick_id(&self.pool_id, event.tick_lower),
                keyer::tick_id(&self.pool_id, event.tick_upper),
            ],
            PoolEventType::Burn(event) => vec![
                keyer::tick_id(&self.pool_id, event.tick_lower),
                keyer::tick_id(&self.pool_id, event.tick_upper),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FactoryEvent {
    PoolCreated(PoolCreated),
}

impl FactoryEvent {
    pub fn decode(log: &Log) -> Option<Result<FactoryEvent, DecodeError>> {
        if PoolCreated::match_log(log) {
            return Some(PoolCreated::decode(log).map(FactoryEvent::PoolCreated));
        }
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PositionEventType {
    IncreaseLiquidity(IncreaseLiquidity),
    DecreaseLiquidity(DecreaseLiquidity),
    Collect(Collect),
    Transfer(Transfer),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionEvent {
    /// NFT token id, in decimal.
    pub position_id: String,
    pub log_index: u32,
    pub r#type: PositionEventType,
}

impl PositionEvent {
    pub fn decode(log: &Log) -> Option<Result<PositionEvent, DecodeError>> {
        let decoded = if IncreaseLiquidity::match_log(log) {
            IncreaseLiquidity::decode(log)
                .map(|e| (e.token_id.to_string(), PositionEventType::IncreaseLiquidity(e)))
        } else if DecreaseLiquidity::match_log(log) {
            DecreaseLiquidity::decode(log)
                .map(|e| (e.token_id.to_string(), PositionEventType::DecreaseLiquidity(e)))
        } else if Collect::match_log(log) {
            Collect::decode(log).map(|e| (e.token_id.to_string(), PositionEventType::Collect(e)))
        } else if Transfer::match_log(log) {
            Transfer::decode(log).map(|e| (e.token_id.to_string(), PositionEventType::Transfer(e)))
        } else {
            return None;
        };

        Some(decoded.map(|(position_id, r#type)| PositionEvent {
            position_id,
            log_index: log.log_index,
            r#type,
        }))
    }
}

/// Walks every log of every block in log order and keeps what `decode` recognizes.
/// Malformed logs are reported and dropped.
fn collect_events<T, F>(blocks: &[Block], emitter: Option<&str>, decode: F) -> BlockMap<T>
where
    F: Fn(&Log) -> Option<Result<T, DecodeError>>,
{
    let mut events = BlockMap::new();
    for block in blocks {
        let mut logs: Vec<&Log> = block.logs.iter().collect();
        logs.sort_by_key(|log| log.log_index);

        for log in logs {
            if let Some(address) = emitter {
                if log.address != address {
                    continue;
                }
            }
            match decode(log) {
                None => continue,
                Some(Ok(event)) => events.push(&block.header, event),
                Some(Err(err)) => log::warn!(
                    "skipping log {} of {} at block {}: {}",
                    log.log_index,
                    log.address,
                    block.header.height,
                    err
                ),
            }
        }
    }
    events
}

/// Pool events from any emitter, the fold skips the ones from unknown pools.
pub fn pool_events(blocks: &[Block]) -> BlockMap<PoolEvent> {
    collect_events(blocks, None, PoolEvent::decode)
}

pub fn factory_events(blocks: &[Block], config: &Config) -> BlockMap<FactoryEvent> {
    collect_events(blocks, Some(config.factory_address.as_str()), FactoryEvent::decode)
}

pub fn position_events(blocks: &[Block], config: &Config) -> BlockMap<PositionEvent> {
    collect_events(
        blocks,
        Some(config.position_manager_address.as_str()),
        PositionEvent::decode,
    )
}
