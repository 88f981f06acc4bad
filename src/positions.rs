use crate::block_map::BlockMap;
use crate::cache::EntityCache;
use crate::config::Config;
use crate::error::Error;
use crate::eth::BlockHeader;
use crate::events::{PositionEvent, PositionEventType};
use crate::keyer;
use crate::math;
use crate::model::{Position, PositionSnapshot, Token};

/// Folds position manager events into positions. Positions that could not be resolved
/// during prefetch are skipped. Returns the number of events applied.
pub fn handle_position_events(
    cache: &mut EntityCache,
    config: &Config,
    events: &BlockMap<PositionEvent>,
) -> Result<usize, Error> {
    let mut applied = 0;
    for (block, block_events) in events {
        for event in block_events {
            let mut position = match cache.get::<Position>(&event.position_id) {
                Some(position) => position.clone(),
                None => {
                    log::debug!("skipping event on unknown position {}", event.position_id);
                    continue;
                }
            };
            let (decimals0, decimals1) = match (
                cache.get::<Token>(&position.token0_id),
                cache.get::<Token>(&position.token1_id),
            ) {
                (Some(token0), Some(token1)) => (token0.decimals, token1.decimals),
                _ => {
                    log::debug!("skipping position {}, tokens are unknown", position.id);
                    continue;
                }
            };

            match &event.r#type {
                PositionEventType::IncreaseLiquidity(increase) => {
                    position.liquidity += &increase.liquidity;
                    position.deposited_token0 += math::convert_token_to_decimal(&increase.amount0, decimals0);
                    position.deposited_token1 += math::convert_token_to_decimal(&increase.amount1, decimals1);
                }
                PositionEventType::DecreaseLiquidity(decrease) => {
                    if config.ignored_decrease_blocks.contains(&block.height)
                        || config.is_ignored_pool(&position.pool_id)
                    {
                        log::debug!("ignoring decrease of position {} at block {}", position.id, block.height);
                        continue;
                    }
                    position.liquidity -= &decrease.liquidity;
                    position.withdrawn_token0 += math::convert_token_to_decimal(&decrease.amount0, decimals0);
                    position.withdrawn_token1 += math::convert_token_to_decimal(&decrease.amount1, decimals1);
                }
                PositionEventType::Collect(collect) => {
                    if config.is_ignored_pool(&position.pool_id) {
                        log::debug!("ignoring collect of position {}", position.id);
                        continue;
                    }
                    position.collected_fees_token0 += math::convert_token_to_decimal(&collect.amount0, decimals0);
                    position.collected_fees_token1 += math::convert_token_to_decimal(&collect.amount1, decimals1);
                }
                PositionEventType::Transfer(transfer) => {
                    position.owner = transfer.to.clone();
                }
            }

            save_position_snapshot(cache, &position, block)?;
            cache.add(position);
            applied += 1;
        }
    }

    log::info!("applied {} of {} position events", applied, events.len());
    Ok(applied)
}

fn save_position_snapshot(
    cache: &mut EntityCache,
    position: &Position,
    block: &BlockHeader,
) -> Result<(), Error> {
    let id = keyer::snapshot_id(&position.id, block.height);
    let snapshot = cache.get_or_create(&id, || PositionSnapshot {
        id: id.clone(),
        ..Default::default()
    })?;
    snapshot.owner = position.owner.clone();
    snapshot.pool_id = position.pool_id.clone();
    snapshot.position_id = position.id.clone();
    snapshot.block_number = block.height;
    snapshot.timestamp = block.timestamp;
    snapshot.liquidity = position.liquidity.clone();
    snapshot.deposited_token0 = position.deposited_token0.clone();
    snapshot.deposited_token1 = position.deposited_token1.clone();
    snapshot.withdrawn_token0 = position.withdrawn_token0.clone();
    snapshot.withdrawn_token1 = position.withdrawn_token1.clone();
    snapshot.collected_fees_token0 = position.collected_fees_token0.clone();
    snapshot.collected_fees_token1 = position.collected_fees_token1.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::position_manager::events::{
        Collect, DecreaseLiquidity, IncreaseLiquidity, Transfer,
    };
    use crate::config::{WETH_ADDRESS, ZERO_ADDRESS};
    use crate::test_utils::{header, token};
    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;
    use std::str::FromStr;

    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const OWNER: &str = "0x00000000000000000000000000000000000000cc";

    fn seeded_cache(pool_id: &str) -> EntityCache {
        let mut cache = EntityCache::new();
        cache.add(token(USDC, 6));
        cache.add(token(WETH_ADDRESS, 18));
        cache.add(Position {
            id: "7".to_string(),
            owner: ZERO_ADDRESS.to_string(),
            pool_id: pool_id.to_string(),
            token0_id: USDC.to_string(),
            token1_id: WETH_ADDRESS.to_string(),
            tick_lower: -60,
            tick_upper: 60,
            ..Default::default()
        });
        cache
    }

    fn event(r#type: PositionEventType) -> PositionEvent {
        PositionEvent {
            position_id: "7".to_string(),
            log_index: 0,
            r#type,
        }
    }

    fn increase() -> PositionEventType {
        PositionEventType::IncreaseLiquidity(IncreaseLiquidity {
            token_id: BigInt::from(7),
            liquidity: BigInt::from(100),
            amount0: BigInt::from(5_000_000),
            amount1: BigInt::from(2_000_000_000_000_000_000u64),
        })
    }

    fn decrease() -> PositionEventType {
        PositionEventType::DecreaseLiquidity(DecreaseLiquidity {
            token_id: BigInt::from(7),
            liquidity: BigInt::from(40),
            amount0: BigInt::from(1_000_000),
            amount1: BigInt::from(500_000_000_000_000_000u64),
        })
    }

    fn collect() -> PositionEventType {
        PositionEventType::Collect(Collect {
            token_id: BigInt::from(7),
            recipient: OWNER.to_string(),
            amount0: BigInt::from(250_000),
            amount1: BigInt::from(1_000_000_000_000_000u64),
        })
    }

    #[test]
    fn test_position_lifecycle() {
        let config = Config::default();
        let mut cache = seeded_cache("0x00000000000000000000000000000000000000d1");

        let mut events = BlockMap::new();
        events.push(
            &header(20, 240),
            event(PositionEventType::Transfer(Transfer {
                from: ZERO_ADDRESS.to_string(),
                to: OWNER.to_string(),
                token_id: BigInt::from(7),
            })),
        );
        events.push(&header(20, 240), event(increase()));
        events.push(&header(21, 252), event(decrease()));
        events.push(&header(21, 252), event(collect()));

        assert_eq!(4, handle_position_events(&mut cache, &config, &events).unwrap());

        let position = cache.get::<Position>("7").unwrap();
        assert_eq!(OWNER, position.owner);
        assert_eq!(BigInt::from(60), position.liquidity);
        assert_eq!(BigDecimal::from(5), position.deposited_token0);
        assert_eq!(BigDecimal::from(2), position.deposited_token1);
        assert_eq!(BigDecimal::from(1), position.withdrawn_token0);
        assert_eq!(BigDecimal::from_str("0.5").unwrap(), position.withdrawn_token1);
        assert_eq!(BigDecimal::from_str("0.25").unwrap(), position.collected_fees_token0);
        assert_eq!(BigDecimal::from_str("0.001").unwrap(), position.collected_fees_token1);

        // one snapshot per position and block, holding the state at the end of the block
        assert_eq!(2, cache.values::<PositionSnapshot>().count());
        let first = cache.get::<PositionSnapshot>("7#20").unwrap();
        assert_eq!(BigInt::from(100), first.liquidity);
        assert_eq!(OWNER, first.owner);
        assert_eq!(240, first.timestamp);
        let second = cache.get::<PositionSnapshot>("7#21").unwrap();
        assert_eq!(BigInt::from(60), second.liquidity);
        assert_eq!(position.collected_fees_token0, second.collected_fees_token0);
    }

    #[test]
    fn test_ignored_decreases_and_collects() {
        let config = Config::default();
        let mut cache = seeded_cache(&config.ignored_pools[0]);

        let mut events = BlockMap::new();
        events.push(&header(20, 240), event(increase()));
        events.push(&header(21, 252), event(decrease()));
        events.push(&header(21, 252), event(collect()));
        assert_eq!(1, handle_position_events(&mut cache, &config, &events).unwrap());

        let mut cache = seeded_cache("0x00000000000000000000000000000000000000d1");
        let mut events = BlockMap::new();
        events.push(&header(config.ignored_decrease_blocks[0], 240), event(decrease()));
        assert_eq!(0, handle_position_events(&mut cache, &config, &events).unwrap());
        assert_eq!(BigInt::from(0), cache.get::<Position>("7").unwrap().liquidity);
        assert!(cache.get::<PositionSnapshot>(&format!("7#{}", config.ignored_decrease_blocks[0])).is_none());
    }

    #[test]
    fn test_unknown_positions_are_skipped() {
        let config = Config::default();
        let mut cache = EntityCache::new();
        let mut events = BlockMap::new();
        events.push(&header(20, 240), event(increase()));
        assert_eq!(0, handle_position_events(&mut cache, &config, &events).unwrap());
        assert_eq!(0, cache.values::<PositionSnapshot>().count());
    }
}
