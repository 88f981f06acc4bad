use crate::block_map::BlockMap;
use crate::cache::EntityCache;
use crate::config::Config;
use crate::error::Error;
use crate::events::FactoryEvent;
use crate::model::{Bundle, Factory, Pool, Token, BUNDLE_ID};
use std::collections::HashMap;

/// Creates the pools announced by the factory. `new_tokens` holds the tokens resolved from
/// the chain during prefetch. Returns the number of pools created.
pub fn handle_pools_created(
    cache: &mut EntityCache,
    config: &Config,
    events: &BlockMap<FactoryEvent>,
    new_tokens: &HashMap<String, Token>,
) -> Result<usize, Error> {
    let mut created = 0;

    for (block, block_events) in events {
        for event in block_events {
            let FactoryEvent::PoolCreated(event) = event;
            log::debug!("pool created: {} at block {}", event.pool, block.height);

            if config.is_ignored_pool(&event.pool) {
                log::debug!("ignoring pool {}", event.pool);
                continue;
            }
            if cache.get::<Pool>(&event.pool).is_some() {
                log::warn!("pool {} already exists, skipping", event.pool);
                continue;
            }

            // both tokens must be known before anything is touched
            let mut token0 = match resolve_token(cache, new_tokens, &event.token0) {
                Some(token) => token,
                None => {
                    log::debug!("skipping pool {}, token {} is not valid", event.pool, event.token0);
                    continue;
                }
            };
            let mut token1 = match resolve_token(cache, new_tokens, &event.token1) {
                Some(token) => token,
                None => {
                    log::debug!("skipping pool {}, token {} is not valid", event.pool, event.token1);
                    continue;
                }
            };

            let factory = cache.get_or_create(&config.factory_address, || {
                Factory::new(&config.factory_address)
            })?;
            factory.pool_count += 1;
            cache.get_or_create(BUNDLE_ID, Bundle::new)?;

            if config.is_whitelisted(&token0.id) {
                log::info!("adding pool: {} to token: {}", event.pool, token1.id);
                token1.whitelist_pools.push(event.pool.clone());
            }
            if config.is_whitelisted(&token1.id) {
                log::info!("adding pool: {} to token: {}", event.pool, token0.id);
                token0.whitelist_pools.push(event.pool.clone());
            }

            cache.add(Pool::new(&event.pool, &token0.id, &token1.id, event.fee, block));
            cache.add(token0);
            cache.add(token1);
            created += 1;
        }
    }

    log::info!("created {} pools", created);
    Ok(created)
}

fn resolve_token(
    cache: &EntityCache,
    new_tokens: &HashMap<String, Token>,
    token_id: &str,
) -> Option<Token> {
    cache
        .get::<Token>(token_id)
        .or_else(|| new_tokens.get(token_id))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::factory::events::PoolCreated;
    use crate::config::WETH_ADDRESS;
    use crate::test_utils::{header, token};

    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const SPAM: &str = "0x00000000000000000000000000000000000000aa";

    fn created(pool: &str, token0: &str, token1: &str) -> FactoryEvent {
        FactoryEvent::PoolCreated(PoolCreated {
            token0: token0.to_string(),
            token1: token1.to_string(),
            fee: 3000,
            tick_spacing: 60,
            pool: pool.to_string(),
        })
    }

    #[test]
    fn test_pool_created_links_whitelist_pools() {
        let config = Config::default();
        let mut cache = EntityCache::new();
        cache.add(token(WETH_ADDRESS, 18));

        let mut new_tokens = HashMap::new();
        new_tokens.insert(SPAM.to_string(), token(SPAM, 18));
        new_tokens.insert(USDC.to_string(), token(USDC, 6));

        let mut events = BlockMap::new();
        events.push(&header(10, 120), created("0xp1", SPAM, WETH_ADDRESS));
        events.push(&header(10, 120), created("0xp2", USDC, WETH_ADDRESS));

        assert_eq!(2, handle_pools_created(&mut cache, &config, &events, &new_tokens).unwrap());

        let factory = cache.get::<Factory>(&config.factory_address).unwrap();
        assert_eq!(2, factory.pool_count);
        assert!(cache.get::<Bundle>(BUNDLE_ID).is_some());

        assert_eq!(vec!["0xp1".to_string()], cache.get::<Token>(SPAM).unwrap().whitelist_pools);
        assert_eq!(vec!["0xp2".to_string()], cache.get::<Token>(USDC).unwrap().whitelist_pools);
        assert_eq!(
            vec!["0xp2".to_string()],
            cache.get::<Token>(WETH_ADDRESS).unwrap().whitelist_pools
        );

        let pool = cache.get::<Pool>("0xp1").unwrap();
        assert_eq!(10, pool.created_at_block_number);
        assert_eq!(3000, pool.fee_tier);
        assert_eq!(None, pool.tick);
    }

    #[test]
    fn test_pool_with_invalid_token_is_not_created() {
        let config = Config::default();
        let mut cache = EntityCache::new();
        let mut events = BlockMap::new();
        events.push(&header(10, 120), created("0xp1", SPAM, WETH_ADDRESS));
        events.push(
            &header(11, 132),
            created(&config.ignored_pools[0], WETH_ADDRESS, USDC),
        );

        assert_eq!(0, handle_pools_created(&mut cache, &config, &events, &HashMap::new()).unwrap());
        assert!(cache.get::<Factory>(&config.factory_address).is_none());
        assert_eq!(0, cache.values::<Pool>().count());
    }
}
