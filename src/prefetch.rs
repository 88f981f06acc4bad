//! Batched loading ahead of each fold. Every phase defers the ids its events will read,
//! then loads each kind with a single store round trip.

use crate::block_map::BlockMap;
use crate::cache::EntityCache;
use crate::config::{Config, ZERO_ADDRESS};
use crate::error::Error;
use crate::events::{FactoryEvent, PoolEvent, PositionEvent};
use crate::intervals::Buckets;
use crate::keyer;
use crate::model::{
    Bundle, Factory, Pool, PoolDayData, PoolHourData, Position, PositionSnapshot, Tick,
    TickDayData, Token, TokenDayData, TokenHourData, Transaction, UniswapDayData, BUNDLE_ID,
};
use crate::rpc::{self, ChainClient};
use crate::store::Store;
use crate::tokens;
use std::collections::{BTreeSet, HashMap};

/// Relation rounds after the event-named entities: tokens of pools, whitelist pools of
/// tokens, tokens of those pools, and one spare round.
pub const MAX_RELATION_ROUNDS: usize = 4;

/// Loads what `factory::handle_pools_created` reads and resolves the metadata of tokens
/// never seen before. Returns those candidate tokens by id, the fold only keeps the ones
/// whose pool gets created.
pub async fn prefetch_factory_entities(
    cache: &mut EntityCache,
    store: &dyn Store,
    chain: &dyn ChainClient,
    config: &Config,
    events: &BlockMap<FactoryEvent>,
) -> Result<HashMap<String, Token>, Error> {
    cache.defer::<Factory, _, _>([config.factory_address.as_str()]);
    cache.defer::<Bundle, _, _>([BUNDLE_ID]);
    for event in events.events() {
        let FactoryEvent::PoolCreated(created) = event;
        cache.defer::<Pool, _, _>([created.pool.as_str()]);
        cache.defer::<Token, _, _>([created.token0.as_str(), created.token1.as_str()]);
    }
    cache.load::<Factory>(store).await?;
    cache.load::<Bundle>(store).await?;
    cache.load::<Pool>(store).await?;
    cache.load::<Token>(store).await?;

    let unknown: Vec<String> = events
        .events()
        .filter_map(|event| {
            let FactoryEvent::PoolCreated(created) = event;
            (!config.is_ignored_pool(&created.pool))
                .then(|| [created.token0.clone(), created.token1.clone()])
        })
        .flatten()
        .filter(|token_id| cache.get::<Token>(token_id).is_none())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let mut new_tokens = HashMap::new();
    let block_number = match events.last_header() {
        Some(header) if !unknown.is_empty() => header.height,
        _ => return Ok(new_tokens),
    };

    log::debug!("fetching metadata of {} tokens", unknown.len());
    let metadata = rpc::token_metadata(chain, block_number, &unknown).await?;
    for (token_id, metadata) in unknown.iter().zip(metadata.iter()) {
        if let Some(token) = tokens::create_token(token_id, metadata) {
            new_tokens.insert(token_id.clone(), token);
        }
    }
    Ok(new_tokens)
}

/// Loads everything the pool fold reads. Round 1 takes what events name directly, the
/// relation loop follows pool -> tokens -> whitelist pools -> tokens, snapshots come last
/// since their ids depend on the loaded subjects.
pub async fn prefetch_pool_entities(
    cache: &mut EntityCache,
    store: &dyn Store,
    config: &Config,
    buckets: &Buckets,
    events: &BlockMap<PoolEvent>,
) -> Result<(), Error> {
    cache.defer::<Factory, _, _>([config.factory_address.as_str()]);
    cache.defer::<Bundle, _, _>([BUNDLE_ID]);
    cache.defer::<Pool, _, _>([config.reference_pool.as_str()]);
    for event in events.events() {
        cache.defer::<Pool, _, _>([event.pool_id.as_str()]);
        cache.defer::<Tick, _, _>(event.tick_ids());
        if let Some(hash) = event.transaction_hash() {
            cache.defer::<Transaction, _, _>([hash]);
        }
    }
    cache.load::<Factory>(store).await?;
    cache.load::<Bundle>(store).await?;
    cache.load::<Transaction>(store).await?;

    let current_ticks: Vec<String> = cache
        .load::<Pool>(store)
        .await?
        .map(|pool| keyer::tick_id(&pool.id, pool.tick.unwrap_or(0)))
        .collect();
    cache.defer::<Tick, _, _>(current_ticks);
    cache.load::<Tick>(store).await?;

    for round in 2..=MAX_RELATION_ROUNDS {
        let deferred = if round % 2 == 0 {
            let token_ids: Vec<String> = cache
                .values::<Pool>()
                .flat_map(|pool| [pool.token0_id.clone(), pool.token1_id.clone()])
                .collect();
            let deferred = cache.defer::<Token, _, _>(token_ids);
            cache.load::<Token>(store).await?;
            deferred
        } else {
            let pool_ids: Vec<String> = cache
                .values::<Token>()
                .flat_map(|token| token.whitelist_pools.iter().cloned())
                .collect();
            let deferred = cache.defer::<Pool, _, _>(pool_ids);
            cache.load::<Pool>(store).await?;
            deferred
        };
        log::debug!("relation round {} deferred {} entities", round, deferred);
        // a token round can find everything cached by the factory phase while their
        // whitelist pools are still missing, only a quiet pool round ends the walk
        if deferred == 0 && round % 2 == 1 {
            break;
        }
    }

    let days: BTreeSet<u64> = events.headers().map(|h| buckets.day(h.timestamp)).collect();
    let hours: BTreeSet<u64> = events.headers().map(|h| buckets.hour(h.timestamp)).collect();
    let pool_ids = cache.ids::<Pool>();
    let token_ids = cache.ids::<Token>();
    let tick_ids = cache.ids::<Tick>();

    for day in &days {
        cache.defer::<UniswapDayData, _, _>([keyer::snapshot_id(&config.factory_address, *day)]);
        cache.defer::<PoolDayData, _, _>(pool_ids.iter().map(|id| keyer::snapshot_id(id, *day)));
        cache.defer::<TokenDayData, _, _>(token_ids.iter().map(|id| keyer::snapshot_id(id, *day)));
        cache.defer::<TickDayData, _, _>(tick_ids.iter().map(|id| keyer::snapshot_id(id, *day)));
    }
    for hour in &hours {
        cache.defer::<PoolHourData, _, _>(pool_ids.iter().map(|id| keyer::snapshot_id(id, *hour)));
        cache.defer::<TokenHourData, _, _>(token_ids.iter().map(|id| keyer::snapshot_id(id, *hour)));
    }

    cache.load::<UniswapDayData>(store).await?;
    cache.load::<PoolDayData>(store).await?;
    cache.load::<PoolHourData>(store).await?;
    cache.load::<TokenDayData>(store).await?;
    cache.load::<TokenHourData>(store).await?;
    cache.load::<TickDayData>(store).await?;

    Ok(())
}

/// Loads the positions named by events. Positions never seen before are initialized from
/// the position manager and the factory, as of the last block of the batch.
pub async fn prefetch_positions(
    cache: &mut EntityCache,
    store: &dyn Store,
    chain: &dyn ChainClient,
    config: &Config,
    events: &BlockMap<PositionEvent>,
) -> Result<(), Error> {
    let position_ids: BTreeSet<String> = events
        .events()
        .map(|event| event.position_id.clone())
        .collect();
    cache.defer::<Position, _, _>(position_ids.iter().cloned());
    cache.load::<Position>(store).await?;

    let missing: Vec<String> = position_ids
        .into_iter()
        .filter(|id| cache.get::<Position>(id).is_none())
        .collect();

    if let Some(header) = events.last_header().filter(|_| !missing.is_empty()) {
        log::debug!("initializing {} positions", missing.len());
        let infos = rpc::positions(chain, header.height, &config.position_manager_address, &missing).await?;

        let found: Vec<(&String, _)> = missing
            .iter()
            .zip(infos)
            .filter_map(|(id, info)| info.map(|info| (id, info)))
            .collect();
        let keys: Vec<(String, String, u32)> = found
            .iter()
            .map(|(_, info)| (info.token0.clone(), info.token1.clone(), info.fee))
            .collect();
        let pool_ids = rpc::get_pools(chain, header.height, &config.factory_address, &keys).await?;

        for ((id, info), pool_id) in found.into_iter().zip(pool_ids) {
            let pool_id = match pool_id {
                Some(pool_id) => pool_id,
                None => {
                    log::debug!("no pool for position {}, skipping", id);
                    continue;
                }
            };
            cache.add(Position {
                id: id.clone(),
                owner: ZERO_ADDRESS.to_string(),
                pool_id,
                token0_id: info.token0,
                token1_id: info.token1,
                tick_lower: info.tick_lower,
                tick_upper: info.tick_upper,
                fee_growth_inside0_last_x128: info.fee_growth_inside0_last_x128,
                fee_growth_inside1_last_x128: info.fee_growth_inside1_last_x128,
                ..Default::default()
            });
        }
    }

    let token_ids: Vec<String> = cache
        .values::<Position>()
        .flat_map(|position| [position.token0_id.clone(), position.token1_id.clone()])
        .collect();
    cache.defer::<Token, _, _>(token_ids);
    cache.load::<Token>(store).await?;

    for (header, block_events) in events {
        cache.defer::<PositionSnapshot, _, _>(
            block_events
                .iter()
                .map(|event| keyer::snapshot_id(&event.position_id, header.height)),
        );
    }
    cache.load::<PositionSnapshot>(store).await?;

    Ok(())
}
