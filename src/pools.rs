use crate::abi::pool::events::{Burn as BurnEvent, Initialize, Mint as MintEvent, Swap as SwapEvent};
use crate::block_map::BlockMap;
use crate::cache::EntityCache;
use crate::config::Config;
use crate::error::Error;
use crate::eth::{BlockHeader, LogTransaction};
use crate::events::{PoolEvent, PoolEventType};
use crate::intervals::{self, Buckets};
use crate::keyer;
use crate::math;
use crate::model::{Bundle, Burn, Factory, Mint, Pool, Swap, Tick, Token, Transaction, BUNDLE_ID};
use crate::price;
use crate::rpc::{self, ChainClient};
use bigdecimal::{BigDecimal, One};

/// Folds pool events into the cache, block by block in log order. Events of pools the
/// cache does not know are skipped. Returns the number of events applied.
pub fn handle_pool_events(
    cache: &mut EntityCache,
    config: &Config,
    buckets: &Buckets,
    events: &BlockMap<PoolEvent>,
) -> Result<usize, Error> {
    let mut applied = 0;
    for (block, block_events) in events {
        for event in block_events {
            if cache.get::<Pool>(&event.pool_id).is_none() {
                log::debug!("skipping event {} of unknown pool {}", event.log_index, event.pool_id);
                continue;
            }
            let done = match (&event.r#type, &event.transaction) {
                (PoolEventType::Initialize(initialize), _) => {
                    handle_initialize(cache, config, buckets, block, &event.pool_id, initialize)?
                }
                (PoolEventType::Mint(mint), Some(trx)) => {
                    handle_mint(cache, config, buckets, block, trx, event, mint)?
                }
                (PoolEventType::Burn(burn), Some(trx)) => {
                    handle_burn(cache, config, buckets, block, trx, event, burn)?
                }
                (PoolEventType::Swap(swap), Some(trx)) => {
                    handle_swap(cache, config, buckets, block, trx, event, swap)?
                }
                (_, None) => false,
            };
            if done {
                applied += 1;
            }
        }
    }
    log::info!("applied {} of {} pool events", applied, events.len());
    Ok(applied)
}

struct Context {
    pool: Pool,
    token0: Token,
    token1: Token,
    factory: Factory,
    eth_price_usd: BigDecimal,
}

fn load_context(cache: &EntityCache, config: &Config, pool_id: &str) -> Result<Context, Error> {
    let pool = cache.get_or_fail::<Pool>(pool_id)?.clone();
    let token0 = cache.get_or_fail::<Token>(&pool.token0_id)?.clone();
    let token1 = cache.get_or_fail::<Token>(&pool.token1_id)?.clone();
    let factory = cache.get_or_fail::<Factory>(&config.factory_address)?.clone();
    let eth_price_usd = cache.get_or_fail::<Bundle>(BUNDLE_ID)?.eth_price_usd.clone();
    Ok(Context {
        pool,
        token0,
        token1,
        factory,
        eth_price_usd,
    })
}

impl Context {
    fn refresh_pool_tvl(&mut self) {
        self.pool.total_value_locked_eth = &self.pool.total_value_locked_token0 * &self.token0.derived_eth
            + &self.pool.total_value_locked_token1 * &self.token1.derived_eth;
        self.pool.total_value_locked_usd = &self.pool.total_value_locked_eth * &self.eth_price_usd;
    }

    /// Adds the pool TVL back to the factory, the inverse of `remove_pool_from_factory`.
    fn add_pool_to_factory(&mut self) {
        self.factory.total_value_locked_eth += &self.pool.total_value_locked_eth;
        self.factory.total_value_locked_usd = &self.factory.total_value_locked_eth * &self.eth_price_usd;
    }

    fn remove_pool_from_factory(&mut self) {
        self.factory.total_value_locked_eth -= &self.pool.total_value_locked_eth;
    }

    fn amount_usd(&self, amount0: &BigDecimal, amount1: &BigDecimal) -> BigDecimal {
        amount0 * (&self.token0.derived_eth * &self.eth_price_usd)
            + amount1 * (&self.token1.derived_eth * &self.eth_price_usd)
    }

    fn store(self, cache: &mut EntityCache) {
        cache.add(self.pool);
        cache.add(self.token0);
        cache.add(self.token1);
        cache.add(self.factory);
    }
}

fn update_token_tvl(token: &mut Token, eth_price_usd: &BigDecimal) {
    token.total_value_locked_usd = &token.total_value_locked * &token.derived_eth * eth_price_usd;
}

fn in_range(pool_tick: Option<i32>, tick_lower: i32, tick_upper: i32) -> bool {
    match pool_tick {
        Some(tick) => tick_lower <= tick && tick < tick_upper,
        None => false,
    }
}

fn new_tick(pool_id: &str, tick_idx: i32, block: &BlockHeader) -> Tick {
    let price0 = math::compute_price_from_tick_idx(tick_idx);
    let price1 = math::safe_div(&BigDecimal::one(), &price0);
    Tick {
        id: keyer::tick_id(pool_id, tick_idx),
        pool_id: pool_id.to_string(),
        tick_idx,
        created_at_timestamp: block.timestamp,
        created_at_block_number: block.height,
        price0,
        price1,
        ..Default::default()
    }
}

fn ensure_transaction(cache: &mut EntityCache, block: &BlockHeader, transaction: &LogTransaction) {
    if cache.get::<Transaction>(&transaction.hash).is_none() {
        cache.add(Transaction::new(block, transaction));
    }
}

fn update_pool_and_token_snapshots(
    cache: &mut EntityCache,
    buckets: &Buckets,
    block: &BlockHeader,
    pool_id: &str,
    token0_id: &str,
    token1_id: &str,
) -> Result<(), Error> {
    intervals::update_pool_day_data(cache, buckets, pool_id, block)?;
    intervals::update_pool_hour_data(cache, buckets, pool_id, block)?;
    intervals::update_token_day_data(cache, buckets, token0_id, block)?;
    intervals::update_token_hour_data(cache, buckets, token0_id, block)?;
    intervals::update_token_day_data(cache, buckets, token1_id, block)?;
    intervals::update_token_hour_data(cache, buckets, token1_id, block)?;
    Ok(())
}

/// Re-derives the ETH price of both tokens, token0 first and stored before token1 is
/// priced, then refreshes the bundle from the reference pool. Every entity involved must
/// already be in the cache with its latest state.
fn reprice(
    cache: &mut EntityCache,
    config: &Config,
    token0_id: &str,
    token1_id: &str,
) -> Result<BigDecimal, Error> {
    let derived0 = price::find_eth_per_token(cache, config, token0_id)?;
    cache.get_mut_or_fail::<Token>(token0_id)?.derived_eth = derived0;
    let derived1 = price::find_eth_per_token(cache, config, token1_id)?;
    cache.get_mut_or_fail::<Token>(token1_id)?.derived_eth = derived1;

    let eth_price_usd = price::get_eth_price_in_usd(cache, config);
    cache.get_mut_or_fail::<Bundle>(BUNDLE_ID)?.eth_price_usd = eth_price_usd.clone();
    Ok(eth_price_usd)
}

fn handle_initialize(
    cache: &mut EntityCache,
    config: &Config,
    buckets: &Buckets,
    block: &BlockHeader,
    pool_id: &str,
    event: &Initialize,
) -> Result<bool, Error> {
    let pool = cache.get_mut_or_fail::<Pool>(pool_id)?;
    pool.sqrt_price = event.sqrt_price_x96.clone();
    pool.tick = Some(event.tick);
    let token0_id = pool.token0_id.clone();
    let token1_id = pool.token1_id.clone();

    reprice(cache, config, &token0_id, &token1_id)?;
    update_pool_and_token_snapshots(cache, buckets, block, pool_id, &token0_id, &token1_id)?;
    Ok(true)
}

fn handle_mint(
    cache: &mut EntityCache,
    config: &Config,
    buckets: &Buckets,
    block: &BlockHeader,
    transaction: &LogTransaction,
    event: &PoolEvent,
    mint: &MintEvent,
) -> Result<bool, Error> {
    let mut ctx = load_context(cache, config, &event.pool_id)?;

    let amount0 = math::convert_token_to_decimal(&mint.amount0, ctx.token0.decimals);
    let amount1 = math::convert_token_to_decimal(&mint.amount1, ctx.token1.decimals);
    let amount_usd = ctx.amount_usd(&amount0, &amount1);

    // reset tvl aggregates until new amounts calculated
    ctx.remove_pool_from_factory();
    ctx.factory.tx_count += 1;

    ctx.token0.tx_count += 1;
    ctx.token0.total_value_locked += &amount0;
    update_token_tvl(&mut ctx.token0, &ctx.eth_price_usd);

    ctx.token1.tx_count += 1;
    ctx.token1.total_value_locked += &amount1;
    update_token_tvl(&mut ctx.token1, &ctx.eth_price_usd);

    ctx.pool.tx_count += 1;
    if in_range(ctx.pool.tick, mint.tick_lower, mint.tick_upper) {
        ctx.pool.liquidity += &mint.amount;
    }
    ctx.pool.total_value_locked_token0 += &amount0;
    ctx.pool.total_value_locked_token1 += &amount1;
    ctx.refresh_pool_tvl();
    ctx.add_pool_to_factory();

    ensure_transaction(cache, block, transaction);
    cache.add(Mint {
        id: keyer::pool_event_id(&ctx.pool.id, ctx.pool.tx_count),
        transaction_id: transaction.hash.clone(),
        timestamp: block.timestamp,
        pool_id: ctx.pool.id.clone(),
        token0_id: ctx.pool.token0_id.clone(),
        token1_id: ctx.pool.token1_id.clone(),
        owner: mint.owner.clone(),
        sender: mint.sender.clone(),
        origin: transaction.from.clone(),
        amount: mint.amount.clone(),
        amount0,
        amount1,
        amount_usd,
        tick_lower: mint.tick_lower,
        tick_upper: mint.tick_upper,
        log_index: event.log_index,
    });

    let pool_id = ctx.pool.id.clone();
    let token0_id = ctx.token0.id.clone();
    let token1_id = ctx.token1.id.clone();
    ctx.store(cache);

    let lower_tick_id = keyer::tick_id(&pool_id, mint.tick_lower);
    let lower = cache.get_or_create(&lower_tick_id, || new_tick(&pool_id, mint.tick_lower, block))?;
    lower.liquidity_gross += &mint.amount;
    lower.liquidity_net += &mint.amount;

    let upper_tick_id = keyer::tick_id(&pool_id, mint.tick_upper);
    let upper = cache.get_or_create(&upper_tick_id, || new_tick(&pool_id, mint.tick_upper, block))?;
    upper.liquidity_gross += &mint.amount;
    upper.liquidity_net -= &mint.amount;

    intervals::update_uniswap_day_data(cache, buckets, &config.factory_address, block)?;
    update_pool_and_token_snapshots(cache, buckets, block, &pool_id, &token0_id, &token1_id)?;
    intervals::update_tick_day_data(cache, buckets, &lower_tick_id, block)?;
    intervals::update_tick_day_data(cache, buckets, &upper_tick_id, block)?;
    Ok(true)
}

fn handle_burn(
    cache: &mut EntityCache,
    config: &Config,
    buckets: &Buckets,
    block: &BlockHeader,
    transaction: &LogTransaction,
    event: &PoolEvent,
    burn: &BurnEvent,
) -> Result<bool, Error> {
    let mut ctx = load_context(cache, config, &event.pool_id)?;

    let amount0 = math::convert_token_to_decimal(&burn.amount0, ctx.token0.decimals);
    let amount1 = math::convert_token_to_decimal(&burn.amount1, ctx.token1.decimals);
    let amount_usd = ctx.amount_usd(&amount0, &amount1);

    ctx.remove_pool_from_factory();
    ctx.factory.tx_count += 1;

    ctx.token0.tx_count += 1;
    ctx.token0.total_value_locked -= &amount0;
    update_token_tvl(&mut ctx.token0, &ctx.eth_price_usd);

    ctx.token1.tx_count += 1;
    ctx.token1.total_value_locked -= &amount1;
    update_token_tvl(&mut ctx.token1, &ctx.eth_price_usd);

    ctx.pool.tx_count += 1;
    if in_range(ctx.pool.tick, burn.tick_lower, burn.tick_upper) {
        ctx.pool.liquidity -= &burn.amount;
    }
    ctx.pool.total_value_locked_token0 -= &amount0;
    ctx.pool.total_value_locked_token1 -= &amount1;
    ctx.refresh_pool_tvl();
    ctx.add_pool_to_factory();

    ensure_transaction(cache, block, transaction);
    cache.add(Burn {
        id: keyer::pool_event_id(&ctx.pool.id, ctx.pool.tx_count),
        transaction_id: transaction.hash.clone(),
        timestamp: block.timestamp,
        pool_id: ctx.pool.id.clone(),
        token0_id: ctx.pool.token0_id.clone(),
        token1_id: ctx.pool.token1_id.clone(),
        owner: burn.owner.clone(),
        origin: transaction.from.clone(),
        amount: burn.amount.clone(),
        amount0,
        amount1,
        amount_usd,
        tick_lower: burn.tick_lower,
        tick_upper: burn.tick_upper,
        log_index: event.log_index,
    });

    let pool_id = ctx.pool.id.clone();
    let token0_id = ctx.token0.id.clone();
    let token1_id = ctx.token1.id.clone();
    ctx.store(cache);

    // ticks may predate the indexed range, a missing one is left alone
    let lower_tick_id = keyer::tick_id(&pool_id, burn.tick_lower);
    let lower_found = match cache.get_mut::<Tick>(&lower_tick_id) {
        Some(lower) => {
            lower.liquidity_gross -= &burn.amount;
            lower.liquidity_net -= &burn.amount;
            true
        }
        None => false,
    };
    let upper_tick_id = keyer::tick_id(&pool_id, burn.tick_upper);
    let upper_found = match cache.get_mut::<Tick>(&upper_tick_id) {
        Some(upper) => {
            upper.liquidity_gross -= &burn.amount;
            upper.liquidity_net += &burn.amount;
            true
        }
        None => false,
    };

    intervals::update_uniswap_day_data(cache, buckets, &config.factory_address, block)?;
    update_pool_and_token_snapshots(cache, buckets, block, &pool_id, &token0_id, &token1_id)?;
    if lower_found {
        intervals::update_tick_day_data(cache, buckets, &lower_tick_id, block)?;
    }
    if upper_found {
        intervals::update_tick_day_data(cache, buckets, &upper_tick_id, block)?;
    }
    Ok(true)
}

fn handle_swap(
    cache: &mut EntityCache,
    config: &Config,
    buckets: &Buckets,
    block: &BlockHeader,
    transaction: &LogTransaction,
    event: &PoolEvent,
    swap: &SwapEvent,
) -> Result<bool, Error> {
    if config.is_ignored_swap_pool(&event.pool_id) {
        log::debug!("ignoring swap on pool {}", event.pool_id);
        return Ok(false);
    }

    let mut ctx = load_context(cache, config, &event.pool_id)?;

    let amount0 = math::convert_token_to_decimal(&swap.amount0, ctx.token0.decimals);
    let amount1 = math::convert_token_to_decimal(&swap.amount1, ctx.token1.decimals);

    // need absolute amounts for volume
    let amount0_abs = amount0.abs();
    let amount1_abs = amount1.abs();

    let amount0_usd = &amount0_abs * &ctx.token0.derived_eth * &ctx.eth_price_usd;
    let amount1_usd = &amount1_abs * &ctx.token1.derived_eth * &ctx.eth_price_usd;

    // only one side counts as volume, both sides when both are whitelisted are averaged
    let amount_total_usd_tracked = price::get_tracked_amount_usd(
        config,
        &ctx.token0.id,
        &amount0_usd,
        &ctx.token1.id,
        &amount1_usd,
    );
    let amount_total_eth_tracked = math::safe_div(&amount_total_usd_tracked, &ctx.eth_price_usd);
    let amount_total_usd_untracked = (&amount0_usd + &amount1_usd) / BigDecimal::from(2);

    let fee_tier = BigDecimal::from(ctx.pool.fee_tier);
    let fees_eth = &amount_total_eth_tracked * &fee_tier / BigDecimal::from(1_000_000);
    let fees_usd = &amount_total_usd_tracked * &fee_tier / BigDecimal::from(1_000_000);

    ctx.factory.tx_count += 1;
    ctx.factory.total_volume_eth += &amount_total_eth_tracked;
    ctx.factory.total_volume_usd += &amount_total_usd_tracked;
    ctx.factory.untracked_volume_usd += &amount_total_usd_untracked;
    ctx.factory.total_fees_eth += &fees_eth;
    ctx.factory.total_fees_usd += &fees_usd;
    ctx.remove_pool_from_factory();

    ctx.pool.tx_count += 1;
    ctx.pool.volume_token0 += &amount0_abs;
    ctx.pool.volume_token1 += &amount1_abs;
    ctx.pool.volume_usd += &amount_total_usd_tracked;
    ctx.pool.untracked_volume_usd += &amount_total_usd_untracked;
    ctx.pool.fees_usd += &fees_usd;

    ctx.pool.liquidity = swap.liquidity.clone();
    ctx.pool.tick = Some(swap.tick);
    ctx.pool.sqrt_price = swap.sqrt_price_x96.clone();
    ctx.pool.total_value_locked_token0 += &amount0;
    ctx.pool.total_value_locked_token1 += &amount1;

    ctx.token0.tx_count += 1;
    ctx.token0.volume += &amount0_abs;
    ctx.token0.total_value_locked += &amount0;
    ctx.token0.volume_usd += &amount_total_usd_tracked;
    ctx.token0.untracked_volume_usd += &amount_total_usd_untracked;
    ctx.token0.fees_usd += &fees_usd;

    ctx.token1.tx_count += 1;
    ctx.token1.volume += &amount1_abs;
    ctx.token1.total_value_locked += &amount1;
    ctx.token1.volume_usd += &amount_total_usd_tracked;
    ctx.token1.untracked_volume_usd += &amount_total_usd_untracked;
    ctx.token1.fees_usd += &fees_usd;

    let (token0_price, token1_price) =
        price::sqrt_price_x96_to_token_prices(&ctx.pool.sqrt_price, &ctx.token0, &ctx.token1);
    ctx.pool.token0_price = token0_price;
    ctx.pool.token1_price = token1_price;

    // pricing reads the cache, publish the new pool state first
    cache.add(ctx.pool.clone());
    cache.add(ctx.token0.clone());
    cache.add(ctx.token1.clone());
    ctx.eth_price_usd = reprice(cache, config, &ctx.token0.id, &ctx.token1.id)?;
    ctx.token0.derived_eth = cache.get_or_fail::<Token>(&ctx.token0.id)?.derived_eth.clone();
    ctx.token1.derived_eth = cache.get_or_fail::<Token>(&ctx.token1.id)?.derived_eth.clone();

    ctx.refresh_pool_tvl();
    ctx.add_pool_to_factory();
    update_token_tvl(&mut ctx.token0, &ctx.eth_price_usd);
    update_token_tvl(&mut ctx.token1, &ctx.eth_price_usd);

    ensure_transaction(cache, block, transaction);
    cache.add(Swap {
        id: keyer::pool_event_id(&ctx.pool.id, ctx.pool.tx_count),
        transaction_id: transaction.hash.clone(),
        timestamp: block.timestamp,
        pool_id: ctx.pool.id.clone(),
        token0_id: ctx.pool.token0_id.clone(),
        token1_id: ctx.pool.token1_id.clone(),
        sender: swap.sender.clone(),
        recipient: swap.recipient.clone(),
        origin: transaction.from.clone(),
        amount0,
        amount1,
        amount_usd: amount_total_usd_tracked.clone(),
        sqrt_price_x96: swap.sqrt_price_x96.clone(),
        tick: swap.tick,
        log_index: event.log_index,
    });

    let pool_id = ctx.pool.id.clone();
    let token0_id = ctx.token0.id.clone();
    let token1_id = ctx.token1.id.clone();
    let fee_tier = ctx.pool.fee_tier;
    ctx.store(cache);

    let day = intervals::update_uniswap_day_data(cache, buckets, &config.factory_address, block)?;
    day.volume_eth += &amount_total_eth_tracked;
    day.volume_usd += &amount_total_usd_tracked;
    day.volume_usd_untracked += &amount_total_usd_untracked;
    day.fees_usd += &fees_usd;

    let pool_day = intervals::update_pool_day_data(cache, buckets, &pool_id, block)?;
    pool_day.volume_usd += &amount_total_usd_tracked;
    pool_day.volume_token0 += &amount0_abs;
    pool_day.volume_token1 += &amount1_abs;
    pool_day.fees_usd += &fees_usd;

    let pool_hour = intervals::update_pool_hour_data(cache, buckets, &pool_id, block)?;
    pool_hour.volume_usd += &amount_total_usd_tracked;
    pool_hour.volume_token0 += &amount0_abs;
    pool_hour.volume_token1 += &amount1_abs;
    pool_hour.fees_usd += &fees_usd;

    for (token_id, amount_abs) in [(&token0_id, &amount0_abs), (&token1_id, &amount1_abs)] {
        let token_day = intervals::update_token_day_data(cache, buckets, token_id, block)?;
        token_day.volume += amount_abs;
        token_day.volume_usd += &amount_total_usd_tracked;
        token_day.untracked_volume_usd += &amount_total_usd_untracked;
        token_day.fees_usd += &fees_usd;

        let token_hour = intervals::update_token_hour_data(cache, buckets, token_id, block)?;
        token_hour.volume += amount_abs;
        token_hour.volume_usd += &amount_total_usd_tracked;
        token_hour.untracked_volume_usd += &amount_total_usd_untracked;
        token_hour.fees_usd += &fees_usd;
    }

    // a tick landing on the spacing grid gets a row, an existing one is kept as is
    if swap.tick % math::fee_tier_to_tick_spacing(fee_tier) == 0 {
        let tick_id = keyer::tick_id(&pool_id, swap.tick);
        cache.get_or_create(&tick_id, || new_tick(&pool_id, swap.tick, block))?;
    }

    Ok(true)
}

/// Pulls the fee growth accumulators of every cached pool and tick as of `block_number`.
/// Items whose call fails keep their previous values.
pub async fn refresh_fee_growth(
    cache: &mut EntityCache,
    chain: &dyn ChainClient,
    block_number: u64,
) -> Result<(), Error> {
    let pool_ids = cache.ids::<Pool>();
    let fee_growth = rpc::pool_fee_growth(chain, block_number, &pool_ids).await?;
    for (pool_id, fee_growth) in pool_ids.iter().zip(fee_growth) {
        if let Some((fee_growth0, fee_growth1)) = fee_growth {
            let pool = cache.get_mut_or_fail::<Pool>(pool_id)?;
            pool.fee_growth_global0_x128 = fee_growth0;
            pool.fee_growth_global1_x128 = fee_growth1;
        }
    }

    let ticks: Vec<(String, String, i32)> = cache
        .values::<Tick>()
        .map(|tick| (tick.id.clone(), tick.pool_id.clone(), tick.tick_idx))
        .collect();
    let calls: Vec<(String, i32)> = ticks
        .iter()
        .map(|(_, pool_id, tick_idx)| (pool_id.clone(), *tick_idx))
        .collect();
    let infos = rpc::tick_infos(chain, block_number, &calls).await?;
    for ((tick_id, _, _), info) in ticks.iter().zip(infos) {
        if let Some(info) = info {
            let tick = cache.get_mut_or_fail::<Tick>(tick_id)?;
            tick.fee_growth_outside0_x128 = info.fee_growth_outside0_x128;
            tick.fee_growth_outside1_x128 = info.fee_growth_outside1_x128;
        }
    }

    log::debug!(
        "refreshed fee growth of {} pools and {} ticks at block {}",
        pool_ids.len(),
        ticks.len(),
        block_number
    );
    Ok(())
}
