#[macro_use]
mod macros;

pub mod abi;
pub mod block_map;
pub mod cache;
pub mod config;
pub mod error;
pub mod eth;
pub mod events;
mod factory;
pub mod intervals;
mod keyer;
pub mod math;
pub mod model;
mod pools;
mod positions;
pub mod prefetch;
pub mod price;
pub mod rpc;
pub mod store;
mod tokens;

#[cfg(test)]
mod test_utils;

use crate::cache::{EntityCache, FlushStats};
use crate::config::Config;
use crate::error::Error;
use crate::eth::Block;
use crate::intervals::Buckets;
use crate::rpc::ChainClient;
use crate::store::Store;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub pools_created: usize,
    pub pool_events: usize,
    pub position_events: usize,
    pub flushed: FlushStats,
}

/// Folds batches of finalized blocks into the store. Each batch runs against a fresh
/// entity cache and is written with a single flush, nothing is persisted when any phase
/// fails.
pub struct Indexer<S, C> {
    store: S,
    chain: C,
    config: Config,
}

impl<S: Store, C: ChainClient> Indexer<S, C> {
    pub fn new(store: S, chain: C, config: Config) -> Self {
        Indexer {
            store,
            chain,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn process_batch(&self, blocks: &[Block]) -> Result<BatchSummary, Error> {
        let last_block = match blocks.iter().map(|block| block.header.height).max() {
            Some(height) => height,
            None => return Ok(BatchSummary::default()),
        };

        let mut cache = EntityCache::new();
        let buckets = Buckets::new(&self.config);
        let mut summary = BatchSummary::default();

        let factory_events = events::factory_events(blocks, &self.config);
        if !factory_events.is_empty() {
            let new_tokens = prefetch::prefetch_factory_entities(
                &mut cache,
                &self.store,
                &self.chain,
                &self.config,
                &factory_events,
            )
            .await?;
            summary.pools_created =
                factory::handle_pools_created(&mut cache, &self.config, &factory_events, &new_tokens)?;
        }

        let pool_events = events::pool_events(blocks);
        if !pool_events.is_empty() {
            prefetch::prefetch_pool_entities(&mut cache, &self.store, &self.config, &buckets, &pool_events)
                .await?;
            summary.pool_events = pools::handle_pool_events(&mut cache, &self.config, &buckets, &pool_events)?;
            if self.config.refresh_fee_growth {
                pools::refresh_fee_growth(&mut cache, &self.chain, last_block).await?;
            }
        }

        let position_events = events::position_events(blocks, &self.config);
        if !position_events.is_empty() {
            prefetch::prefetch_positions(&mut cache, &self.store, &self.chain, &self.config, &position_events)
                .await?;
            summary.position_events =
                positions::handle_position_events(&mut cache, &self.config, &position_events)?;
        }

        summary.flushed = cache.flush(&self.store).await?;
        log::info!(
            "batch {}..={}: {} pools created, {} pool events, {} position events, {} upserted, {} inserted",
            blocks.iter().map(|block| block.header.height).min().unwrap_or(last_block),
            last_block,
            summary.pools_created,
            summary.pool_events,
            summary.position_events,
            summary.flushed.upserted,
            summary.flushed.inserted
        );
        Ok(summary)
    }
}
