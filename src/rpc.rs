use crate::abi;
use crate::abi::pool::functions::TickInfo;
use crate::abi::position_manager::functions::PositionInfo;
use crate::config::ZERO_ADDRESS;
use crate::error::Error;
use crate::eth::DecodeError;
use async_trait::async_trait;
use num_bigint::BigInt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RpcCall {
    pub to_addr: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RpcResponse {
    pub raw: Vec<u8>,
    /// The call reverted or the node refused it. `raw` then holds the error payload.
    pub failed: bool,
}

/// Read-only contract calls pinned at a block height.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns one response per call, in call order. An `Err` is a transport failure and
    /// aborts the batch, a reverted call is a `failed` response.
    async fn call_many(&self, block_number: u64, calls: Vec<RpcCall>) -> anyhow::Result<Vec<RpcResponse>>;
}

async fn eth_call(
    client: &dyn ChainClient,
    block_number: u64,
    calls: Vec<RpcCall>,
) -> Result<Vec<RpcResponse>, Error> {
    if calls.is_empty() {
        return Ok(vec![]);
    }
    let expected = calls.len();
    let responses = client.call_many(block_number, calls).await?;
    if responses.len() != expected {
        return Err(anyhow::anyhow!(
            "expected {} responses, got {}",
            expected,
            responses.len()
        )
        .into());
    }
    Ok(responses)
}

fn decode_response<T>(
    response: &RpcResponse,
    method: &str,
    target: &str,
    decode: fn(&[u8]) -> Result<T, DecodeError>,
) -> Option<T> {
    if response.failed {
        log::debug!(
            "{} on {} failed: {}",
            method,
            target,
            String::from_utf8_lossy(&response.raw)
        );
        return None;
    }
    match decode(&response.raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!("{} on {} returned garbage: {}", method, target, err);
            None
        }
    }
}

/// ERC20 metadata as far as the contract answers. Fields are `None` when the call failed
/// or its output could not be decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenMetadata {
    pub decimals: Option<u32>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub total_supply: Option<BigInt>,
}

pub async fn token_metadata(
    client: &dyn ChainClient,
    block_number: u64,
    token_ids: &[String],
) -> Result<Vec<TokenMetadata>, Error> {
    use abi::erc20::functions::{Decimals, Name, Symbol, TotalSupply};

    let mut calls = Vec::with_capacity(token_ids.len() * 4);
    for token_id in token_ids {
        for data in [
            Decimals {}.encode(),
            Symbol {}.encode(),
            Name {}.encode(),
            TotalSupply {}.encode(),
        ] {
            calls.push(RpcCall {
                to_addr: token_id.clone(),
                data,
            });
        }
    }

    let responses = eth_call(client, block_number, calls).await?;
    Ok(token_ids
        .iter()
        .zip(responses.chunks(4))
        .map(|(token_id, r)| TokenMetadata {
            decimals: decode_response(&r[0], "decimals", token_id, Decimals::output),
            symbol: decode_response(&r[1], "symbol", token_id, Symbol::output),
            name: decode_response(&r[2], "name", token_id, Name::output),
            total_supply: decode_response(&r[3], "totalSupply", token_id, TotalSupply::output),
        })
        .collect())
}

/// `(feeGrowthGlobal0X128, feeGrowthGlobal1X128)` per pool, `None` when either call failed.
pub async fn pool_fee_growth(
    client: &dyn ChainClient,
    block_number: u64,
    pool_ids: &[String],
) -> Result<Vec<Option<(BigInt, BigInt)>>, Error> {
    use abi::pool::functions::{FeeGrowthGlobal0X128, FeeGrowthGlobal1X128};

    let mut calls = Vec::with_capacity(pool_ids.len() * 2);
    for pool_id in pool_ids {
        calls.push(RpcCall {
            to_addr: pool_id.clone(),
            data: FeeGrowthGlobal0X128 {}.encode(),
        });
        calls.push(RpcCall {
            to_addr: pool_id.clone(),
            data: FeeGrowthGlobal1X128 {}.encode(),
        });
    }

    let responses = eth_call(client, block_number, calls).await?;
    Ok(pool_ids
        .iter()
        .zip(responses.chunks(2))
        .map(|(pool_id, r)| {
            let fee_growth0 =
                decode_response(&r[0], "feeGrowthGlobal0X128", pool_id, FeeGrowthGlobal0X128::output)?;
            let fee_growth1 =
                decode_response(&r[1], "feeGrowthGlobal1X128", pool_id, FeeGrowthGlobal1X128::output)?;
            Some((fee_growth0, fee_growth1))
        })
        .collect())
}

/// `ticks(tick_idx)` for each `(pool, tick_idx)`.
pub async fn tick_infos(
    client: &dyn ChainClient,
    block_number: u64,
    ticks: &[(String, i32)],
) -> Result<Vec<Option<TickInfo>>, Error> {
    use abi::pool::functions::Ticks;

    let calls = ticks
        .iter()
        .map(|(pool_id, tick_idx)| RpcCall {
            to_addr: pool_id.clone(),
            data: Ticks { tick: *tick_idx }.encode(),
        })
        .collect();

    let responses = eth_call(client, block_number, calls).await?;
    Ok(ticks
        .iter()
        .zip(responses.iter())
        .map(|((pool_id, _), response)| decode_response(response, "ticks", pool_id, Ticks::output))
        .collect())
}

/// `positions(tokenId)` on the position manager for each decimal token id.
pub async fn positions(
    client: &dyn ChainClient,
    block_number: u64,
    position_manager: &str,
    token_ids: &[String],
) -> Result<Vec<Option<PositionInfo>>, Error> {
    use abi::position_manager::functions::Positions;

    let mut encoded = Vec::with_capacity(token_ids.len());
    for token_id in token_ids {
        match (Positions {
            token_id: token_id.clone(),
        })
        .encode()
        {
            Ok(data) => encoded.push(Some(RpcCall {
                to_addr: position_manager.to_string(),
                data,
            })),
            Err(err) => {
                log::debug!("cannot encode positions({}): {}", token_id, err);
                encoded.push(None);
            }
        }
    }

    let responses = eth_call(client, block_number, encoded.iter().flatten().cloned().collect()).await?;
    let mut responses = responses.iter();
    Ok(encoded
        .iter()
        .zip(token_ids)
        .map(|(call, token_id)| {
            call.as_ref()?;
            let response = responses.next()?;
            decode_response(response, "positions", token_id, Positions::output)
        })
        .collect())
}

/// `getPool(token0, token1, fee)` on the factory. Unknown combinations answer the zero
/// address and map to `None`.
pub async fn get_pools(
    client: &dyn ChainClient,
    block_number: u64,
    factory: &str,
    keys: &[(String, String, u32)],
) -> Result<Vec<Option<String>>, Error> {
    use abi::factory::functions::GetPool;

    let mut encoded = Vec::with_capacity(keys.len());
    for (token0, token1, fee) in keys {
        let call = GetPool {
            token_a: token0.clone(),
            token_b: token1.clone(),
            fee: *fee,
        };
        match call.encode() {
            Ok(data) => encoded.push(Some(RpcCall {
                to_addr: factory.to_string(),
                data,
            })),
            Err(err) => {
                log::debug!("cannot encode getPool({}, {}, {}): {}", token0, token1, fee, err);
                encoded.push(None);
            }
        }
    }

    let responses = eth_call(client, block_number, encoded.iter().flatten().cloned().collect()).await?;
    let mut responses = responses.iter();
    Ok(encoded
        .iter()
        .map(|call| {
            call.as_ref()?;
            let response = responses.next()?;
            decode_response(response, "getPool", factory, GetPool::output)
                .filter(|pool_id| pool_id != ZERO_ADDRESS)
        })
        .collect())
}
