use crate::abi::pool::events::Swap;
use crate::eth::{BlockHeader, Log, LogTransaction};
use crate::events::{PoolEvent, PoolEventType};
use crate::model::{Pool, Token};
use crate::rpc::{ChainClient, RpcCall, RpcResponse};
use async_trait::async_trait;
use num_bigint::BigInt;
use parking_lot::Mutex;
use std::collections::HashMap;

pub const TX_HASH: &str = "0x00000000000000000000000000000000000000000000000000000000000000f1";
pub const TX_FROM: &str = "0x00000000000000000000000000000000000000f2";

pub fn uint_word(value: u128) -> Vec<u8> {
    let mut word = vec![0u8; 16];
    word.extend_from_slice(&value.to_be_bytes());
    word
}

pub fn int_word(value: i64) -> Vec<u8> {
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut word = vec![fill; 24];
    word.extend_from_slice(&value.to_be_bytes());
    word
}

pub fn topic_int(value: i32) -> Vec<u8> {
    int_word(value as i64)
}

pub fn topic_address(address: &str) -> Vec<u8> {
    let mut word = vec![0u8; 12];
    word.extend(hex::decode(address.trim_start_matches("0x")).unwrap());
    word
}

pub fn pool_log(address: &str, topics: Vec<Vec<u8>>, data: Vec<u8>) -> Log {
    Log {
        address: address.to_string(),
        topics,
        data,
        log_index: 0,
        transaction: Some(transaction()),
    }
}

pub fn transaction() -> LogTransaction {
    LogTransaction {
        hash: TX_HASH.to_string(),
        from: TX_FROM.to_string(),
        gas: BigInt::from(21000),
        gas_price: BigInt::from(30_000_000_000u64),
    }
}

pub fn header(height: u64, timestamp: u64) -> BlockHeader {
    BlockHeader {
        height,
        hash: format!("0x{:064x}", height),
        timestamp,
    }
}

pub fn token(id: &str, decimals: u32) -> Token {
    Token {
        id: id.to_string(),
        symbol: "TKN".to_string(),
        name: "Token".to_string(),
        decimals,
        ..Default::default()
    }
}

pub fn pool_with_tokens(id: &str, token0_id: &str, token1_id: &str) -> Pool {
    Pool::new(id, token0_id, token1_id, 3000, &header(1, 12))
}

pub fn pool_event_swap(pool_id: &str, tick: i32) -> PoolEvent {
    PoolEvent {
        pool_id: pool_id.to_string(),
        log_index: 0,
        transaction: Some(transaction()),
        r#type: PoolEventType::Swap(Swap {
            sender: TX_FROM.to_string(),
            recipient: TX_FROM.to_string(),
            amount0: BigInt::from(-100),
            amount1: BigInt::from(99),
            sqrt_price_x96: BigInt::from(1u128 << 96),
            liquidity: BigInt::from(1000),
            tick,
        }),
    }
}

/// Chain double answering scripted `(to, data)` pairs. Anything unscripted reverts.
#[derive(Default)]
pub struct ScriptedChain {
    responses: Mutex<HashMap<RpcCall, Vec<u8>>>,
    blocks: Mutex<Vec<u64>>,
    transport_down: Mutex<bool>,
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, to: &str, data: Vec<u8>, raw: Vec<u8>) {
        self.responses.lock().insert(
            RpcCall {
                to_addr: to.to_string(),
                data,
            },
            raw,
        );
    }

    pub fn fail_transport(&self) {
        *self.transport_down.lock() = true;
    }

    /// Block number of every call served, one entry per call.
    pub fn blocks(&self) -> Vec<u64> {
        self.blocks.lock().clone()
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn call_many(&self, block_number: u64, calls: Vec<RpcCall>) -> anyhow::Result<Vec<RpcResponse>> {
        if *self.transport_down.lock() {
            anyhow::bail!("connection refused");
        }
        let responses = self.responses.lock();
        let mut blocks = self.blocks.lock();
        Ok(calls
            .iter()
            .map(|call| {
                blocks.push(block_number);
                match responses.get(call) {
                    Some(raw) => RpcResponse {
                        raw: raw.clone(),
                        failed: false,
                    },
                    None => RpcResponse {
                        raw: b"execution reverted".to_vec(),
                        failed: true,
                    },
                }
            })
            .collect())
    }
}
