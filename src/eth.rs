use num_bigint::{BigInt, Sign};
use thiserror::Error;

/// A finalized block as handed over by the log subscription layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    pub logs: Vec<Log>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: String,
    /// Unix seconds.
    pub timestamp: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Log {
    /// Lowercase, `0x` prefixed emitter address.
    pub address: String,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
    pub log_index: u32,
    pub transaction: Option<LogTransaction>,
}

/// Parent transaction of a log, only required for pool Mint/Burn/Swap logs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogTransaction {
    pub hash: String,
    pub from: String,
    pub gas: BigInt,
    pub gas_price: BigInt,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid decoding: {msg}")]
pub struct DecodeError {
    pub msg: String,
}

impl DecodeError {
    pub fn new(msg: impl Into<String>) -> Self {
        DecodeError { msg: msg.into() }
    }
}

pub fn address_to_string(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn parse_address(address: &str) -> Result<ethabi::Address, DecodeError> {
    let raw = hex::decode(address.trim_start_matches("0x"))
        .map_err(|e| DecodeError::new(format!("address {}: {}", address, e)))?;
    if raw.len() != 20 {
        return Err(DecodeError::new(format!(
            "address {} has {} bytes",
            address,
            raw.len()
        )));
    }
    Ok(ethabi::Address::from_slice(&raw))
}

pub fn uint_to_big_int(value: &ethabi::Uint) -> BigInt {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    BigInt::from_bytes_be(Sign::Plus, &buf)
}

/// Reads a two's complement 256 bits word, which is how every `intN` is laid out in the ABI.
pub fn int_to_big_int(value: &ethabi::Int) -> BigInt {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    BigInt::from_signed_bytes_be(&buf)
}

pub fn i32_to_int(value: i32) -> ethabi::Int {
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 32];
    buf[28..].copy_from_slice(&value.to_be_bytes());
    ethabi::Int::from_big_endian(&buf)
}

pub fn read_string_from_bytes(input: &[u8]) -> String {
    // bytes32 symbols and names are right padded with zeros
    if let Some(last) = input.iter().rev().position(|&pos| pos != 0) {
        return String::from_utf8_lossy(&input[0..input.len() - last]).to_string();
    }

    "".to_string()
}
