//! Hand-written decoders for the handful of Uniswap v3 and ERC20 events and calls the
//! indexer consumes. Every event exposes `TOPIC_ID`, `match_log` and `decode`, every call
//! exposes `METHOD_ID`, `encode` and `output`.

pub mod erc20;
pub mod factory;
pub mod pool;
pub mod position_manager;

use crate::eth::{self, DecodeError, Log};
use ethabi::{ParamType, Token};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

pub(crate) fn match_log(log: &Log, topic_id: &[u8; 32], topics: usize, data_len: usize) -> bool {
    if log.topics.len() != topics {
        return false;
    }
    if log.data.len() != data_len {
        return false;
    }
    return log.topics[0].as_slice() == topic_id;
}

pub(crate) fn encode_call(method_id: [u8; 4], args: &[Token]) -> Vec<u8> {
    let mut data = method_id.to_vec();
    data.extend(ethabi::encode(args));
    data
}

/// Decoded ABI values consumed in declaration order.
pub(crate) struct Values {
    inner: std::vec::IntoIter<Token>,
}

impl Values {
    pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Self, DecodeError> {
        let tokens = ethabi::decode(types, data)
            .map_err(|e| DecodeError::new(format!("unable to decode data: {}", e)))?;
        Ok(Values {
            inner: tokens.into_iter(),
        })
    }

    pub fn topic(log: &Log, index: usize, kind: ParamType) -> Result<Self, DecodeError> {
        let topic = log
            .topics
            .get(index)
            .ok_or_else(|| DecodeError::new(format!("missing topic {}", index)))?;
        Self::decode(&[kind], topic)
    }

    fn next_token(&mut self) -> Result<Token, DecodeError> {
        self.inner
            .next()
            .ok_or_else(|| DecodeError::new("not enough values"))
    }

    pub fn address(&mut self) -> Result<String, DecodeError> {
        match self.next_token()? {
            Token::Address(address) => Ok(eth::address_to_string(address.as_bytes())),
            other => Err(unexpected("address", other)),
        }
    }

    pub fn uint(&mut self) -> Result<BigInt, DecodeError> {
        match self.next_token()? {
            Token::Uint(value) => Ok(eth::uint_to_big_int(&value)),
            other => Err(unexpected("uint", other)),
        }
    }

    pub fn int(&mut self) -> Result<BigInt, DecodeError> {
        match self.next_token()? {
            Token::Int(value) => Ok(eth::int_to_big_int(&value)),
            other => Err(unexpected("int", other)),
        }
    }

    pub fn i32(&mut self) -> Result<i32, DecodeError> {
        let value = self.int()?;
        value
            .to_i32()
            .ok_or_else(|| DecodeError::new(format!("{} does not fit an i32", value)))
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        let value = self.uint()?;
        value
            .to_u32()
            .ok_or_else(|| DecodeError::new(format!("{} does not fit an u32", value)))
    }

    pub fn string(&mut self) -> Result<String, DecodeError> {
        match self.next_token()? {
            Token::String(value) => Ok(value),
            other => Err(unexpected("string", other)),
        }
    }

    pub fn fixed_bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        match self.next_token()? {
            Token::FixedBytes(value) => Ok(value),
            other => Err(unexpected("fixed bytes", other)),
        }
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        match self.next_token()? {
            Token::Bool(value) => Ok(value),
            other => Err(unexpected("bool", other)),
        }
    }

    pub fn skip(&mut self) -> Result<(), DecodeError> {
        self.next_token().map(|_| ())
    }
}

fn unexpected(expected: &str, token: Token) -> DecodeError {
    DecodeError::new(format!("expected {}, got {:?}", expected, token))
}
