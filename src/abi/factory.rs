pub mod events {
    use crate::abi::{match_log, Values};
    use crate::eth::{DecodeError, Log};
    use ethabi::ParamType;
    use hex_literal::hex;

    #[derive(Clone, Debug, PartialEq)]
    pub struct PoolCreated {
        pub token0: String,
        pub token1: String,
        pub fee: u32,
        pub tick_spacing: i32,
        pub pool: String,
    }

    impl PoolCreated {
        pub const TOPIC_ID: [u8; 32] =
            hex!("783cca1c0412dd0d695e784568c96da2e9c22ff989357a2e8b1d9b2b4e6b7118");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 4, 64)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values =
                Values::decode(&[ParamType::Int(24), ParamType::Address], &log.data)?;
            Ok(PoolCreated {
                token0: Values::topic(log, 1, ParamType::Address)?.address()?,
                token1: Values::topic(log, 2, ParamType::Address)?.address()?,
                fee: Values::topic(log, 3, ParamType::Uint(24))?.u32()?,
                tick_spacing: values.i32()?,
                pool: values.address()?,
            })
        }
    }
}

pub mod functions {
    use crate::abi::{encode_call, Values};
    use crate::eth::{self, DecodeError};
    use ethabi::{ParamType, Token};
    use hex_literal::hex;

    #[derive(Clone, Debug, PartialEq)]
    pub struct GetPool {
        pub token_a: String,
        pub token_b: String,
        pub fee: u32,
    }

    impl GetPool {
        pub const METHOD_ID: [u8; 4] = hex!("1698ee82");

        pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
            Ok(encode_call(
                Self::METHOD_ID,
                &[
                    Token::Address(eth::parse_address(&self.token_a)?),
                    Token::Address(eth::parse_address(&self.token_b)?),
                    Token::Uint(ethabi::Uint::from(self.fee)),
                ],
            ))
        }

        pub fn output(data: &[u8]) -> Result<String, DecodeError> {
            Values::decode(&[ParamType::Address], data)?.address()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::events::PoolCreated;
    use super::functions::GetPool;
    use crate::test_utils::{int_word, pool_log, topic_address, uint_word};

    #[test]
    fn test_decode_pool_created() {
        let mut data = int_word(60);
        data.extend(topic_address("0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8"));
        let log = pool_log(
            "0x1f98431c8ad98523631ae4a59f267346ea31f984",
            vec![
                PoolCreated::TOPIC_ID.to_vec(),
                topic_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                topic_address("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
                uint_word(3000),
            ],
            data,
        );

        assert!(PoolCreated::match_log(&log));
        let event = PoolCreated::decode(&log).unwrap();
        assert_eq!("0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8", event.pool);
        assert_eq!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", event.token0);
        assert_eq!(3000, event.fee);
        assert_eq!(60, event.tick_spacing);
    }

    #[test]
    fn test_get_pool_round_trip() {
        let call = GetPool {
            token_a: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            token_b: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
            fee: 500,
        };
        let encoded = call.encode().unwrap();
        assert_eq!(4 + 3 * 32, encoded.len());
        assert_eq!(&GetPool::METHOD_ID, &encoded[0..4]);

        let output = topic_address("0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640");
        assert_eq!(
            "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640",
            GetPool::output(&output).unwrap()
        );
    }
}
