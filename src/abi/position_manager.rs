pub mod events {
    use crate::abi::{match_log, Values};
    use crate::eth::{DecodeError, Log};
    use ethabi::ParamType;
    use hex_literal::hex;
    use num_bigint::BigInt;

    #[derive(Clone, Debug, PartialEq)]
    pub struct IncreaseLiquidity {
        pub token_id: BigInt,
        pub liquidity: BigInt,
        pub amount0: BigInt,
        pub amount1: BigInt,
    }

    impl IncreaseLiquidity {
        pub const TOPIC_ID: [u8; 32] =
            hex!("3067048beee31b25b2f1681f88dac838c8bba36af25bfb2b7cf7473a5847e35f");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 2, 96)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Uint(128),
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                ],
                &log.data,
            )?;
            Ok(IncreaseLiquidity {
                token_id: Values::topic(log, 1, ParamType::Uint(256))?.uint()?,
                liquidity: values.uint()?,
                amount0: values.uint()?,
                amount1: values.uint()?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct DecreaseLiquidity {
        pub token_id: BigInt,
        pub liquidity: BigInt,
        pub amount0: BigInt,
        pub amount1: BigInt,
    }

    impl DecreaseLiquidity {
        pub const TOPIC_ID: [u8; 32] =
            hex!("26f6a048ee9138f2c0ce266f322cb99228e8d619ae2bff30c67f8dcf9d2377b4");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 2, 96)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Uint(128),
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                ],
                &log.data,
            )?;
            Ok(DecreaseLiquidity {
                token_id: Values::topic(log, 1, ParamType::Uint(256))?.uint()?,
                liquidity: values.uint()?,
                amount0: values.uint()?,
                amount1: values.uint()?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Collect {
        pub token_id: BigInt,
        pub recipient: String,
        pub amount0: BigInt,
        pub amount1: BigInt,
    }

    impl Collect {
        pub const TOPIC_ID: [u8; 32] =
            hex!("40d0efd1a53d60ecbf40971b9daf7dc90178c3aadc7aab1765632738fa8b8f01");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 2, 96)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Address,
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                ],
                &log.data,
            )?;
            Ok(Collect {
                token_id: Values::topic(log, 1, ParamType::Uint(256))?.uint()?,
                recipient: values.address()?,
                amount0: values.uint()?,
                amount1: values.uint()?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Transfer {
        pub from: String,
        pub to: String,
        pub token_id: BigInt,
    }

    impl Transfer {
        pub const TOPIC_ID: [u8; 32] =
            hex!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 4, 0)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            Ok(Transfer {
                from: Values::topic(log, 1, ParamType::Address)?.address()?,
                to: Values::topic(log, 2, ParamType::Address)?.address()?,
                token_id: Values::topic(log, 3, ParamType::Uint(256))?.uint()?,
            })
        }
    }
}

pub mod functions {
    use crate::abi::{encode_call, Values};
    use crate::eth::DecodeError;
    use ethabi::{ParamType, Token};
    use hex_literal::hex;
    use num_bigint::BigInt;

    #[derive(Clone, Debug, PartialEq)]
    pub struct Positions {
        /// Decimal NFT id.
        pub token_id: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct PositionInfo {
        pub token0: String,
        pub token1: String,
        pub fee: u32,
        pub tick_lower: i32,
        pub tick_upper: i32,
        pub liquidity: BigInt,
        pub fee_growth_inside0_last_x128: BigInt,
        pub fee_growth_inside1_last_x128: BigInt,
    }

    impl Positions {
        pub const METHOD_ID: [u8; 4] = hex!("99fbab88");

        pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
            let token_id = ethabi::Uint::from_dec_str(&self.token_id)
                .map_err(|e| DecodeError::new(format!("token id {}: {:?}", self.token_id, e)))?;
            Ok(encode_call(Self::METHOD_ID, &[Token::Uint(token_id)]))
        }

        pub fn output(data: &[u8]) -> Result<PositionInfo, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Uint(96),
                    ParamType::Address,
                    ParamType::Address,
                    ParamType::Address,
                    ParamType::Uint(24),
                    ParamType::Int(24),
                    ParamType::Int(24),
                    ParamType::Uint(128),
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                    ParamType::Uint(128),
                    ParamType::Uint(128),
                ],
                data,
            )?;
            // nonce, operator
            values.skip()?;
            values.skip()?;

            Ok(PositionInfo {
                token0: values.address()?,
                token1: values.address()?,
                fee: values.u32()?,
                tick_lower: values.i32()?,
                tick_upper: values.i32()?,
                liquidity: values.uint()?,
                fee_growth_inside0_last_x128: values.uint()?,
                fee_growth_inside1_last_x128: values.uint()?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::events::{Collect, DecreaseLiquidity, IncreaseLiquidity, Transfer};
    use super::functions::Positions;
    use crate::test_utils::{int_word, pool_log, topic_address, uint_word};
    use num_bigint::BigInt;

    const MANAGER: &str = "0xc36442b4a4522e871399cd717abdd847ab11fe88";

    #[test]
    fn test_decode_liquidity_events() {
        let mut data = uint_word(1000);
        data.extend(uint_word(5));
        data.extend(uint_word(6));
        let log = pool_log(
            MANAGER,
            vec![IncreaseLiquidity::TOPIC_ID.to_vec(), uint_word(42)],
            data.clone(),
        );
        assert!(IncreaseLiquidity::match_log(&log));
        assert!(!DecreaseLiquidity::match_log(&log));
        let increase = IncreaseLiquidity::decode(&log).unwrap();
        assert_eq!(BigInt::from(42), increase.token_id);
        assert_eq!(BigInt::from(1000), increase.liquidity);
        assert_eq!(BigInt::from(6), increase.amount1);

        let mut data = topic_address("0x00000000000000000000000000000000000000a1");
        data.extend(uint_word(5));
        data.extend(uint_word(6));
        let log = pool_log(
            MANAGER,
            vec![Collect::TOPIC_ID.to_vec(), uint_word(42)],
            data,
        );
        let collect = Collect::decode(&log).unwrap();
        assert_eq!("0x00000000000000000000000000000000000000a1", collect.recipient);
        assert_eq!(BigInt::from(5), collect.amount0);
    }

    #[test]
    fn test_decode_transfer() {
        let log = pool_log(
            MANAGER,
            vec![
                Transfer::TOPIC_ID.to_vec(),
                topic_address("0x0000000000000000000000000000000000000000"),
                topic_address("0x00000000000000000000000000000000000000b2"),
                uint_word(7),
            ],
            vec![],
        );
        let transfer = Transfer::decode(&log).unwrap();
        assert_eq!("0x00000000000000000000000000000000000000b2", transfer.to);
        assert_eq!(BigInt::from(7), transfer.token_id);
    }

    #[test]
    fn test_positions_output() {
        let mut data = uint_word(0);
        data.extend(topic_address("0x0000000000000000000000000000000000000000"));
        data.extend(topic_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
        data.extend(topic_address("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        data.extend(uint_word(500));
        data.extend(int_word(-200));
        data.extend(int_word(200));
        data.extend(uint_word(10));
        data.extend(uint_word(1));
        data.extend(uint_word(2));
        data.extend(uint_word(0));
        data.extend(uint_word(0));

        let info = Positions::output(&data).unwrap();
        assert_eq!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", info.token0);
        assert_eq!(500, info.fee);
        assert_eq!(-200, info.tick_lower);
        assert_eq!(BigInt::from(2), info.fee_growth_inside1_last_x128);

        let encoded = Positions {
            token_id: "42".to_string(),
        }
        .encode()
        .unwrap();
        assert_eq!(42, encoded[35]);
        assert!(Positions {
            token_id: "x".to_string()
        }
        .encode()
        .is_err());
    }
}
