pub mod events {
    use crate::abi::{match_log, Values};
    use crate::eth::{DecodeError, Log};
    use ethabi::ParamType;
    use hex_literal::hex;
    use num_bigint::BigInt;

    #[derive(Clone, Debug, PartialEq)]
    pub struct Initialize {
        pub sqrt_price_x96: BigInt,
        pub tick: i32,
    }

    impl Initialize {
        pub const TOPIC_ID: [u8; 32] =
            hex!("98636036cb66a9c19a37435efc1e90142190214e8abeb821bdba3f2990dd4c95");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 1, 64)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values =
                Values::decode(&[ParamType::Uint(160), ParamType::Int(24)], &log.data)?;
            Ok(Initialize {
                sqrt_price_x96: values.uint()?,
                tick: values.i32()?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Mint {
        pub sender: String,
        pub owner: String,
        pub tick_lower: i32,
        pub tick_upper: i32,
        pub amount: BigInt,
        pub amount0: BigInt,
        pub amount1: BigInt,
    }

    impl Mint {
        pub const TOPIC_ID: [u8; 32] =
            hex!("7a53080ba414158be7ec69b987b5fb7d07dee101fe85488f0853ae16239d0bde");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 4, 128)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Address,
                    ParamType::Uint(128),
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                ],
                &log.data,
            )?;
            Ok(Mint {
                owner: Values::topic(log, 1, ParamType::Address)?.address()?,
                tick_lower: Values::topic(log, 2, ParamType::Int(24))?.i32()?,
                tick_upper: Values::topic(log, 3, ParamType::Int(24))?.i32()?,
                sender: values.address()?,
                amount: values.uint()?,
                amount0: values.uint()?,
                amount1: values.uint()?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Burn {
        pub owner: String,
        pub tick_lower: i32,
        pub tick_upper: i32,
        pub amount: BigInt,
        pub amount0: BigInt,
        pub amount1: BigInt,
    }

    impl Burn {
        pub const TOPIC_ID: [u8; 32] =
            hex!("0c396cd989a39f4459b5fa1aed6a9a8dcdbc45908acfd67e028cd568da98982c");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 4, 96)
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
            Ok(Burn {
                owner: Values::topic(log, 1, ParamType::Address)?.address()?,
                tick_lower: Values::topic(log, 2, ParamType::Int(24))?.i32()?,
                tick_upper: Values::topic(log, 3, ParamType::Int(24))?.i32()?,
                amount: values.uint()?,
                amount0: values.uint()?,
                amount1: values.uint()?,
            })
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Swap {
        pub sender: String,
        pub recipient: String,
        pub amount0: BigInt,
        pub amount1: BigInt,
        pub sqrt_price_x96: BigInt,
        pub liquidity: BigInt,
        pub tick: i32,
    }

    impl Swap {
        pub const TOPIC_ID: [u8; 32] =
            hex!("c42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");

        pub fn match_log(log: &Log) -> bool {
            match_log(log, &Self::TOPIC_ID, 3, 160)
        }

        pub fn decode(log: &Log) -> Result<Self, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Int(256),
                    ParamType::Int(256),
                    ParamType::Uint(160),
                    ParamType::Uint(128),
                    ParamType::Int(24),
                ],
                &log.data,
            )?;
            Ok(Swap {
                sender: Values::topic(log, 1, ParamType::Address)?.address()?,
                recipient: Values::topic(log, 2, ParamType::Address)?.address()?,
                amount0: values.int()?,
                amount1: values.int()?,
                sqrt_price_x96: values.uint()?,
                liquidity: values.uint()?,
                tick: values.i32()?,
            })
        }
    }
}

pub mod functions {
    use crate::abi::{encode_call, Values};
    use crate::eth::{self, DecodeError};
    use ethabi::{ParamType, Token};
    use hex_literal::hex;
    use num_bigint::BigInt;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct FeeGrowthGlobal0X128 {}

    impl FeeGrowthGlobal0X128 {
        pub const METHOD_ID: [u8; 4] = hex!("f3058399");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[])
        }

        pub fn output(data: &[u8]) -> Result<BigInt, DecodeError> {
            Values::decode(&[ParamType::Uint(256)], data)?.uint()
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct FeeGrowthGlobal1X128 {}

    impl FeeGrowthGlobal1X128 {
        pub const METHOD_ID: [u8; 4] = hex!("46141319");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[])
        }

        pub fn output(data: &[u8]) -> Result<BigInt, DecodeError> {
            Values::decode(&[ParamType::Uint(256)], data)?.uint()
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Ticks {
        pub tick: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct TickInfo {
        pub liquidity_gross: BigInt,
        pub liquidity_net: BigInt,
        pub fee_growth_outside0_x128: BigInt,
        pub fee_growth_outside1_x128: BigInt,
        pub initialized: bool,
    }

    impl Ticks {
        pub const METHOD_ID: [u8; 4] = hex!("f30dba93");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[Token::Int(eth::i32_to_int(self.tick))])
        }

        pub fn output(data: &[u8]) -> Result<TickInfo, DecodeError> {
            let mut values = Values::decode(
                &[
                    ParamType::Uint(128),
                    ParamType::Int(128),
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                    ParamType::Int(56),
                    ParamType::Uint(160),
                    ParamType::Uint(32),
                    ParamType::Bool,
                ],
                data,
            )?;
            let liquidity_gross = values.uint()?;
            let liquidity_net = values.int()?;
            let fee_growth_outside0_x128 = values.uint()?;
            let fee_growth_outside1_x128 = values.uint()?;
            values.skip()?;
            values.skip()?;
            values.skip()?;
            let initialized = values.bool()?;

            Ok(TickInfo {
                liquidity_gross,
                liquidity_net,
                fee_growth_outside0_x128,
                fee_growth_outside1_x128,
                initialized,
            })
        }
    }
}
