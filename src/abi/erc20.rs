pub mod functions {
    use crate::abi::{encode_call, Values};
    use crate::eth::{self, DecodeError};
    use ethabi::ParamType;
    use hex_literal::hex;
    use num_bigint::BigInt;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Decimals {}

    impl Decimals {
        pub const METHOD_ID: [u8; 4] = hex!("313ce567");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[])
        }

        pub fn output(data: &[u8]) -> Result<u32, DecodeError> {
            Values::decode(&[ParamType::Uint(8)], data)?.u32()
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Name {}

    impl Name {
        pub const METHOD_ID: [u8; 4] = hex!("06fdde03");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[])
        }

        pub fn output(data: &[u8]) -> Result<String, DecodeError> {
            read_text(data)
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Symbol {}

    impl Symbol {
        pub const METHOD_ID: [u8; 4] = hex!("95d89b41");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[])
        }

        pub fn output(data: &[u8]) -> Result<String, DecodeError> {
            read_text(data)
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct TotalSupply {}

    impl TotalSupply {
        pub const METHOD_ID: [u8; 4] = hex!("18160ddd");

        pub fn encode(&self) -> Vec<u8> {
            encode_call(Self::METHOD_ID, &[])
        }

        pub fn output(data: &[u8]) -> Result<BigInt, DecodeError> {
            Values::decode(&[ParamType::Uint(256)], data)?.uint()
        }
    }

    // Older tokens (MKR, SAI...) return a bytes32 instead of a string for name and symbol.
    fn read_text(data: &[u8]) -> Result<String, DecodeError> {
        let text = match Values::decode(&[ParamType::String], data).and_then(|mut v| v.string()) {
            Ok(text) => text,
            Err(_) => {
                let raw = Values::decode(&[ParamType::FixedBytes(32)], data)?.fixed_bytes()?;
                eth::read_string_from_bytes(&raw)
            }
        };
        Ok(text.replace('\u{0}', ""))
    }
}
