use crate::model::Token;
use crate::rpc::TokenMetadata;
use num_bigint::BigInt;

pub struct StaticTokenDefinition {
    pub address: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u32,
}

// hard-coded tokens which have various behaviours but for which a UniswapV3 valid pool
// exists, some are tokens which were migrated to new addresses
const STATIC_TOKENS: [StaticTokenDefinition; 6] = [
    StaticTokenDefinition {
        address: "0xe0b7927c4af23765cb51314a0e0521a9645f0e2a",
        symbol: "DGD",
        name: "DGD",
        decimals: 9,
    },
    StaticTokenDefinition {
        address: "0x7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9",
        symbol: "AAVE",
        name: "Aave Token",
        decimals: 18,
    },
    StaticTokenDefinition {
        address: "0xeb9951021698b42e4399f9cbb6267aa35f82d59d",
        symbol: "LIF",
        name: "LIF",
        decimals: 18,
    },
    StaticTokenDefinition {
        address: "0xbdeb4b83251fb146687fa19d1c660f99411eefe3",
        symbol: "SVD",
        name: "savedroid",
        decimals: 18,
    },
    StaticTokenDefinition {
        address: "0xbb9bc244d798123fde783fcc1c72d3bb8c189413",
        symbol: "TheDAO",
        name: "TheDAO",
        decimals: 16,
    },
    StaticTokenDefinition {
        address: "0x38c6a68304cdefb9bec48bbfaaba5c5b47818bb2",
        symbol: "HPB",
        name: "HPBCoin",
        decimals: 18,
    },
];

pub fn get_static_definition(token_id: &str) -> Option<&'static StaticTokenDefinition> {
    STATIC_TOKENS.iter().find(|definition| definition.address == token_id)
}

/// Builds a new token from whatever the contract answered, falling back to the static
/// table. A token without decimals cannot be priced and is not created.
pub fn create_token(token_id: &str, metadata: &TokenMetadata) -> Option<Token> {
    let definition = get_static_definition(token_id);

    let decimals = match (metadata.decimals, definition) {
        (Some(decimals), _) => decimals,
        (None, Some(definition)) => definition.decimals,
        (None, None) => {
            log::debug!("{} is not an ERC20 token contract, decimals call failed", token_id);
            return None;
        }
    };

    let symbol = metadata
        .symbol
        .clone()
        .or_else(|| definition.map(|d| d.symbol.to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    let name = metadata
        .name
        .clone()
        .or_else(|| definition.map(|d| d.name.to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    Some(Token {
        id: token_id.to_string(),
        symbol,
        name,
        decimals,
        total_supply: metadata.total_supply.clone().unwrap_or_else(|| BigInt::from(0)),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_fallback() {
        let token = create_token(
            "0xe0b7927c4af23765cb51314a0e0521a9645f0e2a",
            &TokenMetadata::default(),
        )
        .unwrap();
        assert_eq!(9, token.decimals);
        assert_eq!("DGD", token.symbol);
        assert_eq!(BigInt::from(0), token.total_supply);
    }

    #[test]
    fn test_contract_answers_win() {
        let metadata = TokenMetadata {
            decimals: Some(6),
            symbol: Some("SVDX".to_string()),
            name: None,
            total_supply: Some(BigInt::from(1000)),
        };
        let token = create_token("0xbdeb4b83251fb146687fa19d1c660f99411eefe3", &metadata).unwrap();
        assert_eq!(6, token.decimals);
        assert_eq!("SVDX", token.symbol);
        assert_eq!("savedroid", token.name);
    }

    #[test]
    fn test_unknown_token_without_decimals_is_skipped() {
        let metadata = TokenMetadata {
            symbol: Some("X".to_string()),
            ..Default::default()
        };
        assert!(create_token("0x00000000000000000000000000000000000000aa", &metadata).is_none());
    }
}
