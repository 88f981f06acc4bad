use bigdecimal::BigDecimal;

pub const UNISWAP_V3_FACTORY: &str = "0x1f98431c8ad98523631ae4a59f267346ea31f984";
pub const NON_FUNGIBLE_POSITION_MANAGER: &str = "0xc36442b4a4522e871399cd717abdd847ab11fe88";
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub const WETH_ADDRESS: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
pub const USDC_WETH_03_POOL: &str = "0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8";

pub const WHITELIST_TOKENS: [&str; 21] = [
    "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", // WETH
    "0x6b175474e89094c44da98b954eedeac495271d0f", // DAI
    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", // USDC
    "0xdac17f958d2ee523a2206206994597c13d831ec7", // USDT
    "0x0000000000085d4780b73119b644ae5ecd22b376", // TUSD
    "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", // WBTC
    "0x5d3a536e4d6dbd6114cc1ead35777bab948e3643", // cDAI
    "0x39aa39c021dfbae8fac545936693ac917d5e7563", // cUSDC
    "0x86fadb80d8d2cff3c3680819e4da99c10232ba0f", // EBASE
    "0x57ab1ec28d129707052df4df418d58a2d46d5f51", // sUSD
    "0x9f8f72aa9304c8b593d555f12ef6589cc3a579a2", // MKR
    "0xc00e94cb662c3520282e6f5717214004a7f26888", // COMP
    "0x514910771af9ca656af840dff83e8264ecf986ca", // LINK
    "0xc011a73ee8576fb46f5e1c5751ca3b9fe0af2a6f", // SNX
    "0x0bc529c00c6401aef6d220be8c6ea1667f6ad93e", // YFI
    "0x111111111117dc0aa78b770fa6a738034120c302", // 1INCH
    "0xdf5e0e81dff6faf3a7e52ba697820c5e32d806a8", // yCurv
    "0x956f47f50a910163d8bf957cf5846d573e7f87ca", // FEI
    "0x7d1afa7b718fb893db30a3abc0cfc608aacfebb0", // MATIC
    "0x7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9", // AAVE
    "0xfe2e637202056d30016725477c5da089ab0a043a", // sETH2
];

pub const STABLE_COINS: [&str; 6] = [
    "0x6b175474e89094c44da98b954eedeac495271d0f", // DAI
    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", // USDC
    "0xdac17f958d2ee523a2206206994597c13d831ec7", // USDT
    "0x0000000000085d4780b73119b644ae5ecd22b376", // TUSD
    "0x956f47f50a910163d8bf957cf5846d573e7f87ca", // FEI
    "0x4dd28568d05f09b02220b09c2cb307bfd837cb95",
];

pub const MINIMUM_ETH_LOCKED: u32 = 60;

/// Everything that differs between deployments or that is a data-quality policy.
/// `Config::default()` targets Ethereum mainnet.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub factory_address: String,
    pub position_manager_address: String,
    /// Token priced at exactly 1 ETH.
    pub weth_address: String,
    /// Pool whose token0 price is the ETH/USD reference.
    pub reference_pool: String,
    pub whitelist_tokens: Vec<String>,
    pub stable_coins: Vec<String>,
    pub minimum_eth_locked: BigDecimal,
    /// Pools never created, and whose position decreases/collects are skipped.
    pub ignored_pools: Vec<String>,
    pub ignored_swap_pools: Vec<String>,
    pub ignored_decrease_blocks: Vec<u64>,
    /// When false hour snapshots are keyed by the day index, which collapses them to a
    /// daily granularity.
    pub hourly_buckets: bool,
    pub refresh_fee_growth: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            factory_address: UNISWAP_V3_FACTORY.to_string(),
            position_manager_address: NON_FUNGIBLE_POSITION_MANAGER.to_string(),
            weth_address: WETH_ADDRESS.to_string(),
            reference_pool: USDC_WETH_03_POOL.to_string(),
            whitelist_tokens: WHITELIST_TOKENS.iter().map(|t| t.to_string()).collect(),
            stable_coins: STABLE_COINS.iter().map(|t| t.to_string()).collect(),
            minimum_eth_locked: BigDecimal::from(MINIMUM_ETH_LOCKED),
            ignored_pools: vec!["0x8fe8d9bb8eeba3ed688069c3d6b556c9ca258248".to_string()],
            ignored_swap_pools: vec!["0x9663f2ca0454accad3e094448ea6f77443880454".to_string()],
            ignored_decrease_blocks: vec![14317993],
            hourly_buckets: true,
            refresh_fee_growth: true,
        }
    }
}

impl Config {
    pub fn is_whitelisted(&self, token_id: &str) -> bool {
        self.whitelist_tokens.iter().any(|t| t == token_id)
    }

    pub fn is_stable_coin(&self, token_id: &str) -> bool {
        self.stable_coins.iter().any(|t| t == token_id)
    }

    pub fn is_ignored_pool(&self, pool_id: &str) -> bool {
        self.ignored_pools.iter().any(|p| p == pool_id)
    }

    pub fn is_ignored_swap_pool(&self, pool_id: &str) -> bool {
        self.ignored_swap_pools.iter().any(|p| p == pool_id)
    }
}
