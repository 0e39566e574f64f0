//! Configuration loading and validation

use alloy::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;
use url::Url;

// Re-export the fee tier enum used by the clmm section
pub use crate::clmm::FeeTier;

/// Which set of chains the launch targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Solana mainnet-beta + Base
    #[default]
    Mainnet,
    /// Solana devnet + Base Sepolia
    Testnet,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub solana: SolanaConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub pump: PumpConfig,
    #[serde(default)]
    pub wormhole: WormholeConfig,
    #[serde(default)]
    pub base: BaseConfig,
    #[serde(default)]
    pub clmm: ClmmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolanaConfig {
    /// Empty means the network default (or HELIUS_RPC_URL / SOLANA_RPC_URL)
    #[serde(default)]
    pub rpc_endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Folder holding persisted `<name>.json` keypairs
    #[serde(default = "default_keys_folder")]
    pub keys_folder: String,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: String::new(),
            timeout_ms: default_timeout_ms(),
            commitment: default_commitment(),
            keys_folder: default_keys_folder(),
        }
    }
}

impl SolanaConfig {
    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| anyhow::anyhow!("Invalid commitment level: {}", self.commitment))
    }
}

/// Token identity and off-chain metadata
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_name")]
    pub name: String,
    #[serde(default = "default_token_symbol")]
    pub symbol: String,
    #[serde(default = "default_token_description")]
    pub description: String,
    #[serde(default = "default_image_path")]
    pub image_path: String,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Pre-uploaded metadata; skips the IPFS upload when set
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_token_name(),
            symbol: default_token_symbol(),
            description: default_token_description(),
            image_path: default_image_path(),
            twitter: None,
            telegram: None,
            website: None,
            metadata_uri: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PumpConfig {
    /// Creator's initial buy in SOL
    #[serde(default = "default_buy_amount_sol")]
    pub buy_amount_sol: f64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,
    /// Micro-lamports per compute unit
    #[serde(default = "default_compute_unit_price")]
    pub compute_unit_price: u64,
    #[serde(default)]
    pub simulate_before_send: bool,
    #[serde(default = "default_ipfs_url")]
    pub ipfs_url: String,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            buy_amount_sol: default_buy_amount_sol(),
            slippage_bps: default_slippage_bps(),
            compute_unit_limit: default_compute_unit_limit(),
            compute_unit_price: default_compute_unit_price(),
            simulate_before_send: false,
            ipfs_url: default_ipfs_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WormholeConfig {
    /// Empty fields fall back to the network's deployment
    #[serde(default)]
    pub core_program_id: String,
    #[serde(default)]
    pub token_bridge_program_id: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_vaa_timeout_secs")]
    pub vaa_timeout_secs: u64,
    #[serde(default = "default_vaa_poll_interval_ms")]
    pub vaa_poll_interval_ms: u64,
    #[serde(default = "default_nonce")]
    pub nonce: u32,
    #[serde(default = "default_attest_compute_unit_price")]
    pub attest_compute_unit_price: u64,
}

impl Default for WormholeConfig {
    fn default() -> Self {
        Self {
            core_program_id: String::new(),
            token_bridge_program_id: String::new(),
            api_url: String::new(),
            vaa_timeout_secs: default_vaa_timeout_secs(),
            vaa_poll_interval_ms: default_vaa_poll_interval_ms(),
            nonce: default_nonce(),
            attest_compute_unit_price: default_attest_compute_unit_price(),
        }
    }
}

/// Base chain endpoints and contract addresses
#[derive(Debug, Clone, Deserialize)]
pub struct BaseConfig {
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default)]
    pub chain_id: u64,
    /// Wormhole's id for the Base network, the transfer target chain
    #[serde(default)]
    pub wormhole_chain_id: u16,
    #[serde(default)]
    pub token_bridge: String,
    #[serde(default)]
    pub weth: String,
    #[serde(default)]
    pub uniswap_factory: String,
    #[serde(default)]
    pub position_manager: String,
    /// ETH left unwrapped for gas
    #[serde(default = "default_gas_reserve_eth")]
    pub gas_reserve_eth: f64,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            chain_id: 0,
            wormhole_chain_id: 0,
            token_bridge: String::new(),
            weth: String::new(),
            uniswap_factory: String::new(),
            position_manager: String::new(),
            gas_reserve_eth: default_gas_reserve_eth(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClmmConfig {
    #[serde(default)]
    pub fee_tier: FeeTier,
    /// WETH per token at pool initialization
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    #[serde(default = "default_num_positions")]
    pub num_positions: u32,
    #[serde(default = "default_price_range_multiplier")]
    pub price_range_multiplier: f64,
    /// WETH for the first (tightest) position; each next one gets half
    #[serde(default = "default_base_weth_amount")]
    pub base_weth_amount: f64,
    #[serde(default = "default_weth_decimals")]
    pub weth_decimals: u8,
}

impl Default for ClmmConfig {
    fn default() -> Self {
        Self {
            fee_tier: FeeTier::default(),
            initial_price: default_initial_price(),
            num_positions: default_num_positions(),
            price_range_multiplier: default_price_range_multiplier(),
            base_weth_amount: default_base_weth_amount(),
            weth_decimals: default_weth_decimals(),
        }
    }
}

/// Per-network deployment addresses
struct NetworkDefaults {
    solana_rpc: &'static str,
    base_rpc: &'static str,
    base_chain_id: u64,
    base_wormhole_chain_id: u16,
    wormhole_core: &'static str,
    wormhole_token_bridge: &'static str,
    wormhole_api: &'static str,
    base_token_bridge: &'static str,
    weth: &'static str,
    uniswap_factory: &'static str,
    position_manager: &'static str,
}

impl NetworkDefaults {
    fn for_network(network: Network) -> Self {
        use crate::wormhole::{api, program};
        match network {
            Network::Mainnet => Self {
                solana_rpc: "https://api.mainnet-beta.solana.com",
                base_rpc: "https://mainnet.base.org",
                base_chain_id: 8453,
                base_wormhole_chain_id: program::CHAIN_ID_BASE,
                wormhole_core: program::MAINNET_CORE_PROGRAM_ID,
                wormhole_token_bridge: program::MAINNET_TOKEN_BRIDGE_PROGRAM_ID,
                wormhole_api: api::MAINNET_API_URL,
                base_token_bridge: "0x8d2de8d2f73F1F4cAB472AC9A881C9b123C79627",
                weth: "0x4200000000000000000000000000000000000006",
                uniswap_factory: "0x33128a8fC17869897dcE68Ed026d694621f6FDfD",
                position_manager: "0x03a520b32C04BF3bEEf7BEb72E919cf822Ed34f1",
            },
            Network::Testnet => Self {
                solana_rpc: "https://api.devnet.solana.com",
                base_rpc: "https://sepolia.base.org",
                base_chain_id: 84532,
                base_wormhole_chain_id: program::CHAIN_ID_BASE_SEPOLIA,
                wormhole_core: program::TESTNET_CORE_PROGRAM_ID,
                wormhole_token_bridge: program::TESTNET_TOKEN_BRIDGE_PROGRAM_ID,
                wormhole_api: api::TESTNET_API_URL,
                base_token_bridge: "0x86F55A04690fd7815A3D802bD587e83eA888B239",
                weth: "0x4200000000000000000000000000000000000006",
                uniswap_factory: "0x4752ba5DBc23f44D87826276BF6Fd6b1C372aD24",
                position_manager: "0x27F971cb582BF9E50F397e4d29a5C7A34f11faA2",
            },
        }
    }
}

fn fill(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}

// Default value functions
fn default_timeout_ms() -> u64 {
    30_000
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_keys_folder() -> String {
    ".keys".to_string()
}

fn default_token_name() -> String {
    "multichain-test".to_string()
}

fn default_token_symbol() -> String {
    "MCT".to_string()
}

fn default_token_description() -> String {
    "multichain-test: This is a test token".to_string()
}

fn default_image_path() -> String {
    "assets/token.png".to_string()
}

fn default_buy_amount_sol() -> f64 {
    0.0001
}

fn default_slippage_bps() -> u32 {
    500
}

fn default_compute_unit_limit() -> u32 {
    250_000
}

fn default_compute_unit_price() -> u64 {
    250_000
}

fn default_ipfs_url() -> String {
    crate::pump::metadata::PUMP_IPFS_URL.to_string()
}

fn default_vaa_timeout_secs() -> u64 {
    60
}

fn default_vaa_poll_interval_ms() -> u64 {
    2_000
}

fn default_nonce() -> u32 {
    1
}

fn default_attest_compute_unit_price() -> u64 {
    333_333
}

fn default_gas_reserve_eth() -> f64 {
    0.1
}

fn default_initial_price() -> f64 {
    0.04
}

fn default_num_positions() -> u32 {
    5
}

fn default_price_range_multiplier() -> f64 {
    2.0
}

fn default_base_weth_amount() -> f64 {
    0.01
}

fn default_weth_decimals() -> u8 {
    18
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .set_default("network", "mainnet")?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix LAUNCH_)
            .add_source(
                config::Environment::with_prefix("LAUNCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.apply_endpoint_env();
        config.apply_network_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Conventional RPC variables win over the file but not over LAUNCH_*
    fn apply_endpoint_env(&mut self) {
        if self.solana.rpc_endpoint.is_empty() {
            if let Some(url) = ["HELIUS_RPC_URL", "SOLANA_RPC_URL"]
                .iter()
                .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
            {
                self.solana.rpc_endpoint = url;
            }
        }
        if self.solana.rpc_endpoint.is_empty() {
            warn!(
                "No Solana RPC configured (HELIUS_RPC_URL/SOLANA_RPC_URL), using the public {} endpoint",
                self.network
            );
        }
        if self.base.rpc_url.is_empty() {
            if let Ok(url) = std::env::var("BASE_RPC_URL") {
                self.base.rpc_url = url;
            }
        }
    }

    /// Fill every unset endpoint and address from the selected network
    pub fn apply_network_defaults(&mut self) {
        let d = NetworkDefaults::for_network(self.network);

        fill(&mut self.solana.rpc_endpoint, d.solana_rpc);
        fill(&mut self.wormhole.core_program_id, d.wormhole_core);
        fill(&mut self.wormhole.token_bridge_program_id, d.wormhole_token_bridge);
        fill(&mut self.wormhole.api_url, d.wormhole_api);
        fill(&mut self.base.rpc_url, d.base_rpc);
        fill(&mut self.base.token_bridge, d.base_token_bridge);
        fill(&mut self.base.weth, d.weth);
        fill(&mut self.base.uniswap_factory, d.uniswap_factory);
        fill(&mut self.base.position_manager, d.position_manager);
        if self.base.chain_id == 0 {
            self.base.chain_id = d.base_chain_id;
        }
        if self.base.wormhole_chain_id == 0 {
            self.base.wormhole_chain_id = d.base_wormhole_chain_id;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate pump.fun amounts
        if self.pump.buy_amount_sol <= 0.0 {
            anyhow::bail!("buy_amount_sol must be positive");
        }

        if self.pump.slippage_bps > 10000 {
            anyhow::bail!("slippage_bps cannot exceed 10000 (100%)");
        }

        if self.token.name.is_empty() || self.token.symbol.is_empty() {
            anyhow::bail!("token name and symbol are required");
        }

        self.solana.commitment_config()?;

        for (name, value) in [
            ("solana.rpc_endpoint", &self.solana.rpc_endpoint),
            ("wormhole.api_url", &self.wormhole.api_url),
            ("base.rpc_url", &self.base.rpc_url),
        ] {
            Url::parse(value).with_context(|| format!("Invalid {}: {}", name, mask_url(value)))?;
        }

        // Validate Wormhole settings
        if self.wormhole.vaa_timeout_secs == 0 {
            anyhow::bail!("vaa_timeout_secs must be positive");
        }

        if self.wormhole.vaa_poll_interval_ms == 0 {
            anyhow::bail!("vaa_poll_interval_ms must be positive");
        }

        for (name, value) in [
            ("wormhole.core_program_id", &self.wormhole.core_program_id),
            ("wormhole.token_bridge_program_id", &self.wormhole.token_bridge_program_id),
        ] {
            Pubkey::from_str(value).with_context(|| format!("Invalid {}: {}", name, value))?;
        }

        // Validate Base addresses
        for (name, value) in [
            ("base.token_bridge", &self.base.token_bridge),
            ("base.weth", &self.base.weth),
            ("base.uniswap_factory", &self.base.uniswap_factory),
            ("base.position_manager", &self.base.position_manager),
        ] {
            Address::from_str(value).with_context(|| format!("Invalid {}: {}", name, value))?;
        }

        if self.base.wormhole_chain_id == crate::wormhole::CHAIN_ID_SOLANA {
            anyhow::bail!("base.wormhole_chain_id cannot be Solana's chain id");
        }

        if self.base.gas_reserve_eth < 0.0 {
            anyhow::bail!("gas_reserve_eth cannot be negative");
        }

        // Validate liquidity ladder
        if self.clmm.initial_price <= 0.0 {
            anyhow::bail!("initial_price must be positive");
        }

        if self.clmm.price_range_multiplier <= 1.0 {
            anyhow::bail!("price_range_multiplier must be greater than 1");
        }

        if self.clmm.num_positions == 0 {
            anyhow::bail!("num_positions must be at least 1");
        }

        if self.clmm.base_weth_amount <= 0.0 {
            anyhow::bail!("base_weth_amount must be positive");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Network: {}
  Solana:
    endpoint: {}
    timeout: {}ms
    commitment: {}
    keys_folder: {}
  Token:
    name: {}
    symbol: {}
    image: {}
    metadata_uri: {}
  Pump.fun:
    buy_amount: {} SOL
    slippage: {}bps
    compute: {} units @ {} micro-lamports
    simulate_before_send: {}
  Wormhole:
    core: {}
    token_bridge: {}
    api: {}
    vaa_timeout: {}s
  Base:
    rpc: {}
    chain_id: {} (wormhole {})
    token_bridge: {}
    weth: {}
    factory: {}
    position_manager: {}
    gas_reserve: {} ETH
  CLMM:
    fee_tier: {}
    initial_price: {} WETH
    positions: {} x{}
    base_weth: {} WETH
"#,
            self.network,
            mask_url(&self.solana.rpc_endpoint),
            self.solana.timeout_ms,
            self.solana.commitment,
            self.solana.keys_folder,
            self.token.name,
            self.token.symbol,
            self.token.image_path,
            self.token.metadata_uri.as_deref().unwrap_or("(upload)"),
            self.pump.buy_amount_sol,
            self.pump.slippage_bps,
            self.pump.compute_unit_limit,
            self.pump.compute_unit_price,
            self.pump.simulate_before_send,
            self.wormhole.core_program_id,
            self.wormhole.token_bridge_program_id,
            self.wormhole.api_url,
            self.wormhole.vaa_timeout_secs,
            mask_url(&self.base.rpc_url),
            self.base.chain_id,
            self.base.wormhole_chain_id,
            self.base.token_bridge,
            self.base.weth,
            self.base.uniswap_factory,
            self.base.position_manager,
            self.base.gas_reserve_eth,
            self.clmm.fee_tier,
            self.clmm.initial_price,
            self.clmm.num_positions,
            self.clmm.price_range_multiplier,
            self.clmm.base_weth_amount,
        )
    }
}

/// Mask URL for display (hide API keys in query params and key paths)
pub fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else if let Some(idx) = url.find("/v2/") {
        // Alchemy-style https://host/v2/<key>
        format!("{}/v2/***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            network: Network::default(),
            solana: SolanaConfig::default(),
            token: TokenConfig::default(),
            pump: PumpConfig::default(),
            wormhole: WormholeConfig::default(),
            base: BaseConfig::default(),
            clmm: ClmmConfig::default(),
        };
        config.apply_network_defaults();
        config
    }
}
