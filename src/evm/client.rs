//! Base chain client: Wormhole redemption, WETH and Uniswap v3 calls

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{
    aliases::{I24, U160, U24},
    Address, Bytes, TxHash, U256,
};
use alloy::primitives::ruint::UintTryFrom;
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, info};

use super::contracts::{
    IUniswapV3Factory, IUniswapV3Pool, INonfungiblePositionManager, ITokenBridge, IERC20, IWETH9,
};
use crate::clmm::{plan::to_raw_amount, PositionPlan};
use crate::config::BaseConfig;
use crate::error::{Error, Result};
use crate::wormhole::{UniversalAddress, Vaa};

/// Seconds a mint transaction stays valid
const MINT_DEADLINE_SECS: u64 = 600;

fn evm_err<E: Display>(what: &'static str) -> impl FnOnce(E) -> Error {
    move |e| Error::Evm(format!("{}: {}", what, e))
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| Error::Config(format!("Invalid {} address {}: {}", name, value, e)))
}

/// A minted Uniswap v3 position NFT
#[derive(Debug, Clone, Serialize)]
pub struct MintedPosition {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
    pub tx_hash: TxHash,
}

/// Signed connection to Base plus the contract addresses in use
pub struct BaseClient {
    provider: DynProvider,
    address: Address,
    token_bridge: Address,
    weth: Address,
    factory: Address,
    position_manager: Address,
    gas_reserve: U256,
}

impl BaseClient {
    pub fn connect(config: &BaseConfig, signer: PrivateKeySigner) -> Result<Self> {
        let address = signer.address();
        let url = config
            .rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid Base RPC URL: {}", e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .on_http(url)
            .erased();

        Ok(Self {
            provider,
            address,
            token_bridge: parse_address("token bridge", &config.token_bridge)?,
            weth: parse_address("WETH", &config.weth)?,
            factory: parse_address("Uniswap factory", &config.uniswap_factory)?,
            position_manager: parse_address("position manager", &config.position_manager)?,
            gas_reserve: to_raw_amount(config.gas_reserve_eth, 18)?,
        })
    }

    async fn get_pool(&self, token_a: Address, token_b: Address, fee: u32) -> Result<Option<Address>> {
        let pool = IUniswapV3Factory::new(self.factory, self.provider.clone())
            .getPool(token_a, token_b, U24::from(fee))
            .call()
            .await
            .map_err(evm_err("getPool"))?
            .pool;
        Ok((pool != Address::ZERO).then_some(pool))
    }
}

/// Everything the launch does on Base
#[async_trait]
pub trait BaseChain: Send + Sync {
    /// Deployer address
    fn address(&self) -> Address;
    fn position_manager(&self) -> Address;
    async fn chain_id(&self) -> Result<u64>;
    async fn eth_balance(&self) -> Result<U256>;
    async fn weth_balance(&self) -> Result<U256>;
    async fn token_balance(&self, token: Address) -> Result<U256>;
    async fn token_decimals(&self, token: Address) -> Result<u8>;
    /// Wrap everything above the gas reserve into WETH
    async fn wrap_eth(&self) -> Result<(U256, TxHash)>;
    /// Register the wrapped token from an attestation VAA
    async fn create_wrapped(&self, vaa: &Vaa) -> Result<TxHash>;
    async fn complete_transfer(&self, vaa: &Vaa) -> Result<TxHash>;
    async fn is_transfer_completed(&self, vaa: &Vaa) -> Result<bool>;
    /// Wrapped token for a foreign asset, `None` until attested
    async fn wrapped_asset(&self, chain: u16, address: &UniversalAddress) -> Result<Option<Address>>;
    /// Create the pool unless the factory already has one for this fee
    async fn create_pool(&self, token_a: Address, token_b: Address, fee: u32) -> Result<Address>;
    /// Returns false if the pool was already initialized
    async fn initialize_pool(&self, pool: Address, sqrt_price_x96: U256) -> Result<bool>;
    /// Approve `spender` if the current allowance is below `amount`
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<Option<TxHash>>;
    async fn mint_position(
        &self,
        token0: Address,
        token1: Address,
        fee: u32,
        position: &PositionPlan,
    ) -> Result<MintedPosition>;
}

#[async_trait]
impl BaseChain for BaseClient {
    fn address(&self) -> Address {
        self.address
    }

    fn position_manager(&self) -> Address {
        self.position_manager
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(evm_err("eth_chainId"))
    }

    async fn eth_balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(evm_err("eth_getBalance"))
    }

    async fn weth_balance(&self) -> Result<U256> {
        self.token_balance(self.weth).await
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        let balance = IERC20::new(token, self.provider.clone())
            .balanceOf(self.address)
            .call()
            .await
            .map_err(evm_err("balanceOf"))?
            .balance;
        Ok(balance)
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        let decimals = IERC20::new(token, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(evm_err("decimals"))?
            .value;
        Ok(decimals)
    }

    /// Wrap everything above the gas reserve into WETH
    async fn wrap_eth(&self) -> Result<(U256, TxHash)> {
        let balance = self.eth_balance().await?;
        let amount = spendable(balance, self.gas_reserve)?;

        info!("Wrapping {} wei into WETH ({} kept for gas)", amount, self.gas_reserve);

        let pending = IWETH9::new(self.weth, self.provider.clone())
            .deposit()
            .value(amount)
            .send()
            .await
            .map_err(evm_err("WETH deposit"))?;
        let receipt = confirm(pending, "WETH deposit").await?;

        Ok((amount, receipt.transaction_hash))
    }

    /// Register the wrapped token from an attestation VAA
    async fn create_wrapped(&self, vaa: &Vaa) -> Result<TxHash> {
        info!("Submitting attestation {} to the Base token bridge", vaa.id());
        let pending = ITokenBridge::new(self.token_bridge, self.provider.clone())
            .createWrapped(Bytes::copy_from_slice(vaa.raw()))
            .send()
            .await
            .map_err(evm_err("createWrapped"))?;
        Ok(confirm(pending, "createWrapped").await?.transaction_hash)
    }

    /// Redeem a transfer VAA
    async fn complete_transfer(&self, vaa: &Vaa) -> Result<TxHash> {
        info!("Redeeming transfer {} on Base", vaa.id());
        let pending = ITokenBridge::new(self.token_bridge, self.provider.clone())
            .completeTransfer(Bytes::copy_from_slice(vaa.raw()))
            .send()
            .await
            .map_err(evm_err("completeTransfer"))?;
        Ok(confirm(pending, "completeTransfer").await?.transaction_hash)
    }

    /// Whether the bridge has already redeemed this VAA
    async fn is_transfer_completed(&self, vaa: &Vaa) -> Result<bool> {
        let completed = ITokenBridge::new(self.token_bridge, self.provider.clone())
            .isTransferCompleted(vaa.digest())
            .call()
            .await
            .map_err(evm_err("isTransferCompleted"))?
            .completed;
        Ok(completed)
    }

    /// Wrapped token for a foreign asset, `None` until attested
    async fn wrapped_asset(
        &self,
        chain: u16,
        address: &UniversalAddress,
    ) -> Result<Option<Address>> {
        let wrapped = ITokenBridge::new(self.token_bridge, self.provider.clone())
            .wrappedAsset(chain, address.0.into())
            .call()
            .await
            .map_err(evm_err("wrappedAsset"))?
            .wrapped;
        Ok((wrapped != Address::ZERO).then_some(wrapped))
    }

    /// Create the pool unless the factory already has one for this fee
    async fn create_pool(&self, token_a: Address, token_b: Address, fee: u32) -> Result<Address> {
        if let Some(pool) = self.get_pool(token_a, token_b, fee).await? {
            info!("Pool already exists at {}", pool);
            return Ok(pool);
        }

        let pending = IUniswapV3Factory::new(self.factory, self.provider.clone())
            .createPool(token_a, token_b, U24::from(fee))
            .send()
            .await
            .map_err(evm_err("createPool"))?;
        confirm(pending, "createPool").await?;

        let pool = self
            .get_pool(token_a, token_b, fee)
            .await?
            .ok_or_else(|| Error::Evm("createPool succeeded but getPool is empty".to_string()))?;
        info!("Created pool {}", pool);
        Ok(pool)
    }

    /// Set the starting price; returns false if the pool was already initialized
    async fn initialize_pool(&self, pool: Address, sqrt_price_x96: U256) -> Result<bool> {
        let contract = IUniswapV3Pool::new(pool, self.provider.clone());

        let current = contract
            .slot0()
            .call()
            .await
            .map_err(evm_err("slot0"))?
            .sqrtPriceX96;
        if current != U160::ZERO {
            info!("Pool {} already initialized at sqrtPriceX96 {}", pool, current);
            return Ok(false);
        }

        let sqrt_price = U160::uint_try_from(sqrt_price_x96)
            .map_err(|_| Error::Clmm(format!("sqrtPriceX96 {} exceeds uint160", sqrt_price_x96)))?;
        let pending = contract
            .initialize(sqrt_price)
            .send()
            .await
            .map_err(evm_err("initialize"))?;
        confirm(pending, "initialize").await?;

        info!("Initialized pool {} at sqrtPriceX96 {}", pool, sqrt_price_x96);
        Ok(true)
    }

    /// Approve `spender` if the current allowance is below `amount`
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<Option<TxHash>> {
        let contract = IERC20::new(token, self.provider.clone());

        let allowance = contract
            .allowance(self.address, spender)
            .call()
            .await
            .map_err(evm_err("allowance"))?
            .remaining;
        if allowance >= amount {
            debug!("Allowance of {} for {} already sufficient", token, spender);
            return Ok(None);
        }

        let pending = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(evm_err("approve"))?;
        Ok(Some(confirm(pending, "approve").await?.transaction_hash))
    }

    /// Mint one planned position through the position manager
    async fn mint_position(
        &self,
        token0: Address,
        token1: Address,
        fee: u32,
        position: &PositionPlan,
    ) -> Result<MintedPosition> {
        let tick = |t: i32| {
            I24::try_from(t).map_err(|_| Error::Clmm(format!("Tick {} exceeds int24", t)))
        };
        let deadline = chrono::Utc::now().timestamp() as u64 + MINT_DEADLINE_SECS;

        let params = INonfungiblePositionManager::MintParams {
            token0,
            token1,
            fee: U24::from(fee),
            tickLower: tick(position.tick_lower)?,
            tickUpper: tick(position.tick_upper)?,
            amount0Desired: position.amount0,
            amount1Desired: position.amount1,
            amount0Min: U256::ZERO,
            amount1Min: U256::ZERO,
            recipient: self.address,
            deadline: U256::from(deadline),
        };

        info!(
            "Minting position {} ticks [{}, {}] amounts ({}, {})",
            position.index, position.tick_lower, position.tick_upper, position.amount0, position.amount1
        );

        let pending = INonfungiblePositionManager::new(self.position_manager, self.provider.clone())
            .mint(params)
            .send()
            .await
            .map_err(evm_err("mint"))?;
        let receipt = confirm(pending, "mint").await?;

        let event = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| {
                log.log_decode::<INonfungiblePositionManager::IncreaseLiquidity>()
                    .ok()
            })
            .ok_or_else(|| Error::Evm("mint receipt has no IncreaseLiquidity event".to_string()))?;
        let data = event.inner.data;

        Ok(MintedPosition {
            token_id: data.tokenId,
            liquidity: data.liquidity,
            amount0: data.amount0,
            amount1: data.amount1,
            tx_hash: receipt.transaction_hash,
        })
    }
}

/// Balance above the reserve, or an error when nothing is left
fn spendable(balance: U256, reserve: U256) -> Result<U256> {
    match balance.checked_sub(reserve) {
        Some(amount) if !amount.is_zero() => Ok(amount),
        _ => Err(Error::InsufficientBalance {
            available: format!("{} wei", balance),
            required: format!("more than {} wei", reserve),
        }),
    }
}

async fn confirm(
    pending: PendingTransactionBuilder<alloy::network::Ethereum>,
    what: &'static str,
) -> Result<TransactionReceipt> {
    let tx_hash = *pending.tx_hash();
    debug!("{} sent: {}", what, tx_hash);

    let receipt = pending.get_receipt().await.map_err(evm_err(what))?;
    if !ReceiptResponse::status(&receipt) {
        return Err(Error::Evm(format!("{} reverted in {}", what, tx_hash)));
    }

    info!("{} confirmed: {}", what, tx_hash);
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spendable_keeps_reserve() {
        let reserve = to_raw_amount(0.1, 18).unwrap();
        let balance = to_raw_amount(0.35, 18).unwrap();
        assert_eq!(spendable(balance, reserve).unwrap(), balance - reserve);

        assert!(matches!(
            spendable(reserve, reserve),
            Err(Error::InsufficientBalance { .. })
        ));
        assert!(spendable(U256::ZERO, reserve).is_err());
    }

    #[test]
    fn test_connect_validates_addresses() {
        let signer = PrivateKeySigner::random();
        let mut config = crate::config::Config::default().base;
        let client = BaseClient::connect(&config, signer.clone()).unwrap();
        assert_eq!(client.address(), signer.address());
        assert_eq!(
            client.position_manager(),
            parse_address("position manager", &config.position_manager).unwrap()
        );

        config.weth = "0xnot-an-address".to_string();
        assert!(matches!(
            BaseClient::connect(&config, signer.clone()),
            Err(Error::Config(_))
        ));

        let mut config = crate::config::Config::default().base;
        config.rpc_url = "not a url".to_string();
        assert!(BaseClient::connect(&config, signer).is_err());
    }
}
