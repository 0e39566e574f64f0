//! The launch sequence: create on pump.fun, attest and bridge through
//! Wormhole, then seed a Uniswap v3 pool on Base.
//!
//! Steps run strictly in order. A failing step ends the run; the report
//! keeps what earlier steps did and names the step that failed. A failed
//! redemption of the bridged transfer is recorded and the run goes on.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::clmm::{plan_pool, PairInfo, PoolPlan};
use crate::config::{Config, Network, TokenConfig};
use crate::error::{Error, Result};
use crate::evm::{BaseChain, BaseClient};
use crate::pump::{
    self,
    price::{format_price, price_per_token_sol, sol_to_lamports, DEFAULT_TOKEN_DECIMALS},
    BondingCurve, CreateResult, PumpClient,
};
use crate::solana::{token, TransactionSender};
use crate::wallet::keystore;
use crate::wormhole::{
    payload::{normalize_amount, wrapped_decimals, TokenBridgePayload},
    wait_for_vaa, MessageId, PostedMessage, SolanaTokenBridge, UniversalAddress, Vaa, VaaSource,
    WormholePrograms, WormholescanClient, CHAIN_ID_SOLANA,
};

const WORMHOLESCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a run got to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchStep {
    Preflight,
    Create,
    Attest,
    Bridge,
    Deploy,
    Done,
}

impl fmt::Display for LaunchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStep::Preflight => write!(f, "preflight"),
            LaunchStep::Create => write!(f, "create"),
            LaunchStep::Attest => write!(f, "attest"),
            LaunchStep::Bridge => write!(f, "bridge"),
            LaunchStep::Deploy => write!(f, "deploy"),
            LaunchStep::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    pub step: LaunchStep,
    pub error: String,
}

/// The bridged transfer and how its redemption went
#[derive(Debug, Clone, Serialize)]
pub struct TransferRecord {
    pub signature: String,
    pub message_id: String,
    pub amount: u64,
    pub redeem_tx: Option<TxHash>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionRecord {
    pub index: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
    pub tx_hash: TxHash,
}

/// What a full or partial run did, written as JSON with `--report`
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub network: Network,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub mint: String,
    pub creator: String,
    pub pump_url: String,
    /// Last step started; `done` after a complete run
    pub step: LaunchStep,
    pub create_signature: Option<String>,
    pub metadata_uri: Option<String>,
    pub tokens_bought: Option<u64>,
    pub attestation: Option<String>,
    pub create_wrapped_tx: Option<TxHash>,
    pub wrapped_token: Option<Address>,
    pub transfer: Option<TransferRecord>,
    pub weth_wrapped: Option<U256>,
    pub wrap_tx: Option<TxHash>,
    pub pool: Option<Address>,
    pub positions: Vec<PositionRecord>,
    /// Set when the run ended early without an error
    pub stopped: Option<String>,
    pub failed: Option<StepFailure>,
}

impl LaunchReport {
    fn new(network: Network, mint: &Pubkey, creator: &Pubkey) -> Self {
        Self {
            network,
            started_at: Utc::now(),
            finished_at: None,
            mint: mint.to_string(),
            creator: creator.to_string(),
            pump_url: pump::program::pump_fun_url(mint),
            step: LaunchStep::Preflight,
            create_signature: None,
            metadata_uri: None,
            tokens_bought: None,
            attestation: None,
            create_wrapped_tx: None,
            wrapped_token: None,
            transfer: None,
            weth_wrapped: None,
            wrap_tx: None,
            pool: None,
            positions: Vec::new(),
            stopped: None,
            failed: None,
        }
    }

    fn stop(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Stopping: {}", reason);
        self.stopped = Some(reason);
    }

    fn fail(&mut self, e: &Error) {
        error!("Launch failed during {}: {}", self.step, e);
        self.failed = Some(StepFailure {
            step: self.step,
            error: e.to_string(),
        });
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    fn record_attest(&mut self, outcome: &AttestOutcome) {
        self.attestation = outcome.message.map(|id| id.to_string());
        self.create_wrapped_tx = outcome.create_wrapped_tx;
        self.wrapped_token = outcome.wrapped_token;
    }

    fn record_deploy(&mut self, outcome: DeployOutcome) {
        if let Some((amount, tx)) = outcome.weth_wrapped {
            self.weth_wrapped = Some(amount);
            self.wrap_tx = Some(tx);
        }
        self.pool = outcome.pool;
        self.positions = outcome.positions;
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!("Report written to {:?}", path);
        Ok(())
    }
}

/// Progress of attesting a mint and registering it on Base
#[derive(Debug, Clone, Default)]
pub struct AttestOutcome {
    /// `None` when the token was already registered
    pub message: Option<MessageId>,
    pub create_wrapped_tx: Option<TxHash>,
    pub wrapped_token: Option<Address>,
}

/// Progress of the Base deployment; filled as each transaction lands
#[derive(Debug, Clone, Default)]
pub struct DeployOutcome {
    pub plan: Option<PoolPlan>,
    pub weth_wrapped: Option<(U256, TxHash)>,
    pub pool: Option<Address>,
    pub positions: Vec<PositionRecord>,
}

/// Snapshot for the status command
#[derive(Debug, Clone)]
pub struct LaunchStatus {
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub sol_balance: u64,
    pub token_balance: u64,
    pub bonding_curve: Option<BondingCurve>,
    /// Tokens the configured buy would get on the live curve
    pub buy_quote: Option<u64>,
    /// Lamports the creator's tokens would fetch if sold into the curve
    pub holdings_value: Option<u64>,
    pub wrapped_token: Option<Address>,
}

/// Plan the pool for `token` against the configured WETH without sending anything
pub fn plan(config: &Config, token: Address, token_decimals: u8) -> Result<PoolPlan> {
    let weth = config
        .base
        .weth
        .parse()
        .map_err(|e| Error::Config(format!("Invalid WETH address: {}", e)))?;
    plan_pool(
        &config.clmm,
        PairInfo {
            token,
            token_decimals,
            weth,
        },
    )
}

/// Solana reads and transactions the launch performs
#[async_trait]
pub trait SolanaChain: Send + Sync {
    async fn bonding_curve(&self, mint: &Pubkey) -> Result<Option<BondingCurve>>;
    async fn sol_balance(&self, owner: &Pubkey) -> Result<u64>;
    /// Zero when the associated token account does not exist yet
    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<u64>;
    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8>;
    async fn create_and_buy(
        &self,
        creator: &Keypair,
        mint: &Keypair,
        token: &TokenConfig,
    ) -> Result<CreateResult>;
    async fn is_wrapped(&self, mint: &Pubkey) -> Result<bool>;
    async fn attest(&self, payer: &Keypair, mint: &Pubkey) -> Result<PostedMessage>;
    async fn transfer_native(
        &self,
        owner: &Keypair,
        mint: &Pubkey,
        amount: u64,
        recipient: UniversalAddress,
        target_chain: u16,
    ) -> Result<PostedMessage>;
}

/// RPC-backed Solana side: the pump.fun program and the Wormhole token bridge
pub struct SolanaClients {
    rpc: Arc<RpcClient>,
    pump: PumpClient,
    bridge: SolanaTokenBridge,
}

impl SolanaClients {
    pub fn new(config: &Config) -> Result<Self> {
        let rpc = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.solana.rpc_endpoint.clone(),
            Duration::from_millis(config.solana.timeout_ms),
            config.solana.commitment_config()?,
        ));
        let sender = TransactionSender::new(rpc.clone(), config.pump.simulate_before_send);

        let programs = WormholePrograms::new(
            &config.wormhole.core_program_id,
            &config.wormhole.token_bridge_program_id,
        )?;
        let bridge = SolanaTokenBridge::new(
            sender.clone(),
            programs,
            config.wormhole.nonce,
            config.wormhole.attest_compute_unit_price,
        );

        Ok(Self {
            rpc,
            pump: PumpClient::new(sender, config.pump.clone()),
            bridge,
        })
    }
}

#[async_trait]
impl SolanaChain for SolanaClients {
    async fn bonding_curve(&self, mint: &Pubkey) -> Result<Option<BondingCurve>> {
        self.pump.bonding_curve(mint).await
    }

    async fn sol_balance(&self, owner: &Pubkey) -> Result<u64> {
        token::sol_balance(&self.rpc, owner).await
    }

    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<u64> {
        let ata = token::derive_ata(owner, mint);
        if token::get_account(&self.rpc, &ata).await?.is_none() {
            return Ok(0);
        }
        token::token_balance(&self.rpc, owner, mint).await
    }

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8> {
        token::fetch_decimals(&self.rpc, mint).await
    }

    async fn create_and_buy(
        &self,
        creator: &Keypair,
        mint: &Keypair,
        token: &TokenConfig,
    ) -> Result<CreateResult> {
        self.pump.create_and_buy(creator, mint, token).await
    }

    async fn is_wrapped(&self, mint: &Pubkey) -> Result<bool> {
        self.bridge.is_wrapped(mint).await
    }

    async fn attest(&self, payer: &Keypair, mint: &Pubkey) -> Result<PostedMessage> {
        self.bridge.attest(payer, mint).await
    }

    async fn transfer_native(
        &self,
        owner: &Keypair,
        mint: &Pubkey,
        amount: u64,
        recipient: UniversalAddress,
        target_chain: u16,
    ) -> Result<PostedMessage> {
        self.bridge
            .transfer_native(owner, mint, amount, recipient, target_chain)
            .await
    }
}

/// Every client the launch needs, wired from configuration
pub struct Launch {
    config: Config,
    solana: Box<dyn SolanaChain>,
    vaas: Box<dyn VaaSource>,
    base: Option<Box<dyn BaseChain>>,
    creator: Keypair,
    mint: Keypair,
}

impl Launch {
    pub fn new(config: Config) -> Result<Self> {
        let keys_folder = PathBuf::from(&config.solana.keys_folder);
        let creator = keystore::load_creator(&keys_folder)?;
        let mint = keystore::load_mint(&keys_folder)?;

        let solana = SolanaClients::new(&config)?;
        let wormholescan = WormholescanClient::new(config.wormhole.api_url.clone(), WORMHOLESCAN_TIMEOUT)?;

        let base: Option<Box<dyn BaseChain>> = match keystore::evm_signer_from_env() {
            Ok(signer) => Some(Box::new(BaseClient::connect(&config.base, signer)?)),
            Err(Error::MissingEnvVar(var)) => {
                warn!("{} not set, Base steps are unavailable", var);
                None
            }
            Err(e) => return Err(e),
        };

        info!("Creator: {}", creator.pubkey());
        info!("Mint: {}", mint.pubkey());

        Ok(Self::from_parts(
            config,
            Box::new(solana),
            Box::new(wormholescan),
            base,
            creator,
            mint,
        ))
    }

    /// Assemble a launch from already built chain clients
    pub fn from_parts(
        config: Config,
        solana: Box<dyn SolanaChain>,
        vaas: Box<dyn VaaSource>,
        base: Option<Box<dyn BaseChain>>,
        creator: Keypair,
        mint: Keypair,
    ) -> Self {
        Self {
            config,
            solana,
            vaas,
            base,
            creator,
            mint,
        }
    }

    pub fn mint(&self) -> Pubkey {
        self.mint.pubkey()
    }

    pub fn creator(&self) -> Pubkey {
        self.creator.pubkey()
    }

    pub fn base(&self) -> Result<&dyn BaseChain> {
        self.base
            .as_deref()
            .ok_or_else(|| Error::MissingEnvVar(keystore::BASE_PRIVATE_KEY_ENV.to_string()))
    }

    /// Fail early when the Base RPC serves another chain than configured
    pub async fn check_base_chain(&self) -> Result<()> {
        let chain_id = self.base()?.chain_id().await?;
        if chain_id != self.config.base.chain_id {
            return Err(Error::Config(format!(
                "Base RPC reports chain {} but {} is configured",
                chain_id, self.config.base.chain_id
            )));
        }
        Ok(())
    }

    /// Run every step for the persisted mint
    ///
    /// The report comes back even when a step fails, with the failure
    /// recorded in it.
    pub async fn run(&self) -> (LaunchReport, Result<()>) {
        let mut report = LaunchReport::new(self.config.network, &self.mint(), &self.creator());

        let result = self.run_steps(&mut report).await;
        if let Err(e) = &result {
            report.fail(e);
        }
        report.finish();

        (report, result)
    }

    async fn run_steps(&self, report: &mut LaunchReport) -> Result<()> {
        let mint = self.mint();
        let creator = self.creator();

        if let Some(curve) = self.solana.bonding_curve(&mint).await? {
            let balance = self.solana.token_balance(&creator, &mint).await?;
            info!(
                "Bonding curve already exists: {} SOL/token, complete: {}, creator holds {}",
                format_price(price_per_token_sol(curve.get_price()?, DEFAULT_TOKEN_DECIMALS)),
                curve.complete,
                pump::price::tokens_to_human(balance, DEFAULT_TOKEN_DECIMALS)
            );
            report.stop(format!(
                "{} was already created; use attest/bridge/deploy to continue",
                mint
            ));
            return Ok(());
        }

        let lamports = self.solana.sol_balance(&creator).await?;
        if lamports == 0 {
            println!("\nCreator {} has no SOL.", creator);
            println!("Fund it and run again.");
            report.stop(format!("creator {} has no SOL", creator));
            return Ok(());
        }
        info!("Creator balance: {} SOL", pump::price::lamports_to_sol(lamports));

        self.check_base_chain().await?;

        report.step = LaunchStep::Create;
        let created = self.create().await?;
        report.create_signature = Some(created.signature.to_string());
        report.metadata_uri = Some(created.metadata_uri);
        report.tokens_bought = Some(created.tokens_bought);

        report.step = LaunchStep::Attest;
        let mut attested = AttestOutcome::default();
        let result = self.attest_into(&mint, &mut attested).await;
        report.record_attest(&attested);
        let wrapped = result?;

        report.step = LaunchStep::Bridge;
        report.transfer = self.bridge(&mint, None).await?;

        report.step = LaunchStep::Deploy;
        let mut deployed = DeployOutcome::default();
        let result = self.deploy_into(wrapped, &mut deployed).await;
        report.record_deploy(deployed);
        result?;

        report.step = LaunchStep::Done;
        info!("Launch complete: {}", report.pump_url);
        Ok(())
    }

    /// Create the token on pump.fun with the creator's initial buy
    pub async fn create(&self) -> Result<CreateResult> {
        info!(
            "Creating {} ({}) as {}",
            self.config.token.name,
            self.config.token.symbol,
            self.mint.pubkey()
        );
        self.solana
            .create_and_buy(&self.creator, &self.mint, &self.config.token)
            .await
    }

    /// Attest `mint` from Solana and register the wrapped token on Base
    pub async fn attest(&self, mint: &Pubkey) -> Result<AttestOutcome> {
        let mut outcome = AttestOutcome::default();
        self.attest_into(mint, &mut outcome).await?;
        Ok(outcome)
    }

    async fn attest_into(&self, mint: &Pubkey, outcome: &mut AttestOutcome) -> Result<Address> {
        let base = self.base()?;
        let token_address = UniversalAddress::from_pubkey(mint);

        if let Some(wrapped) = base.wrapped_asset(CHAIN_ID_SOLANA, &token_address).await? {
            info!("{} is already registered on Base as {}", mint, wrapped);
            outcome.wrapped_token = Some(wrapped);
            return Ok(wrapped);
        }

        let posted = self.solana.attest(&self.creator, mint).await?;
        outcome.message = Some(posted.id);
        let vaa = self.fetch_vaa(&posted.id).await?;

        match TokenBridgePayload::parse(&vaa.payload)? {
            TokenBridgePayload::AssetMeta(meta)
                if meta.token_chain == CHAIN_ID_SOLANA && meta.token_address.to_pubkey() == *mint =>
            {
                info!(
                    "Attestation for {} ({}), {} decimals",
                    meta.name, meta.symbol, meta.decimals
                )
            }
            other => {
                return Err(Error::VaaDecode(format!(
                    "Expected the attestation of {}, got {:?}",
                    mint, other
                )))
            }
        }

        let tx = base.create_wrapped(&vaa).await?;
        outcome.create_wrapped_tx = Some(tx);

        let wrapped = base
            .wrapped_asset(CHAIN_ID_SOLANA, &token_address)
            .await?
            .ok_or_else(|| Error::Evm(format!("No wrapped asset for {} after {}", mint, tx)))?;
        info!("Wrapped token on Base: {}", wrapped);
        outcome.wrapped_token = Some(wrapped);

        Ok(wrapped)
    }

    /// Bridge `amount` (default: the creator's whole balance) to the Base
    /// signer. `None` when there was nothing to bridge.
    pub async fn bridge(&self, mint: &Pubkey, amount: Option<u64>) -> Result<Option<TransferRecord>> {
        let base = self.base()?;
        let balance = self.solana.token_balance(&self.creator(), mint).await?;
        let amount = amount.unwrap_or(balance);

        if amount == 0 {
            warn!("Nothing to bridge for {}", mint);
            return Ok(None);
        }
        if amount > balance {
            return Err(Error::InsufficientBalance {
                available: balance.to_string(),
                required: amount.to_string(),
            });
        }

        if self.solana.is_wrapped(mint).await? {
            return Err(Error::Config(format!(
                "{} is a Wormhole wrapped asset, only native mints can be bridged",
                mint
            )));
        }

        let decimals = self.solana.mint_decimals(mint).await?;
        info!(
            "Bridging {} units ({} decimals), arriving as {} units with {} decimals",
            amount,
            decimals,
            normalize_amount(amount, decimals),
            wrapped_decimals(decimals)
        );

        let recipient = UniversalAddress::from_evm(base.address());
        let message = self
            .solana
            .transfer_native(
                &self.creator,
                mint,
                amount,
                recipient,
                self.config.base.wormhole_chain_id,
            )
            .await?;

        let mut record = TransferRecord {
            signature: message.signature.to_string(),
            message_id: message.id.to_string(),
            amount,
            redeem_tx: None,
            error: None,
        };
        match self.redeem(&message.id).await {
            Ok(tx) => record.redeem_tx = tx,
            Err(e) => {
                error!("Redeeming {} failed: {}", message.id, e);
                record.error = Some(e.to_string());
            }
        }

        Ok(Some(record))
    }

    /// Redeem a transfer to the Base signer; `None` if it was already redeemed
    pub async fn redeem(&self, id: &MessageId) -> Result<Option<TxHash>> {
        let base = self.base()?;
        let vaa = self.fetch_vaa(id).await?;

        let transfer = match TokenBridgePayload::parse(&vaa.payload)? {
            TokenBridgePayload::Transfer(transfer) => transfer,
            other => {
                return Err(Error::VaaDecode(format!(
                    "Expected a transfer in {}, got {:?}",
                    id, other
                )))
            }
        };

        let target = self.config.base.wormhole_chain_id;
        if transfer.to_chain != target {
            return Err(Error::VaaDecode(format!(
                "Transfer {} targets chain {}, Base is {}",
                id, transfer.to_chain, target
            )));
        }
        let recipient = transfer.to.to_evm()?;
        if recipient != base.address() {
            return Err(Error::VaaDecode(format!(
                "Transfer {} pays {}, not the Base signer {}",
                id,
                recipient,
                base.address()
            )));
        }
        info!("Transfer of {} (normalized) to {}", transfer.amount, recipient);

        if base.is_transfer_completed(&vaa).await? {
            info!("Transfer {} was already redeemed", id);
            return Ok(None);
        }

        base.complete_transfer(&vaa).await.map(Some)
    }

    /// Wrap ETH, create and initialize the pool, and mint the ladder
    pub async fn deploy(&self, token: Address) -> Result<DeployOutcome> {
        let mut outcome = DeployOutcome::default();
        self.deploy_into(token, &mut outcome).await?;
        Ok(outcome)
    }

    async fn deploy_into(&self, token: Address, outcome: &mut DeployOutcome) -> Result<()> {
        let base = self.base()?;
        let decimals = base.token_decimals(token).await?;
        let plan = plan(&self.config, token, decimals)?;
        outcome.plan = Some(plan.clone());
        let (token_needed, weth_needed) = plan.totals();

        outcome.weth_wrapped = match base.wrap_eth().await {
            Ok(wrapped) => Some(wrapped),
            Err(Error::InsufficientBalance { available, .. }) => {
                warn!("Nothing left to wrap ({} ETH balance), using existing WETH", available);
                None
            }
            Err(e) => return Err(e),
        };

        let weth_balance = base.weth_balance().await?;
        if weth_balance < weth_needed {
            return Err(Error::InsufficientBalance {
                available: format!("{} WETH wei", weth_balance),
                required: format!("{} WETH wei", weth_needed),
            });
        }
        let token_balance = base.token_balance(token).await?;
        if token_balance < token_needed {
            return Err(Error::InsufficientBalance {
                available: format!("{} token units", token_balance),
                required: format!("{} token units", token_needed),
            });
        }

        let fee = plan.fee_tier.fee();
        let pool = base.create_pool(plan.token0, plan.token1, fee).await?;
        outcome.pool = Some(pool);
        base.initialize_pool(pool, plan.sqrt_price_x96).await?;

        let (amount0, amount1) = if plan.token_is_token0 {
            (token_needed, weth_needed)
        } else {
            (weth_needed, token_needed)
        };
        base.approve(plan.token0, base.position_manager(), amount0).await?;
        base.approve(plan.token1, base.position_manager(), amount1).await?;

        for position in &plan.positions {
            let minted = base
                .mint_position(plan.token0, plan.token1, fee, position)
                .await?;
            info!(
                "Position {} minted as NFT {} with liquidity {}",
                position.index, minted.token_id, minted.liquidity
            );
            outcome.positions.push(PositionRecord {
                index: position.index,
                tick_lower: position.tick_lower,
                tick_upper: position.tick_upper,
                token_id: minted.token_id,
                liquidity: minted.liquidity,
                amount0: minted.amount0,
                amount1: minted.amount1,
                tx_hash: minted.tx_hash,
            });
        }

        Ok(())
    }

    pub async fn status(&self) -> Result<LaunchStatus> {
        let mint = self.mint();
        let creator = self.creator();

        let wrapped_token = match self.base.as_deref() {
            Some(base) => {
                base.wrapped_asset(CHAIN_ID_SOLANA, &UniversalAddress::from_pubkey(&mint))
                    .await?
            }
            None => None,
        };

        let token_balance = self.solana.token_balance(&creator, &mint).await?;
        let bonding_curve = self.solana.bonding_curve(&mint).await?;
        let (buy_quote, holdings_value) = match &bonding_curve {
            Some(curve) if !curve.complete => (
                Some(curve.calculate_buy_tokens(sol_to_lamports(self.config.pump.buy_amount_sol))?),
                Some(curve.calculate_sell_sol(token_balance)?),
            ),
            _ => (None, None),
        };

        Ok(LaunchStatus {
            mint,
            creator,
            sol_balance: self.solana.sol_balance(&creator).await?,
            token_balance,
            bonding_curve,
            buy_quote,
            holdings_value,
            wrapped_token,
        })
    }

    async fn fetch_vaa(&self, id: &MessageId) -> Result<Vaa> {
        wait_for_vaa(
            &*self.vaas,
            id,
            Duration::from_secs(self.config.wormhole.vaa_timeout_secs),
            Duration::from_millis(self.config.wormhole.vaa_poll_interval_ms),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clmm::PositionPlan;
    use crate::config::BaseConfig;
    use crate::evm::MintedPosition;
    use crate::wormhole::payload::{PAYLOAD_ASSET_META, PAYLOAD_TRANSFER};
    use crate::wormhole::vaa::tests::sample_vaa_bytes;
    use solana_sdk::signature::Signature;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const ATTEST_SEQUENCE: u64 = 11;
    const TRANSFER_SEQUENCE: u64 = 12;
    const BOUGHT: u64 = 34_528_931_000_000;

    fn posted(sequence: u64) -> PostedMessage {
        PostedMessage {
            signature: Signature::default(),
            id: MessageId {
                chain: CHAIN_ID_SOLANA,
                emitter: UniversalAddress([0xec; 32]),
                sequence,
            },
        }
    }

    fn padded(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..s.len()].copy_from_slice(s.as_bytes());
        out
    }

    fn asset_meta_vaa(mint: &Pubkey) -> Vec<u8> {
        let mut payload = vec![PAYLOAD_ASSET_META];
        payload.extend_from_slice(&mint.to_bytes());
        payload.extend_from_slice(&CHAIN_ID_SOLANA.to_be_bytes());
        payload.push(6);
        payload.extend_from_slice(&padded("MCT"));
        payload.extend_from_slice(&padded("multichain-test"));
        sample_vaa_bytes(ATTEST_SEQUENCE, &payload)
    }

    fn transfer_vaa(mint: &Pubkey, to: Address, to_chain: u16) -> Vec<u8> {
        let mut payload = vec![PAYLOAD_TRANSFER];
        payload.extend_from_slice(&U256::from(BOUGHT).to_be_bytes::<32>());
        payload.extend_from_slice(&mint.to_bytes());
        payload.extend_from_slice(&CHAIN_ID_SOLANA.to_be_bytes());
        payload.extend_from_slice(&UniversalAddress::from_evm(to).0);
        payload.extend_from_slice(&to_chain.to_be_bytes());
        payload.extend_from_slice(&[0u8; 32]);
        sample_vaa_bytes(TRANSFER_SEQUENCE, &payload)
    }

    /// In-memory Solana side; `transfers` records (amount, recipient, target chain)
    #[derive(Default)]
    struct FakeSolana {
        curve: Option<BondingCurve>,
        lamports: u64,
        tokens: Mutex<u64>,
        created: Arc<Mutex<bool>>,
        transfers: Arc<Mutex<Vec<(u64, UniversalAddress, u16)>>>,
    }

    #[async_trait]
    impl SolanaChain for FakeSolana {
        async fn bonding_curve(&self, _mint: &Pubkey) -> Result<Option<BondingCurve>> {
            Ok(self.curve.clone())
        }

        async fn sol_balance(&self, _owner: &Pubkey) -> Result<u64> {
            Ok(self.lamports)
        }

        async fn token_balance(&self, _owner: &Pubkey, _mint: &Pubkey) -> Result<u64> {
            Ok(*self.tokens.lock().unwrap())
        }

        async fn mint_decimals(&self, _mint: &Pubkey) -> Result<u8> {
            Ok(6)
        }

        async fn create_and_buy(
            &self,
            _creator: &Keypair,
            _mint: &Keypair,
            _token: &TokenConfig,
        ) -> Result<CreateResult> {
            *self.created.lock().unwrap() = true;
            *self.tokens.lock().unwrap() = BOUGHT;
            Ok(CreateResult {
                signature: Signature::default(),
                metadata_uri: "https://ipfs.io/ipfs/QmTest".to_string(),
                tokens_bought: BOUGHT,
                max_sol_cost: 105_000_000,
            })
        }

        async fn is_wrapped(&self, _mint: &Pubkey) -> Result<bool> {
            Ok(false)
        }

        async fn attest(&self, _payer: &Keypair, _mint: &Pubkey) -> Result<PostedMessage> {
            Ok(posted(ATTEST_SEQUENCE))
        }

        async fn transfer_native(
            &self,
            _owner: &Keypair,
            _mint: &Pubkey,
            amount: u64,
            recipient: UniversalAddress,
            target_chain: u16,
        ) -> Result<PostedMessage> {
            self.transfers
                .lock()
                .unwrap()
                .push((amount, recipient, target_chain));
            Ok(posted(TRANSFER_SEQUENCE))
        }
    }

    /// Signed VAAs by sequence; anything else is a permanent lookup error
    struct FakeVaas(HashMap<u64, Vec<u8>>);

    #[async_trait]
    impl VaaSource for FakeVaas {
        async fn fetch_vaa(&self, id: &MessageId) -> Result<Option<Vec<u8>>> {
            self.0
                .get(&id.sequence)
                .cloned()
                .map(Some)
                .ok_or_else(|| Error::VaaDecode(format!("guardians never signed {}", id)))
        }
    }

    struct FakeBase {
        address: Address,
        chain_id: u64,
        wrapped: Mutex<Option<Address>>,
        redeemed: Arc<Mutex<Vec<u64>>>,
        minted: Mutex<u32>,
        fail_mint_at: Option<u32>,
    }

    impl FakeBase {
        fn new(config: &Config) -> Self {
            Self {
                address: Address::repeat_byte(0x42),
                chain_id: config.base.chain_id,
                wrapped: Mutex::new(None),
                redeemed: Arc::new(Mutex::new(Vec::new())),
                minted: Mutex::new(0),
                fail_mint_at: None,
            }
        }
    }

    #[async_trait]
    impl BaseChain for FakeBase {
        fn address(&self) -> Address {
            self.address
        }

        fn position_manager(&self) -> Address {
            Address::repeat_byte(0x77)
        }

        async fn chain_id(&self) -> Result<u64> {
            Ok(self.chain_id)
        }

        async fn eth_balance(&self) -> Result<U256> {
            Ok(U256::MAX)
        }

        async fn weth_balance(&self) -> Result<U256> {
            Ok(U256::MAX)
        }

        async fn token_balance(&self, _token: Address) -> Result<U256> {
            Ok(U256::MAX)
        }

        async fn token_decimals(&self, _token: Address) -> Result<u8> {
            Ok(6)
        }

        async fn wrap_eth(&self) -> Result<(U256, TxHash)> {
            Ok((U256::from(1_000_000_000_000_000_000u64), TxHash::repeat_byte(1)))
        }

        async fn create_wrapped(&self, _vaa: &Vaa) -> Result<TxHash> {
            *self.wrapped.lock().unwrap() = Some(Address::repeat_byte(0x55));
            Ok(TxHash::repeat_byte(2))
        }

        async fn complete_transfer(&self, vaa: &Vaa) -> Result<TxHash> {
            self.redeemed.lock().unwrap().push(vaa.sequence);
            Ok(TxHash::repeat_byte(3))
        }

        async fn is_transfer_completed(&self, _vaa: &Vaa) -> Result<bool> {
            Ok(false)
        }

        async fn wrapped_asset(
            &self,
            _chain: u16,
            _address: &UniversalAddress,
        ) -> Result<Option<Address>> {
            Ok(*self.wrapped.lock().unwrap())
        }

        async fn create_pool(&self, _a: Address, _b: Address, _fee: u32) -> Result<Address> {
            Ok(Address::repeat_byte(0x99))
        }

        async fn initialize_pool(&self, _pool: Address, _sqrt_price_x96: U256) -> Result<bool> {
            Ok(true)
        }

        async fn approve(&self, _token: Address, _spender: Address, _amount: U256) -> Result<Option<TxHash>> {
            Ok(None)
        }

        async fn mint_position(
            &self,
            _token0: Address,
            _token1: Address,
            _fee: u32,
            position: &PositionPlan,
        ) -> Result<MintedPosition> {
            let mut minted = self.minted.lock().unwrap();
            if Some(*minted) == self.fail_mint_at {
                return Err(Error::Evm("mint reverted".to_string()));
            }
            *minted += 1;
            Ok(MintedPosition {
                token_id: U256::from(1000 + position.index),
                liquidity: position.liquidity,
                amount0: position.amount0,
                amount1: position.amount1,
                tx_hash: TxHash::repeat_byte(4),
            })
        }
    }

    fn funded() -> FakeSolana {
        FakeSolana {
            lamports: 2_000_000_000,
            ..Default::default()
        }
    }

    fn signed(mint: &Keypair, base: &FakeBase, to_chain: u16) -> FakeVaas {
        let mint = mint.pubkey();
        FakeVaas(HashMap::from([
            (ATTEST_SEQUENCE, asset_meta_vaa(&mint)),
            (TRANSFER_SEQUENCE, transfer_vaa(&mint, base.address, to_chain)),
        ]))
    }

    fn launch(
        config: Config,
        solana: FakeSolana,
        vaas: FakeVaas,
        base: Option<FakeBase>,
        mint: Keypair,
    ) -> Launch {
        Launch::from_parts(
            config,
            Box::new(solana),
            Box::new(vaas),
            base.map(|b| Box::new(b) as Box<dyn BaseChain>),
            Keypair::new(),
            mint,
        )
    }

    fn testnet_config() -> Config {
        let mut config = Config::default();
        config.network = Network::Testnet;
        config.base = BaseConfig::default();
        config.apply_network_defaults();
        config
    }

    #[test]
    fn test_report_serializes() {
        let mint = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let mut report = LaunchReport::new(Network::Testnet, &mint, &creator);
        report.transfer = Some(TransferRecord {
            signature: "sig".to_string(),
            message_id: format!("1/{}/7", "ec".repeat(32)),
            amount: 1_000_000,
            redeem_tx: None,
            error: Some("VAA not found".to_string()),
        });
        report.pool = Some(Address::repeat_byte(0x11));
        report.step = LaunchStep::Deploy;
        report.fail(&Error::Evm("mint reverted".to_string()));
        report.finish();

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["network"], "testnet");
        assert_eq!(json["mint"], mint.to_string());
        assert_eq!(json["step"], "deploy");
        assert_eq!(json["transfer"]["amount"], 1_000_000);
        assert_eq!(json["transfer"]["error"], "VAA not found");
        assert_eq!(json["failed"]["step"], "deploy");
        assert_eq!(json["failed"]["error"], "EVM error: mint reverted");
        assert!(json["finished_at"].is_string());
        assert!(json["stopped"].is_null());
        assert!(json["pump_url"].as_str().unwrap().ends_with(&mint.to_string()));
    }

    #[test]
    fn test_plan_uses_configured_weth() {
        let config = Config::default();
        let token = Address::repeat_byte(0x01);
        let plan = plan(&config, token, 6).unwrap();

        let weth: Address = config.base.weth.parse().unwrap();
        assert_eq!(plan.token0, token);
        assert_eq!(plan.token1, weth);
        assert_eq!(plan.positions.len(), config.clmm.num_positions as usize);
    }

    #[tokio::test]
    async fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = LaunchReport::new(Network::Mainnet, &Pubkey::new_unique(), &Pubkey::new_unique());
        report.save(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"started_at\""));
    }

    #[tokio::test]
    async fn test_run_stops_when_already_created() {
        let solana = FakeSolana {
            curve: Some(BondingCurve::new_for_test(
                30_000_000_000,
                1_073_000_000_000_000,
                0,
                793_100_000_000_000,
                1_000_000_000_000_000,
                false,
            )),
            ..funded()
        };
        let created = solana.created.clone();

        let launch = launch(Config::default(), solana, FakeVaas(HashMap::new()), None, Keypair::new());
        let (report, result) = launch.run().await;

        assert!(result.is_ok());
        assert!(report.stopped.unwrap().contains("already created"));
        assert_eq!(report.step, LaunchStep::Preflight);
        assert!(report.create_signature.is_none());
        assert!(report.failed.is_none());
        assert!(!*created.lock().unwrap());
    }

    #[tokio::test]
    async fn test_run_stops_without_sol() {
        let solana = FakeSolana::default();
        let created = solana.created.clone();

        let launch = launch(Config::default(), solana, FakeVaas(HashMap::new()), None, Keypair::new());
        let (report, result) = launch.run().await;

        assert!(result.is_ok());
        assert!(report.stopped.unwrap().contains("has no SOL"));
        assert!(report.finished_at.is_some());
        assert!(!*created.lock().unwrap());
    }

    #[tokio::test]
    async fn test_full_run() {
        let config = Config::default();
        let mint = Keypair::new();
        let base = FakeBase::new(&config);
        let vaas = signed(&mint, &base, config.base.wormhole_chain_id);
        let redeemed = base.redeemed.clone();

        let launch = launch(config, funded(), vaas, Some(base), mint);
        let (report, result) = launch.run().await;

        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(report.step, LaunchStep::Done);
        assert_eq!(report.tokens_bought, Some(BOUGHT));
        assert_eq!(
            report.attestation,
            Some(format!("1/{}/{}", "ec".repeat(32), ATTEST_SEQUENCE))
        );
        assert_eq!(report.wrapped_token, Some(Address::repeat_byte(0x55)));
        assert_eq!(report.transfer.unwrap().redeem_tx, Some(TxHash::repeat_byte(3)));
        assert_eq!(report.positions.len(), 5);
        assert_eq!(report.pool, Some(Address::repeat_byte(0x99)));
        assert_eq!(*redeemed.lock().unwrap(), vec![TRANSFER_SEQUENCE]);
    }

    #[tokio::test]
    async fn test_failed_redeem_is_recorded_and_run_continues() {
        let config = Config::default();
        let mint = Keypair::new();
        let base = FakeBase::new(&config);
        let mut vaas = signed(&mint, &base, config.base.wormhole_chain_id);
        vaas.0.remove(&TRANSFER_SEQUENCE);
        let redeemed = base.redeemed.clone();

        let launch = launch(config, funded(), vaas, Some(base), mint);
        let (report, result) = launch.run().await;

        assert!(result.is_ok(), "{:?}", result);
        let transfer = report.transfer.unwrap();
        assert_eq!(transfer.amount, BOUGHT);
        assert!(transfer.redeem_tx.is_none());
        assert!(transfer.error.unwrap().contains("guardians never signed"));
        assert!(redeemed.lock().unwrap().is_empty());

        // deploy still ran
        assert_eq!(report.step, LaunchStep::Done);
        assert_eq!(report.positions.len(), 5);
        assert!(report.failed.is_none());
    }

    #[tokio::test]
    async fn test_failed_step_keeps_partial_progress() {
        let config = Config::default();
        let mint = Keypair::new();
        let mut base = FakeBase::new(&config);
        base.fail_mint_at = Some(2);
        let vaas = signed(&mint, &base, config.base.wormhole_chain_id);

        let launch = launch(config, funded(), vaas, Some(base), mint);
        let (report, result) = launch.run().await;

        assert!(matches!(result, Err(Error::Evm(_))));
        let failed = report.failed.unwrap();
        assert_eq!(failed.step, LaunchStep::Deploy);
        assert!(failed.error.contains("mint reverted"));
        assert_eq!(report.step, LaunchStep::Deploy);
        assert_eq!(report.positions.len(), 2);
        assert_eq!(report.pool, Some(Address::repeat_byte(0x99)));
        assert!(report.create_signature.is_some());
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_attest_failure_keeps_message_id() {
        let config = Config::default();
        let base = FakeBase::new(&config);

        let launch = launch(config, funded(), FakeVaas(HashMap::new()), Some(base), Keypair::new());
        let (report, result) = launch.run().await;

        assert!(matches!(result, Err(Error::VaaDecode(_))));
        assert_eq!(report.failed.unwrap().step, LaunchStep::Attest);
        assert_eq!(
            report.attestation,
            Some(format!("1/{}/{}", "ec".repeat(32), ATTEST_SEQUENCE))
        );
        assert!(report.wrapped_token.is_none());
        assert!(report.transfer.is_none());
    }

    #[tokio::test]
    async fn test_testnet_transfer_targets_base_sepolia() {
        let config = testnet_config();
        let mint = Keypair::new();
        let base = FakeBase::new(&config);
        let vaas = signed(&mint, &base, 10004);
        let signer = base.address;
        let solana = funded();
        let transfers = solana.transfers.clone();

        let launch = launch(config, solana, vaas, Some(base), mint);
        let (report, result) = launch.run().await;

        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(
            *transfers.lock().unwrap(),
            vec![(BOUGHT, UniversalAddress::from_evm(signer), 10004)]
        );
        assert!(report.transfer.unwrap().redeem_tx.is_some());
    }

    #[tokio::test]
    async fn test_redeem_rejects_other_target_chain() {
        let config = testnet_config();
        let mint = Keypair::new();
        let base = FakeBase::new(&config);
        // a mainnet transfer handed to a testnet launch
        let vaas = signed(&mint, &base, 30);
        let redeemed = base.redeemed.clone();

        let launch = launch(config, funded(), vaas, Some(base), mint);
        let err = launch.redeem(&posted(TRANSFER_SEQUENCE).id).await.unwrap_err();

        assert!(err.to_string().contains("targets chain 30"));
        assert!(redeemed.lock().unwrap().is_empty());
    }
}
