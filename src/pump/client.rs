//! Pump.fun client - account reads and the create-and-buy flow

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use std::path::Path;
use tracing::{info, warn};

use super::accounts::{BondingCurve, Global};
use super::instruction::{BuyInstruction, CreateInstruction};
use super::metadata::{MetadataUploader, TokenMetadata};
use super::price::{calculate_max_sol_with_slippage, lamports_to_sol, sol_to_lamports};
use super::program;
use crate::config::{PumpConfig, TokenConfig};
use crate::error::{Error, Result};
use crate::solana::{token, ComputeBudget, TransactionSender};

/// Outcome of a successful create-and-buy
#[derive(Debug, Clone)]
pub struct CreateResult {
    pub signature: Signature,
    pub metadata_uri: String,
    pub tokens_bought: u64,
    pub max_sol_cost: u64,
}

/// Client for the pump.fun program
pub struct PumpClient {
    sender: TransactionSender,
    uploader: MetadataUploader,
    config: PumpConfig,
}

impl PumpClient {
    pub fn new(sender: TransactionSender, config: PumpConfig) -> Self {
        let uploader = MetadataUploader::new(config.ipfs_url.clone());
        Self {
            sender,
            uploader,
            config,
        }
    }

    /// Fetch and decode the global config account
    pub async fn global(&self) -> Result<Global> {
        let address = program::global_pda();
        let account = token::get_account(self.sender.rpc(), &address)
            .await?
            .ok_or_else(|| Error::PumpDecode(format!("Global account {} not found", address)))?;
        Global::try_from_slice(&account.data)
    }

    /// Bonding curve for a mint, `None` if the token was never created
    pub async fn bonding_curve(&self, mint: &Pubkey) -> Result<Option<BondingCurve>> {
        let address = program::bonding_curve_pda(mint);
        match token::get_account(self.sender.rpc(), &address).await? {
            Some(account) => BondingCurve::try_from_slice(&account.data).map(Some),
            None => Ok(None),
        }
    }

    /// Create the token and make the creator's first buy in one transaction
    pub async fn create_and_buy(
        &self,
        creator: &Keypair,
        mint: &Keypair,
        token_config: &TokenConfig,
    ) -> Result<CreateResult> {
        let metadata_uri = self.resolve_metadata_uri(token_config).await?;

        let create = CreateInstruction {
            name: token_config.name.clone(),
            symbol: token_config.symbol.clone(),
            uri: metadata_uri.clone(),
        };
        let mut instructions = vec![create.instruction(&mint.pubkey(), &creator.pubkey())?];

        let buy_lamports = sol_to_lamports(self.config.buy_amount_sol);
        let mut tokens_bought = 0;
        let mut max_sol_cost = 0;

        if buy_lamports > 0 {
            let global = self.global().await?;
            tokens_bought = global.initial_buy_tokens(buy_lamports)?;
            max_sol_cost = calculate_max_sol_with_slippage(buy_lamports, self.config.slippage_bps);

            instructions.push(create_associated_token_account_idempotent(
                &creator.pubkey(),
                &creator.pubkey(),
                &mint.pubkey(),
                &spl_token::ID,
            ));
            instructions.push(
                BuyInstruction {
                    amount: tokens_bought,
                    max_sol_cost,
                }
                .instruction(&mint.pubkey(), &creator.pubkey(), &global.fee_recipient),
            );

            info!(
                "Initial buy: {} tokens for up to {} SOL",
                tokens_bought,
                lamports_to_sol(max_sol_cost)
            );
        } else {
            warn!("buy_amount_sol is zero, creating without an initial buy");
        }

        let budget = ComputeBudget::new(self.config.compute_unit_limit, self.config.compute_unit_price);
        let signature = self
            .sender
            .send(instructions, budget, creator, &[mint])
            .await?;

        info!("Created {} ({})", mint.pubkey(), program::pump_fun_url(&mint.pubkey()));

        Ok(CreateResult {
            signature,
            metadata_uri,
            tokens_bought,
            max_sol_cost,
        })
    }

    async fn resolve_metadata_uri(&self, token_config: &TokenConfig) -> Result<String> {
        if let Some(uri) = &token_config.metadata_uri {
            info!("Using configured metadata URI {}", uri);
            return Ok(uri.clone());
        }

        let metadata = TokenMetadata {
            name: token_config.name.clone(),
            symbol: token_config.symbol.clone(),
            description: token_config.description.clone(),
            twitter: token_config.twitter.clone(),
            telegram: token_config.telegram.clone(),
            website: token_config.website.clone(),
        };

        self.uploader
            .upload(&metadata, Path::new(&token_config.image_path))
            .await
    }
}
