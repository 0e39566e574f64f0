//! Posting token bridge messages from Solana

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tracing::{debug, info};

use super::address::UniversalAddress;
use super::instruction::{
    approve_authority_signer, attest_token, message_fee_transfer, parse_sequence_from_logs,
    transfer_native, TransferNativeData,
};
use super::program::{BridgeData, WormholePrograms, CHAIN_ID_SOLANA};
use super::vaa::MessageId;
use crate::error::{Error, Result};
use crate::solana::{token, ComputeBudget, TransactionSender};

/// A confirmed Solana transaction that posted a Wormhole message
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub signature: Signature,
    pub id: MessageId,
}

/// Token bridge operations initiated on Solana
pub struct SolanaTokenBridge {
    sender: TransactionSender,
    programs: WormholePrograms,
    nonce: u32,
    budget: ComputeBudget,
}

impl SolanaTokenBridge {
    pub fn new(
        sender: TransactionSender,
        programs: WormholePrograms,
        nonce: u32,
        compute_unit_price: u64,
    ) -> Self {
        Self {
            sender,
            programs,
            nonce,
            budget: ComputeBudget::price_only(compute_unit_price),
        }
    }

    /// Current core bridge message fee in lamports
    pub async fn message_fee(&self) -> Result<u64> {
        let address = self.programs.bridge();
        let account = token::get_account(self.sender.rpc(), &address)
            .await?
            .ok_or_else(|| Error::Rpc(format!("Core bridge account {} not found", address)))?;
        Ok(BridgeData::try_from_slice(&account.data)?.config.fee)
    }

    /// Whether the mint is itself a wrapped foreign asset. Those move with
    /// `transfer_wrapped`, which this bridge does not send.
    pub async fn is_wrapped(&self, mint: &Pubkey) -> Result<bool> {
        let meta = self.programs.wrapped_meta(mint);
        Ok(token::get_account(self.sender.rpc(), &meta).await?.is_some())
    }

    /// Publish the mint's metadata so a wrapped token can be created abroad
    pub async fn attest(&self, payer: &Keypair, mint: &Pubkey) -> Result<PostedMessage> {
        info!("Attesting {} via token bridge {}", mint, self.programs.token_bridge);

        let message = Keypair::new();
        let mut instructions = self.fee_instructions(&payer.pubkey()).await?;
        instructions.push(attest_token(
            &self.programs,
            &payer.pubkey(),
            mint,
            &message.pubkey(),
            self.nonce,
        )?);

        self.post(instructions, payer, &message).await
    }

    /// Lock `amount` raw units of `mint` and emit a transfer to `recipient`
    pub async fn transfer_native(
        &self,
        owner: &Keypair,
        mint: &Pubkey,
        amount: u64,
        recipient: UniversalAddress,
        target_chain: u16,
    ) -> Result<PostedMessage> {
        let from = token::derive_ata(&owner.pubkey(), mint);
        info!(
            "Bridging {} units of {} from {} to chain {} recipient {}",
            amount, mint, from, target_chain, recipient
        );

        let message = Keypair::new();
        let args = TransferNativeData::new(self.nonce, amount, recipient, target_chain);

        let mut instructions = vec![approve_authority_signer(
            &self.programs,
            &from,
            &owner.pubkey(),
            amount,
        )?];
        instructions.extend(self.fee_instructions(&owner.pubkey()).await?);
        instructions.push(transfer_native(
            &self.programs,
            &owner.pubkey(),
            &from,
            mint,
            &message.pubkey(),
            &args,
        )?);

        self.post(instructions, owner, &message).await
    }

    async fn fee_instructions(&self, payer: &Pubkey) -> Result<Vec<Instruction>> {
        let fee = self.message_fee().await?;
        debug!("Core bridge message fee: {} lamports", fee);
        if fee == 0 {
            Ok(Vec::new())
        } else {
            Ok(vec![message_fee_transfer(&self.programs, payer, fee)])
        }
    }

    async fn post(
        &self,
        instructions: Vec<Instruction>,
        payer: &Keypair,
        message: &Keypair,
    ) -> Result<PostedMessage> {
        let signature = self
            .sender
            .send(instructions, self.budget, payer, &[message])
            .await?;

        let logs = self.sender.transaction_logs(&signature).await?;
        let sequence = parse_sequence_from_logs(&logs).ok_or_else(|| {
            Error::MessageNotFound(format!("No sequence in logs of {}", signature))
        })?;

        let id = MessageId {
            chain: CHAIN_ID_SOLANA,
            emitter: UniversalAddress::from_pubkey(&self.programs.emitter()),
            sequence,
        };
        info!("Posted Wormhole message {} in {}", id, signature);

        Ok(PostedMessage { signature, id })
    }
}
