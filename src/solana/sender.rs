//! Transaction assembly and submission

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    instruction::Instruction,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use solana_transaction_status::{option_serializer::OptionSerializer, UiTransactionEncoding};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::simulation::simulate_transaction;
use crate::error::{Error, Result};

/// Compute budget prepended to a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeBudget {
    pub unit_limit: Option<u32>,
    /// Priority fee in micro-lamports per compute unit
    pub unit_price: Option<u64>,
}

impl ComputeBudget {
    pub fn new(unit_limit: u32, unit_price: u64) -> Self {
        Self {
            unit_limit: Some(unit_limit),
            unit_price: Some(unit_price),
        }
    }

    pub fn price_only(unit_price: u64) -> Self {
        Self {
            unit_limit: None,
            unit_price: Some(unit_price),
        }
    }

    /// Compute budget instructions followed by `instructions`
    pub fn apply(&self, instructions: Vec<Instruction>) -> Vec<Instruction> {
        let mut out = Vec::with_capacity(instructions.len() + 2);
        if let Some(limit) = self.unit_limit {
            out.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
        }
        if let Some(price) = self.unit_price {
            out.push(ComputeBudgetInstruction::set_compute_unit_price(price));
        }
        out.extend(instructions);
        out
    }
}

/// Signs, optionally simulates, sends and confirms transactions
#[derive(Clone)]
pub struct TransactionSender {
    rpc_client: Arc<RpcClient>,
    simulate_before_send: bool,
}

impl TransactionSender {
    pub fn new(rpc_client: Arc<RpcClient>, simulate_before_send: bool) -> Self {
        Self {
            rpc_client,
            simulate_before_send,
        }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc_client
    }

    /// Build, sign and submit a transaction, waiting for confirmation
    ///
    /// `payer` pays fees and always signs; `extra_signers` are appended
    /// (fresh mint or message accounts).
    pub async fn send(
        &self,
        instructions: Vec<Instruction>,
        budget: ComputeBudget,
        payer: &Keypair,
        extra_signers: &[&Keypair],
    ) -> Result<Signature> {
        let instructions = budget.apply(instructions);

        let blockhash = self
            .rpc_client
            .get_latest_blockhash()
            .await
            .map_err(|e| Error::TransactionBuild(format!("Failed to get blockhash: {}", e)))?;

        let mut signers: Vec<&Keypair> = Vec::with_capacity(extra_signers.len() + 1);
        signers.push(payer);
        signers.extend_from_slice(extra_signers);

        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&payer.pubkey()),
            signers.as_slice(),
            blockhash,
        );

        if self.simulate_before_send {
            let simulated = simulate_transaction(&self.rpc_client, &transaction)
                .await?
                .into_result()?;
            if let (Some(units), Some(limit)) = (simulated.compute_units, budget.unit_limit) {
                if units > u64::from(limit) {
                    warn!(
                        "Simulation used {} compute units, above the {} unit limit",
                        units, limit
                    );
                }
            }
        }

        debug!(
            "Sending transaction with {} instructions, {} signers",
            instructions.len(),
            signers.len()
        );

        let signature = self
            .rpc_client
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| Error::TransactionSend(e.to_string()))?;

        info!("Transaction confirmed: {}", signature);
        Ok(signature)
    }

    /// Log messages of a confirmed transaction
    pub async fn transaction_logs(&self, signature: &Signature) -> Result<Vec<String>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };

        let tx = self
            .rpc_client
            .get_transaction_with_config(signature, config)
            .await?;

        let logs = match tx.transaction.meta.map(|meta| meta.log_messages) {
            Some(OptionSerializer::Some(logs)) => logs,
            _ => Vec::new(),
        };

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{compute_budget, pubkey::Pubkey, system_instruction};

    #[test]
    fn test_compute_budget_prepends_instructions() {
        let transfer =
            system_instruction::transfer(&Pubkey::new_unique(), &Pubkey::new_unique(), 1);

        let with_both = ComputeBudget::new(250_000, 250_000).apply(vec![transfer.clone()]);
        assert_eq!(with_both.len(), 3);
        assert_eq!(with_both[0].program_id, compute_budget::ID);
        assert_eq!(with_both[1].program_id, compute_budget::ID);
        assert_eq!(with_both[2], transfer);

        let price_only = ComputeBudget::price_only(333_333).apply(vec![transfer.clone()]);
        assert_eq!(price_only.len(), 2);
        assert_eq!(
            price_only[0],
            ComputeBudgetInstruction::set_compute_unit_price(333_333)
        );

        let none = ComputeBudget::default().apply(vec![transfer.clone()]);
        assert_eq!(none, vec![transfer]);
    }
}
