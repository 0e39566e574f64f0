//! Pump.fun instruction encoding

use borsh::BorshSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};

use super::program::{self, DISCRIMINATORS, MPL_TOKEN_METADATA_ID, PUMP_PROGRAM_ID};
use crate::error::{Error, Result};

/// Create token instruction data
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
pub struct CreateInstruction {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl CreateInstruction {
    /// Discriminator followed by the borsh-encoded arguments
    pub fn data(&self) -> Result<Vec<u8>> {
        let mut data = DISCRIMINATORS::CREATE.to_vec();
        self.serialize(&mut data)
            .map_err(|e| Error::TransactionBuild(format!("Failed to encode create: {}", e)))?;
        Ok(data)
    }

    /// Build the create instruction for a fresh mint
    ///
    /// Account order matters and must match the program's `create` accounts.
    pub fn instruction(&self, mint: &Pubkey, user: &Pubkey) -> Result<Instruction> {
        let bonding_curve = program::bonding_curve_pda(mint);
        let accounts = vec![
            AccountMeta::new(*mint, true),                                           // mint
            AccountMeta::new_readonly(program::mint_authority_pda(), false),         // mint_authority
            AccountMeta::new(bonding_curve, false),                                  // bonding_curve
            AccountMeta::new(program::associated_bonding_curve(mint), false),        // associated_bonding_curve
            AccountMeta::new_readonly(program::global_pda(), false),                 // global
            AccountMeta::new_readonly(*MPL_TOKEN_METADATA_ID, false),                // mpl_token_metadata
            AccountMeta::new(program::metadata_pda(mint), false),                    // metadata
            AccountMeta::new(*user, true),                                           // user
            AccountMeta::new_readonly(system_program::ID, false),                    // system_program
            AccountMeta::new_readonly(spl_token::ID, false),                         // token_program
            AccountMeta::new_readonly(spl_associated_token_account::ID, false),      // associated_token_program
            AccountMeta::new_readonly(sysvar::rent::ID, false),                      // rent
            AccountMeta::new_readonly(program::event_authority_pda(), false),        // event_authority
            AccountMeta::new_readonly(*PUMP_PROGRAM_ID, false),                      // program
        ];

        Ok(Instruction {
            program_id: *PUMP_PROGRAM_ID,
            accounts,
            data: self.data()?,
        })
    }
}

/// Buy tokens instruction data
#[derive(Debug, Clone, PartialEq)]
pub struct BuyInstruction {
    /// Amount of tokens to buy (in token smallest units)
    pub amount: u64,
    /// Maximum SOL to spend (slippage protection)
    pub max_sol_cost: u64,
}

impl BuyInstruction {
    pub fn data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(&DISCRIMINATORS::BUY);
        data.extend_from_slice(&self.amount.to_le_bytes());
        data.extend_from_slice(&self.max_sol_cost.to_le_bytes());
        data
    }

    /// Build the buy instruction against a mint's bonding curve
    pub fn instruction(&self, mint: &Pubkey, user: &Pubkey, fee_recipient: &Pubkey) -> Instruction {
        let user_token_account =
            spl_associated_token_account::get_associated_token_address(user, mint);

        let accounts = vec![
            AccountMeta::new_readonly(program::global_pda(), false),          // global
            AccountMeta::new(*fee_recipient, false),                          // fee_recipient
            AccountMeta::new_readonly(*mint, false),                          // mint
            AccountMeta::new(program::bonding_curve_pda(mint), false),        // bonding_curve
            AccountMeta::new(program::associated_bonding_curve(mint), false), // associated_bonding_curve
            AccountMeta::new(user_token_account, false),                      // associated_user
            AccountMeta::new(*user, true),                                    // user
            AccountMeta::new_readonly(system_program::ID, false),             // system_program
            AccountMeta::new_readonly(spl_token::ID, false),                  // token_program
            AccountMeta::new_readonly(sysvar::rent::ID, false),               // rent
            AccountMeta::new_readonly(program::event_authority_pda(), false), // event_authority
            AccountMeta::new_readonly(*PUMP_PROGRAM_ID, false),               // program
        ];

        Instruction {
            program_id: *PUMP_PROGRAM_ID,
            accounts,
            data: self.data(),
        }
    }
}
