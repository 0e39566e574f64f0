//! Token bridge instructions on Solana
//!
//! Instruction data is a one-byte instruction index followed by the
//! borsh-encoded arguments. Account order follows the token bridge IDL.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_instruction, system_program, sysvar,
};

use super::address::UniversalAddress;
use super::program::WormholePrograms;
use crate::error::{Error, Result};

/// Token bridge instruction indices
pub mod index {
    pub const ATTEST_TOKEN: u8 = 1;
    pub const TRANSFER_NATIVE: u8 = 5;
}

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct AttestTokenData {
    pub nonce: u32,
}

#[derive(Debug, Clone, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct TransferNativeData {
    pub nonce: u32,
    pub amount: u64,
    pub fee: u64,
    pub target_address: [u8; 32],
    pub target_chain: u16,
}

impl TransferNativeData {
    pub fn new(nonce: u32, amount: u64, recipient: UniversalAddress, target_chain: u16) -> Self {
        Self {
            nonce,
            amount,
            fee: 0,
            target_address: recipient.0,
            target_chain,
        }
    }
}

fn encode<T: BorshSerialize>(index: u8, args: &T) -> Result<Vec<u8>> {
    let mut data = vec![index];
    args.serialize(&mut data)
        .map_err(|e| Error::TransactionBuild(format!("Failed to encode token bridge args: {}", e)))?;
    Ok(data)
}

/// `attestToken`: publish the mint's decimals, symbol and name
///
/// `message` is a fresh keypair that must sign the transaction.
pub fn attest_token(
    programs: &WormholePrograms,
    payer: &Pubkey,
    mint: &Pubkey,
    message: &Pubkey,
    nonce: u32,
) -> Result<Instruction> {
    let emitter = programs.emitter();
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(programs.config(), false),
        AccountMeta::new_readonly(*mint, false),
        AccountMeta::new_readonly(programs.wrapped_meta(mint), false),
        AccountMeta::new_readonly(crate::pump::program::metadata_pda(mint), false),
        AccountMeta::new(programs.bridge(), false),
        AccountMeta::new(*message, true),
        AccountMeta::new_readonly(emitter, false),
        AccountMeta::new(programs.sequence(&emitter), false),
        AccountMeta::new(programs.fee_collector(), false),
        AccountMeta::new_readonly(sysvar::clock::ID, false),
        AccountMeta::new_readonly(sysvar::rent::ID, false),
        AccountMeta::new_readonly(system_program::ID, false),
        AccountMeta::new_readonly(programs.core, false),
    ];

    Ok(Instruction {
        program_id: programs.token_bridge,
        accounts,
        data: encode(index::ATTEST_TOKEN, &AttestTokenData { nonce })?,
    })
}

/// `transferNative`: lock `from`'s tokens in custody and emit a transfer VAA
pub fn transfer_native(
    programs: &WormholePrograms,
    payer: &Pubkey,
    from: &Pubkey,
    mint: &Pubkey,
    message: &Pubkey,
    args: &TransferNativeData,
) -> Result<Instruction> {
    let emitter = programs.emitter();
    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(programs.config(), false),
        AccountMeta::new(*from, false),
        AccountMeta::new(*mint, false),
        AccountMeta::new(programs.custody(mint), false),
        AccountMeta::new_readonly(programs.authority_signer(), false),
        AccountMeta::new_readonly(programs.custody_signer(), false),
        AccountMeta::new(programs.bridge(), false),
        AccountMeta::new(*message, true),
        AccountMeta::new_readonly(emitter, false),
        AccountMeta::new(programs.sequence(&emitter), false),
        AccountMeta::new(programs.fee_collector(), false),
        AccountMeta::new_readonly(sysvar::clock::ID, false),
        AccountMeta::new_readonly(sysvar::rent::ID, false),
        AccountMeta::new_readonly(system_program::ID, false),
        AccountMeta::new_readonly(spl_token::ID, false),
        AccountMeta::new_readonly(programs.core, false),
    ];

    Ok(Instruction {
        program_id: programs.token_bridge,
        accounts,
        data: encode(index::TRANSFER_NATIVE, args)?,
    })
}

/// Delegate `amount` of `from` to the token bridge authority signer
pub fn approve_authority_signer(
    programs: &WormholePrograms,
    from: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    spl_token::instruction::approve(
        &spl_token::ID,
        from,
        &programs.authority_signer(),
        owner,
        &[],
        amount,
    )
    .map_err(|e| Error::TransactionBuild(format!("Failed to build approve: {}", e)))
}

/// Message fee paid to the core bridge fee collector
pub fn message_fee_transfer(programs: &WormholePrograms, payer: &Pubkey, fee: u64) -> Instruction {
    system_instruction::transfer(payer, &programs.fee_collector(), fee)
}

/// The core bridge logs `Sequence: N` when it posts a message
pub fn parse_sequence_from_logs(logs: &[String]) -> Option<u64> {
    logs.iter().find_map(|line| {
        let (_, rest) = line.split_once("Sequence: ")?;
        rest.trim().parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    fn programs() -> WormholePrograms {
        WormholePrograms::for_network(Network::Mainnet)
    }

    #[test]
    fn test_attest_token_layout() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let message = Pubkey::new_unique();
        let ix = attest_token(&programs(), &payer, &mint, &message, 1).unwrap();

        assert_eq!(ix.program_id, programs().token_bridge);
        assert_eq!(ix.data, vec![1, 1, 0, 0, 0]);
        assert_eq!(ix.accounts.len(), 14);
        assert_eq!(ix.accounts[2].pubkey, mint);
        assert_eq!(ix.accounts[3].pubkey, programs().wrapped_meta(&mint));
        assert_eq!(ix.accounts[6].pubkey, message);
        assert!(ix.accounts[6].is_signer);
        assert_eq!(ix.accounts[13].pubkey, programs().core);
    }

    #[test]
    fn test_transfer_native_layout() {
        let programs = programs();
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let from = Pubkey::new_unique();
        let message = Pubkey::new_unique();
        let recipient = UniversalAddress([7u8; 32]);
        let args = TransferNativeData::new(1, 5_000_000, recipient, 30);

        let ix = transfer_native(&programs, &payer, &from, &mint, &message, &args).unwrap();
        assert_eq!(ix.accounts.len(), 17);
        assert_eq!(ix.accounts[4].pubkey, programs.custody(&mint));
        assert_eq!(ix.accounts[15].pubkey, spl_token::ID);

        assert_eq!(ix.data[0], index::TRANSFER_NATIVE);
        // nonce(4) + amount(8) + fee(8) + target(32) + chain(2)
        assert_eq!(ix.data.len(), 1 + 54);
        let decoded = TransferNativeData::try_from_slice(&ix.data[1..]).unwrap();
        assert_eq!(decoded, args);
    }

    #[test]
    fn test_approve_targets_authority_signer() {
        let programs = programs();
        let ix = approve_authority_signer(&programs, &Pubkey::new_unique(), &Pubkey::new_unique(), 10)
            .unwrap();
        assert_eq!(ix.program_id, spl_token::ID);
        assert_eq!(ix.accounts[1].pubkey, programs.authority_signer());
    }

    #[test]
    fn test_parse_sequence_from_logs() {
        let logs = vec![
            "Program worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth invoke [2]".to_string(),
            "Program log: Sequence: 812345".to_string(),
            "Program worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth success".to_string(),
        ];
        assert_eq!(parse_sequence_from_logs(&logs), Some(812_345));
        assert_eq!(parse_sequence_from_logs(&logs[..1]), None);
        assert_eq!(
            parse_sequence_from_logs(&["Program log: Sequence: abc".to_string()]),
            None
        );
    }
}
