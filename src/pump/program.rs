//! Pump.fun program constants, discriminators and PDAs
//!
//! # WARNING: These constants may change without notice
//! Pump.fun has historically modified their program behavior.
//! If transactions start failing, these values may need to be updated.
//!
//! # How discriminators are calculated
//! Anchor uses the first 8 bytes of SHA-256("global:<instruction_name>")
//! as the instruction discriminator.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Pump.fun program ID
pub const PUMP_PROGRAM_ID_STR: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Metaplex token metadata program ID
pub const MPL_TOKEN_METADATA_ID_STR: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

lazy_static::lazy_static! {
    /// Pump.fun program ID as Pubkey
    pub static ref PUMP_PROGRAM_ID: Pubkey =
        Pubkey::from_str(PUMP_PROGRAM_ID_STR).expect("Invalid pump program ID");

    /// Metaplex token metadata program ID as Pubkey
    pub static ref MPL_TOKEN_METADATA_ID: Pubkey =
        Pubkey::from_str(MPL_TOKEN_METADATA_ID_STR).expect("Invalid metadata program ID");
}

/// PDA seeds used by the pump.fun program
pub mod seeds {
    pub const GLOBAL: &[u8] = b"global";
    pub const MINT_AUTHORITY: &[u8] = b"mint-authority";
    pub const BONDING_CURVE: &[u8] = b"bonding-curve";
    pub const EVENT_AUTHORITY: &[u8] = b"__event_authority";
    pub const METADATA: &[u8] = b"metadata";
}

/// Instruction discriminators (first 8 bytes of instruction data)
#[allow(non_snake_case)]
pub mod DISCRIMINATORS {
    /// SHA-256("global:create")[0..8]
    pub const CREATE: [u8; 8] = [24, 30, 200, 40, 5, 28, 7, 119];

    /// SHA-256("global:buy")[0..8]
    pub const BUY: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];

}

/// Account discriminators (first 8 bytes of account data)
#[allow(non_snake_case)]
pub mod ACCOUNT_DISCRIMINATORS {
    /// BondingCurve account discriminator
    pub const BONDING_CURVE: [u8; 8] = [23, 183, 248, 55, 96, 216, 172, 96];

    /// Global config account discriminator
    pub const GLOBAL: [u8; 8] = [167, 232, 232, 177, 200, 108, 114, 127];
}

/// Calculate instruction discriminator from name
/// This follows Anchor's convention: SHA-256("global:<name>")[0..8]
pub fn calculate_discriminator(name: &str) -> [u8; 8] {
    use sha2::{Digest, Sha256};

    let preimage = format!("global:{}", name);
    let hash = Sha256::digest(preimage.as_bytes());

    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash[..8]);
    discriminator
}

/// Global config PDA
pub fn global_pda() -> Pubkey {
    Pubkey::find_program_address(&[seeds::GLOBAL], &PUMP_PROGRAM_ID).0
}

/// Mint authority PDA shared by every pump.fun token
pub fn mint_authority_pda() -> Pubkey {
    Pubkey::find_program_address(&[seeds::MINT_AUTHORITY], &PUMP_PROGRAM_ID).0
}

/// Bonding curve PDA for a mint
pub fn bonding_curve_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[seeds::BONDING_CURVE, mint.as_ref()], &PUMP_PROGRAM_ID).0
}

/// Anchor event authority PDA
pub fn event_authority_pda() -> Pubkey {
    Pubkey::find_program_address(&[seeds::EVENT_AUTHORITY], &PUMP_PROGRAM_ID).0
}

/// Metaplex metadata account for a mint
pub fn metadata_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            seeds::METADATA,
            MPL_TOKEN_METADATA_ID.as_ref(),
            mint.as_ref(),
        ],
        &MPL_TOKEN_METADATA_ID,
    )
    .0
}

/// Token account of the bonding curve holding the unsold supply
pub fn associated_bonding_curve(mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(&bonding_curve_pda(mint), mint)
}

/// Public pump.fun page for a mint
pub fn pump_fun_url(mint: &Pubkey) -> String {
    format!("https://pump.fun/{}", mint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_calculation() {
        assert_eq!(calculate_discriminator("create"), DISCRIMINATORS::CREATE);
        assert_eq!(calculate_discriminator("buy"), DISCRIMINATORS::BUY);
    }

    #[test]
    fn test_program_ids() {
        assert_eq!(
            PUMP_PROGRAM_ID.to_string(),
            "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P"
        );
        assert_eq!(
            MPL_TOKEN_METADATA_ID.to_string(),
            "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s"
        );
    }

    #[test]
    fn test_well_known_pdas() {
        // Addresses observed on mainnet for the singleton accounts
        assert_eq!(
            global_pda().to_string(),
            "4wTV1YmiEkRvAtNtsSGPtUrqRYQMe5SKy2uB4Jjaxnjf"
        );
        assert_eq!(
            event_authority_pda().to_string(),
            "Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1"
        );
        assert_eq!(
            mint_authority_pda().to_string(),
            "TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM"
        );
    }

    #[test]
    fn test_per_mint_pdas_are_distinct() {
        let mint = Pubkey::new_unique();
        let curve = bonding_curve_pda(&mint);
        assert_eq!(curve, bonding_curve_pda(&mint));
        assert_ne!(curve, bonding_curve_pda(&Pubkey::new_unique()));
        assert_ne!(associated_bonding_curve(&mint), curve);
        assert_ne!(metadata_pda(&mint), curve);
    }
}
