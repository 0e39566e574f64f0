//! Pump.fun account structures
//!
//! # WARNING: These structures may change without notice
//! Pump.fun has appended fields to both accounts in the past, so decoding
//! reads the known prefix and ignores trailing bytes.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::program::ACCOUNT_DISCRIMINATORS;
use crate::error::{Error, Result};

/// BondingCurve account - stores the bonding curve state for a token
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct BondingCurve {
    _discriminator: [u8; 8],

    /// Virtual SOL reserves for price calculation
    pub virtual_sol_reserves: u64,

    /// Virtual token reserves for price calculation
    pub virtual_token_reserves: u64,

    /// Real SOL reserves (actual SOL held in bonding curve)
    pub real_sol_reserves: u64,

    /// Real token reserves (actual tokens held in bonding curve)
    pub real_token_reserves: u64,

    /// Total supply of the token
    pub token_total_supply: u64,

    /// Whether the bonding curve is complete (migrated)
    pub complete: bool,
}

impl BondingCurve {
    #[cfg(test)]
    pub fn new_for_test(
        virtual_sol_reserves: u64,
        virtual_token_reserves: u64,
        real_sol_reserves: u64,
        real_token_reserves: u64,
        token_total_supply: u64,
        complete: bool,
    ) -> Self {
        Self {
            _discriminator: ACCOUNT_DISCRIMINATORS::BONDING_CURVE,
            virtual_sol_reserves,
            virtual_token_reserves,
            real_sol_reserves,
            real_token_reserves,
            token_total_supply,
            complete,
        }
    }

    /// Deserialize from account data
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        check_discriminator(data, ACCOUNT_DISCRIMINATORS::BONDING_CURVE, "BondingCurve")?;
        Self::deserialize(&mut &data[..])
            .map_err(|e| Error::PumpDecode(format!("Borsh decode failed: {}", e)))
    }

    /// Current token price in lamports per token unit
    pub fn get_price(&self) -> Result<f64> {
        if self.virtual_token_reserves == 0 {
            return Err(Error::PriceOverflow);
        }

        Ok(self.virtual_sol_reserves as f64 / self.virtual_token_reserves as f64)
    }

    /// Calculate how many tokens you get for a given SOL amount
    /// Uses constant product formula: x * y = k
    pub fn calculate_buy_tokens(&self, sol_amount: u64) -> Result<u64> {
        let tokens = constant_product_out(
            self.virtual_sol_reserves,
            self.virtual_token_reserves,
            sol_amount,
        )?;
        Ok(tokens.min(self.real_token_reserves))
    }

    /// Calculate how much SOL you get for selling tokens
    pub fn calculate_sell_sol(&self, token_amount: u64) -> Result<u64> {
        constant_product_out(
            self.virtual_token_reserves,
            self.virtual_sol_reserves,
            token_amount,
        )
    }
}

/// Global configuration account
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct Global {
    _discriminator: [u8; 8],
    pub initialized: bool,
    pub authority: Pubkey,
    pub fee_recipient: Pubkey,
    pub initial_virtual_token_reserves: u64,
    pub initial_virtual_sol_reserves: u64,
    pub initial_real_token_reserves: u64,
    pub token_total_supply: u64,
    pub fee_basis_points: u64,
}

impl Global {
    #[cfg(test)]
    pub fn new_for_test(fee_recipient: Pubkey) -> Self {
        Self {
            _discriminator: ACCOUNT_DISCRIMINATORS::GLOBAL,
            initialized: true,
            authority: Pubkey::new_unique(),
            fee_recipient,
            initial_virtual_token_reserves: 1_073_000_000_000_000,
            initial_virtual_sol_reserves: 30_000_000_000,
            initial_real_token_reserves: 793_100_000_000_000,
            token_total_supply: 1_000_000_000_000_000,
            fee_basis_points: 100,
        }
    }

    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        check_discriminator(data, ACCOUNT_DISCRIMINATORS::GLOBAL, "Global")?;
        Self::deserialize(&mut &data[..])
            .map_err(|e| Error::PumpDecode(format!("Borsh decode failed: {}", e)))
    }

    /// Tokens received by the very first buy on a fresh curve
    pub fn initial_buy_tokens(&self, sol_amount: u64) -> Result<u64> {
        if sol_amount == 0 {
            return Ok(0);
        }
        let tokens = constant_product_out(
            self.initial_virtual_sol_reserves,
            self.initial_virtual_token_reserves,
            sol_amount,
        )?;
        Ok(tokens.min(self.initial_real_token_reserves))
    }
}

fn check_discriminator(data: &[u8], expected: [u8; 8], name: &str) -> Result<()> {
    if data.len() < 8 {
        return Err(Error::PumpDecode(format!("{} account data too short", name)));
    }

    if data[..8] != expected {
        return Err(Error::PumpDecode(format!(
            "Wrong discriminator for {}: expected {:?}, got {:?}",
            name,
            expected,
            &data[..8]
        )));
    }

    Ok(())
}

/// Output of a constant-product swap: reserve_out - k / (reserve_in + amount_in)
fn constant_product_out(reserve_in: u64, reserve_out: u64, amount_in: u64) -> Result<u64> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(Error::PriceOverflow);
    }

    let new_reserve_in = (reserve_in as u128)
        .checked_add(amount_in as u128)
        .ok_or(Error::PriceOverflow)?;

    let k = (reserve_in as u128)
        .checked_mul(reserve_out as u128)
        .ok_or(Error::PriceOverflow)?;

    // Round the remaining reserve up so the quote never exceeds what the program pays
    let new_reserve_out = k.div_ceil(new_reserve_in);

    let out = (reserve_out as u128)
        .checked_sub(new_reserve_out)
        .ok_or(Error::PriceOverflow)?;

    u64::try_from(out).map_err(|_| Error::PriceOverflow)
}
