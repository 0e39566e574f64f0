//! Wormhole universal (32-byte) addresses

use alloy::primitives::Address;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Chain-agnostic 32-byte address used inside Wormhole payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UniversalAddress(pub [u8; 32]);

impl UniversalAddress {
    pub fn from_pubkey(pubkey: &Pubkey) -> Self {
        Self(pubkey.to_bytes())
    }

    /// EVM addresses are left padded with 12 zero bytes
    pub fn from_evm(address: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_slice());
        Self(bytes)
    }

    pub fn to_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.0)
    }

    /// Back to an EVM address; fails if the high 12 bytes are not zero
    pub fn to_evm(&self) -> Result<Address> {
        if self.0[..12].iter().any(|b| *b != 0) {
            return Err(Error::Internal(format!(
                "{} is not a left-padded EVM address",
                self
            )));
        }
        Ok(Address::from_slice(&self.0[12..]))
    }

    /// Lowercase hex without prefix, the form Wormholescan expects
    pub fn to_hex(&self) -> String {
        alloy::hex::encode(self.0)
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for UniversalAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = alloy::hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| Error::Deserialization(format!("Invalid hex address {}: {}", s, e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Deserialization(format!("Address {} is not 32 bytes", s)))?;
        Ok(Self(bytes))
    }
}
