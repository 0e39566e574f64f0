//! Token bridge payloads carried inside VAAs

use alloy::primitives::U256;

use super::address::UniversalAddress;
use super::vaa::Reader;
use crate::error::{Error, Result};

pub const PAYLOAD_TRANSFER: u8 = 1;
pub const PAYLOAD_ASSET_META: u8 = 2;

/// Token bridge amounts are normalized to at most 8 decimals
pub const MAX_BRIDGE_DECIMALS: u8 = 8;

/// Payload 1: a token transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub amount: U256,
    pub token_address: UniversalAddress,
    pub token_chain: u16,
    pub to: UniversalAddress,
    pub to_chain: u16,
    pub fee: U256,
}

/// Payload 2: attestation of a token's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMeta {
    pub token_address: UniversalAddress,
    pub token_chain: u16,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBridgePayload {
    Transfer(Transfer),
    AssetMeta(AssetMeta),
}

impl TokenBridgePayload {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(payload);
        match reader.u8()? {
            PAYLOAD_TRANSFER => Ok(Self::Transfer(Transfer {
                amount: U256::from_be_bytes(reader.array32()?),
                token_address: UniversalAddress(reader.array32()?),
                token_chain: reader.u16()?,
                to: UniversalAddress(reader.array32()?),
                to_chain: reader.u16()?,
                fee: U256::from_be_bytes(reader.array32()?),
            })),
            PAYLOAD_ASSET_META => Ok(Self::AssetMeta(AssetMeta {
                token_address: UniversalAddress(reader.array32()?),
                token_chain: reader.u16()?,
                decimals: reader.u8()?,
                symbol: fixed_string(&reader.array32()?),
                name: fixed_string(&reader.array32()?),
            })),
            other => Err(Error::VaaDecode(format!(
                "Unsupported token bridge payload id {}",
                other
            ))),
        }
    }
}

/// 32-byte right-padded UTF-8 field
fn fixed_string(bytes: &[u8; 32]) -> String {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Amount as it will appear in the transfer VAA
pub fn normalize_amount(amount: u64, decimals: u8) -> u64 {
    if decimals > MAX_BRIDGE_DECIMALS {
        amount / 10u64.pow((decimals - MAX_BRIDGE_DECIMALS) as u32)
    } else {
        amount
    }
}

/// Decimals of the wrapped token minted on the foreign chain
pub fn wrapped_decimals(native_decimals: u8) -> u8 {
    native_decimals.min(MAX_BRIDGE_DECIMALS)
}
