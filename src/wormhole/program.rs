//! Wormhole program ids, chain ids and PDAs on Solana
//!
//! The core bridge and token bridge are native (non-Anchor) programs; every
//! account they touch is a PDA derived from fixed seeds.

use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::config::Network;
use crate::error::{Error, Result};

/// Wormhole chain id of Solana
pub const CHAIN_ID_SOLANA: u16 = 1;

/// Wormhole chain id of Base mainnet
pub const CHAIN_ID_BASE: u16 = 30;

/// Wormhole chain id of Base Sepolia (testnet ids start at 10000)
pub const CHAIN_ID_BASE_SEPOLIA: u16 = 10004;

pub const MAINNET_CORE_PROGRAM_ID: &str = "worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth";
pub const MAINNET_TOKEN_BRIDGE_PROGRAM_ID: &str = "wormDTUJ6AWPNvk59vGQbDvGJmqbDTdgWgAqcLBCgUb";
pub const TESTNET_CORE_PROGRAM_ID: &str = "3u8hJUVTA4jH1wYAyUur7FFZVQ8H635K3tSHHF4ssjQ5";
pub const TESTNET_TOKEN_BRIDGE_PROGRAM_ID: &str = "DZnkkTmCiFWfYTfT41X3Rd1kDgozqzxWaHqsw6W4x2oe";

/// Core bridge state account (`Bridge` PDA)
#[derive(Debug, Clone, BorshDeserialize)]
pub struct BridgeData {
    pub guardian_set_index: u32,
    pub last_lamports: u64,
    pub config: BridgeConfig,
}

#[derive(Debug, Clone, BorshDeserialize)]
pub struct BridgeConfig {
    pub guardian_set_expiration_time: u32,
    /// Lamports that must reach the fee collector before posting a message
    pub fee: u64,
}

impl BridgeData {
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        Self::deserialize(&mut &data[..])
            .map_err(|e| Error::Deserialization(format!("Invalid core bridge account: {}", e)))
    }
}

/// The pair of Wormhole programs used on Solana
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WormholePrograms {
    pub core: Pubkey,
    pub token_bridge: Pubkey,
}

impl WormholePrograms {
    pub fn new(core: &str, token_bridge: &str) -> Result<Self> {
        let parse = |s: &str| {
            Pubkey::from_str(s)
                .map_err(|e| Error::Config(format!("Invalid program id {}: {}", s, e)))
        };
        Ok(Self {
            core: parse(core)?,
            token_bridge: parse(token_bridge)?,
        })
    }

    pub fn for_network(network: Network) -> Self {
        let (core, token_bridge) = match network {
            Network::Mainnet => (MAINNET_CORE_PROGRAM_ID, MAINNET_TOKEN_BRIDGE_PROGRAM_ID),
            Network::Testnet => (TESTNET_CORE_PROGRAM_ID, TESTNET_TOKEN_BRIDGE_PROGRAM_ID),
        };
        Self::new(core, token_bridge).expect("built-in program ids are valid")
    }

    fn token_bridge_pda(&self, seeds: &[&[u8]]) -> Pubkey {
        Pubkey::find_program_address(seeds, &self.token_bridge).0
    }

    fn core_pda(&self, seeds: &[&[u8]]) -> Pubkey {
        Pubkey::find_program_address(seeds, &self.core).0
    }

    pub fn config(&self) -> Pubkey {
        self.token_bridge_pda(&[b"config"])
    }

    /// Token bridge emitter; all token bridge VAAs from Solana carry it
    pub fn emitter(&self) -> Pubkey {
        self.token_bridge_pda(&[b"emitter"])
    }

    pub fn wrapped_meta(&self, mint: &Pubkey) -> Pubkey {
        self.token_bridge_pda(&[b"meta", mint.as_ref()])
    }

    /// Custody account holding locked native tokens
    pub fn custody(&self, mint: &Pubkey) -> Pubkey {
        self.token_bridge_pda(&[mint.as_ref()])
    }

    pub fn authority_signer(&self) -> Pubkey {
        self.token_bridge_pda(&[b"authority_signer"])
    }

    pub fn custody_signer(&self) -> Pubkey {
        self.token_bridge_pda(&[b"custody_signer"])
    }

    pub fn bridge(&self) -> Pubkey {
        self.core_pda(&[b"Bridge"])
    }

    pub fn fee_collector(&self) -> Pubkey {
        self.core_pda(&[b"fee_collector"])
    }

    pub fn sequence(&self, emitter: &Pubkey) -> Pubkey {
        self.core_pda(&[b"Sequence", emitter.as_ref()])
    }
}
