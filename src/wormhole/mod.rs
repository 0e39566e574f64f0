//! Wormhole token bridge: Solana side, VAA decoding and retrieval

pub mod address;
pub mod api;
pub mod bridge;
pub mod instruction;
pub mod payload;
pub mod program;
pub mod vaa;

pub use address::UniversalAddress;
pub use api::{wait_for_vaa, VaaSource, WormholescanClient};
pub use bridge::{PostedMessage, SolanaTokenBridge};
pub use payload::TokenBridgePayload;
pub use program::{WormholePrograms, CHAIN_ID_SOLANA};
pub use vaa::{MessageId, Vaa};
