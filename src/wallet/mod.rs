//! Key material for the Solana creator/mint and the Base signer

pub mod keystore;

pub use keystore::{evm_signer_from_env, get_or_create_keypair, load_creator, load_mint};
