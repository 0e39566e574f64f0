//! Pump.fun multichain launcher library
//!
//! Creates a token on pump.fun, bridges it to Base through the Wormhole
//! token bridge and seeds a Uniswap v3 position ladder for it.

pub mod cli;
pub mod clmm;
pub mod config;
pub mod error;
pub mod evm;
pub mod pipeline;
pub mod pump;
pub mod solana;
pub mod wallet;
pub mod wormhole;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Launch, LaunchReport};
