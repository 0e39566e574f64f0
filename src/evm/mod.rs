//! Base (EVM) side of the launch

pub mod client;
pub mod contracts;

pub use client::{BaseChain, BaseClient, MintedPosition};
