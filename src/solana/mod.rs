//! Solana plumbing - transaction submission and token reads

pub mod sender;
pub mod simulation;
pub mod token;

pub use sender::{ComputeBudget, TransactionSender};
