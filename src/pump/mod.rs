//! Pump.fun program client: PDAs, account decoding, instruction encoding
//! and the create-and-buy flow used to launch the token.
//!
//! The program is upgraded by its operators without notice, so account
//! layouts and discriminators here can go stale.

pub mod accounts;
pub mod client;
pub mod instruction;
pub mod metadata;
pub mod price;
pub mod program;

pub use accounts::{BondingCurve, Global};
pub use client::{CreateResult, PumpClient};
pub use instruction::{BuyInstruction, CreateInstruction};
pub use program::{pump_fun_url, PUMP_PROGRAM_ID};
