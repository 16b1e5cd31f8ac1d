//! Instructions for the purchase program
//!
//! This module contains the definitions for instructions that can be sent to the purchase program.
//!
//! # Instructions
//!
//! - `PurchaseWithSol`: Pays SOL in, swaps 80% of it on Raydium and distributes reward tokens
//!   worth 20% of the fiat value to the recipient.

mod purchase_with_sol;

pub use purchase_with_sol::*;
