//! Core types for Stablefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod status;
pub mod token;
pub mod wallet;

pub use id::*;
pub use status::OrderStatus;
pub use token::{
    TokenAmountError, USDC_CONTRACT_ADDRESS, USDC_DECIMALS, from_base_units, to_base_units,
};
pub use wallet::{TxHash, TxHashError, WalletAddress, WalletAddressError};
