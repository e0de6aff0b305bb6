//! Stablefront Core - Shared types library.
//!
//! This crate provides common types used across all Stablefront components:
//! - `api` - Settlement service exposed to the storefront client
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, wallet addresses,
//!   transaction hashes, order statuses, and USDC amount conversion

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
