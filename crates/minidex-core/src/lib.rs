//! Minidex Core - Core types, cryptography, pricing and serialization
//!
//! This crate provides the foundational types shared by the minidex ledger,
//! the AMM engine and the operator tooling.

pub mod crypto;
pub mod error;
pub mod math;
pub mod serialize;
pub mod types;

pub use crypto::{
    hash_blake3, hash_parts, sign, verify, Address, Hash, KeyPair, PublicKey, SecretKey, Sig,
};
pub use error::CoreError;
pub use math::{constant_product, get_amount_out, U256};
pub use types::*;
