//! Commitments, verifiable secret sharing, and proofs over the BLS12-381 G1 subgroup.
//!
//! # Features
//!
//! This crate has the following features:
//!
//! - `portable`: Enables `portable` feature on `blst` (<https://github.com/supranational/blst?tab=readme-ov-file#platform-and-language-compatibility>).

pub mod nizk;
pub mod pedersen;
pub mod primitives;
pub mod vss;
