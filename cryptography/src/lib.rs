//! Commit, share, prove, and encrypt the values exchanged during committee resharing.
//!
//! # Overview
//!
//! - [bls12381]: G1 group arithmetic, polynomials, Pedersen and vector commitments,
//!   verifiable secret sharing, and batched discrete log proofs.
//! - [encryption]: sealed-box encryption to X25519 recipients and one-time symmetric encryption.
//! - [transcript]: Fiat-Shamir transcripts and deterministic noise.
//!
//! # Status
//!
//! `yoso-cryptography` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod bls12381;
pub mod encryption;
pub mod transcript;
