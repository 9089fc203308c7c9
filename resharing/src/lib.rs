//! Refresh a committed secret sharing across a sequence of speak-once committees.
//!
//! # Overview
//!
//! A secret `s` is shared (with blinding `r`) among a holding committee of `N` members such
//! that any `D + 1` shares recover it. Public commitments `C[0..=N]` commit to the secret
//! (`C[0]`) and to each member's share (`C[i + 1]`). Each round, the holding committee re-deals
//! its shares to a fresh next committee with the help of five other committees (verification,
//! resolution, witness, auditing) without ever reconstructing `s`. Every member of every
//! committee speaks at most once: it receives the broadcast of the previous phase, computes its
//! message, and broadcasts it. The output of a round is a set of fresh commitments (with
//! `C'[0] == C[0]`) and, for every member of the next committee, a share that opens its
//! commitment.
//!
//! # Protocol
//!
//! ## [dealer] Phase 0: Dealing
//!
//! Each dealer shares its own `(sigma, rho)` twice: the first level splits it into `N` shares
//! (one per next holder) and the second level splits each of those into `N` shares (one per
//! verifier). The resulting `(N + 1) x 2N` matrix is committed row-by-row with a vector
//! commitment (`ComC`), the first level is committed twice (`ComZ` under `(G, H)` and
//! `ComZPrime` under the vector commitment bases) and bound with a double discrete log
//! equality proof, and every second-level share gets its own Pedersen commitment (`ComS`).
//! Each verifier's row is sealed to that verifier and, for later disclosure, encrypted under a
//! one-time key whose seed is itself shared among the resolution committee ([eps]).
//!
//! Every party checks each dealing on receipt: malformed dealings, failed proofs,
//! `sum(ComZPrime) != ComC[0]`, or a `ComC` that is not a codeword disqualify the dealer.
//!
//! ## [verifier] Phase 1: Verification
//!
//! Each verifier opens its row from every dealer and checks it against `ComC` and `ComS`. It
//! complains about every dealer whose row is missing or invalid, forwards the values it accepts
//! to each next holder (sealed), and proves with a [proof::VerifierProof] that the forwarded
//! values are consistent with the dealers' `ComC`.
//!
//! ## [resolver] Phase 2: Resolution
//!
//! For every complaint raised by a well-formed verifier, each resolver reveals its share of the
//! one-time key protecting the disputed row. Anybody can then recover the key from shares that
//! match the hashes the dealer published, decrypt the row, and check it. A dealer whose row
//! cannot be recovered (or does not check) is disqualified.
//!
//! ## [witness] Phase 3: Witness
//!
//! Each witness checks a random (seeded) combination of every dealer's committed sharings and
//! publishes the seed only if the check fails.
//!
//! ## [auditor] Phase 4: Auditing
//!
//! Each auditor samples published seeds without replacement and re-checks them, disqualifying a
//! dealer on the first seed that reproduces a failure and discarding witnesses whose seeds do not.
//!
//! ## [refresh] Refresh
//!
//! The first `D + 1` dealers that are neither disqualified nor rejected by a majority of
//! auditors are combined with Lagrange weights into the next commitments and, for each next
//! holder, its next share.
//!
//! # Status
//!
//! `yoso-resharing` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

pub mod auditor;
pub mod committee;
pub mod config;
pub mod context;
pub mod dealer;
pub mod eps;
pub mod party;
pub mod proof;
pub mod refresh;
pub mod resolver;
pub mod types;
pub mod verifier;
pub mod witness;

#[cfg(test)]
mod mocks;

use thiserror::Error;
use yoso_cryptography::{
    bls12381::{nizk, primitives, vss},
    encryption,
};

/// Errors that can occur during a resharing round.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid committees: {0}")]
    InvalidCommittees(&'static str),
    #[error("invalid commitments: expected {0}, got {1}")]
    InvalidCommitments(usize, usize),
    #[error("dealer has no share")]
    MissingShare,
    #[error("share does not open the dealer commitment")]
    InvalidShare,
    #[error("no qualified dealers")]
    NoQualifiedDealers,
    #[error("not enough qualified dealers: need {0}, got {1}")]
    NotEnoughQualifiedDealers(usize, usize),
    #[error("qualified dealer {0} has no valid dealing")]
    UnknownDealer(u32),
    #[error("unable to reconstruct the share from dealer {0}: {1}")]
    Reconstruction(u32, vss::Error),
    #[error("vss: {0}")]
    Vss(#[from] vss::Error),
    #[error("nizk: {0}")]
    Nizk(#[from] nizk::Error),
    #[error("encryption: {0}")]
    Encryption(#[from] encryption::Error),
    #[error("polynomial: {0}")]
    Poly(#[from] primitives::Error),
    #[error("broadcast: {0}")]
    Broadcast(#[from] yoso_broadcast::Error),
    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("seed expansion failed")]
    SeedExpansion,
}
