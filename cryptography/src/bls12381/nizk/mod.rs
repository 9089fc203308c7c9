//! Fiat-Shamir proofs of knowledge of discrete logarithms.
//!
//! Both proofs are verified in a single multi-scalar multiplication by folding every
//! per-index equation with random batching scalars drawn from the verifier's RNG.
//!
//! - [dl]: knowledge of `x_i` such that `X_i = x_i * G_i` for every `i`.
//! - [dleq]: knowledge of `(x_i, y_i)` such that `Z_i = x_i * G + y_i * H` and
//!   `Z'_i = x_i * G_i + y_i * H_i` for every `i`.

pub mod dl;
pub mod dleq;

use crate::{
    bls12381::primitives::group::{Element, Scalar},
    transcript::Transcript,
};
use bytes::Buf;
use rand::RngCore;
use thiserror::Error;
use yoso_codec::{Error as CodecError, ReadExt};

/// Errors that can occur when proving or verifying.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("length mismatch: expected {0}, got {1}")]
    LengthMismatch(usize, usize),
    #[error("empty statement")]
    EmptyStatement,
    #[error("invalid proof")]
    InvalidProof,
}

/// Draws a non-zero scalar from the transcript noise under `label`.
fn challenge(transcript: &Transcript, label: &'static [u8]) -> Scalar {
    let mut rng = transcript.noise(label);
    loop {
        let scalar = Scalar::rand(&mut rng);
        if scalar != Scalar::zero() {
            return scalar;
        }
    }
}

/// Draws `n` batching scalars from the verifier's RNG.
fn batching_scalars<R: RngCore>(rng: &mut R, n: usize) -> Vec<Scalar> {
    (0..n).map(|_| Scalar::rand(rng)).collect()
}

/// Returns an error unless every length equals `expected`.
fn check_lengths(expected: usize, lengths: &[usize]) -> Result<(), Error> {
    if expected == 0 {
        return Err(Error::EmptyStatement);
    }
    for len in lengths {
        if *len != expected {
            return Err(Error::LengthMismatch(expected, *len));
        }
    }
    Ok(())
}

/// Reads `n` consecutive items.
fn read_n<T: ReadExt>(buf: &mut impl Buf, n: usize) -> Result<Vec<T>, CodecError> {
    (0..n).map(|_| T::read(buf)).collect()
}
