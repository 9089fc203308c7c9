//! Pedersen and vector Pedersen commitments over G1.
//!
//! All generators are derived by hashing to G1, so nobody knows the discrete log
//! relation between any two of them.

use crate::bls12381::primitives::group::{Element, Point, Scalar, G1};

/// Domain separation tag for the blinding generator `H`.
const H_DST: &[u8] = b"YOSO_PEDERSEN_H_BLS12381G1_XMD:SHA-256_SSWU_RO_";

/// Domain separation tag for the vector commitment bases.
const VECTOR_DST: &[u8] = b"YOSO_PEDERSEN_VECTOR_BLS12381G1_XMD:SHA-256_SSWU_RO_";

/// Generators `G` and `H` for single value commitments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    pub g: G1,
    pub h: G1,
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

impl Params {
    /// Returns `G` (the standard G1 generator) and a hashed `H`.
    pub fn new() -> Self {
        let mut h = G1::zero();
        h.map(H_DST, b"H");
        Self { g: G1::one(), h }
    }

    /// Computes `value * G + blind * H`.
    pub fn commit(&self, value: &Scalar, blind: &Scalar) -> G1 {
        G1::msm(&[self.g, self.h], &[*value, *blind])
    }

    /// Returns whether `commitment` opens to `(value, blind)`.
    pub fn verify(&self, commitment: &G1, value: &Scalar, blind: &Scalar) -> bool {
        self.commit(value, blind) == *commitment
    }
}

/// Independent bases `G_0, ..., G_{len-1}` for committing to a vector of scalars.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorParams {
    bases: Vec<G1>,
}

impl VectorParams {
    /// Derives `len` bases. Base `i` is the hash of `i` (big-endian).
    pub fn new(len: usize) -> Self {
        let bases = (0..len as u32)
            .map(|i| {
                let mut base = G1::zero();
                base.map(VECTOR_DST, &i.to_be_bytes());
                base
            })
            .collect();
        Self { bases }
    }

    /// Returns the number of bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Returns whether there are no bases.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Returns all bases.
    pub fn bases(&self) -> &[G1] {
        &self.bases
    }

    /// Returns base `i`.
    ///
    /// Panics if `i` is out of range.
    pub fn base(&self, i: usize) -> &G1 {
        &self.bases[i]
    }

    /// Computes `sum(values[i] * G_i)`.
    ///
    /// Returns `None` if the number of values differs from the number of bases.
    pub fn commit(&self, values: &[Scalar]) -> Option<G1> {
        (values.len() == self.bases.len()).then(|| G1::msm(&self.bases, values))
    }

    /// Returns whether `commitment` opens to `values`.
    pub fn verify(&self, commitment: &G1, values: &[Scalar]) -> bool {
        self.commit(values).is_some_and(|c| c == *commitment)
    }
}
