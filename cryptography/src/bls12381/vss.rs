//! Pedersen verifiable secret sharing over G1.
//!
//! Commitments are kept in evaluation form: `C[0]` commits to the secret (and its blinding)
//! and `C[i + 1]` commits to the share held by committee member `i`. A vector is consistent
//! with some degree-`D` sharing iff it lies in the Reed-Solomon code over the evaluation
//! points `0..=N`, which is checked with that code's parity-check matrix.
//!
//! # Example
//!
//! ```rust
//! use yoso_cryptography::bls12381::{primitives::group::Scalar, vss::Params};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let params = Params::new(5, 2).unwrap();
//! let (secret, blinding) = (Scalar::rand(&mut rng), Scalar::rand(&mut rng));
//! let (shares, commitments) = params.share(&mut rng, secret, blinding);
//!
//! assert!(shares.iter().all(|s| params.verify_share(&commitments, s)));
//! assert!(params.verify_commitments_randomized(&mut rng, &commitments).unwrap());
//! assert_eq!(params.reconstruct(&commitments, &shares[1..4]).unwrap(), (secret, blinding));
//! ```

use crate::bls12381::{
    pedersen,
    primitives::{
        self,
        group::{Element, Point, Scalar, G1},
        matrix::Matrix,
        poly::{self, Eval, Poly},
    },
};
use bytes::{Buf, BufMut};
use rand::RngCore;
use thiserror::Error;
use yoso_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use zeroize::Zeroize;

/// Errors that can occur when sharing, verifying, or reconstructing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("degree {0} must be less than participants {1}")]
    InvalidDegree(u32, u32),
    #[error("invalid length: expected {0}, got {1}")]
    InvalidLength(usize, usize),
    #[error("insufficient shares: need {0}, got {1}")]
    InsufficientShares(usize, usize),
    #[error("polynomial: {0}")]
    Poly(#[from] primitives::Error),
}

/// A share of a committed `(value, blinding)` pair held by committee member `index`.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize)]
pub struct Share {
    #[zeroize(skip)]
    pub index: u32,
    pub value: Scalar,
    pub blinding: Scalar,
}

impl Write for Share {
    fn write(&self, buf: &mut impl BufMut) {
        self.index.write(buf);
        self.value.write(buf);
        self.blinding.write(buf);
    }
}

impl Read for Share {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let index = u32::read(buf)?;
        let value = Scalar::read(buf)?;
        let blinding = Scalar::read(buf)?;
        Ok(Self {
            index,
            value,
            blinding,
        })
    }
}

impl FixedSize for Share {
    const SIZE: usize = u32::SIZE + 2 * Scalar::SIZE;
}

/// Public parameters for a committee of `n` members sharing with degree `degree`.
#[derive(Clone, Debug)]
pub struct Params {
    n: u32,
    degree: u32,
    pedersen: pedersen::Params,
    parity: Matrix<Scalar>,
}

/// Returns `base^exp`.
fn pow(base: &Scalar, exp: usize) -> Scalar {
    let mut res = Scalar::one();
    for _ in 0..exp {
        res.mul(base);
    }
    res
}

/// Builds the `(n + 1) x (n - degree)` parity-check matrix of the Reed-Solomon code of
/// degree `degree` over the points `0..=n`.
///
/// Column `k` holds `v_i * x_i^k` where `v_i = 1 / prod_{j != i} (x_i - x_j)`.
fn parity_check(n: u32, degree: u32) -> Result<Matrix<Scalar>, primitives::Error> {
    let xs = (0..=n).map(Scalar::from_u32).collect::<Vec<_>>();
    let mut vs = Vec::with_capacity(xs.len());
    for (i, xi) in xs.iter().enumerate() {
        let mut den = Scalar::one();
        for (j, xj) in xs.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut diff = *xi;
            diff.sub(xj);
            den.mul(&diff);
        }
        vs.push(den.inverse().ok_or(primitives::Error::NoInverse)?);
    }
    let cols = (n - degree) as usize;
    Ok(Matrix::from_fn(xs.len(), cols, |i, k| {
        let mut entry = pow(&xs[i], k);
        entry.mul(&vs[i]);
        entry
    }))
}

impl Params {
    /// Derives parameters for `n` participants and polynomials of degree `degree`.
    pub fn new(n: u32, degree: u32) -> Result<Self, Error> {
        if degree >= n {
            return Err(Error::InvalidDegree(degree, n));
        }
        Ok(Self {
            n,
            degree,
            pedersen: pedersen::Params::new(),
            parity: parity_check(n, degree)?,
        })
    }

    /// Returns the number of participants.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Returns the degree of the sharing polynomials.
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Returns the number of shares required to reconstruct (`degree + 1`).
    pub fn threshold(&self) -> u32 {
        self.degree + 1
    }

    /// Returns the Pedersen generators.
    pub fn pedersen(&self) -> &pedersen::Params {
        &self.pedersen
    }

    /// Returns the parity-check matrix.
    pub fn parity(&self) -> &Matrix<Scalar> {
        &self.parity
    }

    /// Computes `value * G + blinding * H`.
    pub fn commit(&self, value: &Scalar, blinding: &Scalar) -> G1 {
        self.pedersen.commit(value, blinding)
    }

    /// Shares `(secret, blinding)` among all participants.
    ///
    /// Returns the `n` shares and the `n + 1` commitments in evaluation form.
    pub fn share<R: RngCore>(
        &self,
        rng: &mut R,
        secret: Scalar,
        blinding: Scalar,
    ) -> (Vec<Share>, Vec<G1>) {
        let mut values = poly::new_with_constant(self.degree, rng, secret);
        let mut blindings = poly::new_with_constant(self.degree, rng, blinding);
        let shares = (0..self.n)
            .map(|i| Share {
                index: i,
                value: values.evaluate(i).value,
                blinding: blindings.evaluate(i).value,
            })
            .collect::<Vec<_>>();
        let commitments = std::iter::once(self.commit(&secret, &blinding))
            .chain(shares.iter().map(|s| self.commit(&s.value, &s.blinding)))
            .collect();
        values.zeroize();
        blindings.zeroize();
        (shares, commitments)
    }

    /// Returns whether `share` opens the commitment of its holder.
    pub fn verify_share(&self, commitments: &[G1], share: &Share) -> bool {
        if commitments.len() != self.n as usize + 1 || share.index >= self.n {
            return false;
        }
        self.pedersen.verify(
            &commitments[share.index as usize + 1],
            &share.value,
            &share.blinding,
        )
    }

    /// Recovers `(secret, blinding)` from the shares that verify against `commitments`.
    ///
    /// Invalid shares are skipped. Fails if fewer than `degree + 1` valid shares remain.
    pub fn reconstruct(
        &self,
        commitments: &[G1],
        shares: &[Share],
    ) -> Result<(Scalar, Scalar), Error> {
        let threshold = self.threshold() as usize;
        let valid = shares
            .iter()
            .filter(|s| self.verify_share(commitments, s))
            .take(threshold)
            .collect::<Vec<_>>();
        if valid.len() < threshold {
            return Err(Error::InsufficientShares(threshold, valid.len()));
        }
        let values = valid
            .iter()
            .map(|s| Eval {
                index: s.index,
                value: s.value,
            })
            .collect::<Vec<_>>();
        let blindings = valid
            .iter()
            .map(|s| Eval {
                index: s.index,
                value: s.blinding,
            })
            .collect::<Vec<_>>();
        let value = Poly::recover(self.threshold(), &values)?;
        let blinding = Poly::recover(self.threshold(), &blindings)?;
        Ok((value, blinding))
    }

    fn check_length(&self, commitments: &[G1]) -> Result<(), Error> {
        let expected = self.n as usize + 1;
        if commitments.len() != expected {
            return Err(Error::InvalidLength(expected, commitments.len()));
        }
        Ok(())
    }

    /// Returns whether `commitments` (evaluation form, `n + 1` entries) are consistent
    /// with some polynomial of degree at most `degree`.
    ///
    /// Checks every column of the parity-check matrix.
    pub fn verify_commitments(&self, commitments: &[G1]) -> Result<bool, Error> {
        self.check_length(commitments)?;
        for k in 0..self.parity.cols() {
            let column = self
                .parity
                .col_iter(k)
                .into_iter()
                .flatten()
                .copied()
                .collect::<Vec<_>>();
            if !G1::msm(commitments, &column).is_zero() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Like [Self::verify_commitments], but checks a single random combination of the
    /// parity-check columns with one multi-scalar multiplication.
    ///
    /// An inconsistent vector is accepted with probability at most `1/q`.
    pub fn verify_commitments_randomized<R: RngCore>(
        &self,
        rng: &mut R,
        commitments: &[G1],
    ) -> Result<bool, Error> {
        self.check_length(commitments)?;
        let r = (0..self.parity.cols())
            .map(|_| Scalar::rand(rng))
            .collect::<Vec<_>>();
        let h = self.parity.mul_vec(&r);
        Ok(G1::msm(commitments, &h).is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use test_case::test_case;
    use yoso_codec::{DecodeExt, Encode};

    fn setup(n: u32, degree: u32, seed: u64) -> (StdRng, Params, Scalar, Scalar) {
        let mut rng = StdRng::seed_from_u64(seed);
        let params = Params::new(n, degree).unwrap();
        let secret = Scalar::rand(&mut rng);
        let blinding = Scalar::rand(&mut rng);
        (rng, params, secret, blinding)
    }

    #[test_case(1, 1)]
    #[test_case(1, 5)]
    #[test_case(3, 5)]
    #[test_case(5, 5)]
    #[test_case(3, 12)]
    fn test_share_and_reconstruct(t: u32, n: u32) {
        let (mut rng, params, secret, blinding) = setup(n, t - 1, t as u64 * 100 + n as u64);
        let (shares, commitments) = params.share(&mut rng, secret, blinding);
        assert_eq!(shares.len(), n as usize);
        assert_eq!(commitments.len(), n as usize + 1);
        assert!(params.pedersen().verify(&commitments[0], &secret, &blinding));
        for share in &shares {
            assert!(params.verify_share(&commitments, share));
        }

        // Any window of t shares recovers the secret
        for start in 0..=(n - t) as usize {
            let window = &shares[start..start + t as usize];
            assert_eq!(
                params.reconstruct(&commitments, window).unwrap(),
                (secret, blinding)
            );
        }
    }

    #[test]
    fn test_reconstruct_skips_invalid() {
        let (mut rng, params, secret, blinding) = setup(5, 2, 1);
        let (mut shares, commitments) = params.share(&mut rng, secret, blinding);
        shares[0].value.add(&Scalar::one());
        shares[3].index = 7;
        assert!(!params.verify_share(&commitments, &shares[0]));
        assert!(!params.verify_share(&commitments, &shares[3]));
        assert_eq!(
            params.reconstruct(&commitments, &shares).unwrap(),
            (secret, blinding)
        );
        assert!(matches!(
            params.reconstruct(&commitments, &shares[..4]),
            Err(Error::InsufficientShares(3, 2))
        ));
    }

    #[test_case(1, 0)]
    #[test_case(4, 1)]
    #[test_case(12, 2)]
    #[test_case(12, 11)]
    fn test_verify_commitments(n: u32, degree: u32) {
        let (mut rng, params, secret, blinding) = setup(n, degree, n as u64);
        let (_, commitments) = params.share(&mut rng, secret, blinding);
        assert!(params.verify_commitments(&commitments).unwrap());
        assert!(params
            .verify_commitments_randomized(&mut rng, &commitments)
            .unwrap());
    }

    #[test]
    fn test_detect_corruption() {
        let (mut rng, params, secret, blinding) = setup(12, 2, 2);
        let (_, commitments) = params.share(&mut rng, secret, blinding);
        for i in 0..commitments.len() {
            let mut corrupted = commitments.clone();
            let doubled = corrupted[i];
            corrupted[i].add(&doubled);
            assert!(!params.verify_commitments(&corrupted).unwrap(), "index={i}");
            for _ in 0..20 {
                assert!(
                    !params
                        .verify_commitments_randomized(&mut rng, &corrupted)
                        .unwrap(),
                    "index={i}"
                );
            }
        }
    }

    #[test]
    fn test_detect_high_degree() {
        // A degree-3 sharing is not a degree-2 codeword
        let (mut rng, params, secret, blinding) = setup(6, 2, 3);
        let wide = Params::new(6, 3).unwrap();
        let (_, commitments) = wide.share(&mut rng, secret, blinding);
        assert!(!params.verify_commitments(&commitments).unwrap());
        assert!(!params
            .verify_commitments_randomized(&mut rng, &commitments)
            .unwrap());
    }

    #[test]
    fn test_malformed_length() {
        let (mut rng, params, secret, blinding) = setup(5, 2, 4);
        let (_, commitments) = params.share(&mut rng, secret, blinding);
        assert!(matches!(
            params.verify_commitments(&commitments[..5]),
            Err(Error::InvalidLength(6, 5))
        ));
        assert!(matches!(
            params.verify_commitments_randomized(&mut rng, &commitments[..5]),
            Err(Error::InvalidLength(6, 5))
        ));
    }

    #[test]
    fn test_invalid_degree() {
        assert!(matches!(Params::new(3, 3), Err(Error::InvalidDegree(3, 3))));
    }

    #[test]
    fn test_share_codec() {
        let (mut rng, params, secret, blinding) = setup(3, 1, 5);
        let (shares, _) = params.share(&mut rng, secret, blinding);
        assert_eq!(Share::decode(shares[2].encode()).unwrap(), shares[2]);
    }
}
