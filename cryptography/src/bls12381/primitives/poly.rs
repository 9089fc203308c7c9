//! Polynomial operations over the BLS12-381 scalar field.
//!
//! Committee member `i` always holds the evaluation at `x = i + 1`. The evaluation at
//! `x = 0` is the shared secret and is never handed out.
//!
//! # Warning
//!
//! The security of the polynomial operations is critical for the overall
//! security of the sharing schemes. Ensure that the scalar field operations
//! are performed over the correct field and that all elements are valid.

use crate::bls12381::primitives::{
    group::{Element, Scalar},
    Error,
};
use rand::RngCore;
use std::collections::BTreeSet;
use zeroize::Zeroize;

/// A polynomial evaluation at a specific index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eval<C: Element> {
    pub index: u32,
    pub value: C,
}

/// A polynomial that is using a scalar for the variable x and a generic
/// element for the coefficients.
///
/// The coefficients must be able to multiply the type of the variable,
/// which is always a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
// Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L24-L28
pub struct Poly<C>(Vec<C>);

/// Returns a new scalar polynomial of the given degree where each coefficient is
/// sampled at random from the provided RNG.
///
/// In the context of secret sharing, the threshold is the degree + 1.
pub fn new_from<R: RngCore>(degree: u32, rng: &mut R) -> Poly<Scalar> {
    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L46-L52
    let coeffs = (0..=degree).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
    Poly::<Scalar>(coeffs)
}

/// Returns a new random scalar polynomial of the given degree whose constant term
/// is `constant`.
pub fn new_with_constant<R: RngCore>(degree: u32, rng: &mut R, constant: Scalar) -> Poly<Scalar> {
    let mut poly = new_from(degree, rng);
    poly.0[0] = constant;
    poly
}

impl<C> Poly<C> {
    /// Returns the constant term of the polynomial.
    pub fn constant(&self) -> &C {
        &self.0[0]
    }
}

impl<C: Element> Poly<C> {
    /// Evaluates the polynomial at an arbitrary point.
    pub fn evaluate_at(&self, x: &Scalar) -> C {
        // Use Horner's method to evaluate the polynomial
        self.0.iter().rev().fold(C::zero(), |mut sum, coeff| {
            sum.mul(x);
            sum.add(coeff);
            sum
        })
    }

    /// Evaluates the polynomial at the point held by committee member `i` (`x = i + 1`).
    pub fn evaluate(&self, i: u32) -> Eval<C> {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L111-L129
        Eval {
            value: self.evaluate_at(&Scalar::from_index(i)),
            index: i,
        }
    }

    /// Recovers the constant term of a polynomial of degree less than `t` using at least `t` evaluations of the polynomial.
    ///
    /// Evaluations are sorted by index and the first `t` are used, so that two invocations
    /// over the same set select the same evaluations.
    ///
    /// Returns [Error::DuplicateEval] if two of the selected evaluations share an index.
    pub fn recover<'a, I>(t: u32, evals: I) -> Result<C, Error>
    where
        C: 'a,
        I: IntoIterator<Item = &'a Eval<C>>,
    {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L131-L165
        let t = t as usize;
        let mut evals = evals.into_iter().collect::<Vec<_>>();
        if evals.len() < t {
            return Err(Error::NotEnoughEvaluations(t, evals.len()));
        }
        evals.sort_by_key(|e| e.index);
        evals.truncate(t);

        let indices = evals.iter().map(|e| e.index).collect::<Vec<_>>();
        let weights = compute_weights(&indices)?;
        Ok(recover_with_weights(
            &weights,
            evals.iter().map(|e| &e.value),
        ))
    }
}

/// Computes the Lagrange coefficients at `x = 0` for the provided committee indices
/// (mapped to `x = index + 1`).
///
/// The returned weights are in the same order as `indices`.
pub fn compute_weights(indices: &[u32]) -> Result<Vec<Scalar>, Error> {
    let unique = indices.iter().collect::<BTreeSet<_>>();
    if unique.len() != indices.len() {
        return Err(Error::DuplicateEval);
    }
    let xs = indices
        .iter()
        .map(|i| Scalar::from_index(*i))
        .collect::<Vec<_>>();

    // l_i(0) = prod_{j != i} (x_j / (x_j - x_i))
    let mut weights = Vec::with_capacity(xs.len());
    for (i, xi) in xs.iter().enumerate() {
        let mut num = Scalar::one();
        let mut den = Scalar::one();
        for (j, xj) in xs.iter().enumerate() {
            if i == j {
                continue;
            }
            num.mul(xj);
            let mut diff = *xj;
            diff.sub(xi);
            den.mul(&diff);
        }
        let inv = den.inverse().ok_or(Error::NoInverse)?;
        num.mul(&inv);
        weights.push(num);
    }
    Ok(weights)
}

/// Combines values with precomputed weights (`sum(weights[i] * values[i])`).
///
/// Panics if the number of values differs from the number of weights.
pub fn recover_with_weights<'a, C: Element + 'a>(
    weights: &[Scalar],
    values: impl IntoIterator<Item = &'a C>,
) -> C {
    let mut count = 0;
    let sum = values
        .into_iter()
        .zip(weights.iter())
        .fold(C::zero(), |mut acc, (value, weight)| {
            let mut term = value.clone();
            term.mul(weight);
            acc.add(&term);
            count += 1;
            acc
        });
    assert_eq!(count, weights.len(), "mismatched weights");
    sum
}

impl<C: Zeroize> Zeroize for Poly<C> {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}
