//! Operations over the BLS12-381 scalar field and the G1 subgroup.
//!
//! # Acknowledgements
//!
//! _The following crates were used as a reference when implementing this crate. If code is very similar
//! to the reference, it is accompanied by a comment and link._
//!
//! * <https://github.com/celo-org/celo-threshold-bls-rs>: Operations over the BLS12-381 scalar field.
//! * <https://github.com/filecoin-project/blstrs> + <https://github.com/MystenLabs/fastcrypto>: Implementing operations over
//!   the BLS12-381 scalar field with <https://github.com/supranational/blst>.
//!
//! # Example
//!
//! ```rust
//! use yoso_cryptography::bls12381::primitives::{group::{Element, Scalar}, poly};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Share a secret among 5 members with degree 2
//! let mut rng = StdRng::seed_from_u64(0);
//! let secret = Scalar::rand(&mut rng);
//! let polynomial = poly::new_with_constant(2, &mut rng, secret);
//! let shares = (0..5).map(|i| polynomial.evaluate(i)).collect::<Vec<_>>();
//!
//! // Any 3 shares recover the secret
//! let recovered = poly::Poly::recover(3, &shares[2..]).unwrap();
//! assert_eq!(recovered, secret);
//! ```

pub mod group;
pub mod matrix;
pub mod poly;

use thiserror::Error;

/// Errors that can occur when working with BLS12-381 primitives.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not enough evaluations: {1}/{0}")]
    NotEnoughEvaluations(usize, usize),
    #[error("no inverse")]
    NoInverse,
    #[error("duplicate polynomial evaluation point")]
    DuplicateEval,
}
