//! A round's public input and every party's secrets, for tests.

use crate::{committee::Committees, config::Config, context::Context, dealer, types::Dealing};
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use yoso_cryptography::{
    bls12381::{primitives::group::Scalar, vss::Share},
    encryption::sealed,
};

/// Disjoint committees of `n` members each, with a fresh sharing held by the current committee.
pub struct Fixture {
    ctx: Context,
    keys: Vec<sealed::PrivateKey>,
    shares: Vec<Share>,
    secret: (Scalar, Scalar),
}

impl Fixture {
    pub fn new(n: u32, degree: u32, seed: u64) -> Self {
        Self::with_config(Config::new(n, degree), seed)
    }

    pub fn with_config(config: Config, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = config.participants;
        let keys = (0..6 * n)
            .map(|_| sealed::PrivateKey::from_rng(&mut rng))
            .collect::<Vec<_>>();
        let public = keys.iter().map(|k| k.public_key()).collect();
        let secret = (Scalar::rand(&mut rng), Scalar::rand(&mut rng));
        let vss = yoso_cryptography::bls12381::vss::Params::new(n, config.degree).unwrap();
        let (shares, commitments) = vss.share(&mut rng, secret.0, secret.1);
        let ctx = Context::new(config, public, Committees::disjoint(n), commitments).unwrap();
        Self {
            ctx,
            keys,
            shares,
            secret,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Returns the private key of `party`.
    pub fn private(&self, party: u32) -> &sealed::PrivateKey {
        &self.keys[party as usize]
    }

    /// Returns the share held by `dealer`.
    pub fn share(&self, dealer: u32) -> &Share {
        &self.shares[dealer as usize]
    }

    /// Returns the shared secret and its blinding.
    pub fn secret(&self) -> (Scalar, Scalar) {
        self.secret
    }

    /// Deals `dealer`'s share honestly.
    pub fn deal<R: RngCore + CryptoRng>(&self, rng: &mut R, dealer: u32) -> Dealing {
        dealer::deal(&self.ctx, rng, dealer, self.share(dealer)).unwrap()
    }
}
