use rand::{rngs::StdRng, SeedableRng};
use yoso_cryptography::{
    bls12381::{primitives::group::Scalar, vss},
    encryption::sealed,
};
use yoso_resharing::{committee::Committees, config::Config, context::Context};

/// Returns the context of a round with committees of `n` members verifying on `concurrency`
/// threads, the private key of every party, and the current shares.
pub fn round(
    n: u32,
    concurrency: usize,
    rng: &mut StdRng,
) -> (Context, Vec<sealed::PrivateKey>, Vec<vss::Share>) {
    let degree = (n - 1) / 2;
    let keys = (0..6 * n)
        .map(|_| sealed::PrivateKey::from_rng(rng))
        .collect::<Vec<_>>();
    let public = keys.iter().map(|k| k.public_key()).collect();
    let params = vss::Params::new(n, degree).unwrap();
    let secret = Scalar::rand(rng);
    let blinding = Scalar::rand(rng);
    let (shares, commitments) = params.share(rng, secret, blinding);
    let mut config = Config::new(n, degree);
    config.concurrency = concurrency;
    let ctx = Context::new(
        config,
        public,
        Committees::disjoint(n),
        commitments,
    )
    .unwrap();
    (ctx, keys, shares)
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0)
}
