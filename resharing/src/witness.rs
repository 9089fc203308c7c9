//! Witness phase: spot-check the second-level commitments of every dealing.
//!
//! For dealer `i`, stack its commitments into the `(N + 1) x (N + 1)` matrix whose row `0` is
//! `(Commitments[i + 1], ComZ[0..N])` and whose row `l + 1` is `(ComZ[l], ComS[l][0..N])`. Every
//! row of an honest dealing commits (in evaluation form) to a polynomial of degree `D`, so any sum
//! of rows does too. A witness expands a fresh seed into a subset of rows and checks their sum. A
//! failing seed is published so that auditors can reproduce the check.

use crate::{
    context::Context,
    dealer::Dealings,
    resolver::Resolved,
    types::{Dealing, Seed, Witness},
    Error,
};
use hkdf::Hkdf;
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use rayon::prelude::*;
use sha2::Sha256;
use tracing::{debug, warn};
use yoso_cryptography::bls12381::primitives::group::{Element, G1};

/// Suffix of the namespace used to expand seeds.
const EXPAND_SUFFIX: &[u8] = b"_WITNESS_EXPAND";

/// Expands `seed` into `len` pseudorandom bits.
pub fn expand(ctx: &Context, seed: &Seed, len: usize) -> Result<Vec<bool>, Error> {
    let mut bytes = vec![0u8; len.div_ceil(8)];
    Hkdf::<Sha256>::new(None, seed)
        .expand(&ctx.label(EXPAND_SUFFIX), &mut bytes)
        .map_err(|_| Error::SeedExpansion)?;
    Ok((0..len)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect())
}

/// Returns whether the rows of `dealing` (from `dealer`) selected by `seed` sum to a valid
/// commitment vector.
pub fn check_with_seed<R: RngCore>(
    ctx: &Context,
    rng: &mut R,
    dealer: u32,
    dealing: &Dealing,
    seed: &Seed,
) -> Result<bool, Error> {
    let n = ctx.n() as usize;
    let Some(commitment) = ctx.commitments().get(dealer as usize + 1) else {
        return Ok(false);
    };
    let selected = expand(ctx, seed, n + 1)?;
    let mut sum = vec![G1::zero(); n + 1];
    if selected[0] {
        sum[0].add(commitment);
        for (s, z) in sum[1..].iter_mut().zip(&dealing.com_z) {
            s.add(z);
        }
    }
    for (l, row) in dealing.com_s.rows_iter().enumerate() {
        if !selected[l + 1] {
            continue;
        }
        sum[0].add(&dealing.com_z[l]);
        for (s, c) in sum[1..].iter_mut().zip(row) {
            s.add(c);
        }
    }
    Ok(ctx.vss().verify_commitments_randomized(rng, &sum)?)
}

/// Checks every qualified dealing under a fresh seed, as witness `witness`.
///
/// Dealings that are invalid or whose dealer was disqualified during resolution are skipped.
pub fn witness<R: RngCore + CryptoRng>(
    ctx: &Context,
    rng: &mut R,
    witness: u32,
    dealings: &Dealings,
    resolved: &Resolved,
) -> Result<Witness, Error> {
    let draws = (0..dealings.len())
        .map(|_| {
            let mut seed = Seed::default();
            rng.fill_bytes(&mut seed);
            let mut check = <StdRng as SeedableRng>::Seed::default();
            rng.fill_bytes(&mut check);
            (seed, check)
        })
        .collect::<Vec<_>>();
    let pool = ctx.pool();
    let seeds = pool.install(|| {
        draws
            .into_par_iter()
            .enumerate()
            .map(|(i, (seed, check))| {
                let i = i as u32;
                let Some(dealing) = dealings.get(i) else {
                    return Ok(None);
                };
                if resolved.is_disqualified(i) {
                    return Ok(None);
                }
                let mut rng = StdRng::from_seed(check);
                if check_with_seed(ctx, &mut rng, i, dealing, &seed)? {
                    Ok(None)
                } else {
                    warn!(witness, dealer = i, "accused");
                    Ok(Some(seed))
                }
            })
            .collect::<Result<Vec<_>, Error>>()
    })?;
    debug!(
        witness,
        accused = seeds.iter().flatten().count(),
        "witnessed"
    );
    Ok(Witness { seeds })
}
