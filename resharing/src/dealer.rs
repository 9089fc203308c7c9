//! Dealing phase: re-share a holder's share to the next committee through the verifiers.

use crate::{
    context::Context,
    eps,
    types::{Dealing, Row},
    Error,
};
use bytes::Bytes;
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};
use yoso_codec::{Decode, Encode};
use yoso_cryptography::{
    bls12381::{
        nizk::dleq,
        primitives::{
            group::{Point, G1},
            matrix::Matrix,
        },
        vss::Share,
    },
    encryption::sealed,
};
use zeroize::Zeroize;

/// Suffix of the namespace of the double discrete log equality proof.
const DLEQ_SUFFIX: &[u8] = b"_DEALING_DLEQ";

/// Suffix of the namespace used to seal rows to verifiers.
const ROW_SUFFIX: &[u8] = b"_DEALING_ROW";

fn statement<'a>(ctx: &'a Context, com_z: &'a [G1], com_z_prime: &'a [G1]) -> dleq::Statement<'a> {
    let n = ctx.n() as usize;
    let bases = ctx.vector().bases();
    let pedersen = ctx.pedersen();
    dleq::Statement {
        g: &pedersen.g,
        h: &pedersen.h,
        g_bases: &bases[..n],
        h_bases: &bases[n..],
        z: com_z,
        z_prime: com_z_prime,
    }
}

/// Builds the dealing of `dealer`, who holds `share`.
///
/// Row `0` of the sharing matrix holds the first-level shares (one per next holder) and row
/// `k + 1` holds, for every first-level share, the second-level share of verifier `k`.
pub fn deal<R: RngCore + CryptoRng>(
    ctx: &Context,
    rng: &mut R,
    dealer: u32,
    share: &Share,
) -> Result<Dealing, Error> {
    if share.index != dealer || !ctx.vss().verify_share(ctx.commitments(), share) {
        return Err(Error::InvalidShare);
    }
    let n = ctx.n() as usize;
    let vss = ctx.vss();
    let bases = ctx.vector().bases();

    // Share twice
    let (mut first, _) = vss.share(rng, share.value, share.blinding);
    let mut second = first
        .iter()
        .map(|s| vss.share(rng, s.value, s.blinding))
        .collect::<Vec<_>>();
    let mut rows = Vec::with_capacity(n + 1);
    rows.push(Row {
        values: first.iter().map(|s| s.value).collect(),
        blindings: first.iter().map(|s| s.blinding).collect(),
    });
    for k in 0..n {
        rows.push(Row {
            values: second.iter().map(|(shares, _)| shares[k].value).collect(),
            blindings: second.iter().map(|(shares, _)| shares[k].blinding).collect(),
        });
    }

    // Commit
    let com_c = rows
        .iter()
        .map(|row| G1::msm(bases, &row.scalars()))
        .collect::<Vec<_>>();
    let com_z = second
        .iter()
        .map(|(_, commitments)| commitments[0])
        .collect::<Vec<_>>();
    let com_z_prime = first
        .iter()
        .enumerate()
        .map(|(l, s)| G1::msm(&[bases[l], bases[n + l]], &[s.value, s.blinding]))
        .collect::<Vec<_>>();
    let com_s = Matrix::from_fn(n, n, |l, k| second[l].1[k + 1]);
    let proof = dleq::prove(
        rng,
        &ctx.label(DLEQ_SUFFIX),
        &statement(ctx, &com_z, &com_z_prime),
        &rows[0].values,
        &rows[0].blindings,
    )?;

    // Encrypt each verifier's row twice: once for the verifier and once for later disclosure
    let row_namespace = ctx.label(ROW_SUFFIX);
    let mut enc_ver = Vec::with_capacity(n);
    for (k, verifier) in ctx.committees().verification.iter().enumerate() {
        let mut plaintext = rows[k + 1].encode();
        let sealed = sealed::seal(rng, ctx.key(*verifier), &row_namespace, &plaintext);
        plaintext.fill(0);
        enc_ver.push(Bytes::from(sealed?));
    }
    let eps::Material {
        enc_res,
        enc_eps,
        hash_eps,
    } = eps::generate(ctx, rng, &rows[1..])?;

    rows.zeroize();
    first.zeroize();
    for (shares, _) in second.iter_mut() {
        shares.zeroize();
    }
    debug!(dealer, "dealt");

    Ok(Dealing {
        com_c,
        com_z,
        com_z_prime,
        proof,
        com_s,
        enc_ver,
        enc_res,
        enc_eps,
        hash_eps,
    })
}

/// Runs the checks every party performs on a dealing before using it.
///
/// Returns `false` if the dealing is malformed, the equality proof fails, `ComZPrime` does
/// not sum to `ComC[0]`, or `ComC` is not consistent with a sharing of degree `D`.
pub fn check<R: RngCore>(ctx: &Context, rng: &mut R, dealer: u32, dealing: &Dealing) -> bool {
    let n = ctx.n() as usize;
    let shaped = dealing.com_c.len() == n + 1
        && dealing.com_z.len() == n
        && dealing.com_z_prime.len() == n
        && dealing.com_s.rows() == n
        && dealing.com_s.cols() == n
        && dealing.enc_ver.len() == n
        && dealing.enc_res.len() == n
        && dealing.enc_eps.len() == n
        && dealing.hash_eps.rows() == n
        && dealing.hash_eps.cols() == n;
    if !shaped {
        warn!(dealer, "malformed dealing");
        return false;
    }
    let statement = statement(ctx, &dealing.com_z, &dealing.com_z_prime);
    if let Err(err) = dleq::verify(rng, &ctx.label(DLEQ_SUFFIX), &statement, &dealing.proof) {
        warn!(dealer, ?err, "invalid equality proof");
        return false;
    }
    if G1::sum(&dealing.com_z_prime) != dealing.com_c[0] {
        warn!(dealer, "first-level commitments do not match the vector commitment");
        return false;
    }
    if !matches!(
        ctx.vss().verify_commitments_randomized(rng, &dealing.com_c),
        Ok(true)
    ) {
        warn!(dealer, "vector commitments are not a sharing");
        return false;
    }
    true
}

/// Returns whether `row` is the row dealt to verifier `verifier`: it must open `ComC[verifier + 1]`
/// and every entry must open the verifier's column of `ComS`.
pub fn check_row(ctx: &Context, dealing: &Dealing, verifier: u32, row: &Row) -> bool {
    let n = ctx.n() as usize;
    let k = verifier as usize;
    if row.values.len() != n || row.blindings.len() != n || k >= n {
        return false;
    }
    if !ctx.vector().verify(&dealing.com_c[k + 1], &row.scalars()) {
        return false;
    }
    let pedersen = ctx.pedersen();
    (0..n).all(|l| {
        dealing
            .com_s
            .get(l, k)
            .is_some_and(|c| pedersen.verify(c, &row.values[l], &row.blindings[l]))
    })
}

/// Opens the row a dealing sealed to verifier `verifier` (`None` if it cannot be decrypted or decoded).
pub fn open(
    ctx: &Context,
    key: &sealed::PrivateKey,
    dealing: &Dealing,
    verifier: u32,
) -> Option<Row> {
    let ciphertext = dealing.enc_ver.get(verifier as usize)?;
    let mut plaintext = sealed::open(key, &ctx.label(ROW_SUFFIX), ciphertext).ok()?;
    let row = Row::decode_cfg(plaintext.as_slice(), &(ctx.n() as usize)).ok();
    plaintext.zeroize();
    row
}

/// The dealings of a round, indexed by dealer. A dealer whose dealing is missing or failed
/// [check] is disqualified by every party.
#[derive(Clone, Debug, Default)]
pub struct Dealings(Vec<Option<Dealing>>);

impl Dealings {
    /// Returns the number of dealers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no dealers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the dealing of `dealer` if it passed [check].
    pub fn get(&self, dealer: u32) -> Option<&Dealing> {
        self.0.get(dealer as usize)?.as_ref()
    }

    /// Returns an iterator over the dealings that passed [check].
    pub fn valid(&self) -> impl Iterator<Item = (u32, &Dealing)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, dealing)| Some((i as u32, dealing.as_ref()?)))
    }
}

/// Checks every received dealing (`dealings[i]` from dealer `i`), in parallel.
pub fn collect<R: RngCore>(
    ctx: &Context,
    rng: &mut R,
    dealings: Vec<Option<Dealing>>,
) -> Result<Dealings, Error> {
    let seeds = dealings
        .iter()
        .map(|_| {
            let mut seed = <StdRng as SeedableRng>::Seed::default();
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect::<Vec<_>>();
    let pool = ctx.pool();
    let checked = pool.install(|| {
        dealings
            .into_par_iter()
            .zip(seeds)
            .enumerate()
            .map(|(i, (dealing, seed))| {
                let dealing = dealing?;
                let mut rng = StdRng::from_seed(seed);
                check(ctx, &mut rng, i as u32, &dealing).then_some(dealing)
            })
            .collect::<Vec<_>>()
    });
    Ok(Dealings(checked))
}
