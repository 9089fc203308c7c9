//! Proof that a verifier forwards the rows it accepted.
//!
//! Verifier `k` holds, for every accepted dealer `i`, the row `x_i` (`2N` scalars) committed to by
//! `ComC_i[k + 1] = sum(x_{i,c} * G_c)`. It publishes the digest of every column of the accepted
//! rows, derives one challenge `e_i` per accepted dealer from a transcript over those digests, and
//! publishes `ComR[c] = r_c * G_c` with `r_c = sum(e_i * x_{i,c})` together with a proof of
//! knowledge of every `r_c`.
//!
//! Anyone can then check `sum(ComR[c]) == sum(e_i * ComC_i[k + 1])`, and next holder `l` can check
//! that the column it received hashes to `hashes[l]` (values) and `hashes[N + l]` (blindings) and
//! reproduces `ComR[l]` and `ComR[N + l]`.

use crate::{
    context::Context,
    dealer::Dealings,
    types::{Digest, Row},
    Error,
};
use bytes::{Buf, BufMut};
use rand::{CryptoRng, RngCore};
use sha2::{Digest as _, Sha256};
use yoso_codec::{Encode, EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use yoso_cryptography::{
    bls12381::{
        nizk::dl,
        primitives::group::{Element, Point, Scalar, G1},
    },
    transcript::Transcript,
};

/// Suffix of the namespace used to hash columns.
const HASH_SUFFIX: &[u8] = b"_VERIFIER_HASH";

/// Suffix of the namespace of the challenge transcript.
const CHALLENGE_SUFFIX: &[u8] = b"_VERIFIER_CHALLENGE";

/// Suffix of the namespace of the discrete log proof.
const DL_SUFFIX: &[u8] = b"_VERIFIER_DL";

/// Transcript label for the challenges.
const NOISE: &[u8] = b"challenges";

/// Published by a verifier alongside its complaints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifierProof {
    /// Digest of each of the `2N` columns of the accepted rows.
    pub hashes: Vec<Digest>,
    /// `ComR[c] = r_c * G_c` for each of the `2N` columns.
    pub com_r: Vec<G1>,
    /// Knowledge of every `r_c`.
    pub proof: dl::Proof,
}

impl Write for VerifierProof {
    fn write(&self, buf: &mut impl BufMut) {
        for hash in &self.hashes {
            hash.write(buf);
        }
        for c in &self.com_r {
            c.write(buf);
        }
        self.proof.write(buf);
    }
}

impl EncodeSize for VerifierProof {
    fn encode_size(&self) -> usize {
        self.hashes.len() * Digest::SIZE + self.com_r.len() * G1::SIZE + self.proof.encode_size()
    }
}

impl Read for VerifierProof {
    /// The committee size `N`.
    type Cfg = usize;

    fn read_cfg(buf: &mut impl Buf, n: &usize) -> Result<Self, CodecError> {
        let columns = 2 * n;
        let hashes = (0..columns)
            .map(|_| Digest::read(buf))
            .collect::<Result<Vec<_>, _>>()?;
        let com_r = (0..columns)
            .map(|_| G1::read(buf))
            .collect::<Result<Vec<_>, _>>()?;
        let proof = dl::Proof::read_cfg(buf, &columns)?;
        Ok(Self {
            hashes,
            com_r,
            proof,
        })
    }
}

/// Hashes one column of accepted rows.
pub fn hash_column<'a>(ctx: &Context, column: impl IntoIterator<Item = &'a Scalar>) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(ctx.label(HASH_SUFFIX));
    for scalar in column {
        hasher.update(scalar.encode());
    }
    hasher.finalize().into()
}

/// Derives one challenge per accepted dealer.
fn challenges(ctx: &Context, verifier: u32, complaints: &[bool], hashes: &[Digest]) -> Vec<Scalar> {
    let mut transcript = Transcript::new(&ctx.label(CHALLENGE_SUFFIX));
    transcript.commit(verifier.encode());
    transcript.commit_encoded(complaints);
    transcript.commit_encoded(hashes);
    let mut rng = transcript.noise(NOISE);
    let accepted = complaints.iter().filter(|c| !**c).count();
    (0..accepted).map(|_| Scalar::rand(&mut rng)).collect()
}

/// Returns `sum(e_i * values[i])`.
fn combine<'a>(e: &[Scalar], values: impl IntoIterator<Item = &'a Scalar>) -> Scalar {
    e.iter().zip(values).fold(Scalar::zero(), |mut acc, (e, x)| {
        let mut term = *x;
        term.mul(e);
        acc.add(&term);
        acc
    })
}

fn scale(base: &G1, scalar: &Scalar) -> G1 {
    let mut point = *base;
    point.mul(scalar);
    point
}

/// Proves that verifier `verifier` forwards `rows` (one per accepted dealer, in dealer order).
pub fn prove<R: RngCore + CryptoRng>(
    ctx: &Context,
    rng: &mut R,
    verifier: u32,
    complaints: &[bool],
    rows: &[&Row],
) -> Result<VerifierProof, Error> {
    let n = ctx.n() as usize;
    let column = |c: usize| {
        rows.iter().map(move |row| {
            if c < n {
                &row.values[c]
            } else {
                &row.blindings[c - n]
            }
        })
    };
    let hashes = (0..2 * n)
        .map(|c| hash_column(ctx, column(c)))
        .collect::<Vec<_>>();
    let e = challenges(ctx, verifier, complaints, &hashes);
    let r = (0..2 * n)
        .map(|c| combine(&e, column(c)))
        .collect::<Vec<_>>();
    let bases = ctx.vector().bases();
    let com_r = bases
        .iter()
        .zip(&r)
        .map(|(base, r)| scale(base, r))
        .collect::<Vec<_>>();
    let proof = dl::prove(rng, &ctx.label(DL_SUFFIX), bases, &com_r, &r)?;
    Ok(VerifierProof {
        hashes,
        com_r,
        proof,
    })
}

/// Checks, against the public dealings, the proof published by verifier `verifier`.
///
/// Fails if the verifier accepted no dealer or a dealer whose dealing is invalid.
pub fn verify<R: RngCore>(
    ctx: &Context,
    rng: &mut R,
    dealings: &Dealings,
    verifier: u32,
    complaints: &[bool],
    proof: &VerifierProof,
) -> bool {
    let n = ctx.n() as usize;
    let k = verifier as usize;
    if complaints.len() != dealings.len() || proof.com_r.len() != 2 * n {
        return false;
    }
    let mut points = Vec::new();
    for (i, complaint) in complaints.iter().enumerate() {
        if *complaint {
            continue;
        }
        let Some(dealing) = dealings.get(i as u32) else {
            return false;
        };
        let Some(point) = dealing.com_c.get(k + 1) else {
            return false;
        };
        points.push(*point);
    }
    if points.is_empty() {
        return false;
    }
    let e = challenges(ctx, verifier, complaints, &proof.hashes);
    if G1::sum(&proof.com_r) != G1::msm(&points, &e) {
        return false;
    }
    dl::verify(
        rng,
        &ctx.label(DL_SUFFIX),
        ctx.vector().bases(),
        &proof.com_r,
        &proof.proof,
    )
    .is_ok()
}

/// Checks that the column `forwarded` (one entry per accepted dealer) received by next holder
/// `holder` is the one verifier `verifier` committed to.
pub fn verify_forwarded(
    ctx: &Context,
    verifier: u32,
    complaints: &[bool],
    proof: &VerifierProof,
    holder: u32,
    forwarded: &Row,
) -> bool {
    let n = ctx.n() as usize;
    let l = holder as usize;
    let accepted = complaints.iter().filter(|c| !**c).count();
    if l >= n
        || forwarded.values.len() != accepted
        || forwarded.blindings.len() != accepted
        || proof.hashes.len() != 2 * n
        || proof.com_r.len() != 2 * n
    {
        return false;
    }
    if proof.hashes[l] != hash_column(ctx, &forwarded.values)
        || proof.hashes[n + l] != hash_column(ctx, &forwarded.blindings)
    {
        return false;
    }
    let e = challenges(ctx, verifier, complaints, &proof.hashes);
    let bases = ctx.vector().bases();
    proof.com_r[l] == scale(&bases[l], &combine(&e, &forwarded.values))
        && proof.com_r[n + l] == scale(&bases[n + l], &combine(&e, &forwarded.blindings))
}
