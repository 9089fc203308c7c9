//! Batched proof of knowledge of discrete logarithms over independent bases.
//!
//! Statement `(G_i, X_i)` for `i in 0..n`, witness `x_i` with `X_i = x_i * G_i`.
//!
//! The prover samples `k_i`, publishes `Com_i = k_i * G_i`, derives `ch` from the
//! statement and commitments, and responds with `resp_i = k_i + ch * x_i`. The verifier
//! samples `e_i` and checks `sum(e_i * (Com_i + ch * X_i - resp_i * G_i)) == 0`.

use super::{batching_scalars, challenge, check_lengths, read_n, Error};
use crate::{
    bls12381::primitives::group::{Element, Point, Scalar, G1},
    transcript::Transcript,
};
use bytes::{Buf, BufMut};
use rand::RngCore;
use yoso_codec::{EncodeSize, Error as CodecError, Read, Write};

/// Transcript namespace for discrete log proofs.
const TRANSCRIPT: &[u8] = b"yoso.bls12381.nizk.dl";
/// Transcript label for the challenge.
const NOISE: &[u8] = b"dl-chal";

/// A proof over `n` statements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub commitments: Vec<G1>,
    pub responses: Vec<Scalar>,
}

impl Proof {
    /// Returns the number of statements covered.
    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    /// Returns whether the proof covers no statements.
    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }
}

impl Write for Proof {
    fn write(&self, buf: &mut impl BufMut) {
        for c in &self.commitments {
            c.write(buf);
        }
        for r in &self.responses {
            r.write(buf);
        }
    }
}

impl EncodeSize for Proof {
    fn encode_size(&self) -> usize {
        self.commitments.iter().map(EncodeSize::encode_size).sum::<usize>()
            + self.responses.iter().map(EncodeSize::encode_size).sum::<usize>()
    }
}

impl Read for Proof {
    /// The number of statements.
    type Cfg = usize;

    fn read_cfg(buf: &mut impl Buf, n: &usize) -> Result<Self, CodecError> {
        let commitments = read_n(buf, *n)?;
        let responses = read_n(buf, *n)?;
        Ok(Self {
            commitments,
            responses,
        })
    }
}

fn derive_challenge(namespace: &[u8], bases: &[G1], points: &[G1], commitments: &[G1]) -> Scalar {
    let mut transcript = Transcript::new(TRANSCRIPT);
    transcript.commit(namespace);
    transcript.commit_encoded(bases);
    transcript.commit_encoded(points);
    transcript.commit_encoded(commitments);
    challenge(&transcript, NOISE)
}

/// Proves knowledge of `witnesses[i]` such that `points[i] = witnesses[i] * bases[i]`.
pub fn prove<R: RngCore>(
    rng: &mut R,
    namespace: &[u8],
    bases: &[G1],
    points: &[G1],
    witnesses: &[Scalar],
) -> Result<Proof, Error> {
    let n = bases.len();
    check_lengths(n, &[points.len(), witnesses.len()])?;

    let nonces = (0..n).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
    let commitments = bases
        .iter()
        .zip(&nonces)
        .map(|(base, k)| {
            let mut c = *base;
            c.mul(k);
            c
        })
        .collect::<Vec<_>>();
    let ch = derive_challenge(namespace, bases, points, &commitments);
    let responses = nonces
        .iter()
        .zip(witnesses)
        .map(|(k, x)| {
            let mut resp = *x;
            resp.mul(&ch);
            resp.add(k);
            resp
        })
        .collect();
    Ok(Proof {
        commitments,
        responses,
    })
}

/// Verifies `proof` against the statement `(bases, points)`.
pub fn verify<R: RngCore>(
    rng: &mut R,
    namespace: &[u8],
    bases: &[G1],
    points: &[G1],
    proof: &Proof,
) -> Result<(), Error> {
    let n = bases.len();
    check_lengths(n, &[points.len(), proof.commitments.len(), proof.responses.len()])?;
    let ch = derive_challenge(namespace, bases, points, &proof.commitments);
    let e = batching_scalars(rng, n);

    // sum(e_i * Com_i) + sum(e_i * ch * X_i) - sum(e_i * resp_i * G_i)
    let mut msm_points = Vec::with_capacity(3 * n);
    let mut msm_scalars = Vec::with_capacity(3 * n);
    for i in 0..n {
        msm_points.push(proof.commitments[i]);
        msm_scalars.push(e[i]);

        let mut e_ch = e[i];
        e_ch.mul(&ch);
        msm_points.push(points[i]);
        msm_scalars.push(e_ch);

        let mut e_resp = e[i];
        e_resp.mul(&proof.responses[i]);
        e_resp.negate();
        msm_points.push(bases[i]);
        msm_scalars.push(e_resp);
    }
    if !G1::msm(&msm_points, &msm_scalars).is_zero() {
        return Err(Error::InvalidProof);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use test_case::test_case;
    use yoso_codec::{Decode, Encode};

    const NAMESPACE: &[u8] = b"test";

    fn statement(rng: &mut StdRng, n: usize) -> (Vec<G1>, Vec<G1>, Vec<Scalar>) {
        let mut bases = Vec::with_capacity(n);
        let mut points = Vec::with_capacity(n);
        let mut witnesses = Vec::with_capacity(n);
        for _ in 0..n {
            let mut base = G1::one();
            base.mul(&Scalar::rand(rng));
            let x = Scalar::rand(rng);
            let mut point = base;
            point.mul(&x);
            bases.push(base);
            points.push(point);
            witnesses.push(x);
        }
        (bases, points, witnesses)
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(5)]
    #[test_case(10)]
    fn test_completeness(n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let (bases, points, witnesses) = statement(&mut rng, n);
        let proof = prove(&mut rng, NAMESPACE, &bases, &points, &witnesses).unwrap();
        assert_eq!(proof.len(), n);
        verify(&mut rng, NAMESPACE, &bases, &points, &proof).unwrap();

        let decoded = Proof::decode_cfg(proof.encode(), &n).unwrap();
        assert_eq!(decoded, proof);
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(5)]
    #[test_case(10)]
    fn test_flipped_response(n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64 + 100);
        let (bases, points, witnesses) = statement(&mut rng, n);
        let proof = prove(&mut rng, NAMESPACE, &bases, &points, &witnesses).unwrap();
        for i in 0..n {
            let mut tampered = proof.clone();
            tampered.responses[i].add(&Scalar::one());
            assert_eq!(
                verify(&mut rng, NAMESPACE, &bases, &points, &tampered),
                Err(Error::InvalidProof)
            );
        }
    }

    #[test_case(1)]
    #[test_case(5)]
    fn test_wrong_witness(n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64 + 200);
        let (bases, points, mut witnesses) = statement(&mut rng, n);
        witnesses[n - 1] = Scalar::rand(&mut rng);
        let proof = prove(&mut rng, NAMESPACE, &bases, &points, &witnesses).unwrap();
        assert_eq!(
            verify(&mut rng, NAMESPACE, &bases, &points, &proof),
            Err(Error::InvalidProof)
        );
    }

    #[test]
    fn test_namespace_binds() {
        let mut rng = StdRng::seed_from_u64(3);
        let (bases, points, witnesses) = statement(&mut rng, 3);
        let proof = prove(&mut rng, NAMESPACE, &bases, &points, &witnesses).unwrap();
        assert_eq!(
            verify(&mut rng, b"other", &bases, &points, &proof),
            Err(Error::InvalidProof)
        );
    }

    #[test]
    fn test_length_mismatch() {
        let mut rng = StdRng::seed_from_u64(4);
        let (bases, points, witnesses) = statement(&mut rng, 3);
        assert_eq!(
            prove(&mut rng, NAMESPACE, &bases, &points[..2], &witnesses),
            Err(Error::LengthMismatch(3, 2))
        );
        let proof = prove(&mut rng, NAMESPACE, &bases, &points, &witnesses).unwrap();
        assert_eq!(
            verify(&mut rng, NAMESPACE, &bases[..2], &points[..2], &proof),
            Err(Error::LengthMismatch(2, 3))
        );
        assert_eq!(
            prove(&mut rng, NAMESPACE, &[], &[], &[]),
            Err(Error::EmptyStatement)
        );
    }
}
