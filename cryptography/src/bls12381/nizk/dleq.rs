//! Batched proof that two differently-based commitments open to the same exponents.
//!
//! Statement: global bases `(G, H)`, per-index bases `(G_i, H_i)`, and commitments
//! `Z_i = x_i * G + y_i * H`, `Z'_i = x_i * G_i + y_i * H_i`. Witness: `(x_i, y_i)`.
//!
//! The prover samples `(k_i, l_i)`, publishes `A_i = k_i * G + l_i * H` and
//! `A'_i = k_i * G_i + l_i * H_i`, derives one joint challenge `ch`, and responds with
//! `s_i = k_i + ch * x_i` and `t_i = l_i + ch * y_i`.

use super::{batching_scalars, challenge, check_lengths, read_n, Error};
use crate::{
    bls12381::primitives::group::{Element, Point, Scalar, G1},
    transcript::Transcript,
};
use bytes::{Buf, BufMut};
use rand::RngCore;
use yoso_codec::{EncodeSize, Error as CodecError, FixedSize, Read, Write};

/// Transcript namespace for double discrete log equality proofs.
const TRANSCRIPT: &[u8] = b"yoso.bls12381.nizk.dleq";
/// Transcript label for the challenge.
const NOISE: &[u8] = b"dleq-chal";

/// The public statement.
#[derive(Clone, Copy, Debug)]
pub struct Statement<'a> {
    pub g: &'a G1,
    pub h: &'a G1,
    pub g_bases: &'a [G1],
    pub h_bases: &'a [G1],
    pub z: &'a [G1],
    pub z_prime: &'a [G1],
}

impl Statement<'_> {
    fn check(&self, n: usize) -> Result<(), Error> {
        check_lengths(
            n,
            &[
                self.g_bases.len(),
                self.h_bases.len(),
                self.z.len(),
                self.z_prime.len(),
            ],
        )
    }
}

/// A proof over `n` statements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub commitments: Vec<G1>,
    pub commitments_prime: Vec<G1>,
    pub responses_x: Vec<Scalar>,
    pub responses_y: Vec<Scalar>,
}

impl Write for Proof {
    fn write(&self, buf: &mut impl BufMut) {
        for c in self.commitments.iter().chain(&self.commitments_prime) {
            c.write(buf);
        }
        for r in self.responses_x.iter().chain(&self.responses_y) {
            r.write(buf);
        }
    }
}

impl EncodeSize for Proof {
    fn encode_size(&self) -> usize {
        (self.commitments.len() + self.commitments_prime.len()) * G1::SIZE
            + (self.responses_x.len() + self.responses_y.len()) * Scalar::SIZE
    }
}

impl Read for Proof {
    /// The number of statements.
    type Cfg = usize;

    fn read_cfg(buf: &mut impl Buf, n: &usize) -> Result<Self, CodecError> {
        let commitments = read_n(buf, *n)?;
        let commitments_prime = read_n(buf, *n)?;
        let responses_x = read_n(buf, *n)?;
        let responses_y = read_n(buf, *n)?;
        Ok(Self {
            commitments,
            commitments_prime,
            responses_x,
            responses_y,
        })
    }
}

fn derive_challenge(
    namespace: &[u8],
    statement: &Statement<'_>,
    commitments: &[G1],
    commitments_prime: &[G1],
) -> Scalar {
    let mut transcript = Transcript::new(TRANSCRIPT);
    transcript.commit(namespace);
    transcript.commit_encoded([statement.g, statement.h]);
    transcript.commit_encoded(statement.g_bases);
    transcript.commit_encoded(statement.h_bases);
    transcript.commit_encoded(statement.z);
    transcript.commit_encoded(statement.z_prime);
    transcript.commit_encoded(commitments);
    transcript.commit_encoded(commitments_prime);
    challenge(&transcript, NOISE)
}

/// Proves that `(xs[i], ys[i])` opens both `z[i]` and `z_prime[i]`.
pub fn prove<R: RngCore>(
    rng: &mut R,
    namespace: &[u8],
    statement: &Statement<'_>,
    xs: &[Scalar],
    ys: &[Scalar],
) -> Result<Proof, Error> {
    let n = statement.z.len();
    statement.check(n)?;
    check_lengths(n, &[xs.len(), ys.len()])?;

    let ks = (0..n).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
    let ls = (0..n).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
    let commitments = ks
        .iter()
        .zip(&ls)
        .map(|(k, l)| G1::msm(&[*statement.g, *statement.h], &[*k, *l]))
        .collect::<Vec<_>>();
    let commitments_prime = (0..n)
        .map(|i| {
            G1::msm(
                &[statement.g_bases[i], statement.h_bases[i]],
                &[ks[i], ls[i]],
            )
        })
        .collect::<Vec<_>>();
    let ch = derive_challenge(namespace, statement, &commitments, &commitments_prime);
    let respond = |nonces: &[Scalar], witnesses: &[Scalar]| {
        nonces
            .iter()
            .zip(witnesses)
            .map(|(k, x)| {
                let mut resp = *x;
                resp.mul(&ch);
                resp.add(k);
                resp
            })
            .collect::<Vec<_>>()
    };
    Ok(Proof {
        responses_x: respond(&ks, xs),
        responses_y: respond(&ls, ys),
        commitments,
        commitments_prime,
    })
}

/// Verifies `proof` against `statement`.
pub fn verify<R: RngCore>(
    rng: &mut R,
    namespace: &[u8],
    statement: &Statement<'_>,
    proof: &Proof,
) -> Result<(), Error> {
    let n = statement.z.len();
    statement.check(n)?;
    check_lengths(
        n,
        &[
            proof.commitments.len(),
            proof.commitments_prime.len(),
            proof.responses_x.len(),
            proof.responses_y.len(),
        ],
    )?;
    let ch = derive_challenge(
        namespace,
        statement,
        &proof.commitments,
        &proof.commitments_prime,
    );
    let e = batching_scalars(rng, n);
    let f = batching_scalars(rng, n);

    // Fold A_i + ch * Z_i - s_i * G - t_i * H with e_i and
    // A'_i + ch * Z'_i - s_i * G_i - t_i * H_i with f_i.
    let mut msm_points = Vec::with_capacity(6 * n + 2);
    let mut msm_scalars = Vec::with_capacity(6 * n + 2);
    let mut g_scalar = Scalar::zero();
    let mut h_scalar = Scalar::zero();
    for i in 0..n {
        let mut e_ch = e[i];
        e_ch.mul(&ch);
        msm_points.push(proof.commitments[i]);
        msm_scalars.push(e[i]);
        msm_points.push(statement.z[i]);
        msm_scalars.push(e_ch);

        let mut e_s = e[i];
        e_s.mul(&proof.responses_x[i]);
        g_scalar.add(&e_s);
        let mut e_t = e[i];
        e_t.mul(&proof.responses_y[i]);
        h_scalar.add(&e_t);

        let mut f_ch = f[i];
        f_ch.mul(&ch);
        msm_points.push(proof.commitments_prime[i]);
        msm_scalars.push(f[i]);
        msm_points.push(statement.z_prime[i]);
        msm_scalars.push(f_ch);

        let mut f_s = f[i];
        f_s.mul(&proof.responses_x[i]);
        f_s.negate();
        msm_points.push(statement.g_bases[i]);
        msm_scalars.push(f_s);
        let mut f_t = f[i];
        f_t.mul(&proof.responses_y[i]);
        f_t.negate();
        msm_points.push(statement.h_bases[i]);
        msm_scalars.push(f_t);
    }
    g_scalar.negate();
    h_scalar.negate();
    msm_points.push(*statement.g);
    msm_scalars.push(g_scalar);
    msm_points.push(*statement.h);
    msm_scalars.push(h_scalar);

    if !G1::msm(&msm_points, &msm_scalars).is_zero() {
        return Err(Error::InvalidProof);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls12381::pedersen::{Params, VectorParams};
    use rand::{rngs::StdRng, SeedableRng};
    use test_case::test_case;
    use yoso_codec::{Decode, Encode};

    const NAMESPACE: &[u8] = b"test";

    struct Fixture {
        params: Params,
        vector: VectorParams,
        z: Vec<G1>,
        z_prime: Vec<G1>,
        xs: Vec<Scalar>,
        ys: Vec<Scalar>,
    }

    impl Fixture {
        fn new(rng: &mut StdRng, n: usize) -> Self {
            let params = Params::new();
            let vector = VectorParams::new(2 * n);
            let xs = (0..n).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
            let ys = (0..n).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
            let z = (0..n).map(|i| params.commit(&xs[i], &ys[i])).collect();
            let z_prime = (0..n)
                .map(|i| G1::msm(&[*vector.base(i), *vector.base(n + i)], &[xs[i], ys[i]]))
                .collect();
            Self {
                params,
                vector,
                z,
                z_prime,
                xs,
                ys,
            }
        }

        fn statement(&self) -> Statement<'_> {
            let n = self.z.len();
            Statement {
                g: &self.params.g,
                h: &self.params.h,
                g_bases: &self.vector.bases()[..n],
                h_bases: &self.vector.bases()[n..],
                z: &self.z,
                z_prime: &self.z_prime,
            }
        }
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(5)]
    #[test_case(10)]
    fn test_completeness(n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let fixture = Fixture::new(&mut rng, n);
        let statement = fixture.statement();
        let proof = prove(&mut rng, NAMESPACE, &statement, &fixture.xs, &fixture.ys).unwrap();
        verify(&mut rng, NAMESPACE, &statement, &proof).unwrap();

        let decoded = Proof::decode_cfg(proof.encode(), &n).unwrap();
        assert_eq!(decoded, proof);
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(5)]
    #[test_case(10)]
    fn test_flipped_response(n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64 + 100);
        let fixture = Fixture::new(&mut rng, n);
        let statement = fixture.statement();
        let proof = prove(&mut rng, NAMESPACE, &statement, &fixture.xs, &fixture.ys).unwrap();
        for i in 0..n {
            let mut tampered = proof.clone();
            tampered.responses_x[i].add(&Scalar::one());
            assert_eq!(
                verify(&mut rng, NAMESPACE, &statement, &tampered),
                Err(Error::InvalidProof)
            );
            let mut tampered = proof.clone();
            tampered.responses_y[i].add(&Scalar::one());
            assert_eq!(
                verify(&mut rng, NAMESPACE, &statement, &tampered),
                Err(Error::InvalidProof)
            );
        }
    }

    #[test_case(1)]
    #[test_case(5)]
    fn test_mismatched_openings(n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64 + 200);
        let mut fixture = Fixture::new(&mut rng, n);

        // Z' opens to a different x than Z
        let mut other = fixture.xs[0];
        other.add(&Scalar::one());
        fixture.z_prime[0] = G1::msm(
            &[*fixture.vector.base(0), *fixture.vector.base(n)],
            &[other, fixture.ys[0]],
        );
        let statement = fixture.statement();
        let proof = prove(&mut rng, NAMESPACE, &statement, &fixture.xs, &fixture.ys).unwrap();
        assert_eq!(
            verify(&mut rng, NAMESPACE, &statement, &proof),
            Err(Error::InvalidProof)
        );
    }

    #[test]
    fn test_length_mismatch() {
        let mut rng = StdRng::seed_from_u64(3);
        let fixture = Fixture::new(&mut rng, 3);
        let mut statement = fixture.statement();
        statement.z_prime = &fixture.z_prime[..2];
        assert_eq!(
            prove(&mut rng, NAMESPACE, &statement, &fixture.xs, &fixture.ys),
            Err(Error::LengthMismatch(3, 2))
        );
        let statement = fixture.statement();
        let mut proof =
            prove(&mut rng, NAMESPACE, &statement, &fixture.xs, &fixture.ys).unwrap();
        proof.responses_y.pop();
        assert_eq!(
            verify(&mut rng, NAMESPACE, &statement, &proof),
            Err(Error::LengthMismatch(3, 2))
        );
    }
}
