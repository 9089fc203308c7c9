//! Future broadcast of each verifier's row.
//!
//! For every verifier `k`, the dealer samples a one-time seed `eps_k`, encrypts row `k + 1` under
//! a key derived from it, shares `eps_k` among the resolution committee with degree `D`, and
//! publishes the digest of every key share. The row stays hidden unless `D + 1` resolvers reveal
//! their shares, and a resolver cannot reveal a share other than the one it was dealt.

use crate::{
    context::Context,
    types::{Digest, Row},
    Error,
};
use bytes::Bytes;
use rand::{CryptoRng, RngCore};
use sha2::{Digest as _, Sha256};
use yoso_codec::{Decode, Encode, RangeCfg};
use yoso_cryptography::{
    bls12381::primitives::{
        group::Scalar,
        matrix::Matrix,
        poly::{self, Eval, Poly},
    },
    encryption::{sealed, symmetric},
};
use zeroize::Zeroize;

/// Suffix of the namespace used to encrypt rows.
const ROW_SUFFIX: &[u8] = b"_EPS_ROW";

/// Suffix of the namespace used to seal key shares.
const SHARES_SUFFIX: &[u8] = b"_EPS_SHARES";

/// Suffix of the namespace used to hash key shares.
const HASH_SUFFIX: &[u8] = b"_EPS_HASH";

/// Everything a dealer publishes to delay the disclosure of its rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Material {
    /// `enc_res[k]`: row `k + 1` encrypted under `eps_k`.
    pub enc_res: Vec<Bytes>,
    /// `enc_eps[r]`: the shares of every `eps_k` dealt to resolver `r`, sealed to it.
    pub enc_eps: Vec<Bytes>,
    /// `hash_eps[k][r]`: digest of resolver `r`'s share of `eps_k`.
    pub hash_eps: Matrix<Digest>,
}

/// Computes the digest published for a key share.
pub fn hash(ctx: &Context, share: &Scalar) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(ctx.label(HASH_SUFFIX));
    hasher.update(share.encode());
    hasher.finalize().into()
}

/// Protects `rows[k]` (the row of verifier `k`) for every verifier.
pub fn generate<R: RngCore + CryptoRng>(
    ctx: &Context,
    rng: &mut R,
    rows: &[Row],
) -> Result<Material, Error> {
    let n = ctx.n() as usize;
    let row_namespace = ctx.label(ROW_SUFFIX);

    // shares[k][r] is resolver r's share of eps_k
    let mut enc_res = Vec::with_capacity(n);
    let mut shares = Vec::with_capacity(n);
    for row in rows {
        let mut eps = Scalar::rand(rng);
        let mut ikm = eps.encode().to_vec();
        let ciphertext = symmetric::encrypt(&ikm, &row_namespace, &row.encode());
        ikm.zeroize();
        enc_res.push(Bytes::from(ciphertext?));

        let mut polynomial = poly::new_with_constant(ctx.degree(), rng, eps);
        shares.push(
            (0..ctx.n())
                .map(|r| polynomial.evaluate(r).value)
                .collect::<Vec<_>>(),
        );
        polynomial.zeroize();
        eps.zeroize();
    }

    let hash_eps = Matrix::from_fn(n, n, |k, r| hash(ctx, &shares[k][r]));
    let shares_namespace = ctx.label(SHARES_SUFFIX);
    let mut enc_eps = Vec::with_capacity(n);
    for (r, resolver) in ctx.committees().resolution.iter().enumerate() {
        let mut package = shares.iter().map(|s| s[r]).collect::<Vec<_>>();
        let sealed = sealed::seal(
            rng,
            ctx.key(*resolver),
            &shares_namespace,
            &package.encode(),
        );
        package.zeroize();
        enc_eps.push(Bytes::from(sealed?));
    }
    shares.zeroize();

    Ok(Material {
        enc_res,
        enc_eps,
        hash_eps,
    })
}

/// Opens the key shares a dealer sealed to a resolver (one per verifier).
pub fn open_shares(
    ctx: &Context,
    key: &sealed::PrivateKey,
    ciphertext: &[u8],
) -> Option<Vec<Scalar>> {
    let plaintext = sealed::open(key, &ctx.label(SHARES_SUFFIX), ciphertext).ok()?;
    let n = ctx.n() as usize;
    Vec::<Scalar>::decode_cfg(plaintext.as_slice(), &(RangeCfg::exact(n), ())).ok()
}

/// Recovers `eps` from at least `D + 1` key shares.
pub fn reconstruct_key(ctx: &Context, shares: &[Eval<Scalar>]) -> Result<Scalar, Error> {
    Ok(Poly::recover(ctx.threshold(), shares)?)
}

/// Decrypts the row protected by `eps`.
pub fn open_row(ctx: &Context, eps: &Scalar, ciphertext: &[u8]) -> Option<Row> {
    let mut ikm = eps.encode().to_vec();
    let plaintext = symmetric::decrypt(&ikm, &ctx.label(ROW_SUFFIX), ciphertext);
    ikm.zeroize();
    Row::decode_cfg(plaintext.ok()?.as_slice(), &(ctx.n() as usize)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::Fixture;
    use rand::{rngs::StdRng, SeedableRng};

    fn rows(rng: &mut StdRng, n: usize) -> Vec<Row> {
        (0..n)
            .map(|_| Row {
                values: (0..n).map(|_| Scalar::rand(rng)).collect(),
                blindings: (0..n).map(|_| Scalar::rand(rng)).collect(),
            })
            .collect()
    }

    #[test]
    fn test_generate_and_recover() {
        let fixture = Fixture::new(5, 2, 0);
        let ctx = fixture.context();
        let mut rng = StdRng::seed_from_u64(1);
        let rows = rows(&mut rng, 5);
        let material = generate(ctx, &mut rng, &rows).unwrap();
        assert_eq!(material.enc_res.len(), 5);
        assert_eq!(material.enc_eps.len(), 5);

        // Every resolver opens its package and the shares match the published digests
        let packages = ctx
            .committees()
            .resolution
            .iter()
            .enumerate()
            .map(|(r, party)| {
                let shares =
                    open_shares(ctx, fixture.private(*party), &material.enc_eps[r]).unwrap();
                for (k, share) in shares.iter().enumerate() {
                    assert_eq!(material.hash_eps.get(k, r), Some(&hash(ctx, share)));
                }
                shares
            })
            .collect::<Vec<_>>();

        // Any D + 1 resolvers recover each row
        for (k, row) in rows.iter().enumerate() {
            let evals = [4u32, 1, 3]
                .iter()
                .map(|r| Eval {
                    index: *r,
                    value: packages[*r as usize][k],
                })
                .collect::<Vec<_>>();
            let eps = reconstruct_key(ctx, &evals).unwrap();
            assert_eq!(open_row(ctx, &eps, &material.enc_res[k]).as_ref(), Some(row));
        }
    }

    #[test]
    fn test_insufficient_shares() {
        let fixture = Fixture::new(5, 2, 2);
        let ctx = fixture.context();
        let evals = (0..2)
            .map(|index| Eval {
                index,
                value: Scalar::rand(&mut StdRng::seed_from_u64(index as u64)),
            })
            .collect::<Vec<_>>();
        assert!(matches!(reconstruct_key(ctx, &evals), Err(Error::Poly(_))));
    }

    #[test]
    fn test_wrong_key() {
        let fixture = Fixture::new(4, 1, 3);
        let ctx = fixture.context();
        let mut rng = StdRng::seed_from_u64(4);
        let rows = rows(&mut rng, 4);
        let material = generate(ctx, &mut rng, &rows).unwrap();
        let wrong = Scalar::rand(&mut rng);
        assert!(open_row(ctx, &wrong, &material.enc_res[0]).is_none());

        // A package sealed to resolver 0 cannot be opened by resolver 1
        let other = ctx.committees().resolution[1];
        assert!(open_shares(ctx, fixture.private(other), &material.enc_eps[0]).is_none());
    }
}
