//! Verification phase: check the rows received from dealers and forward them to the next holders.

use crate::{
    context::Context,
    dealer::{self, Dealings},
    proof,
    types::{Row, Verification},
    Error,
};
use bytes::Bytes;
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};
use yoso_codec::{Decode, Encode};
use yoso_cryptography::encryption::sealed;
use zeroize::Zeroize;

/// Suffix of the namespace used to seal forwarded columns.
const FORWARD_SUFFIX: &[u8] = b"_VERIFIER_FORWARD";

/// Checks the row every valid dealing sealed to verifier `verifier` (who holds `key`) and
/// forwards the accepted rows, column by column, to the next holders.
///
/// A dealer is complained about if its dealing is invalid or its row cannot be opened or
/// does not match its commitments. Fails with [Error::NoQualifiedDealers] if every dealer
/// is complained about.
pub fn verify<R: RngCore + CryptoRng>(
    ctx: &Context,
    rng: &mut R,
    key: &sealed::PrivateKey,
    verifier: u32,
    dealings: &Dealings,
) -> Result<Verification, Error> {
    let mut complaints = Vec::with_capacity(dealings.len());
    let mut rows = Vec::new();
    for i in 0..dealings.len() as u32 {
        let row = dealings.get(i).and_then(|dealing| {
            let row = dealer::open(ctx, key, dealing, verifier)?;
            dealer::check_row(ctx, dealing, verifier, &row).then_some(row)
        });
        match row {
            Some(row) => {
                complaints.push(false);
                rows.push(row);
            }
            None => {
                warn!(verifier, dealer = i, "complaint");
                complaints.push(true);
            }
        }
    }
    if rows.is_empty() {
        return Err(Error::NoQualifiedDealers);
    }

    // Bind the forwarded columns to the dealers' commitments
    let proof = proof::prove(
        ctx,
        rng,
        verifier,
        &complaints,
        &rows.iter().collect::<Vec<_>>(),
    )?;

    // Forward column l to next holder l
    let namespace = ctx.label(FORWARD_SUFFIX);
    let mut enc_shares = Vec::with_capacity(ctx.n() as usize);
    for (l, holder) in ctx.committees().next.iter().enumerate() {
        let mut column = Row {
            values: rows.iter().map(|row| row.values[l]).collect(),
            blindings: rows.iter().map(|row| row.blindings[l]).collect(),
        };
        let mut plaintext = column.encode();
        let sealed = sealed::seal(rng, ctx.key(*holder), &namespace, &plaintext);
        plaintext.fill(0);
        column.zeroize();
        enc_shares.push(Bytes::from(sealed?));
    }
    debug!(verifier, accepted = rows.len(), "verified");
    rows.zeroize();

    Ok(Verification {
        complaints,
        proof,
        enc_shares,
    })
}

/// Opens the column a verifier forwarded to next holder `holder` (`None` if it cannot be
/// decrypted or does not hold one entry per accepted dealer).
pub fn open(
    ctx: &Context,
    key: &sealed::PrivateKey,
    verification: &Verification,
    holder: u32,
) -> Option<Row> {
    let ciphertext = verification.enc_shares.get(holder as usize)?;
    let mut plaintext = sealed::open(key, &ctx.label(FORWARD_SUFFIX), ciphertext).ok()?;
    let accepted = verification.complaints.iter().filter(|c| !**c).count();
    let column = Row::decode_cfg(plaintext.as_slice(), &accepted).ok();
    plaintext.zeroize();
    column
}

/// The verifications of a round, indexed by verifier. A verification that is missing or
/// whose proof does not check against the dealings is ignored by every party.
#[derive(Clone, Debug, Default)]
pub struct Verifications(Vec<Option<Verification>>);

impl Verifications {
    /// Returns the number of verifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are no verifiers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the verification of `verifier` if its proof checked.
    pub fn get(&self, verifier: u32) -> Option<&Verification> {
        self.0.get(verifier as usize)?.as_ref()
    }

    /// Returns an iterator over the verifications whose proof checked.
    pub fn valid(&self) -> impl Iterator<Item = (u32, &Verification)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(k, verification)| Some((k as u32, verification.as_ref()?)))
    }
}

/// Checks every received verification (`verifications[k]` from verifier `k`), in parallel.
pub fn collect<R: RngCore>(
    ctx: &Context,
    rng: &mut R,
    dealings: &Dealings,
    verifications: Vec<Option<Verification>>,
) -> Result<Verifications, Error> {
    let seeds = verifications
        .iter()
        .map(|_| {
            let mut seed = <StdRng as SeedableRng>::Seed::default();
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect::<Vec<_>>();
    let pool = ctx.pool();
    let checked = pool.install(|| {
        verifications
            .into_par_iter()
            .zip(seeds)
            .enumerate()
            .map(|(k, (verification, seed))| {
                let verification = verification?;
                let mut rng = StdRng::from_seed(seed);
                let valid = proof::verify(
                    ctx,
                    &mut rng,
                    dealings,
                    k as u32,
                    &verification.complaints,
                    &verification.proof,
                );
                if !valid {
                    warn!(verifier = k, "invalid verification");
                }
                valid.then_some(verification)
            })
            .collect::<Vec<_>>()
    });
    Ok(Verifications(checked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::Fixture;
    use yoso_cryptography::bls12381::primitives::group::{Element, Scalar, G1};

    fn dealings(
        fixture: &Fixture,
        rng: &mut StdRng,
        dealings: Vec<Option<crate::types::Dealing>>,
    ) -> Dealings {
        dealer::collect(fixture.context(), rng, dealings).unwrap()
    }

    #[test]
    fn test_verify_honest() {
        let fixture = Fixture::new(4, 1, 0);
        let mut rng = StdRng::seed_from_u64(0);
        let ctx = fixture.context();
        let all = (0..4).map(|i| Some(fixture.deal(&mut rng, i))).collect();
        let dealings = dealings(&fixture, &mut rng, all);

        let verifications = ctx
            .committees()
            .verification
            .iter()
            .enumerate()
            .map(|(k, party)| {
                verify(ctx, &mut rng, fixture.private(*party), k as u32, &dealings).ok()
            })
            .collect::<Vec<_>>();
        for verification in verifications.iter().flatten() {
            assert_eq!(verification.complaints, vec![false; 4]);
            assert_eq!(verification.accepted(), vec![0, 1, 2, 3]);
        }
        let verifications = collect(ctx, &mut rng, &dealings, verifications).unwrap();
        assert_eq!(verifications.valid().count(), 4);

        // Next holder l receives entry l of every accepted row from each verifier
        for (k, verification) in verifications.valid() {
            for (l, party) in ctx.committees().next.iter().enumerate() {
                let column = open(ctx, fixture.private(*party), verification, l as u32).unwrap();
                assert_eq!(column.len(), 4);
                assert!(proof::verify_forwarded(
                    ctx,
                    k,
                    &verification.complaints,
                    &verification.proof,
                    l as u32,
                    &column
                ));
                for (i, dealing) in dealings.valid() {
                    let share = column.share(i as usize, k);
                    let mut commitments = vec![dealing.com_z[l]];
                    commitments.extend(dealing.com_s.row(l).unwrap());
                    assert!(ctx.vss().verify_share(&commitments, &share));
                }
            }
        }
    }

    #[test]
    fn test_complaints() {
        let fixture = Fixture::new(4, 1, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = fixture.context();

        // Dealer 1 seals verifier 2's row to verifier 3; dealer 3 is missing
        let mut bad = fixture.deal(&mut rng, 1);
        bad.enc_ver[2] = bad.enc_ver[3].clone();
        let all = vec![
            Some(fixture.deal(&mut rng, 0)),
            Some(bad),
            Some(fixture.deal(&mut rng, 2)),
            None,
        ];
        let dealings = dealings(&fixture, &mut rng, all);
        assert_eq!(dealings.valid().count(), 3);

        let party = ctx.committees().verification[2];
        let verification = verify(ctx, &mut rng, fixture.private(party), 2, &dealings).unwrap();
        assert_eq!(verification.complaints, vec![false, true, false, true]);
        assert_eq!(verification.accepted(), vec![0, 2]);
        let party = ctx.committees().verification[0];
        let other = verify(ctx, &mut rng, fixture.private(party), 0, &dealings).unwrap();
        assert_eq!(other.complaints, vec![false, false, false, true]);

        let verifications =
            collect(ctx, &mut rng, &dealings, vec![Some(other), None, Some(verification), None])
                .unwrap();
        assert!(verifications.get(0).is_some());
        assert!(verifications.get(2).is_some());
        assert_eq!(verifications.valid().count(), 2);
    }

    #[test]
    fn test_no_qualified_dealers() {
        let fixture = Fixture::new(4, 1, 2);
        let mut rng = StdRng::seed_from_u64(2);
        let ctx = fixture.context();
        let dealings = dealings(&fixture, &mut rng, vec![None; 4]);
        let party = ctx.committees().verification[0];
        assert!(matches!(
            verify(ctx, &mut rng, fixture.private(party), 0, &dealings),
            Err(Error::NoQualifiedDealers)
        ));
    }

    #[test]
    fn test_rejects_lying_verifier() {
        let fixture = Fixture::new(4, 1, 3);
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = fixture.context();
        let all = (0..4).map(|i| Some(fixture.deal(&mut rng, i))).collect();
        let dealings = dealings(&fixture, &mut rng, all);
        let party = ctx.committees().verification[1];
        let honest = verify(ctx, &mut rng, fixture.private(party), 1, &dealings).unwrap();

        // Claiming to accept a dealer it complained about breaks the proof
        let mut flipped = honest.clone();
        flipped.complaints[0] = true;
        assert!(!proof::verify(
            ctx,
            &mut rng,
            &dealings,
            1,
            &flipped.complaints,
            &flipped.proof
        ));

        // Tampering with a commitment breaks the proof
        let mut tampered = honest.clone();
        tampered.proof.com_r[0].add(&G1::one());
        assert!(!proof::verify(
            ctx,
            &mut rng,
            &dealings,
            1,
            &tampered.complaints,
            &tampered.proof
        ));

        // A proof for one verifier does not check as another's
        let verifications = collect(
            ctx,
            &mut rng,
            &dealings,
            vec![Some(honest.clone()), Some(honest.clone()), Some(honest), None],
        )
        .unwrap();
        assert_eq!(
            verifications.valid().map(|(k, _)| k).collect::<Vec<_>>(),
            [1]
        );

        // Values forwarded to a holder must match what was committed to
        let party = ctx.committees().verification[1];
        let verification = verify(ctx, &mut rng, fixture.private(party), 1, &dealings).unwrap();
        let holder = ctx.committees().next[0];
        let mut column = open(ctx, fixture.private(holder), &verification, 0).unwrap();
        column.values[0].add(&Scalar::one());
        assert!(!proof::verify_forwarded(
            ctx,
            1,
            &verification.complaints,
            &verification.proof,
            0,
            &column
        ));
    }
}
