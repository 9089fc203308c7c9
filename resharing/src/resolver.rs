//! Resolution phase: disclose the rows verifiers complained about.
//!
//! Each resolver reveals its key share of `eps_k` for every complaint verifier `k` made against a
//! valid dealer. Everyone then keeps the revealed shares that match the dealer's published
//! digests, recovers `eps_k` from any `D + 1` of them, and decrypts the row. A dealer is
//! disqualified if a row cannot be recovered or does not match its commitments.

use crate::{
    context::Context,
    dealer::{self, Dealings},
    eps,
    types::{Reveal, Resolution, Row},
    verifier::Verifications,
    Error,
};
use rayon::prelude::*;
use tracing::{debug, warn};
use yoso_cryptography::{bls12381::primitives::poly::Eval, encryption::sealed};
use zeroize::Zeroize;

/// Builds the resolution of resolver `resolver` (who holds `key`).
///
/// Nothing is revealed for a dealer whose key shares cannot be opened.
pub fn resolve(
    ctx: &Context,
    key: &sealed::PrivateKey,
    resolver: u32,
    dealings: &Dealings,
    verifications: &Verifications,
) -> Resolution {
    let mut reveals = Vec::new();
    for (i, dealing) in dealings.valid() {
        let complainers = verifications
            .valid()
            .filter(|(_, v)| v.complaints.get(i as usize).copied().unwrap_or(false))
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        if complainers.is_empty() {
            continue;
        }
        let Some(ciphertext) = dealing.enc_eps.get(resolver as usize) else {
            continue;
        };
        let Some(mut shares) = eps::open_shares(ctx, key, ciphertext) else {
            warn!(resolver, dealer = i, "unable to open key shares");
            continue;
        };
        for k in complainers {
            reveals.push(Reveal {
                dealer: i,
                verifier: k,
                share: shares[k as usize],
            });
        }
        shares.zeroize();
    }
    debug!(resolver, reveals = reveals.len(), "resolved");
    Resolution { reveals }
}

/// Outcome of the resolution phase, identical at every party.
#[derive(Clone, Debug)]
pub struct Resolved {
    n: usize,
    rows: Vec<Option<Row>>,
    disqualified: Vec<bool>,
}

impl Resolved {
    /// Returns the disclosed row dealer `dealer` sent verifier `verifier`, if any.
    pub fn row(&self, dealer: u32, verifier: u32) -> Option<&Row> {
        if verifier as usize >= self.n {
            return None;
        }
        self.rows
            .get(dealer as usize * self.n + verifier as usize)?
            .as_ref()
    }

    /// Returns whether `dealer` failed to answer a complaint.
    pub fn is_disqualified(&self, dealer: u32) -> bool {
        self.disqualified
            .get(dealer as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Returns the dealers that failed to answer a complaint.
    pub fn disqualified(&self) -> impl Iterator<Item = u32> + '_ {
        self.disqualified
            .iter()
            .enumerate()
            .filter(|(_, d)| **d)
            .map(|(i, _)| i as u32)
    }
}

/// Recovers the row of verifier `verifier` from the shares revealed for `dealer`.
fn recover_row(
    ctx: &Context,
    dealings: &Dealings,
    resolutions: &[Option<Resolution>],
    dealer: u32,
    verifier: u32,
) -> Option<Row> {
    let dealing = dealings.get(dealer)?;
    let mut evals = Vec::new();
    for (r, resolution) in resolutions.iter().enumerate() {
        let Some(resolution) = resolution else {
            continue;
        };
        let Some(reveal) = resolution
            .reveals
            .iter()
            .find(|reveal| reveal.dealer == dealer && reveal.verifier == verifier)
        else {
            continue;
        };
        if dealing.hash_eps.get(verifier as usize, r) != Some(&eps::hash(ctx, &reveal.share)) {
            warn!(resolver = r, dealer, verifier, "revealed share does not match");
            continue;
        }
        evals.push(Eval {
            index: r as u32,
            value: reveal.share,
        });
    }
    if evals.len() < ctx.threshold() as usize {
        return None;
    }
    let eps = eps::reconstruct_key(ctx, &evals).ok()?;
    let ciphertext = dealing.enc_res.get(verifier as usize)?;
    let row = eps::open_row(ctx, &eps, ciphertext)?;
    dealer::check_row(ctx, dealing, verifier, &row).then_some(row)
}

/// Resolves every complaint made by a valid verifier against a valid dealer.
pub fn resolve_complaints(
    ctx: &Context,
    dealings: &Dealings,
    verifications: &Verifications,
    resolutions: &[Option<Resolution>],
) -> Result<Resolved, Error> {
    let n = ctx.n() as usize;
    let pool = ctx.pool();
    let outcomes = pool.install(|| {
        (0..dealings.len() as u32)
            .into_par_iter()
            .map(|i| {
                let mut rows = vec![None; n];
                if dealings.get(i).is_none() {
                    return (rows, false);
                }
                for (k, verification) in verifications.valid() {
                    if !verification.complaints.get(i as usize).copied().unwrap_or(false) {
                        continue;
                    }
                    match recover_row(ctx, dealings, resolutions, i, k) {
                        Some(row) => rows[k as usize] = Some(row),
                        None => {
                            warn!(dealer = i, verifier = k, "unable to resolve complaint");
                            return (rows, true);
                        }
                    }
                }
                (rows, false)
            })
            .collect::<Vec<_>>()
    });

    let mut rows = Vec::with_capacity(dealings.len() * n);
    let mut disqualified = Vec::with_capacity(dealings.len());
    for (dealer_rows, dealer_disqualified) in outcomes {
        rows.extend(dealer_rows);
        disqualified.push(dealer_disqualified);
    }
    Ok(Resolved {
        n,
        rows,
        disqualified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mocks::Fixture, types::Dealing, verifier};
    use rand::{rngs::StdRng, SeedableRng};
    use yoso_cryptography::bls12381::primitives::group::{Element, Scalar};

    struct Setup {
        fixture: Fixture,
        dealings: Dealings,
        verifications: Verifications,
    }

    /// Deals with every dealer (after `tamper`) and runs every verifier.
    fn setup(seed: u64, tamper: impl Fn(u32, &mut Dealing)) -> Setup {
        let fixture = Fixture::new(4, 1, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let ctx = fixture.context();
        let dealings = (0..4)
            .map(|i| {
                let mut dealing = fixture.deal(&mut rng, i);
                tamper(i, &mut dealing);
                Some(dealing)
            })
            .collect();
        let dealings = dealer::collect(ctx, &mut rng, dealings).unwrap();
        let verifications = ctx
            .committees()
            .verification
            .iter()
            .enumerate()
            .map(|(k, party)| {
                verifier::verify(ctx, &mut rng, fixture.private(*party), k as u32, &dealings).ok()
            })
            .collect();
        let verifications = verifier::collect(ctx, &mut rng, &dealings, verifications).unwrap();
        Setup {
            fixture,
            dealings,
            verifications,
        }
    }

    fn resolutions(setup: &Setup) -> Vec<Option<Resolution>> {
        let ctx = setup.fixture.context();
        ctx.committees()
            .resolution
            .iter()
            .enumerate()
            .map(|(r, party)| {
                Some(resolve(
                    ctx,
                    setup.fixture.private(*party),
                    r as u32,
                    &setup.dealings,
                    &setup.verifications,
                ))
            })
            .collect()
    }

    #[test]
    fn test_nothing_to_resolve() {
        let setup = setup(0, |_, _| {});
        let resolutions = resolutions(&setup);
        assert!(resolutions.iter().flatten().all(|r| r.reveals.is_empty()));
        let ctx = setup.fixture.context();
        let resolved =
            resolve_complaints(ctx, &setup.dealings, &setup.verifications, &resolutions).unwrap();
        assert_eq!(resolved.disqualified().count(), 0);
        assert!(resolved.row(0, 0).is_none());
    }

    #[test]
    fn test_resolves_complaint() {
        // Dealer 1 seals verifier 2's row to verifier 3
        let setup = setup(1, |i, dealing| {
            if i == 1 {
                dealing.enc_ver[2] = dealing.enc_ver[3].clone();
            }
        });
        let ctx = setup.fixture.context();
        assert_eq!(
            setup.verifications.get(2).unwrap().complaints,
            vec![false, true, false, false]
        );
        let mut resolutions = resolutions(&setup);
        for resolution in resolutions.iter().flatten() {
            assert_eq!(
                resolution
                    .reveals
                    .iter()
                    .map(|r| (r.dealer, r.verifier))
                    .collect::<Vec<_>>(),
                [(1, 2)]
            );
        }

        // A lying resolver and a silent resolver leave D + 1 matching shares
        resolutions[0].as_mut().unwrap().reveals[0].share.add(&Scalar::one());
        resolutions[3] = None;
        let resolved =
            resolve_complaints(ctx, &setup.dealings, &setup.verifications, &resolutions).unwrap();
        assert!(!resolved.is_disqualified(1));
        let row = resolved.row(1, 2).unwrap();
        assert!(dealer::check_row(ctx, setup.dealings.get(1).unwrap(), 2, row));
        assert!(resolved.row(1, 3).is_none());
    }

    #[test]
    fn test_insufficient_reveals() {
        let setup = setup(2, |i, dealing| {
            if i == 0 {
                dealing.enc_ver[1] = dealing.enc_ver[0].clone();
            }
        });
        let ctx = setup.fixture.context();
        let mut resolutions = resolutions(&setup);
        for resolution in resolutions.iter_mut().skip(1) {
            *resolution = None;
        }
        let resolved =
            resolve_complaints(ctx, &setup.dealings, &setup.verifications, &resolutions).unwrap();
        assert_eq!(resolved.disqualified().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn test_disqualifies_bad_row() {
        // Dealer 3 withholds verifier 0's row and protects the wrong row for disclosure
        let setup = setup(3, |i, dealing| {
            if i == 3 {
                dealing.enc_ver[0] = dealing.enc_ver[1].clone();
                dealing.enc_res[0] = dealing.enc_res[1].clone();
            }
        });
        let ctx = setup.fixture.context();
        let resolutions = resolutions(&setup);
        let resolved =
            resolve_complaints(ctx, &setup.dealings, &setup.verifications, &resolutions).unwrap();
        assert!(resolved.is_disqualified(3));
        assert!(!resolved.is_disqualified(0));
    }
}
