//! Refresh phase: derive the next commitments and shares from the qualified dealings.
//!
//! The first `D + 1` dealers that survived resolution and a majority of audits are combined
//! with their Lagrange weights at `0`, so the shared secret and blinding are unchanged.

use crate::{
    context::Context,
    dealer::Dealings,
    proof,
    resolver::Resolved,
    types::{Audit, Row},
    verifier::{self, Verifications},
    Error,
};
use tracing::{debug, info, warn};
use yoso_cryptography::{
    bls12381::{
        primitives::{
            group::{Point, Scalar, G1},
            poly,
        },
        vss::Share,
    },
    encryption::sealed,
};
use zeroize::Zeroize;

/// The dealers whose sharings make up the next sharing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Qualified {
    /// The first `D + 1` qualified dealers, in index order.
    pub dealers: Vec<u32>,
    /// Lagrange weight at `0` of each dealer.
    pub weights: Vec<Scalar>,
}

/// Selects the dealers to combine.
///
/// A dealer qualifies if its dealing is valid, it answered every complaint, and strictly more
/// than half of the auditing committee marked it qualified. Fails if fewer than `D + 1` qualify.
pub fn qualified_dealers(
    ctx: &Context,
    dealings: &Dealings,
    resolved: &Resolved,
    audits: &[Option<Audit>],
) -> Result<Qualified, Error> {
    let majority = ctx.committees().auditing.len() / 2;
    let threshold = ctx.threshold() as usize;
    let mut dealers = Vec::with_capacity(threshold);
    for (i, _) in dealings.valid() {
        if resolved.is_disqualified(i) {
            continue;
        }
        let votes = audits
            .iter()
            .flatten()
            .filter(|audit| audit.qualified.get(i as usize).copied().unwrap_or(false))
            .count();
        if votes <= majority {
            warn!(dealer = i, votes, "not qualified by audit");
            continue;
        }
        dealers.push(i);
        if dealers.len() == threshold {
            break;
        }
    }
    if dealers.len() < threshold {
        return Err(Error::NotEnoughQualifiedDealers(threshold, dealers.len()));
    }
    let weights = poly::compute_weights(&dealers)?;
    info!(?dealers, "qualified dealers");
    Ok(Qualified { dealers, weights })
}

/// Computes the `N + 1` commitments of the next sharing: the unchanged commitment to the
/// secret followed by the combined commitment of each next holder.
pub fn refresh_commitments(
    ctx: &Context,
    dealings: &Dealings,
    qualified: &Qualified,
) -> Result<Vec<G1>, Error> {
    let mut commitments = Vec::with_capacity(ctx.n() as usize + 1);
    commitments.push(ctx.commitments()[0]);
    for l in 0..ctx.n() as usize {
        let points = qualified
            .dealers
            .iter()
            .map(|i| {
                dealings
                    .get(*i)
                    .and_then(|dealing| dealing.com_z.get(l).copied())
                    .ok_or(Error::UnknownDealer(*i))
            })
            .collect::<Result<Vec<_>, _>>()?;
        commitments.push(G1::msm(&points, &qualified.weights));
    }
    Ok(commitments)
}

/// A column forwarded by a verifier that passed the holder's checks.
struct Forwarded {
    accepted: Vec<u32>,
    column: Row,
}

/// Opens and checks the column every valid verifier forwarded to next holder `holder`.
fn forwarded(
    ctx: &Context,
    key: &sealed::PrivateKey,
    holder: u32,
    verifications: &Verifications,
) -> Vec<Option<Forwarded>> {
    (0..ctx.n())
        .map(|k| {
            let verification = verifications.get(k)?;
            let column = verifier::open(ctx, key, verification, holder)?;
            if !proof::verify_forwarded(
                ctx,
                k,
                &verification.complaints,
                &verification.proof,
                holder,
                &column,
            ) {
                warn!(holder, verifier = k, "invalid forwarded column");
                return None;
            }
            Some(Forwarded {
                accepted: verification.accepted(),
                column,
            })
        })
        .collect()
}

/// Reconstructs the share of next holder `holder` (who holds `key`).
///
/// For every qualified dealer, the second-level shares of the holder's first-level share are
/// taken from the rows disclosed during resolution or else from the columns forwarded by the
/// verifiers, and the first-level share is reconstructed from those that open the dealer's
/// commitments.
pub fn refresh_share(
    ctx: &Context,
    key: &sealed::PrivateKey,
    holder: u32,
    dealings: &Dealings,
    verifications: &Verifications,
    resolved: &Resolved,
    qualified: &Qualified,
) -> Result<Share, Error> {
    let l = holder as usize;
    let mut forwarded = forwarded(ctx, key, holder, verifications);
    let mut values = Vec::with_capacity(qualified.dealers.len());
    let mut blindings = Vec::with_capacity(qualified.dealers.len());
    for i in &qualified.dealers {
        let dealing = dealings.get(*i).ok_or(Error::UnknownDealer(*i))?;
        let mut shares = (0..ctx.n())
            .filter_map(|k| {
                if let Some(row) = resolved.row(*i, k) {
                    return Some(row.share(l, k));
                }
                let entry = forwarded[k as usize].as_ref()?;
                let position = entry.accepted.iter().position(|a| a == i)?;
                Some(entry.column.share(position, k))
            })
            .collect::<Vec<_>>();
        let mut commitments = Vec::with_capacity(ctx.n() as usize + 1);
        commitments.push(dealing.com_z[l]);
        commitments.extend(dealing.com_s.row(l).into_iter().flatten());
        let result = ctx.vss().reconstruct(&commitments, &shares);
        shares.zeroize();
        let (value, blinding) = result.map_err(|err| Error::Reconstruction(*i, err))?;
        values.push(value);
        blindings.push(blinding);
    }
    for entry in forwarded.iter_mut().flatten() {
        entry.column.zeroize();
    }

    let share = Share {
        index: holder,
        value: poly::recover_with_weights(&qualified.weights, &values),
        blinding: poly::recover_with_weights(&qualified.weights, &blindings),
    };
    values.zeroize();
    blindings.zeroize();
    debug!(holder, "refreshed share");
    Ok(share)
}
