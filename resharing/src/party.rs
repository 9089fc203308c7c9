//! Drive a party through every phase of a round.
//!
//! A round spans five broadcast rounds (dealing, verification, resolution, witness, auditing)
//! followed by a local refresh. Every party participates in every broadcast round: members of
//! the committee active in a phase broadcast their message and every other party broadcasts an
//! empty message. A member whose phase fails also broadcasts an empty message, which the other
//! parties treat like a missing one.

use crate::{
    auditor,
    committee::Roles,
    context::Context,
    dealer, refresh, resolver,
    types::{self, Audit, Dealing, Resolution, Verification, Witness},
    verifier, witness, Error,
};
use bytes::Bytes;
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use yoso_broadcast::Broadcast;
use yoso_codec::Encode;
use yoso_cryptography::{
    bls12381::{primitives::group::G1, vss::Share},
    encryption::sealed,
};
use zeroize::Zeroize;

/// Result of a round at one party.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    /// Commitments to the secret (`[0]`, unchanged) and to each next holder's share.
    pub commitments: Vec<G1>,
    /// The party's share as a member of the next committee.
    pub share: Option<Share>,
}

/// One participant of a round.
pub struct Party {
    ctx: Context,
    index: u32,
    key: sealed::PrivateKey,
    share: Option<Share>,
    roles: Roles,
}

impl Party {
    /// Creates party `index`, holding encryption key `key` and (if it is a dealer) `share`.
    pub fn new(
        ctx: Context,
        index: u32,
        key: sealed::PrivateKey,
        share: Option<Share>,
    ) -> Result<Self, Error> {
        if index as usize >= ctx.parties() {
            return Err(Error::InvalidCommittees("unknown party"));
        }
        let roles = ctx.committees().roles(index);
        if roles.dealer().is_some() && share.is_none() {
            return Err(Error::MissingShare);
        }
        Ok(Self {
            ctx,
            index,
            key,
            share,
            roles,
        })
    }

    /// Returns every role of the party in this round.
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Runs the round over `broadcast`.
    ///
    /// Fails if the broadcast fails or too few dealers qualify.
    pub async fn run<B: Broadcast, R: RngCore + CryptoRng>(
        mut self,
        broadcast: &mut B,
        rng: &mut R,
    ) -> Result<Output, Error> {
        let ctx = &self.ctx;
        let party = self.index;
        let cfg = ctx.cfg();
        let committees = ctx.committees();

        // Dealing
        let message = self.roles.dealer().and_then(|i| {
            let mut share = self.share.take()?;
            let result = dealer::deal(ctx, rng, i, &share);
            share.zeroize();
            attempt(party, "dealing", result)
        });
        let messages = exchange(broadcast, message).await?;
        let dealings = types::decode::<Dealing>(&cfg, &committees.holding, &messages);
        let dealings = dealer::collect(ctx, rng, dealings)?;
        info!(party, valid = dealings.valid().count(), "collected dealings");

        // Verification
        let message = self.roles.verifier().and_then(|k| {
            let result = verifier::verify(ctx, rng, &self.key, k, &dealings);
            attempt(party, "verification", result)
        });
        let messages = exchange(broadcast, message).await?;
        let verifications =
            types::decode::<Verification>(&cfg, &committees.verification, &messages);
        let verifications = verifier::collect(ctx, rng, &dealings, verifications)?;
        info!(
            party,
            valid = verifications.valid().count(),
            "collected verifications"
        );

        // Resolution
        let message = self.roles.resolver().and_then(|r| {
            let resolution = resolver::resolve(ctx, &self.key, r, &dealings, &verifications);
            attempt(party, "resolution", Ok(resolution))
        });
        let messages = exchange(broadcast, message).await?;
        let resolutions = types::decode::<Resolution>(&cfg, &committees.resolution, &messages);
        let resolved = resolver::resolve_complaints(ctx, &dealings, &verifications, &resolutions)?;
        info!(
            party,
            disqualified = resolved.disqualified().count(),
            "resolved complaints"
        );

        // Witness
        let message = self.roles.witness().and_then(|w| {
            let result = witness::witness(ctx, rng, w, &dealings, &resolved);
            attempt(party, "witness", result)
        });
        let messages = exchange(broadcast, message).await?;
        let witnesses = types::decode::<Witness>(&cfg, &committees.witness, &messages);

        // Auditing
        let message = self.roles.auditor().and_then(|a| {
            let result = auditor::audit(ctx, rng, a, &dealings, &resolved, &witnesses);
            attempt(party, "auditing", result)
        });
        let messages = exchange(broadcast, message).await?;
        let audits = types::decode::<Audit>(&cfg, &committees.auditing, &messages);

        // Refresh
        let qualified = refresh::qualified_dealers(ctx, &dealings, &resolved, &audits)?;
        let commitments = refresh::refresh_commitments(ctx, &dealings, &qualified)?;
        let share = match self.roles.next_holder() {
            Some(l) => Some(refresh::refresh_share(
                ctx,
                &self.key,
                l,
                &dealings,
                &verifications,
                &resolved,
                &qualified,
            )?),
            None => None,
        };
        info!(party, next_holder = share.is_some(), "refreshed");
        Ok(Output { commitments, share })
    }
}

/// Encodes the message of a phase, or logs why there is none.
fn attempt<T: Encode>(party: u32, phase: &'static str, result: Result<T, Error>) -> Option<Bytes> {
    match result {
        Ok(message) => Some(message.encode().freeze()),
        Err(err) => {
            warn!(party, phase, ?err, "phase failed");
            None
        }
    }
}

/// Broadcasts `message` (empty if `None`) and waits for the messages of every party.
async fn exchange<B: Broadcast>(
    broadcast: &mut B,
    message: Option<Bytes>,
) -> Result<BTreeMap<u32, Bytes>, Error> {
    broadcast.send(message.unwrap_or_default()).await?;
    let (round, messages) = broadcast.receive_round().await?;
    debug!(party = broadcast.index(), round, "received round");
    Ok(messages)
}
