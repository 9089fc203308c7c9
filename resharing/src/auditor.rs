//! Auditing phase: decide which accused dealers to disqualify.
//!
//! At most `D` witnesses are corrupted, so a dealer accused by more than `D` witnesses not yet
//! caught lying is disqualified. Otherwise the auditor re-checks accusations in random order: a
//! seed under which the dealing fails disqualifies the dealer, while a seed under which it passes
//! marks its witness as lying (for every remaining dealer). Auditing stops early once too few
//! accusations remain or enough of them turned out false.

use crate::{
    context::Context,
    dealer::Dealings,
    resolver::Resolved,
    types::{Audit, Witness},
    witness::check_with_seed,
    Error,
};
use rand::{Rng, RngCore};
use tracing::{debug, info};

/// Audits every dealing against the accusations of `witnesses` (indexed by witness).
///
/// Invalid dealings and dealers disqualified during resolution are never qualified.
pub fn audit<R: RngCore>(
    ctx: &Context,
    rng: &mut R,
    auditor: u32,
    dealings: &Dealings,
    resolved: &Resolved,
    witnesses: &[Option<Witness>],
) -> Result<Audit, Error> {
    let config = ctx.config();
    let mut lying = vec![false; witnesses.len()];
    let mut qualified = Vec::with_capacity(dealings.len());
    for i in 0..dealings.len() as u32 {
        let Some(dealing) = dealings.get(i) else {
            qualified.push(false);
            continue;
        };
        if resolved.is_disqualified(i) {
            qualified.push(false);
            continue;
        }

        let mut accusations = witnesses
            .iter()
            .enumerate()
            .filter(|(w, _)| !lying[*w])
            .filter_map(|(w, witness)| {
                let seed = witness.as_ref()?.seeds.get(i as usize)?.as_ref()?;
                Some((w, *seed))
            })
            .collect::<Vec<_>>();
        let mut false_accusations = 0;
        let outcome = loop {
            let caught = lying.iter().filter(|l| **l).count() as u32;
            let remaining = accusations.len() as u32;
            if remaining > ctx.degree().saturating_sub(caught) {
                break false;
            }
            if remaining < config.audit_min_witnesses
                || false_accusations >= config.audit_max_false_witnesses
            {
                // Unchecked accusers are treated as lying
                for (w, _) in &accusations {
                    lying[*w] = true;
                }
                break true;
            }
            let (w, seed) = accusations.swap_remove(rng.gen_range(0..accusations.len()));
            if check_with_seed(ctx, rng, i, dealing, &seed)? {
                false_accusations += 1;
                lying[w] = true;
            } else {
                break false;
            }
        };
        if !outcome {
            info!(auditor, dealer = i, "disqualified");
        }
        qualified.push(outcome);
    }
    debug!(
        auditor,
        lying = lying.iter().filter(|l| **l).count(),
        "audited"
    );
    Ok(Audit { qualified })
}
