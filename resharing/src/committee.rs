//! Committees of a round and the roles a party plays in them.
//!
//! Parties are identified by their index in the list of encryption keys. Members of a
//! committee are identified by their position in that committee (`0..N`).

use crate::Error;
use std::collections::BTreeSet;

/// A party's membership in one committee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Member of the current holding committee.
    Dealer(u32),
    /// Member of the verification committee.
    Verifier(u32),
    /// Member of the resolution committee.
    Resolver(u32),
    /// Member of the witness committee.
    Witness(u32),
    /// Member of the auditing committee.
    Auditor(u32),
    /// Member of the next holding committee.
    NextHolder(u32),
}

/// Every role a party plays in a round.
///
/// Committees are usually disjoint, in which case a party holds at most one role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roles(Vec<Role>);

impl Roles {
    /// Returns whether the party is a member of no committee.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over all roles.
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn dealer(&self) -> Option<u32> {
        self.iter().find_map(|role| match role {
            Role::Dealer(i) => Some(*i),
            _ => None,
        })
    }

    pub fn verifier(&self) -> Option<u32> {
        self.iter().find_map(|role| match role {
            Role::Verifier(i) => Some(*i),
            _ => None,
        })
    }

    pub fn resolver(&self) -> Option<u32> {
        self.iter().find_map(|role| match role {
            Role::Resolver(i) => Some(*i),
            _ => None,
        })
    }

    pub fn witness(&self) -> Option<u32> {
        self.iter().find_map(|role| match role {
            Role::Witness(i) => Some(*i),
            _ => None,
        })
    }

    pub fn auditor(&self) -> Option<u32> {
        self.iter().find_map(|role| match role {
            Role::Auditor(i) => Some(*i),
            _ => None,
        })
    }

    pub fn next_holder(&self) -> Option<u32> {
        self.iter().find_map(|role| match role {
            Role::NextHolder(i) => Some(*i),
            _ => None,
        })
    }
}

/// The six committees of a round, each an ordered list of party indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committees {
    pub holding: Vec<u32>,
    pub verification: Vec<u32>,
    pub resolution: Vec<u32>,
    pub witness: Vec<u32>,
    pub auditing: Vec<u32>,
    pub next: Vec<u32>,
}

impl Committees {
    /// Uses the same committee for every role.
    pub fn uniform(members: Vec<u32>) -> Self {
        Self {
            holding: members.clone(),
            verification: members.clone(),
            resolution: members.clone(),
            witness: members.clone(),
            auditing: members.clone(),
            next: members,
        }
    }

    /// Assigns consecutive, disjoint blocks of `size` parties to each committee (in phase order).
    pub fn disjoint(size: u32) -> Self {
        let block = |k: u32| (k * size..(k + 1) * size).collect::<Vec<_>>();
        Self {
            holding: block(0),
            verification: block(1),
            resolution: block(2),
            witness: block(3),
            auditing: block(4),
            next: block(5),
        }
    }

    fn all(&self) -> [(fn(u32) -> Role, &[u32]); 6] {
        [
            (Role::Dealer, &self.holding),
            (Role::Verifier, &self.verification),
            (Role::Resolver, &self.resolution),
            (Role::Witness, &self.witness),
            (Role::Auditor, &self.auditing),
            (Role::NextHolder, &self.next),
        ]
    }

    /// Returns an error unless every committee has exactly `size` distinct members, each
    /// one of the `parties` known parties.
    pub fn validate(&self, size: u32, parties: usize) -> Result<(), Error> {
        for (_, members) in self.all() {
            if members.len() != size as usize {
                return Err(Error::InvalidCommittees("committee has the wrong size"));
            }
            if members.iter().any(|m| *m as usize >= parties) {
                return Err(Error::InvalidCommittees("unknown party"));
            }
            if members.iter().collect::<BTreeSet<_>>().len() != members.len() {
                return Err(Error::InvalidCommittees("duplicate member"));
            }
        }
        Ok(())
    }

    /// Computes the roles of `party`.
    pub fn roles(&self, party: u32) -> Roles {
        let roles = self
            .all()
            .into_iter()
            .filter_map(|(role, members)| {
                members
                    .iter()
                    .position(|m| *m == party)
                    .map(|index| role(index as u32))
            })
            .collect();
        Roles(roles)
    }
}
