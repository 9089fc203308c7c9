//! Configuration of a resharing round.

use crate::Error;

/// Namespace used when none is provided.
pub const DEFAULT_NAMESPACE: &[u8] = b"_YOSO_RESHARING";

/// Configuration shared by every party of a round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Size of every committee (`N`).
    pub participants: u32,

    /// Degree of every sharing polynomial (`D`). Up to `D` members of a committee may be
    /// corrupted and `D + 1` shares are required to reconstruct.
    pub degree: u32,

    /// A dealer with fewer remaining (unchecked) accusations than this is qualified.
    pub audit_min_witnesses: u32,

    /// A dealer is qualified once this many accusations against it are found to be false.
    pub audit_max_false_witnesses: u32,

    /// Number of threads used to verify dealings, check witnesses, and reconstruct shares.
    pub concurrency: usize,

    /// Domain separator for every proof, hash, and ciphertext of the round.
    pub namespace: Vec<u8>,
}

impl Config {
    /// Returns a configuration for committees of `participants` members sharing with degree
    /// `degree`, with audit thresholds tolerating `degree` false witnesses.
    pub fn new(participants: u32, degree: u32) -> Self {
        Self {
            participants,
            degree,
            audit_min_witnesses: 1,
            audit_max_false_witnesses: degree,
            concurrency: 1,
            namespace: DEFAULT_NAMESPACE.to_vec(),
        }
    }

    /// Returns the number of shares required to reconstruct (`degree + 1`).
    pub fn threshold(&self) -> u32 {
        self.degree + 1
    }

    /// Returns an error if the configuration cannot be used.
    pub fn validate(&self) -> Result<(), Error> {
        if self.participants == 0 {
            return Err(Error::InvalidConfig("participants must be positive"));
        }
        if self.degree >= self.participants {
            return Err(Error::InvalidConfig("degree must be less than participants"));
        }
        if self.audit_min_witnesses == 0 {
            return Err(Error::InvalidConfig("audit_min_witnesses must be positive"));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be positive"));
        }
        Ok(())
    }
}
