//! Public input of a round, validated and expanded once.

use crate::{committee::Committees, config::Config, types::Cfg, Error};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use yoso_codec::varint;
use yoso_cryptography::{
    bls12381::{
        pedersen::{self, VectorParams},
        primitives::group::{G1, SCALAR_LENGTH},
        vss,
    },
    encryption::{sealed, AUTHENTICATION_TAG_LENGTH},
};

/// Prepends the length of `namespace` to the concatenation of `namespace` and `suffix`.
pub fn union_unique(namespace: &[u8], suffix: &[u8]) -> Vec<u8> {
    let len = namespace.len() as u32;
    let mut result = Vec::with_capacity(varint::size(len) + namespace.len() + suffix.len());
    varint::write(len, &mut result);
    result.extend_from_slice(namespace);
    result.extend_from_slice(suffix);
    result
}

/// Everything every party of a round agrees on before the round starts.
#[derive(Clone, Debug)]
pub struct Context {
    config: Config,
    vss: vss::Params,
    vector: VectorParams,
    keys: Vec<sealed::PublicKey>,
    committees: Committees,
    commitments: Vec<G1>,
    pool: Arc<ThreadPool>,
}

impl Context {
    /// Validates the public input and derives the public parameters of the round.
    ///
    /// `keys` holds the encryption key of every party (indexed by party) and `commitments`
    /// the `N + 1` commitments to the current secret and shares.
    pub fn new(
        config: Config,
        keys: Vec<sealed::PublicKey>,
        committees: Committees,
        commitments: Vec<G1>,
    ) -> Result<Self, Error> {
        config.validate()?;
        committees.validate(config.participants, keys.len())?;
        let expected = config.participants as usize + 1;
        if commitments.len() != expected {
            return Err(Error::InvalidCommitments(expected, commitments.len()));
        }
        let vss = vss::Params::new(config.participants, config.degree)?;
        let vector = VectorParams::new(2 * config.participants as usize);
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .build()?;
        Ok(Self {
            config,
            vss,
            vector,
            keys,
            committees,
            commitments,
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the size of every committee (`N`).
    pub fn n(&self) -> u32 {
        self.config.participants
    }

    /// Returns the sharing degree (`D`).
    pub fn degree(&self) -> u32 {
        self.config.degree
    }

    /// Returns the number of shares required to reconstruct (`D + 1`).
    pub fn threshold(&self) -> u32 {
        self.config.threshold()
    }

    pub fn namespace(&self) -> &[u8] {
        &self.config.namespace
    }

    pub fn vss(&self) -> &vss::Params {
        &self.vss
    }

    pub fn pedersen(&self) -> &pedersen::Params {
        self.vss.pedersen()
    }

    /// Returns the `2N` vector commitment bases (`G_0..G_N` for values, `G_N..G_2N` for blindings).
    pub fn vector(&self) -> &VectorParams {
        &self.vector
    }

    pub fn committees(&self) -> &Committees {
        &self.committees
    }

    /// Returns the commitments to the current secret (`[0]`) and shares (`[i + 1]`).
    pub fn commitments(&self) -> &[G1] {
        &self.commitments
    }

    /// Returns the number of parties with an encryption key.
    pub fn parties(&self) -> usize {
        self.keys.len()
    }

    /// Returns the encryption key of `party`.
    pub fn key(&self, party: u32) -> &sealed::PublicKey {
        &self.keys[party as usize]
    }

    /// Returns the largest ciphertext a well-formed message may carry.
    pub fn max_ciphertext(&self) -> usize {
        // Every ciphertext holds at most 2N scalars and a length prefix
        2 * self.n() as usize * SCALAR_LENGTH
            + varint::size(2 * self.n())
            + sealed::OVERHEAD
            + AUTHENTICATION_TAG_LENGTH
    }

    /// Returns the configuration used to decode messages of this round.
    pub fn cfg(&self) -> Cfg {
        Cfg {
            n: self.n() as usize,
            max_ciphertext: self.max_ciphertext(),
        }
    }

    /// Returns the pool of `concurrency` threads shared by every clone of this context.
    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Returns the namespace extended with `suffix`.
    pub(crate) fn label(&self, suffix: &[u8]) -> Vec<u8> {
        union_unique(self.namespace(), suffix)
    }
}
