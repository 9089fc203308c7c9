//! Deliver one message per participant per round.
//!
//! A [Broadcast] endpoint sends at most one message per round and then waits for the
//! complete set of messages sent by every participant in that round. No participant
//! observes round `r + 1` before it has observed every round `r` message.
//!
//! # Status
//!
//! `yoso-broadcast` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

use bytes::Bytes;
use std::{collections::BTreeMap, future::Future};
use thiserror::Error;

pub mod memory;

/// Errors that can occur when interacting with a [Broadcast] endpoint.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("network closed")]
    NetworkClosed,
    #[error("already sent in round {0}")]
    AlreadySent(u64),
    #[error("nothing sent in round {0}")]
    NotSent(u64),
    #[error("duplicate message from {1} in round {0}")]
    DuplicateSender(u64, u32),
}

/// Reliable broadcast with a synchronous round structure.
pub trait Broadcast: Send {
    /// Returns the index of this participant.
    fn index(&self) -> u32;

    /// Returns the number of participants.
    fn participants(&self) -> u32;

    /// Broadcasts `message` to every participant (including ourselves) in the current round.
    ///
    /// Each participant may send exactly once per round.
    fn send(&mut self, message: Bytes) -> impl Future<Output = Result<(), Error>> + Send;

    /// Waits for every participant's message in the current round and advances to the next.
    ///
    /// Returns the completed round number and the messages keyed by sender.
    fn receive_round(
        &mut self,
    ) -> impl Future<Output = Result<(u64, BTreeMap<u32, Bytes>), Error>> + Send;
}
