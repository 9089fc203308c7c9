//! In-process [Broadcast] hub.
//!
//! Every [Endpoint] holds an unbounded channel to every other endpoint. Messages are tagged
//! with the round they were sent in and buffered until that round is received, so a fast
//! participant may send round `r + 1` before a slow participant has received round `r`.

use crate::{Broadcast, Error};
use bytes::Bytes;
use futures::{channel::mpsc, StreamExt};
use std::collections::BTreeMap;
use tracing::debug;

/// A message in flight.
struct Envelope {
    round: u64,
    sender: u32,
    message: Bytes,
}

/// Creates endpoints for a network of `participants`.
pub struct Network;

impl Network {
    /// Returns one [Endpoint] per participant, ordered by index.
    pub fn new(participants: u32) -> Vec<Endpoint> {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..participants).map(|_| mpsc::unbounded()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(index, receiver)| Endpoint {
                index: index as u32,
                peers: senders
                    .iter()
                    .enumerate()
                    .filter(|(peer, _)| *peer != index)
                    .map(|(peer, sender)| (peer as u32, sender.clone()))
                    .collect(),
                receiver,
                participants,
                round: 0,
                sent: false,
                pending: BTreeMap::new(),
            })
            .collect()
    }
}

/// A participant's handle on a [Network].
pub struct Endpoint {
    index: u32,
    peers: Vec<(u32, mpsc::UnboundedSender<Envelope>)>,
    receiver: mpsc::UnboundedReceiver<Envelope>,
    participants: u32,

    round: u64,
    sent: bool,
    pending: BTreeMap<u64, BTreeMap<u32, Bytes>>,
}

impl Endpoint {
    /// Returns the round that will be completed by the next call to `receive_round`.
    pub fn round(&self) -> u64 {
        self.round
    }

    fn buffer(&mut self, envelope: Envelope) -> Result<(), Error> {
        if envelope.round < self.round {
            return Err(Error::DuplicateSender(envelope.round, envelope.sender));
        }
        let messages = self.pending.entry(envelope.round).or_default();
        if messages.insert(envelope.sender, envelope.message).is_some() {
            return Err(Error::DuplicateSender(envelope.round, envelope.sender));
        }
        Ok(())
    }
}

impl Broadcast for Endpoint {
    fn index(&self) -> u32 {
        self.index
    }

    fn participants(&self) -> u32 {
        self.participants
    }

    async fn send(&mut self, message: Bytes) -> Result<(), Error> {
        if self.sent {
            return Err(Error::AlreadySent(self.round));
        }
        self.sent = true;
        for (peer, sender) in &self.peers {
            let envelope = Envelope {
                round: self.round,
                sender: self.index,
                message: message.clone(),
            };

            // A departed peer no longer needs our messages
            if sender.unbounded_send(envelope).is_err() {
                debug!(sender = self.index, peer, round = self.round, "peer departed");
            }
        }
        self.buffer(Envelope {
            round: self.round,
            sender: self.index,
            message,
        })
    }

    async fn receive_round(&mut self) -> Result<(u64, BTreeMap<u32, Bytes>), Error> {
        if !self.sent {
            return Err(Error::NotSent(self.round));
        }
        loop {
            let complete = self
                .pending
                .get(&self.round)
                .is_some_and(|messages| messages.len() == self.participants as usize);
            if complete {
                let messages = self.pending.remove(&self.round).unwrap_or_default();
                let round = self.round;
                self.round += 1;
                self.sent = false;
                debug!(participant = self.index, round, "round complete");
                return Ok((round, messages));
            }
            let envelope = self.receiver.next().await.ok_or(Error::NetworkClosed)?;
            self.buffer(envelope)?;
        }
    }
}
