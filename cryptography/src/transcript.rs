//! Hash arbitrary protocol data into a running transcript and derive noise from it.
//!
//! Fiat-Shamir challenges, public verification randomness, and dealing hashes are all
//! derived from a [Transcript] so that every consumer segments and domain separates its
//! input the same way.

use bytes::Buf;
use rand::{CryptoRng, RngCore};
use yoso_codec::Encode;

/// Byte stream returned (opaquely) by [Transcript::noise].
struct Rng(blake3::OutputReader);

impl RngCore for Rng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.0.fill(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.0.fill(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.fill(dest);
        Ok(())
    }
}

impl CryptoRng for Rng {}

/// Separates the hasher of a transcript from the hasher of its noise.
#[repr(u8)]
enum StartTag {
    New = 0,
    Noise = 1,
}

/// Running hash over length-delimited messages.
pub struct Transcript {
    hasher: blake3::Hasher,
    pending: u64,
}

impl Transcript {
    fn tagged(tag: StartTag, first: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[tag as u8]);
        let mut transcript = Self { hasher, pending: 0 };
        transcript.commit(first);
        transcript
    }

    /// Terminates the pending message with its length.
    fn end_message(&mut self) {
        self.hasher.update(&self.pending.to_le_bytes());
        self.pending = 0;
    }

    /// Creates a transcript bound to `namespace`.
    ///
    /// Transcripts with different namespaces never agree, even on the same messages:
    /// ```
    /// # use yoso_cryptography::transcript::Transcript;
    /// let s1 = Transcript::new(b"n1").commit(b"A".as_slice()).summarize();
    /// let s2 = Transcript::new(b"n2").commit(b"A".as_slice()).summarize();
    /// assert_ne!(s1, s2);
    /// ```
    pub fn new(namespace: &[u8]) -> Self {
        Self::tagged(StartTag::New, namespace)
    }

    /// Records `data` as one message.
    ///
    /// Message boundaries are part of the hash:
    /// ```
    /// # use yoso_cryptography::transcript::Transcript;
    /// let s1 = Transcript::new(b"test").commit(b"A".as_slice()).commit(b"B".as_slice()).summarize();
    /// let s2 = Transcript::new(b"test").commit(b"AB".as_slice()).summarize();
    /// assert_ne!(s1, s2);
    /// ```
    pub fn commit(&mut self, data: impl Buf) -> &mut Self {
        self.append(data);
        self.end_message();
        self
    }

    /// Records the concatenated encodings of `items` as one message.
    pub fn commit_encoded<'a, T: Encode + 'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a T>,
    ) -> &mut Self {
        for item in items {
            self.append(item.encode());
        }
        self.end_message();
        self
    }

    /// Appends `data` to the pending message, which ends at the next [Self::commit].
    ///
    /// ```
    /// # use yoso_cryptography::transcript::Transcript;
    /// let s1 = Transcript::new(b"test").append(b"A".as_slice()).commit(b"B".as_slice()).summarize();
    /// let s2 = Transcript::new(b"test").commit(b"AB".as_slice()).summarize();
    /// assert_eq!(s1, s2);
    /// ```
    pub fn append(&mut self, mut data: impl Buf) -> &mut Self {
        while data.has_remaining() {
            let chunk = data.chunk();
            let len = chunk.len();
            self.hasher.update(chunk);
            self.pending += len as u64;
            data.advance(len);
        }
        self
    }

    /// Derives a byte stream from every message committed so far and `label`.
    pub fn noise(&self, label: &'static [u8]) -> impl RngCore + CryptoRng {
        let mut noise = Self::tagged(StartTag::Noise, self.summarize().as_bytes());
        noise.commit(label);
        Rng(noise.hasher.finalize_xof())
    }

    /// Returns the digest of every message committed so far.
    ///
    /// Panics if a message is pending.
    ///
    /// ```
    /// # use yoso_cryptography::transcript::Transcript;
    /// let s1 = Transcript::new(b"test").commit(b"DATA".as_slice()).summarize();
    /// let s2 = Transcript::new(b"test").commit(b"DATA".as_slice()).summarize();
    /// assert_eq!(s1, s2);
    /// ```
    pub fn summarize(&self) -> Summary {
        assert_eq!(self.pending, 0, "transcript has a pending message");
        Summary {
            hash: self.hasher.finalize(),
        }
    }
}

/// Digest of a [Transcript].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    hash: blake3::Hash,
}

impl Summary {
    /// Returns the raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.hash.as_bytes()
    }
}
