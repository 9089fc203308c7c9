//! Anonymous public-key encryption to an X25519 recipient.
//!
//! A sealed ciphertext is `ephemeral_public_key || chacha20poly1305(key, 0, message)` where
//! `key` is derived with HKDF-SHA256 from the ephemeral-static Diffie-Hellman output, the
//! caller's namespace, and both public keys.

use super::{derive, Error, AUTHENTICATION_TAG_LENGTH};
use bytes::{Buf, BufMut};
use chacha20poly1305::aead::Aead;
use rand::{CryptoRng, RngCore};
use std::fmt;
use x25519_dalek::{EphemeralSecret, StaticSecret};
use yoso_codec::{Error as CodecError, FixedSize, Read, Write};

/// Length of an encoded public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Bytes added to every sealed message.
pub const OVERHEAD: usize = PUBLIC_KEY_LENGTH + AUTHENTICATION_TAG_LENGTH;

/// HKDF info for sealed messages.
const SEALED_INFO: &[u8] = b"sealed";

/// A recipient's public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(x25519_dalek::PublicKey);

impl PublicKey {
    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for b in self.0.as_bytes() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

impl Write for PublicKey {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(self.0.as_bytes());
    }
}

impl Read for PublicKey {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let bytes = <[u8; PUBLIC_KEY_LENGTH]>::read_cfg(buf, &())?;
        Ok(Self(x25519_dalek::PublicKey::from(bytes)))
    }
}

impl FixedSize for PublicKey {
    const SIZE: usize = PUBLIC_KEY_LENGTH;
}

/// A recipient's private key.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    /// Create a fresh [PrivateKey] using the supplied RNG.
    pub fn from_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(StaticSecret::random_from_rng(rng))
    }

    /// Returns the corresponding [PublicKey].
    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.0))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({:?})", self.public_key())
    }
}

/// Encrypts `message` so that only the holder of `recipient`'s private key can read it.
pub fn seal<R: RngCore + CryptoRng>(
    rng: &mut R,
    recipient: &PublicKey,
    namespace: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, Error> {
    let ephemeral = EphemeralSecret::random_from_rng(rng);
    let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient.0);
    if !shared.was_contributory() {
        return Err(Error::NonContributory);
    }
    let cipher = derive(
        shared.as_bytes(),
        &[namespace, ephemeral_public.as_bytes(), recipient.as_bytes()],
        SEALED_INFO,
    )?;
    let ciphertext = cipher
        .encrypt(&Default::default(), message)
        .map_err(|_| Error::EncryptionFailed)?;

    let mut out = Vec::with_capacity(PUBLIC_KEY_LENGTH + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts a message produced by [seal] for `recipient`.
pub fn open(recipient: &PrivateKey, namespace: &[u8], sealed: &[u8]) -> Result<Vec<u8>, Error> {
    if sealed.len() < OVERHEAD {
        return Err(Error::CiphertextTooShort);
    }
    let (ephemeral, ciphertext) = sealed.split_at(PUBLIC_KEY_LENGTH);
    let mut ephemeral_bytes = [0u8; PUBLIC_KEY_LENGTH];
    ephemeral_bytes.copy_from_slice(ephemeral);
    let ephemeral_public = x25519_dalek::PublicKey::from(ephemeral_bytes);

    let shared = recipient.0.diffie_hellman(&ephemeral_public);
    if !shared.was_contributory() {
        return Err(Error::NonContributory);
    }
    let cipher = derive(
        shared.as_bytes(),
        &[
            namespace,
            ephemeral_public.as_bytes(),
            recipient.public_key().as_bytes(),
        ],
        SEALED_INFO,
    )?;
    cipher
        .decrypt(&Default::default(), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, thread_rng, SeedableRng};
    use yoso_codec::{DecodeExt, Encode};

    #[test]
    fn test_seal_open() {
        let mut rng = StdRng::seed_from_u64(0);
        let recipient = PrivateKey::from_rng(&mut rng);
        let sealed = seal(&mut rng, &recipient.public_key(), b"ns", b"hello").unwrap();
        assert_eq!(sealed.len(), 5 + OVERHEAD);
        assert_eq!(open(&recipient, b"ns", &sealed).unwrap(), b"hello");
    }

    #[test]
    fn test_fresh_ciphertexts() {
        let mut rng = thread_rng();
        let recipient = PrivateKey::from_rng(&mut rng).public_key();
        let a = seal(&mut rng, &recipient, b"ns", b"same").unwrap();
        let b = seal(&mut rng, &recipient, b"ns", b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_recipient_or_namespace() {
        let mut rng = StdRng::seed_from_u64(1);
        let recipient = PrivateKey::from_rng(&mut rng);
        let other = PrivateKey::from_rng(&mut rng);
        let sealed = seal(&mut rng, &recipient.public_key(), b"ns", b"hello").unwrap();
        assert_eq!(open(&other, b"ns", &sealed), Err(Error::DecryptionFailed));
        assert_eq!(
            open(&recipient, b"other", &sealed),
            Err(Error::DecryptionFailed)
        );
    }

    #[test]
    fn test_tampered() {
        let mut rng = StdRng::seed_from_u64(2);
        let recipient = PrivateKey::from_rng(&mut rng);
        let mut sealed = seal(&mut rng, &recipient.public_key(), b"ns", b"hello").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 1;
        assert_eq!(
            open(&recipient, b"ns", &sealed),
            Err(Error::DecryptionFailed)
        );
        assert_eq!(
            open(&recipient, b"ns", &sealed[..OVERHEAD - 1]),
            Err(Error::CiphertextTooShort)
        );
    }

    #[test]
    fn test_low_order_ephemeral() {
        let mut rng = StdRng::seed_from_u64(3);
        let recipient = PrivateKey::from_rng(&mut rng);
        let sealed = vec![0u8; OVERHEAD + 4];
        assert_eq!(
            open(&recipient, b"ns", &sealed),
            Err(Error::NonContributory)
        );
    }

    #[test]
    fn test_public_key_codec() {
        let key = PrivateKey::from_rng(&mut StdRng::seed_from_u64(4)).public_key();
        assert_eq!(PublicKey::decode(key.encode()).unwrap(), key);
    }
}
