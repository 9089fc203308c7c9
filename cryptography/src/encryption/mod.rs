//! Encrypt data for a single recipient or under a one-time key.
//!
//! Both schemes use ChaCha20-Poly1305 with a fixed (zero) nonce. This is only safe because
//! every key is used for exactly one message:
//! - [sealed]: the key is derived from a fresh ephemeral X25519 exchange per message.
//! - [symmetric]: the key is derived from caller-provided one-time input key material.

pub mod sealed;
pub mod symmetric;

use chacha20poly1305::{ChaCha20Poly1305, KeyInit, KeySizeUser};
use hkdf::{hmac::digest::typenum::Unsigned, Hkdf};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

/// The size of the key used by the ChaCha20Poly1305 cipher.
const CHACHA_KEY_SIZE: usize = <ChaCha20Poly1305 as KeySizeUser>::KeySize::USIZE;

/// The size of the authentication tag appended to every ciphertext.
pub const AUTHENTICATION_TAG_LENGTH: usize = 16;

/// A constant prefix used for the salt hash in the HKDF key derivation.
const BASE_KDF_PREFIX: &[u8] = b"yoso-cryptography/KDF/v1/";

/// Errors that can occur when encrypting or decrypting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("hkdf expansion failed")]
    HKDFExpansion,
    #[error("cipher creation failed")]
    CipherCreation,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("ciphertext too short")]
    CiphertextTooShort,
    #[error("non-contributory key exchange")]
    NonContributory,
}

/// Derive a ChaCha20Poly1305 cipher from input key material using HKDF-SHA256.
///
/// The salt is the hash of a fixed prefix followed by the ordered list of `salts`.
fn derive(ikm: &[u8], salts: &[&[u8]], info: &[u8]) -> Result<ChaCha20Poly1305, Error> {
    let mut hasher = Sha256::new();
    hasher.update(BASE_KDF_PREFIX);
    for salt in salts {
        hasher.update((salt.len() as u32).to_le_bytes());
        hasher.update(salt);
    }
    let mut salt: [u8; 32] = hasher.finalize().into();

    // HKDF-Extract: creates a pseudorandom key (PRK)
    let prk = Hkdf::<Sha256>::new(Some(salt.as_ref()), ikm);
    salt.zeroize();

    let mut buf = [0u8; CHACHA_KEY_SIZE];
    prk.expand(info, &mut buf)
        .map_err(|_| Error::HKDFExpansion)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&buf).map_err(|_| Error::CipherCreation);
    buf.zeroize();
    cipher
}
