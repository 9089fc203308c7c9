//! Authenticated encryption under one-time input key material.
//!
//! The caller must never reuse `ikm` for a second message.

use super::{derive, Error, AUTHENTICATION_TAG_LENGTH};
use chacha20poly1305::aead::Aead;

/// HKDF info for one-time symmetric messages.
const SYMMETRIC_INFO: &[u8] = b"symmetric";

/// Encrypts `message` under a key derived from `ikm`.
pub fn encrypt(ikm: &[u8], namespace: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
    let cipher = derive(ikm, &[namespace], SYMMETRIC_INFO)?;
    cipher
        .encrypt(&Default::default(), message)
        .map_err(|_| Error::EncryptionFailed)
}

/// Decrypts a message produced by [encrypt] with the same `ikm` and `namespace`.
pub fn decrypt(ikm: &[u8], namespace: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    if ciphertext.len() < AUTHENTICATION_TAG_LENGTH {
        return Err(Error::CiphertextTooShort);
    }
    let cipher = derive(ikm, &[namespace], SYMMETRIC_INFO)?;
    cipher
        .decrypt(&Default::default(), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let ciphertext = encrypt(b"key material", b"ns", b"row").unwrap();
        assert_eq!(ciphertext.len(), 3 + AUTHENTICATION_TAG_LENGTH);
        assert_eq!(decrypt(b"key material", b"ns", &ciphertext).unwrap(), b"row");
    }

    #[test]
    fn test_wrong_key() {
        let ciphertext = encrypt(b"key material", b"ns", b"row").unwrap();
        assert_eq!(
            decrypt(b"other material", b"ns", &ciphertext),
            Err(Error::DecryptionFailed)
        );
        assert_eq!(
            decrypt(b"key material", b"other", &ciphertext),
            Err(Error::DecryptionFailed)
        );
        assert_eq!(
            decrypt(b"key material", b"ns", &ciphertext[..4]),
            Err(Error::CiphertextTooShort)
        );
    }
}
