//! # crypto-aead
//!
//! A Rust library providing XChaCha20-Poly1305 authenticated encryption with
//! associated data (AEAD).
//!
//! XChaCha20-Poly1305 extends ChaCha20-Poly1305 with a 24-byte extended nonce,
//! making it safe to draw nonces from a CSPRNG per message without needing a
//! counter or other nonce-management scheme to avoid collisions.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_aead::*;
//!
//! // Create a key and nonce
//! let key = Key::from([42u8; KEY_SIZE]);
//! let nonce = Nonce::from([1u8; NONCE_SIZE]);
//!
//! // Encrypt some data
//! let plaintext = b"Hello, world!";
//! let ciphertext = encrypt(&key, &nonce, plaintext, b"additional data");
//!
//! // Decrypt the data
//! let decrypted = decrypt(&key, &nonce, &ciphertext, b"additional data")
//!     .expect("Decryption failed");
//!
//! assert_eq!(&decrypted, plaintext);
//! ```
//!
//! ## Nonce and AAD Considerations
//!
//! - **Nonce**: 24 bytes, must be unique per key; callers draw a fresh nonce
//!   from a CSPRNG for every message rather than reusing or incrementing one.
//! - **AAD**: Additional authenticated data is NOT encrypted but IS authenticated.
//! - AAD is not included in the ciphertext, so it must be transmitted separately.
//! - The same AAD must be provided during decryption for authentication to succeed.

use chacha20poly1305::{
    XChaCha20Poly1305,
    aead::{Aead, KeyInit, Payload},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// XChaCha20-Poly1305 key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// XChaCha20-Poly1305 extended nonce size in bytes (192 bits).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size in bytes, appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// A nonce for XChaCha20-Poly1305 encryption.
///
/// Wraps a 192-bit nonce and zeroes it on drop.
///
/// # Examples
///
/// ```rust
/// use crypto_aead::{Nonce, NONCE_SIZE};
///
/// let nonce_bytes = [1u8; NONCE_SIZE];
/// let nonce = Nonce::from(nonce_bytes);
/// assert_eq!(nonce.as_bytes(), &nonce_bytes);
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Nonce([u8; NONCE_SIZE]);

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Nonce {
    /// Get the raw bytes of the nonce.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// A key for XChaCha20-Poly1305 encryption.
///
/// Wraps a 256-bit key and zeroes it on drop.
///
/// # Examples
///
/// ```rust
/// use crypto_aead::{Key, KEY_SIZE};
///
/// let key_bytes = [42u8; KEY_SIZE];
/// let key = Key::from(key_bytes);
/// assert_eq!(key.as_bytes(), &key_bytes);
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_SIZE]);

impl From<[u8; KEY_SIZE]> for Key {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Key {
    /// Get the raw bytes of the key.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Encrypts `plaintext` with XChaCha20-Poly1305 under `key`/`nonce`, binding
/// `aad` into the authentication tag without including it in the output.
///
/// # Panics
///
/// Panics if encryption fails, which does not happen for valid key/nonce
/// sizes and in-memory buffers.
#[must_use]
pub fn encrypt(key: &Key, nonce: &Nonce, plaintext: &[u8], aad: &[u8]) -> Vec<u8> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(nonce.as_bytes().as_slice().into(), payload)
        .expect("XChaCha20-Poly1305 encryption should never fail")
}

/// Decrypts and authenticates `ciphertext` under `key`/`nonce`/`aad`.
///
/// Returns `None` if authentication fails for any reason: wrong key, wrong
/// nonce, wrong AAD, or a tampered ciphertext.
#[must_use]
pub fn decrypt(key: &Key, nonce: &Nonce, ciphertext: &[u8], aad: &[u8]) -> Option<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(nonce.as_bytes().as_slice().into(), payload)
        .ok()
}
