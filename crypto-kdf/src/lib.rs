//! # crypto-kdf
//!
//! HKDF (RFC 5869) instantiated over BLAKE2b-256, built directly on top of
//! `hmac` and `blake2` rather than a packaged HKDF crate so that both the
//! streaming multi-part builder and the raw single-shot form share one
//! extract/expand core.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_kdf::derive;
//!
//! let mut session_key = [0u8; 32];
//! derive(b"salt-bytes", b"shared-secret", b"info-context", &mut session_key);
//! ```

use blake2::Blake2b;
use blake2::digest::consts::U32;
use hmac::{Hmac, Mac};
use zeroize::Zeroize;

type Blake2b256 = Blake2b<U32>;
type HmacBlake2b256 = Hmac<Blake2b256>;

/// Output size, in bytes, of the underlying BLAKE2b-256 digest used as HKDF's
/// hash function. Bounds the maximum `expand` output to `255 * HASH_SIZE`.
pub const HASH_SIZE: usize = 32;

/// Errors produced by expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfError {
    /// Requested output is longer than `255 * HASH_SIZE`, the hard limit RFC
    /// 5869 places on HKDF-Expand regardless of underlying hash.
    OutputTooLong,
}

impl std::fmt::Display for KdfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutputTooLong => write!(f, "requested output length exceeds the HKDF-Expand limit"),
        }
    }
}

impl std::error::Error for KdfError {}

/// A pseudorandom key produced by the extract step.
///
/// Holds raw key material and is zeroized on drop; callers should not retain
/// a `Prk` any longer than the expand calls that consume it.
#[derive(Clone)]
pub struct Prk([u8; HASH_SIZE]);

impl Drop for Prk {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Prk {
    /// Runs the HKDF extract step: `PRK = HMAC-BLAKE2b(salt, ikm)`.
    ///
    /// Per RFC 5869, an empty salt is replaced with a string of `HASH_SIZE`
    /// zero bytes rather than an empty HMAC key.
    #[must_use]
    pub fn extract(salt: &[u8], ikm: &[u8]) -> Self {
        let zero_salt = [0u8; HASH_SIZE];
        let salt = if salt.is_empty() { &zero_salt[..] } else { salt };
        let mut mac = HmacBlake2b256::new_from_slice(salt)
            .expect("HMAC accepts keys of any length");
        mac.update(ikm);
        let out = mac.finalize().into_bytes();
        let mut prk = [0u8; HASH_SIZE];
        prk.copy_from_slice(&out);
        Prk(prk)
    }

    /// Runs the HKDF expand step, writing `okm.len()` bytes of output key
    /// material derived from this PRK and the given context `info`.
    pub fn expand(&self, info: &[u8], okm: &mut [u8]) -> Result<(), KdfError> {
        let n = okm.len().div_ceil(HASH_SIZE);
        if n > 255 {
            return Err(KdfError::OutputTooLong);
        }

        let mut prev: Option<[u8; HASH_SIZE]> = None;
        let mut written = 0usize;
        for i in 1..=n as u8 {
            let mut mac = HmacBlake2b256::new_from_slice(&self.0)
                .expect("HMAC accepts keys of any length");
            if let Some(prev_block) = prev {
                mac.update(&prev_block);
            }
            mac.update(info);
            mac.update(&[i]);
            let block = mac.finalize().into_bytes();

            let take = (okm.len() - written).min(HASH_SIZE);
            okm[written..written + take].copy_from_slice(&block[..take]);
            written += take;

            let mut block_arr = [0u8; HASH_SIZE];
            block_arr.copy_from_slice(&block);
            prev = Some(block_arr);
        }
        Ok(())
    }
}

/// One-shot HKDF: extract then expand in a single call.
///
/// This is the raw form the handshake engine uses to derive session keys
/// directly from `salt`, `ikm`, and `info` with no additional framing around
/// any of the three inputs.
pub fn derive(salt: &[u8], ikm: &[u8], info: &[u8], okm: &mut [u8]) {
    let prk = Prk::extract(salt, ikm);
    prk.expand(info, okm)
        .expect("callers request at most 255 * HASH_SIZE bytes");
}

/// Accumulates several input-keying-material parts before running extract,
/// each part separated by its own length prefix so that no ambiguity can
/// arise from where one part ends and the next begins (unlike raw
/// concatenation, where `("ab", "c")` and `("a", "bc")` would otherwise
/// extract to the same PRK).
///
/// Used when deriving sub-keys from a long-lived root secret, where the
/// parts being mixed in are already structured values (an index, a label)
/// rather than a single opaque shared secret.
#[derive(Default)]
pub struct ExtractBuilder {
    buf: Vec<u8>,
}

impl ExtractBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends one input part, framed with a 4-byte big-endian length prefix.
    #[must_use]
    pub fn input_item(mut self, part: &[u8]) -> Self {
        self.buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(part);
        self
    }

    /// Runs extract over the framed concatenation of every part added so far.
    #[must_use]
    pub fn finalize(self, salt: &[u8]) -> Prk {
        Prk::extract(salt, &self.buf)
    }
}
