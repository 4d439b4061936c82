//! # crypto-vrf
//!
//! A verifiable random function over secp256k1, used to optionally bind a
//! fresh, publicly-checkable proof into a KKTP discovery or response anchor.
//!
//! VRF bindings are optional and always set atomically: either both
//! `vrf_value` and `vrf_proof` are present, or neither is. This crate models
//! that at the type level by only ever producing or consuming the pair
//! together ([`Prove::prove`] returns both or the caller omits both).
//!
//! The construction is a standard discrete-log VRF: a Chaum-Pedersen proof
//! of equality between the discrete log of the public key (`Y = x*G`) and
//! the discrete log of the VRF output point (`Gamma = x*H`), where `H` is a
//! hash-to-curve of the input. No separate VRF keypair is introduced: the
//! same secp256k1 key that signs anchors (`pub_sig`) doubles as the VRF
//! public key, since the wire format carries no independent VRF key field.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_vrf::{prove, verify};
//! use crypto_sig::generate_key_pair;
//!
//! let (sk, pk) = generate_key_pair([3u8; 32]).unwrap();
//! let input = b"pub_sig || pub_dh || sid";
//!
//! let output = prove(&sk, input);
//! assert!(verify(&pk, &output.value, &output.proof, input));
//! assert!(!verify(&pk, &output.value, &output.proof, b"different input"));
//! ```

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar, U256};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Size in bytes of the finalized VRF pseudorandom output (`vrf_value`).
pub const VALUE_SIZE: usize = 32;
/// Size in bytes of the serialized proof (`vrf_proof`): a compressed curve
/// point (33 bytes) plus two 32-byte scalars.
pub const PROOF_SIZE: usize = 33 + 32 + 32;

/// The output of [`prove`]: a finalized pseudorandom value plus the proof
/// that lets any holder of the corresponding public key verify it.
#[derive(Clone, Serialize, Deserialize)]
pub struct VrfOutput {
    pub value: [u8; VALUE_SIZE],
    pub proof: [u8; PROOF_SIZE],
}

fn hash_to_curve(input: &[u8]) -> ProjectivePoint {
    for counter in 0u8..=255 {
        for parity in [0x02u8, 0x03u8] {
            let digest = crypto_hash::hash_concat(&[&[counter], input]);
            let mut candidate = [0u8; 33];
            candidate[0] = parity;
            candidate[1..].copy_from_slice(&digest);
            let encoded = EncodedPoint::from_bytes(candidate);
            let Ok(encoded) = encoded else { continue };
            let affine = AffinePoint::from_encoded_point(&encoded);
            if affine.is_some().into() {
                return ProjectivePoint::from(affine.unwrap());
            }
        }
    }
    unreachable!("hash-to-curve: no valid point found in 512 attempts, astronomically unlikely")
}

fn scalar_from_wide_bytes(bytes: &[u8; 32]) -> Scalar {
    Scalar::reduce(U256::from_be_slice(bytes))
}

fn deterministic_nonce(secret: &crypto_sig::SigningKey, input: &[u8]) -> Scalar {
    let mut nonce_bytes = [0u8; 32];
    let prk = crypto_kdf::ExtractBuilder::new()
        .input_item(secret.as_bytes())
        .input_item(input)
        .finalize(b"crypto-vrf.nonce.salt----------");
    prk.expand(b"crypto-vrf.nonce", &mut nonce_bytes)
        .expect("32 bytes is well within the HKDF-Expand limit");
    let nonce_bytes = Zeroizing::new(nonce_bytes);
    scalar_from_wide_bytes(&nonce_bytes)
}

fn challenge(points: &[&ProjectivePoint]) -> Scalar {
    let encoded: Vec<[u8; 33]> = points
        .iter()
        .map(|p| {
            let mut out = [0u8; 33];
            out.copy_from_slice(p.to_affine().to_encoded_point(true).as_bytes());
            out
        })
        .collect();
    let refs: Vec<&[u8]> = encoded.iter().map(|e| e.as_slice()).collect();
    let digest = crypto_hash::hash_concat(&refs);
    scalar_from_wide_bytes(&digest)
}

fn public_key_point(public_key: &crypto_sig::VerificationKey) -> Option<ProjectivePoint> {
    let encoded = EncodedPoint::from_bytes(public_key.as_bytes()).ok()?;
    let affine = AffinePoint::from_encoded_point(&encoded);
    if affine.is_some().into() {
        Some(ProjectivePoint::from(affine.unwrap()))
    } else {
        None
    }
}

fn secret_scalar(secret: &crypto_sig::SigningKey) -> Scalar {
    scalar_from_wide_bytes(secret.as_bytes())
}

/// Produces a VRF output (value + proof) for `input` under `secret`.
///
/// `secret` is the same secp256k1 signing key used to sign the anchor that
/// carries this binding; the corresponding [`crypto_sig::VerificationKey`]
/// (`pub_sig`) is what [`verify`] is checked against.
#[must_use]
pub fn prove(secret: &crypto_sig::SigningKey, input: &[u8]) -> VrfOutput {
    let x = secret_scalar(secret);
    let g = ProjectivePoint::GENERATOR;
    let y = g * x;
    let h = hash_to_curve(input);
    let gamma = h * x;

    let k = deterministic_nonce(secret, input);
    let u = g * k;
    let v = h * k;

    let c = challenge(&[&g, &h, &y, &gamma, &u, &v]);
    let s = k - c * x;

    let mut proof = [0u8; PROOF_SIZE];
    proof[0..33].copy_from_slice(gamma.to_affine().to_encoded_point(true).as_bytes());
    proof[33..65].copy_from_slice(&c.to_bytes());
    proof[65..97].copy_from_slice(&s.to_bytes());

    let value = crypto_hash::hash(&proof[0..33]);

    VrfOutput { value, proof }
}

/// Verifies that `value`/`proof` is a valid VRF output over `input` under
/// `public_key`. Returns `false` for any malformed or tampered proof, any
/// mismatched input, or a `value` that does not match the proof's `Gamma`.
#[must_use]
pub fn verify(
    public_key: &crypto_sig::VerificationKey,
    value: &[u8; VALUE_SIZE],
    proof: &[u8; PROOF_SIZE],
    input: &[u8],
) -> bool {
    let Some(y) = public_key_point(public_key) else {
        return false;
    };

    let Ok(gamma_encoded) = EncodedPoint::from_bytes(&proof[0..33]) else {
        return false;
    };
    let gamma_affine = AffinePoint::from_encoded_point(&gamma_encoded);
    if gamma_affine.is_none().into() {
        return false;
    }
    let gamma = ProjectivePoint::from(gamma_affine.unwrap());

    if crypto_hash::hash(&proof[0..33]) != *value {
        return false;
    }

    let mut c_bytes = [0u8; 32];
    c_bytes.copy_from_slice(&proof[33..65]);
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&proof[65..97]);
    let c = scalar_from_wide_bytes(&c_bytes);
    let s = scalar_from_wide_bytes(&s_bytes);

    let g = ProjectivePoint::GENERATOR;
    let h = hash_to_curve(input);

    let u_prime = g * s + y * c;
    let v_prime = h * s + gamma * c;

    let c_prime = challenge(&[&g, &h, &y, &gamma, &u_prime, &v_prime]);

    c_prime == c
}
