//! Grinding-resistance check
//!
//! A submitted proof carries a nonce whose hash against the proof
//! commitment must clear a leading-zero-bits difficulty target. This makes
//! grinding a blob until it passes the structural checks cost real work,
//! independent of whether the proof is algebraically sound.

use sha2::{Digest, Sha256};

use crate::commitment::ProofHash;

/// Domain tag for the nonce hash.
const POW_DOMAIN_TAG: &[u8] = b"proof-gateway/pow/v1";

/// Default difficulty: 16 leading zero bits, ~65k expected attempts.
pub const DEFAULT_POW_BITS: u32 = 16;

/// Count leading zero bits of a digest.
pub fn leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut zeros = 0u32;
    for &byte in bytes {
        if byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

/// Whether `nonce` satisfies the difficulty target for `hash`.
///
/// A zero nonce is rejected outright: it is the default value of an
/// unfilled slot and must never pass.
pub fn check_pow(hash: &ProofHash, nonce: u64, required_bits: u32) -> bool {
    if nonce == 0 {
        return false;
    }
    let mut hasher = Sha256::new();
    hasher.update(POW_DOMAIN_TAG);
    hasher.update(hash.as_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest = hasher.finalize();
    leading_zero_bits(&digest) >= required_bits
}
