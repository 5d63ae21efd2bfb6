//! Commitment hashing over ordered field-element sequences
//!
//! All hashes are domain-separated SHA-256 stream hashes. Element order
//! matters: the digest absorbs each element in sequence, so any swap,
//! insertion, or removal changes the result. An additive or XOR checksum
//! would let a submitter cancel chosen elements against each other, which
//! is why none is used here.

use sha2::{Digest, Sha256};

use crate::field::M31_MODULUS;

/// Domain tag for full-proof hashes.
const PROOF_DOMAIN_TAG: &[u8] = b"proof-gateway/proof/v1";

/// Domain tag for IO-binding commitments.
const IO_DOMAIN_TAG: &[u8] = b"proof-gateway/io-binding/v1";

/// Fixed-width commitment hash over a proof.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProofHash([u8; 32]);

impl ProofHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(ProofHash(arr))
    }
}

/// Hash the full ordered element sequence into a single commitment.
pub fn proof_hash(elements: &[u64]) -> ProofHash {
    let mut hasher = Sha256::new();
    hasher.update(PROOF_DOMAIN_TAG);
    hasher.update((elements.len() as u64).to_le_bytes());
    for &e in elements {
        hasher.update(e.to_le_bytes());
    }
    ProofHash(hasher.finalize().into())
}

/// Commitment binding a proof to a job's declared inputs and outputs.
///
/// Length-prefixes both sequences so `([a], [b])` and `([a, b], [])`
/// cannot collide, then folds in the trace dimensions. The digest is
/// reduced to a non-zero field element so it can live inside the proof's
/// element array.
pub fn io_commitment(
    inputs: &[u64],
    outputs: &[u64],
    trace_length: u64,
    trace_width: u64,
) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(IO_DOMAIN_TAG);
    hasher.update((inputs.len() as u64).to_le_bytes());
    for &v in inputs {
        hasher.update(v.to_le_bytes());
    }
    hasher.update((outputs.len() as u64).to_le_bytes());
    for &v in outputs {
        hasher.update(v.to_le_bytes());
    }
    hasher.update(trace_length.to_le_bytes());
    hasher.update(trace_width.to_le_bytes());
    let digest = hasher.finalize();

    let raw = u64::from_le_bytes(digest[..8].try_into().unwrap_or([0u8; 8]));
    // Reduce into [1, modulus - 1]: a zero commitment would be
    // indistinguishable from a missing one.
    raw % (M31_MODULUS - 1) + 1
}
