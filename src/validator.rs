//! Structural proof validation
//!
//! Decides whether a submitted blob has the minimum shape of a valid
//! succinct proof: commitments present, enough layer data, every element
//! in field range, a nonce clearing the grinding target, and a hash that
//! matches the commitment over the full sequence. None of this re-derives
//! the proof's algebraic validity; that is the job of a lower-level
//! verifier.

use serde::Deserialize;

use crate::commitment::{io_commitment, proof_hash, ProofHash};
use crate::error::RejectReason;
use crate::field::first_out_of_field;
use crate::pow::{check_pow, DEFAULT_POW_BITS};
use crate::types::IoClaim;

/// Element index of the trace commitment.
pub const TRACE_COMMITMENT_INDEX: usize = 0;
/// Element index of the composition commitment.
pub const COMPOSITION_COMMITMENT_INDEX: usize = 1;
/// First element of the layer data region.
pub const LAYER_DATA_START: usize = 2;
/// Element index reserved for the IO-binding commitment.
pub const IO_COMMITMENT_INDEX: usize = 4;
/// Smallest useful layer: commitment, randomness, evaluations.
pub const ELEMENTS_PER_LAYER: usize = 3;

/// Validation thresholds. Loaded from configuration; defaults match the
/// deployed verifier.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub min_elements: usize,
    pub min_layers: usize,
    pub pow_bits: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_elements: 32,
            min_layers: 4,
            pow_bits: DEFAULT_POW_BITS,
        }
    }
}

/// Run the layered structural checks over `proof_data`.
///
/// Checks run in a fixed order and short-circuit on the first failure,
/// reporting only a coarse [`RejectReason`]. On success returns the
/// computed commitment hash over the full sequence.
///
/// `expected_hash` is the submitter's claimed hash; pass `None` when the
/// hash is computed server-side. `io` is the job's declared IO claim, if
/// any.
pub fn validate_structure(
    proof_data: &[u64],
    expected_hash: Option<&ProofHash>,
    io: Option<&IoClaim>,
    limits: &ValidationLimits,
) -> Result<ProofHash, RejectReason> {
    // 1. Fail fast on short blobs before touching anything else.
    if proof_data.len() < limits.min_elements {
        return Err(RejectReason::TooShort);
    }

    // 2. Both head commitments must be present and non-zero.
    if proof_data[TRACE_COMMITMENT_INDEX] == 0
        || proof_data[COMPOSITION_COMMITMENT_INDEX] == 0
    {
        return Err(RejectReason::ZeroCommitment);
    }

    // 3. The region between the commitments and the trailing nonce must
    //    hold at least the configured number of layers.
    let layer_region = proof_data.len() - LAYER_DATA_START - 1;
    if layer_region < limits.min_layers * ELEMENTS_PER_LAYER {
        return Err(RejectReason::InsufficientLayers);
    }

    // 4. Every element must be a canonical field element.
    if first_out_of_field(proof_data).is_some() {
        return Err(RejectReason::OutOfField);
    }

    // 5. The trailing nonce must clear the grinding target derived from
    //    the commitment over the full sequence.
    let computed = proof_hash(proof_data);
    let nonce = proof_data[proof_data.len() - 1];
    if !check_pow(&computed, nonce, limits.pow_bits) {
        return Err(RejectReason::PowNotSatisfied);
    }

    // 6. The claimed hash must match the recomputed one. A mismatch means
    //    the submitter is attesting to a different blob than the one sent.
    if let Some(expected) = expected_hash {
        if *expected != computed {
            return Err(RejectReason::HashMismatch);
        }
    }

    // 7. IO binding: the reserved element must commit to the job's
    //    declared inputs and outputs, so a proof ground for one job
    //    cannot be replayed for another.
    if let Some(claim) = io {
        let bound = io_commitment(
            &claim.inputs,
            &claim.outputs,
            claim.trace_length,
            claim.trace_width,
        );
        if proof_data.get(IO_COMMITMENT_INDEX) != Some(&bound) {
            return Err(RejectReason::IoBindingMismatch);
        }
    }

    Ok(computed)
}
