//! Gateway error taxonomy

use serde::{Deserialize, Serialize};

use crate::types::{JobId, ProofStatus};

/// Coarse reason tag attached to a proof rejection.
///
/// Deliberately coarse: the validator never reports which element or
/// which layer failed, only the category of failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooShort,
    MissingAttestation,
    OutOfField,
    InsufficientLayers,
    ZeroCommitment,
    PowNotSatisfied,
    HashMismatch,
    IoBindingMismatch,
    EnclaveNotWhitelisted,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::TooShort => "proof too short",
            RejectReason::MissingAttestation => "missing attestation",
            RejectReason::OutOfField => "element out of field range",
            RejectReason::InsufficientLayers => "insufficient layer data",
            RejectReason::ZeroCommitment => "zero commitment",
            RejectReason::PowNotSatisfied => "proof of work below difficulty",
            RejectReason::HashMismatch => "proof hash mismatch",
            RejectReason::IoBindingMismatch => "io binding commitment mismatch",
            RejectReason::EnclaveNotWhitelisted => "enclave measurement not whitelisted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("proof rejected: {0}")]
    Validation(RejectReason),

    #[error("caller {caller} is not authorized")]
    Unauthorized { caller: String },

    #[error("job {job_id} is in state {status:?}, operation requires {required:?}")]
    InvalidState {
        job_id: JobId,
        status: ProofStatus,
        required: ProofStatus,
    },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("job {job_id} already registered")]
    DuplicateJob { job_id: JobId },
}
