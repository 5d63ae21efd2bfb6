//! Common types for the proof gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RejectReason;

/// Job identifier. Assigned by the submitter, unique for the lifetime of
/// the gateway.
pub type JobId = u64;

/// Proof family a job belongs to. Codes are stable storage/queue indices
/// and must never be renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofType {
    PrimaryBatch,
    Recursive,
    Inference,
    CrossDomainBridge,
    ApplicationSpecific,
}

impl ProofType {
    pub fn code(self) -> u8 {
        match self {
            ProofType::PrimaryBatch => 0,
            ProofType::Recursive => 1,
            ProofType::Inference => 2,
            ProofType::CrossDomainBridge => 3,
            ProofType::ApplicationSpecific => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ProofType::PrimaryBatch),
            1 => Some(ProofType::Recursive),
            2 => Some(ProofType::Inference),
            3 => Some(ProofType::CrossDomainBridge),
            4 => Some(ProofType::ApplicationSpecific),
            _ => None,
        }
    }
}

/// Job status. `Pending` is the only non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    Pending,
    Verified,
    Failed,
    Expired,
}

impl ProofStatus {
    pub fn is_terminal(self) -> bool {
        self != ProofStatus::Pending
    }
}

/// Declared inputs and outputs a proof must be bound to.
///
/// When present on a job, the submitted proof must embed the matching
/// commitment at the reserved element index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IoClaim {
    pub inputs: Vec<u64>,
    pub outputs: Vec<u64>,
    pub trace_length: u64,
    pub trace_width: u64,
}

/// Immutable description of a unit of outsourced work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofJobSpec {
    pub job_id: JobId,
    pub proof_type: ProofType,
    pub created_by: String,
    #[serde(default)]
    pub description: String,
    /// Optional IO binding claim. `None` skips the binding check.
    #[serde(default)]
    pub io: Option<IoClaim>,
}

/// A worker's proof submission. Transient: only derived fields persist.
#[derive(Clone, Debug, Deserialize)]
pub struct ProofSubmission {
    pub job_id: JobId,
    pub worker_id: String,
    pub proof_data: Vec<u64>,
    /// Hex-encoded hash the worker claims for `proof_data`.
    pub proof_hash: String,
    pub attestation: String,
    /// Set when the worker claims hardware-attested execution. The
    /// measurement must be whitelisted in the enclave registry.
    #[serde(default)]
    pub enclave_measurement: Option<String>,
}

/// Full record of a job held by the registry.
#[derive(Clone, Debug, Serialize)]
pub struct JobRecord {
    pub spec: ProofJobSpec,
    pub status: ProofStatus,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub proof_hash: Option<String>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<RejectReason>,
    pub payment_notified: bool,
}

/// Monotone verification counters. Derived state, not authoritative.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct VerificationStats {
    pub total_verified: u64,
    pub total_rejected: u64,
    pub whitelisted_count: u64,
}

/// Externally observable gateway events.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    ProofVerified {
        job_id: JobId,
        worker_id: String,
        proof_hash: String,
        timestamp: DateTime<Utc>,
    },
    ProofRejected {
        job_id: JobId,
        reason: RejectReason,
    },
    EnclaveWhitelisted {
        measurement: String,
        authorized_by: String,
    },
    EnclaveRevoked {
        measurement: String,
        revoked_by: String,
    },
}

/// Append-only in-memory event log.
#[derive(Default)]
pub struct EventLog {
    events: Vec<GatewayEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GatewayEvent) {
        self.events.push(event);
    }

    /// Most recent events, newest last.
    pub fn recent(&self, limit: usize) -> &[GatewayEvent] {
        let start = self.events.len().saturating_sub(limit);
        &self.events[start..]
    }

    pub fn all(&self) -> &[GatewayEvent] {
        &self.events
    }
}
