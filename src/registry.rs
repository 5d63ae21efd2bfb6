//! Job registry and lifecycle state machine
//!
//! Owns job specs and statuses and orchestrates validation, queue
//! membership, terminal transitions, and the payment notification. Status
//! moves `Pending -> {Verified | Failed | Expired}` exactly once; no
//! operation transitions out of a terminal state. The payment gate is
//! invoked only inside the `Pending -> Verified` transition, which makes
//! at-most-once delivery structural rather than flag-guarded; the
//! `payment_notified` field on the record exists for observability.

use chrono::{DateTime, Duration, Utc};

use std::collections::HashMap;

use crate::commitment::ProofHash;
use crate::config::Ownership;
use crate::enclave::EnclaveRegistry;
use crate::error::{GatewayError, RejectReason};
use crate::payment::PaymentGate;
use crate::queue::PendingQueue;
use crate::types::{
    EventLog, GatewayEvent, JobId, JobRecord, ProofJobSpec, ProofStatus, ProofSubmission,
    ProofType,
};
use crate::validator::{validate_structure, ValidationLimits};

pub struct ProofRegistry {
    jobs: HashMap<JobId, JobRecord>,
    queue: PendingQueue,
    limits: ValidationLimits,
    ownership: Ownership,
    proof_ttl: Duration,
    total_verified: u64,
    total_rejected: u64,
}

impl ProofRegistry {
    pub fn new(limits: ValidationLimits, ownership: Ownership, proof_ttl: Duration) -> Self {
        Self {
            jobs: HashMap::new(),
            queue: PendingQueue::new(),
            limits,
            ownership,
            proof_ttl,
            total_verified: 0,
            total_rejected: 0,
        }
    }

    /// Register a job and enqueue it under its proof type.
    pub fn submit_proof_job(&mut self, spec: ProofJobSpec) -> Result<JobId, GatewayError> {
        let job_id = spec.job_id;
        if self.jobs.contains_key(&job_id) {
            return Err(GatewayError::DuplicateJob { job_id });
        }
        let now = Utc::now();
        let record = JobRecord {
            status: ProofStatus::Pending,
            created_at: now,
            deadline: now + self.proof_ttl,
            proof_hash: None,
            verified_by: None,
            verified_at: None,
            failure_reason: None,
            payment_notified: false,
            spec,
        };
        let type_code = record.spec.proof_type.code();
        self.jobs.insert(job_id, record);
        self.queue.enqueue(type_code, job_id);
        tracing::info!(job_id, proof_type = type_code, "proof job registered");
        Ok(job_id)
    }

    /// Verify a worker-supplied proof against a pending job.
    ///
    /// The queue entry is tombstoned before any validation runs, so no
    /// second submission can observe the job as available while this one
    /// is in flight. Returns the verification outcome; a rejection is a
    /// completed operation, not an error.
    pub fn submit_proof(
        &mut self,
        submission: ProofSubmission,
        enclaves: &EnclaveRegistry,
        gate: &dyn PaymentGate,
        events: &mut EventLog,
    ) -> Result<bool, GatewayError> {
        let job_id = submission.job_id;
        self.take_pending(job_id)?;

        let precheck = self.precheck(&submission, enclaves);
        if let Err(reason) = precheck {
            return Ok(self.reject(job_id, reason, events));
        }

        let expected = match ProofHash::from_hex(&submission.proof_hash) {
            Some(h) => h,
            None => return Ok(self.reject(job_id, RejectReason::HashMismatch, events)),
        };

        let io = self.jobs[&job_id].spec.io.clone();
        match validate_structure(&submission.proof_data, Some(&expected), io.as_ref(), &self.limits)
        {
            Ok(hash) => Ok(self.accept(job_id, &submission.worker_id, hash, gate, events)),
            Err(reason) => Ok(self.reject(job_id, reason, events)),
        }
    }

    /// Verify a proof with the commitment hash computed here instead of
    /// supplied by the worker. Otherwise the same contract as
    /// [`submit_proof`].
    pub fn verify_proof(
        &mut self,
        job_id: JobId,
        worker_id: &str,
        proof_data: &[u64],
        gate: &dyn PaymentGate,
        events: &mut EventLog,
    ) -> Result<bool, GatewayError> {
        self.take_pending(job_id)?;

        let io = self.jobs[&job_id].spec.io.clone();
        match validate_structure(proof_data, None, io.as_ref(), &self.limits) {
            Ok(hash) => Ok(self.accept(job_id, worker_id, hash, gate, events)),
            Err(reason) => Ok(self.reject(job_id, reason, events)),
        }
    }

    /// Live pending jobs of a type, oldest first. O(queue length).
    pub fn get_pending_jobs(&self, proof_type: ProofType, max: usize) -> Vec<JobId> {
        self.queue.scan(proof_type.code(), max, |id| {
            self.jobs
                .get(&id)
                .map(|j| j.status == ProofStatus::Pending)
                .unwrap_or(false)
        })
    }

    /// Administrative cancellation of a pending job.
    pub fn cancel_proof_job(&mut self, job_id: JobId, caller: &str) -> Result<(), GatewayError> {
        if !self.ownership.is_admin(caller) {
            return Err(GatewayError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        self.take_pending(job_id)?;
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.status = ProofStatus::Expired;
        }
        tracing::info!(job_id, caller, "proof job cancelled");
        Ok(())
    }

    /// Expire every pending job whose deadline has elapsed. Returns the
    /// expired ids.
    pub fn expire_overdue_jobs(&mut self, now: DateTime<Utc>) -> Vec<JobId> {
        let overdue: Vec<JobId> = self
            .jobs
            .iter()
            .filter(|(_, j)| j.status == ProofStatus::Pending && j.deadline <= now)
            .map(|(&id, _)| id)
            .collect();
        for &job_id in &overdue {
            self.queue.remove(job_id);
            if let Some(job) = self.jobs.get_mut(&job_id) {
                job.status = ProofStatus::Expired;
            }
            tracing::info!(job_id, "proof job expired");
        }
        overdue
    }

    pub fn get_job(&self, job_id: JobId) -> Option<&JobRecord> {
        self.jobs.get(&job_id)
    }

    pub fn total_verified(&self) -> u64 {
        self.total_verified
    }

    pub fn total_rejected(&self) -> u64 {
        self.total_rejected
    }

    /// Require the job to exist and be pending, then tombstone its queue
    /// entry. The first step of every transition attempt: after this, no
    /// concurrent scan can hand the job out again.
    fn take_pending(&mut self, job_id: JobId) -> Result<(), GatewayError> {
        let Some(job) = self.jobs.get(&job_id) else {
            return Err(GatewayError::NotFound {
                what: format!("job {job_id}"),
            });
        };
        if job.status.is_terminal() {
            return Err(GatewayError::InvalidState {
                job_id,
                status: job.status,
                required: ProofStatus::Pending,
            });
        }
        self.queue.remove(job_id);
        Ok(())
    }

    /// Cheap submission prechecks that run before structural validation.
    fn precheck(
        &self,
        submission: &ProofSubmission,
        enclaves: &EnclaveRegistry,
    ) -> Result<(), RejectReason> {
        if submission.proof_data.len() < self.limits.min_elements {
            return Err(RejectReason::TooShort);
        }
        if submission.attestation.trim().is_empty() {
            return Err(RejectReason::MissingAttestation);
        }
        if let Some(measurement) = &submission.enclave_measurement {
            if !enclaves.is_whitelisted(measurement) {
                return Err(RejectReason::EnclaveNotWhitelisted);
            }
        }
        Ok(())
    }

    fn accept(
        &mut self,
        job_id: JobId,
        worker_id: &str,
        hash: ProofHash,
        gate: &dyn PaymentGate,
        events: &mut EventLog,
    ) -> bool {
        let now = Utc::now();
        let hash_hex = hash.to_hex();
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.status = ProofStatus::Verified;
            job.proof_hash = Some(hash_hex.clone());
            job.verified_by = Some(worker_id.to_string());
            job.verified_at = Some(now);
            job.payment_notified = true;
        }
        self.total_verified += 1;
        tracing::info!(job_id, worker = worker_id, "proof verified");
        events.push(GatewayEvent::ProofVerified {
            job_id,
            worker_id: worker_id.to_string(),
            proof_hash: hash_hex.clone(),
            timestamp: now,
        });
        gate.on_proof_verified(job_id, &hash_hex);
        true
    }

    fn reject(&mut self, job_id: JobId, reason: RejectReason, events: &mut EventLog) -> bool {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.status = ProofStatus::Failed;
            job.failure_reason = Some(reason);
        }
        self.total_rejected += 1;
        tracing::warn!(job_id, %reason, "proof rejected");
        events.push(GatewayEvent::ProofRejected { job_id, reason });
        false
    }
}
