//! End-to-end gateway scenarios: job registration through verification,
//! rejection, replay, cancellation, and payment release.

use std::sync::Mutex;

use chrono::Duration;

use proof_gateway::commitment::proof_hash;
use proof_gateway::config::Ownership;
use proof_gateway::enclave::EnclaveRegistry;
use proof_gateway::payment::PaymentGate;
use proof_gateway::pow::check_pow;
use proof_gateway::registry::ProofRegistry;
use proof_gateway::types::EventLog;
use proof_gateway::validator::ValidationLimits;
use proof_gateway::{
    GatewayError, GatewayEvent, JobId, ProofJobSpec, ProofStatus, ProofSubmission, ProofType,
    RejectReason,
};

const POW_BITS: u32 = 16;

#[derive(Default)]
struct RecordingGate {
    calls: Mutex<Vec<(JobId, String)>>,
}

impl RecordingGate {
    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl PaymentGate for RecordingGate {
    fn on_proof_verified(&self, job_id: JobId, proof_hash: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((job_id, proof_hash.to_string()));
    }
}

struct Gateway {
    registry: ProofRegistry,
    enclaves: EnclaveRegistry,
    events: EventLog,
    gate: RecordingGate,
}

fn gateway() -> Gateway {
    let ownership = Ownership::new("admin", Vec::new());
    let limits = ValidationLimits {
        min_elements: 32,
        min_layers: 4,
        pow_bits: POW_BITS,
    };
    Gateway {
        registry: ProofRegistry::new(limits, ownership.clone(), Duration::hours(1)),
        enclaves: EnclaveRegistry::new(ownership),
        events: EventLog::new(),
        gate: RecordingGate::default(),
    }
}

fn spec(job_id: JobId, proof_type: ProofType) -> ProofJobSpec {
    ProofJobSpec {
        job_id,
        proof_type,
        created_by: "poster".to_string(),
        description: "batch inference run".to_string(),
        io: None,
    }
}

/// 40 elements: two non-zero commitments, 4 layers of 3 elements plus
/// filler, everything inside the field, trailing nonce ground to the
/// 16-bit target.
fn well_formed_proof() -> Vec<u64> {
    let mut data: Vec<u64> = (0..40u64).map(|i| i * 31 + 17).collect();
    grind(&mut data);
    data
}

fn grind(data: &mut [u64]) {
    let last = data.len() - 1;
    for nonce in 1u64.. {
        data[last] = nonce;
        if check_pow(&proof_hash(data), nonce, POW_BITS) {
            return;
        }
    }
    unreachable!("nonce space exhausted");
}

fn submission(job_id: JobId, data: Vec<u64>) -> ProofSubmission {
    let hash = proof_hash(&data).to_hex();
    ProofSubmission {
        job_id,
        worker_id: "gpu-worker-7".to_string(),
        proof_data: data,
        proof_hash: hash,
        attestation: "ed25519:deadbeef".to_string(),
        enclave_measurement: None,
    }
}

fn submit(gw: &mut Gateway, sub: ProofSubmission) -> Result<bool, GatewayError> {
    gw.registry
        .submit_proof(sub, &gw.enclaves, &gw.gate, &mut gw.events)
}

#[test]
fn valid_proof_verifies_and_releases_payment() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(1, ProofType::PrimaryBatch))
        .unwrap();

    let data = well_formed_proof();
    let expected_hash = proof_hash(&data).to_hex();
    assert!(submit(&mut gw, submission(1, data)).unwrap());

    let job = gw.registry.get_job(1).unwrap();
    assert_eq!(job.status, ProofStatus::Verified);
    assert_eq!(job.proof_hash.as_deref(), Some(expected_hash.as_str()));
    assert_eq!(job.verified_by.as_deref(), Some("gpu-worker-7"));
    assert!(job.verified_at.is_some());
    assert!(job.payment_notified);

    // Exactly one payment call, for this job, with the recorded hash.
    let calls = gw.gate.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (1, expected_hash));
    drop(calls);

    // Exactly one verified event.
    let verified_events: Vec<_> = gw
        .events
        .all()
        .iter()
        .filter(|e| matches!(e, GatewayEvent::ProofVerified { job_id: 1, .. }))
        .collect();
    assert_eq!(verified_events.len(), 1);

    // Job left its pending queue.
    assert!(gw
        .registry
        .get_pending_jobs(ProofType::PrimaryBatch, 10)
        .is_empty());
}

#[test]
fn short_proof_fails_without_payment() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(2, ProofType::PrimaryBatch))
        .unwrap();

    let mut data = well_formed_proof();
    data.truncate(20);
    let hash = proof_hash(&data).to_hex();
    let sub = ProofSubmission {
        proof_hash: hash,
        proof_data: data,
        ..submission(2, vec![])
    };
    assert!(!submit(&mut gw, sub).unwrap());

    let job = gw.registry.get_job(2).unwrap();
    assert_eq!(job.status, ProofStatus::Failed);
    assert_eq!(job.failure_reason, Some(RejectReason::TooShort));
    assert_eq!(gw.gate.count(), 0);
    assert!(matches!(
        gw.events.all().last(),
        Some(GatewayEvent::ProofRejected {
            job_id: 2,
            reason: RejectReason::TooShort,
        })
    ));
}

#[test]
fn zero_trace_commitment_rejected_regardless_of_rest() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(3, ProofType::Recursive))
        .unwrap();

    let mut data = well_formed_proof();
    data[0] = 0;
    grind(&mut data);
    let sub = submission(3, data);
    assert!(!submit(&mut gw, sub).unwrap());
    assert_eq!(
        gw.registry.get_job(3).unwrap().failure_reason,
        Some(RejectReason::ZeroCommitment)
    );
    assert_eq!(gw.gate.count(), 0);
}

#[test]
fn replayed_submission_cannot_double_pay() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(4, ProofType::PrimaryBatch))
        .unwrap();

    assert!(submit(&mut gw, submission(4, well_formed_proof())).unwrap());
    assert_eq!(gw.gate.count(), 1);

    // A second, also valid, proof for the same job must bounce off the
    // terminal state with no side effects.
    let mut second: Vec<u64> = (0..40u64).map(|i| i * 7 + 3).collect();
    grind(&mut second);
    let err = submit(&mut gw, submission(4, second)).unwrap_err();
    assert!(matches!(err, GatewayError::InvalidState { .. }));

    assert_eq!(gw.registry.get_job(4).unwrap().status, ProofStatus::Verified);
    assert_eq!(gw.gate.count(), 1, "payment must fire at most once");
    assert_eq!(gw.registry.total_verified(), 1);
}

#[test]
fn verified_job_leaves_pending_scan() {
    let mut gw = gateway();
    for id in 10..15 {
        gw.registry
            .submit_proof_job(spec(id, ProofType::PrimaryBatch))
            .unwrap();
    }
    assert!(submit(&mut gw, submission(12, well_formed_proof())).unwrap());

    let pending = gw.registry.get_pending_jobs(ProofType::PrimaryBatch, 10);
    assert_eq!(pending, vec![10, 11, 13, 14]);
    assert!(!pending.contains(&12));
}

#[test]
fn cancelled_job_expires_without_payment() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(5, ProofType::Inference))
        .unwrap();

    gw.registry.cancel_proof_job(5, "admin").unwrap();

    let job = gw.registry.get_job(5).unwrap();
    assert_eq!(job.status, ProofStatus::Expired);
    assert!(gw
        .registry
        .get_pending_jobs(ProofType::Inference, 10)
        .is_empty());
    assert_eq!(gw.gate.count(), 0);

    // Terminal: a proof arriving after cancellation is rejected outright.
    let err = submit(&mut gw, submission(5, well_formed_proof())).unwrap_err();
    assert!(matches!(err, GatewayError::InvalidState { .. }));
    assert_eq!(gw.registry.get_job(5).unwrap().status, ProofStatus::Expired);
}

#[test]
fn out_of_field_element_always_rejected() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(6, ProofType::PrimaryBatch))
        .unwrap();

    let mut data = well_formed_proof();
    data[17] = 1 << 31; // just past the modulus
    grind(&mut data);
    assert!(!submit(&mut gw, submission(6, data)).unwrap());
    assert_eq!(
        gw.registry.get_job(6).unwrap().failure_reason,
        Some(RejectReason::OutOfField)
    );
}

#[test]
fn hash_mismatch_is_a_rejection() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(7, ProofType::PrimaryBatch))
        .unwrap();

    let data = well_formed_proof();
    let mut sub = submission(7, data);
    // Claim a hash for a different blob.
    sub.proof_hash = proof_hash(&[1, 2, 3]).to_hex();
    assert!(!submit(&mut gw, sub).unwrap());
    assert_eq!(
        gw.registry.get_job(7).unwrap().failure_reason,
        Some(RejectReason::HashMismatch)
    );
    assert_eq!(gw.gate.count(), 0);
}

#[test]
fn hash_commitment_is_order_sensitive() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..50 {
        let len = rng.gen_range(4..64);
        let seq: Vec<u64> = (0..len).map(|_| rng.gen_range(0..u64::MAX)).collect();
        assert_eq!(proof_hash(&seq), proof_hash(&seq));

        let mut swapped = seq.clone();
        let i = rng.gen_range(0..len);
        let mut j = rng.gen_range(0..len);
        while swapped[i] == swapped[j] {
            j = rng.gen_range(0..len);
        }
        swapped.swap(i, j);
        assert_ne!(
            proof_hash(&seq),
            proof_hash(&swapped),
            "swap of distinct elements must change the hash"
        );
    }
}

#[test]
fn zero_nonce_never_passes() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(8, ProofType::PrimaryBatch))
        .unwrap();

    let mut data = well_formed_proof();
    let last = data.len() - 1;
    data[last] = 0;
    let sub = submission(8, data);
    assert!(!submit(&mut gw, sub).unwrap());
    assert_eq!(
        gw.registry.get_job(8).unwrap().failure_reason,
        Some(RejectReason::PowNotSatisfied)
    );
}

#[test]
fn server_side_hash_variant_matches_contract() {
    let mut gw = gateway();
    gw.registry
        .submit_proof_job(spec(9, ProofType::CrossDomainBridge))
        .unwrap();

    let data = well_formed_proof();
    let verified = gw
        .registry
        .verify_proof(9, "gpu-worker-9", &data, &gw.gate, &mut gw.events)
        .unwrap();
    assert!(verified);
    assert_eq!(
        gw.registry.get_job(9).unwrap().proof_hash,
        Some(proof_hash(&data).to_hex())
    );
    assert_eq!(gw.gate.count(), 1);
}
