//! API handlers for the gateway

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::enclave::{EnclaveInfo, TeeType};
use crate::error::{GatewayError, RejectReason};
use crate::types::{
    GatewayEvent, IoClaim, JobId, JobRecord, ProofJobSpec, ProofSubmission, ProofType,
    VerificationStats,
};
use crate::AppState;

type Shared = Arc<RwLock<AppState>>;

fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GatewayError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        GatewayError::InvalidState { .. } => StatusCode::CONFLICT,
        GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::DuplicateJob { .. } => StatusCode::CONFLICT,
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub job_id: JobId,
    pub proof_type: u8,
    pub created_by: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub io: Option<IoClaim>,
}

/// Register a proof job
pub async fn submit_job(
    State(state): State<Shared>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<Json<JobRecord>, StatusCode> {
    let proof_type = ProofType::from_code(req.proof_type).ok_or(StatusCode::BAD_REQUEST)?;
    let spec = ProofJobSpec {
        job_id: req.job_id,
        proof_type,
        created_by: req.created_by,
        description: req.description,
        io: req.io,
    };
    let mut state = state.write().await;
    let job_id = state
        .registry
        .submit_proof_job(spec)
        .map_err(|e| status_for(&e))?;
    state
        .registry
        .get_job(job_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Get single job
pub async fn get_job(
    State(state): State<Shared>,
    Path(id): Path<JobId>,
) -> Result<Json<JobRecord>, StatusCode> {
    let state = state.read().await;
    state
        .registry
        .get_job(id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
pub struct SubmitProofRequest {
    pub worker_id: String,
    pub proof_data: Vec<u64>,
    pub proof_hash: String,
    pub attestation: String,
    #[serde(default)]
    pub enclave_measurement: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub job_id: JobId,
    pub verified: bool,
    pub proof_hash: Option<String>,
    pub reason: Option<RejectReason>,
}

/// Submit a proof for a pending job
pub async fn submit_proof(
    State(state): State<Shared>,
    Path(id): Path<JobId>,
    Json(req): Json<SubmitProofRequest>,
) -> Result<Json<VerifyResponse>, StatusCode> {
    let submission = ProofSubmission {
        job_id: id,
        worker_id: req.worker_id,
        proof_data: req.proof_data,
        proof_hash: req.proof_hash,
        attestation: req.attestation,
        enclave_measurement: req.enclave_measurement,
    };
    let mut state = state.write().await;
    let AppState {
        registry,
        enclaves,
        events,
        gate,
        ..
    } = &mut *state;
    let verified = registry
        .submit_proof(submission, enclaves, gate.as_ref(), events)
        .map_err(|e| status_for(&e))?;
    Ok(Json(outcome(registry.get_job(id), id, verified)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub job_id: JobId,
    pub worker_id: String,
    pub proof_data: Vec<u64>,
}

/// Verify a proof with the hash computed server-side
pub async fn verify_proof(
    State(state): State<Shared>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, StatusCode> {
    let mut state = state.write().await;
    let AppState {
        registry,
        events,
        gate,
        ..
    } = &mut *state;
    let verified = registry
        .verify_proof(req.job_id, &req.worker_id, &req.proof_data, gate.as_ref(), events)
        .map_err(|e| status_for(&e))?;
    Ok(Json(outcome(registry.get_job(req.job_id), req.job_id, verified)))
}

fn outcome(job: Option<&JobRecord>, job_id: JobId, verified: bool) -> VerifyResponse {
    VerifyResponse {
        job_id,
        verified,
        proof_hash: job.and_then(|j| j.proof_hash.clone()),
        reason: job.and_then(|j| j.failure_reason),
    }
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub proof_type: u8,
    pub limit: Option<usize>,
}

/// List pending jobs for a proof type
pub async fn pending_jobs(
    State(state): State<Shared>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<JobId>>, StatusCode> {
    let proof_type = ProofType::from_code(query.proof_type).ok_or(StatusCode::BAD_REQUEST)?;
    let state = state.read().await;
    let jobs = state
        .registry
        .get_pending_jobs(proof_type, query.limit.unwrap_or(100));
    Ok(Json(jobs))
}

#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

/// Cancel a pending job (admin)
pub async fn cancel_job(
    State(state): State<Shared>,
    Path(id): Path<JobId>,
    Json(req): Json<CallerRequest>,
) -> Result<StatusCode, StatusCode> {
    let mut state = state.write().await;
    state
        .registry
        .cancel_proof_job(id, &req.caller)
        .map_err(|e| status_for(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct WhitelistRequest {
    pub measurement: String,
    pub tee_type: u8,
    #[serde(default)]
    pub description: String,
    pub caller: String,
}

/// Whitelist an enclave measurement (admin)
pub async fn whitelist_enclave(
    State(state): State<Shared>,
    Json(req): Json<WhitelistRequest>,
) -> Result<StatusCode, StatusCode> {
    let tee_type = TeeType::from_code(req.tee_type).ok_or(StatusCode::BAD_REQUEST)?;
    let mut state = state.write().await;
    let AppState {
        enclaves, events, ..
    } = &mut *state;
    enclaves
        .whitelist(&req.measurement, tee_type, &req.description, &req.caller, events)
        .map_err(|e| status_for(&e))?;
    Ok(StatusCode::CREATED)
}

/// Revoke an enclave measurement (admin)
pub async fn revoke_enclave(
    State(state): State<Shared>,
    Path(measurement): Path<String>,
    Json(req): Json<CallerRequest>,
) -> Result<StatusCode, StatusCode> {
    let mut state = state.write().await;
    let AppState {
        enclaves, events, ..
    } = &mut *state;
    enclaves
        .revoke(&measurement, &req.caller, events)
        .map_err(|e| status_for(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get enclave info
pub async fn get_enclave(
    State(state): State<Shared>,
    Path(measurement): Path<String>,
) -> Result<Json<EnclaveInfo>, StatusCode> {
    let state = state.read().await;
    state
        .enclaves
        .get(&measurement)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Gateway verification counters
pub async fn stats(State(state): State<Shared>) -> Json<VerificationStats> {
    let state = state.read().await;
    Json(VerificationStats {
        total_verified: state.registry.total_verified(),
        total_rejected: state.registry.total_rejected(),
        whitelisted_count: state.enclaves.whitelisted_total(),
    })
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// Recent gateway events, newest last
pub async fn events(
    State(state): State<Shared>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<GatewayEvent>> {
    let state = state.read().await;
    Json(state.events.recent(query.limit.unwrap_or(100)).to_vec())
}

/// Expire overdue pending jobs (admin sweep)
pub async fn expire_jobs(
    State(state): State<Shared>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<Vec<JobId>>, StatusCode> {
    let mut state = state.write().await;
    if !state.ownership.is_admin(&req.caller) {
        return Err(StatusCode::FORBIDDEN);
    }
    let expired = state.registry.expire_overdue_jobs(chrono::Utc::now());
    Ok(Json(expired))
}
