//! Proof verification gateway
//!
//! Accepts succinct proofs from GPU workers for registered compute jobs,
//! validates their structure and embedded commitments, tracks job
//! lifecycle, and releases payment exactly once per verified job.

pub mod api;
pub mod commitment;
pub mod config;
pub mod enclave;
pub mod error;
pub mod field;
pub mod payment;
pub mod pow;
pub mod queue;
pub mod registry;
pub mod types;
pub mod validator;

use chrono::Duration;

use crate::config::{Config, Ownership};
use crate::enclave::EnclaveRegistry;
use crate::payment::{LogPaymentGate, PaymentGate, WebhookPaymentGate};
use crate::registry::ProofRegistry;
use crate::types::EventLog;

pub use crate::error::{GatewayError, RejectReason};
pub use crate::types::{
    GatewayEvent, JobId, JobRecord, ProofJobSpec, ProofStatus, ProofSubmission, ProofType,
    VerificationStats,
};

/// Shared application state
pub struct AppState {
    pub registry: ProofRegistry,
    pub enclaves: EnclaveRegistry,
    pub events: EventLog,
    pub gate: Box<dyn PaymentGate>,
    pub ownership: Ownership,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let ownership = Ownership::from(&config.auth);
        let gate: Box<dyn PaymentGate> = match &config.payment.webhook_url {
            Some(url) => Box::new(WebhookPaymentGate::new(url.clone())),
            None => Box::new(LogPaymentGate),
        };
        Self {
            registry: ProofRegistry::new(
                config.validation.limits(),
                ownership.clone(),
                Duration::seconds(config.validation.proof_ttl_secs),
            ),
            enclaves: EnclaveRegistry::new(ownership.clone()),
            events: EventLog::new(),
            gate,
            ownership,
        }
    }
}
