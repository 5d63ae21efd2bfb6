//! Payment gate notification
//!
//! The gateway releases funds by notifying a payment collaborator once per
//! verified job. The callback is fire-and-forget: a delivery failure is
//! logged and never rolls back verification state. At-most-once delivery
//! is guaranteed by the caller, which only invokes the gate inside the
//! single transition out of `Pending`.

use serde::Serialize;

use crate::types::JobId;

pub trait PaymentGate: Send + Sync {
    fn on_proof_verified(&self, job_id: JobId, proof_hash: &str);
}

/// Logs the notification without calling anything. Default when no
/// webhook is configured.
pub struct LogPaymentGate;

impl PaymentGate for LogPaymentGate {
    fn on_proof_verified(&self, job_id: JobId, proof_hash: &str) {
        tracing::info!(job_id, proof_hash, "payment release notification");
    }
}

#[derive(Serialize)]
struct PaymentNotice {
    job_id: JobId,
    proof_hash: String,
}

/// Posts the notification to an external payment service.
pub struct WebhookPaymentGate {
    url: String,
    client: reqwest::Client,
}

impl WebhookPaymentGate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl PaymentGate for WebhookPaymentGate {
    fn on_proof_verified(&self, job_id: JobId, proof_hash: &str) {
        let client = self.client.clone();
        let url = self.url.clone();
        let notice = PaymentNotice {
            job_id,
            proof_hash: proof_hash.to_string(),
        };
        tokio::spawn(async move {
            match client.post(&url).json(&notice).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!(job_id, "payment gate notified");
                }
                Ok(resp) => {
                    tracing::warn!(job_id, status = %resp.status(), "payment gate rejected notification");
                }
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "payment gate unreachable");
                }
            }
        });
    }
}
