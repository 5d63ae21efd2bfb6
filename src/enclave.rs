//! Enclave whitelist registry
//!
//! Answers "is this hardware-attestation measurement authorized?". Entries
//! are created and revoked explicitly by admins and never expire on their
//! own.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Ownership;
use crate::error::GatewayError;
use crate::types::{EventLog, GatewayEvent};

/// Supported TEE platforms. Codes are stable wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeeType {
    Sgx,
    Tdx,
    SevSnp,
    Nitro,
}

impl TeeType {
    pub fn code(self) -> u8 {
        match self {
            TeeType::Sgx => 0,
            TeeType::Tdx => 1,
            TeeType::SevSnp => 2,
            TeeType::Nitro => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TeeType::Sgx),
            1 => Some(TeeType::Tdx),
            2 => Some(TeeType::SevSnp),
            3 => Some(TeeType::Nitro),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EnclaveInfo {
    pub tee_type: TeeType,
    pub is_whitelisted: bool,
    pub whitelisted_at: DateTime<Utc>,
    pub authorized_by: String,
    pub description: String,
}

pub struct EnclaveRegistry {
    enclaves: HashMap<String, EnclaveInfo>,
    /// Duplicated flag map for the hot-path lookup during submission.
    whitelisted: HashMap<String, bool>,
    ownership: Ownership,
    /// Total grants ever made. Monotone; revocation does not decrement.
    whitelisted_total: u64,
}

impl EnclaveRegistry {
    pub fn new(ownership: Ownership) -> Self {
        Self {
            enclaves: HashMap::new(),
            whitelisted: HashMap::new(),
            ownership,
            whitelisted_total: 0,
        }
    }

    /// Authorize a measurement. Admin only. Re-whitelisting a revoked
    /// measurement reinstates it with fresh metadata.
    pub fn whitelist(
        &mut self,
        measurement: &str,
        tee_type: TeeType,
        description: &str,
        caller: &str,
        events: &mut EventLog,
    ) -> Result<(), GatewayError> {
        if !self.ownership.is_admin(caller) {
            return Err(GatewayError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        let info = EnclaveInfo {
            tee_type,
            is_whitelisted: true,
            whitelisted_at: Utc::now(),
            authorized_by: caller.to_string(),
            description: description.to_string(),
        };
        self.enclaves.insert(measurement.to_string(), info);
        self.whitelisted.insert(measurement.to_string(), true);
        self.whitelisted_total += 1;
        tracing::info!(measurement, authorized_by = caller, "enclave whitelisted");
        events.push(GatewayEvent::EnclaveWhitelisted {
            measurement: measurement.to_string(),
            authorized_by: caller.to_string(),
        });
        Ok(())
    }

    /// Revoke a measurement. Admin only; unknown measurements error.
    pub fn revoke(
        &mut self,
        measurement: &str,
        caller: &str,
        events: &mut EventLog,
    ) -> Result<(), GatewayError> {
        if !self.ownership.is_admin(caller) {
            return Err(GatewayError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        let Some(info) = self.enclaves.get_mut(measurement) else {
            return Err(GatewayError::NotFound {
                what: format!("enclave {measurement}"),
            });
        };
        info.is_whitelisted = false;
        self.whitelisted.insert(measurement.to_string(), false);
        tracing::warn!(measurement, revoked_by = caller, "enclave revoked");
        events.push(GatewayEvent::EnclaveRevoked {
            measurement: measurement.to_string(),
            revoked_by: caller.to_string(),
        });
        Ok(())
    }

    /// Hot-path predicate. Unknown measurements are simply not
    /// whitelisted; no error, no zero-default record.
    pub fn is_whitelisted(&self, measurement: &str) -> bool {
        self.whitelisted.get(measurement).copied().unwrap_or(false)
    }

    pub fn tee_type(&self, measurement: &str) -> Option<TeeType> {
        self.enclaves.get(measurement).map(|e| e.tee_type)
    }

    pub fn get(&self, measurement: &str) -> Option<&EnclaveInfo> {
        self.enclaves.get(measurement)
    }

    /// Total whitelist grants ever made.
    pub fn whitelisted_total(&self) -> u64 {
        self.whitelisted_total
    }
}
