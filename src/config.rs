//! Gateway configuration

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::validator::ValidationLimits;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub validation: ValidationConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_elements: usize,
    pub min_layers: usize,
    pub pow_bits: u32,
    /// Seconds a job may stay pending before it can be expired.
    pub proof_ttl_secs: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let limits = ValidationLimits::default();
        Self {
            min_elements: limits.min_elements,
            min_layers: limits.min_layers,
            pow_bits: limits.pow_bits,
            proof_ttl_secs: 86_400,
        }
    }
}

impl ValidationConfig {
    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            min_elements: self.min_elements,
            min_layers: self.min_layers,
            pow_bits: self.pow_bits,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub owner: String,
    pub admins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            admins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PaymentConfig {
    /// Endpoint notified once per verified proof. `None` logs instead.
    pub webhook_url: Option<String>,
}

/// Ownership and admin capability, injected into the state machines at
/// construction. Admin checks are a predicate on this struct, never a
/// global lookup.
#[derive(Debug, Clone)]
pub struct Ownership {
    owner: String,
    admins: Vec<String>,
}

impl Ownership {
    pub fn new(owner: impl Into<String>, admins: Vec<String>) -> Self {
        Self {
            owner: owner.into(),
            admins,
        }
    }

    pub fn is_admin(&self, caller: &str) -> bool {
        caller == self.owner || self.admins.iter().any(|a| a == caller)
    }
}

impl From<&AuthConfig> for Ownership {
    fn from(auth: &AuthConfig) -> Self {
        Ownership::new(auth.owner.clone(), auth.admins.clone())
    }
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}
