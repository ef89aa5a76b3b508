//! Underwriting policy configuration
//!
//! Loaded from TOML; every key has a default so an empty file is valid.
//!
//! ```toml
//! qualifying_payment_rate = 0.006
//!
//! [fallback_income]
//! enabled = true
//! salaried = 60000.0
//! self_employed = 75000.0
//!
//! [broker]
//! brokerage = "Your Brokerage"
//! agent_name = "John Doe"
//! license_number = "123456"
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::EmploymentType;
use crate::ratios::QUALIFYING_PAYMENT_RATE;

/// Policy knobs for an underwriting pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingPolicy {
    /// Monthly qualifying payment as a share of principal
    #[serde(default = "default_rate")]
    pub qualifying_payment_rate: f64,

    /// Income assumed when no document yields one
    #[serde(default)]
    pub fallback_income: FallbackIncome,

    /// Broker block printed at the top of the report
    #[serde(default)]
    pub broker: BrokerProfile,
}

/// Per-employment-type income fallbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackIncome {
    /// When false, a missing income stays missing and ratios are N/A
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_salaried")]
    pub salaried: f64,
    #[serde(default = "default_self_employed")]
    pub self_employed: f64,
}

/// Submitting brokerage details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerProfile {
    #[serde(default = "default_brokerage")]
    pub brokerage: String,
    #[serde(default = "default_agent")]
    pub agent_name: String,
    #[serde(default = "default_license")]
    pub license_number: String,
}

/// Rejected policy values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("qualifying_payment_rate must be a positive number, got {0}")]
    InvalidRate(f64),

    #[error("fallback income for {employment} must be a non-negative number, got {value}")]
    InvalidFallback {
        employment: &'static str,
        value: f64,
    },
}

fn default_rate() -> f64 {
    QUALIFYING_PAYMENT_RATE
}

fn default_enabled() -> bool {
    true
}

fn default_salaried() -> f64 {
    60_000.0
}

fn default_self_employed() -> f64 {
    75_000.0
}

fn default_brokerage() -> String {
    "Your Brokerage".to_string()
}

fn default_agent() -> String {
    "John Doe".to_string()
}

fn default_license() -> String {
    "123456".to_string()
}

impl Default for UnderwritingPolicy {
    fn default() -> Self {
        Self {
            qualifying_payment_rate: default_rate(),
            fallback_income: FallbackIncome::default(),
            broker: BrokerProfile::default(),
        }
    }
}

impl Default for FallbackIncome {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            salaried: default_salaried(),
            self_employed: default_self_employed(),
        }
    }
}

impl Default for BrokerProfile {
    fn default() -> Self {
        Self {
            brokerage: default_brokerage(),
            agent_name: default_agent(),
            license_number: default_license(),
        }
    }
}

impl FallbackIncome {
    /// Fallback for an employment type, `None` when fallbacks are disabled
    pub fn for_employment(&self, employment: EmploymentType) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        Some(match employment {
            EmploymentType::Salaried => self.salaried,
            EmploymentType::SelfEmployed => self.self_employed,
        })
    }
}

impl UnderwritingPolicy {
    /// Load and validate a policy file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed, or
    /// a value fails [`UnderwritingPolicy::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a policy from TOML text
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let policy: Self = toml::from_str(s).context("Failed to parse policy TOML")?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.qualifying_payment_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ConfigError::InvalidRate(rate));
        }

        let fallbacks = [
            ("salaried", self.fallback_income.salaried),
            ("self_employed", self.fallback_income.self_employed),
        ];
        for (employment, value) in fallbacks {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidFallback { employment, value });
            }
        }

        Ok(())
    }
}
