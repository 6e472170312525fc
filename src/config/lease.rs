//! Lease manager configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable overriding [`LeaseManagerConfig::tick_interval_ms`].
pub const ENV_TICK_INTERVAL_MS: &str = "LEASE_TICK_INTERVAL_MS";
/// Environment variable overriding [`LeaseManagerConfig::lease_duration_ms`].
pub const ENV_LEASE_DURATION_MS: &str = "LEASE_DURATION_MS";
/// Environment variable overriding [`LeaseManagerConfig::store_timeout_ms`].
pub const ENV_STORE_TIMEOUT_MS: &str = "LEASE_STORE_TIMEOUT_MS";

const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
const DEFAULT_LEASE_DURATION_MS: u64 = 30_000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Configuration shared by every tenant's lease manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseManagerConfig {
    /// Period between reconciliation ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// How long an acquired or extended lease stays valid, in milliseconds.
    pub lease_duration_ms: u64,
    /// Upper bound on any single store call, in milliseconds.
    pub store_timeout_ms: u64,
}

impl Default for LeaseManagerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            lease_duration_ms: DEFAULT_LEASE_DURATION_MS,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
        }
    }
}

impl LeaseManagerConfig {
    /// Reconciliation period.
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Lease validity window.
    pub const fn lease_duration(&self) -> Duration {
        Duration::from_millis(self.lease_duration_ms)
    }

    /// Store call timeout.
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Set the reconciliation period.
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Set the lease validity window.
    #[must_use]
    pub fn with_lease_duration_ms(mut self, ms: u64) -> Self {
        self.lease_duration_ms = ms;
        self
    }

    /// Set the store call timeout.
    #[must_use]
    pub fn with_store_timeout_ms(mut self, ms: u64) -> Self {
        self.store_timeout_ms = ms;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        if self.lease_duration_ms == 0 {
            return Err("lease_duration_ms must be greater than 0".into());
        }
        if self.store_timeout_ms == 0 {
            return Err("store_timeout_ms must be greater than 0".into());
        }
        if self.lease_duration_ms <= self.tick_interval_ms {
            return Err(format!(
                "lease_duration_ms ({}) must exceed tick_interval_ms ({})",
                self.lease_duration_ms, self.tick_interval_ms
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env`
    /// file first if one is present. Unset variables keep their defaults.
    pub fn from_env() -> AppResult<Self> {
        if let Some(err) = dotenv_problem(dotenvy::dotenv()) {
            tracing::debug!(error = %err, "ignoring unreadable .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_TICK_INTERVAL_MS) {
            cfg.tick_interval_ms = parse_ms(ENV_TICK_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_LEASE_DURATION_MS) {
            cfg.lease_duration_ms = parse_ms(ENV_LEASE_DURATION_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_STORE_TIMEOUT_MS) {
            cfg.store_timeout_ms = parse_ms(ENV_STORE_TIMEOUT_MS, &v)?;
        }
        cfg.validate()
            .map_err(anyhow::Error::msg)
            .context("lease manager configuration invalid")?;
        Ok(cfg)
    }
}

/// The `.env` load error worth reporting, if any. A missing file is normal:
/// variables may come from the real environment.
fn dotenv_problem(result: Result<PathBuf, dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(err) if err.not_found() => None,
        Err(err) => Some(err),
    }
}

fn parse_ms(key: &str, value: &str) -> AppResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of milliseconds, got `{value}`"))
}
