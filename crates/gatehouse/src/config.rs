//! Configuration management for Gatehouse.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::guard::GuardPolicy;
use gatehouse_common::constants::{
    DEFAULT_AUTH_BASE_URL, DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_LISTEN_ADDR,
    SESSION_IDLE_TTL_SECS, SESSION_SWEEP_INTERVAL_SECS,
};

/// Environment variable prefix for overrides, e.g. `GATEHOUSE__AUTH__BASE_URL`
const ENV_PREFIX: &str = "GATEHOUSE";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Authentication API settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Login guard tuning
    #[serde(default)]
    pub guard: GuardPolicy,

    /// Login view lifetime
    #[serde(default)]
    pub session: SessionConfig,
}

/// Authentication API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the REST API (login is `{base_url}/auth/login`)
    #[serde(default = "default_auth_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_auth_timeout")]
    pub timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_auth_base_url(),
            timeout_secs: default_auth_timeout(),
        }
    }
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Login view configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a view is evicted
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,

    /// How often idle views are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_auth_base_url() -> String { DEFAULT_AUTH_BASE_URL.to_string() }
fn default_auth_timeout() -> u64 { DEFAULT_AUTH_TIMEOUT_SECS }
fn default_idle_ttl() -> u64 { SESSION_IDLE_TTL_SECS } // 30 minutes
fn default_sweep_interval() -> u64 { SESSION_SWEEP_INTERVAL_SECS }

impl AppConfig {
    /// Load configuration from file and environment, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut builder = config::Config::builder();
        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to load config")?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Failed to parse config")?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref auth_url) = args.auth_url {
            config.auth.base_url = auth_url.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.guard.validate().context("Invalid [guard] section")?;
        if self.auth.base_url.trim().is_empty() {
            anyhow::bail!("auth.base_url must not be empty");
        }
        if self.auth.timeout_secs == 0 {
            anyhow::bail!("auth.timeout_secs must be positive");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            auth: AuthConfig::default(),
            guard: GuardPolicy::default(),
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.auth.base_url, DEFAULT_AUTH_BASE_URL);
        assert_eq!(config.guard, GuardPolicy::default());
        assert_eq!(config.session.idle_ttl(), Duration::from_secs(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                listen_addr = "0.0.0.0:9000"

                [auth]
                base_url = "https://api.example.com/api"

                [guard]
                penalty_cap_secs = 120
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.auth.base_url, "https://api.example.com/api");
        assert_eq!(config.auth.timeout_secs, DEFAULT_AUTH_TIMEOUT_SECS);
        assert_eq!(config.guard.penalty_cap_secs, 120);
        assert_eq!(config.guard.cooldown_threshold, 5);
        assert_eq!(config.session.sweep_interval_secs, 60);
    }

    #[test]
    fn test_validate_rejects_bad_guard() {
        let mut config = AppConfig::default();
        config.guard.penalty_base_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
