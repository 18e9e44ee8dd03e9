//! Signer configuration, parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level signer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub signer: SignerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Worker threads used to sign inputs. Unset uses one per CPU.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Bitcoin network: "bitcoin", "testnet", "signet", "regtest"
    #[serde(default = "default_network")]
    pub network: String,
}

impl Default for SignerSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_workers: None,
            network: default_network(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_network() -> String {
    "bitcoin".to_string()
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl SignerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: SignerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `DUOSIG_LOG_LEVEL`
    /// - `DUOSIG_MAX_WORKERS`
    /// - `DUOSIG_NETWORK`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DUOSIG_LOG_LEVEL") {
            self.signer.log_level = v;
        }
        if let Ok(v) = std::env::var("DUOSIG_MAX_WORKERS") {
            if let Ok(workers) = v.parse::<usize>() {
                self.signer.max_workers = Some(workers);
            }
        }
        if let Ok(v) = std::env::var("DUOSIG_NETWORK") {
            self.signer.network = v;
        }
    }

    /// Parse the bitcoin network string to a `bitcoin::Network`.
    pub fn network(&self) -> Result<bitcoin::Network> {
        match self.signer.network.as_str() {
            "bitcoin" | "mainnet" => Ok(bitcoin::Network::Bitcoin),
            "testnet" | "testnet3" => Ok(bitcoin::Network::Testnet),
            "signet" => Ok(bitcoin::Network::Signet),
            "regtest" => Ok(bitcoin::Network::Regtest),
            other => anyhow::bail!("Unknown network: {}", other),
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            LOG_LEVELS.contains(&self.signer.log_level.to_lowercase().as_str()),
            "signer.log_level must be one of {:?}",
            LOG_LEVELS
        );

        if let Some(workers) = self.signer.max_workers {
            anyhow::ensure!(workers > 0, "signer.max_workers must be > 0");
        }

        self.network().context("signer.network is invalid")?;

        Ok(())
    }
}
