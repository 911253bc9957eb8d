//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a missing section (or a missing file)
//! yields the standard table rules: 0.50 base stake, doubling, four
//! losses, La Partage on, European wheel.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::strategy::Progression;
use crate::types::{EngineError, RouletteType, WARMUP_SPINS};

/// Longest loss streak a progression may be configured to ride.
pub const LOSS_LIMIT_CAP: u32 = 100;

/// Largest stake a progression may reach before it is dropped.
pub const STAKE_CAP: Decimal = dec!(1000000000000);

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Staking and detection rules, fixed for the lifetime of a session.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Base stake every progression starts from.
    pub initial_bet: Decimal,
    /// Stake multiplier applied after each loss.
    pub martingale_factor: Decimal,
    /// Losses after which a progression is dropped.
    pub max_consecutive_losses: u32,
    pub la_partage_enabled: bool,
    /// Identical even-money outcomes in a row needed to bet the opposite.
    pub min_sequence_simple: u32,
    /// Spins a dozen/column must be absent before it is backed.
    pub min_sequence_dozen: u32,
    /// Spins a single number must be absent before it is backed.
    pub min_cold_number_delay: u32,
    pub roulette_type: RouletteType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_bet: dec!(0.50),
            martingale_factor: dec!(2),
            max_consecutive_losses: 4,
            la_partage_enabled: true,
            min_sequence_simple: 3,
            min_sequence_dozen: 2,
            min_cold_number_delay: 37,
            roulette_type: RouletteType::European,
        }
    }
}

impl EngineConfig {
    /// Number of warmup spins a session needs. Not configurable.
    pub fn warmup_spins(&self) -> usize {
        WARMUP_SPINS
    }

    /// Check every bound; the engine refuses to initialize otherwise.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.initial_bet <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "initial_bet must be > 0, got {}",
                self.initial_bet
            )));
        }
        if self.martingale_factor < Decimal::ONE {
            return Err(EngineError::InvalidConfig(format!(
                "martingale_factor must be >= 1, got {}",
                self.martingale_factor
            )));
        }
        if !(1..=LOSS_LIMIT_CAP).contains(&self.max_consecutive_losses) {
            return Err(EngineError::InvalidConfig(format!(
                "max_consecutive_losses must be within 1..={LOSS_LIMIT_CAP}, got {}",
                self.max_consecutive_losses
            )));
        }
        match Progression::from_config(self).max_stake() {
            Some(stake) if stake <= STAKE_CAP => {}
            _ => {
                return Err(EngineError::InvalidConfig(format!(
                    "progression {} x {}^{} exceeds the {STAKE_CAP} stake cap",
                    self.initial_bet,
                    self.martingale_factor,
                    self.max_consecutive_losses - 1
                )))
            }
        }
        if self.min_sequence_simple < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "min_sequence_simple must be >= 2, got {}",
                self.min_sequence_simple
            )));
        }
        if self.min_sequence_dozen < 1 {
            return Err(EngineError::InvalidConfig(
                "min_sequence_dozen must be >= 1".into(),
            ));
        }
        if self.min_cold_number_delay < 1 {
            return Err(EngineError::InvalidConfig(
                "min_cold_number_delay must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config
            .engine
            .validate()
            .context("Invalid [engine] section")?;
        Ok(config)
    }
}
