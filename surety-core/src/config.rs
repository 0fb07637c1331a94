//! Configuration for the surety core

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Governance configuration for airline admission and activation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Members admitted directly before voting kicks in
    pub bootstrap_threshold: usize,

    /// Funding required before a registered airline becomes active
    pub min_funds: Decimal,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            bootstrap_threshold: 4,
            min_funds: Decimal::from(10), // 10 units of settlement currency
        }
    }
}

impl GovernanceConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: GovernanceConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = GovernanceConfig::default();

        if let Ok(threshold) = std::env::var("SURETY_BOOTSTRAP_THRESHOLD") {
            config.bootstrap_threshold = threshold
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad bootstrap threshold: {}", e)))?;
        }

        if let Ok(funds) = std::env::var("SURETY_MIN_FUNDS") {
            config.min_funds = funds
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad min funds: {}", e)))?;
        }

        Ok(config)
    }
}
