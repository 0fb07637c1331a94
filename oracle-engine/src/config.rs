//! Configuration for the oracle engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Oracle engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Fee an oracle pays on registration
    pub registration_fee: Decimal,

    /// Index space size; indices are drawn from [0, index_modulus)
    ///
    /// Must be at least 3 so an oracle can hold 3 distinct indices.
    pub index_modulus: u8,

    /// Matching responses required to resolve a request
    pub min_responses: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            registration_fee: Decimal::ONE, // 1 unit of settlement currency
            index_modulus: 10,
            min_responses: 3,
        }
    }
}
