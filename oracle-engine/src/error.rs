//! Error types for the oracle engine

use rust_decimal::Decimal;
use surety_core::{FlightKey, ParticipantId};
use thiserror::Error;

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Oracle engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Registration fee below the configured minimum
    #[error("Registration fee {offered} below required {required}")]
    InsufficientFee {
        /// Fee offered
        offered: Decimal,
        /// Fee required
        required: Decimal,
    },

    /// Oracle already holds assigned indices
    #[error("Oracle already registered: {0}")]
    AlreadyRegistered(ParticipantId),

    /// Submitting oracle does not hold this index
    #[error("Index {index} not assigned to oracle {oracle}")]
    NotAssigned {
        /// Submitting oracle
        oracle: ParticipantId,
        /// Claimed index
        index: u8,
    },

    /// No request is open at this (index, flight)
    #[error("No open request at index {index} for flight {flight}")]
    NoOpenRequest {
        /// Claimed index
        index: u8,
        /// Flight key
        flight: FlightKey,
    },

    /// Oracle already responded to this request
    #[error("Oracle {oracle} already responded for flight {flight}")]
    AlreadyResponded {
        /// Submitting oracle
        oracle: ParticipantId,
        /// Flight key
        flight: FlightKey,
    },

    /// Core error
    #[error("{0}")]
    Core(#[from] surety_core::Error),

    /// Insurance pool error
    #[error("{0}")]
    Pool(#[from] insurance_pool::Error),
}
