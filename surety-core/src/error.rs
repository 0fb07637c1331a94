//! Error types for the surety core

use crate::types::{FlightKey, ParticipantId};
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not allowed to perform the operation
    #[error("Permission denied for {0}")]
    PermissionDenied(ParticipantId),

    /// Operations are suspended
    #[error("Contract is not operational")]
    Unavailable,

    /// Airline is not registered
    #[error("Airline not registered: {0}")]
    NotRegistered(ParticipantId),

    /// Airline is registered but not active (unfunded)
    #[error("Airline not active: {0}")]
    NotActive(ParticipantId),

    /// Airline already admitted
    #[error("Airline already registered: {0}")]
    AlreadyRegistered(ParticipantId),

    /// Flight key already exists
    #[error("Flight already registered: {0}")]
    DuplicateFlight(FlightKey),

    /// No flight under this key
    #[error("Unknown flight: {0}")]
    UnknownFlight(FlightKey),

    /// Amount must be positive
    #[error("Amount must be positive: {0}")]
    InvalidAmount(rust_decimal::Decimal),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
