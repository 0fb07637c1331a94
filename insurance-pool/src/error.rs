//! Error types for the insurance pool

use rust_decimal::Decimal;
use surety_core::{FlightKey, ParticipantId};
use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Insurance pool errors
#[derive(Error, Debug)]
pub enum Error {
    /// A policy already exists for this passenger and flight
    #[error("Passenger {passenger} already insured for flight {flight}")]
    AlreadyInsured {
        /// Insured passenger
        passenger: ParticipantId,
        /// Flight key
        flight: FlightKey,
    },

    /// Premium exceeds the configured cap
    #[error("Premium {offered} exceeds cap {cap}")]
    ExceedsCap {
        /// Offered premium
        offered: Decimal,
        /// Configured maximum
        cap: Decimal,
    },

    /// Flight status already finalized; no new policies
    #[error("Flight already resolved: {0}")]
    FlightAlreadyResolved(FlightKey),

    /// Passenger holds no credit
    #[error("Nothing to withdraw for {0}")]
    NothingToWithdraw(ParticipantId),

    /// Payout transfer failed; credits were restored
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Core error
    #[error("{0}")]
    Core(#[from] surety_core::Error),
}
