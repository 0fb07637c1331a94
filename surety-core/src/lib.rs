//! AeroSure Surety Core
//!
//! Membership and flight state for flight-delay insurance settlement.
//!
//! # Architecture
//!
//! - **Access control**: operational flag plus an authorized-caller allowlist
//!   gating every mutating call
//! - **Airline registry**: bootstrap-direct admission for the first members,
//!   multi-party voting beyond, funding-threshold activation
//! - **Flight registry**: flight records keyed (airline, code, departure),
//!   created only by active airlines
//!
//! # Invariants
//!
//! - Active is monotonic: a funded airline never reverts to Registered
//! - Flight keys are unique; status starts Unknown and is finalized once
//! - Every mutating operation either fully commits or fails without effect

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod access;
pub mod airlines;
pub mod config;
pub mod error;
pub mod flights;
pub mod types;

// Re-exports
pub use access::AccessControl;
pub use airlines::{AirlineRegistry, RegistrationOutcome};
pub use config::GovernanceConfig;
pub use error::{Error, Result};
pub use flights::FlightRegistry;
pub use types::{Airline, AirlineStatus, Flight, FlightKey, FlightStatus, ParticipantId};
