//! AeroSure Oracle Engine
//!
//! Decentralized flight-status determination.
//!
//! # Architecture
//!
//! - **Registration**: oracles pay a fee and receive 3 unpredictable index
//!   slots drawn from an injectable entropy source
//! - **Dispatch**: status fetches open a request targeted at one index and
//!   announce it on the notice bus; fetches never block for responses
//! - **Consensus**: the first status code to collect 3 matching responses
//!   wins; the coordinator finalizes the flight and triggers insurance
//!   resolution exactly once
//! - **Agents**: long-lived workers that watch the bus and report on requests
//!   matching their indices; best-effort, outside the correctness surface

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod entropy;
pub mod error;
pub mod registry;

// Re-exports
pub use agent::{FixedStatusPolicy, OracleAgent, StatusPolicy, UniformStatusPolicy};
pub use config::OracleConfig;
pub use coordinator::{FetchOutcome, OracleCoordinator, RequestOpened, StatusFinalized, SubmitOutcome};
pub use entropy::{HashIndexSource, IndexSource, SequenceIndexSource};
pub use error::{Error, Result};
pub use registry::{OracleRegistry, OracleSlot};
