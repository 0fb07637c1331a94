//! AeroSure Insurance Pool
//!
//! Premium escrow and passenger payout for flight-delay insurance.
//!
//! # Invariants
//!
//! - At most one policy per (passenger, flight)
//! - A policy's credit is written exactly once, at resolution
//! - Withdrawal zeroes credits before the external transfer starts; a failed
//!   transfer restores them
//! - Resolution is idempotent independently of the caller's own bookkeeping

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod pool;
pub mod treasury;

pub use error::{Error, Result};
pub use pool::{InsurancePool, Policy, PoolConfig};
pub use treasury::{CashAccounts, Treasury};
