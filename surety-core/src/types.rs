//! Core types for flight-delay insurance settlement
//!
//! All types are designed for:
//! - Deterministic serialization (serde)
//! - Exact arithmetic (Decimal for funds)
//! - Cheap keying (flight key hashes by value)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Participant identifier (airline, passenger, oracle, or service identity)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create new participant ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Flight status as reported by oracles
///
/// Wire codes match the original oracle protocol and are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlightStatus {
    /// No consensus yet
    Unknown = 0,
    /// Departed on time
    OnTime = 10,
    /// Late, airline's fault
    LateAirline = 20,
    /// Late due to weather
    LateWeather = 30,
    /// Late due to technical issues
    LateTechnical = 40,
    /// Late for other reasons
    LateOther = 50,
}

impl FlightStatus {
    /// Wire code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parse from wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FlightStatus::Unknown),
            10 => Some(FlightStatus::OnTime),
            20 => Some(FlightStatus::LateAirline),
            30 => Some(FlightStatus::LateWeather),
            40 => Some(FlightStatus::LateTechnical),
            50 => Some(FlightStatus::LateOther),
            _ => None,
        }
    }

    /// Whether this status entitles insured passengers to a payout
    pub fn entitles_payout(&self) -> bool {
        matches!(self, FlightStatus::LateAirline)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightStatus::Unknown => "unknown",
            FlightStatus::OnTime => "on-time",
            FlightStatus::LateAirline => "late-airline",
            FlightStatus::LateWeather => "late-weather",
            FlightStatus::LateTechnical => "late-technical",
            FlightStatus::LateOther => "late-other",
        };
        write!(f, "{}", name)
    }
}

/// Airline membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirlineStatus {
    /// Candidate awaiting admission votes
    Unregistered,
    /// Admitted, not yet funded
    Registered,
    /// Funded and eligible to register flights and vote
    Active,
}

/// Airline membership record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    /// Airline identity
    pub id: ParticipantId,

    /// Membership status
    pub status: AirlineStatus,

    /// Admission votes received while Unregistered (cleared on admission)
    pub votes: HashSet<ParticipantId>,

    /// Cumulative funding
    pub funded: Decimal,

    /// First seen timestamp
    pub joined_at: DateTime<Utc>,
}

impl Airline {
    /// Create a candidate record with no votes and no funding
    pub fn candidate(id: ParticipantId) -> Self {
        Self {
            id,
            status: AirlineStatus::Unregistered,
            votes: HashSet::new(),
            funded: Decimal::ZERO,
            joined_at: Utc::now(),
        }
    }

    /// Number of distinct admission votes received
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }
}

/// Flight key: (airline, code, departure) uniquely identifies a flight
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    /// Operating airline
    pub airline: ParticipantId,

    /// Flight code (e.g. "LF0001")
    pub code: String,

    /// Scheduled departure (unix seconds)
    pub departure: i64,
}

impl FlightKey {
    /// Create new flight key
    pub fn new(airline: ParticipantId, code: impl Into<String>, departure: i64) -> Self {
        Self {
            airline,
            code: code.into(),
            departure,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.airline, self.code, self.departure)
    }
}

/// Flight record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    /// Flight key
    pub key: FlightKey,

    /// Current status (Unknown until oracle consensus)
    pub status: FlightStatus,

    /// Caller that registered the flight
    pub registered_by: ParticipantId,

    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}
