//! Type definitions for the notice bus

use serde::{Deserialize, Serialize};

/// Notice type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoticeType {
    /// Airline admitted to the registry
    AirlineRegistered,
    /// Airline reached the funding threshold
    AirlineActivated,
    /// Flight opened for underwriting
    FlightRegistered,
    /// Oracle status request opened
    OracleRequestOpened,
    /// Flight status finalized by consensus
    FlightStatusFinalized,
    /// Passenger credit issued
    CreditIssued,
    /// Passenger payout withdrawn
    PayoutWithdrawn,
}

impl NoticeType {
    /// Subject prefix for this notice type
    pub fn subject_prefix(&self) -> &'static str {
        match self {
            NoticeType::AirlineRegistered => "aerosure.airline.registered",
            NoticeType::AirlineActivated => "aerosure.airline.activated",
            NoticeType::FlightRegistered => "aerosure.flight.registered",
            NoticeType::OracleRequestOpened => "aerosure.oracle.request",
            NoticeType::FlightStatusFinalized => "aerosure.flight.finalized",
            NoticeType::CreditIssued => "aerosure.insurance.credit",
            NoticeType::PayoutWithdrawn => "aerosure.insurance.payout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_prefixes_are_distinct() {
        let all = [
            NoticeType::AirlineRegistered,
            NoticeType::AirlineActivated,
            NoticeType::FlightRegistered,
            NoticeType::OracleRequestOpened,
            NoticeType::FlightStatusFinalized,
            NoticeType::CreditIssued,
            NoticeType::PayoutWithdrawn,
        ];

        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.subject_prefix(), b.subject_prefix());
            }
        }
    }
}
