//! Flight records keyed by (airline, code, departure)

use crate::access::AccessControl;
use crate::airlines::AirlineRegistry;
use crate::types::{Flight, FlightKey, FlightStatus, ParticipantId};
use crate::{Error, Result};
use chrono::Utc;
use dashmap::DashMap;
use event_bus::{Notice, NoticeBus, NoticeType};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Flight registry
///
/// Flights are created only for active airlines and start with status Unknown.
/// Status is finalized exactly once by the oracle coordinator through the
/// allowlist-gated `finalize_status`.
pub struct FlightRegistry {
    access: Arc<AccessControl>,
    airlines: Arc<AirlineRegistry>,
    bus: NoticeBus,
    flights: DashMap<FlightKey, Flight>,
}

impl FlightRegistry {
    /// Create an empty flight registry
    pub fn new(access: Arc<AccessControl>, airlines: Arc<AirlineRegistry>, bus: NoticeBus) -> Self {
        Self {
            access,
            airlines,
            bus,
            flights: DashMap::new(),
        }
    }

    /// Register a flight for an active airline
    pub fn register(
        &self,
        airline: &ParticipantId,
        code: &str,
        departure: i64,
        by: &ParticipantId,
    ) -> Result<FlightKey> {
        self.access.ensure_operational()?;

        if !self.airlines.is_active(airline) {
            return Err(Error::NotActive(airline.clone()));
        }

        let key = FlightKey::new(airline.clone(), code, departure);

        match self.flights.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(Error::DuplicateFlight(key));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Flight {
                    key: key.clone(),
                    status: FlightStatus::Unknown,
                    registered_by: by.clone(),
                    registered_at: Utc::now(),
                });
            }
        }

        info!("Flight registered: {}", key);
        self.bus.publish(
            Notice::new(
                NoticeType::FlightRegistered,
                json!({
                    "airline": key.airline.to_string(),
                    "flight": key.code,
                    "departure": key.departure,
                }),
            )
            .with_correlation_id(key.to_string()),
        );

        Ok(key)
    }

    /// Finalize a flight's status (allowlist-gated, called on oracle consensus)
    pub fn finalize_status(
        &self,
        key: &FlightKey,
        status: FlightStatus,
        by: &ParticipantId,
    ) -> Result<()> {
        self.access.ensure_operational()?;
        self.access.ensure_authorized(by)?;

        let mut flight = self
            .flights
            .get_mut(key)
            .ok_or_else(|| Error::UnknownFlight(key.clone()))?;
        flight.status = status;

        info!("Flight {} finalized as {}", key, status);
        Ok(())
    }

    /// Whether a flight exists under this key
    pub fn is_registered(&self, key: &FlightKey) -> bool {
        self.flights.contains_key(key)
    }

    /// Snapshot of a flight record
    pub fn get(&self, key: &FlightKey) -> Option<Flight> {
        self.flights.get(key).map(|f| f.clone())
    }

    /// Current status of a flight
    pub fn status_of(&self, key: &FlightKey) -> Result<FlightStatus> {
        self.flights
            .get(key)
            .map(|f| f.status)
            .ok_or_else(|| Error::UnknownFlight(key.clone()))
    }

    /// Number of registered flights
    pub fn count(&self) -> usize {
        self.flights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernanceConfig;
    use event_bus::NoticeBus;
    use rust_decimal::Decimal;

    fn fixture() -> (FlightRegistry, Arc<AccessControl>, ParticipantId) {
        let owner = ParticipantId::new("owner");
        let access = Arc::new(AccessControl::new(owner));
        let bus = NoticeBus::default();
        let al1 = ParticipantId::new("AL1");
        let airlines = Arc::new(AirlineRegistry::new(
            access.clone(),
            bus.clone(),
            GovernanceConfig::default(),
            al1.clone(),
        ));
        airlines.fund(&al1, Decimal::from(10)).unwrap();

        let flights = FlightRegistry::new(access.clone(), airlines, bus);
        (flights, access, al1)
    }

    #[test]
    fn test_register_flight_for_active_airline() {
        let (flights, _, al1) = fixture();

        let key = flights.register(&al1, "LF0001", 1_700_000_000, &al1).unwrap();
        assert!(flights.is_registered(&key));
        assert_eq!(flights.status_of(&key).unwrap(), FlightStatus::Unknown);
    }

    #[test]
    fn test_register_fails_for_inactive_airline() {
        let (flights, _, al1) = fixture();
        let ghost = ParticipantId::new("ghost");

        let result = flights.register(&ghost, "LF0001", 1_700_000_000, &al1);
        assert!(matches!(result, Err(Error::NotActive(_))));
    }

    #[test]
    fn test_duplicate_flight_rejected() {
        let (flights, _, al1) = fixture();

        flights.register(&al1, "LF0001", 1_700_000_000, &al1).unwrap();
        let result = flights.register(&al1, "LF0001", 1_700_000_000, &al1);
        assert!(matches!(result, Err(Error::DuplicateFlight(_))));

        // Same code at a different departure is a different flight
        assert!(flights.register(&al1, "LF0001", 1_700_003_600, &al1).is_ok());
    }

    #[test]
    fn test_finalize_requires_allowlisted_caller() {
        let (flights, access, al1) = fixture();
        let key = flights.register(&al1, "LF0001", 1_700_000_000, &al1).unwrap();

        let svc = ParticipantId::new("coordinator");
        let result = flights.finalize_status(&key, FlightStatus::LateAirline, &svc);
        assert!(matches!(result, Err(Error::PermissionDenied(_))));

        access
            .authorize_caller(svc.clone(), &ParticipantId::new("owner"))
            .unwrap();
        flights
            .finalize_status(&key, FlightStatus::LateAirline, &svc)
            .unwrap();
        assert_eq!(flights.status_of(&key).unwrap(), FlightStatus::LateAirline);
    }

    #[test]
    fn test_finalize_unknown_flight() {
        let (flights, access, al1) = fixture();
        let svc = ParticipantId::new("coordinator");
        access
            .authorize_caller(svc.clone(), &ParticipantId::new("owner"))
            .unwrap();

        let key = FlightKey::new(al1, "LF9999", 0);
        let result = flights.finalize_status(&key, FlightStatus::OnTime, &svc);
        assert!(matches!(result, Err(Error::UnknownFlight(_))));
    }
}
