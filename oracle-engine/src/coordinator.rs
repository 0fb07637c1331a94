//! Status-request dispatch and majority-consensus resolution
//!
//! One request per flight key. Responses tally under the request's own lock,
//! so the "first status to reach 3 matching responses" rule is deterministic
//! regardless of arrival order or how many oracles respond. Resolution
//! finalizes the flight, triggers insurance crediting once, and caches the
//! final status for later fetches. Requests are never deleted; an unresolved
//! request stays open indefinitely.

use crate::config::OracleConfig;
use crate::entropy::IndexSource;
use crate::registry::OracleRegistry;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use event_bus::{Notice, NoticeBus, NoticeType};
use insurance_pool::InsurancePool;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use surety_core::{AccessControl, FlightKey, FlightRegistry, FlightStatus, ParticipantId};
use tracing::{debug, info};

/// Outcome of a status fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Consensus already reached; cached final status
    Resolved(FlightStatus),
    /// Request open (new or re-announced) at this target index
    Opened {
        /// Target index oracles must hold to respond
        index: u8,
    },
}

/// Outcome of a response submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Response recorded; consensus not yet reached
    Accepted {
        /// Matching responses now recorded for this status
        tally: usize,
    },
    /// This response completed consensus
    Resolved(FlightStatus),
    /// Recorded after resolution; no effect
    Inert,
}

/// "Request opened" notice payload, consumed by oracle agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOpened {
    /// Target index
    pub index: u8,
    /// Operating airline
    pub airline: ParticipantId,
    /// Flight code
    pub flight: String,
    /// Scheduled departure (unix seconds)
    pub departure: i64,
}

impl RequestOpened {
    /// Flight key this request refers to
    pub fn flight_key(&self) -> FlightKey {
        FlightKey::new(self.airline.clone(), self.flight.clone(), self.departure)
    }
}

/// "Status finalized" notice payload, consumed by client surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFinalized {
    /// Operating airline
    pub airline: ParticipantId,
    /// Flight code
    pub flight: String,
    /// Scheduled departure (unix seconds)
    pub departure: i64,
    /// Final status wire code
    pub status: u8,
}

/// Open or resolved status request for one flight
struct StatusRequest {
    target_index: u8,
    responses: HashMap<FlightStatus, HashSet<ParticipantId>>,
    responders: HashSet<ParticipantId>,
    resolved: Option<FlightStatus>,
    #[allow(dead_code)] // retained as the audit record; no expiry is defined
    opened_at: DateTime<Utc>,
}

impl StatusRequest {
    fn new(target_index: u8) -> Self {
        Self {
            target_index,
            responses: HashMap::new(),
            responders: HashSet::new(),
            resolved: None,
            opened_at: Utc::now(),
        }
    }
}

/// Oracle coordinator
pub struct OracleCoordinator {
    /// Allowlisted service identity used for finalize/resolve calls
    identity: ParticipantId,
    access: Arc<AccessControl>,
    flights: Arc<FlightRegistry>,
    pool: Arc<InsurancePool>,
    oracles: Arc<OracleRegistry>,
    bus: NoticeBus,
    source: Arc<dyn IndexSource>,
    config: OracleConfig,
    requests: DashMap<FlightKey, Arc<Mutex<StatusRequest>>>,
}

impl OracleCoordinator {
    /// Create a coordinator and its oracle registry
    ///
    /// `identity` must be on the access allowlist for resolution to succeed.
    pub fn new(
        identity: ParticipantId,
        access: Arc<AccessControl>,
        flights: Arc<FlightRegistry>,
        pool: Arc<InsurancePool>,
        bus: NoticeBus,
        source: Arc<dyn IndexSource>,
        config: OracleConfig,
    ) -> Self {
        let oracles = Arc::new(OracleRegistry::new(
            access.clone(),
            source.clone(),
            config.clone(),
        ));

        Self {
            identity,
            access,
            flights,
            pool,
            oracles,
            bus,
            source,
            config,
            requests: DashMap::new(),
        }
    }

    /// Oracle registry handle
    pub fn oracles(&self) -> &Arc<OracleRegistry> {
        &self.oracles
    }

    /// Register an oracle (see [`OracleRegistry::register`])
    pub fn register_oracle(&self, oracle: &ParticipantId, fee: Decimal) -> Result<[u8; 3]> {
        self.oracles.register(oracle, fee)
    }

    /// Request a flight's status
    ///
    /// Returns the cached final status if consensus was already reached.
    /// Otherwise opens (or re-announces) the request and publishes an
    /// OracleRequestOpened notice for the agents. Never blocks for responses.
    pub fn fetch_flight_status(
        &self,
        airline: &ParticipantId,
        code: &str,
        departure: i64,
        by: &ParticipantId,
    ) -> Result<FetchOutcome> {
        self.access.ensure_operational()?;

        let key = FlightKey::new(airline.clone(), code, departure);
        // Fails UnknownFlight before any request state is touched
        self.flights.status_of(&key)?;

        let request = self
            .requests
            .entry(key.clone())
            .or_insert_with(|| {
                let mut material = Vec::new();
                material.extend_from_slice(by.as_str().as_bytes());
                material.extend_from_slice(key.to_string().as_bytes());
                let index = self.source.draw(&material, self.config.index_modulus);

                info!("Oracle request opened for {} at index {}", key, index);
                Arc::new(Mutex::new(StatusRequest::new(index)))
            })
            .clone();

        let index = {
            let guard = request.lock();
            if let Some(status) = guard.resolved {
                return Ok(FetchOutcome::Resolved(status));
            }
            guard.target_index
        };

        self.bus.publish(
            Notice::new(
                NoticeType::OracleRequestOpened,
                serde_json::to_value(RequestOpened {
                    index,
                    airline: airline.clone(),
                    flight: code.to_string(),
                    departure,
                })
                .expect("notice payload serializes"),
            )
            .with_correlation_id(key.to_string()),
        );

        Ok(FetchOutcome::Opened { index })
    }

    /// Submit an oracle's status response
    ///
    /// The response is recorded under the request's lock. The submission that
    /// brings a status to `min_responses` matching responses resolves the
    /// request: the flight is finalized, the insurance pool credited, and a
    /// FlightStatusFinalized notice published. Responses arriving after
    /// resolution are recorded but inert.
    pub fn submit_response(
        &self,
        index: u8,
        airline: &ParticipantId,
        code: &str,
        departure: i64,
        status: FlightStatus,
        by: &ParticipantId,
    ) -> Result<SubmitOutcome> {
        self.access.ensure_operational()?;

        if !self.oracles.is_assigned(by, index) {
            return Err(Error::NotAssigned {
                oracle: by.clone(),
                index,
            });
        }

        let key = FlightKey::new(airline.clone(), code, departure);
        let request = self
            .requests
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NoOpenRequest {
                index,
                flight: key.clone(),
            })?;

        let mut guard = request.lock();

        if guard.target_index != index {
            return Err(Error::NoOpenRequest {
                index,
                flight: key,
            });
        }
        if !guard.responders.insert(by.clone()) {
            return Err(Error::AlreadyResponded {
                oracle: by.clone(),
                flight: key,
            });
        }

        let tally = {
            let matching = guard.responses.entry(status).or_default();
            matching.insert(by.clone());
            matching.len()
        };

        if guard.resolved.is_some() {
            debug!("Inert response for resolved {} from {}", key, by);
            return Ok(SubmitOutcome::Inert);
        }

        if tally < self.config.min_responses {
            debug!("Response for {}: {} at {}/{}", key, status, tally, self.config.min_responses);
            return Ok(SubmitOutcome::Accepted { tally });
        }

        // Consensus: commit downstream effects before marking resolved, so a
        // failure here leaves the request retryable by the next response
        self.flights.finalize_status(&key, status, &self.identity)?;
        self.pool.resolve(&key, status, &self.identity)?;
        guard.resolved = Some(status);

        info!(
            "Consensus for {}: {} ({} matching responses)",
            key, status, tally
        );

        self.bus.publish(
            Notice::new(
                NoticeType::FlightStatusFinalized,
                serde_json::to_value(StatusFinalized {
                    airline: airline.clone(),
                    flight: code.to_string(),
                    departure,
                    status: status.code(),
                })
                .expect("notice payload serializes"),
            )
            .with_correlation_id(key.to_string()),
        );

        Ok(SubmitOutcome::Resolved(status))
    }

    /// Final status of a flight's request, if consensus was reached
    pub fn resolved_status(&self, key: &FlightKey) -> Option<FlightStatus> {
        self.requests
            .get(key)
            .and_then(|request| request.lock().resolved)
    }

    /// Whether a request exists and is still awaiting consensus
    pub fn is_request_open(&self, key: &FlightKey) -> bool {
        self.requests
            .get(key)
            .map(|request| request.lock().resolved.is_none())
            .unwrap_or(false)
    }

    /// Number of requests ever opened (resolved ones are retained)
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }
}
