//! Oracle agent workers
//!
//! Agents mirror the external oracle server processes: each one watches the
//! notice bus, answers requests whose target index matches one of its
//! assigned slots, and decides the status through a pluggable policy.
//! Submission is best-effort — rejections (late, duplicate, paused) are
//! logged and never escalated; the settlement core does not depend on any
//! particular agent responding.

use crate::coordinator::{OracleCoordinator, RequestOpened};
use crate::Result;
use event_bus::{Notice, NoticeBus, NoticeType};
use rust_decimal::Decimal;
use std::sync::Arc;
use surety_core::{FlightKey, FlightStatus, ParticipantId};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Decides what status an agent reports for a flight
pub trait StatusPolicy: Send + Sync {
    /// Status to report for the given flight
    fn decide(&self, flight: &FlightKey) -> FlightStatus;
}

/// Always reports the same status (scripted test oracles)
pub struct FixedStatusPolicy {
    status: FlightStatus,
}

impl FixedStatusPolicy {
    /// Create a policy pinned to `status`
    pub fn new(status: FlightStatus) -> Self {
        Self { status }
    }
}

impl StatusPolicy for FixedStatusPolicy {
    fn decide(&self, _flight: &FlightKey) -> FlightStatus {
        self.status
    }
}

/// Samples uniformly over the full status code set
pub struct UniformStatusPolicy;

impl StatusPolicy for UniformStatusPolicy {
    fn decide(&self, _flight: &FlightKey) -> FlightStatus {
        use rand::Rng;

        const ALL: [FlightStatus; 6] = [
            FlightStatus::Unknown,
            FlightStatus::OnTime,
            FlightStatus::LateAirline,
            FlightStatus::LateWeather,
            FlightStatus::LateTechnical,
            FlightStatus::LateOther,
        ];
        ALL[rand::thread_rng().gen_range(0..ALL.len())]
    }
}

/// Long-lived oracle worker
pub struct OracleAgent {
    id: ParticipantId,
    indices: [u8; 3],
    coordinator: Arc<OracleCoordinator>,
    policy: Arc<dyn StatusPolicy>,
}

impl OracleAgent {
    /// Register an oracle identity and build its agent
    pub fn register(
        coordinator: Arc<OracleCoordinator>,
        id: ParticipantId,
        fee: Decimal,
        policy: Arc<dyn StatusPolicy>,
    ) -> Result<Self> {
        let indices = coordinator.register_oracle(&id, fee)?;
        Ok(Self {
            id,
            indices,
            coordinator,
            policy,
        })
    }

    /// Oracle identity
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Assigned index slots
    pub fn indices(&self) -> [u8; 3] {
        self.indices
    }

    /// Spawn the worker loop; it runs until the bus is dropped
    pub fn spawn(self, bus: &NoticeBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notice) => self.handle(notice),
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Oracle {} lagged, {} notices missed", self.id, missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Oracle agent {} stopped", self.id);
        })
    }

    fn handle(&self, notice: Notice) {
        if notice.notice_type != NoticeType::OracleRequestOpened {
            return;
        }

        let request: RequestOpened = match notice.decode() {
            Ok(request) => request,
            Err(e) => {
                warn!("Oracle {} ignoring malformed request notice: {}", self.id, e);
                return;
            }
        };

        if !self.indices.contains(&request.index) {
            return;
        }

        let flight = request.flight_key();
        let status = self.policy.decide(&flight);

        match self.coordinator.submit_response(
            request.index,
            &request.airline,
            &request.flight,
            request.departure,
            status,
            &self.id,
        ) {
            Ok(outcome) => {
                debug!("Oracle {} reported {} for {}: {:?}", self.id, status, flight, outcome);
            }
            Err(e) => {
                // Best effort: duplicates and late arrivals are expected losses
                warn!("Oracle {} submission rejected: {}", self.id, e);
            }
        }
    }
}
