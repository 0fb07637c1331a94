//! Airline membership state machine and admission voting
//!
//! The first `bootstrap_threshold` members are admitted directly by any active
//! airline. Beyond that, admission requires votes from at least half of the
//! current membership (ceil(registered/2) distinct voters). Admitted airlines
//! activate by funding up to the configured minimum; activation is monotonic.

use crate::access::AccessControl;
use crate::config::GovernanceConfig;
use crate::types::{Airline, AirlineStatus, ParticipantId};
use crate::{Error, Result};
use event_bus::{Notice, NoticeBus, NoticeType};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Candidate became Registered
    Admitted,
    /// Vote recorded; consensus not yet reached
    ///
    /// A repeated vote from the same member reports the unchanged tally.
    VoteRecorded {
        /// Distinct votes received so far
        votes: usize,
        /// Votes required at the current membership size
        needed: usize,
    },
}

/// Airline membership registry
pub struct AirlineRegistry {
    access: Arc<AccessControl>,
    bus: NoticeBus,
    config: GovernanceConfig,
    airlines: RwLock<HashMap<ParticipantId, Airline>>,
}

impl AirlineRegistry {
    /// Create the registry with the bootstrap airline seeded as Registered
    ///
    /// The bootstrap airline still has to fund before it can participate.
    pub fn new(
        access: Arc<AccessControl>,
        bus: NoticeBus,
        config: GovernanceConfig,
        bootstrap: ParticipantId,
    ) -> Self {
        let mut seeded = Airline::candidate(bootstrap.clone());
        seeded.status = AirlineStatus::Registered;

        let mut airlines = HashMap::new();
        airlines.insert(bootstrap.clone(), seeded);

        info!("Airline registry seeded with {}", bootstrap);

        Self {
            access,
            bus,
            config,
            airlines: RwLock::new(airlines),
        }
    }

    /// Register a candidate airline, or record an admission vote for it
    ///
    /// Below the bootstrap threshold the candidate is admitted directly.
    /// Beyond it, `by`'s vote is recorded and the candidate is admitted once
    /// ceil(registered/2) distinct members have voted.
    pub fn register(
        &self,
        candidate: &ParticipantId,
        by: &ParticipantId,
    ) -> Result<RegistrationOutcome> {
        self.access.ensure_operational()?;

        let outcome = {
            let mut airlines = self.airlines.write();

            let voter_active = airlines
                .get(by)
                .map(|a| a.status == AirlineStatus::Active)
                .unwrap_or(false);
            if !voter_active {
                return Err(Error::NotActive(by.clone()));
            }

            if let Some(existing) = airlines.get(candidate) {
                if existing.status != AirlineStatus::Unregistered {
                    return Err(Error::AlreadyRegistered(candidate.clone()));
                }
            }

            let registered = Self::registered_in(&airlines);

            if registered < self.config.bootstrap_threshold {
                let entry = airlines
                    .entry(candidate.clone())
                    .or_insert_with(|| Airline::candidate(candidate.clone()));
                entry.status = AirlineStatus::Registered;
                entry.votes.clear();

                info!("Airline {} admitted directly ({} members)", candidate, registered + 1);
                RegistrationOutcome::Admitted
            } else {
                let needed = (registered + 1) / 2;
                let entry = airlines
                    .entry(candidate.clone())
                    .or_insert_with(|| Airline::candidate(candidate.clone()));
                entry.votes.insert(by.clone());
                let votes = entry.vote_count();

                if votes >= needed {
                    entry.status = AirlineStatus::Registered;
                    entry.votes.clear();

                    info!(
                        "Airline {} admitted by vote ({} of {} required)",
                        candidate, votes, needed
                    );
                    RegistrationOutcome::Admitted
                } else {
                    debug!("Vote for {} recorded: {}/{}", candidate, votes, needed);
                    RegistrationOutcome::VoteRecorded { votes, needed }
                }
            }
        };

        if outcome == RegistrationOutcome::Admitted {
            self.bus.publish(
                Notice::new(
                    NoticeType::AirlineRegistered,
                    json!({ "airline": candidate.to_string() }),
                )
                .with_correlation_id(candidate.to_string()),
            );
        }

        Ok(outcome)
    }

    /// Credit funding to a registered airline
    ///
    /// Crossing the configured minimum promotes Registered to Active. Further
    /// funding is accepted and the status never reverts.
    pub fn fund(&self, airline: &ParticipantId, amount: Decimal) -> Result<AirlineStatus> {
        self.access.ensure_operational()?;

        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        let (status, activated) = {
            let mut airlines = self.airlines.write();
            let entry = airlines
                .get_mut(airline)
                .filter(|a| a.status != AirlineStatus::Unregistered)
                .ok_or_else(|| Error::NotRegistered(airline.clone()))?;

            entry.funded += amount;

            let activated = entry.status == AirlineStatus::Registered
                && entry.funded >= self.config.min_funds;
            if activated {
                entry.status = AirlineStatus::Active;
                info!("Airline {} activated with {} funded", airline, entry.funded);
            }

            (entry.status, activated)
        };

        if activated {
            self.bus.publish(
                Notice::new(
                    NoticeType::AirlineActivated,
                    json!({ "airline": airline.to_string() }),
                )
                .with_correlation_id(airline.to_string()),
            );
        }

        Ok(status)
    }

    /// Whether an airline has been admitted (Registered or Active)
    pub fn is_registered(&self, airline: &ParticipantId) -> bool {
        self.airlines
            .read()
            .get(airline)
            .map(|a| a.status != AirlineStatus::Unregistered)
            .unwrap_or(false)
    }

    /// Whether an airline is funded and active
    pub fn is_active(&self, airline: &ParticipantId) -> bool {
        self.airlines
            .read()
            .get(airline)
            .map(|a| a.status == AirlineStatus::Active)
            .unwrap_or(false)
    }

    /// Number of admitted members
    pub fn registered_count(&self) -> usize {
        Self::registered_in(&self.airlines.read())
    }

    /// Distinct admission votes currently recorded for a candidate
    pub fn vote_count(&self, candidate: &ParticipantId) -> usize {
        self.airlines
            .read()
            .get(candidate)
            .map(|a| a.vote_count())
            .unwrap_or(0)
    }

    /// Snapshot of an airline record
    pub fn get(&self, airline: &ParticipantId) -> Option<Airline> {
        self.airlines.read().get(airline).cloned()
    }

    fn registered_in(airlines: &HashMap<ParticipantId, Airline>) -> usize {
        airlines
            .values()
            .filter(|a| a.status != AirlineStatus::Unregistered)
            .count()
    }
}
