//! Oracle registration and index assignment

use crate::config::OracleConfig;
use crate::entropy::IndexSource;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use surety_core::{AccessControl, ParticipantId};
use tracing::info;

/// Assigned index slots for one oracle
#[derive(Debug, Clone)]
pub struct OracleSlot {
    /// The 3 distinct indices this oracle answers for
    pub indices: [u8; 3],

    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

/// Oracle registry
pub struct OracleRegistry {
    access: Arc<AccessControl>,
    source: Arc<dyn IndexSource>,
    config: OracleConfig,
    oracles: DashMap<ParticipantId, OracleSlot>,
    registrations: AtomicU64,
}

impl OracleRegistry {
    /// Create an empty registry
    pub fn new(
        access: Arc<AccessControl>,
        source: Arc<dyn IndexSource>,
        config: OracleConfig,
    ) -> Self {
        Self {
            access,
            source,
            config,
            oracles: DashMap::new(),
            registrations: AtomicU64::new(0),
        }
    }

    /// Register an oracle and assign its 3 index slots
    ///
    /// Draw material binds the caller identity and registration order, so no
    /// single party can predict an assignment ahead of time.
    pub fn register(&self, oracle: &ParticipantId, fee: Decimal) -> Result<[u8; 3]> {
        self.access.ensure_operational()?;

        if fee < self.config.registration_fee {
            return Err(Error::InsufficientFee {
                offered: fee,
                required: self.config.registration_fee,
            });
        }
        if self.oracles.contains_key(oracle) {
            return Err(Error::AlreadyRegistered(oracle.clone()));
        }

        let nonce = self.registrations.fetch_add(1, Ordering::Relaxed);
        let indices = self.assign_indices(oracle, nonce)?;

        match self.oracles.entry(oracle.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(Error::AlreadyRegistered(oracle.clone()));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(OracleSlot {
                    indices,
                    registered_at: Utc::now(),
                });
            }
        }

        info!("Oracle {} registered with indices {:?}", oracle, indices);
        Ok(indices)
    }

    /// Indices assigned to an oracle, if registered
    pub fn indices_of(&self, oracle: &ParticipantId) -> Option<[u8; 3]> {
        self.oracles.get(oracle).map(|slot| slot.indices)
    }

    /// Whether an oracle holds the given index
    pub fn is_assigned(&self, oracle: &ParticipantId, index: u8) -> bool {
        self.oracles
            .get(oracle)
            .map(|slot| slot.indices.contains(&index))
            .unwrap_or(false)
    }

    /// Number of registered oracles
    pub fn count(&self) -> usize {
        self.oracles.len()
    }

    fn assign_indices(&self, oracle: &ParticipantId, nonce: u64) -> Result<[u8; 3]> {
        let mut indices: Vec<u8> = Vec::with_capacity(3);
        let mut attempt: u32 = 0;

        while indices.len() < 3 {
            // A source that never varies cannot fill 3 distinct slots
            if attempt > 256 {
                return Err(surety_core::Error::Config(
                    "index source failed to produce distinct indices".to_string(),
                )
                .into());
            }

            let mut material = Vec::with_capacity(oracle.as_str().len() + 12);
            material.extend_from_slice(oracle.as_str().as_bytes());
            material.extend_from_slice(&nonce.to_be_bytes());
            material.extend_from_slice(&attempt.to_be_bytes());

            let index = self.source.draw(&material, self.config.index_modulus);
            if !indices.contains(&index) {
                indices.push(index);
            }
            attempt += 1;
        }

        Ok([indices[0], indices[1], indices[2]])
    }
}
