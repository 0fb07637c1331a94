//! Operational gate and authorized-caller allowlist

use crate::{Error, Result};
use crate::types::ParticipantId;
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::{info, warn};

/// Access control: operational flag plus authorized-caller allowlist
///
/// The operational flag gates every mutating call in the system. The allowlist
/// gates privileged cross-component calls (status finalization, credit
/// triggers). Both are owner-administered, and both administration paths stay
/// available while operations are suspended.
pub struct AccessControl {
    /// Owner identity, fixed at construction
    owner: ParticipantId,

    /// Operational flag
    operational: RwLock<bool>,

    /// Authorized callers for privileged cross-component calls
    authorized: RwLock<HashSet<ParticipantId>>,
}

impl AccessControl {
    /// Create access control owned by `owner`, starting operational
    pub fn new(owner: ParticipantId) -> Self {
        Self {
            owner,
            operational: RwLock::new(true),
            authorized: RwLock::new(HashSet::new()),
        }
    }

    /// Owner identity
    pub fn owner(&self) -> &ParticipantId {
        &self.owner
    }

    /// Whether operations are currently allowed
    pub fn is_operational(&self) -> bool {
        *self.operational.read()
    }

    /// Set the operational flag (owner-only, works while suspended)
    pub fn set_operational(&self, on: bool, by: &ParticipantId) -> Result<()> {
        self.ensure_owner(by)?;

        let mut operational = self.operational.write();
        if *operational != on {
            if on {
                info!("Operations resumed by {}", by);
            } else {
                warn!("Operations suspended by {}", by);
            }
        }
        *operational = on;

        Ok(())
    }

    /// Add a caller to the allowlist (owner-only, works while suspended)
    pub fn authorize_caller(&self, caller: ParticipantId, by: &ParticipantId) -> Result<()> {
        self.ensure_owner(by)?;

        if self.authorized.write().insert(caller.clone()) {
            info!("Caller authorized: {}", caller);
        }

        Ok(())
    }

    /// Remove a caller from the allowlist (owner-only, works while suspended)
    pub fn deauthorize_caller(&self, caller: &ParticipantId, by: &ParticipantId) -> Result<()> {
        self.ensure_owner(by)?;

        if self.authorized.write().remove(caller) {
            info!("Caller deauthorized: {}", caller);
        }

        Ok(())
    }

    /// Whether a caller is on the allowlist
    pub fn is_authorized(&self, caller: &ParticipantId) -> bool {
        self.authorized.read().contains(caller)
    }

    /// Fail with `Unavailable` unless operations are allowed
    pub fn ensure_operational(&self) -> Result<()> {
        if self.is_operational() {
            Ok(())
        } else {
            Err(Error::Unavailable)
        }
    }

    /// Fail with `PermissionDenied` unless the caller is allowlisted
    pub fn ensure_authorized(&self, caller: &ParticipantId) -> Result<()> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            Err(Error::PermissionDenied(caller.clone()))
        }
    }

    fn ensure_owner(&self, by: &ParticipantId) -> Result<()> {
        if by == &self.owner {
            Ok(())
        } else {
            Err(Error::PermissionDenied(by.clone()))
        }
    }
}
