//! Payout rail seam

use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use surety_core::ParticipantId;
use tracing::debug;

/// External payout rail
///
/// The pool commits its credit-zeroing effects before calling into the rail,
/// so implementations may be arbitrarily slow or fail; a failed transfer is
/// reported back and the pool restores the credits.
#[async_trait]
pub trait Treasury: Send + Sync {
    /// Transfer settled funds to a participant
    async fn transfer(&self, to: &ParticipantId, amount: Decimal) -> Result<()>;
}

/// In-memory cash accounts, the default rail for local operation and tests
#[derive(Debug, Default)]
pub struct CashAccounts {
    balances: DashMap<ParticipantId, Decimal>,
}

impl CashAccounts {
    /// Create empty accounts
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of a participant
    pub fn balance_of(&self, id: &ParticipantId) -> Decimal {
        self.balances.get(id).map(|b| *b).unwrap_or(Decimal::ZERO)
    }

    /// Credit a participant's account
    pub fn deposit(&self, id: &ParticipantId, amount: Decimal) {
        *self.balances.entry(id.clone()).or_insert(Decimal::ZERO) += amount;
    }
}

#[async_trait]
impl Treasury for CashAccounts {
    async fn transfer(&self, to: &ParticipantId, amount: Decimal) -> Result<()> {
        self.deposit(to, amount);
        debug!("Transferred {} to {}", amount, to);
        Ok(())
    }
}
