//! Premium escrow, credit computation, and payout withdrawal

use crate::treasury::Treasury;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use event_bus::{Notice, NoticeBus, NoticeType};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use surety_core::{AccessControl, FlightKey, FlightRegistry, FlightStatus, ParticipantId};
use tracing::{debug, info};

/// Pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum premium per policy
    pub max_premium: Decimal,

    /// Credit multiplier numerator (credit = premium * num / den)
    pub credit_numerator: u32,

    /// Credit multiplier denominator
    pub credit_denominator: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_premium: Decimal::ONE, // 1 unit of settlement currency
            credit_numerator: 3,
            credit_denominator: 2,
        }
    }
}

/// Insurance policy held in escrow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Insured passenger
    pub passenger: ParticipantId,

    /// Covered flight
    pub flight: FlightKey,

    /// Premium paid into escrow
    pub premium: Decimal,

    /// Credit owed after resolution (written exactly once)
    pub credit: Option<Decimal>,

    /// Purchase timestamp
    pub purchased_at: DateTime<Utc>,
}

/// Escrow state guarded by one lock so every mutation commits atomically
struct PoolState {
    /// Policies by flight, then passenger
    policies: HashMap<FlightKey, HashMap<ParticipantId, Policy>>,

    /// Flights whose policies have been credited
    resolved: HashSet<FlightKey>,

    /// Held premiums not yet paid out
    escrow: Decimal,
}

/// Insurance pool
pub struct InsurancePool {
    access: Arc<AccessControl>,
    flights: Arc<FlightRegistry>,
    treasury: Arc<dyn Treasury>,
    bus: NoticeBus,
    config: PoolConfig,
    state: RwLock<PoolState>,
}

impl InsurancePool {
    /// Create an empty pool
    pub fn new(
        access: Arc<AccessControl>,
        flights: Arc<FlightRegistry>,
        treasury: Arc<dyn Treasury>,
        bus: NoticeBus,
        config: PoolConfig,
    ) -> Self {
        Self {
            access,
            flights,
            treasury,
            bus,
            config,
            state: RwLock::new(PoolState {
                policies: HashMap::new(),
                resolved: HashSet::new(),
                escrow: Decimal::ZERO,
            }),
        }
    }

    /// Buy insurance on a registered, still-unresolved flight
    pub fn buy(
        &self,
        airline: &ParticipantId,
        code: &str,
        departure: i64,
        payer: &ParticipantId,
        amount: Decimal,
    ) -> Result<FlightKey> {
        self.access.ensure_operational()?;

        if amount <= Decimal::ZERO {
            return Err(surety_core::Error::InvalidAmount(amount).into());
        }
        if amount > self.config.max_premium {
            return Err(Error::ExceedsCap {
                offered: amount,
                cap: self.config.max_premium,
            });
        }

        let key = FlightKey::new(airline.clone(), code, departure);
        let status = self.flights.status_of(&key)?;
        if status != FlightStatus::Unknown {
            return Err(Error::FlightAlreadyResolved(key));
        }

        {
            let mut state = self.state.write();
            let holders = state.policies.entry(key.clone()).or_default();
            if holders.contains_key(payer) {
                return Err(Error::AlreadyInsured {
                    passenger: payer.clone(),
                    flight: key,
                });
            }

            holders.insert(
                payer.clone(),
                Policy {
                    passenger: payer.clone(),
                    flight: key.clone(),
                    premium: amount,
                    credit: None,
                    purchased_at: Utc::now(),
                },
            );
            state.escrow += amount;
        }

        info!("Policy sold: {} on {} for {}", payer, key, amount);
        Ok(key)
    }

    /// Credit every policy under a flight after consensus (allowlist-gated)
    ///
    /// Idempotent on its own bookkeeping: a repeated invocation for the same
    /// flight is a no-op even if the caller's resolved flag was lost. Returns
    /// the number of policies credited.
    pub fn resolve(
        &self,
        key: &FlightKey,
        status: FlightStatus,
        by: &ParticipantId,
    ) -> Result<usize> {
        self.access.ensure_operational()?;
        self.access.ensure_authorized(by)?;

        let credited = {
            let mut state = self.state.write();
            if !state.resolved.insert(key.clone()) {
                debug!("Duplicate resolution for {} ignored", key);
                return Ok(0);
            }

            let mut credited = Vec::new();
            if let Some(holders) = state.policies.get_mut(key) {
                for policy in holders.values_mut() {
                    if policy.credit.is_some() {
                        continue;
                    }
                    let owed = if status.entitles_payout() {
                        policy.premium * Decimal::from(self.config.credit_numerator)
                            / Decimal::from(self.config.credit_denominator)
                    } else {
                        Decimal::ZERO
                    };
                    policy.credit = Some(owed);
                    credited.push((policy.passenger.clone(), owed));
                }
            }
            credited
        };

        for (passenger, owed) in &credited {
            if *owed > Decimal::ZERO {
                self.bus.publish(
                    Notice::new(
                        NoticeType::CreditIssued,
                        json!({
                            "passenger": passenger.to_string(),
                            "flight": key.to_string(),
                            "amount": owed.to_string(),
                        }),
                    )
                    .with_correlation_id(key.to_string()),
                );
            }
        }

        info!(
            "Flight {} resolved as {}: {} policies credited",
            key,
            status,
            credited.len()
        );
        Ok(credited.len())
    }

    /// Credit owed to a passenger for one flight (zero if none)
    pub fn credit_value(
        &self,
        airline: &ParticipantId,
        code: &str,
        departure: i64,
        payer: &ParticipantId,
    ) -> Decimal {
        let key = FlightKey::new(airline.clone(), code, departure);
        self.state
            .read()
            .policies
            .get(&key)
            .and_then(|holders| holders.get(payer))
            .and_then(|policy| policy.credit)
            .unwrap_or(Decimal::ZERO)
    }

    /// Total credit owed to a passenger across flights
    pub fn total_credit(&self, payer: &ParticipantId) -> Decimal {
        self.state
            .read()
            .policies
            .values()
            .filter_map(|holders| holders.get(payer))
            .filter_map(|policy| policy.credit)
            .sum()
    }

    /// Whether a passenger holds a policy on a flight
    pub fn is_insured(&self, key: &FlightKey, payer: &ParticipantId) -> bool {
        self.state
            .read()
            .policies
            .get(key)
            .map(|holders| holders.contains_key(payer))
            .unwrap_or(false)
    }

    /// Held premiums not yet paid out
    pub fn escrow_balance(&self) -> Decimal {
        self.state.read().escrow
    }

    /// Withdraw all credit owed to a passenger
    ///
    /// Credits are zeroed and escrow reduced before the transfer starts, so a
    /// reentrant call observes nothing left to withdraw. If the transfer fails
    /// the zeroed credits are restored and `TransferFailed` is returned.
    pub async fn withdraw(&self, payer: &ParticipantId) -> Result<Decimal> {
        self.access.ensure_operational()?;

        let mut zeroed: Vec<(FlightKey, Decimal)> = Vec::new();
        let total = {
            let mut state = self.state.write();
            let mut total = Decimal::ZERO;

            for (key, holders) in state.policies.iter_mut() {
                if let Some(policy) = holders.get_mut(payer) {
                    if let Some(owed) = policy.credit {
                        if owed > Decimal::ZERO {
                            policy.credit = Some(Decimal::ZERO);
                            zeroed.push((key.clone(), owed));
                            total += owed;
                        }
                    }
                }
            }

            if total == Decimal::ZERO {
                return Err(Error::NothingToWithdraw(payer.clone()));
            }
            state.escrow -= total;
            total
        };

        // Effects are committed; only now touch the external rail
        if let Err(e) = self.treasury.transfer(payer, total).await {
            let mut state = self.state.write();
            for (key, owed) in zeroed {
                if let Some(policy) = state
                    .policies
                    .get_mut(&key)
                    .and_then(|holders| holders.get_mut(payer))
                {
                    policy.credit = Some(owed);
                }
            }
            state.escrow += total;

            return Err(match e {
                Error::TransferFailed(msg) => Error::TransferFailed(msg),
                other => Error::TransferFailed(other.to_string()),
            });
        }

        self.bus.publish(Notice::new(
            NoticeType::PayoutWithdrawn,
            json!({
                "passenger": payer.to_string(),
                "amount": total.to_string(),
            }),
        ));

        info!("Payout of {} withdrawn by {}", total, payer);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treasury::CashAccounts;
    use async_trait::async_trait;
    use event_bus::NoticeBus;
    use surety_core::{AirlineRegistry, GovernanceConfig};

    const DEPARTURE: i64 = 1_700_000_000;

    struct Fixture {
        pool: InsurancePool,
        accounts: Arc<CashAccounts>,
        access: Arc<AccessControl>,
        airline: ParticipantId,
        coordinator: ParticipantId,
    }

    fn fixture() -> Fixture {
        fixture_with_treasury(Arc::new(CashAccounts::new())).0
    }

    fn fixture_with_treasury(treasury: Arc<CashAccounts>) -> (Fixture, Arc<FlightRegistry>) {
        let owner = ParticipantId::new("owner");
        let access = Arc::new(AccessControl::new(owner.clone()));
        let bus = NoticeBus::default();

        let airline = ParticipantId::new("AL1");
        let airlines = Arc::new(AirlineRegistry::new(
            access.clone(),
            bus.clone(),
            GovernanceConfig::default(),
            airline.clone(),
        ));
        airlines.fund(&airline, Decimal::from(10)).unwrap();

        let flights = Arc::new(FlightRegistry::new(access.clone(), airlines, bus.clone()));
        flights
            .register(&airline, "LF0001", DEPARTURE, &airline)
            .unwrap();

        let coordinator = ParticipantId::new("coordinator");
        access.authorize_caller(coordinator.clone(), &owner).unwrap();

        let accounts = treasury;
        let pool = InsurancePool::new(
            access.clone(),
            flights.clone(),
            accounts.clone(),
            bus,
            PoolConfig::default(),
        );

        (
            Fixture {
                pool,
                accounts,
                access,
                airline,
                coordinator,
            },
            flights,
        )
    }

    fn buy_one(f: &Fixture, passenger: &ParticipantId) -> FlightKey {
        f.pool
            .buy(&f.airline, "LF0001", DEPARTURE, passenger, Decimal::ONE)
            .unwrap()
    }

    #[test]
    fn test_buy_creates_policy_and_escrows_premium() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");

        let key = buy_one(&f, &p1);
        assert!(f.pool.is_insured(&key, &p1));
        assert_eq!(f.pool.escrow_balance(), Decimal::ONE);
        assert_eq!(f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p1), Decimal::ZERO);
    }

    #[test]
    fn test_buy_unknown_flight() {
        let f = fixture();
        let result = f.pool.buy(
            &f.airline,
            "LF9999",
            DEPARTURE,
            &ParticipantId::new("P1"),
            Decimal::ONE,
        );
        assert!(matches!(
            result,
            Err(Error::Core(surety_core::Error::UnknownFlight(_)))
        ));
    }

    #[test]
    fn test_buy_twice_rejected() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        buy_one(&f, &p1);

        let result = f
            .pool
            .buy(&f.airline, "LF0001", DEPARTURE, &p1, Decimal::new(5, 1));
        assert!(matches!(result, Err(Error::AlreadyInsured { .. })));
    }

    #[test]
    fn test_buy_over_cap_rejected() {
        let f = fixture();
        let result = f.pool.buy(
            &f.airline,
            "LF0001",
            DEPARTURE,
            &ParticipantId::new("P1"),
            Decimal::new(11, 1),
        );
        assert!(matches!(result, Err(Error::ExceedsCap { .. })));
    }

    #[test]
    fn test_buy_after_resolution_rejected() {
        let (f, flights) = fixture_with_treasury(Arc::new(CashAccounts::new()));
        let key = FlightKey::new(f.airline.clone(), "LF0001", DEPARTURE);
        flights
            .finalize_status(&key, FlightStatus::OnTime, &f.coordinator)
            .unwrap();

        let result = f.pool.buy(
            &f.airline,
            "LF0001",
            DEPARTURE,
            &ParticipantId::new("P1"),
            Decimal::ONE,
        );
        assert!(matches!(result, Err(Error::FlightAlreadyResolved(_))));
    }

    #[test]
    fn test_resolve_credits_premium_times_one_and_a_half() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        let p2 = ParticipantId::new("P2");

        let key = buy_one(&f, &p1);
        f.pool
            .buy(&f.airline, "LF0001", DEPARTURE, &p2, Decimal::new(4, 1))
            .unwrap();

        let credited = f
            .pool
            .resolve(&key, FlightStatus::LateAirline, &f.coordinator)
            .unwrap();
        assert_eq!(credited, 2);

        assert_eq!(
            f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p1),
            Decimal::new(15, 1)
        );
        assert_eq!(
            f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p2),
            Decimal::new(6, 1)
        );
    }

    #[test]
    fn test_resolve_non_airline_delay_credits_zero() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        let key = buy_one(&f, &p1);

        f.pool
            .resolve(&key, FlightStatus::LateWeather, &f.coordinator)
            .unwrap();

        assert_eq!(
            f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p1),
            Decimal::ZERO
        );
        assert_eq!(f.pool.total_credit(&p1), Decimal::ZERO);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        let key = buy_one(&f, &p1);

        f.pool
            .resolve(&key, FlightStatus::LateAirline, &f.coordinator)
            .unwrap();

        // A second invocation, even with a different status, changes nothing
        let credited = f
            .pool
            .resolve(&key, FlightStatus::OnTime, &f.coordinator)
            .unwrap();
        assert_eq!(credited, 0);
        assert_eq!(
            f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p1),
            Decimal::new(15, 1)
        );
    }

    #[test]
    fn test_resolve_requires_allowlisted_caller() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        let key = buy_one(&f, &p1);

        let result = f
            .pool
            .resolve(&key, FlightStatus::LateAirline, &ParticipantId::new("mallory"));
        assert!(matches!(
            result,
            Err(Error::Core(surety_core::Error::PermissionDenied(_)))
        ));
    }

    #[tokio::test]
    async fn test_withdraw_pays_out_and_clears_credit() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        let key = buy_one(&f, &p1);

        f.pool
            .resolve(&key, FlightStatus::LateAirline, &f.coordinator)
            .unwrap();

        let paid = f.pool.withdraw(&p1).await.unwrap();
        assert_eq!(paid, Decimal::new(15, 1));
        assert_eq!(f.accounts.balance_of(&p1), Decimal::new(15, 1));
        assert_eq!(
            f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p1),
            Decimal::ZERO
        );

        // Nothing left for a second withdrawal
        let result = f.pool.withdraw(&p1).await;
        assert!(matches!(result, Err(Error::NothingToWithdraw(_))));
    }

    #[tokio::test]
    async fn test_mutations_fail_when_suspended() {
        let f = fixture();
        let p1 = ParticipantId::new("P1");
        let key = buy_one(&f, &p1);
        f.pool
            .resolve(&key, FlightStatus::LateAirline, &f.coordinator)
            .unwrap();

        f.access
            .set_operational(false, &ParticipantId::new("owner"))
            .unwrap();

        let result = f
            .pool
            .buy(&f.airline, "LF0001", DEPARTURE, &ParticipantId::new("P2"), Decimal::ONE);
        assert!(matches!(result, Err(Error::Core(surety_core::Error::Unavailable))));

        let result = f.pool.resolve(&key, FlightStatus::OnTime, &f.coordinator);
        assert!(matches!(result, Err(Error::Core(surety_core::Error::Unavailable))));

        let result = f.pool.withdraw(&p1).await;
        assert!(matches!(result, Err(Error::Core(surety_core::Error::Unavailable))));

        // Queries stay available
        assert_eq!(
            f.pool.credit_value(&f.airline, "LF0001", DEPARTURE, &p1),
            Decimal::new(15, 1)
        );
    }

    #[tokio::test]
    async fn test_withdraw_without_credit() {
        let f = fixture();
        let result = f.pool.withdraw(&ParticipantId::new("P1")).await;
        assert!(matches!(result, Err(Error::NothingToWithdraw(_))));
    }

    struct FailingTreasury;

    #[async_trait]
    impl Treasury for FailingTreasury {
        async fn transfer(&self, _to: &ParticipantId, _amount: Decimal) -> Result<()> {
            Err(Error::TransferFailed("rail unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_transfer_restores_credits() {
        let owner = ParticipantId::new("owner");
        let access = Arc::new(AccessControl::new(owner.clone()));
        let bus = NoticeBus::default();
        let airline = ParticipantId::new("AL1");
        let airlines = Arc::new(AirlineRegistry::new(
            access.clone(),
            bus.clone(),
            GovernanceConfig::default(),
            airline.clone(),
        ));
        airlines.fund(&airline, Decimal::from(10)).unwrap();
        let flights = Arc::new(FlightRegistry::new(access.clone(), airlines, bus.clone()));
        flights.register(&airline, "LF0001", DEPARTURE, &airline).unwrap();
        let coordinator = ParticipantId::new("coordinator");
        access.authorize_caller(coordinator.clone(), &owner).unwrap();

        let pool = InsurancePool::new(
            access,
            flights,
            Arc::new(FailingTreasury),
            bus,
            PoolConfig::default(),
        );

        let p1 = ParticipantId::new("P1");
        let key = pool
            .buy(&airline, "LF0001", DEPARTURE, &p1, Decimal::ONE)
            .unwrap();
        pool.resolve(&key, FlightStatus::LateAirline, &coordinator).unwrap();
        let escrow_before = pool.escrow_balance();

        let result = pool.withdraw(&p1).await;
        assert!(matches!(result, Err(Error::TransferFailed(_))));

        // Credit and escrow are back; the withdrawal can be retried
        assert_eq!(
            pool.credit_value(&airline, "LF0001", DEPARTURE, &p1),
            Decimal::new(15, 1)
        );
        assert_eq!(pool.escrow_balance(), escrow_before);
    }
}
