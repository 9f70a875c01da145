//! Durable record of the whole exchange, as JSON.
//!
//! A snapshot carries everything except the pool and oracle handles and the
//! reconciliation policy, which the host supplies again on restore.
//! Confirmed flows and resolved tokens are rebuilt from the settlement log.

use serde::{Deserialize, Serialize};
use stakematch_matchcore::{compute_fill_root, fill_root_hex, verify_fill_root};
use stakematch_settlement::{
    RateOracle, ReconciliationPolicy, RetryPolicy, SettlementCoordinator, StakePool,
};
use stakematch_types::{
    Bet, ExchangeConfig, Fill, Metadata, Payout, Person, Result, SettlementRequest, Stake,
    StakeMatchError,
};
use tracing::info;

use crate::{Exchange, access::AccessControl, ledger::StakeLedger, registry::BetRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub config: ExchangeConfig,
    pub metadata: Metadata,
    pub bets: Vec<Bet>,
    pub persons: Vec<Person>,
    pub stakes: Vec<Stake>,
    pub fills: Vec<Fill>,
    /// Hex SHA-256 digest of `fills`, checked on restore.
    pub fill_root: String,
    /// Every pool request in issue order.
    pub settlement_log: Vec<SettlementRequest>,
    pub payouts: Vec<Payout>,
}

impl ExchangeSnapshot {
    /// # Errors
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    /// Returns `Serialization` for malformed input.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl<P: StakePool, O: RateOracle> Exchange<P, O> {
    #[must_use]
    pub fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeSnapshot {
            config: self.config.clone(),
            metadata: self.access.metadata().clone(),
            bets: self.registry.iter().cloned().collect(),
            persons: self.registry.persons().to_vec(),
            stakes: self.ledger.iter().cloned().collect(),
            fills: self.ledger.fills().to_vec(),
            fill_root: fill_root_hex(&compute_fill_root(self.ledger.fills())),
            settlement_log: self.coordinator.log().cloned().collect(),
            payouts: self.payouts.clone(),
        }
    }

    /// Rebuild an exchange with the default retry policy.
    ///
    /// # Errors
    /// `Configuration` for an unusable config, `Serialization` for an
    /// inconsistent snapshot.
    pub fn restore(snapshot: ExchangeSnapshot, pool: P, oracle: O) -> Result<Self> {
        let policy = Box::new(RetryPolicy::new(snapshot.config.max_settlement_attempts));
        Self::restore_with_policy(snapshot, pool, oracle, policy)
    }

    /// # Errors
    /// `Configuration` for an unusable config, `Serialization` for an
    /// inconsistent snapshot or fills that do not match `fill_root`.
    pub fn restore_with_policy(
        snapshot: ExchangeSnapshot,
        pool: P,
        oracle: O,
        policy: Box<dyn ReconciliationPolicy>,
    ) -> Result<Self> {
        let ExchangeSnapshot {
            config,
            metadata,
            bets,
            persons,
            stakes,
            fills,
            fill_root,
            settlement_log,
            payouts,
        } = snapshot;

        let mut root = [0u8; 32];
        hex::decode_to_slice(&fill_root, &mut root)
            .map_err(|e| StakeMatchError::Serialization(format!("fill_root: {e}")))?;
        if !verify_fill_root(&fills, &root) {
            return Err(StakeMatchError::Serialization(
                "fills do not match the recorded fill_root".into(),
            ));
        }

        let coordinator = SettlementCoordinator::restore(&config, policy, settlement_log)?;
        let registry = BetRegistry::restore(bets, persons)?;
        let ledger = StakeLedger::restore(stakes, fills)?;
        info!(
            bets = registry.len(),
            stakes = ledger.len(),
            payouts = payouts.len(),
            "Exchange restored"
        );
        Ok(Self::assemble(
            config,
            AccessControl::from_metadata(metadata),
            registry,
            ledger,
            coordinator,
            payouts,
            pool,
            oracle,
        ))
    }
}
