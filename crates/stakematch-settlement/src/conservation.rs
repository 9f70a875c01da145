//! Escrow conservation invariant checker.
//!
//! Invariant checked per pool after confirmations:
//! ```text
//! Σ(confirmed deposits) - Σ(confirmed withdrawals) == Σ(principal still staked)
//! ```
//!
//! Only confirmed flows count: a request the pool has not answered moved no
//! funds yet. The check is phrased additively so that it never underflows.

use std::collections::HashMap;

use stakematch_types::{AccountId, Balance, Result, StakeMatchError};

#[derive(Debug, Clone, Default)]
pub struct EscrowConservation {
    deposits: HashMap<AccountId, Balance>,
    withdrawals: HashMap<AccountId, Balance>,
}

impl EscrowConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `Internal` on overflow.
    pub fn record_deposit(&mut self, pool: &AccountId, amount: Balance) -> Result<()> {
        Self::add(&mut self.deposits, pool, amount)
    }

    /// # Errors
    /// Returns `Internal` on overflow.
    pub fn record_withdrawal(&mut self, pool: &AccountId, amount: Balance) -> Result<()> {
        Self::add(&mut self.withdrawals, pool, amount)
    }

    fn add(totals: &mut HashMap<AccountId, Balance>, pool: &AccountId, amount: Balance) -> Result<()> {
        let entry = totals.entry(pool.clone()).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| StakeMatchError::Internal(format!("escrow total overflow for {pool}")))?;
        Ok(())
    }

    #[must_use]
    pub fn total_deposits(&self, pool: &AccountId) -> Balance {
        self.deposits.get(pool).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_withdrawals(&self, pool: &AccountId) -> Balance {
        self.withdrawals.get(pool).copied().unwrap_or_default()
    }

    /// Principal the pool should still hold. `None` if more left than entered.
    #[must_use]
    pub fn expected_staked(&self, pool: &AccountId) -> Option<Balance> {
        self.total_deposits(pool)
            .checked_sub(self.total_withdrawals(pool))
    }

    /// Compare the tracked flows with the principal the ledger says is staked.
    ///
    /// # Errors
    /// Returns `EscrowInvariantViolation` if they disagree.
    pub fn verify(&self, pool: &AccountId, actual_staked: Balance) -> Result<()> {
        let deposited = self.total_deposits(pool);
        let withdrawn = self.total_withdrawals(pool);
        if actual_staked.checked_add(withdrawn) != Some(deposited) {
            return Err(StakeMatchError::EscrowInvariantViolation {
                reason: format!(
                    "pool {pool}: staked {actual_staked} != deposits {deposited} - withdrawals {withdrawn}"
                ),
            });
        }
        Ok(())
    }

    /// Pools that saw at least one confirmed flow.
    #[must_use]
    pub fn tracked_pools(&self) -> Vec<AccountId> {
        let mut pools: Vec<AccountId> = self
            .deposits
            .keys()
            .chain(self.withdrawals.keys())
            .cloned()
            .collect();
        pools.sort();
        pools.dedup();
        pools
    }
}
