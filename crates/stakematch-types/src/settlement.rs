//! # SettlementRequest — one call across the pool boundary
//!
//! Every deposit into and withdrawal from the staking pool is tracked as a
//! two-phase request keyed by a [`CorrelationToken`]. The pool answers later,
//! at least once, in any order relative to other requests.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐  pool confirmed  ┌───────────┐
//!   │ REQUESTED ├─────────────────▶│ CONFIRMED │
//!   └─────┬─────┘                  └───────────┘
//!         │ pool rejected / fault
//!         ▼
//!   ┌────────┐
//!   │ FAILED │
//!   └────────┘
//! ```
//!
//! A failed request is never revived: a retry issues a new request with a
//! new token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Balance, CorrelationToken, Epoch, StakeId};

/// Direction of a pool request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    /// Principal moving into the pool on `new_stake`.
    Deposit,
    /// Unmatched principal leaving the pool on `cancel_stake`.
    Withdrawal,
}

impl std::fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

/// Phase of a pool request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementPhase {
    Requested,
    Confirmed,
    Failed,
}

impl SettlementPhase {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Requested, Self::Confirmed | Self::Failed)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Requested)
    }
}

impl std::fmt::Display for SettlementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "REQUESTED"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// A deposit or withdrawal issued to a staking pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub token: CorrelationToken,
    pub stake_id: StakeId,
    pub kind: SettlementKind,
    pub amount: Balance,
    pub pool: AccountId,
    pub phase: SettlementPhase,
    /// 1 for the first attempt, incremented on every retry.
    pub attempt: u32,
    pub requested_epoch: Epoch,
    /// Epoch the pool confirmed or rejected the request.
    pub resolved_epoch: Option<Epoch>,
    /// Failure reason reported by the pool.
    pub failure: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl SettlementRequest {
    #[must_use]
    pub fn new(
        stake_id: StakeId,
        kind: SettlementKind,
        amount: Balance,
        pool: AccountId,
        attempt: u32,
        epoch: Epoch,
    ) -> Self {
        Self {
            token: CorrelationToken::new(),
            stake_id,
            kind,
            amount,
            pool,
            phase: SettlementPhase::Requested,
            attempt,
            requested_epoch: epoch,
            resolved_epoch: None,
            failure: None,
            requested_at: Utc::now(),
        }
    }

    /// A follow-up request for the same operation with a fresh token.
    #[must_use]
    pub fn retry(&self, epoch: Epoch) -> Self {
        Self::new(
            self.stake_id.clone(),
            self.kind,
            self.amount,
            self.pool.clone(),
            self.attempt + 1,
            epoch,
        )
    }

    /// Attempt to transition to CONFIRMED.
    ///
    /// # Errors
    /// Returns error if the request is already resolved.
    pub fn mark_confirmed(&mut self, epoch: Epoch) -> crate::Result<()> {
        self.resolve(SettlementPhase::Confirmed, epoch)
    }

    /// Attempt to transition to FAILED.
    ///
    /// # Errors
    /// Returns error if the request is already resolved.
    pub fn mark_failed(&mut self, epoch: Epoch, reason: impl Into<String>) -> crate::Result<()> {
        self.resolve(SettlementPhase::Failed, epoch)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    fn resolve(&mut self, target: SettlementPhase, epoch: Epoch) -> crate::Result<()> {
        if !self.phase.can_transition_to(target) {
            return Err(crate::StakeMatchError::Internal(format!(
                "cannot move {} {} from {} to {}",
                self.kind, self.token, self.phase, target
            )));
        }
        self.phase = target;
        self.resolved_epoch = Some(epoch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request() -> SettlementRequest {
        SettlementRequest::new(
            StakeId::from("s1"),
            SettlementKind::Deposit,
            Balance(100),
            AccountId::from("pool.near"),
            1,
            Epoch(7),
        )
    }

    #[test]
    fn phase_transitions() {
        assert!(SettlementPhase::Requested.can_transition_to(SettlementPhase::Confirmed));
        assert!(SettlementPhase::Requested.can_transition_to(SettlementPhase::Failed));
        assert!(!SettlementPhase::Confirmed.can_transition_to(SettlementPhase::Failed));
        assert!(!SettlementPhase::Failed.can_transition_to(SettlementPhase::Confirmed));
        assert!(!SettlementPhase::Failed.can_transition_to(SettlementPhase::Requested));
    }

    #[test]
    fn confirm_records_epoch() {
        let mut r = make_request();
        r.mark_confirmed(Epoch(9)).unwrap();
        assert_eq!(r.phase, SettlementPhase::Confirmed);
        assert_eq!(r.resolved_epoch, Some(Epoch(9)));
        assert!(r.mark_confirmed(Epoch(10)).is_err());
        assert!(r.mark_failed(Epoch(10), "late").is_err());
    }

    #[test]
    fn failure_keeps_reason() {
        let mut r = make_request();
        r.mark_failed(Epoch(8), "pool paused").unwrap();
        assert_eq!(r.phase, SettlementPhase::Failed);
        assert_eq!(r.failure.as_deref(), Some("pool paused"));
    }

    #[test]
    fn retry_uses_fresh_token() {
        let r = make_request();
        let again = r.retry(Epoch(8));
        assert_ne!(r.token, again.token);
        assert_eq!(again.attempt, 2);
        assert_eq!(again.amount, r.amount);
        assert_eq!(again.phase, SettlementPhase::Requested);
    }

    #[test]
    fn serde_roundtrip() {
        let r = make_request();
        let json = serde_json::to_string(&r).unwrap();
        let back: SettlementRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
