//! Payout journal entries.
//!
//! The exchange never moves funds itself. Every refund it approves is
//! appended to the payout journal as a [`Payout`], and the host executes the
//! transfer. The journal is append-only; a stake appears in it at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Balance, Epoch, StakeId};

/// Why funds are being returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutReason {
    /// Cancelled principal after the pool confirmed the withdrawal.
    CancellationRefund,
    /// Principal handed back by operator reconciliation of an errored stake.
    Reconciliation,
}

impl std::fmt::Display for PayoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CancellationRefund => write!(f, "CANCELLATION_REFUND"),
            Self::Reconciliation => write!(f, "RECONCILIATION"),
        }
    }
}

/// A transfer instruction for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub stake_id: StakeId,
    pub staker: AccountId,
    pub amount: Balance,
    pub reason: PayoutReason,
    /// Epoch in which the refund was approved.
    pub epoch: Epoch,
    pub issued_at: DateTime<Utc>,
}

impl std::fmt::Display for Payout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Payout[{}] {} -> {} ({}, {})",
            self.reason, self.amount, self.staker, self.stake_id, self.epoch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_recipient() {
        let p = Payout {
            stake_id: StakeId::from("s1"),
            staker: AccountId::from("alice.near"),
            amount: Balance(42),
            reason: PayoutReason::CancellationRefund,
            epoch: Epoch(3),
            issued_at: Utc::now(),
        };
        let s = p.to_string();
        assert!(s.contains("42 -> alice.near"));
        assert!(s.contains("CANCELLATION_REFUND"));
    }
}
