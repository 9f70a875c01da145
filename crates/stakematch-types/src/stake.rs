//! Stake model: one participant's funds locked on one side of a bet.
//!
//! ## Status machine
//!
//! ```text
//!   ┌────────┐ cancel  ┌──────────────────────┐ confirmed ┌───────────┐ refund ┌──────────┐
//!   │ ACTIVE ├────────▶│ PENDING_CANCELLATION ├──────────▶│ CANCELLED ├───────▶│ REFUNDED │
//!   └───┬────┘         └──────────┬───────────┘           └───────────┘        └────▲─────┘
//!       │ pool fault              │ pool fault                                      │
//!       ▼                         ▼                                                 │
//!   ┌─────────┐◀──────────────────┘                    operator reconciliation     │
//!   │ ERRORED ├─────────────────────────────────────────────────────────────────────┘
//!   └─────────┘
//! ```
//!
//! Transitions are **monotonic**; nothing ever moves back to ACTIVE.

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Balance, BetId, CorrelationToken, Epoch, Position, Result, StakeId,
    StakeMatchError,
};

/// Lifecycle status of a stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeStatus {
    /// Funds deposited (or being deposited); unmatched part open for matching.
    Active,
    /// A withdrawal of the unmatched part was issued and awaits the pool.
    PendingCancellation,
    /// The pool confirmed the withdrawal; the cancelled amount is refundable.
    Cancelled,
    /// The cancelled amount was paid back to the staker.
    Refunded,
    /// A pool operation failed, or unwound fills handed principal back to a
    /// stake that had already left Active; awaiting reconciliation.
    Errored,
}

impl StakeStatus {
    /// Can a stake in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::PendingCancellation | Self::Errored)
                | (Self::PendingCancellation, Self::Cancelled | Self::Errored)
                | (Self::Cancelled | Self::Errored, Self::Refunded)
                | (Self::Cancelled | Self::Refunded, Self::Errored)
        )
    }
}

impl std::fmt::Display for StakeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::PendingCancellation => write!(f, "PENDING_CANCELLATION"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Refunded => write!(f, "REFUNDED"),
            Self::Errored => write!(f, "ERRORED"),
        }
    }
}

/// A single stake on one side of a bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub stake_id: StakeId,
    pub bet_id: BetId,
    pub staker: AccountId,
    pub position: Position,
    /// Total funds attached to the stake.
    pub principal: Balance,
    /// Portion paired with opposite stakes.
    pub matched: Balance,
    /// Portion not yet paired. `matched + unmatched == principal`.
    pub unmatched: Balance,
    /// Portion withdrawn from the pool by cancellation (`<= unmatched`).
    pub cancelled: Balance,
    /// Excluded from automatic matching.
    pub gentlemans: bool,
    pub status: StakeStatus,
    /// Ledger registration order; the FIFO key of the matching engine.
    pub sequence: u64,
    /// Pool holding this stake's principal.
    pub pool: AccountId,
    /// Epoch the principal entered the pool.
    pub deposit_epoch: Epoch,
    /// Epoch the cancelled portion left the pool.
    pub exit_epoch: Option<Epoch>,
    /// Token of the latest pool request issued for this stake.
    pub pending_token: Option<CorrelationToken>,
    /// Host block timestamp (ns) at registration.
    pub created_at: u64,
}

impl Stake {
    /// Can this stake take part in automatic matching right now?
    #[must_use]
    pub fn is_match_candidate(&self) -> bool {
        self.status == StakeStatus::Active && !self.gentlemans && !self.unmatched.is_zero()
    }

    #[must_use]
    pub fn is_fully_matched(&self) -> bool {
        self.unmatched.is_zero()
    }

    /// Principal still earning in the pool.
    #[must_use]
    pub fn staked_principal(&self) -> Balance {
        self.principal.saturating_sub(self.cancelled)
    }

    /// Move `amount` from unmatched to matched.
    ///
    /// # Errors
    /// Returns `Internal` if `amount` exceeds the unmatched portion.
    pub fn apply_fill(&mut self, amount: Balance) -> Result<()> {
        let unmatched = self.unmatched.checked_sub(amount).ok_or_else(|| {
            StakeMatchError::Internal(format!(
                "fill of {amount} exceeds unmatched {} on {}",
                self.unmatched, self.stake_id
            ))
        })?;
        let matched = self
            .matched
            .checked_add(amount)
            .ok_or_else(|| StakeMatchError::Internal("matched overflow".into()))?;
        self.unmatched = unmatched;
        self.matched = matched;
        Ok(())
    }

    /// Reverse a fill: move `amount` from matched back to unmatched.
    ///
    /// # Errors
    /// Returns `Internal` if `amount` exceeds the matched portion.
    pub fn unwind_fill(&mut self, amount: Balance) -> Result<()> {
        let matched = self.matched.checked_sub(amount).ok_or_else(|| {
            StakeMatchError::Internal(format!(
                "unwind of {amount} exceeds matched {} on {}",
                self.matched, self.stake_id
            ))
        })?;
        self.matched = matched;
        self.unmatched = self.principal.saturating_sub(matched);
        Ok(())
    }

    /// Attempt a status transition.
    ///
    /// # Errors
    /// Returns `InvalidStateTransition` if the move is not allowed.
    pub fn transition(&mut self, target: StakeStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(StakeMatchError::InvalidStateTransition {
                stake_id: self.stake_id.clone(),
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Stake {
    /// Random 21-char id from the nanoid alphabet.
    pub fn random_id() -> String {
        use rand::Rng;
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
        let mut rng = rand::thread_rng();
        (0..crate::constants::ID_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    pub fn dummy(bet_id: BetId, position: Position, principal: Balance, sequence: u64) -> Self {
        Self {
            stake_id: StakeId::new(Self::random_id()),
            bet_id,
            staker: AccountId::from("bob.test.near"),
            position,
            principal,
            matched: Balance::ZERO,
            unmatched: principal,
            cancelled: Balance::ZERO,
            gentlemans: false,
            status: StakeStatus::Active,
            sequence,
            pool: AccountId::from(crate::constants::TESTNET_STAKE_POOL),
            deposit_epoch: Epoch(0),
            exit_epoch: None,
            pending_token: None,
            created_at: 0,
        }
    }
}
