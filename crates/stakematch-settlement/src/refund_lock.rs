//! Epoch-based refund lock.
//!
//! A pool releases withdrawn principal only after its unbonding delay. The
//! lock blocks refunds until `refund_delay_epochs` epochs have passed since
//! the withdrawal was confirmed.

use stakematch_types::{Epoch, Result, StakeId, StakeMatchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundLock {
    delay_epochs: u64,
}

impl RefundLock {
    #[must_use]
    pub fn new(delay_epochs: u64) -> Self {
        Self { delay_epochs }
    }

    #[must_use]
    pub fn delay_epochs(&self) -> u64 {
        self.delay_epochs
    }

    /// First epoch at which a withdrawal confirmed at `confirmed` may be refunded.
    #[must_use]
    pub fn unlocks_at(&self, confirmed: Epoch) -> Epoch {
        Epoch(confirmed.0.saturating_add(self.delay_epochs))
    }

    #[must_use]
    pub fn is_unlocked(&self, confirmed: Epoch, current: Epoch) -> bool {
        current.since(confirmed) >= self.delay_epochs
    }

    /// Guard a refund attempt.
    ///
    /// # Errors
    /// Returns `RefundLocked` while the delay has not elapsed.
    pub fn check(&self, stake_id: &StakeId, confirmed: Epoch, current: Epoch) -> Result<()> {
        if self.is_unlocked(confirmed, current) {
            Ok(())
        } else {
            Err(StakeMatchError::RefundLocked {
                stake_id: stake_id.clone(),
                elapsed: current.since(confirmed),
                required: self.delay_epochs,
            })
        }
    }
}
