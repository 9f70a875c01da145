//! # stakematch-settlement
//!
//! **Settlement plane**: everything that crosses the boundary to the
//! external staking pool.
//!
//! ## Architecture
//!
//! The exchange hands every deposit and withdrawal to the
//! [`SettlementCoordinator`], which:
//! 1. Issues the request under a fresh correlation token
//! 2. Submits it through the [`StakePool`] trait without waiting
//! 3. Resolves the pool's later answer by token, at most once
//! 4. Lets a [`ReconciliationPolicy`] retry or escalate faults
//! 5. Tracks confirmed flows for the escrow conservation check
//! 6. Holds refunds until the pool's unbonding delay has passed
//!
//! Yield accrual over pool epochs lives in [`yield_calc`].

pub mod conservation;
pub mod coordinator;
pub mod idempotency;
pub mod policy;
pub mod pool;
pub mod refund_lock;
pub mod yield_calc;

pub use conservation::EscrowConservation;
pub use coordinator::{Resolution, SettlementCoordinator, Submission};
pub use idempotency::IdempotencyGuard;
pub use policy::{FaultAction, OperatorPolicy, ReconciliationPolicy, RetryPolicy};
#[cfg(any(test, feature = "test-helpers"))]
pub use pool::RecordingPool;
pub use pool::{PoolError, StakePool};
pub use refund_lock::RefundLock;
pub use yield_calc::{
    FixedApyOracle, RateOracle, ScheduleOracle, YieldInput, compound_factor, scale_balance,
    stake_earning,
};
