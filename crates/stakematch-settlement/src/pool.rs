//! The staking pool boundary.
//!
//! The exchange never waits on the pool. [`StakePool`] only *submits* a
//! request; the pool's answer arrives later through the exchange's
//! confirmation entry points, keyed by the request's correlation token.
//! A synchronous `Err` means the pool refused the request outright.

use stakematch_types::SettlementRequest;
use thiserror::Error;

/// Immediate refusal by the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool rejected request: {0}")]
    Rejected(String),

    #[error("pool {0} unavailable")]
    Unavailable(String),
}

/// An external staking pool that holds escrowed principal.
pub trait StakePool {
    /// Ask the pool to take `request.amount` from the exchange.
    fn submit_deposit(&mut self, request: &SettlementRequest) -> Result<(), PoolError>;

    /// Ask the pool to release `request.amount` back to the exchange.
    fn submit_withdrawal(&mut self, request: &SettlementRequest) -> Result<(), PoolError>;
}

impl<P: StakePool + ?Sized> StakePool for Box<P> {
    fn submit_deposit(&mut self, request: &SettlementRequest) -> Result<(), PoolError> {
        (**self).submit_deposit(request)
    }

    fn submit_withdrawal(&mut self, request: &SettlementRequest) -> Result<(), PoolError> {
        (**self).submit_withdrawal(request)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::RecordingPool;

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::collections::VecDeque;

    use stakematch_types::{CorrelationToken, SettlementKind, SettlementRequest};

    use super::{PoolError, StakePool};

    /// In-memory pool that records every submission.
    ///
    /// Refusals can be scripted with [`RecordingPool::reject_next`]; each
    /// queued refusal is consumed by the next submission of any kind.
    #[derive(Debug, Default)]
    pub struct RecordingPool {
        pub submitted: Vec<SettlementRequest>,
        refusals: VecDeque<PoolError>,
    }

    impl RecordingPool {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reject_next(&mut self, reason: &str) {
            self.refusals.push_back(PoolError::Rejected(reason.to_string()));
        }

        /// Tokens of accepted submissions of `kind`, oldest first.
        pub fn tokens(&self, kind: SettlementKind) -> Vec<CorrelationToken> {
            self.submitted
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.token)
                .collect()
        }

        pub fn last_token(&self) -> Option<CorrelationToken> {
            self.submitted.last().map(|r| r.token)
        }

        fn accept(&mut self, request: &SettlementRequest) -> Result<(), PoolError> {
            if let Some(err) = self.refusals.pop_front() {
                return Err(err);
            }
            self.submitted.push(request.clone());
            Ok(())
        }
    }

    impl StakePool for RecordingPool {
        fn submit_deposit(&mut self, request: &SettlementRequest) -> Result<(), PoolError> {
            self.accept(request)
        }

        fn submit_withdrawal(&mut self, request: &SettlementRequest) -> Result<(), PoolError> {
            self.accept(request)
        }
    }
}
