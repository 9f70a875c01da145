//! Reconciliation policies for faulted pool requests.
//!
//! When the pool refuses a request, or later reports that it failed, the
//! coordinator asks a [`ReconciliationPolicy`] what to do next:
//!
//! - [`FaultAction::Retry`]: reissue the same operation under a new token
//! - [`FaultAction::Escalate`]: give up and move the stake to `Errored`
//!
//! The coordinator additionally caps retries at the configured maximum
//! number of attempts, whatever the policy answers.

use stakematch_types::SettlementRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    Retry,
    Escalate,
}

/// Decides how a faulted request is handled.
pub trait ReconciliationPolicy: Send + Sync {
    fn on_fault(&self, failed: &SettlementRequest, reason: &str) -> FaultAction;

    fn name(&self) -> &'static str;
}

/// Retry until `max_attempts` requests were issued, then escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl ReconciliationPolicy for RetryPolicy {
    fn on_fault(&self, failed: &SettlementRequest, _reason: &str) -> FaultAction {
        if failed.attempt < self.max_attempts {
            FaultAction::Retry
        } else {
            FaultAction::Escalate
        }
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}

/// Never retry; every fault goes straight to an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorPolicy;

impl ReconciliationPolicy for OperatorPolicy {
    fn on_fault(&self, _failed: &SettlementRequest, _reason: &str) -> FaultAction {
        FaultAction::Escalate
    }

    fn name(&self) -> &'static str {
        "operator"
    }
}
