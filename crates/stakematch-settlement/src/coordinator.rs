//! Settlement coordinator: the exchange's side of the pool boundary.
//!
//! Every pool interaction goes through here:
//! 1. Issue a request with a fresh correlation token and submit it
//! 2. On a synchronous refusal, ask the reconciliation policy: retry under a
//!    new token, or escalate
//! 3. Resolve asynchronous answers by token, ignoring replays
//! 4. Track confirmed flows for the escrow conservation check
//! 5. Gate refunds on a confirmed withdrawal plus the unbonding delay
//!
//! The coordinator knows nothing about stake statuses; the exchange maps
//! each [`Resolution`] onto its ledger.

use std::collections::HashMap;

use stakematch_types::{
    AccountId, Balance, CorrelationToken, Epoch, ExchangeConfig, Result, SettlementKind,
    SettlementPhase, SettlementRequest, StakeId, StakeMatchError,
};
use tracing::{error, info, warn};

use crate::{
    conservation::EscrowConservation,
    idempotency::IdempotencyGuard,
    policy::{FaultAction, ReconciliationPolicy},
    pool::StakePool,
    refund_lock::RefundLock,
};

/// Outcome of submitting a request to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The pool took the request; its answer arrives later.
    Accepted(SettlementRequest),
    /// The pool refused and the policy gave up.
    Escalated {
        request: SettlementRequest,
        reason: String,
    },
}

impl Submission {
    #[must_use]
    pub fn request(&self) -> &SettlementRequest {
        match self {
            Self::Accepted(request) | Self::Escalated { request, .. } => request,
        }
    }
}

/// Outcome of an asynchronous pool answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The token was already resolved.
    Duplicate,
    Confirmed(SettlementRequest),
    /// The failure was absorbed by a new, accepted request.
    Retried(SettlementRequest),
    Escalated {
        request: SettlementRequest,
        reason: String,
    },
}

pub struct SettlementCoordinator {
    requests: HashMap<CorrelationToken, SettlementRequest>,
    by_stake: HashMap<StakeId, Vec<CorrelationToken>>,
    /// Global issue order.
    order: Vec<CorrelationToken>,
    guard: IdempotencyGuard,
    escrow: EscrowConservation,
    refund_lock: RefundLock,
    policy: Box<dyn ReconciliationPolicy>,
    max_attempts: u32,
}

impl SettlementCoordinator {
    /// # Errors
    /// Returns `Configuration` for an unusable config.
    pub fn new(config: &ExchangeConfig, policy: Box<dyn ReconciliationPolicy>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            requests: HashMap::new(),
            by_stake: HashMap::new(),
            order: Vec::new(),
            guard: IdempotencyGuard::new(config.idempotency_cache_size)?,
            escrow: EscrowConservation::new(),
            refund_lock: RefundLock::new(config.refund_delay_epochs),
            policy,
            max_attempts: config.max_settlement_attempts,
        })
    }

    /// Rebuild a coordinator from a persisted request log.
    ///
    /// Resolved tokens re-enter the idempotency guard and confirmed flows
    /// re-enter the escrow totals.
    ///
    /// # Errors
    /// Returns `Serialization` if a token appears twice.
    pub fn restore(
        config: &ExchangeConfig,
        policy: Box<dyn ReconciliationPolicy>,
        log: Vec<SettlementRequest>,
    ) -> Result<Self> {
        let mut coordinator = Self::new(config, policy)?;
        for request in log {
            if coordinator.requests.contains_key(&request.token) {
                return Err(StakeMatchError::Serialization(format!(
                    "duplicate token {} in settlement log",
                    request.token
                )));
            }
            match request.phase {
                SettlementPhase::Requested => {}
                SettlementPhase::Failed => {
                    coordinator.guard.mark_resolved(request.token);
                }
                SettlementPhase::Confirmed => {
                    coordinator.guard.mark_resolved(request.token);
                    coordinator.record_flow(&request)?;
                }
            }
            coordinator.track(request);
        }
        Ok(coordinator)
    }

    /// Issue a first-attempt request and submit it.
    ///
    /// # Errors
    /// Returns `Internal` if the request table is inconsistent.
    pub fn issue<P: StakePool + ?Sized>(
        &mut self,
        pool: &mut P,
        stake_id: &StakeId,
        kind: SettlementKind,
        amount: Balance,
        pool_id: &AccountId,
        epoch: Epoch,
    ) -> Result<Submission> {
        let request = SettlementRequest::new(stake_id.clone(), kind, amount, pool_id.clone(), 1, epoch);
        self.submit(pool, request, epoch)
    }

    fn submit<P: StakePool + ?Sized>(
        &mut self,
        pool: &mut P,
        mut request: SettlementRequest,
        epoch: Epoch,
    ) -> Result<Submission> {
        loop {
            self.track(request.clone());
            info!(
                stake_id = %request.stake_id,
                token = %request.token,
                kind = %request.kind,
                amount = %request.amount,
                pool = %request.pool,
                attempt = request.attempt,
                "Settlement request issued"
            );

            let submitted = match request.kind {
                SettlementKind::Deposit => pool.submit_deposit(&request),
                SettlementKind::Withdrawal => pool.submit_withdrawal(&request),
            };
            let Err(refusal) = submitted else {
                return Ok(Submission::Accepted(request));
            };

            let reason = refusal.to_string();
            warn!(
                stake_id = %request.stake_id,
                token = %request.token,
                reason = %reason,
                "Pool refused settlement request"
            );
            let failed = self.mark_failed(request.token, epoch, &reason)?;
            match self.decide(&failed, &reason) {
                FaultAction::Retry => request = failed.retry(epoch),
                FaultAction::Escalate => {
                    error!(
                        stake_id = %failed.stake_id,
                        token = %failed.token,
                        attempts = failed.attempt,
                        "Settlement escalated"
                    );
                    return Ok(Submission::Escalated {
                        request: failed,
                        reason,
                    });
                }
            }
        }
    }

    /// Apply a success answer from the pool.
    ///
    /// # Errors
    /// Returns `TokenNotFound` for a token that was never issued.
    pub fn confirm(&mut self, token: CorrelationToken, epoch: Epoch) -> Result<Resolution> {
        let request = self
            .requests
            .get_mut(&token)
            .ok_or(StakeMatchError::TokenNotFound(token))?;
        if request.phase.is_terminal() || self.guard.is_resolved(&token) {
            warn!(token = %token, phase = %request.phase, "Duplicate settlement confirmation ignored");
            return Ok(Resolution::Duplicate);
        }

        request.mark_confirmed(epoch)?;
        self.guard.mark_resolved(token);
        let confirmed = request.clone();
        self.record_flow(&confirmed)?;

        info!(
            stake_id = %confirmed.stake_id,
            token = %token,
            kind = %confirmed.kind,
            "Settlement confirmed"
        );
        Ok(Resolution::Confirmed(confirmed))
    }

    /// Apply a failure answer from the pool.
    ///
    /// # Errors
    /// Returns `TokenNotFound` for a token that was never issued.
    pub fn fail<P: StakePool + ?Sized>(
        &mut self,
        pool: &mut P,
        token: CorrelationToken,
        reason: &str,
        epoch: Epoch,
    ) -> Result<Resolution> {
        let request = self
            .requests
            .get(&token)
            .ok_or(StakeMatchError::TokenNotFound(token))?;
        if request.phase.is_terminal() || self.guard.is_resolved(&token) {
            warn!(token = %token, phase = %request.phase, "Duplicate settlement failure ignored");
            return Ok(Resolution::Duplicate);
        }

        warn!(stake_id = %request.stake_id, token = %token, reason = %reason, "Settlement failed");
        let failed = self.mark_failed(token, epoch, reason)?;
        match self.decide(&failed, reason) {
            FaultAction::Retry => Ok(match self.submit(pool, failed.retry(epoch), epoch)? {
                Submission::Accepted(retry) => Resolution::Retried(retry),
                Submission::Escalated { request, reason } => Resolution::Escalated { request, reason },
            }),
            FaultAction::Escalate => {
                error!(stake_id = %failed.stake_id, token = %token, "Settlement escalated");
                Ok(Resolution::Escalated {
                    request: failed,
                    reason: reason.to_string(),
                })
            }
        }
    }

    /// Confirmed withdrawal that makes a refund payable now.
    ///
    /// # Errors
    /// - `AsyncSettlementPending` while the withdrawal awaits the pool
    /// - `RefundLocked` while the unbonding delay runs
    /// - `SettlementFault` if the last withdrawal failed
    pub fn refund_gate(&self, stake_id: &StakeId, current: Epoch) -> Result<&SettlementRequest> {
        if let Some(withdrawal) = self.confirmed(stake_id, SettlementKind::Withdrawal) {
            let confirmed_at = withdrawal.resolved_epoch.unwrap_or(withdrawal.requested_epoch);
            self.refund_lock.check(stake_id, confirmed_at, current)?;
            return Ok(withdrawal);
        }
        match self.latest(stake_id, SettlementKind::Withdrawal) {
            Some(pending) if pending.phase == SettlementPhase::Requested => {
                Err(StakeMatchError::AsyncSettlementPending {
                    stake_id: stake_id.clone(),
                    token: pending.token,
                })
            }
            Some(failed) => Err(StakeMatchError::SettlementFault {
                stake_id: stake_id.clone(),
                reason: failed
                    .failure
                    .clone()
                    .unwrap_or_else(|| "withdrawal failed".into()),
            }),
            None => Err(StakeMatchError::SettlementFault {
                stake_id: stake_id.clone(),
                reason: "no withdrawal issued".into(),
            }),
        }
    }

    #[must_use]
    pub fn request(&self, token: &CorrelationToken) -> Option<&SettlementRequest> {
        self.requests.get(token)
    }

    /// All requests of a stake, oldest first.
    pub fn requests_for(&self, stake_id: &StakeId) -> impl Iterator<Item = &SettlementRequest> {
        self.by_stake
            .get(stake_id)
            .into_iter()
            .flatten()
            .filter_map(|token| self.requests.get(token))
    }

    #[must_use]
    pub fn latest(&self, stake_id: &StakeId, kind: SettlementKind) -> Option<&SettlementRequest> {
        self.requests_for(stake_id).filter(|r| r.kind == kind).last()
    }

    #[must_use]
    pub fn confirmed(&self, stake_id: &StakeId, kind: SettlementKind) -> Option<&SettlementRequest> {
        self.requests_for(stake_id)
            .filter(|r| r.kind == kind && r.phase == SettlementPhase::Confirmed)
            .last()
    }

    /// The request of this stake still awaiting the pool, if any.
    #[must_use]
    pub fn pending(&self, stake_id: &StakeId) -> Option<&SettlementRequest> {
        self.requests_for(stake_id)
            .filter(|r| r.phase == SettlementPhase::Requested)
            .last()
    }

    /// Confirmed amount of `kind` moved for this stake.
    #[must_use]
    pub fn confirmed_amount(&self, stake_id: &StakeId, kind: SettlementKind) -> Balance {
        self.requests_for(stake_id)
            .filter(|r| r.kind == kind && r.phase == SettlementPhase::Confirmed)
            .map(|r| r.amount)
            .sum()
    }

    /// Every request in issue order.
    pub fn log(&self) -> impl Iterator<Item = &SettlementRequest> {
        self.order.iter().filter_map(|token| self.requests.get(token))
    }

    #[must_use]
    pub fn escrow(&self) -> &EscrowConservation {
        &self.escrow
    }

    /// # Errors
    /// Returns `EscrowInvariantViolation` if the ledger disagrees with the
    /// confirmed flows of `pool`.
    pub fn verify_staked(&self, pool: &AccountId, actual: Balance) -> Result<()> {
        self.escrow.verify(pool, actual)
    }

    #[must_use]
    pub fn refund_lock(&self) -> RefundLock {
        self.refund_lock
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    fn decide(&self, failed: &SettlementRequest, reason: &str) -> FaultAction {
        if failed.attempt >= self.max_attempts {
            return FaultAction::Escalate;
        }
        self.policy.on_fault(failed, reason)
    }

    fn track(&mut self, request: SettlementRequest) {
        self.by_stake
            .entry(request.stake_id.clone())
            .or_default()
            .push(request.token);
        self.order.push(request.token);
        self.requests.insert(request.token, request);
    }

    fn mark_failed(&mut self, token: CorrelationToken, epoch: Epoch, reason: &str) -> Result<SettlementRequest> {
        let request = self
            .requests
            .get_mut(&token)
            .ok_or(StakeMatchError::TokenNotFound(token))?;
        request.mark_failed(epoch, reason)?;
        self.guard.mark_resolved(token);
        Ok(request.clone())
    }

    fn record_flow(&mut self, request: &SettlementRequest) -> Result<()> {
        match request.kind {
            SettlementKind::Deposit => self.escrow.record_deposit(&request.pool, request.amount),
            SettlementKind::Withdrawal => self.escrow.record_withdrawal(&request.pool, request.amount),
        }
    }
}
