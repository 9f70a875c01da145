//! The exchange: every mutating entry point.
//!
//! ## Stake flow
//!
//! ```text
//! new_stake ─▶ StakeValidator ─▶ BetRegistry::prepare ─▶ match_stake (pure)
//!          ─▶ commit bet + stake ─▶ deposit issued ─▶ fills applied
//!
//! cancel_stake ─▶ withdrawal issued ─▶ on_settlement_confirmed ─▶ refund
//! ```
//!
//! Each call takes `&mut self` and runs to completion. Nothing here waits on
//! the pool: [`StakePool`] only submits, and the pool's answers come back
//! through [`Exchange::on_settlement_confirmed`] and
//! [`Exchange::on_settlement_failed`], in any order and possibly repeated.

use chrono::Utc;
use stakematch_matchcore::{CandidateQueue, MatchOrder, fill_root_hex, match_stake};
use stakematch_settlement::{
    RateOracle, ReconciliationPolicy, Resolution, RetryPolicy, SettlementCoordinator, StakePool,
    Submission,
};
use stakematch_types::{
    AccountId, Balance, BetId, CallContext, CancelStatus, ConfirmationOutcome, CorrelationToken,
    Epoch, ExchangeConfig, Metadata, NewStake, Payout, PayoutReason, Result, SettlementKind,
    SettlementRequest, Stake, StakeId, StakeMatchError, StakeStatus,
};
use tracing::{error, info, warn};

use crate::{
    access::AccessControl, ledger::StakeLedger, registry::BetRegistry,
    validation::StakeValidator,
};

/// What `reconcile_errored_stake` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Funds held by the exchange were handed back; the stake is Refunded.
    Refunded(Payout),
    /// Principal still in the pool was asked back; the stake stays Errored
    /// until the pool confirms and a later reconciliation pays out.
    WithdrawalReissued(Submission),
}

pub struct Exchange<P: StakePool, O: RateOracle> {
    pub(crate) config: ExchangeConfig,
    pub(crate) validator: StakeValidator,
    pub(crate) access: AccessControl,
    pub(crate) registry: BetRegistry,
    pub(crate) ledger: StakeLedger,
    pub(crate) coordinator: SettlementCoordinator,
    /// Append-only journal of approved refunds.
    pub(crate) payouts: Vec<Payout>,
    pool: P,
    oracle: O,
}

impl<P: StakePool, O: RateOracle> Exchange<P, O> {
    /// Exchange with the default retry policy (`max_settlement_attempts`).
    ///
    /// # Errors
    /// Returns `Configuration` for an unusable config.
    pub fn new(config: ExchangeConfig, owner: AccountId, pool: P, oracle: O) -> Result<Self> {
        let policy = Box::new(RetryPolicy::new(config.max_settlement_attempts));
        Self::with_policy(config, owner, pool, oracle, policy)
    }

    /// # Errors
    /// Returns `Configuration` for an unusable config.
    pub fn with_policy(
        config: ExchangeConfig,
        owner: AccountId,
        pool: P,
        oracle: O,
        policy: Box<dyn ReconciliationPolicy>,
    ) -> Result<Self> {
        let coordinator = SettlementCoordinator::new(&config, policy)?;
        let access = AccessControl::new(owner, config.default_pool.clone());
        info!(
            owner = %access.metadata().owner,
            pool = %access.pool(),
            policy = coordinator.policy_name(),
            "Exchange initialised"
        );
        Ok(Self::assemble(
            config,
            access,
            BetRegistry::new(),
            StakeLedger::new(),
            coordinator,
            Vec::new(),
            pool,
            oracle,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        config: ExchangeConfig,
        access: AccessControl,
        registry: BetRegistry,
        ledger: StakeLedger,
        coordinator: SettlementCoordinator,
        payouts: Vec<Payout>,
        pool: P,
        oracle: O,
    ) -> Self {
        Self {
            validator: StakeValidator::new(&config),
            config,
            access,
            registry,
            ledger,
            coordinator,
            payouts,
            pool,
            oracle,
        }
    }

    // -----------------------------------------------------------------
    // Stakes
    // -----------------------------------------------------------------

    /// Place a stake. The attached deposit is the principal.
    ///
    /// The stake is matched against resting opposite stakes of the same bet
    /// and its deposit is handed to the pool. The call returns before the
    /// pool confirms; the stake is optimistically Active.
    ///
    /// # Errors
    /// - `Validation` for a malformed request or a bet mismatch
    /// - `DuplicateStake` if the stake id is taken
    /// - `BetClosed` once the bet's end has passed
    pub fn new_stake(&mut self, ctx: &CallContext, req: NewStake) -> Result<Stake> {
        self.validator.validate(ctx, &req)?;
        if self.ledger.contains(&req.stake_id) {
            return Err(StakeMatchError::DuplicateStake(req.stake_id));
        }
        let plan = self
            .registry
            .prepare(&req, ctx.block_timestamp, self.config.min_duration_ns)?;

        let principal = ctx.attached_deposit;
        let order = MatchOrder {
            stake_id: req.stake_id.clone(),
            bet_id: req.bet_id.clone(),
            position: req.position,
            amount: principal,
            gentlemans: req.gentlemans,
            bet_end: plan.bet.end,
            submitted_at: ctx.block_timestamp,
            next_fill_sequence: self.ledger.next_fill_sequence(),
        };
        let candidates =
            CandidateQueue::collect(self.ledger.iter(), &req.bet_id, req.position.opposite());
        let outcome = match_stake(&order, candidates)?;

        let epoch = self.current_epoch();
        let pool_id = self.access.pool().clone();
        let stake = Stake {
            stake_id: req.stake_id.clone(),
            bet_id: req.bet_id.clone(),
            staker: ctx.caller.clone(),
            position: req.position,
            principal,
            matched: Balance::ZERO,
            unmatched: principal,
            cancelled: Balance::ZERO,
            gentlemans: req.gentlemans,
            status: StakeStatus::Active,
            sequence: self.ledger.next_sequence(),
            pool: pool_id.clone(),
            deposit_epoch: epoch,
            exit_epoch: None,
            pending_token: None,
            created_at: ctx.block_timestamp,
        };
        self.registry.commit(&plan);
        self.ledger.insert(stake)?;

        let submission = self.coordinator.issue(
            &mut self.pool,
            &req.stake_id,
            SettlementKind::Deposit,
            principal,
            &pool_id,
            epoch,
        )?;
        self.ledger.get_mut(&req.stake_id)?.pending_token = Some(submission.request().token);

        match submission {
            Submission::Accepted(_) => {
                self.ledger.apply_fills(&outcome.fills)?;
                info!(
                    stake_id = %req.stake_id,
                    bet_id = %req.bet_id,
                    position = %req.position,
                    principal = %principal,
                    matched = %outcome.matched(),
                    fills = outcome.fills.len(),
                    fill_root = %fill_root_hex(&outcome.fill_root),
                    "Stake placed"
                );
            }
            Submission::Escalated { reason, .. } => {
                self.ledger
                    .get_mut(&req.stake_id)?
                    .transition(StakeStatus::Errored)?;
                error!(
                    stake_id = %req.stake_id,
                    reason = %reason,
                    "Deposit refused; stake errored without matching"
                );
            }
        }

        Ok(self.ledger.get(&req.stake_id)?.clone())
    }

    /// Withdraw the unmatched part of a stake from the pool.
    ///
    /// # Errors
    /// - `Validation` if the stake does not belong to `bet_id`
    /// - `PermissionDenied` unless the caller placed the stake
    /// - `InvalidStateTransition` if the stake is not Active
    /// - `AsyncSettlementPending` while the deposit awaits the pool
    pub fn cancel_stake(
        &mut self,
        ctx: &CallContext,
        bet_id: &BetId,
        stake_id: &StakeId,
    ) -> Result<CancelStatus> {
        let stake = self.ledger.get(stake_id)?;
        if &stake.bet_id != bet_id {
            return Err(StakeMatchError::validation(format!(
                "stake {stake_id} is not on bet {bet_id}"
            )));
        }
        AccessControl::require_staker(ctx, stake)?;
        if stake.status != StakeStatus::Active {
            return Err(StakeMatchError::InvalidStateTransition {
                stake_id: stake_id.clone(),
                from: stake.status,
                to: StakeStatus::PendingCancellation,
            });
        }
        if stake.unmatched.is_zero() {
            info!(stake_id = %stake_id, "Cancel of fully matched stake ignored");
            return Ok(CancelStatus::NotCancelled);
        }
        if let Some(pending) = self.coordinator.pending(stake_id) {
            return Err(StakeMatchError::AsyncSettlementPending {
                stake_id: stake_id.clone(),
                token: pending.token,
            });
        }

        let amount = stake.unmatched;
        let status = if amount == stake.principal {
            CancelStatus::FullCancellationPending
        } else {
            CancelStatus::PartialCancellationPending
        };
        let pool_id = stake.pool.clone();
        let epoch = self.current_epoch();

        {
            let stake = self.ledger.get_mut(stake_id)?;
            stake.transition(StakeStatus::PendingCancellation)?;
            stake.cancelled = amount;
        }
        let submission = self.coordinator.issue(
            &mut self.pool,
            stake_id,
            SettlementKind::Withdrawal,
            amount,
            &pool_id,
            epoch,
        )?;

        let stake = self.ledger.get_mut(stake_id)?;
        stake.pending_token = Some(submission.request().token);
        if let Submission::Escalated { reason, .. } = submission {
            stake.transition(StakeStatus::Errored)?;
            error!(stake_id = %stake_id, reason = %reason, "Withdrawal refused; stake errored");
        } else {
            info!(stake_id = %stake_id, amount = %amount, status = %status, "Stake cancellation issued");
        }
        Ok(status)
    }

    /// Pay back the cancelled amount of a stake to its staker.
    ///
    /// Anyone may trigger the refund; the funds always go to the staker.
    ///
    /// # Errors
    /// - `AsyncSettlementPending` before the withdrawal is confirmed
    /// - `RefundLocked` while the pool's unbonding delay runs
    /// - `InvalidStateTransition` for a stake that is not Cancelled
    ///   (including one already refunded)
    pub fn refund_cancelled_stake(&mut self, ctx: &CallContext, stake_id: &StakeId) -> Result<Payout> {
        let stake = self.ledger.get(stake_id)?;
        if !matches!(
            stake.status,
            StakeStatus::Cancelled | StakeStatus::PendingCancellation
        ) {
            return Err(StakeMatchError::InvalidStateTransition {
                stake_id: stake_id.clone(),
                from: stake.status,
                to: StakeStatus::Refunded,
            });
        }
        let epoch = self.current_epoch();
        self.coordinator.refund_gate(stake_id, epoch)?;

        let payout = Payout {
            stake_id: stake_id.clone(),
            staker: stake.staker.clone(),
            amount: stake.cancelled,
            reason: PayoutReason::CancellationRefund,
            epoch,
            issued_at: Utc::now(),
        };
        self.ledger.get_mut(stake_id)?.transition(StakeStatus::Refunded)?;
        info!(caller = %ctx.caller, payout = %payout, "Refund approved");
        self.payouts.push(payout.clone());
        Ok(payout)
    }

    // -----------------------------------------------------------------
    // Pool answers
    // -----------------------------------------------------------------

    /// The pool reports that a request succeeded.
    ///
    /// # Errors
    /// - `TokenNotFound` for a token that was never issued
    /// - `PermissionDenied` unless the caller is the pool the request targeted
    pub fn on_settlement_confirmed(
        &mut self,
        ctx: &CallContext,
        token: CorrelationToken,
    ) -> Result<ConfirmationOutcome> {
        self.require_pool_caller(ctx, token)?;
        let epoch = self.current_epoch();
        match self.coordinator.confirm(token, epoch)? {
            Resolution::Duplicate => Ok(ConfirmationOutcome::Duplicate),
            Resolution::Confirmed(request) => {
                self.apply_confirmation(&request, epoch)?;
                Ok(ConfirmationOutcome::Applied {
                    stake_id: request.stake_id,
                    kind: request.kind,
                })
            }
            other => Err(StakeMatchError::Internal(format!(
                "unexpected confirmation outcome {other:?}"
            ))),
        }
    }

    /// The pool reports that a request failed.
    ///
    /// # Errors
    /// - `TokenNotFound` for a token that was never issued
    /// - `PermissionDenied` unless the caller is the pool the request targeted
    pub fn on_settlement_failed(
        &mut self,
        ctx: &CallContext,
        token: CorrelationToken,
        reason: &str,
    ) -> Result<ConfirmationOutcome> {
        self.require_pool_caller(ctx, token)?;
        let epoch = self.current_epoch();
        match self.coordinator.fail(&mut self.pool, token, reason, epoch)? {
            Resolution::Duplicate => Ok(ConfirmationOutcome::Duplicate),
            Resolution::Retried(retry) => {
                self.ledger.get_mut(&retry.stake_id)?.pending_token = Some(retry.token);
                Ok(ConfirmationOutcome::Retried {
                    stake_id: retry.stake_id,
                    token: retry.token,
                })
            }
            Resolution::Escalated { request, reason } => {
                self.escalate(&request, &reason)?;
                Ok(ConfirmationOutcome::Escalated {
                    stake_id: request.stake_id,
                })
            }
            Resolution::Confirmed(_) => Err(StakeMatchError::Internal(
                "failure resolved as confirmation".into(),
            )),
        }
    }

    fn require_pool_caller(&self, ctx: &CallContext, token: CorrelationToken) -> Result<()> {
        let request = self
            .coordinator
            .request(&token)
            .ok_or(StakeMatchError::TokenNotFound(token))?;
        if ctx.caller != request.pool {
            warn!(caller = %ctx.caller, pool = %request.pool, token = %token, "Settlement answer from wrong account");
            return Err(StakeMatchError::permission_denied(format!(
                "{} is not pool {}",
                ctx.caller, request.pool
            )));
        }
        Ok(())
    }

    fn apply_confirmation(&mut self, request: &SettlementRequest, epoch: Epoch) -> Result<()> {
        let resolved = request.resolved_epoch.unwrap_or(epoch);
        let stake = self.ledger.get_mut(&request.stake_id)?;
        if stake.pending_token == Some(request.token) {
            stake.pending_token = None;
        }
        match request.kind {
            SettlementKind::Deposit => stake.deposit_epoch = resolved,
            SettlementKind::Withdrawal => {
                stake.exit_epoch = Some(resolved);
                if stake.status == StakeStatus::PendingCancellation {
                    stake.transition(StakeStatus::Cancelled)?;
                }
            }
        }
        Ok(())
    }

    fn escalate(&mut self, request: &SettlementRequest, reason: &str) -> Result<()> {
        let stake_id = &request.stake_id;
        if self.ledger.get(stake_id)?.status == StakeStatus::Errored {
            warn!(stake_id = %stake_id, token = %request.token, "Reissued request failed again");
            return Ok(());
        }
        if request.kind == SettlementKind::Deposit {
            let unwound = self.ledger.unwind_fills_of(stake_id)?;
            warn!(stake_id = %stake_id, fills = unwound.len(), "Fills unwound after deposit fault");
            for fill in &unwound {
                let other = if &fill.back_stake == stake_id {
                    &fill.lay_stake
                } else {
                    &fill.back_stake
                };
                self.flag_restored(other, fill.amount)?;
            }
        }
        self.ledger.get_mut(stake_id)?.transition(StakeStatus::Errored)?;
        error!(
            stake_id = %stake_id,
            kind = %request.kind,
            reason = %reason,
            "Stake errored"
        );
        Ok(())
    }

    /// A counterparty that already left Active cannot cancel the principal
    /// an unwind hands back, so it goes to the operator.
    fn flag_restored(&mut self, stake_id: &StakeId, amount: Balance) -> Result<()> {
        let stake = self.ledger.get_mut(stake_id)?;
        match stake.status {
            StakeStatus::Active => Ok(()),
            StakeStatus::Errored => {
                warn!(stake_id = %stake_id, restored = %amount, "Principal restored to errored stake");
                Ok(())
            }
            StakeStatus::PendingCancellation | StakeStatus::Cancelled | StakeStatus::Refunded => {
                let from = stake.status;
                stake.transition(StakeStatus::Errored)?;
                error!(
                    stake_id = %stake_id,
                    from = %from,
                    restored = %amount,
                    "Restored principal flagged for reconciliation"
                );
                Ok(())
            }
        }
    }

    fn paid_to(&self, stake_id: &StakeId) -> Balance {
        self.payouts
            .iter()
            .filter(|p| &p.stake_id == stake_id)
            .map(|p| p.amount)
            .sum()
    }

    // -----------------------------------------------------------------
    // Operator
    // -----------------------------------------------------------------

    /// Resolve an errored stake. Admin or owner.
    ///
    /// - deposit never reached the pool: the principal is paid back
    /// - the pool still holds unmatched principal (failed withdrawal, or
    ///   principal restored by an unwind): the rest is withdrawn
    /// - everything unmatched is withdrawn: whatever was not yet paid goes
    ///   to the staker once the unbonding delay has passed
    ///
    /// # Errors
    /// - `PermissionDenied` for other callers
    /// - `InvalidStateTransition` unless the stake is Errored
    /// - `AsyncSettlementPending` while a request awaits the pool
    /// - `RefundLocked` during the unbonding delay
    /// - `SettlementFault` if nothing is left to withdraw or pay
    pub fn reconcile_errored_stake(
        &mut self,
        ctx: &CallContext,
        stake_id: &StakeId,
    ) -> Result<ReconcileOutcome> {
        self.access.require_privileged(ctx)?;
        let stake = self.ledger.get(stake_id)?.clone();
        if stake.status != StakeStatus::Errored {
            return Err(StakeMatchError::InvalidStateTransition {
                stake_id: stake_id.clone(),
                from: stake.status,
                to: StakeStatus::Refunded,
            });
        }
        if let Some(pending) = self.coordinator.pending(stake_id) {
            return Err(StakeMatchError::AsyncSettlementPending {
                stake_id: stake_id.clone(),
                token: pending.token,
            });
        }
        let epoch = self.current_epoch();

        if self
            .coordinator
            .confirmed(stake_id, SettlementKind::Deposit)
            .is_none()
        {
            return self.pay_out(&stake, stake.principal, epoch).map(ReconcileOutcome::Refunded);
        }

        let withdrawn = self
            .coordinator
            .confirmed_amount(stake_id, SettlementKind::Withdrawal);
        if withdrawn < stake.unmatched {
            let amount = stake.unmatched.saturating_sub(withdrawn);
            self.ledger.get_mut(stake_id)?.cancelled = stake.unmatched;
            let submission = self.coordinator.issue(
                &mut self.pool,
                stake_id,
                SettlementKind::Withdrawal,
                amount,
                &stake.pool,
                epoch,
            )?;
            self.ledger.get_mut(stake_id)?.pending_token = Some(submission.request().token);
            info!(
                caller = %ctx.caller,
                stake_id = %stake_id,
                amount = %amount,
                accepted = matches!(submission, Submission::Accepted(_)),
                "Withdrawal reissued by reconciliation"
            );
            return Ok(ReconcileOutcome::WithdrawalReissued(submission));
        }

        let owed = withdrawn.saturating_sub(self.paid_to(stake_id));
        if owed.is_zero() {
            return Err(StakeMatchError::SettlementFault {
                stake_id: stake_id.clone(),
                reason: "errored with nothing to withdraw".into(),
            });
        }
        self.coordinator.refund_gate(stake_id, epoch)?;
        self.pay_out(&stake, owed, epoch).map(ReconcileOutcome::Refunded)
    }

    fn pay_out(&mut self, stake: &Stake, amount: Balance, epoch: Epoch) -> Result<Payout> {
        let payout = Payout {
            stake_id: stake.stake_id.clone(),
            staker: stake.staker.clone(),
            amount,
            reason: PayoutReason::Reconciliation,
            epoch,
            issued_at: Utc::now(),
        };
        self.ledger
            .get_mut(&stake.stake_id)?
            .transition(StakeStatus::Refunded)?;
        info!(payout = %payout, "Errored stake reconciled");
        self.payouts.push(payout.clone());
        Ok(payout)
    }

    /// # Errors
    /// `PermissionDenied` unless the caller is the owner.
    pub fn change_stake_pool(&mut self, ctx: &CallContext, pool: AccountId) -> Result<Metadata> {
        self.access.change_stake_pool(ctx, pool)
    }

    /// # Errors
    /// `PermissionDenied` unless the caller is the owner or an admin.
    pub fn change_admin_users(
        &mut self,
        ctx: &CallContext,
        admins: Vec<AccountId>,
    ) -> Result<Metadata> {
        self.access.change_admin_users(ctx, admins)
    }

    // -----------------------------------------------------------------
    // Escrow
    // -----------------------------------------------------------------

    /// Principal the ledger says sits in `pool`: confirmed deposits minus
    /// confirmed cancellations.
    #[must_use]
    pub fn staked_in(&self, pool: &AccountId) -> Balance {
        self.ledger
            .iter()
            .filter(|s| &s.pool == pool)
            .filter(|s| {
                self.coordinator
                    .confirmed(&s.stake_id, SettlementKind::Deposit)
                    .is_some()
            })
            .map(|s| {
                let withdrawn = self
                    .coordinator
                    .confirmed_amount(&s.stake_id, SettlementKind::Withdrawal);
                s.principal.saturating_sub(withdrawn)
            })
            .sum()
    }

    /// Check every pool the exchange has moved funds through.
    ///
    /// # Errors
    /// Returns `EscrowInvariantViolation` for the first pool whose ledger
    /// total disagrees with its confirmed flows.
    pub fn verify_escrow(&self) -> Result<()> {
        for pool in self.coordinator.escrow().tracked_pools() {
            self.coordinator.verify_staked(&pool, self.staked_in(&pool))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Host plumbing
    // -----------------------------------------------------------------

    /// Current pool epoch, as reported by the rate oracle.
    #[must_use]
    pub fn current_epoch(&self) -> Epoch {
        self.oracle.current_epoch()
    }

    #[must_use]
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }
}
