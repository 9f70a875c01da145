//! End-to-end tests across the exchange, matching and settlement planes.
//!
//! Each test drives a full stake lifecycle through the public entry points:
//! place → match → deposit confirmed → cancel → withdrawal confirmed → refund,
//! with the pool's answers injected by hand in whatever order the test needs.
//! After every scenario the ledger invariants and the escrow conservation
//! check must still hold.

use stakematch_exchange::{Exchange, ReconcileOutcome};
use stakematch_settlement::{FixedApyOracle, OperatorPolicy, RecordingPool, Submission};
use stakematch_types::*;

const DAY: u64 = 86_400_000_000_000;
const BET: &str = "c5VA2k16PbQC_KeOAZTkR";
const OWNER: &str = "owner.near";
const POOL: &str = constants::TESTNET_STAKE_POOL;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tokens(amount: &str) -> Balance {
    Balance::from_human(amount, constants::TOKEN_DECIMALS).unwrap()
}

/// Helper: one exchange plus a host clock.
struct Harness {
    ex: Exchange<RecordingPool, FixedApyOracle>,
    now: u64,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ExchangeConfig::testnet())
    }

    fn with_config(config: ExchangeConfig) -> Self {
        init_tracing();
        let ex = Exchange::new(
            config,
            AccountId::from(OWNER),
            RecordingPool::new(),
            FixedApyOracle::default_apy(),
        )
        .expect("exchange should initialise");
        Self { ex, now: DAY }
    }

    fn operator_only() -> Self {
        init_tracing();
        let ex = Exchange::with_policy(
            ExchangeConfig::testnet(),
            AccountId::from(OWNER),
            RecordingPool::new(),
            FixedApyOracle::default_apy(),
            Box::new(OperatorPolicy),
        )
        .expect("exchange should initialise");
        Self { ex, now: DAY }
    }

    fn request(position: Position, gentlemans: bool) -> NewStake {
        NewStake {
            bet_id: BetId::from(BET),
            stake_id: StakeId::new(Stake::random_id()),
            prediction: Prediction::Reduction,
            position,
            person: Person::from("bafybeihdzk6jvzkt2d3ekxkpkgdvtl3zryzeotsdlku7my6tncxxlyx3my"),
            end: 10 * DAY,
            gentlemans,
        }
    }

    fn try_place(&mut self, staker: &str, req: NewStake, amount: &str) -> Result<Stake> {
        let ctx = CallContext::new(staker, tokens(amount), self.now);
        self.ex.new_stake(&ctx, req)
    }

    fn place(&mut self, staker: &str, position: Position, amount: &str) -> Stake {
        self.try_place(staker, Self::request(position, false), amount)
            .expect("stake should be accepted")
    }

    fn place_gentlemans(&mut self, staker: &str, position: Position, amount: &str) -> Stake {
        self.try_place(staker, Self::request(position, true), amount)
            .expect("stake should be accepted")
    }

    fn stake(&self, stake: &Stake) -> Stake {
        self.ex.stake(&stake.stake_id).unwrap().clone()
    }

    fn pending(&self, stake: &Stake) -> CorrelationToken {
        self.stake(stake)
            .pending_token
            .expect("stake should have a pending request")
    }

    /// Pool a request was sent to, so answers come from the right caller.
    fn pool_of(&self, token: CorrelationToken) -> AccountId {
        self.ex
            .settlement_request(&token)
            .map_or_else(|| AccountId::from(POOL), |r| r.pool.clone())
    }

    fn confirm_token(&mut self, token: CorrelationToken) -> ConfirmationOutcome {
        let pool = self.pool_of(token);
        self.ex
            .on_settlement_confirmed(&CallContext::call(pool, self.now), token)
            .expect("confirmation should be accepted")
    }

    fn confirm(&mut self, stake: &Stake) -> ConfirmationOutcome {
        let token = self.pending(stake);
        self.confirm_token(token)
    }

    fn fail(&mut self, stake: &Stake, reason: &str) -> ConfirmationOutcome {
        let token = self.pending(stake);
        let pool = self.pool_of(token);
        self.ex
            .on_settlement_failed(&CallContext::call(pool, self.now), token, reason)
            .expect("failure should be accepted")
    }

    fn cancel(&mut self, stake: &Stake) -> Result<CancelStatus> {
        let ctx = CallContext::call(stake.staker.clone(), self.now);
        self.ex.cancel_stake(&ctx, &stake.bet_id, &stake.stake_id)
    }

    fn refund(&mut self, stake: &Stake) -> Result<Payout> {
        let ctx = CallContext::call("anyone.near", self.now);
        self.ex.refund_cancelled_stake(&ctx, &stake.stake_id)
    }

    fn reconcile(&mut self, stake: &Stake) -> Result<ReconcileOutcome> {
        let ctx = CallContext::call(OWNER, self.now);
        self.ex.reconcile_errored_stake(&ctx, &stake.stake_id)
    }

    fn advance_epochs(&mut self, epochs: u64) {
        self.ex.oracle_mut().advance(epochs);
    }

    /// Ledger invariants that must hold after every call.
    fn assert_invariants(&self) {
        let stakes = self.ex.stakes(Some(Page::new(0, usize::MAX)));
        for s in &stakes {
            assert_eq!(
                s.matched.0 + s.unmatched.0,
                s.principal.0,
                "principal split broken on {}",
                s.stake_id
            );
            assert!(s.cancelled <= s.unmatched, "over-cancelled {}", s.stake_id);
        }
        for bet in self.ex.bets(&BetFilter::default(), self.now, Some(Page::new(0, usize::MAX))) {
            let side = |p: Position| -> u128 {
                stakes
                    .iter()
                    .filter(|s| s.bet_id == bet.bet_id && s.position == p)
                    .map(|s| s.matched.0)
                    .sum()
            };
            assert_eq!(side(Position::Back), side(Position::Lay), "bet {} unbalanced", bet.bet_id);
        }
        self.ex.verify_escrow().expect("escrow must be conserved");
    }
}

// =============================================================================
// Test: FIFO split across two resting backs
// =============================================================================
#[test]
fn e2e_fifo_split() {
    let mut h = Harness::new();

    let s1 = h.place("alice.near", Position::Back, "10");
    let s2 = h.place("bob.near", Position::Back, "10");
    let s3 = h.place("carol.near", Position::Lay, "15");

    assert_eq!(h.stake(&s1).unmatched, Balance::ZERO);
    assert_eq!(h.stake(&s2).unmatched, tokens("5"));
    assert_eq!(h.stake(&s3).unmatched, Balance::ZERO);

    let fills = h.ex.fills();
    assert_eq!(fills.len(), 2, "one fill per consumed back");
    assert_eq!(fills[0].back_stake, s1.stake_id);
    assert_eq!(fills[1].back_stake, s2.stake_id);
    assert!(fills.iter().all(|f| f.taker_stake == s3.stake_id));

    h.assert_invariants();
}

// =============================================================================
// Test: Many small backs against one lay
// =============================================================================
#[test]
fn e2e_small_backs_against_one_lay() {
    let mut h = Harness::new();

    for i in 0..5 {
        h.place(&format!("backer{i}.near"), Position::Back, "0.1");
    }
    h.place("layer.near", Position::Lay, "0.3");

    let stakes = h.ex.stakes(None);
    let backs = stakes.iter().filter(|s| s.position == Position::Back).count();
    let lays = stakes.iter().filter(|s| s.position == Position::Lay).count();
    assert_eq!((backs, lays), (5, 1));

    let unmatched: Balance = stakes.iter().map(|s| s.unmatched).sum();
    assert_eq!(unmatched, tokens("0.2"));
    assert!(unmatched > tokens("0.158"), "more than 0.79 x 0.2 must stay open");

    h.assert_invariants();
}

// =============================================================================
// Test: Cancellation outcomes
// =============================================================================
#[test]
fn e2e_cancel_statuses() {
    let mut h = Harness::new();

    // Unmatched stake: full cancellation.
    let open = h.place("alice.near", Position::Back, "1");
    h.confirm(&open);
    assert_eq!(h.cancel(&open).unwrap(), CancelStatus::FullCancellationPending);
    assert_eq!(h.stake(&open).status, StakeStatus::PendingCancellation);
    assert_eq!(h.stake(&open).cancelled, tokens("1"));

    // Fully matched stake: nothing to cancel.
    let back = h.place("bob.near", Position::Back, "1");
    let lay = h.place("carol.near", Position::Lay, "1");
    assert_eq!(h.cancel(&lay).unwrap(), CancelStatus::NotCancelled);
    assert_eq!(h.stake(&lay).status, StakeStatus::Active);
    assert_eq!(h.stake(&back).unmatched, Balance::ZERO);

    // Half matched stake: partial cancellation.
    let partial = h.place("dave.near", Position::Back, "2");
    h.place("erin.near", Position::Lay, "1");
    h.confirm(&partial);
    assert_eq!(h.cancel(&partial).unwrap(), CancelStatus::PartialCancellationPending);
    assert_eq!(h.stake(&partial).cancelled, tokens("1"));
    assert_eq!(h.stake(&partial).matched, tokens("1"));

    // Cancelling twice is a state error.
    let err = h.cancel(&open).unwrap_err();
    assert!(matches!(err, StakeMatchError::InvalidStateTransition { .. }));

    h.assert_invariants();
}

// =============================================================================
// Test: Refund waits for the pool, then pays exactly once
// =============================================================================
#[test]
fn e2e_refund_lifecycle() {
    let mut h = Harness::with_config(ExchangeConfig {
        refund_delay_epochs: 4,
        ..ExchangeConfig::testnet()
    });

    let s = h.place("alice.near", Position::Lay, "2");
    h.confirm(&s);
    h.cancel(&s).unwrap();

    let err = h.refund(&s).unwrap_err();
    assert!(matches!(err, StakeMatchError::AsyncSettlementPending { .. }));

    h.confirm(&s);
    assert_eq!(h.stake(&s).status, StakeStatus::Cancelled);

    let err = h.refund(&s).unwrap_err();
    assert!(matches!(err, StakeMatchError::RefundLocked { elapsed: 0, required: 4, .. }));

    h.advance_epochs(4);
    let payout = h.refund(&s).unwrap();
    assert_eq!(payout.amount, tokens("2"));
    assert_eq!(payout.staker.as_str(), "alice.near");
    assert_eq!(payout.reason, PayoutReason::CancellationRefund);
    assert_eq!(h.stake(&s).status, StakeStatus::Refunded);

    // Double refund pays once.
    let err = h.refund(&s).unwrap_err();
    assert!(matches!(
        err,
        StakeMatchError::InvalidStateTransition { from: StakeStatus::Refunded, .. }
    ));
    assert_eq!(h.ex.payouts().len(), 1);

    h.assert_invariants();
}

// =============================================================================
// Test: Gentleman's stakes stay out of automatic matching
// =============================================================================
#[test]
fn e2e_gentlemans_never_matched() {
    let mut h = Harness::new();

    let resting = h.place_gentlemans("alice.near", Position::Back, "1");
    let lay = h.place("bob.near", Position::Lay, "1");
    assert_eq!(h.stake(&resting).matched, Balance::ZERO);
    assert_eq!(h.stake(&lay).unmatched, tokens("1"));

    let incoming = h.place_gentlemans("carol.near", Position::Back, "1");
    assert_eq!(h.stake(&incoming).matched, Balance::ZERO);
    assert_eq!(h.stake(&lay).matched, Balance::ZERO);
    assert!(h.ex.fills().is_empty());

    h.assert_invariants();
}

// =============================================================================
// Test: Yield accrual
// =============================================================================
#[test]
fn e2e_yield_accrual() {
    let mut h = Harness::new();
    h.advance_epochs(10);

    let s = h.place("alice.near", Position::Back, "1");
    let earning = &h.ex.stake_earnings(&[s.stake_id.clone()]).unwrap()[0];
    assert_eq!(earning.yield_balance, Balance::ZERO, "unconfirmed deposit earns nothing");

    h.confirm(&s);
    let earning = &h.ex.stake_earnings(&[s.stake_id.clone()]).unwrap()[0];
    assert_eq!(serde_json::to_value(earning.yield_balance).unwrap(), "0");
    assert_eq!(earning.epochs, (Epoch(10), Epoch(10)));
    assert_eq!(earning.total_balance, tokens("1"));

    h.advance_epochs(constants::EPOCHS_PER_YEAR);
    let earning = &h.ex.stake_earnings(&[s.stake_id.clone()]).unwrap()[0];
    assert!(earning.yield_balance > tokens("0.56"), "got {}", earning.yield_balance);
    assert!(earning.yield_balance < tokens("0.58"), "got {}", earning.yield_balance);
    assert_eq!(
        earning.total_balance.0,
        tokens("1").0 + earning.yield_balance.0
    );
}

#[test]
fn e2e_partial_exit_freezes_withdrawn_share() {
    let mut h = Harness::new();

    let s = h.place("alice.near", Position::Back, "2");
    h.place("bob.near", Position::Lay, "1");
    h.confirm(&s);
    h.advance_epochs(10);
    h.cancel(&s).unwrap();
    h.confirm(&s);
    let at_exit = h.ex.stake_earnings(&[s.stake_id.clone()]).unwrap()[0].clone();

    h.advance_epochs(10);
    let later = h.ex.stake_earnings(&[s.stake_id.clone()]).unwrap()[0].clone();
    assert_eq!(later.epochs, (Epoch(0), Epoch(20)));
    assert!(later.yield_balance > at_exit.yield_balance);

    // Only the matched half keeps compounding.
    let frozen_growth = later.yield_balance.0 - at_exit.yield_balance.0;
    let full_growth = {
        let mut twin = Harness::new();
        let t = twin.place("carol.near", Position::Back, "1");
        twin.confirm(&t);
        twin.advance_epochs(10);
        let a = twin.ex.stake_earnings(&[t.stake_id.clone()]).unwrap()[0].yield_balance;
        twin.advance_epochs(10);
        let b = twin.ex.stake_earnings(&[t.stake_id.clone()]).unwrap()[0].yield_balance;
        b.0 - a.0
    };
    assert_eq!(frozen_growth, full_growth);
    assert_eq!(later.total_balance.0, tokens("1").0 + later.yield_balance.0);
}

// =============================================================================
// Test: At-least-once confirmations
// =============================================================================
#[test]
fn e2e_confirmations_reverse_order_and_duplicates() {
    let mut h = Harness::new();

    let s1 = h.place("alice.near", Position::Back, "10");
    let s2 = h.place("bob.near", Position::Back, "10");
    let s3 = h.place("carol.near", Position::Lay, "15");
    let t1 = h.pending(&s1);

    for s in [&s3, &s2, &s1] {
        assert!(matches!(h.confirm(s), ConfirmationOutcome::Applied { .. }));
    }
    assert_eq!(h.confirm_token(t1), ConfirmationOutcome::Duplicate);

    let failed_late = h
        .ex
        .on_settlement_failed(&CallContext::call(POOL, h.now), t1, "late")
        .unwrap();
    assert_eq!(failed_late, ConfirmationOutcome::Duplicate);

    let staked = h.ex.staked_in(&AccountId::from(POOL));
    assert_eq!(staked, tokens("35"));
    assert_eq!(h.stake(&s2).unmatched, tokens("5"));
    h.assert_invariants();
}

#[test]
fn e2e_unknown_token_not_found() {
    let mut h = Harness::new();
    let err = h
        .ex
        .on_settlement_confirmed(&CallContext::call(POOL, h.now), CorrelationToken::new())
        .unwrap_err();
    assert!(err.is_not_found());
}

// =============================================================================
// Test: Faults
// =============================================================================
#[test]
fn e2e_transient_fault_is_retried() {
    let mut h = Harness::new();

    let s = h.place("alice.near", Position::Back, "1");
    let first = h.pending(&s);
    let ConfirmationOutcome::Retried { token, .. } = h.fail(&s, "pool busy") else {
        panic!("default policy should retry");
    };
    assert_ne!(token, first);
    assert_eq!(h.pending(&s), token);
    assert_eq!(h.stake(&s).status, StakeStatus::Active);

    assert!(matches!(h.confirm(&s), ConfirmationOutcome::Applied { .. }));
    assert_eq!(h.confirm_token(first), ConfirmationOutcome::Duplicate);

    let status = h.ex.settlement_status(&s.stake_id).unwrap();
    assert_eq!(status.requests.len(), 2);
    assert_eq!(status.latest().unwrap().attempt, 2);
    h.assert_invariants();
}

#[test]
fn e2e_deposit_fault_unwinds_fills() {
    let mut h = Harness::operator_only();

    let back = h.place("alice.near", Position::Back, "10");
    let lay = h.place("bob.near", Position::Lay, "6");
    h.confirm(&back);
    assert_eq!(h.stake(&back).unmatched, tokens("4"));

    let outcome = h.fail(&lay, "insufficient balance");
    assert_eq!(
        outcome,
        ConfirmationOutcome::Escalated {
            stake_id: lay.stake_id.clone()
        }
    );

    let lay_now = h.stake(&lay);
    assert_eq!(lay_now.status, StakeStatus::Errored);
    assert_eq!(lay_now.matched, Balance::ZERO);
    assert_eq!(h.stake(&back).unmatched, tokens("10"));
    assert!(h.ex.fills().iter().all(|f| f.unwound));
    assert_eq!(h.ex.errored_stakes().len(), 1);
    h.assert_invariants();

    // The restored back is open for matching again.
    let relay = h.place("carol.near", Position::Lay, "3");
    assert_eq!(h.stake(&relay).matched, tokens("3"));

    // The failed deposit never reached the pool; the exchange pays it back.
    let ReconcileOutcome::Refunded(payout) = h.reconcile(&lay).unwrap() else {
        panic!("deposit fault should be paid back");
    };
    assert_eq!(payout.amount, tokens("6"));
    assert_eq!(payout.staker.as_str(), "bob.near");
    assert!(h.ex.errored_stakes().is_empty());
    h.assert_invariants();
}

#[test]
fn e2e_withdrawal_fault_reconciled() {
    let mut h = Harness::operator_only();

    let s = h.place("alice.near", Position::Back, "1");
    h.confirm(&s);
    h.cancel(&s).unwrap();
    h.fail(&s, "pool paused");
    assert_eq!(h.stake(&s).status, StakeStatus::Errored);
    assert!(matches!(
        h.refund(&s).unwrap_err(),
        StakeMatchError::InvalidStateTransition { .. }
    ));

    let ReconcileOutcome::WithdrawalReissued(Submission::Accepted(reissued)) =
        h.reconcile(&s).unwrap()
    else {
        panic!("withdrawal should be reissued");
    };
    assert_eq!(reissued.kind, SettlementKind::Withdrawal);
    assert!(matches!(
        h.reconcile(&s).unwrap_err(),
        StakeMatchError::AsyncSettlementPending { .. }
    ));

    h.confirm(&s);
    assert_eq!(h.stake(&s).status, StakeStatus::Errored);
    assert!(h.stake(&s).exit_epoch.is_some());

    let ReconcileOutcome::Refunded(payout) = h.reconcile(&s).unwrap() else {
        panic!("confirmed withdrawal should be paid out");
    };
    assert_eq!(payout.amount, tokens("1"));
    assert_eq!(h.stake(&s).status, StakeStatus::Refunded);
    h.assert_invariants();
}

#[test]
fn e2e_unwind_into_refunded_stake_is_recoverable() {
    let mut h = Harness::operator_only();

    let back = h.place("alice.near", Position::Back, "10");
    h.confirm(&back);
    let lay = h.place("bob.near", Position::Lay, "6");
    assert_eq!(h.cancel(&back).unwrap(), CancelStatus::PartialCancellationPending);
    h.confirm(&back);
    assert_eq!(h.refund(&back).unwrap().amount, tokens("4"));

    h.fail(&lay, "insufficient balance");
    let flagged = h.stake(&back);
    assert_eq!(flagged.status, StakeStatus::Errored);
    assert_eq!(flagged.unmatched, tokens("10"));
    assert!(h.ex.errored_stakes().iter().any(|s| s.stake_id == back.stake_id));
    h.assert_invariants();

    let ReconcileOutcome::WithdrawalReissued(Submission::Accepted(withdrawal)) =
        h.reconcile(&back).unwrap()
    else {
        panic!("restored principal should be withdrawn");
    };
    assert_eq!(withdrawal.amount, tokens("6"));
    h.confirm(&back);

    let ReconcileOutcome::Refunded(payout) = h.reconcile(&back).unwrap() else {
        panic!("restored principal should be paid out");
    };
    assert_eq!(payout.amount, tokens("6"));
    assert_eq!(payout.staker.as_str(), "alice.near");
    assert_eq!(h.stake(&back).status, StakeStatus::Refunded);

    let paid: Balance = h
        .ex
        .payouts()
        .iter()
        .filter(|p| p.stake_id == back.stake_id)
        .map(|p| p.amount)
        .sum();
    assert_eq!(paid, tokens("10"));
    h.assert_invariants();
}

#[test]
fn e2e_unwind_into_cancelling_stake_is_recoverable() {
    let mut h = Harness::operator_only();

    let back = h.place("alice.near", Position::Back, "10");
    h.confirm(&back);
    let lay = h.place("bob.near", Position::Lay, "6");
    h.cancel(&back).unwrap();
    let cancel_token = h.pending(&back);

    h.fail(&lay, "insufficient balance");
    assert_eq!(h.stake(&back).status, StakeStatus::Errored);
    assert!(matches!(
        h.reconcile(&back).unwrap_err(),
        StakeMatchError::AsyncSettlementPending { .. }
    ));

    h.confirm_token(cancel_token);
    assert_eq!(h.stake(&back).status, StakeStatus::Errored);
    h.assert_invariants();

    let ReconcileOutcome::WithdrawalReissued(Submission::Accepted(withdrawal)) =
        h.reconcile(&back).unwrap()
    else {
        panic!("restored principal should be withdrawn");
    };
    assert_eq!(withdrawal.amount, tokens("6"));
    h.confirm(&back);

    let ReconcileOutcome::Refunded(payout) = h.reconcile(&back).unwrap() else {
        panic!("whole principal should be paid out");
    };
    assert_eq!(payout.amount, tokens("10"));
    assert!(matches!(
        h.reconcile(&back).unwrap_err(),
        StakeMatchError::InvalidStateTransition { .. }
    ));

    // The faulted lay never reached the pool.
    let ReconcileOutcome::Refunded(payout) = h.reconcile(&lay).unwrap() else {
        panic!("deposit fault should be paid back");
    };
    assert_eq!(payout.amount, tokens("6"));
    assert!(h.ex.errored_stakes().is_empty());
    h.assert_invariants();
}

// =============================================================================
// Test: Access control and pool changes
// =============================================================================
#[test]
fn e2e_pool_change_keeps_existing_stakes() {
    let mut h = Harness::new();
    let new_pool = AccountId::from("staked.pool.f863973.m0");

    let old = h.place("alice.near", Position::Back, "1");
    h.confirm(&old);

    let err = h
        .ex
        .change_stake_pool(&CallContext::call("alice.near", h.now), new_pool.clone())
        .unwrap_err();
    assert!(matches!(err, StakeMatchError::PermissionDenied { .. }));

    let meta = h
        .ex
        .change_stake_pool(&CallContext::call(OWNER, h.now), new_pool.clone())
        .unwrap();
    assert_eq!(meta.pool, new_pool);

    let fresh = h.place("bob.near", Position::Back, "2");
    assert_eq!(fresh.pool, new_pool);
    h.confirm(&fresh);

    h.cancel(&old).unwrap();
    let token = h.pending(&old);
    let err = h
        .ex
        .on_settlement_confirmed(&CallContext::call(new_pool.clone(), h.now), token)
        .unwrap_err();
    assert!(matches!(err, StakeMatchError::PermissionDenied { .. }));
    h.confirm(&old);

    assert_eq!(h.ex.staked_in(&AccountId::from(POOL)), Balance::ZERO);
    assert_eq!(h.ex.staked_in(&new_pool), tokens("2"));
    h.assert_invariants();
}

#[test]
fn e2e_admins_replace_admins() {
    let mut h = Harness::new();
    let admins = vec![AccountId::from("admin.near")];
    h.ex
        .change_admin_users(&CallContext::call(OWNER, h.now), admins.clone())
        .unwrap();
    let meta = h
        .ex
        .change_admin_users(&CallContext::call("admin.near", h.now), vec![])
        .unwrap();
    assert!(meta.admins.is_empty());
    let err = h
        .ex
        .change_admin_users(&CallContext::call("admin.near", h.now), admins)
        .unwrap_err();
    assert!(matches!(err, StakeMatchError::PermissionDenied { .. }));
}

// =============================================================================
// Test: Rejected stakes leave no trace
// =============================================================================
#[test]
fn e2e_rejected_stakes_do_not_mutate() {
    let mut h = Harness::new();
    let first = h.place("alice.near", Position::Back, "1");

    let mut dup = Harness::request(Position::Lay, false);
    dup.stake_id = first.stake_id.clone();
    assert!(matches!(
        h.try_place("bob.near", dup, "1").unwrap_err(),
        StakeMatchError::DuplicateStake(_)
    ));

    let mut other_person = Harness::request(Position::Lay, false);
    other_person.person = Person::from("someone-else");
    assert!(matches!(
        h.try_place("bob.near", other_person, "1").unwrap_err(),
        StakeMatchError::Validation { .. }
    ));

    let small = Harness::request(Position::Lay, false);
    assert!(matches!(
        h.try_place("bob.near", small, "0.01").unwrap_err(),
        StakeMatchError::Validation { .. }
    ));

    h.now = 10 * DAY;
    let late = Harness::request(Position::Lay, false);
    assert!(matches!(
        h.try_place("bob.near", late, "1").unwrap_err(),
        StakeMatchError::BetClosed { .. }
    ));

    assert_eq!(h.ex.stakes_count(), 1);
    assert_eq!(h.stake(&first).unmatched, tokens("1"));
    assert!(h.ex.fills().is_empty());
}

#[test]
fn e2e_mainnet_minimum_duration() {
    let mut h = Harness::with_config(ExchangeConfig::mainnet());
    let err = h
        .try_place("alice.near", Harness::request(Position::Back, false), "1")
        .unwrap_err();
    assert!(matches!(err, StakeMatchError::Validation { .. }), "10-day bet is too short: {err}");

    let mut long = Harness::request(Position::Back, false);
    long.end = h.now + 31 * DAY;
    assert!(h.try_place("alice.near", long, "1").is_ok());
}
