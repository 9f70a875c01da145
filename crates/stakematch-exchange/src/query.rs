//! Read-only views. Nothing here mutates state.

use std::collections::HashSet;

use stakematch_settlement::{RateOracle, StakePool, YieldInput, stake_earning};
use stakematch_types::{
    AccountId, Bet, BetFilter, BetId, CorrelationToken, Fill, Metadata, Page, Payout, Person,
    PersonStakes, Result, SettlementKind, SettlementRequest, SettlementStatus, Stake, StakeEarning,
    StakeId,
};

use crate::Exchange;

impl<P: StakePool, O: RateOracle> Exchange<P, O> {
    /// `page`, or the first page of `default_page_limit` items.
    fn page(&self, page: Option<Page>) -> Page {
        page.unwrap_or_else(|| Page::new(0, self.config.default_page_limit))
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        self.access.metadata()
    }

    /// Bet subjects in first-seen order, minus `exclude`.
    #[must_use]
    pub fn persons(&self, exclude: &[Person], page: Option<Page>) -> Vec<Person> {
        let excluded: HashSet<&Person> = exclude.iter().collect();
        self.page(page).apply(
            self.registry
                .persons()
                .iter()
                .filter(|p| !excluded.contains(p)),
        )
        .cloned()
        .collect()
    }

    #[must_use]
    pub fn persons_count(&self) -> usize {
        self.registry.persons().len()
    }

    /// Bets matching `filter`; `now_ns` decides which bets have ended.
    #[must_use]
    pub fn bets(&self, filter: &BetFilter, now_ns: u64, page: Option<Page>) -> Vec<Bet> {
        self.page(page).apply(self.registry.iter().filter(|b| filter.matches(b, now_ns)))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn bets_count(&self) -> usize {
        self.registry.len()
    }

    /// # Errors
    /// Returns `BetNotFound` for an unknown id.
    pub fn bet(&self, bet_id: &BetId) -> Result<&Bet> {
        self.registry.get(bet_id)
    }

    #[must_use]
    pub fn stakes(&self, page: Option<Page>) -> Vec<Stake> {
        self.page(page).apply(self.ledger.iter()).cloned().collect()
    }

    #[must_use]
    pub fn stakes_count(&self) -> usize {
        self.ledger.len()
    }

    /// # Errors
    /// Returns `StakeNotFound` for an unknown id.
    pub fn stake(&self, stake_id: &StakeId) -> Result<&Stake> {
        self.ledger.get(stake_id)
    }

    #[must_use]
    pub fn stakes_for_bets(&self, bet_ids: &[BetId], page: Option<Page>) -> Vec<Stake> {
        self.page(page).apply(self.ledger.iter().filter(|s| bet_ids.contains(&s.bet_id)))
            .cloned()
            .collect()
    }

    /// Stakes placed by `staker`, plus every bet they reference.
    #[must_use]
    pub fn stakes_for_person(&self, staker: &AccountId, page: Option<Page>) -> PersonStakes {
        let stakes: Vec<Stake> = self
            .page(page)
            .apply(self.ledger.iter().filter(|s| &s.staker == staker))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let bets = stakes
            .iter()
            .filter(|s| seen.insert(&s.bet_id))
            .filter_map(|s| self.registry.find(&s.bet_id).cloned())
            .collect();
        PersonStakes { stakes, bets }
    }

    /// Yield of each stake up to the oracle's current epoch.
    ///
    /// # Errors
    /// Returns `StakeNotFound` if any id is unknown.
    pub fn stake_earnings(&self, stake_ids: &[StakeId]) -> Result<Vec<StakeEarning>> {
        stake_ids
            .iter()
            .map(|id| {
                let stake = self.ledger.get(id)?;
                let input = YieldInput {
                    stake_id: id.clone(),
                    principal: stake.principal,
                    withdrawn: self
                        .coordinator
                        .confirmed_amount(id, SettlementKind::Withdrawal),
                    deposit_epoch: stake.deposit_epoch,
                    exit_epoch: stake.exit_epoch,
                    earning: self
                        .coordinator
                        .confirmed(id, SettlementKind::Deposit)
                        .is_some(),
                };
                stake_earning(self.oracle(), &input)
            })
            .collect()
    }

    /// # Errors
    /// Returns `StakeNotFound` for an unknown id.
    pub fn settlement_status(&self, stake_id: &StakeId) -> Result<SettlementStatus> {
        let stake = self.ledger.get(stake_id)?;
        Ok(SettlementStatus {
            stake_id: stake_id.clone(),
            status: stake.status,
            requests: self.coordinator.requests_for(stake_id).cloned().collect(),
        })
    }

    /// The pool request issued under `token`, if any.
    #[must_use]
    pub fn settlement_request(&self, token: &CorrelationToken) -> Option<&SettlementRequest> {
        self.coordinator.request(token)
    }

    /// Stakes awaiting operator reconciliation.
    #[must_use]
    pub fn errored_stakes(&self) -> Vec<Stake> {
        self.ledger.errored().cloned().collect()
    }

    #[must_use]
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    /// Every fill ever produced, unwound ones included.
    #[must_use]
    pub fn fills(&self) -> &[Fill] {
        self.ledger.fills()
    }
}
