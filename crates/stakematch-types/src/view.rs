//! Wire types returned by entry points and read-only views.

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Balance, Bet, BetId, CorrelationToken, Epoch, Person, SettlementKind,
    SettlementRequest, Stake, StakeId, StakeStatus, constants,
};

/// Result of `cancel_stake`.
///
/// Serialized as the plain-text messages clients already match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelStatus {
    #[serde(rename = "full cancellation pending")]
    FullCancellationPending,
    #[serde(rename = "partial cancellation pending")]
    PartialCancellationPending,
    #[serde(rename = "not cancelled")]
    NotCancelled,
}

impl std::fmt::Display for CancelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::FullCancellationPending => "full cancellation pending",
            Self::PartialCancellationPending => "partial cancellation pending",
            Self::NotCancelled => "not cancelled",
        };
        f.write_str(text)
    }
}

/// What an asynchronous pool confirmation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationOutcome {
    /// The request was resolved and the stake updated.
    Applied {
        stake_id: StakeId,
        kind: SettlementKind,
    },
    /// The failure was absorbed by reissuing the request.
    Retried {
        stake_id: StakeId,
        token: CorrelationToken,
    },
    /// The failure moved the stake to `Errored`.
    Escalated { stake_id: StakeId },
    /// The token was already resolved; nothing changed.
    Duplicate,
}

/// Earnings of one stake, as returned by `stake_earnings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEarning {
    pub stake_id: StakeId,
    /// `[from, to]` epochs the balance compounded over.
    pub epochs: (Epoch, Epoch),
    pub yield_balance: Balance,
    pub total_balance: Balance,
}

/// Settlement state of one stake, as returned by `settlement_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStatus {
    pub stake_id: StakeId,
    pub status: StakeStatus,
    /// Every pool request issued for the stake, oldest first.
    pub requests: Vec<SettlementRequest>,
}

impl SettlementStatus {
    /// The most recent request, if any was issued.
    #[must_use]
    pub fn latest(&self) -> Option<&SettlementRequest> {
        self.requests.last()
    }
}

/// Stakes of one account plus the bets they reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonStakes {
    pub stakes: Vec<Stake>,
    pub bets: Vec<Bet>,
}

/// Dispute hand-off for the governance module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionRequest {
    pub bet_id: BetId,
    /// Votes needed to adopt: half the voters plus one.
    pub quorum: usize,
    /// Distinct stakers on the bet.
    pub voters: Vec<AccountId>,
}

/// Window over an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub from_index: usize,
    pub limit: usize,
}

impl Page {
    #[must_use]
    pub fn new(from_index: usize, limit: usize) -> Self {
        Self { from_index, limit }
    }

    /// Apply the window to an iterator.
    pub fn apply<I: Iterator>(self, iter: I) -> impl Iterator<Item = I::Item> {
        iter.skip(self.from_index).take(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            from_index: 0,
            limit: constants::DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Filter for the `bets` view. Absent fields do not constrain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BetFilter {
    pub person: Option<Person>,
    pub bet_ids: Option<Vec<BetId>>,
    /// `Some(true)` keeps only ended bets, `Some(false)` only open ones.
    pub ended: Option<bool>,
}

impl BetFilter {
    #[must_use]
    pub fn matches(&self, bet: &Bet, now_ns: u64) -> bool {
        if let Some(person) = &self.person {
            if &bet.person != person {
                return false;
            }
        }
        if let Some(ids) = &self.bet_ids {
            if !ids.contains(&bet.bet_id) {
                return false;
            }
        }
        if let Some(ended) = self.ended {
            if bet.is_closed_at(now_ns) != ended {
                return false;
            }
        }
        true
    }
}
