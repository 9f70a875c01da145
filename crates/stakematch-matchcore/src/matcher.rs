//! Pure FIFO stake matcher.
//!
//! The core matching function: takes an incoming stake and the resting
//! stakes on the opposite side of the same bet, and produces the fills.
//! No side effects, no ledger writes. The caller applies the returned fills
//! to both ledger rows in one step.
//!
//! ```text
//! match_stake(MatchOrder, CandidateQueue) -> MatchOutcome
//! ```
//!
//! ## Algorithm
//!
//! 1. Reject a closed bet and malformed candidates before computing anything
//! 2. Walk candidates strictly by creation sequence (FIFO)
//! 3. For each candidate consume `min(incoming.remaining, candidate.remaining)`
//! 4. Stop when the incoming stake is exhausted or the queue is empty
//! 5. Digest the fills for audit
//!
//! A gentleman's stake never matches; its outcome is empty.

use stakematch_types::{
    Balance, BetId, Fill, FillId, Position, Result, StakeId, StakeMatchError,
};
use tracing::debug;

use crate::{CandidateQueue, determinism::compute_fill_root};

/// The incoming stake, as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOrder {
    pub stake_id: StakeId,
    pub bet_id: BetId,
    pub position: Position,
    pub amount: Balance,
    pub gentlemans: bool,
    /// End of the bet, nanoseconds.
    pub bet_end: u64,
    /// Host timestamp of the call, nanoseconds.
    pub submitted_at: u64,
    /// Global sequence assigned to the first fill this order produces.
    pub next_fill_sequence: u64,
}

/// Result of matching one incoming stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Fills in the order they were produced.
    pub fills: Vec<Fill>,
    /// Unmatched remainder of the incoming stake.
    pub remaining: Balance,
    pub fill_root: [u8; 32],
}

impl MatchOutcome {
    #[must_use]
    pub fn matched(&self) -> Balance {
        self.fills.iter().map(|f| f.amount).sum()
    }
}

/// Pair an incoming stake against resting opposite stakes.
///
/// # Errors
/// - `BetClosed` if the bet's end has passed
/// - `Validation` if the incoming amount is zero, or a candidate belongs to
///   another bet, sits on the same side, has nothing left, or breaks FIFO order
pub fn match_stake(incoming: &MatchOrder, candidates: CandidateQueue) -> Result<MatchOutcome> {
    if incoming.submitted_at >= incoming.bet_end {
        return Err(StakeMatchError::BetClosed {
            bet_id: incoming.bet_id.clone(),
            end: incoming.bet_end,
        });
    }
    if incoming.amount.is_zero() {
        return Err(StakeMatchError::validation("stake amount must be > 0"));
    }

    let mut last_sequence = None;
    for candidate in candidates.iter() {
        if candidate.bet_id != incoming.bet_id {
            return Err(StakeMatchError::validation(format!(
                "candidate {} belongs to {}, not {}",
                candidate.stake_id, candidate.bet_id, incoming.bet_id
            )));
        }
        if candidate.position != incoming.position.opposite() {
            return Err(StakeMatchError::validation(format!(
                "candidate {} is on the same side ({})",
                candidate.stake_id, candidate.position
            )));
        }
        if candidate.remaining.is_zero() || candidate.stake_id == incoming.stake_id {
            return Err(StakeMatchError::validation(format!(
                "candidate {} is not matchable",
                candidate.stake_id
            )));
        }
        if last_sequence.is_some_and(|prev| candidate.sequence <= prev) {
            return Err(StakeMatchError::validation(
                "candidates are not in creation order",
            ));
        }
        last_sequence = Some(candidate.sequence);
    }

    debug!(
        stake_id = %incoming.stake_id,
        candidates = candidates.len(),
        available = %candidates.total_remaining(),
        "Matching stake"
    );

    let mut fills = Vec::new();
    let mut remaining = incoming.amount;

    if incoming.gentlemans {
        return Ok(MatchOutcome {
            fills,
            remaining,
            fill_root: compute_fill_root(&[]),
        });
    }

    let mut fill_seq = incoming.next_fill_sequence;
    for candidate in candidates {
        if remaining.is_zero() {
            break;
        }
        let amount = remaining.min(candidate.remaining);
        let (back_stake, lay_stake) = match incoming.position {
            Position::Back => (incoming.stake_id.clone(), candidate.stake_id.clone()),
            Position::Lay => (candidate.stake_id.clone(), incoming.stake_id.clone()),
        };

        debug!(
            bet_id = %incoming.bet_id,
            taker = %incoming.stake_id,
            maker = %candidate.stake_id,
            amount = %amount,
            fill_seq,
            "Fill"
        );

        fills.push(Fill {
            id: FillId::deterministic(&incoming.bet_id, fill_seq),
            sequence: fill_seq,
            bet_id: incoming.bet_id.clone(),
            back_stake,
            lay_stake,
            taker_stake: incoming.stake_id.clone(),
            amount,
            unwound: false,
        });
        fill_seq += 1;
        remaining = remaining.saturating_sub(amount);
    }

    let fill_root = compute_fill_root(&fills);
    Ok(MatchOutcome {
        fills,
        remaining,
        fill_root,
    })
}
