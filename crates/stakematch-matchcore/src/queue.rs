//! FIFO queue of resting stakes on one side of one bet.
//!
//! Candidates are held in creation-sequence order using a [`VecDeque`]:
//! the front has the highest time priority and is consumed first.

use std::collections::VecDeque;

use stakematch_types::{Balance, BetId, Position, Stake, StakeId};

/// The part of a resting stake the matcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub stake_id: StakeId,
    pub bet_id: BetId,
    pub position: Position,
    /// Unmatched amount still available for pairing.
    pub remaining: Balance,
    pub sequence: u64,
}

impl From<&Stake> for MatchCandidate {
    fn from(stake: &Stake) -> Self {
        Self {
            stake_id: stake.stake_id.clone(),
            bet_id: stake.bet_id.clone(),
            position: stake.position,
            remaining: stake.unmatched,
            sequence: stake.sequence,
        }
    }
}

/// Resting stakes of one bet and one position, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CandidateQueue {
    candidates: VecDeque<MatchCandidate>,
}

impl CandidateQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every stake of `bet_id` resting on `position` that may be
    /// matched, ordered by sequence.
    ///
    /// Gentleman's stakes, stakes that are no longer Active and fully
    /// matched stakes are skipped.
    pub fn collect<'a>(
        stakes: impl IntoIterator<Item = &'a Stake>,
        bet_id: &BetId,
        position: Position,
    ) -> Self {
        let mut candidates: Vec<MatchCandidate> = stakes
            .into_iter()
            .filter(|s| &s.bet_id == bet_id && s.position == position && s.is_match_candidate())
            .map(MatchCandidate::from)
            .collect();
        candidates.sort_by_key(|c| c.sequence);
        Self {
            candidates: candidates.into(),
        }
    }

    /// Add a candidate at the back, bypassing the ordering `collect` gives.
    #[cfg(test)]
    pub(crate) fn push_back(&mut self, candidate: MatchCandidate) {
        self.candidates.push_back(candidate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchCandidate> {
        self.candidates.iter()
    }

    /// Total amount available across the queue.
    #[must_use]
    pub fn total_remaining(&self) -> Balance {
        self.candidates.iter().map(|c| c.remaining).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

impl IntoIterator for CandidateQueue {
    type Item = MatchCandidate;
    type IntoIter = std::collections::vec_deque::IntoIter<MatchCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}
