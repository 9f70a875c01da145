//! Stake ledger: the source of truth for every stake and every fill.
//!
//! Stakes are kept in registration order and never deleted. Fills are
//! applied to both sides in one step: all amounts are checked first and
//! nothing is written if any side would go negative. A fill can be unwound
//! later, which restores both sides symmetrically.

use std::collections::HashMap;

use stakematch_types::{
    Balance, BetId, Fill, Position, Result, Stake, StakeId, StakeMatchError, StakeStatus,
};

#[derive(Debug, Default)]
pub struct StakeLedger {
    stakes: Vec<Stake>,
    index: HashMap<StakeId, usize>,
    fills: Vec<Fill>,
    next_sequence: u64,
}

impl StakeLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted rows.
    ///
    /// # Errors
    /// Returns `Serialization` if a stake id repeats or a fill references an
    /// unknown stake.
    pub fn restore(stakes: Vec<Stake>, fills: Vec<Fill>) -> Result<Self> {
        let mut ledger = Self::new();
        for stake in stakes {
            if ledger.index.contains_key(&stake.stake_id) {
                return Err(StakeMatchError::Serialization(format!(
                    "duplicate stake {} in snapshot",
                    stake.stake_id
                )));
            }
            ledger.push(stake);
        }
        for fill in &fills {
            if !ledger.contains(&fill.back_stake) || !ledger.contains(&fill.lay_stake) {
                return Err(StakeMatchError::Serialization(format!(
                    "fill {} references an unknown stake",
                    fill.id
                )));
            }
        }
        ledger.fills = fills;
        Ok(ledger)
    }

    #[must_use]
    pub fn contains(&self, stake_id: &StakeId) -> bool {
        self.index.contains_key(stake_id)
    }

    /// # Errors
    /// Returns `StakeNotFound` for an unknown id.
    pub fn get(&self, stake_id: &StakeId) -> Result<&Stake> {
        self.index
            .get(stake_id)
            .map(|&i| &self.stakes[i])
            .ok_or_else(|| StakeMatchError::StakeNotFound(stake_id.clone()))
    }

    /// # Errors
    /// Returns `StakeNotFound` for an unknown id.
    pub fn get_mut(&mut self, stake_id: &StakeId) -> Result<&mut Stake> {
        match self.index.get(stake_id) {
            Some(&i) => Ok(&mut self.stakes[i]),
            None => Err(StakeMatchError::StakeNotFound(stake_id.clone())),
        }
    }

    /// Sequence the next registered stake will receive.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Global sequence of the next fill.
    #[must_use]
    pub fn next_fill_sequence(&self) -> u64 {
        self.fills.len() as u64
    }

    /// Register a new stake.
    ///
    /// # Errors
    /// Returns `DuplicateStake` if the id is taken.
    pub fn insert(&mut self, stake: Stake) -> Result<()> {
        if self.contains(&stake.stake_id) {
            return Err(StakeMatchError::DuplicateStake(stake.stake_id));
        }
        self.push(stake);
        Ok(())
    }

    fn push(&mut self, stake: Stake) {
        self.next_sequence = self.next_sequence.max(stake.sequence + 1);
        self.index.insert(stake.stake_id.clone(), self.stakes.len());
        self.stakes.push(stake);
    }

    /// Apply fills to both sides of every pairing.
    ///
    /// # Errors
    /// Returns `StakeNotFound` or `Internal` before touching any row if a
    /// side is unknown or lacks the unmatched amount.
    pub fn apply_fills(&mut self, fills: &[Fill]) -> Result<()> {
        let mut demand: HashMap<&StakeId, Balance> = HashMap::new();
        for fill in fills {
            for side in [&fill.back_stake, &fill.lay_stake] {
                let total = demand.entry(side).or_default();
                *total = total
                    .checked_add(fill.amount)
                    .ok_or_else(|| StakeMatchError::Internal("fill demand overflow".into()))?;
            }
        }
        for (stake_id, needed) in &demand {
            let stake = self.get(stake_id)?;
            if stake.unmatched < *needed {
                return Err(StakeMatchError::Internal(format!(
                    "stake {stake_id} has {} unmatched, fills need {needed}",
                    stake.unmatched
                )));
            }
        }

        for fill in fills {
            self.get_mut(&fill.back_stake)?.apply_fill(fill.amount)?;
            self.get_mut(&fill.lay_stake)?.apply_fill(fill.amount)?;
            self.fills.push(fill.clone());
        }
        Ok(())
    }

    /// Reverse every live fill involving `stake_id` on both sides.
    ///
    /// Returns the fills that were unwound.
    ///
    /// # Errors
    /// Returns `Internal` if a side's matched amount is inconsistent.
    pub fn unwind_fills_of(&mut self, stake_id: &StakeId) -> Result<Vec<Fill>> {
        let targets: Vec<usize> = self
            .fills
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.unwound && f.involves(stake_id))
            .map(|(i, _)| i)
            .collect();

        let mut unwound = Vec::with_capacity(targets.len());
        for i in targets {
            let fill = self.fills[i].clone();
            self.get_mut(&fill.back_stake)?.unwind_fill(fill.amount)?;
            self.get_mut(&fill.lay_stake)?.unwind_fill(fill.amount)?;
            self.fills[i].unwound = true;
            unwound.push(fill);
        }
        Ok(unwound)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stake> {
        self.stakes.iter()
    }

    pub fn for_bet<'a>(&'a self, bet_id: &'a BetId) -> impl Iterator<Item = &'a Stake> {
        self.stakes.iter().filter(move |s| &s.bet_id == bet_id)
    }

    pub fn errored(&self) -> impl Iterator<Item = &Stake> {
        self.stakes
            .iter()
            .filter(|s| s.status == StakeStatus::Errored)
    }

    /// Σ matched of each side of a bet: `(back, lay)`.
    #[must_use]
    pub fn matched_totals(&self, bet_id: &BetId) -> (Balance, Balance) {
        self.for_bet(bet_id)
            .fold((Balance::ZERO, Balance::ZERO), |(back, lay), s| match s.position {
                Position::Back => (Balance(back.0 + s.matched.0), lay),
                Position::Lay => (back, Balance(lay.0 + s.matched.0)),
            })
    }

    #[must_use]
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn fills_for<'a>(&'a self, stake_id: &'a StakeId) -> impl Iterator<Item = &'a Fill> {
        self.fills.iter().filter(move |f| f.involves(stake_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }
}
