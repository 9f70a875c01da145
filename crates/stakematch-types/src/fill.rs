//! Fill records produced by the matching engine.
//!
//! A [`Fill`] pairs part of a Back stake with part of a Lay stake of the same
//! bet. Fills are kept in the ledger so that a stake whose deposit later
//! fails can be unwound on both sides.

use serde::{Deserialize, Serialize};

use crate::{Balance, BetId, FillId, StakeId};

/// One pairing between a Back stake and a Lay stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Deterministic from bet + fill sequence.
    pub id: FillId,
    /// Global fill sequence number.
    pub sequence: u64,
    pub bet_id: BetId,
    pub back_stake: StakeId,
    pub lay_stake: StakeId,
    /// The stake whose arrival triggered the pairing.
    pub taker_stake: StakeId,
    pub amount: Balance,
    /// Cleared when the fill is reversed by a settlement fault.
    pub unwound: bool,
}

impl Fill {
    /// Does this fill involve `stake_id` on either side?
    #[must_use]
    pub fn involves(&self, stake_id: &StakeId) -> bool {
        &self.back_stake == stake_id || &self.lay_stake == stake_id
    }

    /// The other side of the pairing from `stake_id`'s point of view.
    #[must_use]
    pub fn counterparty_of(&self, stake_id: &StakeId) -> Option<&StakeId> {
        if &self.back_stake == stake_id {
            Some(&self.lay_stake)
        } else if &self.lay_stake == stake_id {
            Some(&self.back_stake)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fill[{}] {} back={} lay={} amount={}",
            self.sequence, self.bet_id, self.back_stake, self.lay_stake, self.amount,
        )
    }
}
