//! Host call context and call arguments of mutating entry points.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Balance, BetId, Person, Position, Prediction, StakeId};

/// Who is calling, what they attached, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: AccountId,
    /// Funds attached to the call, in base units.
    pub attached_deposit: Balance,
    /// Host block timestamp, nanoseconds since the UNIX epoch.
    pub block_timestamp: u64,
}

impl CallContext {
    #[must_use]
    pub fn new(caller: impl Into<AccountId>, attached_deposit: Balance, block_timestamp: u64) -> Self {
        Self {
            caller: caller.into(),
            attached_deposit,
            block_timestamp,
        }
    }

    /// A call with nothing attached.
    #[must_use]
    pub fn call(caller: impl Into<AccountId>, block_timestamp: u64) -> Self {
        Self::new(caller, Balance::ZERO, block_timestamp)
    }
}

/// Arguments of `new_stake`. The principal is the call's attached deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStake {
    pub bet_id: BetId,
    pub stake_id: StakeId,
    pub prediction: Prediction,
    pub position: Position,
    pub person: Person,
    /// Requested bet end, nanoseconds. Ignored when the bet already exists.
    pub end: u64,
    #[serde(default)]
    pub gentlemans: bool,
}
