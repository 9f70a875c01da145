//! Stake validator: hard gate in front of the ledger.
//!
//! Every `new_stake` passes through here before anything is looked up or
//! written. Checks are cheap and stateless; bet-level checks (closed bet,
//! minimum duration, mismatched subject) live in the registry.

use stakematch_types::{
    Balance, CallContext, ExchangeConfig, NewStake, Result, StakeMatchError, constants,
};

pub struct StakeValidator {
    min_stake: Balance,
    id_len: usize,
}

impl StakeValidator {
    #[must_use]
    pub fn new(config: &ExchangeConfig) -> Self {
        Self {
            min_stake: config.min_stake,
            id_len: config.id_len,
        }
    }

    /// # Errors
    /// Returns `Validation` naming the first failing check.
    pub fn validate(&self, ctx: &CallContext, req: &NewStake) -> Result<()> {
        // 1. Principal
        if ctx.attached_deposit < self.min_stake {
            return Err(StakeMatchError::validation(format!(
                "stake {} below minimum {}",
                ctx.attached_deposit, self.min_stake
            )));
        }

        // 2. Client-generated ids
        if !self.is_valid_id(req.bet_id.as_str()) {
            return Err(StakeMatchError::validation(format!(
                "invalid bet_id {:?}",
                req.bet_id.as_str()
            )));
        }
        if !self.is_valid_id(req.stake_id.as_str()) {
            return Err(StakeMatchError::validation(format!(
                "invalid stake_id {:?}",
                req.stake_id.as_str()
            )));
        }

        // 3. Subject and caller
        if req.person.as_str().is_empty() {
            return Err(StakeMatchError::validation("person must not be empty"));
        }
        if ctx.caller.as_str().is_empty() {
            return Err(StakeMatchError::validation("caller must not be empty"));
        }
        Ok(())
    }

    /// `id_len` characters of the nanoid alphabet `[A-Za-z0-9_-]`.
    #[must_use]
    pub fn is_valid_id(&self, id: &str) -> bool {
        id.len() == self.id_len
            && id
                .bytes()
                .all(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'-')
    }
}

impl Default for StakeValidator {
    fn default() -> Self {
        Self {
            min_stake: Balance(constants::MIN_STAKE),
            id_len: constants::ID_LEN,
        }
    }
}
