//! Owner and admin gates.

use std::collections::HashSet;

use stakematch_types::{AccountId, CallContext, Metadata, Result, Stake, StakeMatchError};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AccessControl {
    metadata: Metadata,
}

impl AccessControl {
    #[must_use]
    pub fn new(owner: AccountId, pool: AccountId) -> Self {
        Self {
            metadata: Metadata::new(owner, pool),
        }
    }

    #[must_use]
    pub fn from_metadata(metadata: Metadata) -> Self {
        Self { metadata }
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Pool targeted by new deposits.
    #[must_use]
    pub fn pool(&self) -> &AccountId {
        &self.metadata.pool
    }

    /// # Errors
    /// Returns `PermissionDenied` unless the caller is the owner.
    pub fn require_owner(&self, ctx: &CallContext) -> Result<()> {
        if self.metadata.is_owner(&ctx.caller) {
            return Ok(());
        }
        warn!(caller = %ctx.caller, "Owner-only call rejected");
        Err(StakeMatchError::permission_denied(format!(
            "{} is not the owner",
            ctx.caller
        )))
    }

    /// # Errors
    /// Returns `PermissionDenied` unless the caller is the owner or an admin.
    pub fn require_privileged(&self, ctx: &CallContext) -> Result<()> {
        if self.metadata.is_privileged(&ctx.caller) {
            return Ok(());
        }
        warn!(caller = %ctx.caller, "Admin-only call rejected");
        Err(StakeMatchError::permission_denied(format!(
            "{} is not an admin",
            ctx.caller
        )))
    }

    /// # Errors
    /// Returns `PermissionDenied` unless the caller placed the stake.
    pub fn require_staker(ctx: &CallContext, stake: &Stake) -> Result<()> {
        if ctx.caller == stake.staker {
            return Ok(());
        }
        Err(StakeMatchError::permission_denied(format!(
            "{} does not own stake {}",
            ctx.caller, stake.stake_id
        )))
    }

    /// Point future deposits at another pool. Owner only.
    ///
    /// # Errors
    /// `PermissionDenied` for any other caller, `Validation` for an empty id.
    pub fn change_stake_pool(&mut self, ctx: &CallContext, pool: AccountId) -> Result<Metadata> {
        self.require_owner(ctx)?;
        if pool.as_str().is_empty() {
            return Err(StakeMatchError::validation("pool must not be empty"));
        }
        info!(from = %self.metadata.pool, to = %pool, "Stake pool changed");
        self.metadata.pool = pool;
        Ok(self.metadata.clone())
    }

    /// Replace the admin set. Owner or any current admin.
    ///
    /// # Errors
    /// Returns `PermissionDenied` for any other caller.
    pub fn change_admin_users(
        &mut self,
        ctx: &CallContext,
        admins: Vec<AccountId>,
    ) -> Result<Metadata> {
        self.require_privileged(ctx)?;
        let mut seen = HashSet::new();
        let admins: Vec<AccountId> = admins
            .into_iter()
            .filter(|a| seen.insert(a.clone()))
            .collect();
        info!(caller = %ctx.caller, count = admins.len(), "Admin users replaced");
        self.metadata.admins = admins;
        Ok(self.metadata.clone())
    }
}
