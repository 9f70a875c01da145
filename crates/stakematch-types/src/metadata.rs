//! Exchange-wide metadata: who owns it, who administers it, where deposits go.

use serde::{Deserialize, Serialize};

use crate::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Fixed at initialization.
    pub owner: AccountId,
    pub admins: Vec<AccountId>,
    /// Pool targeted by deposits of new stakes.
    pub pool: AccountId,
}

impl Metadata {
    #[must_use]
    pub fn new(owner: AccountId, pool: AccountId) -> Self {
        Self {
            owner,
            admins: Vec::new(),
            pool,
        }
    }

    #[must_use]
    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }

    #[must_use]
    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }

    /// Owner or any admin.
    #[must_use]
    pub fn is_privileged(&self, account: &AccountId) -> bool {
        self.is_owner(account) || self.is_admin(account)
    }
}
