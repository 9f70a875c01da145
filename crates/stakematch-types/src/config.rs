//! Configuration for a StakeMatch exchange instance.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Balance, Result, StakeMatchError, constants};

/// Exchange-wide configuration.
///
/// The two presets mirror the network split of the deployed contract:
/// mainnet enforces a 30-day minimum bet duration and the pool's 4-epoch
/// unbonding delay, testnet relaxes both to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Pool used for deposits until the owner changes the target.
    pub default_pool: AccountId,
    /// Smallest principal accepted by `new_stake`.
    pub min_stake: Balance,
    /// A bet's end must be later than `now + min_duration_ns`.
    pub min_duration_ns: u64,
    /// Epochs between withdrawal confirmation and refund.
    pub refund_delay_epochs: u64,
    /// Required length of bet and stake ids.
    pub id_len: usize,
    /// Attempts before a faulted pool request escalates to `Errored`.
    pub max_settlement_attempts: u32,
    /// Number of confirmation tokens remembered for replay detection.
    pub idempotency_cache_size: usize,
    /// Page size of list views called without an explicit page.
    pub default_page_limit: usize,
}

impl ExchangeConfig {
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            default_pool: AccountId::from(constants::MAINNET_STAKE_POOL),
            min_stake: Balance(constants::MIN_STAKE),
            min_duration_ns: constants::MAINNET_MIN_DURATION_NS,
            refund_delay_epochs: constants::MAINNET_REFUND_DELAY_EPOCHS,
            id_len: constants::ID_LEN,
            max_settlement_attempts: constants::DEFAULT_MAX_SETTLEMENT_ATTEMPTS,
            idempotency_cache_size: constants::CONFIRMATION_IDEMPOTENCY_CACHE_SIZE,
            default_page_limit: constants::DEFAULT_PAGE_LIMIT,
        }
    }

    #[must_use]
    pub fn testnet() -> Self {
        Self {
            default_pool: AccountId::from(constants::TESTNET_STAKE_POOL),
            min_duration_ns: 0,
            refund_delay_epochs: 0,
            ..Self::mainnet()
        }
    }

    /// Parse a JSON config. Missing fields fall back to the mainnet preset.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| StakeMatchError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the exchange cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.default_pool.as_str().is_empty() {
            return Err(StakeMatchError::Configuration(
                "default_pool must not be empty".into(),
            ));
        }
        if self.min_stake.is_zero() {
            return Err(StakeMatchError::Configuration("min_stake must be > 0".into()));
        }
        if self.id_len == 0 {
            return Err(StakeMatchError::Configuration("id_len must be > 0".into()));
        }
        if self.max_settlement_attempts == 0 {
            return Err(StakeMatchError::Configuration(
                "max_settlement_attempts must be > 0".into(),
            ));
        }
        if self.idempotency_cache_size == 0 || self.default_page_limit == 0 {
            return Err(StakeMatchError::Configuration(
                "cache and page sizes must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}
