//! System-wide constants for the StakeMatch exchange.

/// Fractional digits of the pool token (1 token = 10^24 base units).
pub const TOKEN_DECIMALS: u32 = 24;

/// Required length of client-generated bet and stake ids (nanoid default).
pub const ID_LEN: usize = 21;

/// Minimum principal of a single stake: 0.069 token.
pub const MIN_STAKE: u128 = 69_000_000_000_000_000_000_000;

/// Minimum time between a stake and its bet's end on mainnet: 30 days in ns.
pub const MAINNET_MIN_DURATION_NS: u64 = 30 * 86_400_000_000_000;

/// Epochs the pool keeps unstaked funds locked before they can be withdrawn.
pub const MAINNET_REFUND_DELAY_EPOCHS: u64 = 4;

/// Default staking pool on mainnet.
pub const MAINNET_STAKE_POOL: &str = "astro-stakers.poolv1.near";

/// Default staking pool on testnet.
pub const TESTNET_STAKE_POOL: &str = "legends.pool.f863973.m0";

/// Fixed-APY assumption used by the default rate oracle: 45 / 100.
pub const DEFAULT_APY_NUMERATOR: i64 = 45;
pub const DEFAULT_APY_DENOMINATOR: i64 = 100;

/// Pool epochs per year (two epochs per day).
pub const EPOCHS_PER_YEAR: u64 = 365 * 2;

/// Default page size for list views.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Attempts (including the first) before a faulted pool request escalates.
pub const DEFAULT_MAX_SETTLEMENT_ATTEMPTS: u32 = 3;

/// Confirmation idempotency cache size (number of tokens to remember).
pub const CONFIRMATION_IDEMPOTENCY_CACHE_SIZE: usize = 500_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "StakeMatch";
