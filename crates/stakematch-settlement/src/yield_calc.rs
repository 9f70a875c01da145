//! Epoch-based yield accrual.
//!
//! Principal parked in a pool compounds once per epoch:
//!
//! ```text
//! balance[e + 1] = balance[e] * (1 + rate[e])
//! ```
//!
//! When part of the principal leaves the pool, that part's compounded
//! balance freezes at the exit epoch while the rest keeps compounding.
//! Rates come from a [`RateOracle`]; all compounding happens in
//! [`Decimal`] and the result is floored back to base units.

use std::collections::BTreeMap;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use stakematch_types::{Balance, Epoch, Result, StakeEarning, StakeId, StakeMatchError, constants};

/// Source of the current epoch and per-epoch reward rates.
pub trait RateOracle {
    fn current_epoch(&self) -> Epoch;

    /// Reward rate paid for `epoch`, as a fraction of the balance.
    fn reward_rate(&self, epoch: Epoch) -> Decimal;
}

/// Constant APY spread evenly over the epochs of a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedApyOracle {
    epoch: Epoch,
    per_epoch: Decimal,
}

impl FixedApyOracle {
    /// # Errors
    /// Returns `Configuration` for a negative APY or zero epochs per year.
    pub fn new(apy: Decimal, epochs_per_year: u64) -> Result<Self> {
        if apy.is_sign_negative() || epochs_per_year == 0 {
            return Err(StakeMatchError::Configuration(format!(
                "invalid APY {apy} over {epochs_per_year} epochs"
            )));
        }
        Ok(Self {
            epoch: Epoch::default(),
            per_epoch: apy / Decimal::from(epochs_per_year),
        })
    }

    /// 45% APY over 730 epochs per year.
    #[must_use]
    pub fn default_apy() -> Self {
        let apy = Decimal::from(constants::DEFAULT_APY_NUMERATOR)
            / Decimal::from(constants::DEFAULT_APY_DENOMINATOR);
        Self {
            epoch: Epoch::default(),
            per_epoch: apy / Decimal::from(constants::EPOCHS_PER_YEAR),
        }
    }

    #[must_use]
    pub fn at(mut self, epoch: Epoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }

    pub fn advance(&mut self, epochs: u64) {
        self.epoch = Epoch(self.epoch.0 + epochs);
    }

    #[must_use]
    pub fn per_epoch_rate(&self) -> Decimal {
        self.per_epoch
    }
}

impl RateOracle for FixedApyOracle {
    fn current_epoch(&self) -> Epoch {
        self.epoch
    }

    fn reward_rate(&self, _epoch: Epoch) -> Decimal {
        self.per_epoch
    }
}

/// Explicit per-epoch rates with a fallback for unlisted epochs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOracle {
    epoch: Epoch,
    rates: BTreeMap<Epoch, Decimal>,
    fallback: Decimal,
}

impl ScheduleOracle {
    #[must_use]
    pub fn new(fallback: Decimal) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_rate(mut self, epoch: Epoch, rate: Decimal) -> Self {
        self.rates.insert(epoch, rate);
        self
    }

    pub fn set_rate(&mut self, epoch: Epoch, rate: Decimal) {
        self.rates.insert(epoch, rate);
    }

    pub fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }

    pub fn advance(&mut self, epochs: u64) {
        self.epoch = Epoch(self.epoch.0 + epochs);
    }
}

impl RateOracle for ScheduleOracle {
    fn current_epoch(&self) -> Epoch {
        self.epoch
    }

    fn reward_rate(&self, epoch: Epoch) -> Decimal {
        self.rates.get(&epoch).copied().unwrap_or(self.fallback)
    }
}

/// What the calculator needs to know about one stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldInput {
    pub stake_id: StakeId,
    pub principal: Balance,
    /// Principal the pool confirmed as withdrawn.
    pub withdrawn: Balance,
    pub deposit_epoch: Epoch,
    /// Epoch the withdrawn part left the pool.
    pub exit_epoch: Option<Epoch>,
    /// False while the deposit is unconfirmed, or when it failed.
    pub earning: bool,
}

/// Product of `(1 + rate[e])` for `e` in `[from, to)`.
///
/// # Errors
/// Returns `Internal` on overflow or a rate below -100%.
pub fn compound_factor<O: RateOracle + ?Sized>(oracle: &O, from: Epoch, to: Epoch) -> Result<Decimal> {
    let mut factor = Decimal::ONE;
    for e in from.0..to.0 {
        let step = Decimal::ONE
            .checked_add(oracle.reward_rate(Epoch(e)))
            .filter(|s| !s.is_sign_negative())
            .ok_or_else(|| StakeMatchError::Internal(format!("bad reward rate at epoch {e}")))?;
        factor = factor
            .checked_mul(step)
            .ok_or_else(|| StakeMatchError::Internal("compound factor overflow".into()))?;
    }
    Ok(factor)
}

const SPLIT: u128 = 1_000_000_000_000;

/// `floor(amount * fraction)` without losing the low digits of large
/// base-unit amounts.
///
/// The amount is split at 10^12 so each half fits a [`Decimal`] mantissa.
#[must_use]
pub fn scale_balance(amount: Balance, fraction: Decimal) -> Option<Balance> {
    let split = Decimal::from_u128(SPLIT)?;
    let hi = Decimal::from_u128(amount.0 / SPLIT)?.checked_mul(fraction)?;
    let lo = Decimal::from_u128(amount.0 % SPLIT)?.checked_mul(fraction)?;

    let hi_int = hi.trunc();
    let hi_frac = (hi - hi_int).checked_mul(split)?.trunc();

    let total = hi_int
        .to_u128()?
        .checked_mul(SPLIT)?
        .checked_add(hi_frac.to_u128()?)?
        .checked_add(lo.trunc().to_u128()?)?;
    Some(Balance(total))
}

fn grown(amount: Balance, factor: Decimal) -> Result<Balance> {
    if amount.is_zero() {
        return Ok(Balance::ZERO);
    }
    scale_balance(amount, factor - Decimal::ONE)
        .ok_or_else(|| StakeMatchError::Internal(format!("yield of {amount} out of range")))
}

/// Yield earned by one stake up to the oracle's current epoch.
///
/// # Errors
/// Returns `Internal` on arithmetic overflow.
pub fn stake_earning<O: RateOracle + ?Sized>(oracle: &O, input: &YieldInput) -> Result<StakeEarning> {
    let withdrawn = input.withdrawn.min(input.principal);
    let remaining = input.principal.saturating_sub(withdrawn);
    let from = input.deposit_epoch;

    if !input.earning {
        return Ok(StakeEarning {
            stake_id: input.stake_id.clone(),
            epochs: (from, from),
            yield_balance: Balance::ZERO,
            total_balance: remaining,
        });
    }

    let now = oracle.current_epoch().max(from);
    let live_factor = compound_factor(oracle, from, now)?;
    let live_yield = grown(remaining, live_factor)?;

    let (to, frozen_yield) = match input.exit_epoch {
        Some(exit) if !withdrawn.is_zero() => {
            let exit = exit.clamp(from, now);
            let frozen = grown(withdrawn, compound_factor(oracle, from, exit)?)?;
            let to = if remaining.is_zero() { exit } else { now };
            (to, frozen)
        }
        _ => (now, Balance::ZERO),
    };

    let yield_balance = live_yield
        .checked_add(frozen_yield)
        .ok_or_else(|| StakeMatchError::Internal("yield overflow".into()))?;
    let total_balance = remaining
        .checked_add(yield_balance)
        .ok_or_else(|| StakeMatchError::Internal("total balance overflow".into()))?;

    Ok(StakeEarning {
        stake_id: input.stake_id.clone(),
        epochs: (from, to),
        yield_balance,
        total_balance,
    })
}
