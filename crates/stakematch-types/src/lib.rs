//! # stakematch-types
//!
//! Shared types, errors, and configuration for the **StakeMatch** wager
//! exchange.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`BetId`], [`StakeId`], [`AccountId`], [`Person`], [`MotionId`], [`CorrelationToken`], [`Epoch`], [`FillId`]
//! - **Amounts**: [`Balance`] (base-unit `u128`, decimal-string on the wire)
//! - **Bet model**: [`Bet`], [`Position`], [`Prediction`]
//! - **Stake model**: [`Stake`], [`StakeStatus`]
//! - **Fill model**: [`Fill`]
//! - **Settlement model**: [`SettlementRequest`], [`SettlementKind`], [`SettlementPhase`]
//! - **Payouts**: [`Payout`], [`PayoutReason`]
//! - **Exchange state**: [`Metadata`], [`CallContext`], [`ExchangeConfig`]
//! - **Views**: [`CancelStatus`], [`ConfirmationOutcome`], [`StakeEarning`], [`SettlementStatus`], [`Page`], [`BetFilter`]
//! - **Errors**: [`StakeMatchError`] with `SM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod bet;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod fill;
pub mod ids;
pub mod metadata;
pub mod payout;
pub mod settlement;
pub mod stake;
pub mod view;

// Re-export all primary types at crate root for ergonomic imports:
//   use stakematch_types::{Stake, StakeStatus, Balance, ...};

pub use balance::*;
pub use bet::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use fill::*;
pub use ids::*;
pub use metadata::*;
pub use payout::*;
pub use settlement::*;
pub use stake::*;
pub use view::*;

// Constants are accessed via `stakematch_types::constants::FOO`.
