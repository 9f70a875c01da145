//! # stakematch-exchange
//!
//! **Exchange plane**: the stateful side of StakeMatch. It owns the stake
//! ledger and bet registry, gates callers, and drives the matching engine
//! and the settlement coordinator.
//!
//! ## Architecture
//!
//! Every mutating entry point lives on [`Exchange`]:
//! 1. **StakeValidator**: id shape and minimum principal
//! 2. **BetRegistry**: lazily created bets, fixed by their first stake
//! 3. **StakeLedger**: stakes and fills, applied to both sides atomically
//! 4. **AccessControl**: owner, admins, stakers and pools
//! 5. **Views** and the **dispute hand-off** are read-only
//!
//! ## Stake Flow
//!
//! ```text
//! host → Exchange::new_stake → match_stake → StakeLedger
//!      → SettlementCoordinator::issue → StakePool (async)
//!      → Exchange::on_settlement_confirmed / on_settlement_failed
//! ```

pub mod access;
pub mod disputes;
pub mod exchange;
pub mod ledger;
pub mod query;
pub mod registry;
pub mod snapshot;
pub mod validation;

pub use access::AccessControl;
pub use exchange::{Exchange, ReconcileOutcome};
pub use ledger::StakeLedger;
pub use registry::{BetPlan, BetRegistry};
pub use snapshot::ExchangeSnapshot;
pub use validation::StakeValidator;
