//! # stakematch-matchcore
//!
//! **Pure FIFO matching engine for StakeMatch.**
//!
//! MatchCore pairs an incoming stake with resting stakes on the opposite
//! side of the same bet and returns the fills. It has:
//!
//! - **Zero side effects**: no ledger writes, no pool calls
//! - **Strict time priority**: candidates are consumed in creation order
//! - **Partial fills**: each pairing takes `min` of both remainders
//! - **Audit digests**: every outcome carries a SHA-256 fill root

pub mod determinism;
pub mod matcher;
pub mod queue;

pub use determinism::{compute_fill_root, fill_root_hex, verify_fill_root};
pub use matcher::{MatchOrder, MatchOutcome, match_stake};
pub use queue::{CandidateQueue, MatchCandidate};
