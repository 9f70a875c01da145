//! Error types for the StakeMatch exchange.
//!
//! All errors use the `SM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Access control errors
//! - 3xx: Lookup errors
//! - 4xx: Bet lifecycle errors
//! - 5xx: Settlement state machine errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{BetId, CorrelationToken, StakeId, StakeStatus};

/// Central error enum for all StakeMatch operations.
#[derive(Debug, Error)]
pub enum StakeMatchError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The request failed validation (bad id, amount, end time, ...).
    #[error("SM_ERR_100: Validation failed: {reason}")]
    Validation { reason: String },

    /// A stake with this ID already exists.
    #[error("SM_ERR_101: Stake already exists: {0}")]
    DuplicateStake(StakeId),

    // =================================================================
    // Access Control Errors (2xx)
    // =================================================================
    /// The caller is not allowed to perform this operation.
    #[error("SM_ERR_200: Permission denied: {reason}")]
    PermissionDenied { reason: String },

    // =================================================================
    // Lookup Errors (3xx)
    // =================================================================
    #[error("SM_ERR_300: Bet not found: {0}")]
    BetNotFound(BetId),

    #[error("SM_ERR_301: Stake not found: {0}")]
    StakeNotFound(StakeId),

    /// A confirmation referenced a token that was never issued.
    #[error("SM_ERR_302: Settlement token not found: {0}")]
    TokenNotFound(CorrelationToken),

    // =================================================================
    // Bet Lifecycle Errors (4xx)
    // =================================================================
    /// The bet's end time has passed; no new stakes are accepted.
    #[error("SM_ERR_400: Bet closed: {bet_id} ended at {end}")]
    BetClosed { bet_id: BetId, end: u64 },

    // =================================================================
    // Settlement Errors (5xx)
    // =================================================================
    /// The stake is not in a state that allows this transition.
    #[error("SM_ERR_500: Invalid state transition for {stake_id}: {from} -> {to}")]
    InvalidStateTransition {
        stake_id: StakeId,
        from: StakeStatus,
        to: StakeStatus,
    },

    /// The pool has not confirmed the withdrawal yet.
    #[error("SM_ERR_501: Settlement pending for {stake_id} ({token})")]
    AsyncSettlementPending {
        stake_id: StakeId,
        token: CorrelationToken,
    },

    /// The withdrawal is confirmed but the pool's unbonding delay has not elapsed.
    #[error("SM_ERR_502: Refund locked for {stake_id}: {elapsed} of {required} epochs elapsed")]
    RefundLocked {
        stake_id: StakeId,
        elapsed: u64,
        required: u64,
    },

    /// A pool operation failed and the stake requires reconciliation.
    #[error("SM_ERR_503: Settlement fault for {stake_id}: {reason}")]
    SettlementFault { stake_id: StakeId, reason: String },

    /// Escrowed principal does not match what the pool holds.
    #[error("SM_ERR_504: Escrow invariant violation: {reason}")]
    EscrowInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Arithmetic overflow or other unrecoverable internal error.
    #[error("SM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("SM_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl StakeMatchError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Whether this error is one of the "not found" lookups.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BetNotFound(_) | Self::StakeNotFound(_) | Self::TokenNotFound(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, StakeMatchError>;

impl From<serde_json::Error> for StakeMatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
