//! Confirmation idempotency guard — a pool answer is applied at most once.
//!
//! The staking pool delivers confirmations at least once. Each settlement
//! request carries a unique [`CorrelationToken`]; the guard remembers the
//! tokens that were already resolved so a replayed confirmation becomes a
//! no-op instead of a second state change.
//!
//! The guard keeps a bounded LRU-style cache so memory stays predictable in
//! long-running exchanges. Evicted tokens are still caught by the request
//! table, whose phases are terminal once resolved.

use std::collections::{HashSet, VecDeque};

use stakematch_types::{CorrelationToken, Result, StakeMatchError};

pub struct IdempotencyGuard {
    resolved: HashSet<CorrelationToken>,
    /// Insertion order for eviction (front = oldest).
    order: VecDeque<CorrelationToken>,
    max_size: usize,
}

impl IdempotencyGuard {
    /// # Errors
    /// Returns `Configuration` if `max_size` is zero.
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(StakeMatchError::Configuration(
                "idempotency cache size must be > 0".into(),
            ));
        }
        Ok(Self {
            resolved: HashSet::new(),
            order: VecDeque::new(),
            max_size,
        })
    }

    /// Record `token` as resolved. Returns `false` if it already was.
    pub fn mark_resolved(&mut self, token: CorrelationToken) -> bool {
        if self.resolved.contains(&token) {
            return false;
        }

        if self.resolved.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.resolved.remove(&oldest);
            }
        }

        self.resolved.insert(token);
        self.order.push_back(token);
        true
    }

    pub fn is_resolved(&self, token: &CorrelationToken) -> bool {
        self.resolved.contains(token)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(n: u8) -> CorrelationToken {
        CorrelationToken::from_bytes([n; 16])
    }

    #[test]
    fn first_resolution_accepted() {
        let mut guard = IdempotencyGuard::new(100).unwrap();
        assert!(guard.mark_resolved(token(1)));
        assert!(guard.is_resolved(&token(1)));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn replay_detected() {
        let mut guard = IdempotencyGuard::new(100).unwrap();
        assert!(guard.mark_resolved(token(1)));
        assert!(!guard.mark_resolved(token(1)));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn evicts_oldest() {
        let mut guard = IdempotencyGuard::new(3).unwrap();
        for n in 1..=3 {
            guard.mark_resolved(token(n));
        }
        guard.mark_resolved(token(4));
        assert_eq!(guard.len(), 3);
        assert!(!guard.is_resolved(&token(1)), "oldest token should be evicted");
        assert!(guard.is_resolved(&token(2)));
        assert!(guard.is_resolved(&token(4)));
    }

    #[test]
    fn empty_guard() {
        let guard = IdempotencyGuard::new(10).unwrap();
        assert!(guard.is_empty());
        assert!(!guard.is_resolved(&CorrelationToken::new()));
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(
            IdempotencyGuard::new(0),
            Err(StakeMatchError::Configuration(_))
        ));
    }
}
