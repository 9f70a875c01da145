//! Fill digests for audit and replay verification.
//!
//! Replaying the same stakes in the same order must produce the exact same
//! fills. The `fill_root` is a SHA-256 digest over an ordered fill list so
//! that two ledgers can be compared without diffing every row.

use sha2::{Digest, Sha256};
use stakematch_types::Fill;

/// Compute the digest of a fill list.
///
/// Depends on fill ids, sequences, both stake ids, amounts and the unwound
/// flag, in order.
#[must_use]
pub fn compute_fill_root(fills: &[Fill]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"stakematch:fill_root:v1:");
    hasher.update((fills.len() as u64).to_le_bytes());

    for fill in fills {
        hasher.update(fill.id.0.as_bytes());
        hasher.update(fill.sequence.to_le_bytes());
        hasher.update(fill.bet_id.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(fill.back_stake.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(fill.lay_stake.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(fill.amount.0.to_le_bytes());
        hasher.update([u8::from(fill.unwound)]);
    }

    hasher.finalize().into()
}

/// Check a fill list against a digest recorded earlier.
#[must_use]
pub fn verify_fill_root(fills: &[Fill], expected_root: &[u8; 32]) -> bool {
    compute_fill_root(fills) == *expected_root
}

/// Hex rendering used in logs and views.
#[must_use]
pub fn fill_root_hex(root: &[u8; 32]) -> String {
    hex::encode(root)
}

#[cfg(test)]
mod tests {
    use stakematch_types::{Balance, BetId, FillId, StakeId};

    use super::*;

    fn make_fill(seq: u64, amount: u128) -> Fill {
        let bet_id = BetId::from("bet");
        Fill {
            id: FillId::deterministic(&bet_id, seq),
            sequence: seq,
            bet_id,
            back_stake: StakeId::from("back"),
            lay_stake: StakeId::from("lay"),
            taker_stake: StakeId::from("lay"),
            amount: Balance(amount),
            unwound: false,
        }
    }

    #[test]
    fn empty_fills_deterministic() {
        assert_eq!(compute_fill_root(&[]), compute_fill_root(&[]));
    }

    #[test]
    fn different_amounts_different_root() {
        assert_ne!(
            compute_fill_root(&[make_fill(0, 1)]),
            compute_fill_root(&[make_fill(0, 2)])
        );
    }

    #[test]
    fn order_matters() {
        let a = make_fill(0, 1);
        let b = make_fill(1, 1);
        assert_ne!(
            compute_fill_root(&[a.clone(), b.clone()]),
            compute_fill_root(&[b, a]),
            "Order of fills must affect the root"
        );
    }

    #[test]
    fn verify_roundtrip() {
        let fills = vec![make_fill(0, 5), make_fill(1, 3)];
        let root = compute_fill_root(&fills);
        assert!(verify_fill_root(&fills, &root));
        assert!(!verify_fill_root(&fills, &[0xAB; 32]));
        assert_eq!(fill_root_hex(&root).len(), 64);
    }
}
