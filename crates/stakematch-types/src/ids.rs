//! Identifiers used throughout StakeMatch.
//!
//! Bet, stake, account and person identifiers are host-supplied strings and
//! serialize transparently. Correlation tokens are generated here (UUIDv7)
//! so that every settlement request is time-ordered and globally unique.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Host-supplied string identifiers
// ---------------------------------------------------------------------------

string_id!(
    /// Identifier of a bet. Client generated (nanoid alphabet, 21 chars).
    BetId
);

string_id!(
    /// Identifier of a single stake. Client generated, unique across the ledger.
    StakeId
);

string_id!(
    /// A host account: stakers, the owner, admins and staking pools.
    AccountId
);

string_id!(
    /// Content-addressed subject of a bet (e.g. an IPFS CID).
    /// Never a financial party.
    Person
);

string_id!(
    /// Identifier of a governance motion opened for a disputed bet.
    MotionId
);

// ---------------------------------------------------------------------------
// CorrelationToken
// ---------------------------------------------------------------------------

/// Idempotency key attached to every deposit / withdrawal request sent to the
/// staking pool. Confirmations are matched back to requests by this token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CorrelationToken(pub Uuid);

impl CorrelationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// First 8 hex chars, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tok:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Epoch
// ---------------------------------------------------------------------------

/// Staking pool accounting period. Monotonically increasing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Epoch {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Number of epochs from `earlier` to `self`, saturating at zero.
    #[must_use]
    pub fn since(self, earlier: Epoch) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// FillId
// ---------------------------------------------------------------------------

/// Identifier of one pairing between a Back and a Lay stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FillId(pub Uuid);

impl FillId {
    /// Deterministic `FillId` from the bet and the global fill sequence.
    ///
    /// Replaying the same stakes in the same order yields the same ids.
    #[must_use]
    pub fn deterministic(bet_id: &BetId, fill_sequence: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"stakematch:fill_id:v1:");
        hasher.update(bet_id.as_str().as_bytes());
        hasher.update(fill_sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fill:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_uniqueness() {
        let a = CorrelationToken::new();
        let b = CorrelationToken::new();
        assert_ne!(a, b);
    }

    #[test]
    fn token_ordering_follows_creation() {
        let a = CorrelationToken::new();
        let b = CorrelationToken::new();
        assert!(a < b);
    }

    #[test]
    fn token_short_is_eight_hex_chars() {
        let t = CorrelationToken::from_bytes([0xAB; 16]);
        assert_eq!(t.short(), "abababab");
    }

    #[test]
    fn epoch_next_and_since() {
        assert_eq!(Epoch(5).next(), Epoch(6));
        assert_eq!(Epoch(10).since(Epoch(4)), 6);
        assert_eq!(Epoch(3).since(Epoch(4)), 0);
    }

    #[test]
    fn fill_id_deterministic() {
        let bet = BetId::from("c5VA2k16PbQC_KeOAZTkR");
        assert_eq!(FillId::deterministic(&bet, 7), FillId::deterministic(&bet, 7));
        assert_ne!(FillId::deterministic(&bet, 7), FillId::deterministic(&bet, 8));
        let other = BetId::from("JixWNWsYXVacHF9sQsOFH");
        assert_ne!(FillId::deterministic(&bet, 7), FillId::deterministic(&other, 7));
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let id = StakeId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: StakeId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(serde_json::to_string(&Epoch(12)).unwrap(), "12");
    }
}
