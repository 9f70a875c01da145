//! Bet model: what is being wagered on, about whom, and until when.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BetId, MotionId, Person};

/// The outcome a bet predicts about its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prediction {
    Reduction,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reduction => write!(f, "REDUCTION"),
        }
    }
}

/// Side of a two-outcome wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Position {
    /// For the prediction.
    Back,
    /// Against the prediction.
    Lay,
}

impl Position {
    /// The side a stake in this position is matched against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Back => Self::Lay,
            Self::Lay => Self::Back,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Back => write!(f, "BACK"),
            Self::Lay => write!(f, "LAY"),
        }
    }
}

/// A bet groups every stake sharing a `bet_id`.
///
/// Created lazily by the first stake that names an unseen `bet_id`; that
/// stake fixes the person, prediction and end for all later stakes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: BetId,
    pub person: Person,
    pub prediction: Prediction,
    /// Close time, nanoseconds since the UNIX epoch.
    pub end: u64,
    /// Whether the creating stake opted out of automatic matching.
    pub gentlemans: bool,
    /// Host block timestamp (ns) of the creating stake.
    pub created_at: u64,
    /// Governance motion opened to resolve this bet, if any.
    pub motion_id: Option<MotionId>,
}

impl Bet {
    /// A bet is closed once the host clock reaches its end.
    #[must_use]
    pub fn is_closed_at(&self, now_ns: u64) -> bool {
        now_ns >= self.end
    }

    #[must_use]
    pub fn is_disputed(&self) -> bool {
        self.motion_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bet(end: u64) -> Bet {
        Bet {
            bet_id: BetId::from("c5VA2k16PbQC_KeOAZTkR"),
            person: Person::from("bafybeihdzk6jvzkt2d3ekxkpkgdvtl3zryzeotsdlku7my6tncxxlyx3my"),
            prediction: Prediction::Reduction,
            end,
            gentlemans: false,
            created_at: 0,
            motion_id: None,
        }
    }

    #[test]
    fn position_opposite() {
        assert_eq!(Position::Back.opposite(), Position::Lay);
        assert_eq!(Position::Lay.opposite(), Position::Back);
    }

    #[test]
    fn closed_at_end() {
        let bet = make_bet(100);
        assert!(!bet.is_closed_at(99));
        assert!(bet.is_closed_at(100));
        assert!(bet.is_closed_at(101));
    }

    #[test]
    fn wire_names_match_client_literals() {
        assert_eq!(serde_json::to_string(&Position::Lay).unwrap(), "\"Lay\"");
        assert_eq!(
            serde_json::to_string(&Prediction::Reduction).unwrap(),
            "\"Reduction\""
        );
        assert!(serde_json::from_str::<Position>("\"Sideways\"").is_err());
    }
}
