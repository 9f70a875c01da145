//! Dispute hand-off to the governance module.
//!
//! An ended bet is settled by a vote among its stakers. The exchange only
//! prepares the motion (voters and quorum) and remembers the motion id the
//! governance module hands back; voting happens elsewhere.

use std::collections::BTreeSet;

use stakematch_settlement::{RateOracle, StakePool};
use stakematch_types::{AccountId, Bet, BetId, CallContext, MotionId, MotionRequest, Result};
use tracing::info;

use crate::Exchange;

impl<P: StakePool, O: RateOracle> Exchange<P, O> {
    /// One motion request per ended, undisputed bet in `bet_ids` that has
    /// stakes. Unknown and ineligible bets are skipped.
    #[must_use]
    pub fn check_bets(&self, ctx: &CallContext, bet_ids: &[BetId]) -> Vec<MotionRequest> {
        bet_ids
            .iter()
            .filter_map(|id| self.registry.find(id))
            .filter(|bet| bet.is_closed_at(ctx.block_timestamp) && !bet.is_disputed())
            .filter_map(|bet| {
                let voters: BTreeSet<&AccountId> =
                    self.ledger.for_bet(&bet.bet_id).map(|s| &s.staker).collect();
                if voters.is_empty() {
                    return None;
                }
                Some(MotionRequest {
                    bet_id: bet.bet_id.clone(),
                    quorum: voters.len() / 2 + 1,
                    voters: voters.into_iter().cloned().collect(),
                })
            })
            .collect()
    }

    /// Store the motion opened for a bet. Admin or owner.
    ///
    /// # Errors
    /// `PermissionDenied`, `BetNotFound`, or `Validation` if the bet already
    /// has a motion.
    pub fn record_motion(
        &mut self,
        ctx: &CallContext,
        bet_id: &BetId,
        motion_id: MotionId,
    ) -> Result<Bet> {
        self.access.require_privileged(ctx)?;
        let bet = self.registry.record_motion(bet_id, motion_id)?.clone();
        info!(bet_id = %bet_id, motion_id = ?bet.motion_id, "Motion recorded");
        Ok(bet)
    }
}
