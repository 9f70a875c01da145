//! Bet registry: bets keyed by id, created lazily by their first stake.
//!
//! The first stake on a bet fixes its person, prediction and end. Later
//! stakes must name the same person and prediction; the end they pass is
//! ignored. Resolution is split into `prepare` (pure) and `commit` so a
//! rejected stake never leaves a half-created bet behind.

use std::collections::{HashMap, HashSet};

use stakematch_types::{Bet, BetId, MotionId, NewStake, Person, Result, StakeMatchError};

/// A bet resolved for an incoming stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetPlan {
    pub bet: Bet,
    /// Not yet in the registry; `commit` inserts it.
    pub is_new: bool,
}

#[derive(Debug, Default)]
pub struct BetRegistry {
    bets: Vec<Bet>,
    index: HashMap<BetId, usize>,
    /// Subjects in first-seen order.
    persons: Vec<Person>,
    known_persons: HashSet<Person>,
}

impl BetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `Serialization` if a bet id repeats.
    pub fn restore(bets: Vec<Bet>, persons: Vec<Person>) -> Result<Self> {
        let mut registry = Self::new();
        for bet in bets {
            if registry.index.contains_key(&bet.bet_id) {
                return Err(StakeMatchError::Serialization(format!(
                    "duplicate bet {} in snapshot",
                    bet.bet_id
                )));
            }
            registry.index.insert(bet.bet_id.clone(), registry.bets.len());
            registry.bets.push(bet);
        }
        for person in persons {
            registry.remember(person);
        }
        Ok(registry)
    }

    /// Resolve the bet a stake refers to without mutating anything.
    ///
    /// # Errors
    /// - `BetClosed` if the bet (or the requested end of a new bet) has passed
    /// - `Validation` if person or prediction disagree with the existing bet,
    ///   or a new bet ends sooner than `now + min_duration_ns`
    pub fn prepare(&self, req: &NewStake, now: u64, min_duration_ns: u64) -> Result<BetPlan> {
        if let Some(bet) = self.find(&req.bet_id) {
            if bet.person != req.person {
                return Err(StakeMatchError::validation(format!(
                    "bet {} is about {}, not {}",
                    bet.bet_id, bet.person, req.person
                )));
            }
            if bet.prediction != req.prediction {
                return Err(StakeMatchError::validation(format!(
                    "bet {} predicts {}, not {}",
                    bet.bet_id, bet.prediction, req.prediction
                )));
            }
            if bet.is_closed_at(now) {
                return Err(StakeMatchError::BetClosed {
                    bet_id: bet.bet_id.clone(),
                    end: bet.end,
                });
            }
            return Ok(BetPlan {
                bet: bet.clone(),
                is_new: false,
            });
        }

        if req.end <= now {
            return Err(StakeMatchError::BetClosed {
                bet_id: req.bet_id.clone(),
                end: req.end,
            });
        }
        let soonest_end = now.saturating_add(min_duration_ns);
        if req.end <= soonest_end {
            return Err(StakeMatchError::validation(format!(
                "end {} <= {soonest_end}",
                req.end
            )));
        }

        Ok(BetPlan {
            bet: Bet {
                bet_id: req.bet_id.clone(),
                person: req.person.clone(),
                prediction: req.prediction,
                end: req.end,
                gentlemans: req.gentlemans,
                created_at: now,
                motion_id: None,
            },
            is_new: true,
        })
    }

    /// Insert a prepared bet if it is new.
    pub fn commit(&mut self, plan: &BetPlan) {
        if !plan.is_new || self.index.contains_key(&plan.bet.bet_id) {
            return;
        }
        self.remember(plan.bet.person.clone());
        self.index.insert(plan.bet.bet_id.clone(), self.bets.len());
        self.bets.push(plan.bet.clone());
    }

    fn remember(&mut self, person: Person) {
        if self.known_persons.insert(person.clone()) {
            self.persons.push(person);
        }
    }

    #[must_use]
    pub fn find(&self, bet_id: &BetId) -> Option<&Bet> {
        self.index.get(bet_id).map(|&i| &self.bets[i])
    }

    /// # Errors
    /// Returns `BetNotFound` for an unknown id.
    pub fn get(&self, bet_id: &BetId) -> Result<&Bet> {
        self.find(bet_id)
            .ok_or_else(|| StakeMatchError::BetNotFound(bet_id.clone()))
    }

    /// Attach the governance motion opened for a bet.
    ///
    /// # Errors
    /// Returns `BetNotFound`, or `Validation` if a motion is already attached.
    pub fn record_motion(&mut self, bet_id: &BetId, motion_id: MotionId) -> Result<&Bet> {
        let i = *self
            .index
            .get(bet_id)
            .ok_or_else(|| StakeMatchError::BetNotFound(bet_id.clone()))?;
        let bet = &mut self.bets[i];
        if let Some(existing) = &bet.motion_id {
            return Err(StakeMatchError::validation(format!(
                "bet {bet_id} already has motion {existing}"
            )));
        }
        bet.motion_id = Some(motion_id);
        Ok(bet)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bet> {
        self.bets.iter()
    }

    #[must_use]
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }
}
