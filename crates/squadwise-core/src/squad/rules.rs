// Constraint checks run before every roster mutation: position capacity,
// budget and the per-club cap.

use std::collections::BTreeMap;

use tracing::warn;

use crate::catalog::Club;

use super::context::GameweekContext;
use super::position::Position;
use super::state::{Squad, SquadError};

/// Per-club player counts checked against a cap. Players with no known
/// club are never counted and never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ClubCounts {
    cap: usize,
    counts: BTreeMap<Club, usize>,
}

impl ClubCounts {
    pub fn new(cap: usize) -> Self {
        ClubCounts {
            cap,
            counts: BTreeMap::new(),
        }
    }

    /// Counts over every squad member, bench included, recomputed from the
    /// squad's current holdings.
    pub fn from_squad(squad: &Squad, ctx: &GameweekContext) -> Self {
        let mut counts = ClubCounts::new(ctx.settings().club_cap);
        for (name, _) in squad.all_players() {
            counts.record(ctx.club(name).as_ref());
        }
        counts
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn count(&self, club: &Club) -> usize {
        self.counts.get(club).copied().unwrap_or(0)
    }

    /// Count a player from `club` if that keeps the club within the cap.
    /// Returns false and leaves the counts untouched otherwise.
    pub fn try_admit(&mut self, club: Option<&Club>) -> bool {
        let Some(club) = club else {
            return true;
        };
        if self.count(club) + 1 > self.cap {
            return false;
        }
        self.record(Some(club));
        true
    }

    /// Count a player unconditionally.
    pub fn record(&mut self, club: Option<&Club>) {
        if let Some(club) = club {
            *self.counts.entry(club.clone()).or_insert(0) += 1;
        }
    }

    /// Clubs whose count is above the cap, alphabetically.
    pub fn over_cap(&self) -> Vec<(Club, usize)> {
        self.counts
            .iter()
            .filter(|(_, n)| **n > self.cap)
            .map(|(club, &n)| (club.clone(), n))
            .collect()
    }
}

impl Squad {
    /// Resolve the player's club and admit it into `counts`.
    pub fn validate_club(
        &self,
        ctx: &GameweekContext,
        player: &str,
        counts: &mut ClubCounts,
    ) -> bool {
        let club = ctx.club(player);
        let admitted = counts.try_admit(club.as_ref());
        if !admitted {
            if let Some(club) = club {
                warn!(
                    "cannot add {}, {} already has {} players",
                    player,
                    club,
                    counts.cap()
                );
            }
        }
        admitted
    }

    /// The club that adding `player` would push over the cap, if any.
    pub fn violates_club_rule(&self, ctx: &GameweekContext, player: &str) -> Option<Club> {
        let mut counts = ClubCounts::from_squad(self, ctx);
        let club = ctx.club(player)?;
        if counts.try_admit(Some(&club)) {
            None
        } else {
            Some(club)
        }
    }

    /// Check that `player` can join at `position`. Returns the market price
    /// the player would cost.
    pub fn can_add(
        &self,
        ctx: &GameweekContext,
        player: &str,
        position: Position,
    ) -> Result<f64, SquadError> {
        if self.contains(player) {
            return Err(SquadError::AlreadyInSquad {
                player: player.to_string(),
            });
        }

        let capacity = position.capacity();
        if self.holdings(position) >= capacity {
            warn!("{} already has {} players, cannot add {}", position, capacity, player);
            return Err(SquadError::PositionFull { position, capacity });
        }

        let price = ctx.price(player).ok_or_else(|| SquadError::MissingPrice {
            player: player.to_string(),
            gameweek: ctx.gameweek(),
        })?;
        if price > self.budget {
            warn!(
                "cannot afford {} at {:.1} with {:.1} left",
                player, price, self.budget
            );
            return Err(SquadError::OverBudget {
                player: player.to_string(),
                price,
                budget: self.budget,
            });
        }

        let mut counts = ClubCounts::from_squad(self, ctx);
        if !self.validate_club(ctx, player, &mut counts) {
            if let Some(club) = ctx.club(player) {
                return Err(SquadError::ClubLimit {
                    player: player.to_string(),
                    club,
                    cap: counts.cap(),
                });
            }
        }

        Ok(price)
    }

    /// Club counts for the whole squad, bench included.
    pub fn club_counts(&self, ctx: &GameweekContext) -> ClubCounts {
        ClubCounts::from_squad(self, ctx)
    }

    /// Audit the whole squad for clubs over the cap. Returns the offending
    /// clubs; an empty list means the squad is legal.
    pub fn check_max_from_same_club(&self, ctx: &GameweekContext) -> Vec<(Club, usize)> {
        let over = self.club_counts(ctx).over_cap();
        for (club, n) in &over {
            warn!("{} has {} players in the squad", club, n);
        }
        over
    }
}
