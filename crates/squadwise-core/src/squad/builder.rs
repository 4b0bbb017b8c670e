// Initial squad construction: a two-tranche greedy pick per position.
//
// The premium tranche spends a per-position sub-budget on the highest
// projections. The value tranche fills the rest of the position with the
// lowest projections that still clear a floor, ignoring price.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::context::GameweekContext;
use super::position::{Position, PositionMap};
use super::rules::ClubCounts;
use super::state::{Squad, SquadError, SQUAD_SIZE};

/// Positions in the order the builder fills them.
pub const BUILD_ORDER: [Position; 4] = [
    Position::Forward,
    Position::Midfielder,
    Position::Defender,
    Position::Goalkeeper,
];

/// Premium picks and their sub-budget for one position.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Tranche {
    pub premium: usize,
    pub budget: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    pub tranches: PositionMap<Tranche>,
}

impl Default for BuildPlan {
    fn default() -> Self {
        BuildPlan {
            tranches: PositionMap {
                gk: Tranche {
                    premium: 1,
                    budget: 5.0,
                },
                def: Tranche {
                    premium: 2,
                    budget: 11.0,
                },
                mid: Tranche {
                    premium: 2,
                    budget: 20.0,
                },
                fwd: Tranche {
                    premium: 2,
                    budget: 22.0,
                },
            },
        }
    }
}

/// Projected players at a position whose resolved position matches, in
/// table order.
fn candidates<'c>(ctx: &'c GameweekContext, position: Position) -> Vec<(&'c str, f64)> {
    ctx.projections()
        .table(position)
        .rows()
        .iter()
        .filter(|(name, _)| ctx.position_of(name) == Some(position))
        .map(|(name, xp)| (name.as_str(), *xp))
        .collect()
}

/// Highest projections first, up to `tranche.premium` players that fit in
/// the remaining sub-budget and pass the running club counts.
pub fn premium_tranche(
    ctx: &GameweekContext,
    position: Position,
    tranche: Tranche,
    counts: &mut ClubCounts,
    chosen: &HashSet<String>,
) -> Vec<String> {
    let mut pool = candidates(ctx, position);
    pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut picked = Vec::with_capacity(tranche.premium);
    let mut remaining = tranche.budget;
    for (name, xp) in pool {
        if picked.len() >= tranche.premium {
            break;
        }
        if chosen.contains(name) || picked.iter().any(|p| p == name) {
            continue;
        }
        let Some(price) = ctx.price(name) else {
            continue;
        };
        if price > remaining {
            continue;
        }
        if !counts.try_admit(ctx.club(name).as_ref()) {
            debug!("premium {}: {} blocked by club cap", position, name);
            continue;
        }
        debug!("premium {}: {} at {:.1} ({:.2} xP)", position, name, price, xp);
        remaining -= price;
        picked.push(name.to_string());
    }

    if picked.len() < tranche.premium {
        warn!(
            "premium {} tranche found {} of {} players",
            position,
            picked.len(),
            tranche.premium
        );
    }
    picked
}

/// Lowest projections first (at least `min_xp`), `count` players not yet
/// chosen. Club checks are recomputed from `base` alone; price is ignored.
pub fn value_tranche(
    ctx: &GameweekContext,
    base: &Squad,
    position: Position,
    count: usize,
    min_xp: f64,
    chosen: &HashSet<String>,
) -> Vec<String> {
    let mut pool = candidates(ctx, position);
    pool.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut picked = Vec::with_capacity(count);
    for (name, xp) in pool {
        if picked.len() >= count {
            break;
        }
        if xp < min_xp || chosen.contains(name) || base.contains(name) {
            continue;
        }
        if base.violates_club_rule(ctx, name).is_some() {
            continue;
        }
        debug!("value {}: {} ({:.2} xP)", position, name, xp);
        picked.push(name.to_string());
    }
    picked
}

impl Squad {
    /// Build a full squad on top of `self` (normally empty). Returns the new
    /// squad, or `BuildFailed` if the picks do not make a legal, affordable
    /// fifteen.
    pub fn build(&self, ctx: &GameweekContext, plan: &BuildPlan) -> Result<Squad, SquadError> {
        let min_xp = ctx.settings().value_tranche_min_xp;
        let mut chosen: HashSet<String> = HashSet::new();
        let mut picks: Vec<(String, Position)> = Vec::with_capacity(SQUAD_SIZE);

        for position in BUILD_ORDER {
            // Recount every pick so far, value picks included.
            let mut counts = ClubCounts::new(ctx.settings().club_cap);
            for (name, _) in &picks {
                counts.record(ctx.club(name).as_ref());
            }

            let tranche = *plan.tranches.get(position);
            let premium = premium_tranche(ctx, position, tranche, &mut counts, &chosen);
            chosen.extend(premium.iter().cloned());

            // A premium shortfall is made up here.
            let remainder = position.capacity().saturating_sub(premium.len());
            let value = value_tranche(ctx, self, position, remainder, min_xp, &chosen);
            chosen.extend(value.iter().cloned());

            picks.extend(
                premium
                    .into_iter()
                    .chain(value)
                    .map(|name| (name, position)),
            );
        }

        let mut squad = self.clone();
        for (name, position) in &picks {
            if let Err(e) = squad.add_player(ctx, name, Some(*position)) {
                warn!("builder could not add {}: {}", name, e);
            }
        }

        if squad.squad_size() != SQUAD_SIZE || squad.budget() < 0.0 {
            warn!(
                "squad construction failed: {} players, {:.1} budget left",
                squad.squad_size(),
                squad.budget()
            );
            return Err(SquadError::BuildFailed {
                size: squad.squad_size(),
                budget: squad.budget(),
            });
        }

        info!(
            "built GW{} squad, {:.1} budget left",
            squad.gameweek(),
            squad.budget()
        );
        Ok(squad)
    }
}
