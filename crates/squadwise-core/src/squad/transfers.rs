// Transfer planning: sell the weakest performer, buy the best affordable
// projection, but only when the projected gain clears the threshold.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use super::context::GameweekContext;
use super::position::Position;
use super::state::{Squad, SquadError};

/// The player suggested for sale.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOut {
    pub name: String,
    pub position: Position,
    /// Sale value at the current gameweek's listed price.
    pub price: f64,
}

/// The player suggested for purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferIn {
    pub name: String,
    pub price: f64,
    pub xp: f64,
}

/// An executed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub sold: String,
    pub bought: String,
    pub position: Position,
    pub gain: f64,
}

impl Squad {
    /// The squad member with the fewest actual points whose position and
    /// listed price both resolve. Bench players are included.
    pub fn suggest_transfer_out(&self, ctx: &GameweekContext) -> Option<TransferOut> {
        let mut pool: Vec<(&str, f64)> = self
            .all_players()
            .map(|(name, _)| (name, ctx.points(name)))
            .collect();
        pool.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        pool.into_iter().find_map(|(name, points)| {
            let position = ctx.position_of(name);
            let price = ctx.listed_price(name);
            match (position, price) {
                (Some(position), Some(price)) => Some(TransferOut {
                    name: name.to_string(),
                    position,
                    price,
                }),
                _ => {
                    debug!("skipping {} ({} pts): position or price unknown", name, points);
                    None
                }
            }
        })
    }

    /// The highest-projected player at `position` who costs at most
    /// `budget`, is not in the squad and fits under the club cap.
    pub fn suggest_transfer_in(
        &self,
        ctx: &GameweekContext,
        position: Position,
        budget: f64,
    ) -> Option<TransferIn> {
        let table = ctx.projections().table(position);
        let mut candidates: Vec<(String, f64)> = ctx
            .catalog()
            .players_at(position)
            .into_iter()
            .filter(|name| ctx.position_of(name) == Some(position))
            .filter_map(|name| table.get(&name).map(|xp| (name, xp)))
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        candidates.into_iter().find_map(|(name, xp)| {
            let price = ctx.price(&name)?;
            if price > budget || self.contains(&name) {
                return None;
            }
            if let Some(club) = self.violates_club_rule(ctx, &name) {
                debug!("skipping {}: {} is at the club cap", name, club);
                return None;
            }
            Some(TransferIn { name, price, xp })
        })
    }

    /// Sell `sold` and buy `bought` at `position`. Returns the bench to the
    /// XI first. On failure the squad is left exactly as it was.
    pub fn transfer(
        &mut self,
        ctx: &GameweekContext,
        sold: &str,
        bought: &str,
        position: Position,
    ) -> Result<(), SquadError> {
        let before = self.clone();
        self.return_bench();

        let held_at = self
            .position_in_squad(sold)
            .ok_or_else(|| SquadError::NotInBucket {
                player: sold.to_string(),
                position,
            })?;

        let result = self
            .remove_player(ctx, sold, held_at)
            .and_then(|_| self.add_player(ctx, bought, Some(position)));
        if let Err(e) = result {
            *self = before;
            return Err(e);
        }

        self.transfers_left = self.transfers_left.saturating_sub(1);
        Ok(())
    }

    /// Make up to the configured number of transfers, each only when the
    /// projected gain reaches the minimum. Skipped for void gameweeks and
    /// gameweeks without results.
    pub fn auto_transfer(&mut self, ctx: &GameweekContext) -> Vec<Transfer> {
        let mut made = Vec::new();
        if !ctx.results_available() {
            info!("GW{}: no results available, skipping transfers", ctx.gameweek());
            return made;
        }

        let settings = ctx.settings();
        for _ in 0..settings.transfers_per_gameweek {
            if self.transfers_left == 0 {
                break;
            }
            let Some(out) = self.suggest_transfer_out(ctx) else {
                break;
            };
            let budget = self.budget + out.price;
            let Some(incoming) = self.suggest_transfer_in(ctx, out.position, budget) else {
                debug!("no affordable replacement for {} with {:.1}", out.name, budget);
                break;
            };

            let gain = incoming.xp - ctx.xp(&out.name, out.position);
            if gain < settings.min_transfer_gain {
                debug!(
                    "{} -> {} gains {:.2} xP, below {:.2}",
                    out.name, incoming.name, gain, settings.min_transfer_gain
                );
                break;
            }

            if let Err(e) = self.transfer(ctx, &out.name, &incoming.name, out.position) {
                warn!("transfer {} -> {} failed: {}", out.name, incoming.name, e);
                break;
            }
            info!(
                "GW{} TRANSFER: {} ({:.1}) -> {} ({:.1}), +{:.2} xP",
                ctx.gameweek(),
                out.name,
                out.price,
                incoming.name,
                incoming.price,
                gain
            );
            made.push(Transfer {
                sold: out.name,
                bought: incoming.name,
                position: out.position,
                gain,
            });
        }

        made
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squad::test_support::{row, standard_squad, standard_world, World, SEASON};

    #[test]
    fn weakest_resolvable_player_is_sold() {
        let mut world = World::new();
        for (name, club) in [("A", "ARS"), ("B", "BHA"), ("C", "CHE"), ("D", "EVE"), ("Ghost", "FUL")] {
            world.rows.push(row(name, Position::Midfielder, Some(club), 1, 5.0, 1.0, 90));
            world.xp.push((Position::Midfielder, name.to_string(), 3.0));
        }
        for (name, points) in [("A", 2.0), ("B", 0.0), ("C", 5.0), ("D", 1.0)] {
            world.rows.push(row(name, Position::Midfielder, None, 2, 5.0, points, 90));
        }
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 2);

        let mut squad = Squad::new(SEASON, 2, 100.0, 1);
        for name in ["Ghost", "A", "B", "C", "D"] {
            squad.add_player(&ctx, name, None).unwrap();
        }

        // Ghost has no GW2 row: 0 points but no listed price.
        let out = squad.suggest_transfer_out(&ctx).unwrap();
        assert_eq!(
            out,
            TransferOut {
                name: "B".into(),
                position: Position::Midfielder,
                price: 5.0,
            }
        );
    }

    #[test]
    fn transfer_in_respects_budget_squad_and_clubs() {
        let mut world = standard_world();
        world
            .player("White", Position::Defender, Some("ARS"), 5.0, 9.0, 1.0)
            .player("Van Dijk", Position::Defender, Some("LIV"), 6.5, 8.0, 1.0)
            .player("Gvardiol", Position::Defender, Some("MCI"), 5.5, 6.0, 7.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let squad = standard_squad(&ctx);

        let pick = squad.suggest_transfer_in(&ctx, Position::Defender, 7.0).unwrap();
        assert_eq!(pick.name, "Van Dijk");
        let pick = squad.suggest_transfer_in(&ctx, Position::Defender, 6.0).unwrap();
        assert_eq!(pick.name, "Gvardiol");
        assert!(squad.suggest_transfer_in(&ctx, Position::Defender, 5.0).is_none());
    }

    #[test]
    fn auto_transfer_makes_two_worthwhile_swaps() {
        let mut world = standard_world();
        world
            .player("Gvardiol", Position::Defender, Some("MCI"), 5.5, 6.0, 7.0)
            .player("Solanke", Position::Forward, Some("BOU"), 6.0, 5.0, 3.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.transfers_left = 2;

        let made = squad.auto_transfer(&ctx);
        let swaps: Vec<(&str, &str)> = made
            .iter()
            .map(|t| (t.sold.as_str(), t.bought.as_str()))
            .collect();
        assert_eq!(swaps, vec![("Mitchell", "Gvardiol"), ("Archer", "Solanke")]);
        assert_eq!(squad.transfers_left(), 0);
        assert!((squad.budget() - 0.0).abs() < 1e-9);
        assert!(squad.is_complete());
        assert!(squad.check_max_from_same_club(&ctx).is_empty());
    }

    #[test]
    fn one_transfer_banked_means_one_swap() {
        let mut world = standard_world();
        world
            .player("Gvardiol", Position::Defender, Some("MCI"), 5.5, 6.0, 7.0)
            .player("Solanke", Position::Forward, Some("BOU"), 6.0, 5.0, 3.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        assert_eq!(squad.auto_transfer(&ctx).len(), 1);
        assert_eq!(squad.transfers_left(), 0);
        assert!(squad.auto_transfer(&ctx).is_empty());
    }

    #[test]
    fn gain_threshold_is_inclusive() {
        let mut world = standard_world();
        world.player("Gvardiol", Position::Defender, Some("MCI"), 5.5, 5.0, 7.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        assert_eq!(squad.auto_transfer(&ctx).len(), 1);

        let mut world = standard_world();
        world.player("Gvardiol", Position::Defender, Some("MCI"), 5.5, 4.9, 7.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        assert!(squad.auto_transfer(&ctx).is_empty());
        assert_eq!(squad.transfers_left(), 1);
    }

    #[test]
    fn no_transfers_without_results() {
        let mut world = standard_world();
        world.player("Gvardiol", Position::Defender, Some("MCI"), 5.5, 9.0, 7.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1).with_void(true);
        let mut squad = standard_squad(&ctx);

        assert!(squad.auto_transfer(&ctx).is_empty());
        assert_eq!(squad.transfers_left(), 1);
    }

    #[test]
    fn failed_transfer_leaves_squad_untouched() {
        let mut world = standard_world();
        world.player("White", Position::Defender, Some("ARS"), 4.0, 9.0, 1.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);
        let before = squad.clone();

        let err = squad
            .transfer(&ctx, "Trippier", "White", Position::Defender)
            .unwrap_err();
        assert!(matches!(err, SquadError::ClubLimit { .. }));
        assert_eq!(squad, before);
    }

    #[test]
    fn transferring_out_the_captain_clears_the_armband() {
        let mut world = standard_world();
        world.player("Palmer", Position::Midfielder, Some("CHE"), 6.0, 6.0, 1.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        squad
            .transfer(&ctx, "Salah", "Palmer", Position::Midfielder)
            .unwrap();
        assert_eq!(squad.captain(), None);
        assert_eq!(squad.vice_captain(), Some("Haaland"));
        assert!(squad.bench().is_empty());
        assert!((squad.budget() - 9.5).abs() < 1e-9);
    }
}
