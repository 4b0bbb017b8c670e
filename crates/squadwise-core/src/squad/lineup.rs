// Lineup selection: which four players sit on the bench, and who wears the
// armband.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use super::context::GameweekContext;
use super::position::Position;
use super::state::{BenchEntry, Squad, SquadError, BENCH_SIZE};

/// Outfield players of one position allowed on the bench.
const MAX_BENCHED_PER_POSITION: usize = 2;

fn by_xp_ascending(a: &(&str, f64), b: &(&str, f64)) -> Ordering {
    a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
}

impl Squad {
    /// Players at a position in the order they would hold after
    /// `return_bench`: the bucket first, then that position's bench entries.
    fn restored(&self, position: Position) -> Vec<&str> {
        self.players(position)
            .iter()
            .map(String::as_str)
            .chain(
                self.bench
                    .iter()
                    .filter(|b| b.position == position)
                    .map(|b| b.name.as_str()),
            )
            .collect()
    }

    /// Suggest a bench for the whole squad, as if every benched player had
    /// been returned first: the lowest-projected goalkeeper, then the
    /// lowest-projected outfielders with at most two from one position.
    pub fn suggest_bench(&self, ctx: &GameweekContext) -> Vec<BenchEntry> {
        let mut bench = Vec::with_capacity(BENCH_SIZE);

        let mut keepers: Vec<(&str, f64)> = self
            .restored(Position::Goalkeeper)
            .into_iter()
            .map(|name| (name, ctx.xp(name, Position::Goalkeeper)))
            .collect();
        keepers.sort_by(by_xp_ascending);
        if let Some((name, _)) = keepers.first() {
            bench.push(BenchEntry::new(*name, Position::Goalkeeper));
        }

        let mut outfield: Vec<(&str, f64, Position)> = Position::OUTFIELD
            .into_iter()
            .flat_map(|pos| {
                self.restored(pos)
                    .into_iter()
                    .map(move |name| (name, ctx.xp(name, pos), pos))
            })
            .collect();
        outfield.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let mut per_position = [0usize; 4];
        for (name, xp, pos) in outfield {
            if bench.len() >= BENCH_SIZE {
                break;
            }
            let slot = &mut per_position[pos as usize];
            if *slot >= MAX_BENCHED_PER_POSITION {
                debug!("{} not benched, two {} already on the bench", name, pos);
                continue;
            }
            *slot += 1;
            debug!("benching {} ({}) at {:.2} xP", name, pos, xp);
            bench.push(BenchEntry::new(name, pos));
        }

        bench
    }

    /// Return the current bench, then bench the given players.
    pub fn apply_bench(&mut self, entries: &[BenchEntry]) -> Result<(), SquadError> {
        self.return_bench();
        for entry in entries {
            if let Err(e) = self.bench_player(&entry.name, entry.position) {
                self.return_bench();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Pick and apply the projected-points bench. Incomplete squads only
    /// have their bench returned.
    pub fn auto_bench(&mut self, ctx: &GameweekContext) {
        self.return_bench();
        if !self.is_complete() {
            warn!(
                "squad has {} players, not selecting a bench",
                self.squad_size()
            );
            return;
        }
        let bench = self.suggest_bench(ctx);
        if let Err(e) = self.apply_bench(&bench) {
            warn!("could not apply suggested bench: {}", e);
            return;
        }
        let names: Vec<&str> = bench.iter().map(|b| b.name.as_str()).collect();
        info!("GW{} bench: {}", self.gameweek, names.join(", "));
    }

    /// Top two starters by projected points, as (captain, vice-captain).
    pub fn suggest_captaincy(&self, ctx: &GameweekContext) -> Option<(String, String)> {
        let mut starters: Vec<(&str, f64)> = self
            .starters()
            .map(|(name, pos)| (name, ctx.xp(name, pos)))
            .collect();
        starters.sort_by(|a, b| by_xp_ascending(b, a));
        match starters.as_slice() {
            [first, second, ..] => Some((first.0.to_string(), second.0.to_string())),
            _ => None,
        }
    }

    /// Recompute captaincy from the current starters.
    pub fn auto_captain(&mut self, ctx: &GameweekContext) {
        match self.suggest_captaincy(ctx) {
            Some((captain, vice)) => {
                debug!("captain {}, vice-captain {}", captain, vice);
                self.captain = Some(captain);
                self.vice_captain = Some(vice);
            }
            None => {
                self.captain = None;
                self.vice_captain = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squad::test_support::{standard_squad, standard_world, SEASON};

    fn names(bench: &[BenchEntry]) -> Vec<&str> {
        bench.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn bench_takes_lowest_keeper_and_three_outfielders() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        squad.auto_bench(&ctx);
        assert_eq!(names(squad.bench()), vec!["Steele", "Archer", "Konsa", "Mitchell"]);
        assert_eq!(squad.xi_size(), 11);
        assert_eq!(squad.squad_size(), 15);
        assert!((squad.budget() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn at_most_two_outfielders_per_position() {
        let mut world = standard_world();
        world.set_xp("Trippier", 1.2).set_xp("Archer", 6.0);
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        // Three defenders project lowest; only two may sit.
        let bench = squad.suggest_bench(&ctx);
        assert_eq!(names(&bench), vec!["Steele", "Trippier", "Konsa", "Eze"]);

        squad.auto_bench(&ctx);
        assert_eq!(squad.players(Position::Defender).len(), 3);
    }

    #[test]
    fn suggestion_ignores_the_current_bench() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        squad.bench_player("Salah", Position::Midfielder).unwrap();
        squad.bench_player("Raya", Position::Goalkeeper).unwrap();
        let bench = squad.suggest_bench(&ctx);
        assert_eq!(names(&bench), vec!["Steele", "Archer", "Konsa", "Mitchell"]);

        squad.auto_bench(&ctx);
        assert!(!squad.is_benched("Salah"));
        assert_eq!(squad.bench().len(), 4);
    }

    #[test]
    fn rebenching_is_idempotent() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        squad.auto_bench(&ctx);
        let first = squad.bench().to_vec();
        squad.auto_bench(&ctx);
        assert_eq!(squad.bench(), first.as_slice());
    }

    #[test]
    fn incomplete_squad_gets_no_bench() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = Squad::new(SEASON, 1, 100.0, 1);
        squad.add_player(&ctx, "Raya", None).unwrap();
        squad.add_player(&ctx, "Steele", None).unwrap();

        squad.auto_bench(&ctx);
        assert!(squad.bench().is_empty());
    }

    #[test]
    fn captaincy_goes_to_top_two_starters() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        squad.auto_bench(&ctx);
        squad.auto_captain(&ctx);
        assert_eq!(squad.captain(), Some("Salah"));
        assert_eq!(squad.vice_captain(), Some("Haaland"));

        squad
            .apply_bench(&[
                BenchEntry::new("Steele", Position::Goalkeeper),
                BenchEntry::new("Salah", Position::Midfielder),
            ])
            .unwrap();
        squad.auto_captain(&ctx);
        assert_eq!(squad.captain(), Some("Haaland"));
        assert_eq!(squad.vice_captain(), Some("Son"));
    }

    #[test]
    fn apply_bench_rolls_back_on_unknown_player() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        let err = squad
            .apply_bench(&[
                BenchEntry::new("Steele", Position::Goalkeeper),
                BenchEntry::new("Salah", Position::Forward),
            ])
            .unwrap_err();
        assert!(matches!(err, SquadError::NotInBucket { .. }));
        assert!(squad.bench().is_empty());
        assert_eq!(squad.xi_size(), 15);
    }
}
