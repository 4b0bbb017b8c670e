// Gameweek scoring, in two phases: `finalize_*` settles the lineup for the
// gameweek, then the `*_total` functions read the squad without changing it.

use serde::Serialize;
use tracing::warn;

use super::chips::Chip;
use super::context::GameweekContext;
use super::position::Position;
use super::state::{Squad, SQUAD_SIZE};

/// One player's contribution to a gameweek score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerScore {
    pub name: String,
    pub position: Position,
    /// Unmultiplied points.
    pub points: f64,
    pub captain: bool,
}

impl PlayerScore {
    /// Name with a `(C)` marker for the captain.
    pub fn label(&self) -> String {
        if self.captain {
            format!("{} (C)", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl Squad {
    /// 3 with Triple Captain active, otherwise 2.
    pub fn captain_multiplier(&self) -> f64 {
        if self.chips.is_active(Chip::TripleCaptain) {
            3.0
        } else {
            2.0
        }
    }

    fn bench_counts(&self) -> bool {
        self.chips.is_active(Chip::BenchBoost)
    }

    fn counted_players(&self, include_bench: bool) -> Vec<(&str, Position)> {
        let mut players: Vec<(&str, Position)> = self.starters().collect();
        if include_bench {
            players.extend(self.bench.iter().map(|b| (b.name.as_str(), b.position)));
        }
        players
    }

    fn score_with(&self, include_bench: bool, points: impl Fn(&str, Position) -> f64) -> f64 {
        let captain = self.captain.as_deref();
        let multiplier = self.captain_multiplier();
        self.counted_players(include_bench)
            .into_iter()
            .map(|(name, pos)| {
                let p = points(name, pos);
                if Some(name) == captain {
                    p * multiplier
                } else {
                    p
                }
            })
            .sum()
    }

    fn breakdown_with(
        &self,
        include_bench: bool,
        points: impl Fn(&str, Position) -> f64,
    ) -> Vec<PlayerScore> {
        let captain = self.captain.as_deref();
        self.counted_players(include_bench)
            .into_iter()
            .map(|(name, position)| PlayerScore {
                name: name.to_string(),
                position,
                points: points(name, position),
                captain: Some(name) == captain,
            })
            .collect()
    }

    fn scoreable(&self, ctx: &GameweekContext) -> bool {
        if !self.is_complete() {
            warn!(
                "squad has {} of {} players, scoring 0",
                self.squad_size(),
                SQUAD_SIZE
            );
            return false;
        }
        if ctx.is_void() {
            warn!("GW{} is void, scoring 0", ctx.gameweek());
            return false;
        }
        true
    }

    // -- Phase one: settle the lineup --

    /// Select the bench and captaincy from projections.
    pub fn finalize_projected(&mut self, ctx: &GameweekContext) {
        self.auto_bench(ctx);
        self.auto_captain(ctx);
    }

    /// `finalize_projected`, then substitute starters who did not appear
    /// and pick captaincy again from the reconciled XI.
    pub fn finalize_results(&mut self, ctx: &GameweekContext) {
        self.finalize_projected(ctx);
        if ctx.results_available() {
            self.reconcile(ctx);
            self.auto_captain(ctx);
        }
    }

    // -- Phase two: pure totals --

    /// Projected points of the XI (plus the bench when asked), with the
    /// captain multiplier applied once.
    pub fn projected_points(&self, ctx: &GameweekContext, include_bench: bool) -> f64 {
        self.score_with(include_bench, |name, pos| ctx.xp(name, pos))
    }

    /// Actual points of the XI (plus the bench when asked), with the
    /// captain multiplier applied once.
    pub fn actual_points(&self, ctx: &GameweekContext, include_bench: bool) -> f64 {
        self.score_with(include_bench, |name, _| ctx.points(name))
    }

    /// Projected gameweek total. Bench counts only under Bench Boost.
    pub fn projected_total(&self, ctx: &GameweekContext) -> f64 {
        if !self.scoreable(ctx) {
            return 0.0;
        }
        self.projected_points(ctx, self.bench_counts())
    }

    /// Actual gameweek total, or 0 when results do not exist yet.
    pub fn actual_total(&self, ctx: &GameweekContext) -> f64 {
        if !self.scoreable(ctx) {
            return 0.0;
        }
        if !ctx.results_available() {
            warn!("no results for GW{} yet, scoring 0", ctx.gameweek());
            return 0.0;
        }
        self.actual_points(ctx, self.bench_counts())
    }

    pub fn projected_breakdown(&self, ctx: &GameweekContext) -> Vec<PlayerScore> {
        self.breakdown_with(self.bench_counts(), |name, pos| ctx.xp(name, pos))
    }

    pub fn actual_breakdown(&self, ctx: &GameweekContext) -> Vec<PlayerScore> {
        self.breakdown_with(self.bench_counts(), |name, _| ctx.points(name))
    }

    // -- Both phases --

    /// Settle the lineup from projections and return the projected total.
    pub fn team_xp(&mut self, ctx: &GameweekContext) -> f64 {
        self.finalize_projected(ctx);
        self.projected_total(ctx)
    }

    /// Settle the lineup from results and return the actual total.
    pub fn team_p(&mut self, ctx: &GameweekContext) -> f64 {
        self.finalize_results(ctx);
        self.actual_total(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squad::test_support::{standard_squad, standard_world, SEASON};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn projected_total_doubles_captain_once() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        squad.finalize_projected(&ctx);
        assert!(close(squad.projected_total(&ctx), 67.5));
        assert!(close(squad.projected_points(&ctx, true), 75.0));
        assert!(close(squad.team_xp(&ctx), 67.5));
    }

    #[test]
    fn totals_do_not_change_the_squad() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_results(&ctx);

        let before = squad.clone();
        let first = squad.actual_total(&ctx);
        let second = squad.actual_total(&ctx);
        assert_eq!(first, second);
        assert_eq!(squad, before);
    }

    #[test]
    fn actual_total_counts_captain_and_skips_bench() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        // 49 from the XI plus Salah's 12 again.
        assert!(close(squad.team_p(&ctx), 61.0));
    }

    #[test]
    fn chips_change_multiplier_and_bench() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_results(&ctx);

        squad.activate_chip(Chip::TripleCaptain).unwrap();
        assert!(close(squad.actual_total(&ctx), 73.0));
        assert!(close(squad.projected_total(&ctx), 76.5));

        squad.activate_chip(Chip::BenchBoost).unwrap();
        assert!(close(squad.actual_total(&ctx), 77.0));
        assert!(close(squad.projected_total(&ctx), 84.0));
        assert_eq!(squad.actual_breakdown(&ctx).len(), 15);
    }

    #[test]
    fn incomplete_squad_scores_zero() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.remove_player(&ctx, "Archer", Position::Forward).unwrap();

        assert_eq!(squad.team_xp(&ctx), 0.0);
        assert_eq!(squad.team_p(&ctx), 0.0);
    }

    #[test]
    fn void_and_future_gameweeks_score_zero() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_results(&ctx);

        let void = GameweekContext::new(&catalog, &projections, SEASON, 1).with_void(true);
        assert_eq!(squad.actual_total(&void), 0.0);
        assert_eq!(squad.projected_total(&void), 0.0);

        let future = GameweekContext::new(&catalog, &projections, SEASON, 2);
        assert_eq!(squad.actual_total(&future), 0.0);
        assert!(close(squad.projected_total(&future), 67.5));
    }

    #[test]
    fn breakdown_marks_captain() {
        let (catalog, projections) = standard_world().build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        let breakdown = squad.projected_breakdown(&ctx);
        assert_eq!(breakdown.len(), 11);
        let salah = breakdown.iter().find(|s| s.name == "Salah").unwrap();
        assert!(salah.captain);
        assert_eq!(salah.points, 9.0);
        assert_eq!(salah.label(), "Salah (C)");
        assert_eq!(breakdown.iter().filter(|s| s.captain).count(), 1);
    }
}
