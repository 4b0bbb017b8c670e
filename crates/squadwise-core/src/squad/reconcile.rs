// Post-result substitutions: starters who did not appear make way for bench
// players who did.

use tracing::{info, warn};

use super::context::GameweekContext;
use super::position::Position;
use super::state::{BenchEntry, Squad};

/// A reconciled swap between a starter and a bench player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub off: String,
    pub on: String,
    /// Position the incoming player starts at.
    pub position: Position,
}

impl Squad {
    /// Starters who did not appear this gameweek, grouped GK, DEF, MID,
    /// FWD and in the catalog's did-not-play order within each group.
    pub fn non_appearing_starters(&self, ctx: &GameweekContext) -> Vec<(String, Position)> {
        Position::ALL
            .into_iter()
            .flat_map(move |pos| {
                let bucket = self.players(pos);
                ctx.did_not_play()
                    .iter()
                    .filter(move |name| bucket.contains(*name))
                    .map(move |name| (name.clone(), pos))
            })
            .collect()
    }

    /// Swap every non-appearing starter for a bench player who appeared:
    /// one of the same position if possible, otherwise the first outfield
    /// bench player. Does nothing before results exist.
    pub fn reconcile(&mut self, ctx: &GameweekContext) -> Vec<Substitution> {
        let mut subs = Vec::new();
        if !ctx.results_available() {
            return subs;
        }

        for (absent, held_at) in self.non_appearing_starters(ctx) {
            let same_position = self
                .bench
                .iter()
                .position(|b| b.position == held_at && ctx.appeared(&b.name));
            if let Some(slot) = same_position {
                subs.push(self.swap_in(slot, &absent, held_at, held_at));
                continue;
            }

            let fallback = self
                .bench
                .iter()
                .position(|b| b.position.is_outfield() && ctx.appeared(&b.name));
            let Some(slot) = fallback else {
                warn!("no bench player available to replace {}", absent);
                continue;
            };
            let Some(listed) = ctx.listed_position(&absent) else {
                warn!("no listed position for {}, substitution skipped", absent);
                continue;
            };
            subs.push(self.swap_in(slot, &absent, held_at, listed));
        }

        subs
    }

    /// Move the bench entry at `slot` into its bucket and put `absent`
    /// (currently starting at `held_at`) on the bench in its place.
    fn swap_in(
        &mut self,
        slot: usize,
        absent: &str,
        held_at: Position,
        bench_as: Position,
    ) -> Substitution {
        let incoming = self.bench[slot].clone();
        let bucket = self.buckets.get_mut(held_at);
        if let Some(idx) = bucket.iter().position(|n| n == absent) {
            bucket.remove(idx);
        }
        self.buckets
            .get_mut(incoming.position)
            .push(incoming.name.clone());
        self.bench[slot] = BenchEntry::new(absent, bench_as);
        self.forget_captaincy(absent);

        info!(
            "GW{}: {} did not play, {} ({}) comes off the bench",
            self.gameweek, absent, incoming.name, incoming.position
        );
        Substitution {
            off: absent.to_string(),
            on: incoming.name,
            position: incoming.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squad::test_support::{standard_squad, standard_world, SEASON};

    #[test]
    fn same_position_bench_player_comes_on() {
        let mut world = standard_world();
        world.benched_in_real_life("Saliba");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        let subs = squad.reconcile(&ctx);
        assert_eq!(
            subs,
            vec![Substitution {
                off: "Saliba".into(),
                on: "Konsa".into(),
                position: Position::Defender,
            }]
        );
        assert!(squad.players(Position::Defender).contains(&"Konsa".to_string()));
        assert_eq!(squad.bench()[2], BenchEntry::new("Saliba", Position::Defender));
        assert_eq!(squad.xi_size(), 11);
    }

    #[test]
    fn absent_bench_player_is_passed_over() {
        let mut world = standard_world();
        world.benched_in_real_life("Saliba").benched_in_real_life("Konsa");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        let subs = squad.reconcile(&ctx);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].on, "Mitchell");
        assert!(squad.is_benched("Konsa"));
    }

    #[test]
    fn absent_starters_are_handled_in_catalog_order() {
        let mut world = standard_world();
        // Gabriel's row comes before Saliba's in the catalog.
        world.rows.swap(2, 3);
        world
            .benched_in_real_life("Saliba")
            .benched_in_real_life("Gabriel")
            .benched_in_real_life("Mitchell");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        assert_eq!(
            squad.non_appearing_starters(&ctx),
            vec![
                ("Gabriel".to_string(), Position::Defender),
                ("Saliba".to_string(), Position::Defender),
            ]
        );
        let subs = squad.reconcile(&ctx);
        let swaps: Vec<(&str, &str)> = subs.iter().map(|s| (s.off.as_str(), s.on.as_str())).collect();
        assert_eq!(swaps, vec![("Gabriel", "Konsa"), ("Saliba", "Archer")]);
        assert_eq!(squad.bench()[1], BenchEntry::new("Saliba", Position::Defender));
        assert_eq!(squad.bench()[2], BenchEntry::new("Gabriel", Position::Defender));
    }

    #[test]
    fn falls_back_to_first_outfield_bench_player() {
        let mut world = standard_world();
        world.benched_in_real_life("Salah");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);
        assert_eq!(squad.captain(), Some("Salah"));

        let subs = squad.reconcile(&ctx);
        assert_eq!(subs[0].on, "Archer");
        assert_eq!(subs[0].position, Position::Forward);
        assert_eq!(squad.players(Position::Forward).len(), 3);
        assert_eq!(squad.players(Position::Midfielder).len(), 4);
        assert_eq!(squad.bench()[1], BenchEntry::new("Salah", Position::Midfielder));
        assert_eq!(squad.captain(), None);
    }

    #[test]
    fn finalize_results_recaptains_after_swaps() {
        let mut world = standard_world();
        world.benched_in_real_life("Salah");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);

        squad.finalize_results(&ctx);
        assert_eq!(squad.captain(), Some("Haaland"));
        assert_eq!(squad.vice_captain(), Some("Son"));
        // XI: 49 - 12 (Salah) + 0 (Archer), Haaland's 2 doubled.
        assert!((squad.actual_total(&ctx) - 39.0).abs() < 1e-9);
    }

    #[test]
    fn keeper_with_no_playing_bench_is_left_alone() {
        let mut world = standard_world();
        world
            .benched_in_real_life("Raya")
            .benched_in_real_life("Steele")
            .benched_in_real_life("Archer")
            .benched_in_real_life("Konsa")
            .benched_in_real_life("Mitchell");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        assert!(squad.reconcile(&ctx).is_empty());
        assert_eq!(squad.players(Position::Goalkeeper), &["Raya".to_string()]);
    }

    #[test]
    fn nothing_happens_before_results() {
        let mut world = standard_world();
        world.benched_in_real_life("Saliba");
        let (catalog, projections) = world.build();
        let ctx = GameweekContext::new(&catalog, &projections, SEASON, 1);
        let mut squad = standard_squad(&ctx);
        squad.finalize_projected(&ctx);

        let future = GameweekContext::new(&catalog, &projections, SEASON, 2);
        assert!(squad.reconcile(&future).is_empty());
        assert!(!squad.is_benched("Saliba"));
    }
}
