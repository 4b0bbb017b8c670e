// Per-gameweek lookups shared by every squad operation.

use std::collections::{HashMap, HashSet};

use crate::catalog::{Club, PlayerCatalog};
use crate::projections::Projections;

use super::position::Position;

/// Thresholds and rules the engine's heuristics run with.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Maximum squad members from one known club.
    pub club_cap: usize,
    /// Free transfers that can be banked across a gameweek boundary.
    pub max_banked_transfers: u32,
    /// Transfer attempts per `auto_transfer` call.
    pub transfers_per_gameweek: u32,
    /// Projected-points gain an automatic transfer must reach.
    pub min_transfer_gain: f64,
    /// Captain xP above which Triple Captain is played.
    pub triple_captain_threshold: f64,
    /// Bench xP above which Bench Boost is played.
    pub bench_boost_threshold: f64,
    /// Minimum xP for a value-tranche pick in the squad builder.
    pub value_tranche_min_xp: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            club_cap: 3,
            max_banked_transfers: 2,
            transfers_per_gameweek: 2,
            min_transfer_gain: 3.0,
            triple_captain_threshold: 12.0,
            bench_boost_threshold: 8.0,
            value_tranche_min_xp: 1.0,
        }
    }
}

/// Catalog and projection lookups for one season and gameweek.
///
/// Positions and actual points are read from the active gameweek, or from
/// the most recently completed one when the active gameweek is still in
/// the future.
pub struct GameweekContext<'a> {
    catalog: &'a dyn PlayerCatalog,
    projections: &'a Projections,
    settings: EngineSettings,
    season: String,
    gameweek: u32,
    recent_gameweek: u32,
    void: bool,
    positions: HashMap<String, Position>,
    previous_positions: HashMap<String, Position>,
    points: HashMap<String, f64>,
    did_not_play: Vec<String>,
    did_not_play_set: HashSet<String>,
}

impl<'a> GameweekContext<'a> {
    pub fn new(
        catalog: &'a dyn PlayerCatalog,
        projections: &'a Projections,
        season: &str,
        gameweek: u32,
    ) -> Self {
        let recent_gameweek = catalog.most_recent_gameweek();
        let lookup_gameweek = gameweek.min(recent_gameweek);
        let did_not_play = catalog.players_who_did_not_play(gameweek);

        GameweekContext {
            catalog,
            projections,
            settings: EngineSettings::default(),
            season: season.to_string(),
            gameweek,
            recent_gameweek,
            void: false,
            positions: catalog.positions_for(lookup_gameweek),
            previous_positions: catalog.positions_for(gameweek.saturating_sub(1)),
            points: catalog.actual_points_for(season, lookup_gameweek),
            did_not_play_set: did_not_play.iter().cloned().collect(),
            did_not_play,
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Mark the gameweek as voided: no results, no transfers, no score.
    pub fn with_void(mut self, void: bool) -> Self {
        self.void = void;
        self
    }

    pub fn catalog(&self) -> &dyn PlayerCatalog {
        self.catalog
    }

    pub fn projections(&self) -> &Projections {
        self.projections
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn gameweek(&self) -> u32 {
        self.gameweek
    }

    pub fn is_void(&self) -> bool {
        self.void
    }

    /// Whether actual results exist for the active gameweek.
    pub fn results_available(&self) -> bool {
        !self.void && self.gameweek <= self.recent_gameweek
    }

    /// Projected points; unlisted players project 0.
    pub fn xp(&self, player: &str, position: Position) -> f64 {
        self.projections.xp(player, position)
    }

    /// Actual points; players without a result score 0.
    pub fn points(&self, player: &str) -> f64 {
        self.points.get(player).copied().unwrap_or(0.0)
    }

    /// Current price, falling back to the previous gameweek's price.
    pub fn price(&self, player: &str) -> Option<f64> {
        self.catalog
            .price_for(self.gameweek, player)
            .or_else(|| self.catalog.price_for(self.gameweek.saturating_sub(1), player))
    }

    /// Price listed for the active gameweek only.
    pub fn listed_price(&self, player: &str) -> Option<f64> {
        self.catalog.price_for(self.gameweek, player)
    }

    pub fn club(&self, player: &str) -> Option<Club> {
        self.catalog.club_for(player, self.gameweek)
    }

    /// Position from the gameweek lookup table only.
    pub fn listed_position(&self, player: &str) -> Option<Position> {
        self.positions.get(player).copied()
    }

    /// Position resolved from the previous gameweek, then the lookup table.
    pub fn position_of(&self, player: &str) -> Option<Position> {
        self.previous_positions
            .get(player)
            .or_else(|| self.positions.get(player))
            .copied()
    }

    /// Players who did not appear in the active gameweek, in catalog order.
    pub fn did_not_play(&self) -> &[String] {
        &self.did_not_play
    }

    pub fn appeared(&self, player: &str) -> bool {
        !self.did_not_play_set.contains(player)
    }
}
