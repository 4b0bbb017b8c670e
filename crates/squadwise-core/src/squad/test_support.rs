// Shared fixtures for the squad engine's unit tests.

use crate::catalog::{CatalogRow, Club, SeasonCatalog};
use crate::projections::Projections;

use super::context::GameweekContext;
use super::position::Position;
use super::state::Squad;

pub(crate) const SEASON: &str = "2023-24";

pub(crate) fn row(
    name: &str,
    position: Position,
    club: Option<&str>,
    gameweek: u32,
    price: f64,
    points: f64,
    minutes: u32,
) -> CatalogRow {
    CatalogRow {
        name: name.to_string(),
        position,
        club: club.map(Club::new),
        gameweek,
        price,
        points,
        minutes,
    }
}

/// Catalog rows plus projections, assembled into the real types on demand.
#[derive(Default)]
pub(crate) struct World {
    pub rows: Vec<CatalogRow>,
    pub xp: Vec<(Position, String, f64)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player with a GW1 row (90 minutes) and a projection.
    pub fn player(
        &mut self,
        name: &str,
        position: Position,
        club: Option<&str>,
        price: f64,
        xp: f64,
        points: f64,
    ) -> &mut Self {
        self.rows.push(row(name, position, club, 1, price, points, 90));
        self.xp.push((position, name.to_string(), xp));
        self
    }

    /// Mark a player as not having appeared in GW1.
    pub fn benched_in_real_life(&mut self, name: &str) -> &mut Self {
        for r in self.rows.iter_mut().filter(|r| r.name == name && r.gameweek == 1) {
            r.minutes = 0;
        }
        self
    }

    pub fn set_xp(&mut self, name: &str, xp: f64) -> &mut Self {
        for entry in self.xp.iter_mut().filter(|(_, n, _)| n == name) {
            entry.2 = xp;
        }
        self
    }

    pub fn build(&self) -> (SeasonCatalog, Projections) {
        let catalog = SeasonCatalog::from_rows(SEASON, self.rows.clone());
        let mut projections = Projections::new();
        for (pos, name, xp) in &self.xp {
            projections.insert(*pos, name.clone(), *xp);
        }
        (catalog, projections)
    }
}

/// The fifteen players of the standard squad: name, position, club,
/// price, xP, actual points. Costs 97.0 in total.
pub(crate) const STANDARD: [(&str, Position, &str, f64, f64, f64); 15] = [
    ("Raya", Position::Goalkeeper, "ARS", 4.5, 5.0, 6.0),
    ("Steele", Position::Goalkeeper, "BHA", 4.0, 3.0, 1.0),
    ("Saliba", Position::Defender, "ARS", 5.5, 6.0, 8.0),
    ("Gabriel", Position::Defender, "ARS", 5.0, 5.0, 2.0),
    ("Trippier", Position::Defender, "NEW", 5.0, 4.0, 1.0),
    ("Mitchell", Position::Defender, "CRY", 4.0, 2.0, 0.0),
    ("Konsa", Position::Defender, "AVL", 4.0, 1.5, 3.0),
    ("Salah", Position::Midfielder, "LIV", 12.5, 9.0, 12.0),
    ("Son", Position::Midfielder, "TOT", 9.0, 7.0, 5.0),
    ("Foden", Position::Midfielder, "MCI", 7.0, 5.0, 2.0),
    ("Gordon", Position::Midfielder, "NEW", 5.5, 3.0, 4.0),
    ("Eze", Position::Midfielder, "CRY", 5.0, 2.5, 1.0),
    ("Haaland", Position::Forward, "MCI", 13.5, 8.0, 2.0),
    ("Watkins", Position::Forward, "AVL", 8.0, 4.0, 6.0),
    ("Archer", Position::Forward, "AVL", 4.5, 1.0, 0.0),
];

pub(crate) fn standard_world() -> World {
    let mut world = World::new();
    for (name, pos, club, price, xp, points) in STANDARD {
        world.player(name, pos, Some(club), price, xp, points);
    }
    world
}

/// Add every standard player to a fresh 100.0 squad.
pub(crate) fn standard_squad(ctx: &GameweekContext) -> Squad {
    let mut squad = Squad::new(SEASON, 1, 100.0, 1);
    for (name, pos, ..) in STANDARD {
        squad
            .add_player(ctx, name, Some(pos))
            .unwrap_or_else(|e| panic!("standard player {name} rejected: {e}"));
    }
    squad
}
