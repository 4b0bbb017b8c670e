// Player catalog: per-gameweek club, price, position and result lookups.
//
// The engine only talks to the `PlayerCatalog` trait. `SeasonCatalog` is the
// bundled implementation, built from a merged per-gameweek results CSV.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::squad::position::Position;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A real-world club. Players whose club cannot be resolved carry
/// `Option<Club>::None` and are exempt from the per-club cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Club(pub String);

impl Club {
    pub fn new(name: impl Into<String>) -> Self {
        Club(name.into())
    }
}

impl fmt::Display for Club {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read access to season data the engine consumes.
pub trait PlayerCatalog {
    /// The player's club in the given gameweek, if known.
    fn club_for(&self, player: &str, gameweek: u32) -> Option<Club>;

    /// The player's price in the given gameweek. `None` when the player has
    /// no row for that gameweek.
    fn price_for(&self, gameweek: u32, player: &str) -> Option<f64>;

    /// Name -> position for every player listed in the given gameweek.
    fn positions_for(&self, gameweek: u32) -> HashMap<String, Position>;

    /// Season-wide position of a player (the first one the catalog saw).
    fn position_of(&self, player: &str) -> Option<Position>;

    /// Every known player at a position, in catalog order.
    fn players_at(&self, position: Position) -> Vec<String>;

    /// Name -> actual points for a season and gameweek. Players without a
    /// row are absent and score 0.
    fn actual_points_for(&self, season: &str, gameweek: u32) -> HashMap<String, f64>;

    /// Players listed for the gameweek who did not appear.
    fn players_who_did_not_play(&self, gameweek: u32) -> Vec<String>;

    /// The most recently completed gameweek with results.
    fn most_recent_gameweek(&self) -> u32;
}

/// One player's line for one gameweek.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub name: String,
    pub position: Position,
    pub club: Option<Club>,
    pub gameweek: u32,
    pub price: f64,
    pub points: f64,
    pub minutes: u32,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("catalog {path} produced zero valid rows")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// Merged gameweek CSV row. `value` is stored in tenths (55 => 5.5).
/// Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawGameweekRow {
    name: String,
    position: String,
    #[serde(default)]
    team: String,
    #[serde(rename = "GW")]
    gw: u32,
    value: f64,
    #[serde(default)]
    total_points: f64,
    #[serde(default)]
    minutes: f64,
}

fn load_rows_from_reader<R: Read>(rdr: R) -> Result<Vec<CatalogRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawGameweekRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim().to_string();
                let Some(position) = Position::from_str_pos(&raw.position) else {
                    warn!("skipping '{}': unknown position '{}'", name, raw.position);
                    continue;
                };
                if !raw.value.is_finite() || !raw.total_points.is_finite() {
                    warn!("skipping '{}' GW{}: non-finite value or points", name, raw.gw);
                    continue;
                }
                let team = raw.team.trim();
                rows.push(CatalogRow {
                    name,
                    position,
                    club: (!team.is_empty()).then(|| Club::new(team)),
                    gameweek: raw.gw,
                    price: raw.value / 10.0,
                    points: raw.total_points,
                    minutes: raw.minutes.max(0.0).round() as u32,
                });
            }
            Err(e) => {
                warn!("skipping malformed catalog row: {}", e);
            }
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// SeasonCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct GameweekTable {
    rows: Vec<CatalogRow>,
    index: HashMap<String, usize>,
}

impl GameweekTable {
    fn get(&self, player: &str) -> Option<&CatalogRow> {
        self.index.get(player).map(|&i| &self.rows[i])
    }
}

/// In-memory catalog for one season.
#[derive(Debug, Clone)]
pub struct SeasonCatalog {
    season: String,
    gameweeks: HashMap<u32, GameweekTable>,
    players: Vec<(String, Position)>,
    player_index: HashMap<String, Position>,
}

impl SeasonCatalog {
    /// Build a catalog from rows. Rows for the same player and gameweek
    /// (double gameweeks) are merged by summing points and minutes.
    pub fn from_rows(season: impl Into<String>, rows: Vec<CatalogRow>) -> Self {
        let mut catalog = SeasonCatalog {
            season: season.into(),
            gameweeks: HashMap::new(),
            players: Vec::new(),
            player_index: HashMap::new(),
        };

        for row in rows {
            if !catalog.player_index.contains_key(&row.name) {
                catalog.player_index.insert(row.name.clone(), row.position);
                catalog.players.push((row.name.clone(), row.position));
            }

            let table = catalog.gameweeks.entry(row.gameweek).or_default();
            match table.index.get(&row.name) {
                Some(&i) => {
                    let existing = &mut table.rows[i];
                    existing.points += row.points;
                    existing.minutes += row.minutes;
                }
                None => {
                    table.index.insert(row.name.clone(), table.rows.len());
                    table.rows.push(row);
                }
            }
        }

        catalog
    }

    /// Load a season from a merged gameweek CSV file.
    pub fn load(season: impl Into<String>, path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let rows = load_rows_from_reader(file).map_err(|e| CatalogError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        if rows.is_empty() {
            return Err(CatalogError::Empty {
                path: path.display().to_string(),
            });
        }
        Ok(Self::from_rows(season, rows))
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    /// Latest row for the player at or before `gameweek`.
    fn latest_row(&self, player: &str, gameweek: u32) -> Option<&CatalogRow> {
        (1..=gameweek)
            .rev()
            .find_map(|gw| self.gameweeks.get(&gw).and_then(|t| t.get(player)))
    }
}

impl PlayerCatalog for SeasonCatalog {
    fn club_for(&self, player: &str, gameweek: u32) -> Option<Club> {
        self.latest_row(player, gameweek)
            .and_then(|row| row.club.clone())
    }

    fn price_for(&self, gameweek: u32, player: &str) -> Option<f64> {
        self.gameweeks
            .get(&gameweek)
            .and_then(|t| t.get(player))
            .map(|row| row.price)
    }

    fn positions_for(&self, gameweek: u32) -> HashMap<String, Position> {
        self.gameweeks
            .get(&gameweek)
            .map(|t| {
                t.rows
                    .iter()
                    .map(|row| (row.name.clone(), row.position))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn position_of(&self, player: &str) -> Option<Position> {
        self.player_index.get(player).copied()
    }

    fn players_at(&self, position: Position) -> Vec<String> {
        self.players
            .iter()
            .filter(|(_, p)| *p == position)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn actual_points_for(&self, season: &str, gameweek: u32) -> HashMap<String, f64> {
        if season != self.season {
            warn!(
                "requested points for season {} from the {} catalog",
                season, self.season
            );
            return HashMap::new();
        }
        self.gameweeks
            .get(&gameweek)
            .map(|t| {
                t.rows
                    .iter()
                    .map(|row| (row.name.clone(), row.points))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn players_who_did_not_play(&self, gameweek: u32) -> Vec<String> {
        self.gameweeks
            .get(&gameweek)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| row.minutes == 0)
                    .map(|row| row.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn most_recent_gameweek(&self) -> u32 {
        self.gameweeks.keys().copied().max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
