// Squad positions and the per-position bucket mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Playing positions a squad member can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    /// All positions in roster display order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Outfield positions, which share the bench's outfield slots.
    pub const OUTFIELD: [Position; 3] = [
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position code.
    ///
    /// Accepts the short codes used by the projection files ("GK", "DEF",
    /// "MID", "FWD") as well as the catalog's "GKP" spelling.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" => Some(Position::Goalkeeper),
            "DEF" => Some(Position::Defender),
            "MID" => Some(Position::Midfielder),
            "FWD" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Short code, also used as the projection file stem.
    pub fn code(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Default squad capacity for this position.
    pub fn capacity(&self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    pub fn is_outfield(&self) -> bool {
        !matches!(self, Position::Goalkeeper)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Per-position storage
// ---------------------------------------------------------------------------

/// One value per position, addressed by `Position` rather than by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionMap<T> {
    pub gk: T,
    pub def: T,
    pub mid: T,
    pub fwd: T,
}

impl<T> PositionMap<T> {
    pub fn get(&self, pos: Position) -> &T {
        match pos {
            Position::Goalkeeper => &self.gk,
            Position::Defender => &self.def,
            Position::Midfielder => &self.mid,
            Position::Forward => &self.fwd,
        }
    }

    pub fn get_mut(&mut self, pos: Position) -> &mut T {
        match pos {
            Position::Goalkeeper => &mut self.gk,
            Position::Defender => &mut self.def,
            Position::Midfielder => &mut self.mid,
            Position::Forward => &mut self.fwd,
        }
    }

    /// Iterate `(position, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        Position::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    /// Build a map by evaluating `f` once per position.
    pub fn from_fn(mut f: impl FnMut(Position) -> T) -> Self {
        PositionMap {
            gk: f(Position::Goalkeeper),
            def: f(Position::Defender),
            mid: f(Position::Midfielder),
            fwd: f(Position::Forward),
        }
    }
}
