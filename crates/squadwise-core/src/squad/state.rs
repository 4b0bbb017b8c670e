// Squad state: position buckets, bench, budget, captaincy and chips.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Club;

use super::chips::{Chip, ChipBook};
use super::context::GameweekContext;
use super::position::{Position, PositionMap};

/// Full squad size.
pub const SQUAD_SIZE: usize = 15;
/// Starting lineup size.
pub const XI_SIZE: usize = 11;
/// Bench size.
pub const BENCH_SIZE: usize = 4;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A rejected squad mutation. The squad is unchanged whenever one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SquadError {
    #[error("no position found for {player}")]
    UnknownPosition { player: String },

    #[error("{player} is not in the player catalog")]
    UnknownPlayer { player: String },

    #[error("{player} is already in the squad")]
    AlreadyInSquad { player: String },

    #[error("{position} already has {capacity} players")]
    PositionFull { position: Position, capacity: usize },

    #[error("cannot afford {player}: costs {price:.1}, budget {budget:.1}")]
    OverBudget {
        player: String,
        price: f64,
        budget: f64,
    },

    #[error("no price for {player} in GW{gameweek}")]
    MissingPrice { player: String, gameweek: u32 },

    #[error("cannot add {player}, {club} has {cap} players already")]
    ClubLimit {
        player: String,
        club: Club,
        cap: usize,
    },

    #[error("{player} is not among the {position} starters")]
    NotInBucket { player: String, position: Position },

    #[error("{player} is not on the bench")]
    NotOnBench { player: String },

    #[error("bench already holds 4 players")]
    BenchFull,

    #[error("captain and vice-captain must be two different starters")]
    InvalidCaptaincy,

    #[error("{chip} is not available")]
    ChipUnavailable { chip: Chip },

    #[error("could not select a squad (got {size} of 15 players, budget remaining {budget:.1})")]
    BuildFailed { size: usize, budget: f64 },
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// A benched player and the bucket they return to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchEntry {
    pub name: String,
    pub position: Position,
}

impl BenchEntry {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        BenchEntry {
            name: name.into(),
            position,
        }
    }
}

/// The manager's squad. Persists across gameweeks; the engine mutates it in
/// place and `advance_gameweek` moves it to the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub(crate) season: String,
    pub(crate) gameweek: u32,
    pub(crate) budget: f64,
    pub(crate) transfers_left: u32,
    pub(crate) buckets: PositionMap<Vec<String>>,
    pub(crate) bench: Vec<BenchEntry>,
    pub(crate) captain: Option<String>,
    pub(crate) vice_captain: Option<String>,
    pub(crate) chips: ChipBook,
}

impl Squad {
    /// An empty squad. `transfers_left` is clamped to 2.
    pub fn new(season: impl Into<String>, gameweek: u32, budget: f64, transfers_left: u32) -> Self {
        Squad {
            season: season.into(),
            gameweek,
            budget,
            transfers_left: transfers_left.min(2),
            buckets: PositionMap::default(),
            bench: Vec::new(),
            captain: None,
            vice_captain: None,
            chips: ChipBook::default(),
        }
    }

    // -- Accessors --

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn gameweek(&self) -> u32 {
        self.gameweek
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn transfers_left(&self) -> u32 {
        self.transfers_left
    }

    /// Starters (non-benched players) at a position.
    pub fn players(&self, position: Position) -> &[String] {
        self.buckets.get(position)
    }

    pub fn bench(&self) -> &[BenchEntry] {
        &self.bench
    }

    pub fn captain(&self) -> Option<&str> {
        self.captain.as_deref()
    }

    pub fn vice_captain(&self) -> Option<&str> {
        self.vice_captain.as_deref()
    }

    pub fn chips(&self) -> &ChipBook {
        &self.chips
    }

    /// Starters and their positions, GK first.
    pub fn starters(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.buckets
            .iter()
            .flat_map(|(pos, names)| names.iter().map(move |n| (n.as_str(), pos)))
    }

    /// Every squad member: starters first, then the bench in bench order.
    pub fn all_players(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.starters()
            .chain(self.bench.iter().map(|b| (b.name.as_str(), b.position)))
    }

    pub fn squad_size(&self) -> usize {
        self.xi_size() + self.bench.len()
    }

    pub fn xi_size(&self) -> usize {
        self.buckets.iter().map(|(_, names)| names.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.squad_size() == SQUAD_SIZE
    }

    /// Players held at a position, starters and bench together.
    pub fn holdings(&self, position: Position) -> usize {
        self.buckets.get(position).len()
            + self.bench.iter().filter(|b| b.position == position).count()
    }

    pub fn contains(&self, player: &str) -> bool {
        self.all_players().any(|(name, _)| name == player)
    }

    pub fn is_benched(&self, player: &str) -> bool {
        self.bench.iter().any(|b| b.name == player)
    }

    /// Position a squad member is held at, bench included.
    pub fn position_in_squad(&self, player: &str) -> Option<Position> {
        self.all_players()
            .find(|(name, _)| *name == player)
            .map(|(_, pos)| pos)
    }

    // -- Roster mutations --

    /// Buy a player at the current price. The position defaults to the
    /// catalog's when `None`.
    pub fn add_player(
        &mut self,
        ctx: &GameweekContext,
        player: &str,
        position: Option<Position>,
    ) -> Result<(), SquadError> {
        self.add_player_with_price(ctx, player, position, None)
    }

    /// Buy a player, charging `custom_price` instead of the market price
    /// when given. Eligibility is always checked at the market price.
    pub fn add_player_with_price(
        &mut self,
        ctx: &GameweekContext,
        player: &str,
        position: Option<Position>,
        custom_price: Option<f64>,
    ) -> Result<(), SquadError> {
        let position = match position.or_else(|| ctx.catalog().position_of(player)) {
            Some(p) => p,
            None => {
                return Err(SquadError::UnknownPosition {
                    player: player.to_string(),
                })
            }
        };

        let price = self.can_add(ctx, player, position)?;
        let charged = custom_price.unwrap_or(price);

        self.buckets.get_mut(position).push(player.to_string());
        self.budget -= charged;
        debug!("added {} ({}) for {:.1}", player, position, charged);
        Ok(())
    }

    /// Sell a starter, refunding the current price. Returns the refund.
    pub fn remove_player(
        &mut self,
        ctx: &GameweekContext,
        player: &str,
        position: Position,
    ) -> Result<f64, SquadError> {
        let idx = self.bucket_index(player, position)?;
        let refund = ctx.price(player).ok_or_else(|| SquadError::MissingPrice {
            player: player.to_string(),
            gameweek: ctx.gameweek(),
        })?;

        self.buckets.get_mut(position).remove(idx);
        self.budget += refund;
        self.forget_captaincy(player);
        debug!("removed {} ({}) for {:.1}", player, position, refund);
        Ok(refund)
    }

    /// Move a starter to the bench. Budget is unaffected.
    pub fn bench_player(&mut self, player: &str, position: Position) -> Result<(), SquadError> {
        if self.bench.len() >= BENCH_SIZE {
            return Err(SquadError::BenchFull);
        }
        let idx = self.bucket_index(player, position)?;
        let name = self.buckets.get_mut(position).remove(idx);
        self.forget_captaincy(&name);
        self.bench.push(BenchEntry::new(name, position));
        Ok(())
    }

    /// Move a bench player back to their bucket.
    pub fn unbench_player(&mut self, player: &str) -> Result<BenchEntry, SquadError> {
        let idx = self
            .bench
            .iter()
            .position(|b| b.name == player)
            .ok_or_else(|| SquadError::NotOnBench {
                player: player.to_string(),
            })?;
        let entry = self.bench.remove(idx);
        self.buckets.get_mut(entry.position).push(entry.name.clone());
        Ok(entry)
    }

    /// Return every bench player to their bucket, in bench order.
    pub fn return_bench(&mut self) {
        for entry in std::mem::take(&mut self.bench) {
            self.buckets.get_mut(entry.position).push(entry.name);
        }
    }

    /// Set captain and vice-captain. Both must be distinct starters.
    pub fn set_captaincy(&mut self, captain: &str, vice_captain: &str) -> Result<(), SquadError> {
        let is_starter = |p: &str| self.starters().any(|(name, _)| name == p);
        if captain == vice_captain || !is_starter(captain) || !is_starter(vice_captain) {
            return Err(SquadError::InvalidCaptaincy);
        }
        self.captain = Some(captain.to_string());
        self.vice_captain = Some(vice_captain.to_string());
        Ok(())
    }

    /// Move to the next gameweek: clears active chips and banks one free
    /// transfer, up to `max_banked`.
    pub fn advance_gameweek(&mut self, gameweek: u32, max_banked: u32) {
        if gameweek <= self.gameweek {
            warn!(
                "advancing squad from GW{} to GW{} does not move forward",
                self.gameweek, gameweek
            );
        }
        self.gameweek = gameweek;
        self.chips.clear_active();
        self.transfers_left = (self.transfers_left + 1).min(max_banked);
    }

    // -- Helpers --

    fn bucket_index(&self, player: &str, position: Position) -> Result<usize, SquadError> {
        self.buckets
            .get(position)
            .iter()
            .position(|n| n == player)
            .ok_or_else(|| SquadError::NotInBucket {
                player: player.to_string(),
                position,
            })
    }

    pub(crate) fn forget_captaincy(&mut self, player: &str) {
        if self.captain.as_deref() == Some(player) {
            self.captain = None;
        }
        if self.vice_captain.as_deref() == Some(player) {
            self.vice_captain = None;
        }
    }
}

impl fmt::Display for Squad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, names) in self.buckets.iter() {
            writeln!(f, "{}: {}", pos, names.join(", "))?;
        }
        let bench: Vec<String> = self
            .bench
            .iter()
            .map(|b| format!("{} ({})", b.name, b.position))
            .collect();
        writeln!(f, "SUBS: {}", bench.join(", "))?;
        writeln!(
            f,
            "C: {}, VC: {}",
            self.captain.as_deref().unwrap_or("-"),
            self.vice_captain.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "Budget: {:.1}", self.budget)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
