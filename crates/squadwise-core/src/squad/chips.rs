// One-time chips: availability bookkeeping and the automatic activation
// heuristics for Triple Captain and Bench Boost.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::GameweekContext;
use super::state::{Squad, SquadError};

/// A one-time strategic modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chip {
    TripleCaptain,
    BenchBoost,
    FreeHit,
    Wildcard,
}

impl Chip {
    pub const ALL: [Chip; 4] = [
        Chip::TripleCaptain,
        Chip::BenchBoost,
        Chip::FreeHit,
        Chip::Wildcard,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Chip::TripleCaptain => "Triple Captain",
            Chip::BenchBoost => "Bench Boost",
            Chip::FreeHit => "Free Hit",
            Chip::Wildcard => "Wildcard",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipState {
    pub available: bool,
    pub active: bool,
}

impl Default for ChipState {
    fn default() -> Self {
        ChipState {
            available: true,
            active: false,
        }
    }
}

/// Record of a chip played in a gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipUse {
    pub chip: Chip,
    pub gameweek: u32,
}

/// Availability and activity of every chip, plus the usage log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipBook {
    triple_captain: ChipState,
    bench_boost: ChipState,
    free_hit: ChipState,
    wildcard: ChipState,
    used: Vec<ChipUse>,
}

impl ChipBook {
    pub fn state(&self, chip: Chip) -> ChipState {
        match chip {
            Chip::TripleCaptain => self.triple_captain,
            Chip::BenchBoost => self.bench_boost,
            Chip::FreeHit => self.free_hit,
            Chip::Wildcard => self.wildcard,
        }
    }

    fn state_mut(&mut self, chip: Chip) -> &mut ChipState {
        match chip {
            Chip::TripleCaptain => &mut self.triple_captain,
            Chip::BenchBoost => &mut self.bench_boost,
            Chip::FreeHit => &mut self.free_hit,
            Chip::Wildcard => &mut self.wildcard,
        }
    }

    pub fn is_available(&self, chip: Chip) -> bool {
        self.state(chip).available
    }

    pub fn is_active(&self, chip: Chip) -> bool {
        self.state(chip).active
    }

    pub fn used(&self) -> &[ChipUse] {
        &self.used
    }

    /// Play a chip. Returns false (no change) if it is not available.
    pub fn activate(&mut self, chip: Chip, gameweek: u32) -> bool {
        let state = self.state_mut(chip);
        if !state.available {
            return false;
        }
        state.available = false;
        state.active = true;
        self.used.push(ChipUse { chip, gameweek });
        true
    }

    /// Clear every `active` flag. Availability is untouched.
    pub fn clear_active(&mut self) {
        for chip in Chip::ALL {
            self.state_mut(chip).active = false;
        }
    }
}

impl Squad {
    /// Play a chip manually in the squad's current gameweek.
    pub fn activate_chip(&mut self, chip: Chip) -> Result<(), SquadError> {
        if !self.chips.activate(chip, self.gameweek) {
            return Err(SquadError::ChipUnavailable { chip });
        }
        info!("CHIP: {} activated on GW{}", chip, self.gameweek);
        Ok(())
    }

    /// Decide whether to play Triple Captain and Bench Boost this gameweek.
    ///
    /// Runs against the current lineup, so call it after
    /// `finalize_projected`. Free Hit and Wildcard are never played
    /// automatically. Returns the chips activated.
    pub fn evaluate_chips(&mut self, ctx: &GameweekContext) -> Vec<Chip> {
        let mut activated = Vec::new();
        let settings = ctx.settings();

        if self.chips.is_available(Chip::TripleCaptain) {
            if let Some(captain) = self.captain.clone() {
                let captain_xp = self
                    .position_in_squad(&captain)
                    .map(|pos| ctx.xp(&captain, pos))
                    .unwrap_or(0.0);
                if captain_xp > settings.triple_captain_threshold
                    && self.chips.activate(Chip::TripleCaptain, self.gameweek)
                {
                    info!(
                        "CHIP: Triple Captain activated on GW{} for {} with {:.2} xP",
                        self.gameweek, captain, captain_xp
                    );
                    activated.push(Chip::TripleCaptain);
                }
            }
        }

        if self.chips.is_available(Chip::BenchBoost) {
            let bench_xp = self.projected_points(ctx, true) - self.projected_points(ctx, false);
            if bench_xp > settings.bench_boost_threshold
                && self.chips.activate(Chip::BenchBoost, self.gameweek)
            {
                info!(
                    "CHIP: Bench Boost activated on GW{} for {:.2} xP",
                    self.gameweek, bench_xp
                );
                activated.push(Chip::BenchBoost);
            }
        }

        activated
    }
}
