// Configuration loading and parsing (league.toml, strategy.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::squad::builder::{BuildPlan, Tranche};
use crate::squad::context::EngineSettings;
use crate::squad::position::PositionMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub season: SeasonConfig,
    pub data_paths: DataPaths,
    pub snapshot_path: String,
}

impl Config {
    /// Engine thresholds and rules derived from both files.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            club_cap: self.league.club_cap,
            max_banked_transfers: self.league.max_banked_transfers,
            transfers_per_gameweek: self.strategy.transfers.per_gameweek,
            min_transfer_gain: self.strategy.transfers.min_gain,
            triple_captain_threshold: self.strategy.chips.triple_captain_threshold,
            bench_boost_threshold: self.strategy.chips.bench_boost_threshold,
            value_tranche_min_xp: self.strategy.builder.value_min_xp,
        }
    }

    /// Squad builder plan from the `[builder.plan]` table.
    pub fn build_plan(&self) -> BuildPlan {
        let plan = &self.strategy.builder.plan;
        BuildPlan {
            tranches: PositionMap {
                gk: plan.gk,
                def: plan.def,
                mid: plan.mid,
                fwd: plan.fwd,
            },
        }
    }

    /// Whether results for a gameweek were voided (postponed round).
    pub fn is_void(&self, gameweek: u32) -> bool {
        self.season.void_gameweeks.contains(&gameweek)
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// Starting bank, in millions.
    pub budget: f64,
    /// Maximum squad members from one club.
    pub club_cap: usize,
    /// Free transfers that can be banked across gameweeks.
    pub max_banked_transfers: u32,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    season: SeasonConfig,
    transfers: TransferConfig,
    chips: ChipConfig,
    builder: BuilderConfig,
    data_paths: DataPaths,
    output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputSection {
    squad_snapshot: String,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub transfers: TransferConfig,
    pub chips: ChipConfig,
    pub builder: BuilderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonConfig {
    pub name: String,
    pub start_gameweek: u32,
    pub end_gameweek: u32,
    #[serde(default)]
    pub void_gameweeks: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    pub per_gameweek: u32,
    pub min_gain: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChipConfig {
    pub triple_captain_threshold: f64,
    pub bench_boost_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuilderConfig {
    pub value_min_xp: f64,
    pub plan: PlanSection,
}

/// Premium tranche per position. TOML keys use the position codes.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanSection {
    #[serde(rename = "GK")]
    pub gk: Tranche,
    #[serde(rename = "DEF")]
    pub def: Tranche,
    #[serde(rename = "MID")]
    pub mid: Tranche,
    #[serde(rename = "FWD")]
    pub fwd: Tranche,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    /// Merged per-gameweek results CSV.
    pub catalog: String,
    /// Root of the `<season>/GW<n>/<POS>.tsv` projection tree.
    pub predictions: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This does not copy defaults. Prefer `load_config()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        strategy: StrategyConfig {
            transfers: strategy_file.transfers,
            chips: strategy_file.chips,
            builder: strategy_file.builder,
        },
        season: strategy_file.season,
        data_paths: strategy_file.data_paths,
        snapshot_path: strategy_file.output.squad_snapshot,
    };

    validate(&config)?;

    Ok(config)
}

/// The files `load_config_from` reads from `config/`.
pub const CONFIG_FILES: [&str; 2] = ["league.toml", "strategy.toml"];

/// Copy each of `CONFIG_FILES` missing from `config/` out of `defaults/`.
/// Files already in `config/` are left alone. Returns the copied paths.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = defaults_dir.join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "{name} is in neither {} nor {}",
                    config_dir.display(),
                    defaults_dir.display()
                ),
            });
        }

        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
        })?;
        info!("copied default {} into {}", name, config_dir.display());
        copied.push(target);
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if !league.budget.is_finite() || league.budget <= 0.0 {
        return Err(invalid(
            "league.budget",
            format!("must be > 0, got {}", league.budget),
        ));
    }
    if league.club_cap == 0 {
        return Err(invalid("league.club_cap", "must be greater than 0"));
    }

    let transfers = &config.strategy.transfers;
    if transfers.per_gameweek > 2 {
        return Err(invalid(
            "transfers.per_gameweek",
            format!("must be at most 2, got {}", transfers.per_gameweek),
        ));
    }

    let thresholds: &[(&str, f64)] = &[
        ("transfers.min_gain", transfers.min_gain),
        (
            "chips.triple_captain_threshold",
            config.strategy.chips.triple_captain_threshold,
        ),
        (
            "chips.bench_boost_threshold",
            config.strategy.chips.bench_boost_threshold,
        ),
        ("builder.value_min_xp", config.strategy.builder.value_min_xp),
    ];
    for (name, val) in thresholds {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be finite and >= 0, got {val}")));
        }
    }

    let plan = config.build_plan();
    for (pos, tranche) in plan.tranches.iter() {
        if tranche.premium > pos.capacity() {
            return Err(invalid(
                &format!("builder.plan.{}", pos.code()),
                format!(
                    "premium count {} exceeds the {} capacity of {}",
                    tranche.premium,
                    pos.code(),
                    pos.capacity()
                ),
            ));
        }
        if !tranche.budget.is_finite() || tranche.budget < 0.0 {
            return Err(invalid(
                &format!("builder.plan.{}", pos.code()),
                format!("budget must be >= 0, got {}", tranche.budget),
            ));
        }
    }

    let season = &config.season;
    if season.start_gameweek == 0 || season.start_gameweek > season.end_gameweek {
        return Err(invalid(
            "season.start_gameweek",
            format!(
                "must be in 1..={}, got {}",
                season.end_gameweek, season.start_gameweek
            ),
        ));
    }
    for gw in &season.void_gameweeks {
        if !(season.start_gameweek..=season.end_gameweek).contains(gw) {
            warn!(
                "void GW{} is outside GW{}..=GW{} and has no effect",
                gw, season.start_gameweek, season.end_gameweek
            );
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
