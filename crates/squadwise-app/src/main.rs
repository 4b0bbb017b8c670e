// Season runner entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout is for summaries)
// 2. Load config
// 3. Load the season catalog
// 4. Resume from the squad snapshot, if one exists for this season
// 5. Play each gameweek: build or advance, transfer, finalize, chips, score
// 6. Write the squad snapshot

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use squadwise_core::catalog::SeasonCatalog;
use squadwise_core::config::{self, Config};
use squadwise_core::projections::Projections;
use squadwise_core::squad::context::GameweekContext;
use squadwise_core::squad::state::Squad;
use squadwise_core::summary::result_summary;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("squadwise starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, season={}, GW{}..=GW{}",
        config.league.name,
        config.season.name,
        config.season.start_gameweek,
        config.season.end_gameweek
    );

    // 3. Load the season catalog
    let catalog = SeasonCatalog::load(&config.season.name, Path::new(&config.data_paths.catalog))
        .context("failed to load player catalog")?;

    // 4. Resume
    let snapshot_path = PathBuf::from(&config.snapshot_path);
    let mut squad = load_snapshot(&snapshot_path, &config.season.name)?;
    let first = match &squad {
        Some(s) => {
            info!("Resuming {} after GW{}", s.season(), s.gameweek());
            s.gameweek() + 1
        }
        None => config.season.start_gameweek,
    };

    // 5. Play the season
    let mut season_points = 0.0;
    for gameweek in first..=config.season.end_gameweek {
        match play_gameweek(&config, &catalog, squad.take(), gameweek) {
            Some((next, points)) => {
                season_points += points;
                squad = Some(next);
            }
            None => squad = None,
        }
    }

    let Some(squad) = squad else {
        println!("No squad could be built for {}", config.season.name);
        return Ok(());
    };
    println!("{}", squad);
    println!("Season total: {:.1}", season_points);

    // 6. Snapshot
    let json = serde_json::to_string_pretty(&squad).context("failed to serialize squad")?;
    std::fs::write(&snapshot_path, json)
        .with_context(|| format!("failed to write {}", snapshot_path.display()))?;
    info!("Squad snapshot written to {}", snapshot_path.display());

    Ok(())
}

/// Run one gameweek. Returns the squad and its actual points, or the
/// incoming squad untouched (with 0 points) when the gameweek cannot be
/// played. `None` only when no squad exists and none could be built.
fn play_gameweek(
    config: &Config,
    catalog: &SeasonCatalog,
    squad: Option<Squad>,
    gameweek: u32,
) -> Option<(Squad, f64)> {
    let season = &config.season.name;
    let projections = match Projections::load(
        Path::new(&config.data_paths.predictions),
        season,
        gameweek,
    ) {
        Ok(p) => p,
        Err(e) => {
            warn!("GW{} skipped: {}", gameweek, e);
            println!("GW{} - {} | skipped, no projections", gameweek, season);
            return squad.map(|s| (s, 0.0));
        }
    };

    let settings = config.engine_settings();
    let ctx = GameweekContext::new(catalog, &projections, season, gameweek)
        .with_settings(settings.clone())
        .with_void(config.is_void(gameweek));

    let mut squad = match squad {
        Some(mut s) => {
            s.advance_gameweek(gameweek, settings.max_banked_transfers);
            for t in s.auto_transfer(&ctx) {
                println!(
                    "GW{} transfer: {} -> {} ({}, +{:.2} xP)",
                    gameweek, t.sold, t.bought, t.position, t.gain
                );
            }
            s
        }
        None => {
            let base = Squad::new(season.as_str(), gameweek, config.league.budget, 1);
            match base.build(&ctx, &config.build_plan()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("GW{}: {}", gameweek, e);
                    println!("GW{} - {} | squad construction failed: {}", gameweek, season, e);
                    return None;
                }
            }
        }
    };

    squad.finalize_projected(&ctx);
    for chip in squad.evaluate_chips(&ctx) {
        println!("GW{} chip: {}", gameweek, chip);
    }
    squad.finalize_results(&ctx);

    println!("{}", result_summary(&squad, &ctx));
    let points = squad.actual_total(&ctx);
    Some((squad, points))
}

/// Load a previous run's squad. Snapshots from another season are ignored.
fn load_snapshot(path: &Path, season: &str) -> anyhow::Result<Option<Squad>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let squad: Squad = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse squad snapshot {}", path.display()))?;
    if squad.season() != season {
        warn!(
            "ignoring snapshot for season {} (running {})",
            squad.season(),
            season
        );
        return Ok(None);
    }
    Ok(Some(squad))
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("squadwise.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadwise=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
