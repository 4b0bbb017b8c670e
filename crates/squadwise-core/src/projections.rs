// Projection tables: per-position projected points (xP) for one gameweek.
//
// Files live at `<root>/<season>/GW<n>/<POS>.tsv` with tab-separated
// `Name` and `xP` columns.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::squad::position::{Position, PositionMap};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Projected points for one position, in file order.
#[derive(Debug, Clone, Default)]
pub struct ProjectionTable {
    rows: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl ProjectionTable {
    /// Insert or overwrite a player's projection. An overwrite keeps the
    /// player's first position in the table.
    pub fn insert(&mut self, name: impl Into<String>, xp: f64) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.rows[i].1 = xp,
            None => {
                self.index.insert(name.clone(), self.rows.len());
                self.rows.push((name, xp));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.rows[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[(String, f64)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All four position tables for one gameweek.
#[derive(Debug, Clone, Default)]
pub struct Projections {
    tables: PositionMap<ProjectionTable>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no projections found under {dir}")]
    Empty { dir: String },
}

// ---------------------------------------------------------------------------
// Raw TSV row (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawProjection {
    Name: String,
    xP: f64,
}

fn load_table_from_reader<R: Read>(rdr: R) -> Result<ProjectionTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(rdr);
    let mut table = ProjectionTable::default();
    for result in reader.deserialize::<RawProjection>() {
        match result {
            Ok(raw) => {
                let name = raw.Name.trim().to_string();
                if !raw.xP.is_finite() {
                    warn!("skipping projection for '{}': non-finite xP", name);
                    continue;
                }
                if table.contains(&name) {
                    warn!("duplicate projection for '{}', using latest value", name);
                }
                table.insert(name, raw.xP);
            }
            Err(e) => {
                warn!("skipping malformed projection row: {}", e);
            }
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

impl Projections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of one position's table.
    pub fn path_for(root: &Path, season: &str, gameweek: u32, position: Position) -> PathBuf {
        root.join(season)
            .join(format!("GW{gameweek}"))
            .join(format!("{}.tsv", position.code()))
    }

    /// Load all four tables for a gameweek. A missing table degrades to an
    /// empty one with a warning; missing all four is an error.
    pub fn load(root: &Path, season: &str, gameweek: u32) -> Result<Self, ProjectionError> {
        let mut projections = Projections::new();

        for pos in Position::ALL {
            let path = Self::path_for(root, season, gameweek, pos);
            if !path.exists() {
                warn!("no projections for {} at {}", pos, path.display());
                continue;
            }
            let file = std::fs::File::open(&path).map_err(|e| ProjectionError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let table = load_table_from_reader(file).map_err(|e| ProjectionError::Csv {
                path: path.display().to_string(),
                source: e,
            })?;
            *projections.tables.get_mut(pos) = table;
        }

        if Position::ALL.iter().all(|&p| projections.table(p).is_empty()) {
            return Err(ProjectionError::Empty {
                dir: root
                    .join(season)
                    .join(format!("GW{gameweek}"))
                    .display()
                    .to_string(),
            });
        }

        Ok(projections)
    }

    pub fn insert(&mut self, position: Position, name: impl Into<String>, xp: f64) {
        self.tables.get_mut(position).insert(name, xp);
    }

    pub fn table(&self, position: Position) -> &ProjectionTable {
        self.tables.get(position)
    }

    /// Projection for a player at a position, if listed.
    pub fn get(&self, name: &str, position: Position) -> Option<f64> {
        self.tables.get(position).get(name)
    }

    /// Projection for a player at a position; unlisted players project 0.
    pub fn xp(&self, name: &str, position: Position) -> f64 {
        self.get(name, position).unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
