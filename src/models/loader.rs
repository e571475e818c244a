//! Model table loading.
//!
//! `ModelLoader` is the seam between the grid search and wherever tables live.
//! `FileLoader` reads the published whitespace tables from a model directory;
//! `MemoryLoader` serves pre-built tables (tests, embedding callers).

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::models::family::{FamilyDescriptor, GridPoint};
use crate::models::table::ModelTable;

/// Why a grid point's table could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("model file '{path}' not found")]
    NotFound { path: PathBuf },
    #[error("failed to read '{path}': {message}")]
    Io { path: PathBuf, message: String },
    #[error("malformed table at line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("no model directory for {family}: pass --model-root or set {env_var}")]
    NoModelRoot { family: String, env_var: String },
    #[error("{family} has no table for [Fe/H] = {feh:+.2}")]
    UnmappedMetallicity { family: String, feh: f64 },
    #[error("{family} does not describe a file layout")]
    NoLayout { family: String },
    #[error("no table for grid point {point}")]
    MissingGridPoint { point: GridPoint },
    #[error("column '{name}' maps to index {index} but the table is {width} wide")]
    BadColumn { name: String, index: usize, width: usize },
}

/// Produces the model table of a family at one grid point.
pub trait ModelLoader: Sync {
    fn load(&self, family: &FamilyDescriptor, point: &GridPoint) -> Result<ModelTable, LoadError>;
}

/// Parse a whitespace-separated numeric table.
///
/// The first `skip_rows` lines are dropped unconditionally; after that, blank
/// lines and anything following `#` are ignored.
pub fn parse_table(text: &str, skip_rows: usize) -> Result<Vec<Vec<f64>>, LoadError> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (i, raw) in text.lines().enumerate().skip(skip_rows) {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| LoadError::Malformed {
                    line: i + 1,
                    message: format!("'{tok}' is not a number"),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(LoadError::Malformed {
                    line: i + 1,
                    message: format!("expected {} columns, found {}", first.len(), row.len()),
                });
            }
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(LoadError::Malformed {
            line: 0,
            message: "table has no data rows".to_string(),
        });
    }
    Ok(rows)
}

/// Reads tables from disk using each family's `FileLayout`.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
}

impl FileLoader {
    /// Use `root` for every family. `None` defers to each family's env var.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Like `new(None)`, after loading a `.env` file if one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::new(None)
    }

    /// Model directory for `family`.
    pub fn model_dir(&self, family: &FamilyDescriptor) -> Result<PathBuf, LoadError> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        let env_var = family
            .env_var
            .clone()
            .unwrap_or_else(|| format!("{}_MODEL_PATH", family.name.to_uppercase()));
        match std::env::var(&env_var) {
            Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
            _ => Err(LoadError::NoModelRoot {
                family: family.name.clone(),
                env_var,
            }),
        }
    }

    /// Full path of the table for `point`.
    pub fn path_for(&self, family: &FamilyDescriptor, point: &GridPoint) -> Result<PathBuf, LoadError> {
        let layout = family.layout.as_ref().ok_or_else(|| LoadError::NoLayout {
            family: family.name.clone(),
        })?;
        let relative = layout.relative_path(&family.name, point)?;
        Ok(self.model_dir(family)?.join(relative))
    }
}

impl ModelLoader for FileLoader {
    fn load(&self, family: &FamilyDescriptor, point: &GridPoint) -> Result<ModelTable, LoadError> {
        let path = self.path_for(family, point)?;
        debug!(path = %path.display(), "reading model table");
        let text = read_to_string(&path)?;
        let rows = parse_table(&text, family.comment_rows)?;
        ModelTable::for_family(&rows, family)
    }
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })
}

/// Serves tables registered ahead of time, matched by grid point.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    tables: Vec<(GridPoint, ModelTable)>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, point: GridPoint, table: ModelTable) {
        match self.tables.iter_mut().find(|(p, _)| p.matches(&point)) {
            Some(slot) => slot.1 = table,
            None => self.tables.push((point, table)),
        }
    }

    pub fn with(mut self, point: GridPoint, table: ModelTable) -> Self {
        self.insert(point, table);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ModelLoader for MemoryLoader {
    fn load(&self, _family: &FamilyDescriptor, point: &GridPoint) -> Result<ModelTable, LoadError> {
        self.tables
            .iter()
            .find(|(p, _)| p.matches(point))
            .map(|(_, t)| t.clone())
            .ok_or(LoadError::MissingGridPoint { point: *point })
    }
}
