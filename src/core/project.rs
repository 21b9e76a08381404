//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kinds of record kept as YAML files in a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordDir {
    MaterialItems,
    MaterialSets,
    RuleSets,
    Orders,
    Boms,
}

impl RecordDir {
    pub fn all() -> &'static [RecordDir] {
        &[
            RecordDir::MaterialItems,
            RecordDir::MaterialSets,
            RecordDir::RuleSets,
            RecordDir::Orders,
            RecordDir::Boms,
        ]
    }

    /// Directory relative to the project root
    pub fn path(&self) -> &'static str {
        match self {
            RecordDir::MaterialItems => "materials/items",
            RecordDir::MaterialSets => "materials/sets",
            RecordDir::RuleSets => "rules",
            RecordDir::Orders => "orders",
            RecordDir::Boms => "boms",
        }
    }
}

/// Represents a fabest project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .fabest/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(".fabest").is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Use an explicit `--project` path, or discover from the working directory
    pub fn open(explicit: Option<&Path>) -> Result<Self, ProjectError> {
        match explicit {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(".fabest").exists() {
            return Err(ProjectError::AlreadyExists(root));
        }
        Self::init_force(&root)
    }

    /// Initialize even if .fabest/ exists; existing records are left alone
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let config_dir = root.join(".fabest");

        std::fs::create_dir_all(&config_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(config_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for dir in RecordDir::all() {
            std::fs::create_dir_all(root.join(dir.path()))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# fabest project configuration

# Selling price = total cost * markup_factor
# markup_factor: 1.30

# Material set used when `fabest estimate` is run without --set
# default_material_set: ""

# Price list consulted when a material has no valuation rate
# buying_price_list: Standard Buying

# Default output format (auto, yaml, json, csv, table)
# default_format: auto

# Log filter when FABEST_LOG is not set (error, warn, info, debug)
# log_level: warn
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .fabest configuration directory
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(".fabest")
    }

    pub fn dir(&self, kind: RecordDir) -> PathBuf {
        self.root.join(kind.path())
    }

    /// Conventional path of a record file named after its key
    pub fn record_path(&self, kind: RecordDir, key: &str) -> PathBuf {
        self.dir(kind).join(format!("{}.yaml", slug(key)))
    }

    /// Path for a new record that does not clobber an existing file
    ///
    /// Keys that differ only in punctuation or case share a slug ("SO 1",
    /// "SO-1"); later ones get a numeric suffix (`so-1-2.yaml`).
    pub fn new_record_path(&self, kind: RecordDir, key: &str) -> PathBuf {
        let base = slug(key);
        let dir = self.dir(kind);
        let mut path = dir.join(format!("{}.yaml", base));
        let mut n = 2;
        while path.exists() {
            path = dir.join(format!("{}-{}.yaml", base, n));
            n += 1;
        }
        path
    }

    /// Iterate all YAML files of a record kind
    pub fn iter_record_files(&self, kind: RecordDir) -> impl Iterator<Item = PathBuf> {
        walkdir::WalkDir::new(self.dir(kind))
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map_or(false, |ext| ext == "yaml" || ext == "yml")
            })
            .map(|e| e.path().to_path_buf())
    }
}

/// File-name-safe form of a record key ("SS 304 Heavy" -> "ss-304-heavy")
pub fn slug(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "record".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a fabest project (searched from {searched_from:?}). Run 'fabest init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("fabest project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
