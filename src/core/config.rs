//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Project;
use crate::engine::DEFAULT_MARKUP_FACTOR;

/// Price list consulted when a material has no valuation rate
pub const DEFAULT_BUYING_PRICE_LIST: &str = "Standard Buying";

/// fabest configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selling price over total cost
    pub markup_factor: Option<f64>,

    /// Material set used when none is given on the command line
    pub default_material_set: Option<String>,

    /// Price list consulted when a material has no valuation rate
    pub buying_price_list: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Log filter used when FABEST_LOG is not set
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessor fallbacks)

        // 2. Global user config (~/.config/fabest/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.fabest/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_dir().join("config.yaml")) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(markup) = var("FABEST_MARKUP") {
            match markup.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => self.markup_factor = Some(value),
                _ => tracing::warn!(value = %markup, "ignoring invalid FABEST_MARKUP"),
            }
        }
        if let Some(set) = var("FABEST_MATERIAL_SET") {
            self.default_material_set = Some(set);
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "fabest")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.markup_factor.is_some() {
            self.markup_factor = other.markup_factor;
        }
        if other.default_material_set.is_some() {
            self.default_material_set = other.default_material_set;
        }
        if other.buying_price_list.is_some() {
            self.buying_price_list = other.buying_price_list;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }

    pub fn markup_factor(&self) -> f64 {
        self.markup_factor.unwrap_or(DEFAULT_MARKUP_FACTOR)
    }

    pub fn buying_price_list(&self) -> &str {
        self.buying_price_list
            .as_deref()
            .unwrap_or(DEFAULT_BUYING_PRICE_LIST)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }
}
