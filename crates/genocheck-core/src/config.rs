//! Configuration schema (genocheck.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::catalog::{MetadataCatalog, PrefixRule, StandardCatalog};
use crate::finding::Severity;
use crate::identity::{DatabaseIdentity, DatabaseKind, Species};
use crate::metadata::GroupSelection;

fn default_groups() -> Vec<String> {
    vec!["release".to_string()]
}

fn default_output_level() -> Severity {
    Severity::Problem
}

fn default_max_parallel() -> usize {
    8
}

fn default_check_timeout_secs() -> u64 {
    600
}

/// One database to check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Logical database name (e.g. `homo_sapiens_core_110_38`)
    pub name: String,

    /// Connection URL: `sqlite://<path>` or `postgres://...`
    pub url: String,

    /// Name of the previous-release counterpart (another `[[databases]]` entry)
    #[serde(default)]
    pub previous: Option<String>,

    /// Explicit species, overriding name parsing
    #[serde(default)]
    pub species: Option<String>,

    /// Explicit kind, overriding name parsing
    #[serde(default)]
    pub kind: Option<DatabaseKind>,

    /// Explicit schema version, overriding name parsing
    #[serde(default)]
    pub schema_version: Option<u32>,
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            previous: None,
            species: None,
            kind: None,
            schema_version: None,
        }
    }

    pub fn with_previous(mut self, previous: impl Into<String>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    /// Resolve the identity: explicit fields win, the catalog fills the rest
    ///
    /// A name the catalog cannot parse is accepted only when kind and schema
    /// version are both given explicitly.
    pub fn resolve(&self, catalog: &dyn MetadataCatalog) -> Result<DatabaseIdentity, ConfigError> {
        let parsed = catalog.resolve(&self.name).ok();

        let species = match (&self.species, &parsed) {
            (Some(species), _) => Species::from_name(species),
            (None, Some(parsed)) => parsed.species(),
            (None, None) => Species::Unknown,
        };

        let kind = self
            .kind
            .or_else(|| parsed.as_ref().map(|p| p.kind()))
            .ok_or_else(|| ConfigError::UnresolvedDatabase {
                name: self.name.clone(),
                missing: "kind",
            })?;

        let schema_version = self
            .schema_version
            .or_else(|| parsed.as_ref().map(|p| p.schema_version()))
            .ok_or_else(|| ConfigError::UnresolvedDatabase {
                name: self.name.clone(),
                missing: "schema_version",
            })?;

        Ok(DatabaseIdentity::new(self.name.clone(), species, kind, schema_version))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Groups selected for the run
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,

    /// Minimum severity shown in terminal output
    #[serde(default = "default_output_level")]
    pub output_level: Severity,

    /// Maximum number of (database, check) tasks in flight
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Wall-clock budget per check, in seconds
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,

    /// Drift threshold overrides by check name
    #[serde(default)]
    pub thresholds: HashMap<String, f64>,

    /// Stable ID prefix overrides by species name (`IGNORE` disables)
    #[serde(default)]
    pub prefixes: HashMap<String, String>,

    /// Databases under test
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: std::path::PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            output_level: default_output_level(),
            max_parallel: default_max_parallel(),
            check_timeout_secs: default_check_timeout_secs(),
            thresholds: HashMap::new(),
            prefixes: HashMap::new(),
            databases: Vec::new(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel == 0 {
            return Err(ConfigError::Invalid("max_parallel must be at least 1".to_string()));
        }

        if self.check_timeout_secs == 0 {
            return Err(ConfigError::Invalid("check_timeout_secs must be at least 1".to_string()));
        }

        for (check, threshold) in &self.thresholds {
            if !threshold.is_finite() || *threshold <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "threshold for {} must be a positive number, got {}",
                    check, threshold
                )));
            }
        }

        // Every unlisted name resolves to Unknown, so overrides for them would collide
        let mut species_names: Vec<&String> = self.prefixes.keys().collect();
        species_names.sort();
        for species in species_names {
            if Species::from_name(species) == Species::Unknown {
                return Err(ConfigError::Invalid(format!(
                    "[prefixes] names unrecognised species {}",
                    species
                )));
            }
        }

        for db in &self.databases {
            if let Some(species) = &db.species {
                if Species::from_name(species) == Species::Unknown {
                    return Err(ConfigError::Invalid(format!(
                        "database {} names unrecognised species {}",
                        db.name, species
                    )));
                }
            }

            if let Some(previous) = &db.previous {
                if previous == &db.name {
                    return Err(ConfigError::Invalid(format!(
                        "database {} names itself as its previous release",
                        db.name
                    )));
                }
                if self.database(previous).is_none() {
                    return Err(ConfigError::Invalid(format!(
                        "database {} refers to unknown previous database {}",
                        db.name, previous
                    )));
                }
            }
        }

        Ok(())
    }

    /// Selected groups
    pub fn selection(&self) -> GroupSelection {
        GroupSelection::new(self.groups.iter().cloned())
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    /// Drift threshold for a check, or the check's own default
    pub fn threshold_for(&self, check: &str, default: f64) -> f64 {
        self.thresholds.get(check).copied().unwrap_or(default)
    }

    /// Set a threshold override for a check
    pub fn set_threshold(&mut self, check: impl Into<String>, threshold: f64) {
        self.thresholds.insert(check.into(), threshold);
    }

    /// Find a database entry by name
    pub fn database(&self, name: &str) -> Option<&DatabaseConfig> {
        self.databases.iter().find(|db| db.name == name)
    }

    /// Metadata catalog with the configured prefix overrides applied
    ///
    /// Overrides for unrecognised species are skipped; `validate` rejects them.
    pub fn catalog(&self) -> StandardCatalog {
        self.prefixes
            .iter()
            .map(|(species, prefix)| (Species::from_name(species), prefix))
            .filter(|(species, _)| *species != Species::Unknown)
            .fold(StandardCatalog::new(), |catalog, (species, prefix)| {
                catalog.with_prefix(species, PrefixRule::parse(prefix))
            })
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot resolve database {name}: no {missing} in name or config")]
    UnresolvedDatabase { name: String, missing: &'static str },
}
