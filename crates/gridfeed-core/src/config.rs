// Configuration loading and parsing (config/gridfeed.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::model::Position;
use crate::normalize::identity::DEFAULT_ID_SCHEMES;
use crate::normalize::{PositionPolicy, TeamTable};
use crate::source::{TableTemplates, TransportOptions};

/// Name of the configuration file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "gridfeed.toml";

/// Placeholder replaced with the season year in paths and URLs.
pub const SEASON_PLACEHOLDER: &str = "{season}";

/// Substitute the season year into a path or URL template.
pub fn with_season(template: &str, season: u16) -> String {
    template.replace(SEASON_PLACEHOLDER, &season.to_string())
}

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

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub seasons: Vec<u16>,
    pub source: SourceConfig,
    pub season: SeasonConfig,
    pub roster: RosterConfig,
    pub teams: TeamTable,
}

/// Command-line settings layered over the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replaces `seasons` when non-empty.
    pub seasons: Vec<u16>,
    pub source: Option<SourceKind>,
    /// Forces `accept_invalid_certs` on.
    pub insecure: bool,
}

impl Config {
    /// Apply `overrides` and validate the result again, so command-line
    /// values are held to the same rules as the file.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self, ConfigError> {
        if !overrides.seasons.is_empty() {
            self.seasons = overrides.seasons.clone();
        }
        if let Some(kind) = overrides.source {
            self.source.kind = kind;
        }
        if overrides.insecure {
            self.source.accept_invalid_certs = true;
        }
        validate(&self)?;
        Ok(self)
    }

    /// Resolve relative input and output locations against `base_dir`.
    /// URLs and absolute paths are left alone.
    fn rebase(mut self, base_dir: &Path) -> Self {
        if base_dir == Path::new(".") || base_dir.as_os_str().is_empty() {
            return self;
        }
        let join = |value: &str| -> String {
            if Path::new(value).is_absolute() {
                value.to_string()
            } else {
                base_dir.join(value).to_string_lossy().into_owned()
            }
        };

        self.source.csv_dir = join(&self.source.csv_dir);
        self.season.output = join(&self.season.output);
        self.season.cache = self.season.cache.as_deref().map(join);
        self.roster.output = join(&self.roster.output);
        self.roster.cache = self.roster.cache.as_deref().map(join);
        self
    }
}

/// Settings for the points-focused season document.
#[derive(Debug, Clone)]
pub struct SeasonConfig {
    pub output: String,
    pub cache: Option<String>,
    pub positions: PositionPolicy,
}

/// Settings for the identity-focused roster export.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub output: String,
    pub cache: Option<String>,
    pub positions: PositionPolicy,
    pub id_schemes: Vec<String>,
}

// ---------------------------------------------------------------------------
// gridfeed.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire gridfeed.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    seasons: Vec<u16>,
    source: SourceConfig,
    season: SeasonSection,
    roster: RosterSection,
    #[serde(default)]
    teams: TeamsSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Csv,
    Cache,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(SourceKind::Http),
            "csv" => Ok(SourceKind::Csv),
            "cache" => Ok(SourceKind::Cache),
            other => Err(format!("unknown source kind `{other}` (expected http, csv or cache)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub roster_url: String,
    pub weekly_roster_url: String,
    pub stats_url: String,
    pub csv_dir: String,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl SourceConfig {
    pub fn templates(&self) -> TableTemplates {
        TableTemplates {
            roster: self.roster_url.clone(),
            weekly_roster: self.weekly_roster_url.clone(),
            stats: self.stats_url.clone(),
        }
    }

    pub fn transport(&self) -> TransportOptions {
        TransportOptions {
            accept_invalid_certs: self.accept_invalid_certs,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonSection {
    output: String,
    #[serde(default)]
    cache: Option<String>,
    positions: Vec<String>,
    #[serde(default)]
    fold_fullback: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RosterSection {
    output: String,
    #[serde(default)]
    cache: Option<String>,
    positions: Vec<String>,
    #[serde(default = "default_true")]
    fold_fullback: bool,
    #[serde(default = "default_id_schemes")]
    id_schemes: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_id_schemes() -> Vec<String> {
    DEFAULT_ID_SCHEMES.iter().map(|s| s.to_string()).collect()
}

/// Optional `[teams]` table: a full replacement name table and/or aliases.
#[derive(Debug, Clone, Default, Deserialize)]
struct TeamsSection {
    #[serde(default)]
    names: Option<BTreeMap<String, String>>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/gridfeed.toml` relative to
/// `base_dir`. Relative `csv_dir`, output and cache paths in the file are
/// taken relative to `base_dir` as well.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    Ok(parse_config(&text, &path)?.rebase(base_dir))
}

/// Parse and validate configuration text. `path` is used in error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let season_positions = parse_positions("season.positions", &file.season.positions)?;
    let roster_positions = parse_positions("roster.positions", &file.roster.positions)?;

    let teams = match file.teams.names {
        Some(names) => TeamTable::new(names, file.teams.aliases),
        None => TeamTable::default().with_aliases(file.teams.aliases),
    };

    let config = Config {
        seasons: file.seasons,
        source: file.source,
        season: SeasonConfig {
            output: file.season.output,
            cache: file.season.cache,
            positions: PositionPolicy::new(season_positions, file.season.fold_fullback),
        },
        roster: RosterConfig {
            output: file.roster.output,
            cache: file.roster.cache,
            positions: PositionPolicy::new(roster_positions, file.roster.fold_fullback),
            id_schemes: file.roster.id_schemes,
        },
        teams,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure `config/gridfeed.toml` exists by copying it from `defaults/`.
/// Returns the list of files that were copied. Existing files are never
/// overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let source = defaults_dir.join(CONFIG_FILE);
    let target = config_dir.join(CONFIG_FILE);
    if !source.is_file() {
        return Ok(vec![]);
    }

    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(mut dest) => {
            let content = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read {}: {e}", source.display()),
            })?;
            std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                ConfigError::DefaultsCopyError {
                    message: format!("failed to write {}: {e}", target.display()),
                }
            })?;
            Ok(vec![target])
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(vec![]),
        Err(e) => Err(ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", target.display()),
        }),
    }
}

/// Convenience wrapper: seeds defaults if needed, then loads config relative
/// to `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_positions(field: &str, labels: &[String]) -> Result<Vec<Position>, ConfigError> {
    if labels.is_empty() {
        return Err(invalid(field, "must name at least one position"));
    }
    labels
        .iter()
        .map(|label| {
            Position::from_str_pos(label).ok_or_else(|| {
                invalid(
                    field,
                    format!("unknown position `{label}` (expected QB, RB, WR, TE, K or DST)"),
                )
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.seasons.is_empty() {
        return Err(invalid("seasons", "must list at least one season"));
    }
    for &season in &config.seasons {
        if !(1920..=2100).contains(&season) {
            return Err(invalid(
                "seasons",
                format!("season {season} is outside 1920..=2100"),
            ));
        }
    }

    let templates = [
        ("source.roster_url", config.source.roster_url.as_str()),
        ("source.weekly_roster_url", config.source.weekly_roster_url.as_str()),
        ("source.stats_url", config.source.stats_url.as_str()),
        ("season.output", config.season.output.as_str()),
        ("roster.output", config.roster.output.as_str()),
    ];
    for (name, value) in templates {
        if value.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
    }

    if config.source.timeout_secs == 0 {
        return Err(invalid("source.timeout_secs", "must be > 0"));
    }

    if config.teams.is_empty() {
        return Err(invalid("teams.names", "must contain at least one team"));
    }
    for (alias, target) in config.teams.aliases() {
        if !config.teams.contains(target) {
            return Err(invalid(
                "teams.aliases",
                format!("alias `{alias}` points at unknown team `{target}`"),
            ));
        }
    }

    if config.roster.id_schemes.iter().any(|s| s.trim().is_empty()) {
        return Err(invalid("roster.id_schemes", "scheme names must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
