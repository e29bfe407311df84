// Raw row sources: where roster and weekly stat tables come from.
//
// The pipelines only see the `RowSource` trait. Adapters download nflverse
// release assets, read the same files from disk, or replay a row cache.

pub mod csv_rows;
pub mod http;
pub mod local;

use crate::config::{SourceConfig, SourceKind};
use crate::model::{RawRosterRow, RawWeeklyStatRow};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use http::HttpSource;
pub use local::{CacheSource, CsvDirSource};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("request to {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {origin}: {source}")]
    Csv { origin: String, source: csv::Error },

    #[error("malformed row in {origin} at line {line}: {message}")]
    Malformed {
        origin: String,
        line: u64,
        message: String,
    },

    #[error("row cache {path}: {message}")]
    Cache { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Which roster table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RosterKind {
    /// One row per player per season.
    Seasonal,
    /// One row per player per week.
    Weekly,
}

impl RosterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RosterKind::Seasonal => "seasonal",
            RosterKind::Weekly => "weekly",
        }
    }
}

/// Supplies raw tables for one season. A failed call aborts the run.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    async fn roster_rows(
        &self,
        season: u16,
        kind: RosterKind,
    ) -> Result<Vec<RawRosterRow>, SourceError>;

    async fn weekly_stats(&self, season: u16) -> Result<Vec<RawWeeklyStatRow>, SourceError>;
}

// ---------------------------------------------------------------------------
// Transport and URL templates
// ---------------------------------------------------------------------------

/// Network settings handed to the HTTP client. Certificate checks are relaxed
/// only for the client built from these options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Location templates for the three tables; `{season}` is substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTemplates {
    pub roster: String,
    pub weekly_roster: String,
    pub stats: String,
}

impl TableTemplates {
    pub fn roster_for(&self, kind: RosterKind) -> &str {
        match kind {
            RosterKind::Seasonal => &self.roster,
            RosterKind::Weekly => &self.weekly_roster,
        }
    }

    /// Keep only the final path segment of each template, for reading the
    /// same assets out of a local directory.
    pub fn file_names(&self) -> Self {
        fn last_segment(template: &str) -> String {
            template
                .rsplit('/')
                .next()
                .unwrap_or(template)
                .to_string()
        }
        Self {
            roster: last_segment(&self.roster),
            weekly_roster: last_segment(&self.weekly_roster),
            stats: last_segment(&self.stats),
        }
    }
}

/// Build the configured source. `cache_template` is the row-cache path the
/// calling pipeline writes to; it is required only for `SourceKind::Cache`.
pub fn build_source(
    config: &SourceConfig,
    cache_template: Option<&str>,
) -> Result<Box<dyn RowSource>, SourceError> {
    let templates = config.templates();
    match config.kind {
        SourceKind::Http => Ok(Box::new(HttpSource::new(templates, &config.transport())?)),
        SourceKind::Csv => Ok(Box::new(CsvDirSource::new(
            Path::new(&config.csv_dir),
            templates.file_names(),
        ))),
        SourceKind::Cache => {
            let template = cache_template.ok_or_else(|| SourceError::Cache {
                path: String::new(),
                message: "no cache path is configured for this command".to_string(),
            })?;
            Ok(Box::new(CacheSource::new(template)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_strip_url_prefix() {
        let templates = TableTemplates {
            roster: "https://example.org/releases/download/rosters/roster_{season}.csv".into(),
            weekly_roster: "roster_weekly_{season}.csv".into(),
            stats: "https://example.org/a/b/player_stats_{season}.csv".into(),
        };
        let names = templates.file_names();
        assert_eq!(names.roster, "roster_{season}.csv");
        assert_eq!(names.weekly_roster, "roster_weekly_{season}.csv");
        assert_eq!(names.stats, "player_stats_{season}.csv");
    }

    #[test]
    fn roster_template_follows_kind() {
        let templates = TableTemplates {
            roster: "a".into(),
            weekly_roster: "b".into(),
            stats: "c".into(),
        };
        assert_eq!(templates.roster_for(RosterKind::Seasonal), "a");
        assert_eq!(templates.roster_for(RosterKind::Weekly), "b");
    }
}
