// Local sources: CSV files on disk and a previously written row cache.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::cache::RowCache;
use crate::config::with_season;
use crate::model::{RawRosterRow, RawWeeklyStatRow};
use crate::source::csv_rows::{parse_roster_csv, parse_weekly_csv};
use crate::source::{RosterKind, RowSource, SourceError, TableTemplates};

// ---------------------------------------------------------------------------
// CsvDirSource
// ---------------------------------------------------------------------------

/// Reads the nflverse CSV assets from a directory, using the same file names
/// the release downloads have.
pub struct CsvDirSource {
    dir: PathBuf,
    files: TableTemplates,
}

impl CsvDirSource {
    pub fn new(dir: &Path, files: TableTemplates) -> Self {
        Self {
            dir: dir.to_path_buf(),
            files,
        }
    }

    fn open(&self, template: &str, season: u16) -> Result<(std::fs::File, String), SourceError> {
        let path = self.dir.join(with_season(template, season));
        let origin = path.display().to_string();
        info!("Reading {origin}");
        let file = std::fs::File::open(&path).map_err(|e| SourceError::Io {
            path: origin.clone(),
            source: e,
        })?;
        Ok((file, origin))
    }
}

#[async_trait]
impl RowSource for CsvDirSource {
    fn describe(&self) -> String {
        format!("CSV files in {}", self.dir.display())
    }

    async fn roster_rows(
        &self,
        season: u16,
        kind: RosterKind,
    ) -> Result<Vec<RawRosterRow>, SourceError> {
        let (file, origin) = self.open(self.files.roster_for(kind), season)?;
        parse_roster_csv(file, &origin)
    }

    async fn weekly_stats(&self, season: u16) -> Result<Vec<RawWeeklyStatRow>, SourceError> {
        let (file, origin) = self.open(&self.files.stats, season)?;
        parse_weekly_csv(file, &origin)
    }
}

// ---------------------------------------------------------------------------
// CacheSource
// ---------------------------------------------------------------------------

/// Replays rows stored by an earlier run's row cache.
pub struct CacheSource {
    template: String,
}

impl CacheSource {
    /// `template` is the cache path, with `{season}` substituted per call.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    fn open(&self, season: u16) -> Result<(RowCache, String), SourceError> {
        let path = with_season(&self.template, season);
        info!("Reading row cache {path}");
        let cache = RowCache::open_existing(Path::new(&path)).map_err(|e| SourceError::Cache {
            path: path.clone(),
            message: format!("{e:#}"),
        })?;
        Ok((cache, path))
    }
}

#[async_trait]
impl RowSource for CacheSource {
    fn describe(&self) -> String {
        format!("row cache {}", self.template)
    }

    async fn roster_rows(
        &self,
        season: u16,
        kind: RosterKind,
    ) -> Result<Vec<RawRosterRow>, SourceError> {
        let (cache, path) = self.open(season)?;
        cache
            .load_roster(season, kind)
            .map_err(|e| SourceError::Cache {
                path,
                message: format!("{e:#}"),
            })
    }

    async fn weekly_stats(&self, season: u16) -> Result<Vec<RawWeeklyStatRow>, SourceError> {
        let (cache, path) = self.open(season)?;
        cache.load_weekly(season).map_err(|e| SourceError::Cache {
            path,
            message: format!("{e:#}"),
        })
    }
}
