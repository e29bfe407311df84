// SQLite row cache: keeps the rich pre-normalization rows of a run so a later
// run can rebuild outputs without downloading again.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};

use crate::model::{RawRosterRow, RawWeeklyStatRow};
use crate::normalize::{app_id, external_ids};
use crate::source::RosterKind;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS roster_rows (
        season       INTEGER NOT NULL,
        kind         TEXT NOT NULL,
        row_index    INTEGER NOT NULL,
        week         INTEGER,
        player_id    TEXT,
        app_id       TEXT,
        player_name  TEXT,
        first_name   TEXT,
        last_name    TEXT,
        position     TEXT,
        team         TEXT,
        status       TEXT,
        bye_week     INTEGER,
        id_columns   TEXT NOT NULL,
        external_ids TEXT,
        PRIMARY KEY (season, kind, row_index)
    );

    CREATE TABLE IF NOT EXISTS weekly_stats (
        season             INTEGER NOT NULL,
        row_index          INTEGER NOT NULL,
        player_id          TEXT NOT NULL,
        week               INTEGER NOT NULL,
        fantasy_points_ppr REAL,
        PRIMARY KEY (season, row_index)
    );

    CREATE TABLE IF NOT EXISTS cache_meta (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// A row cache file. Rows are stored with their source position so replays
/// preserve order.
pub struct RowCache {
    conn: Connection,
    /// Final location when the cache was opened with [`RowCache::create`].
    target: Option<PathBuf>,
    /// File the connection actually writes to.
    path: PathBuf,
}

impl RowCache {
    /// Open (or create) a cache at `path` and ensure the schema exists. Pass
    /// `":memory:"` for an ephemeral cache.
    #[cfg(test)]
    pub fn open(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("failed to open row cache at {path}"))?;
        conn.execute_batch(SCHEMA)
            .context("failed to create row cache schema")?;
        Ok(Self {
            conn,
            target: None,
            path: PathBuf::from(path),
        })
    }

    /// Open an existing cache for reading. Fails if the file is missing.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("row cache {} does not exist", path.display());
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open row cache at {}", path.display()))?;
        Ok(Self {
            conn,
            target: None,
            path: path.to_path_buf(),
        })
    }

    /// Start a fresh cache destined for `path`. Rows are written to a sibling
    /// temporary file; [`RowCache::commit`] replaces `path` with it, so an
    /// existing cache is overwritten, never merged.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let staging = staging_path(path);
        if staging.exists() {
            std::fs::remove_file(&staging)
                .with_context(|| format!("failed to remove stale {}", staging.display()))?;
        }

        let conn = Connection::open(&staging)
            .with_context(|| format!("failed to create row cache at {}", staging.display()))?;
        conn.execute_batch(SCHEMA)
            .context("failed to create row cache schema")?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_meta (key, value) VALUES ('written_at', ?1)",
            params![chrono::Utc::now().to_rfc3339()],
        )
        .context("failed to stamp row cache")?;

        Ok(Self {
            conn,
            target: Some(path.to_path_buf()),
            path: staging,
        })
    }

    /// Close the cache and move it into place. Returns the final path.
    pub fn commit(self) -> Result<PathBuf> {
        let Self { conn, target, path } = self;
        conn.close()
            .map_err(|(_, e)| e)
            .context("failed to close row cache")?;

        match target {
            Some(target) => {
                std::fs::rename(&path, &target).with_context(|| {
                    format!("failed to move {} to {}", path.display(), target.display())
                })?;
                Ok(target)
            }
            None => Ok(path),
        }
    }

    /// Store roster rows for one season, replacing any earlier rows of the
    /// same season and kind. Each row also gets its app id and external id
    /// mapping (for rows that have a player id).
    pub fn store_roster(
        &mut self,
        season: u16,
        kind: RosterKind,
        rows: &[RawRosterRow],
        id_schemes: &[String],
    ) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("failed to begin roster cache transaction")?;

        tx.execute(
            "DELETE FROM roster_rows WHERE season = ?1 AND kind = ?2",
            params![season, kind.as_str()],
        )
        .context("failed to clear cached roster rows")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO roster_rows
                        (season, kind, row_index, week, player_id, app_id, player_name,
                         first_name, last_name, position, team, status, bye_week,
                         id_columns, external_ids)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                )
                .context("failed to prepare roster insert")?;

            for (index, row) in rows.iter().enumerate() {
                let id_columns = serde_json::to_string(&row.id_columns)
                    .context("failed to serialize id columns")?;
                let external = match row.player_id.as_deref() {
                    Some(raw_id) => Some(
                        serde_json::to_string(&external_ids(row, raw_id, id_schemes))
                            .context("failed to serialize external ids")?,
                    ),
                    None => None,
                };

                stmt.execute(params![
                    season,
                    kind.as_str(),
                    index as i64,
                    row.week,
                    row.player_id,
                    row.player_id.as_deref().map(app_id),
                    row.player_name,
                    row.first_name,
                    row.last_name,
                    row.position,
                    row.team,
                    row.status,
                    row.bye_week,
                    id_columns,
                    external,
                ])
                .context("failed to insert cached roster row")?;
            }
        }

        tx.commit().context("failed to commit roster cache")?;
        Ok(rows.len())
    }

    /// Store weekly stat rows for one season, replacing earlier rows.
    pub fn store_weekly(&mut self, season: u16, rows: &[RawWeeklyStatRow]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("failed to begin weekly cache transaction")?;

        tx.execute(
            "DELETE FROM weekly_stats WHERE season = ?1",
            params![season],
        )
        .context("failed to clear cached weekly stats")?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO weekly_stats (season, row_index, player_id, week, fantasy_points_ppr)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .context("failed to prepare weekly insert")?;

            for (index, row) in rows.iter().enumerate() {
                stmt.execute(params![
                    season,
                    index as i64,
                    row.player_id,
                    row.week,
                    row.fantasy_points_ppr,
                ])
                .context("failed to insert cached weekly row")?;
            }
        }

        tx.commit().context("failed to commit weekly cache")?;
        Ok(rows.len())
    }

    /// Load roster rows for a season in their original order.
    pub fn load_roster(&self, season: u16, kind: RosterKind) -> Result<Vec<RawRosterRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT week, player_id, player_name, first_name, last_name, position,
                        team, status, bye_week, id_columns
                 FROM roster_rows WHERE season = ?1 AND kind = ?2 ORDER BY row_index",
            )
            .context("failed to prepare load_roster query")?;

        let rows = stmt
            .query_map(params![season, kind.as_str()], |row| {
                let id_columns_json: String = row.get(9)?;
                Ok((
                    RawRosterRow {
                        season: Some(season),
                        week: row.get(0)?,
                        player_id: row.get(1)?,
                        player_name: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        position: row.get(5)?,
                        team: row.get(6)?,
                        status: row.get(7)?,
                        bye_week: row.get(8)?,
                        id_columns: Default::default(),
                    },
                    id_columns_json,
                ))
            })
            .context("failed to query cached roster rows")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map cached roster rows")?;

        rows.into_iter()
            .map(|(mut row, json)| {
                row.id_columns =
                    serde_json::from_str(&json).context("failed to parse cached id columns")?;
                Ok(row)
            })
            .collect()
    }

    /// Load weekly stat rows for a season in their original order.
    pub fn load_weekly(&self, season: u16) -> Result<Vec<RawWeeklyStatRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT player_id, week, fantasy_points_ppr
                 FROM weekly_stats WHERE season = ?1 ORDER BY row_index",
            )
            .context("failed to prepare load_weekly query")?;

        let rows = stmt
            .query_map(params![season], |row| {
                Ok(RawWeeklyStatRow {
                    player_id: row.get(0)?,
                    week: row.get(1)?,
                    fantasy_points_ppr: row.get(2)?,
                })
            })
            .context("failed to query cached weekly stats")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map cached weekly stats")?;

        Ok(rows)
    }

    /// External id mappings stored for a season, keyed by raw player id, in
    /// row order (duplicates included).
    #[cfg(test)]
    pub fn external_ids(&self, season: u16, kind: RosterKind) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT player_id, external_ids FROM roster_rows
                 WHERE season = ?1 AND kind = ?2 AND external_ids IS NOT NULL
                 ORDER BY row_index",
            )
            .context("failed to prepare external_ids query")?;

        let rows = stmt
            .query_map(params![season, kind.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .context("failed to query external ids")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map external ids")?;

        Ok(rows)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
