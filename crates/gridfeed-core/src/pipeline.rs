// Pipeline drivers.
//
// Each run covers one season: fetch every table it needs, then normalize,
// aggregate and assemble in memory, then write artifacts. A fetch failure
// returns before anything is written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::aggregate::aggregate_weekly;
use crate::assemble::{assemble_roster, assemble_season, Assembly, AssemblyRules, ExclusionCounts};
use crate::cache::RowCache;
use crate::config::{with_season, Config};
use crate::export::{output_path, write_roster_records, write_season_document};
use crate::model::{PlayerRecord, RawRosterRow, RawWeeklyStatRow, RosterRecord, SeasonDocument};
use crate::source::{RosterKind, RowSource};

/// Per-run switches that are not part of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Write the row cache when the configuration names one. A cache that
    /// cannot be written is logged and reported as `RunSummary::cache = None`.
    pub write_cache: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { write_cache: true }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub season: u16,
    pub count: usize,
    pub output: PathBuf,
    pub cache: Option<PathBuf>,
    pub excluded: ExclusionCounts,
}

// ---------------------------------------------------------------------------
// Pure stages
// ---------------------------------------------------------------------------

/// Points-focused records for one season's roster and weekly stats.
pub fn season_records(
    config: &Config,
    roster: &[RawRosterRow],
    stats: &[RawWeeklyStatRow],
) -> Assembly<PlayerRecord> {
    let totals = aggregate_weekly(stats);
    let rules = AssemblyRules {
        positions: &config.season.positions,
        teams: &config.teams,
    };
    assemble_season(roster, &totals, rules)
}

/// Identity-focused records for one season's roster.
pub fn roster_records(config: &Config, roster: &[RawRosterRow]) -> Assembly<RosterRecord> {
    let rules = AssemblyRules {
        positions: &config.roster.positions,
        teams: &config.teams,
    };
    assemble_roster(roster, rules, &config.roster.id_schemes)
}

/// Build the season document from raw tables, stamped with `updated`.
pub fn build_season_document(
    config: &Config,
    season: u16,
    roster: &[RawRosterRow],
    stats: &[RawWeeklyStatRow],
    updated: DateTime<Utc>,
) -> (SeasonDocument, ExclusionCounts) {
    let assembly = season_records(config, roster, stats);
    (
        SeasonDocument::new(season, assembly.records, updated),
        assembly.excluded,
    )
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Fetch, assemble and write the season document for `season`.
pub async fn run_season(
    config: &Config,
    source: &dyn RowSource,
    season: u16,
    options: RunOptions,
) -> Result<RunSummary> {
    info!("Season {season}: fetching from {}", source.describe());
    let roster = source.roster_rows(season, RosterKind::Seasonal).await?;
    let stats = source.weekly_stats(season).await?;
    info!(
        "Season {season}: {} roster rows, {} weekly stat rows",
        roster.len(),
        stats.len()
    );

    let (document, excluded) = build_season_document(config, season, &roster, &stats, Utc::now());
    log_assembly(season, document.count, &excluded);

    let output = output_path(&config.season.output, season);
    write_season_document(&output, &document)
        .with_context(|| format!("failed to write season document for {season}"))?;

    let cache = config
        .season
        .cache
        .as_deref()
        .filter(|_| options.write_cache)
        .and_then(|template| {
            write_cache(template, season, |cache| {
                cache.store_roster(season, RosterKind::Seasonal, &roster, &config.roster.id_schemes)?;
                cache.store_weekly(season, &stats)?;
                Ok(())
            })
        });

    Ok(RunSummary {
        season,
        count: document.count,
        output,
        cache,
        excluded,
    })
}

/// Fetch, normalize and write the identity-focused roster for `season`.
pub async fn run_roster(
    config: &Config,
    source: &dyn RowSource,
    season: u16,
    options: RunOptions,
) -> Result<RunSummary> {
    info!("Roster {season}: fetching from {}", source.describe());
    let roster = source.roster_rows(season, RosterKind::Weekly).await?;
    info!("Roster {season}: {} weekly roster rows", roster.len());

    let assembly = roster_records(config, &roster);
    log_assembly(season, assembly.records.len(), &assembly.excluded);

    let output = output_path(&config.roster.output, season);
    write_roster_records(&output, &assembly.records)
        .with_context(|| format!("failed to write roster export for {season}"))?;

    let cache = config
        .roster
        .cache
        .as_deref()
        .filter(|_| options.write_cache)
        .and_then(|template| {
            write_cache(template, season, |cache| {
                cache.store_roster(season, RosterKind::Weekly, &roster, &config.roster.id_schemes)?;
                Ok(())
            })
        });

    Ok(RunSummary {
        season,
        count: assembly.records.len(),
        output,
        cache,
        excluded: assembly.excluded,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write the row cache after the artifact is in place. A failure here leaves
/// the artifact valid, so it is logged and the run still succeeds.
fn write_cache(
    template: &str,
    season: u16,
    fill: impl FnOnce(&mut RowCache) -> Result<()>,
) -> Option<PathBuf> {
    let path = with_season(template, season);
    let written = RowCache::create(Path::new(&path)).and_then(|mut cache| {
        fill(&mut cache)?;
        cache.commit()
    });
    match written {
        Ok(path) => {
            info!("Cached source rows to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Season {season}: row cache {path} not written: {e:#}");
            None
        }
    }
}

fn log_assembly(season: u16, count: usize, excluded: &ExclusionCounts) {
    info!(
        "Season {season}: {count} players kept; excluded {} (missing id {}, position {}, team {}, duplicate {})",
        excluded.total(),
        excluded.missing_id,
        excluded.position,
        excluded.team,
        excluded.duplicate
    );
    if count == 0 {
        warn!("Season {season} produced no players");
    }
}
