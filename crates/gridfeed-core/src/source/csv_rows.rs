// CSV decoding for nflverse roster and player-stat tables.
//
// Columns are matched by header name and extra columns are ignored. Empty
// cells and the literal `NA` are treated as missing.

use crate::model::{RawRosterRow, RawWeeklyStatRow};
use crate::source::SourceError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Roster CSV row. Seasonal and weekly roster tables share these columns;
/// `player_id`/`player_name` are the renamed forms of `gsis_id`/`full_name`
/// that some mirrors publish, so both spellings are read.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RosterCsvRow {
    season: Option<String>,
    week: Option<String>,
    player_id: Option<String>,
    gsis_id: Option<String>,
    player_name: Option<String>,
    full_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    position: Option<String>,
    team: Option<String>,
    status: Option<String>,
    bye_week: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatCsvRow {
    player_id: Option<String>,
    week: Option<String>,
    fantasy_points_ppr: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trim a cell and drop it when empty or `NA`.
fn present(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("NA") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a whole number that may be written as `7` or `7.0`.
fn parse_whole(value: &str) -> Option<u32> {
    if let Ok(n) = value.parse::<u32>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
        Some(f as u32)
    } else {
        None
    }
}

struct RowContext<'a> {
    origin: &'a str,
    line: u64,
}

impl RowContext<'_> {
    fn malformed(&self, message: String) -> SourceError {
        SourceError::Malformed {
            origin: self.origin.to_string(),
            line: self.line,
            message,
        }
    }

    fn whole(&self, column: &str, value: Option<String>) -> Result<Option<u32>, SourceError> {
        match present(value) {
            None => Ok(None),
            Some(v) => parse_whole(&v)
                .map(Some)
                .ok_or_else(|| self.malformed(format!("column `{column}`: not a whole number: {v:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Decode a roster table. `origin` names the file or URL in error messages.
pub fn parse_roster_csv<R: Read>(rdr: R, origin: &str) -> Result<Vec<RawRosterRow>, SourceError> {
    let csv_err = |source: csv::Error| SourceError::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        let ctx = RowContext {
            origin,
            line: record.position().map(|p| p.line()).unwrap_or(0),
        };
        let raw: RosterCsvRow = record.deserialize(Some(&headers)).map_err(csv_err)?;

        let id_columns: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| header.ends_with("_id"))
            .filter_map(|(header, value)| {
                present(Some(value.to_string())).map(|v| (header.to_string(), v))
            })
            .collect();

        let season = ctx
            .whole("season", raw.season)?
            .map(|s| u16::try_from(s).map_err(|_| ctx.malformed(format!("season out of range: {s}"))))
            .transpose()?;

        rows.push(RawRosterRow {
            season,
            week: ctx.whole("week", raw.week)?,
            player_id: present(raw.player_id).or_else(|| present(raw.gsis_id)),
            player_name: present(raw.player_name).or_else(|| present(raw.full_name)),
            first_name: present(raw.first_name),
            last_name: present(raw.last_name),
            position: present(raw.position),
            team: present(raw.team),
            status: present(raw.status),
            bye_week: ctx.whole("bye_week", raw.bye_week)?,
            id_columns,
        });
    }

    Ok(rows)
}

/// Decode a weekly player-stat table.
pub fn parse_weekly_csv<R: Read>(
    rdr: R,
    origin: &str,
) -> Result<Vec<RawWeeklyStatRow>, SourceError> {
    let csv_err = |source: csv::Error| SourceError::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        let ctx = RowContext {
            origin,
            line: record.position().map(|p| p.line()).unwrap_or(0),
        };
        let raw: StatCsvRow = record.deserialize(Some(&headers)).map_err(csv_err)?;

        let player_id = present(raw.player_id)
            .ok_or_else(|| ctx.malformed("missing player_id".to_string()))?;
        let week = ctx
            .whole("week", raw.week)?
            .ok_or_else(|| ctx.malformed("missing week".to_string()))?;
        let fantasy_points_ppr = match present(raw.fantasy_points_ppr) {
            None => None,
            Some(v) => Some(v.parse::<f64>().map_err(|_| {
                ctx.malformed(format!("column `fantasy_points_ppr`: not a number: {v:?}"))
            })?),
        };

        rows.push(RawWeeklyStatRow {
            player_id,
            week,
            fantasy_points_ppr,
        });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
