// Record assembly: eligibility filtering, first-occurrence deduplication, and
// construction of canonical records from raw rows.

use crate::aggregate::{totals_for, SeasonTotals};
use crate::model::{PlayerRecord, Position, RawRosterRow, RosterRecord, Status};
use crate::normalize::{
    app_id, canonical_position, canonical_status, display_name, external_ids, PositionPolicy,
    Team, TeamTable,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Why a raw row did not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    MissingId,
    Position,
    Team,
    Duplicate,
}

/// Per-reason exclusion counts for one assembly pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusionCounts {
    pub missing_id: usize,
    pub position: usize,
    pub team: usize,
    pub duplicate: usize,
}

impl ExclusionCounts {
    fn record(&mut self, reason: Exclusion) {
        match reason {
            Exclusion::MissingId => self.missing_id += 1,
            Exclusion::Position => self.position += 1,
            Exclusion::Team => self.team += 1,
            Exclusion::Duplicate => self.duplicate += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_id + self.position + self.team + self.duplicate
    }
}

/// Ordered records plus what was filtered out on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly<T> {
    pub records: Vec<T>,
    pub excluded: ExclusionCounts,
}

/// The canonicalization rules an assembly pass applies.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRules<'a> {
    pub positions: &'a PositionPolicy,
    pub teams: &'a TeamTable,
}

/// The canonical fields shared by every record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlayer {
    pub id: String,
    pub raw_id: String,
    pub name: String,
    pub position: Position,
    pub team: Team,
    pub status: Status,
    pub bye_week: Option<u32>,
}

// ---------------------------------------------------------------------------
// Row resolution
// ---------------------------------------------------------------------------

/// Canonicalize one row, or say why it is ineligible.
pub fn resolve_row(row: &RawRosterRow, rules: AssemblyRules<'_>) -> Result<ResolvedPlayer, Exclusion> {
    let raw_id = row
        .player_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(Exclusion::MissingId)?;

    let position =
        canonical_position(row.position.as_deref(), rules.positions).ok_or(Exclusion::Position)?;
    let team = rules
        .teams
        .resolve(row.team.as_deref())
        .ok_or(Exclusion::Team)?;

    // A row with no name at all still needs a non-empty display string.
    let name = display_name(row).unwrap_or_else(|| raw_id.to_string());

    Ok(ResolvedPlayer {
        id: app_id(raw_id),
        raw_id: raw_id.to_string(),
        name,
        position,
        team,
        status: canonical_status(row.status.as_deref()),
        bye_week: row.bye_week,
    })
}

/// Walk `rows` in order, keep eligible rows whose raw id has not been seen,
/// and build a record from each survivor.
pub fn assemble<T>(
    rows: &[RawRosterRow],
    rules: AssemblyRules<'_>,
    mut build: impl FnMut(&RawRosterRow, ResolvedPlayer) -> T,
) -> Assembly<T> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let mut excluded = ExclusionCounts::default();

    for row in rows {
        let resolved = match resolve_row(row, rules) {
            Ok(resolved) => resolved,
            Err(reason) => {
                debug!(
                    "excluding row player_id={:?} position={:?} team={:?}: {:?}",
                    row.player_id, row.position, row.team, reason
                );
                excluded.record(reason);
                continue;
            }
        };

        if !seen.insert(resolved.raw_id.clone()) {
            excluded.record(Exclusion::Duplicate);
            continue;
        }

        records.push(build(row, resolved));
    }

    Assembly { records, excluded }
}

// ---------------------------------------------------------------------------
// Record shapes
// ---------------------------------------------------------------------------

/// Assemble points-focused records, left-joining season totals by raw id.
pub fn assemble_season(
    rows: &[RawRosterRow],
    totals: &HashMap<String, SeasonTotals>,
    rules: AssemblyRules<'_>,
) -> Assembly<PlayerRecord> {
    assemble(rows, rules, |_, player| {
        let season = totals_for(totals, &player.raw_id);
        PlayerRecord {
            id: player.id,
            raw_id: player.raw_id,
            name: player.name,
            position: player.position,
            team: player.team.code,
            team_name: player.team.name,
            points: season.points,
            avg_points: season.avg_points(),
            status: player.status,
            bye_week: player.bye_week,
        }
    })
}

/// Assemble identity-focused records with their external id mapping.
pub fn assemble_roster(
    rows: &[RawRosterRow],
    rules: AssemblyRules<'_>,
    id_schemes: &[String],
) -> Assembly<RosterRecord> {
    assemble(rows, rules, |row, player| RosterRecord {
        external_ids: external_ids(row, &player.raw_id, id_schemes),
        id: player.id,
        raw_id: player.raw_id,
        name: player.name,
        first_name: non_blank(row.first_name.as_deref()),
        last_name: non_blank(row.last_name.as_deref()),
        position: player.position,
        team: player.team.code,
        team_name: player.team.name,
        status: player.status,
        bye_week: player.bye_week,
    })
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
