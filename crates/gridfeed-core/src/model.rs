// Row and record types shared by every pipeline stage.
//
// Raw rows mirror the upstream tables loosely (every field optional, ids kept
// as text). Records are the canonical shapes written for the front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Raw rows (input side)
// ---------------------------------------------------------------------------

/// One roster row as supplied by a row source. Seasonal rosters carry one row
/// per player; weekly rosters carry one row per player per week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRosterRow {
    pub season: Option<u16>,
    pub week: Option<u32>,
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub status: Option<String>,
    pub bye_week: Option<u32>,
    /// Every non-empty `*_id` column of the source row, keyed by column name.
    pub id_columns: BTreeMap<String, String>,
}

/// One weekly stat row: a player's PPR fantasy points for a single week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWeeklyStatRow {
    pub player_id: String,
    pub week: u32,
    pub fantasy_points_ppr: Option<f64>,
}

// ---------------------------------------------------------------------------
// Canonical enums
// ---------------------------------------------------------------------------

/// Fantasy positions a canonical record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DST,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DST,
    ];

    /// Parse an exact (case-insensitive) canonical label. Aliases such as
    /// "DEF" or "FB" are handled by the position canonicalizer, not here.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "K" => Some(Position::K),
            "DST" => Some(Position::DST),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DST => "DST",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Roster / injury availability category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Active,
    Questionable,
    Doubtful,
    Out,
    Suspended,
}

impl Status {
    pub fn display_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Questionable => "Questionable",
            Status::Doubtful => "Doubtful",
            Status::Out => "Out",
            Status::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Canonical records (output side)
// ---------------------------------------------------------------------------

/// Points-focused canonical record written into the season document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub raw_id: String,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub team_name: String,
    pub points: f64,
    pub avg_points: f64,
    pub status: Status,
    pub bye_week: Option<u32>,
}

/// Identity-focused canonical record: no aggregated points, but carries the
/// external identifier mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRecord {
    pub id: String,
    pub raw_id: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Position,
    pub team: String,
    pub team_name: String,
    pub status: Status,
    pub bye_week: Option<u32>,
    pub external_ids: BTreeMap<String, String>,
}

/// The front-end facing document for one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDocument {
    pub season: u16,
    pub count: usize,
    pub updated: DateTime<Utc>,
    pub players: Vec<PlayerRecord>,
}

impl SeasonDocument {
    /// Build a document; `count` always equals `players.len()`.
    pub fn new(season: u16, players: Vec<PlayerRecord>, updated: DateTime<Utc>) -> Self {
        Self {
            season,
            count: players.len(),
            updated,
            players,
        }
    }
}
