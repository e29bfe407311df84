// Position canonicalization.

use crate::model::Position;
use std::collections::BTreeSet;

/// Per-pipeline rules for turning a free-text position into a canonical one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionPolicy {
    pub allowed: BTreeSet<Position>,
    /// Rewrite fullbacks ("FB") to running backs before the membership check.
    pub fold_fullback: bool,
}

impl PositionPolicy {
    pub fn new(allowed: impl IntoIterator<Item = Position>, fold_fullback: bool) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            fold_fullback,
        }
    }

    /// Points-focused defaults: every fantasy position, fullbacks dropped.
    pub fn season_default() -> Self {
        Self::new(Position::ALL, false)
    }

    /// Identity-focused defaults: offensive skill positions, fullbacks
    /// counted as running backs.
    pub fn roster_default() -> Self {
        Self::new(
            [Position::QB, Position::RB, Position::WR, Position::TE],
            true,
        )
    }
}

/// Map a raw position label to a canonical position, or `None` when the row
/// should be excluded.
pub fn canonical_position(raw: Option<&str>, policy: &PositionPolicy) -> Option<Position> {
    let upper = raw.map(str::trim).filter(|s| !s.is_empty())?.to_uppercase();

    let label = match upper.as_str() {
        "DEF" => "DST",
        "FB" if policy.fold_fullback => "RB",
        other => other,
    };

    Position::from_str_pos(label).filter(|pos| policy.allowed.contains(pos))
}
