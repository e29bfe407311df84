// Identity resolution: display names, synthetic app ids, and the external
// identifier mapping.

use crate::model::RawRosterRow;
use std::collections::BTreeMap;

/// Key under which the synthetic app id is stored in the external id map.
pub const APP_ID_KEY: &str = "app_id";
/// Key under which the raw player id is stored in the external id map.
pub const PLAYER_ID_KEY: &str = "player_id";

/// Identifier schemes collected when the configuration names none.
pub const DEFAULT_ID_SCHEMES: [&str; 8] = [
    "gsis_id",
    "pfr_id",
    "pff_id",
    "sportradar_id",
    "yahoo_id",
    "fantasy_data_id",
    "rotowire_id",
    "rotoworld_id",
];

/// Synthetic application-level id for a raw player id.
pub fn app_id(raw_id: &str) -> String {
    format!("player-{raw_id}")
}

/// Display name for a row: the direct name when present, otherwise
/// "first last" trimmed. Returns `None` only when every name field is blank.
pub fn display_name(row: &RawRosterRow) -> Option<String> {
    if let Some(name) = row.player_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let first = row.first_name.as_deref().unwrap_or("");
    let last = row.last_name.as_deref().unwrap_or("");
    let joined = format!("{first} {last}").trim().to_string();

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Collect the configured identifier schemes present on `row`, plus the
/// synthetic app id and the raw player id. Absent schemes are omitted.
pub fn external_ids(
    row: &RawRosterRow,
    raw_id: &str,
    schemes: &[String],
) -> BTreeMap<String, String> {
    let mut ids: BTreeMap<String, String> = schemes
        .iter()
        .filter_map(|scheme| {
            row.id_columns
                .get(scheme)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (scheme.clone(), value.trim().to_string()))
        })
        .collect();

    ids.insert(APP_ID_KEY.to_string(), app_id(raw_id));
    ids.insert(PLAYER_ID_KEY.to_string(), raw_id.to_string());
    ids
}
