// Status canonicalization: free-text roster/injury designations to a small
// fixed set. First matching cue wins, so "doubtful" is never read as "out".

use crate::model::Status;

const OUT_CUES: [&str; 4] = ["out", "pup", "ir", "dnp"];

/// Map a raw status string to a canonical status. Total: every input,
/// including a missing one, resolves to a category.
pub fn canonical_status(raw: Option<&str>) -> Status {
    let s = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_lowercase(),
        None => return Status::Active,
    };

    if s.contains("doubt") {
        Status::Doubtful
    } else if s.contains("quest") || s == "q" {
        Status::Questionable
    } else if OUT_CUES.iter().any(|cue| s.contains(cue)) {
        Status::Out
    } else if s.contains("sus") {
        Status::Suspended
    } else {
        Status::Active
    }
}
