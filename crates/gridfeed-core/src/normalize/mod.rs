// Pure canonicalizers applied to each raw roster row.

pub mod identity;
pub mod position;
pub mod status;
pub mod teams;

pub use identity::{app_id, display_name, external_ids};
pub use position::{canonical_position, PositionPolicy};
pub use status::canonical_status;
pub use teams::{Team, TeamTable};
