// Library root: re-exports all modules so integration tests and the CLI can
// access the crate's public API.

pub mod aggregate;
pub mod assemble;
pub mod cache;
pub mod config;
pub mod export;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod source;
