// Library root: re-exports all modules so integration tests and the season
// runner can access the crate's public API.

pub mod catalog;
pub mod config;
pub mod projections;
pub mod squad;
pub mod summary;
