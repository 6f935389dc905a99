mod repository;
mod store;

pub use repository::*;
pub use store::*;

/// SQL migration for the parking and tickets tables, with the garage layout
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
