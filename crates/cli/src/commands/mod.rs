//! CLI command implementations.

pub mod migrate;
pub mod query;
pub mod seed;
