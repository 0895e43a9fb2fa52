//! Storefinder Core - Shared types library.
//!
//! This crate provides the types used across all Storefinder components:
//! - `data` - Store and user persistence, aggregations and services
//! - `cli` - Command-line tools for migrations, seeding and queries
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access. Slug derivation, heart toggling and distance math live here so
//! every backend shares one definition.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, slugs, points, ratings and hearts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
