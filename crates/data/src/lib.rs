//! Storefinder data layer.
//!
//! Stores, users and reviews over either `PostgreSQL` or an in-process
//! store, plus the services built on them: slug assignment, tag counts,
//! the top stores ranking and hearts.
//!
//! ```no_run
//! use storefinder_data::{Directory, DirectoryConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::from_env()?;
//! let directory = Directory::connect(&config).await?;
//! let tags = directory.stores().tags().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod memory;
pub mod models;
pub mod services;

pub use backend::Backend;
pub use config::{ConfigError, DirectoryConfig, Settings};
pub use directory::Directory;
pub use error::{DirectoryError, Result};
pub use memory::MemoryStore;
