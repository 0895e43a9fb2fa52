//! Storefinder CLI - Migrations, seeding and directory queries.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! storefinder migrate
//!
//! # Load users, stores and reviews from YAML
//! storefinder seed fixtures/stores.yaml
//!
//! # Query the directory
//! storefinder tags
//! storefinder top
//! storefinder store wes-coffee --reviews --author
//! storefinder list --page 2
//! storefinder search coffee
//! storefinder near --lng -79.38 --lat 43.65
//! storefinder heart --user 1 --store 3
//! storefinder hearts --user 1
//!
//! # Run against an in-memory directory seeded from YAML
//! storefinder --memory --seed fixtures/stores.yaml top
//! ```
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr and are
//! filtered with `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storefinder_core::{StoreId, UserId};
use storefinder_data::{Directory, DirectoryConfig};

mod commands;

const DEFAULT_LOG_FILTER: &str = "storefinder=info,storefinder_data=info";

#[derive(Parser)]
#[command(name = "storefinder")]
#[command(author, version, about = "Storefinder CLI tools")]
struct Cli {
    /// Use an in-memory directory instead of `PostgreSQL`
    #[arg(long, global = true)]
    memory: bool,

    /// YAML file to seed the in-memory directory from
    #[arg(long, global = true, value_name = "FILE", requires = "memory")]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    #[command(flatten)]
    Directory(DirectoryCommand),
}

#[derive(Subcommand)]
enum DirectoryCommand {
    /// Load users, stores and reviews from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,
    },
    /// Tags with the number of stores using each
    Tags,
    /// Top rated stores
    Top,
    /// Show one store
    Store {
        /// Store slug
        slug: String,

        /// Include the store's reviews
        #[arg(long)]
        reviews: bool,

        /// Include the author's profile
        #[arg(long)]
        author: bool,
    },
    /// List stores, newest first
    List {
        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Full-text search over names and descriptions
    Search {
        /// Search terms
        query: String,
    },
    /// Stores near a point
    Near {
        /// Longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },
    /// Heart a store, or un-heart it if already hearted
    Heart {
        /// User ID
        #[arg(long)]
        user: UserId,

        /// Store ID
        #[arg(long)]
        store: StoreId,
    },
    /// Stores a user has hearted
    Hearts {
        /// User ID
        #[arg(long)]
        user: UserId,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => {
            if cli.memory {
                return Err("migrate needs PostgreSQL; drop --memory".into());
            }
            commands::migrate::run().await
        }
        Commands::Directory(command) => {
            let directory = open_directory(cli.memory, cli.seed.as_deref()).await?;
            dispatch(&directory, command).await
        }
    }
}

async fn dispatch(
    directory: &Directory,
    command: DirectoryCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        DirectoryCommand::Seed { file } => {
            let summary = commands::seed::from_file(directory, &file).await?;
            commands::query::print_json(&summary)?;
        }
        DirectoryCommand::Tags => commands::query::tags(directory).await?,
        DirectoryCommand::Top => commands::query::top(directory).await?,
        DirectoryCommand::Store {
            slug,
            reviews,
            author,
        } => commands::query::store(directory, &slug, reviews, author).await?,
        DirectoryCommand::List { page } => commands::query::list(directory, page).await?,
        DirectoryCommand::Search { query } => commands::query::search(directory, &query).await?,
        DirectoryCommand::Near { lng, lat } => commands::query::near(directory, lng, lat).await?,
        DirectoryCommand::Heart { user, store } => {
            commands::query::heart(directory, user, store).await?;
        }
        DirectoryCommand::Hearts { user } => commands::query::hearts(directory, user).await?,
    }
    Ok(())
}

async fn open_directory(
    memory: bool,
    seed: Option<&std::path::Path>,
) -> Result<Directory, Box<dyn std::error::Error>> {
    if memory {
        let directory = Directory::in_memory(DirectoryConfig::settings_from_env()?);
        if let Some(path) = seed {
            commands::seed::from_file(&directory, path).await?;
        }
        return Ok(directory);
    }

    let config = DirectoryConfig::from_env()?;
    Ok(Directory::connect(&config).await?)
}
