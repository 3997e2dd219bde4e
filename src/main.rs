//! # Hiring Orchestrator CLI (`hire`)
//!
//! The `hire` binary runs recruitment queries against the local people
//! database, either one at a time or behind the HTTP surface.
//!
//! ## Usage
//!
//! ```bash
//! hire --config ./config/hire.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hire init` | Create the SQLite database and schema |
//! | `hire ask "<query>"` | Run one query and print the response |
//! | `hire people` | List stored people |
//! | `hire stats` | Summarize stored people |
//! | `hire serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! hire init
//! hire ask "Add Priya Sharma, a senior ML engineer from Pune"
//! hire ask "Search for DevOps engineers in Berlin and add top 3" --detailed
//! hire people --role devops --location Berlin
//! RUST_LOG=debug hire serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use hiring_orchestrator::people::PeopleQuery;
use hiring_orchestrator::{ask, config, migrate, people, server};

/// Hiring Orchestrator CLI: route recruitment queries to local storage,
/// external candidate synthesis, or both.
#[derive(Parser)]
#[command(
    name = "hire",
    about = "Hiring Orchestrator: route recruitment queries to the right agent",
    version,
    long_about = "Hiring Orchestrator classifies each natural-language recruitment query, \
    routes it to a local database agent, an external search agent or a hybrid agent, \
    and returns a single structured JSON response."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/hire.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `people` table with its
    /// indexes. Safe to run repeatedly.
    Init,

    /// Run a single query and print the response as JSON.
    Ask {
        /// Natural-language query.
        query: String,

        /// Print the full request state instead of the response.
        #[arg(long)]
        detailed: bool,
    },

    /// List stored people, newest first.
    People {
        /// Exact name lookup (case-insensitive). Ignores other filters.
        #[arg(long)]
        name: Option<String>,

        /// Role substring filter.
        #[arg(long)]
        role: Option<String>,

        /// Location filter (case-insensitive).
        #[arg(long)]
        location: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// Show people counts by source and the most common roles.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Store-only commands run with defaults when no config file exists.
    let cfg = match cli.command {
        Commands::Init | Commands::People { .. } | Commands::Stats => {
            config::load_or_minimal(&cli.config)?
        }
        Commands::Ask { .. } | Commands::Serve => config::load_config(&cli.config)?,
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ask { query, detailed } => {
            ask::run_ask(&cfg, &query, detailed).await?;
        }
        Commands::People {
            name,
            role,
            location,
            limit,
        } => {
            let query = PeopleQuery {
                name,
                role,
                location,
                limit,
            };
            people::run_people(&cfg, &query).await?;
        }
        Commands::Stats => {
            people::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
