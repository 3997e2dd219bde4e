//! Stored people listing and summary.
//!
//! Backs `hire people` and `hire stats`. Both go through the same fixed
//! statements the agents use.

use std::time::Duration;

use anyhow::Result;

use hiring_orchestrator_core::models::{PersonFilter, PersonRow, StoreSummary};
use hiring_orchestrator_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

const STATS_TOP_ROLES: usize = 5;

/// Filters accepted by `hire people`.
#[derive(Debug, Clone, Default)]
pub struct PeopleQuery {
    pub name: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    pub limit: i64,
}

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    Ok(SqliteStore::new(
        pool,
        Duration::from_secs(config.db.statement_timeout_secs),
    ))
}

/// List stored rows. A name lookup ignores the other filters.
pub async fn list_people(store: &dyn Store, query: &PeopleQuery) -> Result<Vec<PersonRow>> {
    if let Some(name) = &query.name {
        let mut rows = store.find_by_name(name).await?;
        rows.truncate(query.limit.max(0) as usize);
        return Ok(rows);
    }

    store
        .select_filtered(&PersonFilter {
            role_like: query.role.clone(),
            location: query.location.clone(),
            limit: query.limit,
        })
        .await
}

fn display(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Run the `people` command and print a table.
pub async fn run_people(config: &Config, query: &PeopleQuery) -> Result<()> {
    let store = open_store(config).await?;
    let rows = list_people(&store, query).await?;
    store.pool().close().await;

    if rows.is_empty() {
        println!("No people found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<28} {:<16} {:<9} CREATED",
        "ID", "NAME", "ROLE", "LOCATION", "SOURCE"
    );
    for row in &rows {
        println!(
            "{:<6} {:<24} {:<28} {:<16} {:<9} {}",
            row.id,
            display(&row.name),
            display(&row.role),
            display(&row.location),
            row.source,
            row.created_at
        );
    }
    println!();
    println!("{} row(s)", rows.len());

    Ok(())
}

/// Summary used by `hire stats`.
pub async fn summarize(store: &dyn Store) -> Result<StoreSummary> {
    store.summary(STATS_TOP_ROLES).await
}

/// Run the `stats` command.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let summary = summarize(&store).await?;
    store.pool().close().await;

    println!("Hiring Orchestrator: People Stats");
    println!("==================================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  People:    {}", summary.total);
    println!();

    if !summary.by_source.is_empty() {
        println!("  By source:");
        for entry in &summary.by_source {
            println!("    {:<10} {}", entry.source, entry.count);
        }
        println!();
    }

    if !summary.top_roles.is_empty() {
        println!("  Top roles:");
        for entry in &summary.top_roles {
            println!("    {:<28} {}", entry.role, entry.count);
        }
    }

    Ok(())
}
