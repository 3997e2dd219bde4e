//! One-shot query execution.
//!
//! Wires the configured SQLite store and inference client into an
//! [`Orchestrator`]. Used by `hire ask` and by `hire serve` at startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use hiring_orchestrator_core::Orchestrator;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;
use crate::{db, inference, migrate};

/// Connect the store (creating the schema if needed) and build the
/// orchestrator for `config`.
pub async fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let store = SqliteStore::new(
        pool,
        Duration::from_secs(config.db.statement_timeout_secs),
    );
    let client = inference::create_client(&config.inference)?;
    if !config.inference.is_enabled() {
        tracing::warn!(
            component = "inference",
            "inference disabled; every query will be answered by the error handler"
        );
    }

    tracing::info!(
        component = "orchestrator",
        db = %config.db.path.display(),
        model = client.model_name(),
        "orchestrator ready"
    );

    Ok(Orchestrator::new(client, Arc::new(store)))
}

/// Run the `ask` command: process one query and print the result as JSON.
///
/// With `detailed`, prints the full request state instead of the
/// transport-facing response.
pub async fn run_ask(config: &Config, query: &str, detailed: bool) -> Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("query must not be empty");
    }

    let orchestrator = build_orchestrator(config).await?;

    let output = if detailed {
        serde_json::to_string_pretty(&orchestrator.run(query).await)?
    } else {
        serde_json::to_string_pretty(&orchestrator.process_query(query).await)?
    };
    println!("{}", output);

    Ok(())
}
