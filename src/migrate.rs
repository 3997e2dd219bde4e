use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the `people` table and its indexes. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS people (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            name_key TEXT,
            role TEXT,
            location TEXT,
            source TEXT NOT NULL CHECK (source IN ('manual', 'external')),
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_people_name_key ON people(name_key)")
        .execute(pool)
        .await?;

    // Externally sourced rows are unique by name; manual adds are not.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_people_external_name_key
        ON people(name_key) WHERE source = 'external'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_people_location ON people(location)")
        .execute(pool)
        .await?;

    Ok(())
}
