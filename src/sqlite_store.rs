//! SQLite-backed [`Store`] implementation.
//!
//! Each [`Store`] method maps to one fixed, parameter-bound statement over
//! the `people` table created by [`crate::migrate`]. Every statement runs
//! under the configured statement timeout.
//!
//! The insert-or-ignore primitive is a single `INSERT .. SELECT .. WHERE NOT
//! EXISTS` statement backed by a partial unique index on `name_key` for
//! external rows, so two concurrent requests cannot both insert the same
//! external candidate.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use hiring_orchestrator_core::models::{
    InsertOutcome, PersonFilter, PersonRecord, PersonRow, RoleCount, Source, SourceCount,
    StoreSummary,
};
use hiring_orchestrator_core::store::Store;

const COMPONENT: &str = "sqlite_store";

const PERSON_COLUMNS: &str = "id, name, role, location, source, created_at";

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run one statement under the statement timeout.
    async fn bounded<T>(
        &self,
        statement: &'static str,
        fut: impl Future<Output = std::result::Result<T, sqlx::Error>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.with_context(|| format!("{} failed", statement)),
            Err(_) => {
                tracing::warn!(component = COMPONENT, statement, "statement timed out");
                Err(anyhow!(
                    "{} timed out after {}s",
                    statement,
                    self.timeout.as_secs()
                ))
            }
        }
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn person_from_row(row: &SqliteRow) -> Result<PersonRow> {
    let source: String = row.try_get("source")?;
    Ok(PersonRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        role: row.try_get("role")?,
        location: row.try_get("location")?,
        source: source.parse::<Source>()?,
        created_at: format_ts_iso(row.try_get("created_at")?),
    })
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_person(&self, person: &PersonRecord) -> Result<()> {
        self.bounded(
            "insert-person",
            sqlx::query(
                r#"
                INSERT INTO people (name, name_key, role, location, source, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&person.name)
            .bind(person.name_key())
            .bind(&person.role)
            .bind(&person.location)
            .bind(person.source.as_str())
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn insert_person_if_absent(&self, person: &PersonRecord) -> Result<InsertOutcome> {
        let result = self
            .bounded(
                "insert-person-if-absent",
                sqlx::query(
                    r#"
                    INSERT INTO people (name, name_key, role, location, source, created_at)
                    SELECT ?1, ?2, ?3, ?4, ?5, ?6
                    WHERE ?2 IS NULL
                       OR NOT EXISTS (SELECT 1 FROM people WHERE name_key = ?2)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(&person.name)
                .bind(person.name_key())
                .bind(&person.role)
                .bind(&person.location)
                .bind(person.source.as_str())
                .bind(chrono::Utc::now().timestamp())
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<PersonRow>> {
        let sql = format!(
            "SELECT {} FROM people WHERE name_key = ? ORDER BY id",
            PERSON_COLUMNS
        );
        let rows = self
            .bounded(
                "select-by-name-ci",
                sqlx::query(&sql)
                    .bind(hiring_orchestrator_core::models::name_key(name))
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.iter().map(person_from_row).collect()
    }

    async fn select_filtered(&self, filter: &PersonFilter) -> Result<Vec<PersonRow>> {
        let sql = format!(
            r#"
            SELECT {} FROM people
            WHERE (?1 IS NULL OR role LIKE '%' || ?1 || '%' ESCAPE '\')
              AND (?2 IS NULL OR LOWER(location) = LOWER(?2))
            ORDER BY id DESC
            LIMIT ?3
            "#,
            PERSON_COLUMNS
        );
        let rows = self
            .bounded(
                "select-filtered",
                sqlx::query(&sql)
                    .bind(filter.role_like.as_deref().map(escape_like))
                    .bind(&filter.location)
                    .bind(filter.limit)
                    .fetch_all(&self.pool),
            )
            .await?;
        rows.iter().map(person_from_row).collect()
    }

    async fn summary(&self, top_roles: usize) -> Result<StoreSummary> {
        let total: i64 = self
            .bounded(
                "select-summary",
                sqlx::query_scalar("SELECT COUNT(*) FROM people").fetch_one(&self.pool),
            )
            .await?;

        let source_rows = self
            .bounded(
                "select-summary",
                sqlx::query(
                    "SELECT source, COUNT(*) AS n FROM people GROUP BY source ORDER BY source",
                )
                .fetch_all(&self.pool),
            )
            .await?;
        let mut by_source = Vec::with_capacity(source_rows.len());
        for row in &source_rows {
            let source: String = row.try_get("source")?;
            by_source.push(SourceCount {
                source: source.parse()?,
                count: row.try_get("n")?,
            });
        }

        let role_rows = self
            .bounded(
                "select-summary",
                sqlx::query(
                    r#"
                    SELECT role, COUNT(*) AS n FROM people
                    WHERE role IS NOT NULL
                    GROUP BY role
                    ORDER BY n DESC, role ASC
                    LIMIT ?
                    "#,
                )
                .bind(top_roles as i64)
                .fetch_all(&self.pool),
            )
            .await?;
        let top_roles = role_rows
            .iter()
            .map(|row| {
                Ok(RoleCount {
                    role: row.try_get("role")?,
                    count: row.try_get("n")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StoreSummary {
            total,
            by_source,
            top_roles,
        })
    }
}
