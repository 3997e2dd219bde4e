//! Storage abstraction for the people table.
//!
//! The [`Store`] trait is the complete, fixed set of statements the
//! orchestrator may run. Every operation takes typed parameters; there is no
//! way to submit free-form statement text, so neither user input nor model
//! output can reach the store as code.
//!
//! Implementations must be `Send + Sync` and must bound every call with a
//! timeout of their own.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{InsertOutcome, PersonFilter, PersonRecord, PersonRow, StoreSummary};

/// Abstract people store.
///
/// # Operations
///
/// | Method | Statement |
/// |--------|-----------|
/// | [`insert_person`](Store::insert_person) | `insert-person` |
/// | [`insert_person_if_absent`](Store::insert_person_if_absent) | `insert-person` guarded by the dedup key |
/// | [`find_by_name`](Store::find_by_name) | `select-by-name-ci` |
/// | [`select_filtered`](Store::select_filtered) | `select-filtered` |
/// | [`summary`](Store::summary) | `select-summary` |
#[async_trait]
pub trait Store: Send + Sync {
    /// Unconditionally insert a row. Same-named rows are allowed.
    async fn insert_person(&self, person: &PersonRecord) -> Result<()>;

    /// Insert a row unless any row with the same case-insensitive name
    /// exists. The check and the write are one atomic step.
    async fn insert_person_if_absent(&self, person: &PersonRecord) -> Result<InsertOutcome>;

    /// All rows whose name matches `name` case-insensitively.
    async fn find_by_name(&self, name: &str) -> Result<Vec<PersonRow>>;

    /// Rows matching an optional role substring and location, newest first.
    async fn select_filtered(&self, filter: &PersonFilter) -> Result<Vec<PersonRow>>;

    /// Row counts: total, per source, and the most common roles.
    async fn summary(&self, top_roles: usize) -> Result<StoreSummary>;
}
