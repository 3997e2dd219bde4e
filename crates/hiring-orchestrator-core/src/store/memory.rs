//! In-memory [`Store`] implementation for tests and offline runs.
//!
//! Rows live in a `Vec` behind a `std::sync::Mutex`; holding the lock across
//! the duplicate check and the push gives the same atomicity the SQLite
//! store gets from its single-statement conditional insert.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{
    name_key, InsertOutcome, PersonFilter, PersonRecord, PersonRow, RoleCount, Source,
    SourceCount, StoreSummary,
};

use super::Store;

/// In-memory people store.
pub struct InMemoryStore {
    rows: Mutex<Vec<PersonRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every stored row, in insert order.
    pub fn rows(&self) -> Vec<PersonRow> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<PersonRow>>> {
        self.rows
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push_row(rows: &mut Vec<PersonRow>, person: &PersonRecord) {
    let id = rows.len() as i64 + 1;
    rows.push(PersonRow {
        id,
        name: person.name.clone(),
        role: person.role.clone(),
        location: person.location.clone(),
        source: person.source,
        created_at: chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string(),
    });
}

fn row_key(row: &PersonRow) -> Option<String> {
    row.name.as_deref().map(name_key)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_person(&self, person: &PersonRecord) -> Result<()> {
        let mut rows = self.lock()?;
        push_row(&mut rows, person);
        Ok(())
    }

    async fn insert_person_if_absent(&self, person: &PersonRecord) -> Result<InsertOutcome> {
        let key = person.name_key();
        let mut rows = self.lock()?;
        if key.is_some() && rows.iter().any(|r| row_key(r) == key) {
            return Ok(InsertOutcome::Duplicate);
        }
        push_row(&mut rows, person);
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<PersonRow>> {
        let key = Some(name_key(name));
        let rows = self.lock()?;
        Ok(rows.iter().filter(|r| row_key(r) == key).cloned().collect())
    }

    async fn select_filtered(&self, filter: &PersonFilter) -> Result<Vec<PersonRow>> {
        let role_like = filter.role_like.as_deref().map(str::to_lowercase);
        let location = filter.location.as_deref().map(str::to_lowercase);
        let rows = self.lock()?;
        let mut matched: Vec<PersonRow> = rows
            .iter()
            .filter(|r| match &role_like {
                Some(needle) => r
                    .role
                    .as_deref()
                    .is_some_and(|role| role.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .filter(|r| match &location {
                Some(loc) => r
                    .location
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase() == *loc),
                None => true,
            })
            .cloned()
            .collect();
        matched.reverse();
        matched.truncate(filter.limit.max(0) as usize);
        Ok(matched)
    }

    async fn summary(&self, top_roles: usize) -> Result<StoreSummary> {
        let rows = self.lock()?;

        let by_source = [Source::External, Source::Manual]
            .into_iter()
            .map(|source| SourceCount {
                source,
                count: rows.iter().filter(|r| r.source == source).count() as i64,
            })
            .filter(|c| c.count > 0)
            .collect();

        let mut roles: HashMap<&str, i64> = HashMap::new();
        for role in rows.iter().filter_map(|r| r.role.as_deref()) {
            *roles.entry(role).or_insert(0) += 1;
        }
        let mut roles: Vec<RoleCount> = roles
            .into_iter()
            .map(|(role, count)| RoleCount {
                role: role.to_string(),
                count,
            })
            .collect();
        roles.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.role.cmp(&b.role)));
        roles.truncate(top_roles);

        Ok(StoreSummary {
            total: rows.len() as i64,
            by_source,
            top_roles: roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, role: &str, location: &str, source: Source) -> PersonRecord {
        PersonRecord {
            name: Some(name.to_string()),
            role: Some(role.to_string()),
            location: Some(location.to_string()),
            source,
        }
    }

    #[tokio::test]
    async fn test_insert_person_allows_duplicates() {
        let store = InMemoryStore::new();
        let p = person("Priya Sharma", "Engineer", "Pune", Source::Manual);
        store.insert_person(&p).await.unwrap();
        store.insert_person(&p).await.unwrap();
        assert_eq!(store.rows().len(), 2);
        assert_ne!(store.rows()[0].id, store.rows()[1].id);
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_case_insensitive() {
        let store = InMemoryStore::new();
        store
            .insert_person(&person("John Doe", "SRE", "Berlin", Source::Manual))
            .await
            .unwrap();
        let outcome = store
            .insert_person_if_absent(&person("JOHN doe", "DevOps", "Berlin", Source::External))
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Duplicate);
        assert_eq!(store.rows().len(), 1);

        let outcome = store
            .insert_person_if_absent(&person("Jane Roe", "DevOps", "Berlin", Source::External))
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted);
    }

    #[tokio::test]
    async fn test_select_filtered_and_summary() {
        let store = InMemoryStore::new();
        for (name, role, loc) in [
            ("A One", "DevOps Engineer", "Berlin"),
            ("B Two", "Senior DevOps Engineer", "berlin"),
            ("C Three", "Data Scientist", "Boston"),
        ] {
            store
                .insert_person(&person(name, role, loc, Source::External))
                .await
                .unwrap();
        }

        let rows = store
            .select_filtered(&PersonFilter {
                role_like: Some("devops".to_string()),
                location: Some("Berlin".to_string()),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("B Two"));

        let summary = store.summary(1).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_source.len(), 1);
        assert_eq!(summary.by_source[0].count, 3);
        assert_eq!(summary.top_roles.len(), 1);
    }
}
