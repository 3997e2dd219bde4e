//! LOCAL handler: "add <person>" commands against the people store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::{LocalDbResponse, PersonFields, ResponseEnvelope};
use crate::extract::{
    extract_location_fallback, extract_name_fallback, extract_role_fallback,
    parse_person_fields, title_case,
};
use crate::inference::InferenceClient;
use crate::models::{PersonRecord, RequestState, Source};
use crate::store::Store;

use super::Node;

const COMPONENT: &str = "local_db_agent";

const INSERTED_MESSAGE: &str = "Record inserted successfully";
const NO_OP_MESSAGE: &str = "No insert operation detected";

/// Adds one named person per request. Performs no deduplication.
pub struct LocalDbAgent {
    inference: Arc<dyn InferenceClient>,
    store: Arc<dyn Store>,
}

impl LocalDbAgent {
    pub fn new(inference: Arc<dyn InferenceClient>, store: Arc<dyn Store>) -> Self {
        Self { inference, store }
    }

    /// Model extraction, then the regex extractors for whatever is missing,
    /// then title case.
    async fn extract_fields(&self, query: &str) -> PersonFields {
        let from_model = match self.inference.generate(&extraction_prompt(query)).await {
            Ok(text) => parse_person_fields(&text),
            Err(e) => {
                tracing::warn!(component = COMPONENT, error = %e, "extraction call failed, using text fallback");
                PersonFields::default()
            }
        };

        let name = from_model.name.or_else(|| extract_name_fallback(query));
        let role = from_model.role.or_else(|| extract_role_fallback(query));
        let location = from_model
            .location
            .or_else(|| extract_location_fallback(query));

        PersonFields {
            name: name.as_deref().map(title_case),
            role: role.as_deref().map(title_case),
            location: location.as_deref().map(title_case),
        }
    }
}

#[async_trait]
impl Node for LocalDbAgent {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    async fn run(&self, state: &mut RequestState) -> ResponseEnvelope {
        if !is_add_command(&state.query) {
            tracing::info!(component = COMPONENT, "not an add command");
            return ResponseEnvelope::LocalDb(LocalDbResponse::NoOp {
                message: NO_OP_MESSAGE.to_string(),
            });
        }

        let fields = self.extract_fields(&state.query).await;
        let record = PersonRecord {
            name: fields.name.clone(),
            role: fields.role.clone(),
            location: fields.location.clone(),
            source: Source::Manual,
        };

        match self.store.insert_person(&record).await {
            Ok(()) => {
                tracing::info!(
                    component = COMPONENT,
                    name = record.name.as_deref().unwrap_or(""),
                    "person inserted"
                );
                state.local_result = serde_json::to_value(&record).ok();
                ResponseEnvelope::LocalDb(LocalDbResponse::Inserted {
                    message: INSERTED_MESSAGE.to_string(),
                    data: fields,
                })
            }
            Err(e) => {
                let error = format!("{:#}", e);
                tracing::error!(component = COMPONENT, %error, "insert failed");
                state.error = Some(error.clone());
                ResponseEnvelope::LocalDb(LocalDbResponse::Failed { error })
            }
        }
    }
}

/// Whether the query starts with the word "add" (case-insensitive).
pub fn is_add_command(query: &str) -> bool {
    let q = query.trim_start().to_lowercase();
    match q.strip_prefix("add") {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Structured-extraction prompt for an add command.
pub fn extraction_prompt(query: &str) -> String {
    format!(
        r#"Extract the person described in this request.

Request: "{query}"

Reply with ONLY a JSON object of this exact shape, using null for anything not stated:
{{"name": string | null, "role": string | null, "location": string | null}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ScriptedInference;
    use crate::models::{InsertOutcome, PersonFilter, PersonRow, StoreSummary};
    use crate::store::memory::InMemoryStore;
    use anyhow::{bail, Result};

    struct BrokenStore;

    #[async_trait]
    impl Store for BrokenStore {
        async fn insert_person(&self, _: &PersonRecord) -> Result<()> {
            bail!("database is locked")
        }
        async fn insert_person_if_absent(&self, _: &PersonRecord) -> Result<InsertOutcome> {
            bail!("database is locked")
        }
        async fn find_by_name(&self, _: &str) -> Result<Vec<PersonRow>> {
            bail!("database is locked")
        }
        async fn select_filtered(&self, _: &PersonFilter) -> Result<Vec<PersonRow>> {
            bail!("database is locked")
        }
        async fn summary(&self, _: usize) -> Result<StoreSummary> {
            bail!("database is locked")
        }
    }

    fn agent(
        inference: ScriptedInference,
    ) -> (LocalDbAgent, Arc<ScriptedInference>, Arc<InMemoryStore>) {
        let inference = Arc::new(inference);
        let store = Arc::new(InMemoryStore::new());
        (
            LocalDbAgent::new(inference.clone(), store.clone()),
            inference,
            store,
        )
    }

    #[test]
    fn test_is_add_command() {
        assert!(is_add_command("Add Priya Sharma as an engineer"));
        assert!(is_add_command("  ADD someone"));
        assert!(is_add_command("add"));
        assert!(!is_add_command("address book entries"));
        assert!(!is_add_command("Show all people"));
        assert!(!is_add_command("please add Priya"));
    }

    #[tokio::test]
    async fn test_non_add_query_is_noop_without_store_access() {
        let (agent, inference, store) = agent(ScriptedInference::new());
        let mut state = RequestState::new("Show me all engineers");
        let env = agent.run(&mut state).await;
        match env {
            ResponseEnvelope::LocalDb(LocalDbResponse::NoOp { message }) => {
                assert_eq!(message, NO_OP_MESSAGE)
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
        assert_eq!(inference.call_count(), 0);
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_model_fields_are_title_cased() {
        let (agent, _, store) = agent(ScriptedInference::new().reply(
            r#"{"name": "vikram desai", "role": "devops engineer", "location": "delhi"}"#,
        ));
        let mut state = RequestState::new("Add Vikram Desai as a DevOps Engineer from Delhi");
        let env = agent.run(&mut state).await;
        let ResponseEnvelope::LocalDb(LocalDbResponse::Inserted { data, .. }) = env else {
            panic!("expected insert");
        };
        assert_eq!(data.name.as_deref(), Some("Vikram Desai"));
        assert_eq!(data.role.as_deref(), Some("Devops Engineer"));
        assert_eq!(data.location.as_deref(), Some("Delhi"));

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, Source::Manual);
        assert!(state.local_result.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_text_fallback() {
        let (agent, _, store) = agent(ScriptedInference::new().reply("Sure! Here it is."));
        let mut state = RequestState::new("Add Priya Sharma as a Senior ML Engineer from Pune");
        agent.run(&mut state).await;

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Priya Sharma"));
        assert_eq!(rows[0].role.as_deref(), Some("Senior Ml Engineer"));
        assert_eq!(rows[0].location.as_deref(), Some("Pune"));
    }

    #[tokio::test]
    async fn test_partial_model_reply_is_filled_by_fallback() {
        let (agent, _, store) =
            agent(ScriptedInference::new().reply(r#"{"name": "Priya Sharma", "role": null}"#));
        let mut state = RequestState::new("add Priya Sharma as a data scientist in Mumbai");
        agent.run(&mut state).await;
        let row = &store.rows()[0];
        assert_eq!(row.role.as_deref(), Some("Data Scientist"));
        assert_eq!(row.location.as_deref(), Some("Mumbai"));
    }

    #[tokio::test]
    async fn test_failed_extraction_call_still_inserts_once() {
        let (agent, inference, store) = agent(ScriptedInference::new().fail("timeout"));
        let mut state = RequestState::new("Add Jane Roe as a Designer from Oslo");
        agent.run(&mut state).await;
        assert_eq!(inference.call_count(), 1);
        assert_eq!(store.rows().len(), 1);
        assert_eq!(store.rows()[0].name.as_deref(), Some("Jane Roe"));
    }

    #[tokio::test]
    async fn test_same_add_twice_creates_two_rows() {
        let (agent, _, store) = agent(ScriptedInference::new().with_default("no json"));
        for _ in 0..2 {
            let mut state = RequestState::new("Add Priya Sharma as a Senior ML Engineer from Pune");
            agent.run(&mut state).await;
        }
        let rows = store.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, rows[1].name);
        assert_ne!(rows[0].id, rows[1].id);
    }

    #[tokio::test]
    async fn test_store_failure_becomes_error_envelope() {
        let agent = LocalDbAgent::new(
            Arc::new(ScriptedInference::new().reply(r#"{"name": "A B"}"#)),
            Arc::new(BrokenStore),
        );
        let mut state = RequestState::new("add A B");
        let env = agent.run(&mut state).await;
        assert!(env.is_error());
        let ResponseEnvelope::LocalDb(LocalDbResponse::Failed { error }) = env else {
            panic!("expected failure");
        };
        assert!(error.contains("database is locked"));
        assert_eq!(state.error.as_deref(), Some("database is locked"));
    }
}
