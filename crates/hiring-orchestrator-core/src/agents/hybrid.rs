//! HYBRID handler: search, then deduplicate and commit a bounded subset.
//!
//! Steps, in order:
//!
//! 1. Synthesise 8-10 candidates (same decoding as the external handler).
//!    An empty or undecodable list short-circuits before the store is touched.
//! 2. Pick the commit count from phrases in the query and take that many
//!    candidates in generation order.
//! 3. Best effort: look up similar existing rows for display.
//! 4. Insert each selected candidate unless its name already exists. One
//!    candidate failing lands it in `skipped` and the batch continues.
//! 5. Best effort: store summary for display.
//!
//! A failure outside the per-step guards (the search call itself) turns the
//! whole request into a single error envelope, even when rows were already
//! committed.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::envelope::{
    DatabaseOperation, DisplayResult, ExternalSearchSummary, HybridResponse, HybridSummary,
    ResponseEnvelope, SEARCHED_PLATFORMS,
};
use crate::extract::{non_blank, strip_code_fences, CandidateDecode};
use crate::inference::InferenceClient;
use crate::models::{
    CandidateProfile, InsertOutcome, PersonFilter, PersonRecord, PersonRow, RequestState,
    StoreSummary,
};
use crate::store::Store;

use super::{synthesize_candidates, Node};

const COMPONENT: &str = "hybrid_agent";

/// Candidates committed when the query names no count.
pub const DEFAULT_COMMIT_COUNT: usize = 5;

const MAX_LISTED_RESULTS: usize = 10;
const SIMILAR_RECORDS_LIMIT: i64 = 20;
const SUMMARY_TOP_ROLES: usize = 3;

const NO_EXISTING_RECORDS: &str = "No existing records found";
const SUMMARY_UNAVAILABLE: &str = "Summary unavailable";

pub struct HybridAgent {
    inference: Arc<dyn InferenceClient>,
    store: Arc<dyn Store>,
}

/// How a run ended short of an error.
enum HybridOutcome {
    Completed(HybridRun),
    /// The search produced no candidates; the store was not touched.
    NoResults { fallback_reason: Option<String> },
}

/// Everything a completed run produced.
struct HybridRun {
    candidates: Vec<CandidateProfile>,
    existing: DisplayResult<Vec<PersonRow>>,
    inserted: Vec<CandidateProfile>,
    skipped: Vec<CandidateProfile>,
    summary: DisplayResult<StoreSummary>,
}

impl HybridAgent {
    pub fn new(inference: Arc<dyn InferenceClient>, store: Arc<dyn Store>) -> Self {
        Self { inference, store }
    }

    async fn execute(&self, query: &str) -> Result<HybridOutcome> {
        let candidates = match synthesize_candidates(
            self.inference.as_ref(),
            &hybrid_search_prompt(query),
            COMPONENT,
        )
        .await?
        {
            CandidateDecode::Validated(candidates) if !candidates.is_empty() => candidates,
            CandidateDecode::Validated(_) => {
                tracing::info!(component = COMPONENT, "external search returned no candidates");
                return Ok(HybridOutcome::NoResults {
                    fallback_reason: None,
                });
            }
            CandidateDecode::Fallback { reason } => {
                return Ok(HybridOutcome::NoResults {
                    fallback_reason: Some(reason),
                });
            }
        };

        tracing::info!(component = COMPONENT, found = candidates.len(), "external search complete");

        let n = commit_count(query, candidates.len());
        let existing = self.existing_similar(query, &candidates).await;

        tracing::info!(component = COMPONENT, selected = n, "committing candidates");
        let mut inserted = Vec::new();
        let mut skipped = Vec::new();
        for candidate in &candidates[..n] {
            match self
                .store
                .insert_person_if_absent(&PersonRecord::from(candidate))
                .await
            {
                Ok(InsertOutcome::Inserted) => {
                    tracing::info!(component = COMPONENT, name = %candidate.name, "inserted");
                    inserted.push(candidate.clone());
                }
                Ok(InsertOutcome::Duplicate) => {
                    tracing::info!(component = COMPONENT, name = %candidate.name, "skipped duplicate");
                    skipped.push(candidate.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        component = COMPONENT,
                        name = %candidate.name,
                        error = %e,
                        "insert failed, skipping candidate"
                    );
                    skipped.push(candidate.clone());
                }
            }
        }

        let summary = match self.store.summary(SUMMARY_TOP_ROLES).await {
            Ok(summary) => DisplayResult::Available(summary),
            Err(e) => {
                tracing::warn!(component = COMPONENT, error = %e, "summary unavailable");
                DisplayResult::Unavailable(SUMMARY_UNAVAILABLE.to_string())
            }
        };

        tracing::info!(
            component = COMPONENT,
            found = candidates.len(),
            inserted = inserted.len(),
            skipped = skipped.len(),
            "hybrid operation complete"
        );

        Ok(HybridOutcome::Completed(HybridRun {
            candidates,
            existing,
            inserted,
            skipped,
            summary,
        }))
    }

    /// Rows resembling the search, for display only.
    ///
    /// The model proposes a `{role, location}` filter which runs through the
    /// fixed `select-filtered` statement. An unparseable proposal falls back
    /// to the first candidate's role and location.
    async fn existing_similar(
        &self,
        query: &str,
        candidates: &[CandidateProfile],
    ) -> DisplayResult<Vec<PersonRow>> {
        let filter = match self
            .inference
            .generate(&similar_filter_prompt(query, candidates))
            .await
        {
            Ok(text) => parse_similar_filter(&text).unwrap_or_else(|| default_filter(candidates)),
            Err(e) => {
                tracing::warn!(component = COMPONENT, error = %e, "similar-records call failed");
                return DisplayResult::Unavailable(NO_EXISTING_RECORDS.to_string());
            }
        };

        match self.store.select_filtered(&filter).await {
            Ok(rows) => DisplayResult::Available(rows),
            Err(e) => {
                tracing::warn!(component = COMPONENT, error = %e, "similar-records lookup failed");
                DisplayResult::Unavailable(NO_EXISTING_RECORDS.to_string())
            }
        }
    }
}

#[async_trait]
impl Node for HybridAgent {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    async fn run(&self, state: &mut RequestState) -> ResponseEnvelope {
        tracing::info!(component = COMPONENT, "starting hybrid operation");

        let response = match self.execute(&state.query).await {
            Ok(HybridOutcome::NoResults { fallback_reason }) => {
                state.external_result = Some(Vec::new());
                state.local_result = None;
                HybridResponse::NoResults {
                    message: "No external results found".to_string(),
                    external_count: 0,
                    database_count: 0,
                    fallback_reason,
                }
            }
            Ok(HybridOutcome::Completed(run)) => {
                state.local_result = serde_json::to_value(&run.existing).ok();
                let response = HybridResponse::Completed {
                    message: "Hybrid operation completed successfully".to_string(),
                    summary: HybridSummary {
                        external_search: ExternalSearchSummary {
                            total_found: run.candidates.len(),
                            searched_platforms: SEARCHED_PLATFORMS.to_string(),
                        },
                        database_operation: DatabaseOperation {
                            existing_similar_records: run.existing,
                            new_records_inserted: run.inserted.len(),
                            duplicates_skipped: run.skipped.len(),
                            database_summary: run.summary,
                        },
                    },
                    inserted_people: run.inserted,
                    skipped_people: run.skipped,
                    all_external_results: run
                        .candidates
                        .iter()
                        .take(MAX_LISTED_RESULTS)
                        .cloned()
                        .collect(),
                };
                state.external_result = Some(run.candidates);
                response
            }
            Err(e) => {
                let error = format!("Hybrid operation failed: {:#}", e);
                tracing::error!(component = COMPONENT, %error, "hybrid operation aborted");
                state.external_result = None;
                state.local_result = None;
                state.error = Some(format!("{:#}", e));
                HybridResponse::Failed { error }
            }
        };

        ResponseEnvelope::Hybrid(response)
    }
}

/// How many candidates to commit, from phrases in the query.
///
/// Plain substring checks on the lower-cased query, in order: `top 3` /
/// `first 3` → 3, `top 10` → 10, `all` → every candidate, otherwise
/// [`DEFAULT_COMMIT_COUNT`]. Never more than `available`.
pub fn commit_count(query: &str, available: usize) -> usize {
    let q = query.to_lowercase();
    let wanted = if q.contains("top 3") || q.contains("first 3") {
        3
    } else if q.contains("top 10") {
        10
    } else if q.contains("all") {
        available
    } else {
        DEFAULT_COMMIT_COUNT
    };
    wanted.min(available)
}

#[derive(Deserialize)]
struct RawFilter {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

fn parse_similar_filter(text: &str) -> Option<PersonFilter> {
    let raw: RawFilter = serde_json::from_str(strip_code_fences(text)).ok()?;
    let role_like = non_blank(raw.role);
    let location = non_blank(raw.location);
    if role_like.is_none() && location.is_none() {
        return None;
    }
    Some(PersonFilter {
        role_like,
        location,
        limit: SIMILAR_RECORDS_LIMIT,
    })
}

fn default_filter(candidates: &[CandidateProfile]) -> PersonFilter {
    let first = candidates.first();
    PersonFilter {
        role_like: first.map(|c| c.role.clone()),
        location: first.map(|c| c.location.clone()),
        limit: SIMILAR_RECORDS_LIMIT,
    }
}

/// Prompt for 8-10 synthetic candidate profiles as a JSON array.
pub fn hybrid_search_prompt(query: &str) -> String {
    format!(
        r#"You act as a recruitment search engine covering several hiring platforms.

Search request: "{query}"

Work out the role and the location, then produce 8-10 realistic candidate profiles
matching them, with varied experience levels and diverse full names.

Each profile has: "name", "role", "location", "source" (always "external").

Reply with ONLY a JSON array:
[
  {{"name": "Full Name", "role": "Specific Job Title", "location": "City/Region", "source": "external"}}
]"#
    )
}

fn similar_filter_prompt(query: &str, candidates: &[CandidateProfile]) -> String {
    let (role, location) = candidates
        .first()
        .map(|c| (c.role.as_str(), c.location.as_str()))
        .unwrap_or(("", ""));
    format!(
        r#"Pick a filter for finding people already in our database who resemble this search.

Search request: "{query}"
The search found {count} candidates with roles like "{role}" in "{location}".

Reply with ONLY a JSON object:
{{"role": "<keyword contained in similar job titles>", "location": "<city or null>"}}"#,
        count = candidates.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ScriptedInference;
    use crate::models::Source;
    use crate::store::memory::InMemoryStore;
    use anyhow::bail;

    fn candidates_json(names: &[&str]) -> String {
        let items: Vec<String> = names
            .iter()
            .map(|n| {
                format!(
                    r#"{{"name": "{}", "role": "DevOps Engineer", "location": "Berlin", "source": "manual"}}"#,
                    n
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    const NAMES: [&str; 8] = [
        "Lena Vogel",
        "John Doe",
        "Arjun Mehta",
        "Sofia Rossi",
        "Kenji Sato",
        "Maya Cohen",
        "Lucas Martin",
        "Nadia Khan",
    ];

    fn manual(name: &str) -> PersonRecord {
        PersonRecord {
            name: Some(name.to_string()),
            role: Some("Engineer".to_string()),
            location: Some("Berlin".to_string()),
            source: Source::Manual,
        }
    }

    async fn run(
        inference: ScriptedInference,
        store: Arc<dyn Store>,
        query: &str,
    ) -> (HybridResponse, RequestState) {
        let agent = HybridAgent::new(Arc::new(inference), store);
        let mut state = RequestState::new(query);
        match agent.run(&mut state).await {
            ResponseEnvelope::Hybrid(r) => (r, state),
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_commit_count_phrases() {
        assert_eq!(commit_count("add top 3 to database", 8), 3);
        assert_eq!(commit_count("save the FIRST 3", 8), 3);
        assert_eq!(commit_count("add top 3", 2), 2);
        assert_eq!(commit_count("add top 10", 8), 8);
        assert_eq!(commit_count("add top 10", 12), 10);
        assert_eq!(commit_count("add all of them", 9), 9);
        assert_eq!(commit_count("search devops and add top 30 to database", 9), 3);
        assert_eq!(commit_count("find devs in Dallas and add them", 9), 9);
        assert_eq!(commit_count("search and add, allocate budget later", 9), 9);
        assert_eq!(commit_count("search and save", 3), 3);
        assert_eq!(commit_count("search and save them", 9), 5);
    }

    #[test]
    fn test_parse_similar_filter() {
        let f = parse_similar_filter(r#"{"role": "DevOps", "location": "Berlin"}"#).unwrap();
        assert_eq!(f.role_like.as_deref(), Some("DevOps"));
        assert_eq!(f.location.as_deref(), Some("Berlin"));
        assert!(parse_similar_filter("SELECT * FROM people").is_none());
        assert!(parse_similar_filter(r#"{"role": "", "location": null}"#).is_none());
    }

    #[tokio::test]
    async fn test_top_3_commits_first_three_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let inference = ScriptedInference::new()
            .reply(candidates_json(&NAMES))
            .reply(r#"{"role": "DevOps", "location": "Berlin"}"#);
        let (response, state) = run(
            inference,
            store.clone(),
            "Search for DevOps engineers in Berlin and add top 3 to database",
        )
        .await;

        let HybridResponse::Completed {
            inserted_people,
            skipped_people,
            all_external_results,
            summary,
            ..
        } = response
        else {
            panic!("expected completed run");
        };
        let names: Vec<&str> = inserted_people.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lena Vogel", "John Doe", "Arjun Mehta"]);
        assert!(skipped_people.is_empty());
        assert_eq!(all_external_results.len(), 8);
        assert_eq!(summary.external_search.total_found, 8);
        assert_eq!(summary.database_operation.new_records_inserted, 3);
        assert!(summary.database_operation.database_summary.is_available());
        assert!(store.rows().iter().all(|r| r.source == Source::External));
        assert_eq!(state.external_result.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_existing_name_lands_in_skipped() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_person(&manual("john DOE")).await.unwrap();

        let inference = ScriptedInference::new()
            .reply(candidates_json(&NAMES))
            .reply("not json");
        let (response, _) = run(inference, store.clone(), "find devops in Berlin and add all").await;

        let HybridResponse::Completed {
            inserted_people,
            skipped_people,
            ..
        } = response
        else {
            panic!("expected completed run");
        };
        assert_eq!(inserted_people.len(), 7);
        assert_eq!(skipped_people.len(), 1);
        assert_eq!(skipped_people[0].name, "John Doe");
        assert!(!inserted_people.iter().any(|c| c.name == "John Doe"));
        assert_eq!(store.rows().len(), 8);
    }

    #[tokio::test]
    async fn test_duplicate_within_one_batch_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let inference = ScriptedInference::new()
            .reply(candidates_json(&["Ana Lima", "ANA LIMA", "Bo Chen"]))
            .with_default("{}");
        let (response, _) = run(inference, store.clone(), "search and add all").await;
        let HybridResponse::Completed {
            inserted_people,
            skipped_people,
            ..
        } = response
        else {
            panic!("expected completed run");
        };
        assert_eq!(inserted_people.len(), 2);
        assert_eq!(skipped_people[0].name, "ANA LIMA");
    }

    #[tokio::test]
    async fn test_undecodable_search_reports_fallback_reason() {
        let inference = ScriptedInference::new().reply("Sorry, no candidates today.");
        let store = Arc::new(InMemoryStore::new());
        let (response, state) = run(inference, store.clone(), "find and add top 3").await;
        match response {
            HybridResponse::NoResults {
                fallback_reason, ..
            } => {
                let reason = fallback_reason.expect("fallback reason");
                assert!(reason.contains("no bracketed JSON array"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(state.external_result, Some(Vec::new()));
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_does_not_touch_store() {
        let inference = ScriptedInference::new().reply("[]");
        let store = Arc::new(InMemoryStore::new());
        let (response, state) = run(inference, store.clone(), "find and add top 3").await;
        match response {
            HybridResponse::NoResults {
                external_count,
                database_count,
                fallback_reason,
                ..
            } => {
                assert_eq!(external_count, 0);
                assert_eq!(database_count, 0);
                assert!(fallback_reason.is_none());
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(state.external_result, Some(Vec::new()));
        assert!(store.rows().is_empty());
    }

    /// Fails inserts for one name and every display query.
    struct FlakyStore {
        inner: InMemoryStore,
        poisoned_name: &'static str,
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn insert_person(&self, p: &PersonRecord) -> Result<()> {
            self.inner.insert_person(p).await
        }
        async fn insert_person_if_absent(&self, p: &PersonRecord) -> Result<InsertOutcome> {
            if p.name.as_deref() == Some(self.poisoned_name) {
                bail!("disk I/O error");
            }
            self.inner.insert_person_if_absent(p).await
        }
        async fn find_by_name(&self, name: &str) -> Result<Vec<PersonRow>> {
            self.inner.find_by_name(name).await
        }
        async fn select_filtered(&self, _: &PersonFilter) -> Result<Vec<PersonRow>> {
            bail!("statement timed out")
        }
        async fn summary(&self, _: usize) -> Result<StoreSummary> {
            bail!("statement timed out")
        }
    }

    #[tokio::test]
    async fn test_single_candidate_failure_does_not_abort_batch() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryStore::new(),
            poisoned_name: "Arjun Mehta",
        });
        let inference = ScriptedInference::new()
            .reply(candidates_json(&NAMES))
            .reply(r#"{"role": "DevOps"}"#);
        let (response, state) = run(inference, store.clone(), "search devops and add them").await;

        let HybridResponse::Completed {
            inserted_people,
            skipped_people,
            summary,
            ..
        } = response
        else {
            panic!("expected completed run");
        };
        assert_eq!(inserted_people.len(), 4);
        assert_eq!(skipped_people.len(), 1);
        assert_eq!(skipped_people[0].name, "Arjun Mehta");
        assert_eq!(
            summary.database_operation.existing_similar_records,
            DisplayResult::Unavailable(NO_EXISTING_RECORDS.to_string())
        );
        assert_eq!(
            summary.database_operation.database_summary,
            DisplayResult::Unavailable(SUMMARY_UNAVAILABLE.to_string())
        );
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_similar_records_call_failure_is_non_fatal() {
        let store = Arc::new(InMemoryStore::new());
        let inference = ScriptedInference::new()
            .reply(candidates_json(&NAMES[..2]))
            .fail("rate limited");
        let (response, _) = run(inference, store.clone(), "search and add all").await;
        let HybridResponse::Completed { summary, .. } = response else {
            panic!("expected completed run");
        };
        assert!(!summary.database_operation.existing_similar_records.is_available());
        assert_eq!(summary.database_operation.new_records_inserted, 2);
    }

    #[tokio::test]
    async fn test_search_call_failure_is_catastrophic() {
        let store = Arc::new(InMemoryStore::new());
        let inference = ScriptedInference::new().fail("upstream 503");
        let (response, state) = run(inference, store.clone(), "search and add all").await;
        match response {
            HybridResponse::Failed { error } => {
                assert!(error.starts_with("Hybrid operation failed"));
                assert!(error.contains("upstream 503"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(state.external_result.is_none());
        assert!(state.local_result.is_none());
        assert_eq!(state.error.as_deref(), Some("upstream 503"));
    }
}
