//! EXTERNAL handler: synthesise a short candidate list without persisting it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::{ExternalSearchResponse, ResponseEnvelope};
use crate::extract::CandidateDecode;
use crate::inference::InferenceClient;
use crate::models::RequestState;

use super::{synthesize_candidates, Node};

const COMPONENT: &str = "external_search_agent";

pub struct ExternalSearchAgent {
    inference: Arc<dyn InferenceClient>,
}

impl ExternalSearchAgent {
    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self { inference }
    }
}

#[async_trait]
impl Node for ExternalSearchAgent {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    async fn run(&self, state: &mut RequestState) -> ResponseEnvelope {
        tracing::info!(component = COMPONENT, "searching external sources");
        let prompt = external_search_prompt(&state.query);

        let response = match synthesize_candidates(self.inference.as_ref(), &prompt, COMPONENT).await
        {
            Ok(decoded) => {
                let (results, fallback_reason) = match decoded {
                    CandidateDecode::Validated(results) => (results, None),
                    CandidateDecode::Fallback { reason } => (Vec::new(), Some(reason)),
                };
                tracing::info!(component = COMPONENT, found = results.len(), "search complete");
                state.external_result = Some(results.clone());
                ExternalSearchResponse {
                    found_count: results.len(),
                    message: format!(
                        "Found {} candidates from external sources (LinkedIn, Indeed, Glassdoor)",
                        results.len()
                    ),
                    results,
                    query: state.query.clone(),
                    fallback_reason,
                    error: None,
                }
            }
            Err(e) => {
                let error = format!("External search failed: {:#}", e);
                tracing::error!(component = COMPONENT, %error, "search failed");
                state.external_result = Some(Vec::new());
                state.error = Some(format!("{:#}", e));
                ExternalSearchResponse {
                    found_count: 0,
                    results: Vec::new(),
                    message: "External search encountered an error. Please try again.".to_string(),
                    query: state.query.clone(),
                    fallback_reason: None,
                    error: Some(error),
                }
            }
        };

        ResponseEnvelope::ExternalSearch(response)
    }
}

/// Prompt for 4-6 synthetic candidate profiles as a JSON array.
pub fn external_search_prompt(query: &str) -> String {
    format!(
        r#"You act as a recruitment search API covering LinkedIn, Indeed, Glassdoor and company databases.

Search request: "{query}"

Work out the role and the location the request asks for, then produce 4-6 realistic
candidate profiles that match them. Vary seniority (Junior, Mid-level, Senior, Lead,
Principal) and use diverse, realistic full names. Keep the location exactly as requested.

Each profile has: "name", "role", "location", "source" (always "external").

Reply with ONLY a JSON array, for example:
[
  {{"name": "Priya Sharma", "role": "Senior Machine Learning Engineer", "location": "San Francisco", "source": "external"}},
  {{"name": "Michael Chen", "role": "ML Engineer", "location": "San Francisco", "source": "external"}}
]"#
    )
}
