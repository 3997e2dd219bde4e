//! Intent classification.
//!
//! One model call per request picks LOCAL, EXTERNAL or HYBRID. When the
//! reply does not name exactly one label, a keyword rule over the query
//! decides instead. When the call itself fails the request is classified as
//! ERROR and the keyword rule is not consulted.

use std::sync::Arc;

use crate::inference::InferenceClient;
use crate::models::{Intent, RequestState};

const COMPONENT: &str = "intent_classifier";

const SAVE_WORDS: [&str; 3] = ["add", "save", "insert"];
const SEARCH_WORDS: [&str; 3] = ["find", "search", "look up"];
const DISCOVER_WORDS: [&str; 4] = ["find", "search", "look up", "discover"];

/// Result of classifying one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// Set when the model call failed.
    pub error: Option<String>,
    /// Whether the keyword rule picked the intent.
    pub used_fallback: bool,
}

pub struct IntentClassifier {
    inference: Arc<dyn InferenceClient>,
}

impl IntentClassifier {
    pub fn new(inference: Arc<dyn InferenceClient>) -> Self {
        Self { inference }
    }

    pub async fn classify(&self, query: &str) -> Classification {
        let answer = match self.inference.generate(&classification_prompt(query)).await {
            Ok(answer) => answer,
            Err(e) => {
                let message = format!("Intent classification failed: {}", e);
                tracing::error!(component = COMPONENT, error = %e, "classification call failed");
                return Classification {
                    intent: Intent::Error,
                    error: Some(message),
                    used_fallback: false,
                };
            }
        };

        if let Some(intent) = match_label(&answer) {
            tracing::info!(component = COMPONENT, %intent, "intent classified");
            return Classification {
                intent,
                error: None,
                used_fallback: false,
            };
        }

        let intent = fallback_intent(query);
        tracing::warn!(
            component = COMPONENT,
            answer = %answer.trim(),
            %intent,
            "unrecognised model label, applied keyword fallback"
        );
        Classification {
            intent,
            error: None,
            used_fallback: true,
        }
    }

    /// Classify `state.query` and record the intent (and error) on the state.
    pub async fn run(&self, state: &mut RequestState) {
        let Classification { intent, error, .. } = self.classify(&state.query).await;
        state.intent = intent;
        if error.is_some() {
            state.error = error;
        }
    }
}

/// Pick the label from a model reply.
///
/// The reply is upper-cased and trimmed; it must contain exactly one of the
/// three labels as a substring.
pub fn match_label(answer: &str) -> Option<Intent> {
    let answer = answer.trim().to_uppercase();
    let mut found = Intent::LABELS
        .into_iter()
        .filter(|label| answer.contains(label.as_str()));
    match (found.next(), found.next()) {
        (Some(intent), None) => Some(intent),
        _ => None,
    }
}

/// Deterministic keyword rule over the lower-cased query.
pub fn fallback_intent(query: &str) -> Intent {
    let q = query.to_lowercase();

    if contains_any(&q, &SAVE_WORDS) && contains_any(&q, &SEARCH_WORDS) {
        Intent::Hybrid
    } else if contains_any(&q, &DISCOVER_WORDS) {
        Intent::External
    } else {
        Intent::Local
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Prompt describing the three handlers with rules and worked examples.
pub fn classification_prompt(query: &str) -> String {
    format!(
        r#"You classify requests for a recruitment database assistant. Three handlers exist.

LOCAL - works on the existing people database.
  Use for: listing or counting stored people, adding ONE specific named person,
  updating or deleting stored records.
  Examples:
    "Show me all people in the database"
    "How many engineers are in Mumbai?"
    "Add Vikram Desai as a DevOps Engineer from Delhi"
    "Delete Amit Sharma from database"

EXTERNAL - searches outside recruitment platforms (LinkedIn, Indeed, Glassdoor).
  Use for: finding candidates who are not in the database yet, with NO request
  to add, save or insert them.
  Examples:
    "Find machine learning engineers in San Francisco"
    "Look up data scientists in Boston"
    "Discover cloud architects in Singapore"

HYBRID - searches outside platforms AND saves results to the database.
  Use for: any request that both searches and adds/saves/inserts.
  Examples:
    "Search for AI researchers in Europe and add the top 5 to our database"
    "Find ML engineers in San Francisco and save them to database"
    "Look up data scientists in Boston and add top 3 to our team"

Rules:
  - Searching AND adding/saving -> HYBRID
  - Only searching/finding -> EXTERNAL
  - Operating on existing records or adding one named person -> LOCAL

Request: "{query}"

Answer with exactly one word: LOCAL, EXTERNAL or HYBRID."#
    )
}
