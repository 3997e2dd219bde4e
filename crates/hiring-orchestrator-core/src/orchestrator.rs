//! Single-entry, single-exit request state machine.
//!
//! ```text
//! query ─▶ IntentClassifier ─▶ route() ─┬─▶ LocalDbAgent ───────┐
//!                                       ├─▶ ExternalSearchAgent ├─▶ envelope
//!                                       ├─▶ HybridAgent ────────┤
//!                                       └─▶ ErrorHandler ───────┘
//! ```
//!
//! Each call builds a fresh [`RequestState`], runs exactly one handler and
//! returns exactly one envelope. State is never shared between requests; the
//! store is the only shared resource.

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;

use crate::agents::{ErrorHandler, ExternalSearchAgent, HybridAgent, LocalDbAgent, Node};
use crate::envelope::ResponseEnvelope;
use crate::inference::InferenceClient;
use crate::intent::IntentClassifier;
use crate::models::{Intent, RequestState};
use crate::router::{route, Route};
use crate::store::Store;

const COMPONENT: &str = "orchestrator";

/// Response for a single query, as exposed to transports.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub intent: Intent,
    pub response: ResponseEnvelope,
    pub error: Option<String>,
}

pub struct Orchestrator {
    classifier: IntentClassifier,
    local: LocalDbAgent,
    external: ExternalSearchAgent,
    hybrid: HybridAgent,
    error_handler: ErrorHandler,
}

impl Orchestrator {
    /// Wire every node to the same inference client and store.
    pub fn new(inference: Arc<dyn InferenceClient>, store: Arc<dyn Store>) -> Self {
        Self {
            classifier: IntentClassifier::new(inference.clone()),
            local: LocalDbAgent::new(inference.clone(), store.clone()),
            external: ExternalSearchAgent::new(inference.clone()),
            hybrid: HybridAgent::new(inference, store),
            error_handler: ErrorHandler,
        }
    }

    fn node(&self, route: Route) -> &dyn Node {
        match route {
            Route::LocalDbAgent => &self.local,
            Route::ExternalSearchAgent => &self.external,
            Route::HybridAgent => &self.hybrid,
            Route::ErrorHandler => &self.error_handler,
        }
    }

    async fn execute(&self, query: &str) -> (RequestState, ResponseEnvelope) {
        let mut state = RequestState::new(query);
        let span = tracing::info_span!("request", request_id = %state.request_id);

        async move {
            tracing::info!(component = COMPONENT, query = %state.query, "new query");

            self.classifier.run(&mut state).await;
            let route = route(state.intent);
            tracing::info!(component = "router", intent = %state.intent, %route, "routing decision");

            let node = self.node(route);
            let envelope = node.run(&mut state).await;
            tracing::info!(
                component = COMPONENT,
                node = node.name(),
                agent = envelope.agent(),
                failed = envelope.is_error(),
                "query completed"
            );
            (state, envelope)
        }
        .instrument(span)
        .await
    }

    /// Run one query and return the full final state.
    pub async fn run(&self, query: &str) -> RequestState {
        let (mut state, envelope) = self.execute(query).await;
        state.final_response = Some(envelope);
        state
    }

    /// Run one query and return the transport-facing response.
    pub async fn process_query(&self, query: &str) -> QueryResponse {
        let (state, envelope) = self.execute(query).await;
        QueryResponse {
            query: state.query,
            intent: state.intent,
            response: envelope,
            error: state.error,
        }
    }
}
