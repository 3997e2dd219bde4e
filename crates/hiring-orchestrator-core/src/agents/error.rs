//! ERROR handler: the terminal node for requests that could not be classified.

use async_trait::async_trait;

use crate::envelope::{ErrorHandlerResponse, ResponseEnvelope};
use crate::models::RequestState;

use super::Node;

const COMPONENT: &str = "error_handler";

const UNKNOWN_ERROR: &str = "Unknown error occurred in the system";

#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorHandler;

#[async_trait]
impl Node for ErrorHandler {
    fn name(&self) -> &'static str {
        COMPONENT
    }

    async fn run(&self, state: &mut RequestState) -> ResponseEnvelope {
        let error = state
            .error
            .clone()
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        tracing::error!(component = COMPONENT, %error, intent = %state.intent, "request failed");
        state.error = Some(error.clone());

        ResponseEnvelope::ErrorHandler(ErrorHandlerResponse {
            status: "failed".to_string(),
            message: "Unable to process the request. Please try rephrasing your query.".to_string(),
            error_details: error,
            suggestions: vec![
                "Make sure your query is clear and specific".to_string(),
                "For database queries: 'Add Priya Sharma as a Data Scientist from Pune'".to_string(),
                "For external search: 'Find AI researchers in Europe'".to_string(),
                "For hybrid: 'Search for ML engineers and add top 5 to database'".to_string(),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intent;

    #[tokio::test]
    async fn test_carries_recorded_error() {
        let mut state = RequestState::new("find x");
        state.intent = Intent::Error;
        state.error = Some("Intent classification failed: timeout".to_string());

        let ResponseEnvelope::ErrorHandler(r) = ErrorHandler.run(&mut state).await else {
            panic!("expected error handler envelope");
        };
        assert_eq!(r.status, "failed");
        assert_eq!(r.error_details, "Intent classification failed: timeout");
        assert_eq!(r.suggestions.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_error_gets_default() {
        let mut state = RequestState::new("find x");
        let env = ErrorHandler.run(&mut state).await;
        assert!(env.is_error());
        assert_eq!(state.error.as_deref(), Some(UNKNOWN_ERROR));
    }
}
