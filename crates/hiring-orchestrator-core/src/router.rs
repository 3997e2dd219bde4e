//! Intent → handler routing.

use std::fmt;

use serde::Serialize;

use crate::models::Intent;

/// Identifier of the handler node that serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    LocalDbAgent,
    ExternalSearchAgent,
    HybridAgent,
    ErrorHandler,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::LocalDbAgent => "local_db_agent",
            Route::ExternalSearchAgent => "external_search_agent",
            Route::HybridAgent => "hybrid_agent",
            Route::ErrorHandler => "error_handler",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an intent to its handler. Anything unrecognised goes to the error handler.
pub fn route(intent: Intent) -> Route {
    match intent {
        Intent::Local => Route::LocalDbAgent,
        Intent::External => Route::ExternalSearchAgent,
        Intent::Hybrid => Route::HybridAgent,
        Intent::Error | Intent::Unset => Route::ErrorHandler,
    }
}
