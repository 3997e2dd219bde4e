//! Response envelopes.
//!
//! Every request produces exactly one [`ResponseEnvelope`]. On the wire it is
//! a JSON object whose `agent` field names the handler that produced it:
//!
//! ```json
//! { "agent": "LOCAL_DB", "message": "Record inserted successfully", "data": { ... } }
//! { "agent": "HYBRID", "error": "Hybrid operation failed: ..." }
//! { "agent": "ERROR_HANDLER", "status": "failed", "error_details": "...", ... }
//! ```
//!
//! Handler payloads that have both success and failure shapes are untagged
//! enums, so the failure shape is the one carrying `error`.

use serde::Serialize;

use crate::models::{CandidateProfile, PersonRow, StoreSummary};

/// Platform label reported by the search handlers.
pub const SEARCHED_PLATFORMS: &str = "LinkedIn, Indeed, Glassdoor, Company Databases";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "agent")]
pub enum ResponseEnvelope {
    #[serde(rename = "LOCAL_DB")]
    LocalDb(LocalDbResponse),
    #[serde(rename = "EXTERNAL_SEARCH")]
    ExternalSearch(ExternalSearchResponse),
    #[serde(rename = "HYBRID")]
    Hybrid(HybridResponse),
    #[serde(rename = "ERROR_HANDLER")]
    ErrorHandler(ErrorHandlerResponse),
}

impl ResponseEnvelope {
    /// The `agent` discriminator as it appears on the wire.
    pub fn agent(&self) -> &'static str {
        match self {
            ResponseEnvelope::LocalDb(_) => "LOCAL_DB",
            ResponseEnvelope::ExternalSearch(_) => "EXTERNAL_SEARCH",
            ResponseEnvelope::Hybrid(_) => "HYBRID",
            ResponseEnvelope::ErrorHandler(_) => "ERROR_HANDLER",
        }
    }

    /// Whether this envelope reports a failure.
    pub fn is_error(&self) -> bool {
        match self {
            ResponseEnvelope::LocalDb(r) => matches!(r, LocalDbResponse::Failed { .. }),
            ResponseEnvelope::ExternalSearch(r) => r.error.is_some(),
            ResponseEnvelope::Hybrid(r) => matches!(r, HybridResponse::Failed { .. }),
            ResponseEnvelope::ErrorHandler(_) => true,
        }
    }
}

/// Fields extracted from an add-command, after title-casing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonFields {
    pub name: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LocalDbResponse {
    Inserted { message: String, data: PersonFields },
    NoOp { message: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ExternalSearchResponse {
    pub found_count: usize,
    pub results: Vec<CandidateProfile>,
    pub message: String,
    pub query: String,
    /// Why the model output could not be decoded, when it could not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of a best-effort display step: either the data or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DisplayResult<T> {
    Available(T),
    Unavailable(String),
}

impl<T> DisplayResult<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, DisplayResult::Available(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExternalSearchSummary {
    pub total_found: usize,
    pub searched_platforms: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseOperation {
    pub existing_similar_records: DisplayResult<Vec<PersonRow>>,
    pub new_records_inserted: usize,
    pub duplicates_skipped: usize,
    pub database_summary: DisplayResult<StoreSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HybridSummary {
    pub external_search: ExternalSearchSummary,
    pub database_operation: DatabaseOperation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HybridResponse {
    Completed {
        message: String,
        summary: HybridSummary,
        inserted_people: Vec<CandidateProfile>,
        skipped_people: Vec<CandidateProfile>,
        all_external_results: Vec<CandidateProfile>,
    },
    NoResults {
        message: String,
        external_count: usize,
        database_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        fallback_reason: Option<String>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorHandlerResponse {
    pub status: String,
    pub message: String,
    pub error_details: String,
    pub suggestions: Vec<String>,
}
