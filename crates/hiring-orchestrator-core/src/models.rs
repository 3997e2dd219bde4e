//! Core data models used throughout the Hiring Orchestrator.
//!
//! These types describe a single request's lifecycle ([`RequestState`]),
//! the candidates synthesised by the search handlers ([`CandidateProfile`]),
//! and the rows persisted in the people store ([`PersonRecord`], [`PersonRow`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::envelope::ResponseEnvelope;

/// Classification of a request, deciding which handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    /// Not classified yet. Routed to the error handler if it ever reaches the router.
    #[default]
    Unset,
    Local,
    External,
    Hybrid,
    Error,
}

impl Intent {
    /// The three labels the classifier may select from model output.
    pub const LABELS: [Intent; 3] = [Intent::Local, Intent::External, Intent::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Unset => "UNSET",
            Intent::Local => "LOCAL",
            Intent::External => "EXTERNAL",
            Intent::Hybrid => "HYBRID",
            Intent::Error => "ERROR",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a person record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Added by an explicit "add <person>" command.
    Manual,
    /// Synthesised by a search handler.
    External,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Manual => "manual",
            Source::External => "external",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Source::Manual),
            "external" => Ok(Source::External),
            other => anyhow::bail!("unknown source: '{}'", other),
        }
    }
}

/// A synthesised, not-yet-persisted candidate.
///
/// Instances are only built by [`crate::extract::decode_candidates`], which
/// guarantees non-empty `name`, `role` and `location` and forces
/// `source = External`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub role: String,
    pub location: String,
    pub source: Source,
}

/// A row to write into the people store.
///
/// Manual records may carry missing fields when neither the model nor the
/// fallback extractors found them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    pub source: Source,
}

impl PersonRecord {
    /// Case-insensitive identity used for deduplication.
    pub fn name_key(&self) -> Option<String> {
        self.name.as_deref().map(name_key)
    }
}

impl From<&CandidateProfile> for PersonRecord {
    fn from(c: &CandidateProfile) -> Self {
        Self {
            name: Some(c.name.clone()),
            role: Some(c.role.clone()),
            location: Some(c.location.clone()),
            source: Source::External,
        }
    }
}

/// Normalise a name into its dedup key.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A person row read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRow {
    pub id: i64,
    pub name: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    pub source: Source,
    /// Insert time as an ISO-8601 UTC string.
    pub created_at: String,
}

/// Parameters for the fixed `select-filtered` statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    /// Case-insensitive substring match on `role`.
    pub role_like: Option<String>,
    /// Case-insensitive exact match on `location`.
    pub location: Option<String>,
    pub limit: i64,
}

/// Result of the insert-or-ignore primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same dedup key already existed; nothing was written.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: Source,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

/// Output of the fixed `select-summary` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub total: i64,
    pub by_source: Vec<SourceCount>,
    pub top_roles: Vec<RoleCount>,
}

/// Per-request state, created fresh for every query and mutated in place by
/// the node that runs.
#[derive(Debug, Clone, Serialize)]
pub struct RequestState {
    pub request_id: String,
    pub query: String,
    pub intent: Intent,
    pub local_result: Option<serde_json::Value>,
    pub external_result: Option<Vec<CandidateProfile>>,
    pub final_response: Option<ResponseEnvelope>,
    pub error: Option<String>,
}

impl RequestState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            intent: Intent::Unset,
            local_result: None,
            external_result: None,
            final_response: None,
            error: None,
        }
    }
}
