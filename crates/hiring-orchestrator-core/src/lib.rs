//! # Hiring Orchestrator Core
//!
//! Runtime-free logic for the Hiring Orchestrator: data models, response
//! envelopes, the inference and store capability traits, intent
//! classification, routing, the four handler nodes and the orchestrator
//! that wires them together.
//!
//! This crate contains no tokio, sqlx or HTTP code. Concrete store and
//! inference backends live in the `hiring-orchestrator` crate; this crate
//! ships an [`store::memory::InMemoryStore`] and an
//! [`inference::ScriptedInference`] for tests and offline use.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Intent, candidate, person and request-state types |
//! | [`envelope`] | Tagged response envelopes |
//! | [`inference`] | `InferenceClient` trait and scripted double |
//! | [`store`] | `Store` trait (fixed statement set) and in-memory store |
//! | [`extract`] | Candidate decoding and text fallbacks |
//! | [`intent`] | Intent classifier with keyword fallback |
//! | [`router`] | Intent → handler table |
//! | [`agents`] | Handler nodes |
//! | [`orchestrator`] | Per-request state machine |

pub mod agents;
pub mod envelope;
pub mod extract;
pub mod inference;
pub mod intent;
pub mod models;
pub mod orchestrator;
pub mod router;
pub mod store;

pub use envelope::ResponseEnvelope;
pub use inference::InferenceClient;
pub use models::{CandidateProfile, Intent, PersonRecord, RequestState, Source};
pub use orchestrator::{Orchestrator, QueryResponse};
pub use store::Store;
