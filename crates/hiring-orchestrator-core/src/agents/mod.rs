//! Handler nodes.
//!
//! Each request runs exactly one [`Node`], chosen by the router. A node
//! never fails past its boundary: whatever goes wrong inside it is turned
//! into that node's own envelope shape. Nodes never call each other.
//!
//! | Node | Intent | Envelope |
//! |------|--------|----------|
//! | [`LocalDbAgent`] | LOCAL | `LOCAL_DB` |
//! | [`ExternalSearchAgent`] | EXTERNAL | `EXTERNAL_SEARCH` |
//! | [`HybridAgent`] | HYBRID | `HYBRID` |
//! | [`ErrorHandler`] | ERROR | `ERROR_HANDLER` |

mod error;
mod external;
mod hybrid;
mod local;

pub use error::ErrorHandler;
pub use external::{external_search_prompt, ExternalSearchAgent};
pub use hybrid::{commit_count, hybrid_search_prompt, HybridAgent, DEFAULT_COMMIT_COUNT};
pub use local::{extraction_prompt, is_add_command, LocalDbAgent};

use anyhow::Result;
use async_trait::async_trait;

use crate::envelope::ResponseEnvelope;
use crate::extract::{decode_candidates, CandidateDecode};
use crate::inference::InferenceClient;
use crate::models::RequestState;

/// A terminal handler in the request state machine.
#[async_trait]
pub trait Node: Send + Sync {
    /// Node name used in log events (e.g. `"hybrid_agent"`).
    fn name(&self) -> &'static str;

    /// Handle the request, updating `state` and returning its one envelope.
    async fn run(&self, state: &mut RequestState) -> ResponseEnvelope;
}

/// Ask the model for a candidate list and decode it.
///
/// Fails only when the model call fails; undecodable output comes back as
/// [`CandidateDecode::Fallback`].
pub(crate) async fn synthesize_candidates(
    inference: &dyn InferenceClient,
    prompt: &str,
    component: &'static str,
) -> Result<CandidateDecode> {
    let text = inference.generate(prompt).await?;
    tracing::debug!(component, bytes = text.len(), "candidate reply received");

    let decoded = decode_candidates(&text);
    if let CandidateDecode::Fallback { reason } = &decoded {
        tracing::warn!(component, %reason, "candidate list not decodable");
    }
    Ok(decoded)
}
