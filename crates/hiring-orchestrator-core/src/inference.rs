//! Text-generation capability.
//!
//! Handlers never talk to a model directly: they receive an
//! [`InferenceClient`] and treat its output as untrusted free text. The
//! network-backed implementation lives in the `hiring-orchestrator` crate;
//! [`ScriptedInference`] returns canned replies for deterministic tests and
//! offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// A prompt-in, text-out model endpoint.
///
/// Implementations carry their own timeout. A call is single-attempt; the
/// caller decides what a failure means.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Returns the model identifier (e.g. `"llama-3.1-8b-instant"`).
    fn model_name(&self) -> &str;

    /// Send one prompt and return the model's reply text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// An [`InferenceClient`] that replays a queue of canned replies.
///
/// Each call pops the next scripted reply. When the queue is empty the
/// default reply is used, or the call fails if no default was set. Every
/// prompt is recorded so tests can assert on call counts and content.
#[derive(Default)]
pub struct ScriptedInference {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    default_reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failing call (transport error, timeout).
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    /// Reply used once the queue is exhausted.
    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default_reply = Some(text.into());
        self
    }

    fn push(self, entry: std::result::Result<String, String>) -> Self {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(entry);
        }
        self
    }

    /// All prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| anyhow!("scripted inference lock poisoned"))?
            .push(prompt.to_string());

        let next = self
            .replies
            .lock()
            .map_err(|_| anyhow!("scripted inference lock poisoned"))?
            .pop_front();

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => self
                .default_reply
                .clone()
                .ok_or_else(|| anyhow!("no scripted reply left")),
        }
    }
}
