//! Per-user session coordination.
//!
//! One request cycle = one locked exchange: append the user turn and the
//! assistant turn as a unit, or nothing at all. The per-user lock is the
//! only serialization point; users never block each other.

use iris_core::{
    context::{Context, Turn},
    traits::Provider,
};
use iris_memory::ContextStore;
use std::sync::Arc;
use tracing::warn;

/// Serializes concurrent requests per user and orchestrates
/// append → complete → commit as one logical unit.
pub struct SessionCoordinator {
    contexts: Arc<ContextStore>,
    provider: Arc<dyn Provider>,
    fallback_reply: String,
}

impl SessionCoordinator {
    pub fn new(
        contexts: Arc<ContextStore>,
        provider: Arc<dyn Provider>,
        fallback_reply: String,
    ) -> Self {
        Self {
            contexts,
            provider,
            fallback_reply,
        }
    }

    /// Run one request cycle for a user.
    ///
    /// Returns the assistant reply, or the fallback reply when the provider
    /// fails — in which case the history is left exactly as it was.
    pub async fn handle_turn(&self, user_id: &str, text: &str) -> String {
        let session = self.contexts.get_or_create(user_id).await;
        // Held across the provider call: a second request for the same user
        // queues here until this exchange commits or aborts.
        let mut history = session.lock().await;

        // Working copy — the candidate user turn rides along only for the
        // provider call and is not yet committed.
        let mut turns = history.snapshot();
        turns.push(Turn::user(text));
        let context = Context::new(turns);

        match self.provider.complete(&context).await {
            Ok(completion) => {
                history.commit_exchange(Turn::user(text), Turn::assistant(&completion.text));
                completion.text
            }
            Err(e) => {
                warn!("provider failure for {user_id}: {e}");
                self.fallback_reply.clone()
            }
        }
    }
}
