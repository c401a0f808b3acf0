use crate::{
    context::Context,
    error::IrisError,
    message::{Completion, OutgoingMessage},
};
use async_trait::async_trait;

/// Completion provider trait.
///
/// A hosted language-completion backend implements this to turn a
/// conversation context into a reply. Providers never mutate conversation
/// state; committing turns is the session coordinator's responsibility.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Send a conversation context to the provider and get a completion.
    async fn complete(&self, context: &Context) -> Result<Completion, IrisError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging channel trait — outbound delivery.
///
/// Inbound events arrive over the webhook served by the binary, so channels
/// only send: replies bound to an event's reply token, and pushes addressed
/// by user id.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Deliver one message to its target.
    async fn send(&self, message: OutgoingMessage) -> Result<(), IrisError>;

    /// Best-effort display-name lookup for a group member.
    async fn member_profile(
        &self,
        _group_id: &str,
        _user_id: &str,
    ) -> Result<Option<String>, IrisError> {
        Ok(None)
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), IrisError>;
}
