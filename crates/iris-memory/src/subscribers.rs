//! Broadcast subscriber registry.

use std::collections::BTreeSet;
use tokio::sync::Mutex;

/// Users who receive scheduled broadcasts.
///
/// Users are added on first contact (first message or group join) and are
/// never removed during the process lifetime.
#[derive(Default)]
pub struct SubscriberRegistry {
    users: Mutex<BTreeSet<String>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the user was not subscribed before.
    pub async fn subscribe(&self, user_id: &str) -> bool {
        self.users.lock().await.insert(user_id.to_string())
    }

    /// Stable-ordered copy for broadcast fan-out.
    pub async fn snapshot(&self) -> Vec<String> {
        self.users.lock().await.iter().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.users.lock().await.len()
    }
}
