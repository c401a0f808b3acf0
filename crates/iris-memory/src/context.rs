//! Per-user conversation history store.
//!
//! The outer map lock is held only for lookup and insert. Each user's
//! history sits behind its own async mutex ([`Session`]), which doubles as
//! the per-user serialization lock for a full request cycle — two
//! concurrent requests for the same user queue on it, requests for
//! different users never contend.

use iris_core::context::Turn;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Keyed store of per-user conversation sessions.
pub struct ContextStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    system_prompt: String,
    max_turns: usize,
}

/// One user's conversation state plus its serialization lock.
pub struct Session {
    history: Mutex<History>,
}

impl Session {
    /// Acquire the per-user lock.
    ///
    /// Held for the duration of one request cycle so the user-turn /
    /// assistant-turn pair commits without interleaving.
    pub async fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().await
    }
}

/// Ordered conversation turns. The first turn is always the system turn,
/// inserted exactly once at session creation.
#[derive(Debug, Clone)]
pub struct History {
    turns: Vec<Turn>,
    max_turns: usize,
}

impl History {
    fn new(system_prompt: &str, max_turns: usize) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
            max_turns,
        }
    }

    /// Read-only copy taken at a single consistent point.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Number of turns beyond the initial system turn.
    pub fn turn_count(&self) -> usize {
        self.turns.len().saturating_sub(1)
    }

    /// Append one turn, then enforce the retention bound.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.enforce_bound();
    }

    /// Commit a full user/assistant exchange as one unit.
    pub fn commit_exchange(&mut self, user: Turn, assistant: Turn) {
        self.turns.push(user);
        self.turns.push(assistant);
        self.enforce_bound();
    }

    /// Drop everything but the system turn.
    pub fn reset(&mut self) {
        self.turns.truncate(1);
    }

    /// Cap to the `max_turns` most recent turns, always keeping the system
    /// turn. Exchanges land in pairs and `max_turns` is even, so trimming
    /// never splits a user/assistant pair.
    fn enforce_bound(&mut self) {
        let excess = self.turns.len().saturating_sub(self.max_turns + 1);
        if excess > 0 {
            self.turns.drain(1..1 + excess);
        }
    }
}

impl ContextStore {
    /// `max_turns` is rounded down to an even count (minimum one exchange).
    pub fn new(system_prompt: impl Into<String>, max_turns: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            system_prompt: system_prompt.into(),
            max_turns: (max_turns & !1).max(2),
        }
    }

    /// Return the existing session for `user_id`, or create one seeded with
    /// the system turn. Idempotent: repeat calls yield the same session.
    pub async fn get_or_create(&self, user_id: &str) -> Arc<Session> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                Arc::new(Session {
                    history: Mutex::new(History::new(&self.system_prompt, self.max_turns)),
                })
            })
            .clone()
    }

    /// Append one turn to a user's history, creating it on first use.
    pub async fn append(&self, user_id: &str, turn: Turn) {
        let session = self.get_or_create(user_id).await;
        let mut history = session.lock().await;
        history.append(turn);
    }

    /// Consistent read-only copy of a user's history; creates on first use.
    pub async fn snapshot(&self, user_id: &str) -> Vec<Turn> {
        let session = self.get_or_create(user_id).await;
        let history = session.lock().await;
        history.snapshot()
    }

    /// Clear a user's history back to the system turn.
    pub async fn reset(&self, user_id: &str) {
        let session = self.get_or_create(user_id).await;
        let mut history = session.lock().await;
        history.reset();
    }

    /// Number of tracked users.
    pub async fn user_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::context::Role;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = ContextStore::new("sys", 20);
        let a = store.get_or_create("u1").await;
        let b = store.get_or_create("u1").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_new_history_starts_with_system_turn() {
        let store = ContextStore::new("You are a helpful assistant.", 20);
        let turns = store.snapshot("u1").await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].content, "You are a helpful assistant.");
    }

    #[tokio::test]
    async fn test_append_creates_on_first_use() {
        let store = ContextStore::new("sys", 20);
        store.append("u1", Turn::user("hi")).await;
        let turns = store.snapshot("u1").await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = ContextStore::new("sys", 20);
        store.append("u1", Turn::user("from u1")).await;
        let turns = store.snapshot("u2").await;
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_exchange_appends_in_order() {
        let store = ContextStore::new("sys", 20);
        let session = store.get_or_create("u1").await;
        {
            let mut history = session.lock().await;
            history.commit_exchange(Turn::user("q"), Turn::assistant("a"));
        }
        let turns = store.snapshot("u1").await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_retention_bound_keeps_system_and_recent_turns() {
        let store = ContextStore::new("sys", 4);
        let session = store.get_or_create("u1").await;
        {
            let mut history = session.lock().await;
            for i in 0..10 {
                history.commit_exchange(
                    Turn::user(format!("q{i}")),
                    Turn::assistant(format!("a{i}")),
                );
            }
        }
        let turns = store.snapshot("u1").await;
        // System turn + 4 most recent turns.
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].content, "q8");
        assert_eq!(turns[4].content, "a9");
        // Alternation survives trimming.
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_reset_keeps_only_system_turn() {
        let store = ContextStore::new("sys", 20);
        store.append("u1", Turn::user("hi")).await;
        store.reset("u1").await;
        let turns = store.snapshot("u1").await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_odd_max_turns_rounds_down() {
        let store = ContextStore::new("sys", 5);
        let session = store.get_or_create("u1").await;
        {
            let mut history = session.lock().await;
            for i in 0..6 {
                history.commit_exchange(
                    Turn::user(format!("q{i}")),
                    Turn::assistant(format!("a{i}")),
                );
            }
        }
        // Bound rounds down to 4, so system + 4.
        assert_eq!(store.snapshot("u1").await.len(), 5);
    }
}
