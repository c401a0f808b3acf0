//! # iris-memory
//!
//! In-process state for iris: per-user conversation histories, pending
//! reminders, and the broadcast subscriber registry. Nothing here is
//! persisted across a restart.

pub mod context;
pub mod reminders;
pub mod subscribers;

pub use context::{ContextStore, History, Session};
pub use reminders::{ReminderItem, ReminderStore};
pub use subscribers::SubscriberRegistry;
