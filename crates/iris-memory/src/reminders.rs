//! Pending one-shot reminders.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// A scheduled one-shot reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub user_id: String,
    pub due_at: DateTime<Utc>,
    pub message: String,
}

/// In-memory reminder store.
///
/// Items are removed the moment they are taken for dispatch, so delivery is
/// at most once: a push that later fails is logged by the caller but never
/// re-queued, and an item can never re-fire on a later tick.
pub struct ReminderStore {
    items: Mutex<Vec<ReminderItem>>,
    granularity: Duration,
}

impl ReminderStore {
    /// `granularity_secs` is the scheduler tick period. Firing times finer
    /// than one tick are not distinguishable and are rounded down at
    /// creation.
    pub fn new(granularity_secs: u64) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            granularity: Duration::seconds(granularity_secs.max(1) as i64),
        }
    }

    /// Add a reminder. Returns the effective (rounded) firing time.
    ///
    /// Multiple reminders may share the same `(user_id, due_at)`; each
    /// fires independently.
    pub async fn add(&self, user_id: &str, due_at: DateTime<Utc>, message: &str) -> DateTime<Utc> {
        let due_at = round_down(due_at, self.granularity);
        let mut items = self.items.lock().await;
        items.push(ReminderItem {
            user_id: user_id.to_string(),
            due_at,
            message: message.to_string(),
        });
        due_at
    }

    /// Remove and return every item due at `now` — or earlier, so a stalled
    /// tick can't strand an item forever.
    pub async fn take_due(&self, now: DateTime<Utc>) -> Vec<ReminderItem> {
        let now = round_down(now, self.granularity);
        let mut items = self.items.lock().await;
        let (due, pending): (Vec<_>, Vec<_>) =
            items.drain(..).partition(|item| item.due_at <= now);
        *items = pending;
        due
    }

    /// Number of reminders not yet fired.
    pub async fn pending_count(&self) -> usize {
        self.items.lock().await.len()
    }
}

fn round_down(t: DateTime<Utc>, granularity: Duration) -> DateTime<Utc> {
    let step = granularity.num_seconds().max(1);
    let ts = t.timestamp() - t.timestamp().rem_euclid(step);
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or(t)
}
