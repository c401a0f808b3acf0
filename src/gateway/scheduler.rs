//! Time-triggered notifications: one-shot reminders and periodic broadcasts.
//!
//! A single loop wakes at a fixed tick period, drains due reminders, and
//! evaluates broadcast schedules. Dispatch failures are logged and skipped;
//! the loop only exits on the stop signal.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use iris_core::{
    clock::Clock,
    error::IrisError,
    message::{DeliveryTarget, MessageMetadata, OutgoingMessage, Payload},
    traits::Channel,
};
use iris_memory::{ReminderStore, SubscriberRegistry};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// When a broadcast job fires.
#[derive(Debug, Clone)]
pub enum BroadcastSchedule {
    /// Once per day at a fixed local time of day.
    Daily(NaiveTime),
    /// At a fixed repeating interval, first firing one interval after start.
    Every(Duration),
}

/// Produces the payload for one broadcast firing.
#[async_trait]
pub trait BroadcastSource: Send + Sync {
    async fn produce(&self) -> Result<Payload, IrisError>;
}

/// A periodic broadcast registered once at startup.
pub struct BroadcastJob {
    pub name: String,
    pub schedule: BroadcastSchedule,
    pub source: Arc<dyn BroadcastSource>,
}

/// The notification scheduler. Build with [`Scheduler::new`], register jobs,
/// then [`Scheduler::spawn`] to start ticking.
pub struct Scheduler {
    reminders: Arc<ReminderStore>,
    subscribers: Arc<SubscriberRegistry>,
    channel: Arc<dyn Channel>,
    clock: Arc<dyn Clock>,
    tick: std::time::Duration,
    jobs: Vec<JobState>,
}

struct JobState {
    job: BroadcastJob,
    last_fired: Option<DateTime<Utc>>,
}

/// Handle to a running scheduler; `stop` shuts the loop down cleanly.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop and wait for it to wind down.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

impl Scheduler {
    pub fn new(
        reminders: Arc<ReminderStore>,
        subscribers: Arc<SubscriberRegistry>,
        channel: Arc<dyn Channel>,
        clock: Arc<dyn Clock>,
        tick_secs: u64,
    ) -> Self {
        Self {
            reminders,
            subscribers,
            channel,
            clock,
            tick: std::time::Duration::from_secs(tick_secs.max(1)),
            jobs: Vec::new(),
        }
    }

    /// Register a broadcast job. Jobs live for the whole process.
    pub fn register_job(&mut self, job: BroadcastJob) {
        info!("registered broadcast job: {}", job.name);
        self.jobs.push(JobState {
            job,
            last_fired: None,
        });
    }

    /// Start the tick loop.
    pub fn spawn(mut self) -> SchedulerHandle {
        // Interval jobs measure from startup, not from the epoch.
        let started = self.clock.now().with_timezone(&Utc);
        for state in &mut self.jobs {
            if matches!(state.job.schedule, BroadcastSchedule::Every(_)) {
                state.last_fired = Some(started);
            }
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.tick);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!("scheduler running, tick every {:?}", self.tick);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick_once().await,
                    _ = stop_rx.changed() => {
                        info!("scheduler stopping");
                        break;
                    }
                }
            }
        });

        SchedulerHandle { stop_tx, task }
    }

    /// One evaluation pass: due reminders, then due broadcast jobs.
    ///
    /// Never errors — every dispatch failure is absorbed here.
    async fn tick_once(&mut self) {
        let now = self.clock.now();
        self.fire_reminders(now).await;
        self.fire_broadcasts(now).await;
    }

    async fn fire_reminders(&self, now: DateTime<FixedOffset>) {
        let due = self.reminders.take_due(now.with_timezone(&Utc)).await;
        for item in due {
            let message = OutgoingMessage {
                target: DeliveryTarget::Push(item.user_id.clone()),
                payload: Payload::Text(item.message.clone()),
                metadata: MessageMetadata::default(),
            };
            // The item is already consumed: a failed push is dropped, not
            // re-queued (at-most-once delivery).
            match self.channel.send(message).await {
                Ok(()) => info!("delivered reminder to {}", item.user_id),
                Err(e) => error!("reminder push to {} failed: {e}", item.user_id),
            }
        }
    }

    async fn fire_broadcasts(&mut self, now: DateTime<FixedOffset>) {
        let now_utc = now.with_timezone(&Utc);
        for state in &mut self.jobs {
            if !is_due(&state.job.schedule, now, state.last_fired) {
                continue;
            }
            // Advance even when the source fails: a broken source must not
            // retry on every tick until the next period.
            state.last_fired = Some(now_utc);

            let payload = match state.job.source.produce().await {
                Ok(payload) => payload,
                Err(e) => {
                    error!("broadcast {} failed to produce: {e}", state.job.name);
                    continue;
                }
            };

            let recipients = self.subscribers.snapshot().await;
            info!(
                "broadcast {} firing to {} subscribers",
                state.job.name,
                recipients.len()
            );
            for user_id in recipients {
                let message = OutgoingMessage {
                    target: DeliveryTarget::Push(user_id.clone()),
                    payload: payload.clone(),
                    metadata: MessageMetadata::default(),
                };
                if let Err(e) = self.channel.send(message).await {
                    error!("broadcast {} to {user_id} failed: {e}", state.job.name);
                }
            }
        }
    }
}

/// Whether a schedule is satisfied at `now`, given the last firing.
fn is_due(
    schedule: &BroadcastSchedule,
    now: DateTime<FixedOffset>,
    last_fired: Option<DateTime<Utc>>,
) -> bool {
    match schedule {
        BroadcastSchedule::Daily(time) => {
            let today_target = now.date_naive().and_time(*time);
            if now.naive_local() < today_target {
                return false;
            }
            match last_fired {
                None => true,
                // Fired before today's target means not yet fired today.
                Some(last) => last.with_timezone(&now.timezone()).naive_local() < today_target,
            }
        }
        BroadcastSchedule::Every(interval) => match last_fired {
            None => true,
            Some(last) => now.with_timezone(&Utc) - last >= *interval,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use iris_core::clock::ManualClock;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    /// Channel stub recording sends; pushes to users in `fail_for` error out.
    #[derive(Default)]
    struct RecordingChannel {
        sent: StdMutex<Vec<OutgoingMessage>>,
        fail_for: HashSet<String>,
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, message: OutgoingMessage) -> Result<(), IrisError> {
            if let DeliveryTarget::Push(user_id) = &message.target {
                if self.fail_for.contains(user_id) {
                    return Err(IrisError::Channel(format!("push to {user_id} rejected")));
                }
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn stop(&self) -> Result<(), IrisError> {
            Ok(())
        }
    }

    struct FixedSource(Payload);

    #[async_trait]
    impl BroadcastSource for FixedSource {
        async fn produce(&self) -> Result<Payload, IrisError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BroadcastSource for FailingSource {
        async fn produce(&self) -> Result<Payload, IrisError> {
            Err(IrisError::Feed("feed down".into()))
        }
    }

    fn taipei(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, h, m, 0)
            .unwrap()
    }

    struct Fixture {
        reminders: Arc<ReminderStore>,
        subscribers: Arc<SubscriberRegistry>,
        channel: Arc<RecordingChannel>,
        clock: Arc<ManualClock>,
        scheduler: Scheduler,
    }

    fn fixture(channel: RecordingChannel, start: DateTime<FixedOffset>) -> Fixture {
        let reminders = Arc::new(ReminderStore::new(60));
        let subscribers = Arc::new(SubscriberRegistry::new());
        let channel = Arc::new(channel);
        let clock = Arc::new(ManualClock::new(start));
        let scheduler = Scheduler::new(
            reminders.clone(),
            subscribers.clone(),
            channel.clone(),
            clock.clone(),
            60,
        );
        Fixture {
            reminders,
            subscribers,
            channel,
            clock,
            scheduler,
        }
    }

    fn pushed_texts(channel: &RecordingChannel) -> Vec<(String, String)> {
        channel
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match (&m.target, &m.payload) {
                (DeliveryTarget::Push(user), Payload::Text(text)) => {
                    Some((user.clone(), text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reminder_fires_once_at_due_time() {
        let mut fx = fixture(RecordingChannel::default(), taipei(10, 0));
        fx.reminders
            .add("u1", taipei(10, 5).with_timezone(&Utc), "喝水")
            .await;

        // 10:00 through 10:04 — nothing.
        for _ in 0..5 {
            fx.scheduler.tick_once().await;
            fx.clock.advance_secs(60);
        }
        assert!(pushed_texts(&fx.channel).is_empty());

        // 10:05 — fires.
        fx.scheduler.tick_once().await;
        assert_eq!(
            pushed_texts(&fx.channel),
            vec![("u1".to_string(), "喝水".to_string())]
        );
        assert_eq!(fx.reminders.pending_count().await, 0);

        // 10:06 — no duplicate.
        fx.clock.advance_secs(60);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_dispatch_does_not_abort_tick_or_requeue() {
        let channel = RecordingChannel {
            fail_for: HashSet::from(["bad-user".to_string()]),
            ..Default::default()
        };
        let mut fx = fixture(channel, taipei(14, 5));
        let due = taipei(14, 5).with_timezone(&Utc);
        fx.reminders.add("bad-user", due, "first").await;
        fx.reminders.add("u2", due, "second").await;

        fx.scheduler.tick_once().await;

        // The failed push didn't stop the second reminder.
        assert_eq!(
            pushed_texts(&fx.channel),
            vec![("u2".to_string(), "second".to_string())]
        );
        // At-most-once: the failed item is consumed, not re-queued.
        assert_eq!(fx.reminders.pending_count().await, 0);

        fx.clock.advance_secs(60);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 1);
    }

    #[tokio::test]
    async fn test_daily_broadcast_fires_once_per_day() {
        let mut fx = fixture(RecordingChannel::default(), taipei(7, 59));
        fx.subscribers.subscribe("u1").await;
        fx.subscribers.subscribe("u2").await;
        fx.scheduler.register_job(BroadcastJob {
            name: "digest".into(),
            schedule: BroadcastSchedule::Daily(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            source: Arc::new(FixedSource(Payload::Text("morning".into()))),
        });

        // 07:59 — before the target.
        fx.scheduler.tick_once().await;
        assert!(pushed_texts(&fx.channel).is_empty());

        // 08:00 — fires to both subscribers.
        fx.clock.advance_secs(60);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 2);

        // Later the same day — does not fire again.
        fx.clock.advance_secs(6 * 3600);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 2);

        // Next day 08:00 — fires again.
        fx.clock.advance_secs(18 * 3600);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 4);
    }

    #[tokio::test]
    async fn test_interval_broadcast_respects_interval() {
        let mut fx = fixture(RecordingChannel::default(), taipei(12, 0));
        fx.subscribers.subscribe("u1").await;
        fx.scheduler.register_job(BroadcastJob {
            name: "pulse".into(),
            schedule: BroadcastSchedule::Every(Duration::minutes(10)),
            source: Arc::new(FixedSource(Payload::Text("pulse".into()))),
        });
        // Mimic spawn(): interval jobs measure from start.
        let started = fx.clock.now().with_timezone(&Utc);
        fx.scheduler.jobs[0].last_fired = Some(started);

        // 12:05 — interval not yet elapsed.
        fx.clock.advance_secs(300);
        fx.scheduler.tick_once().await;
        assert!(pushed_texts(&fx.channel).is_empty());

        // 12:10 — fires.
        fx.clock.advance_secs(300);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 1);

        // 12:11 — not again.
        fx.clock.advance_secs(60);
        fx.scheduler.tick_once().await;
        assert_eq!(pushed_texts(&fx.channel).len(), 1);
    }

    #[tokio::test]
    async fn test_failing_source_skips_period_without_crashing() {
        let mut fx = fixture(RecordingChannel::default(), taipei(8, 0));
        fx.subscribers.subscribe("u1").await;
        fx.scheduler.register_job(BroadcastJob {
            name: "digest".into(),
            schedule: BroadcastSchedule::Daily(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            source: Arc::new(FailingSource),
        });

        fx.scheduler.tick_once().await;
        assert!(pushed_texts(&fx.channel).is_empty());

        // Next tick the same day: the failure consumed today's firing.
        fx.clock.advance_secs(60);
        fx.scheduler.tick_once().await;
        assert!(pushed_texts(&fx.channel).is_empty());
    }

    #[tokio::test]
    async fn test_spawned_scheduler_stops_cleanly() {
        let fx = fixture(RecordingChannel::default(), taipei(10, 0));
        let handle = fx.scheduler.spawn();
        handle.stop().await;
    }
}
