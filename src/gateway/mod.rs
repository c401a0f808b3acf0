//! Gateway — the main event loop connecting the webhook queue, the session
//! coordinator, and the notification scheduler.

mod keywords;
mod pipeline;
mod scheduler;
mod session;

pub use scheduler::{BroadcastJob, BroadcastSchedule, BroadcastSource, Scheduler};
pub use session::SessionCoordinator;

use crate::feed::NewsClient;
use iris_core::{clock::Clock, message::IncomingEvent, traits::Channel};
use iris_memory::{ReminderStore, SubscriberRegistry};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The central gateway that routes inbound events to replies.
pub struct Gateway {
    pub(super) channel: Arc<dyn Channel>,
    pub(super) coordinator: SessionCoordinator,
    pub(super) reminders: Arc<ReminderStore>,
    pub(super) subscribers: Arc<SubscriberRegistry>,
    pub(super) news: Arc<NewsClient>,
    pub(super) clock: Arc<dyn Clock>,
}

impl Gateway {
    pub fn new(
        channel: Arc<dyn Channel>,
        coordinator: SessionCoordinator,
        reminders: Arc<ReminderStore>,
        subscribers: Arc<SubscriberRegistry>,
        news: Arc<NewsClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            channel,
            coordinator,
            reminders,
            subscribers,
            news,
            clock,
        }
    }

    /// Run the main event loop until ctrl-c.
    ///
    /// Inbound events fan out to one task each; the scheduler (when given)
    /// ticks on its own task and is stopped on shutdown.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<IncomingEvent>,
        scheduler: Option<Scheduler>,
    ) -> anyhow::Result<()> {
        info!("iris gateway running | channel: {}", self.channel.name());

        let sched_handle = scheduler.map(Scheduler::spawn);

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_event(event).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        // Graceful shutdown.
        if let Some(handle) = sched_handle {
            handle.stop().await;
        }
        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel: {e}");
        }
        info!("Shutdown complete.");
        Ok(())
    }
}
