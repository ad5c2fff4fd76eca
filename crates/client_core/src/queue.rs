//! Live queue board synchronization.
//!
//! Two timers run while a [`QueuePoller`] is alive: the data refresh, which
//! fetches the queue list and stats together, and the display clock. A tick
//! replaces the snapshot only when both fetches succeed; otherwise the last
//! complete snapshot stays in place until the next tick.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use futures::future::join;
use shared::protocol::{QueueEntry, QueueStats};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    backend::ClinicBackend,
    config::ClientSettings,
    error::ClientError,
    presentation::{build_board, QueueBoard},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueEntry>,
    pub stats: QueueStats,
    pub refreshed_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone)]
pub enum QueueEvent {
    SnapshotUpdated(Arc<QueueSnapshot>),
    PollFailed { reason: String },
    ClockTick(DateTime<Local>),
}

/// Snapshot owner. Holds the last complete `(entries, stats)` pair and the
/// clock shown on the board.
pub struct QueueSync {
    backend: Arc<dyn ClinicBackend>,
    display_limit: usize,
    snapshot: RwLock<Arc<QueueSnapshot>>,
    clock: RwLock<DateTime<Local>>,
    events: broadcast::Sender<QueueEvent>,
}

impl QueueSync {
    pub fn new(backend: Arc<dyn ClinicBackend>, display_limit: usize) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            backend,
            display_limit,
            snapshot: RwLock::new(Arc::new(QueueSnapshot::default())),
            clock: RwLock::new(Local::now()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Arc<QueueSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    pub async fn board(&self) -> QueueBoard {
        let snapshot = self.snapshot().await;
        let now = *self.clock.read().await;
        build_board(&snapshot, now, self.display_limit)
    }

    /// One data tick: both fetches concurrently, applied only together.
    pub async fn poll_once(&self) -> Result<Arc<QueueSnapshot>, ClientError> {
        let (queue, stats) = join(self.backend.current_queue(), self.backend.queue_stats()).await;

        let (entries, stats) = match (queue, stats) {
            (Ok(entries), Ok(stats)) => (entries, stats),
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "queue: poll failed; keeping previous snapshot");
                let _ = self.events.send(QueueEvent::PollFailed {
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let snapshot = Arc::new(QueueSnapshot {
            entries,
            stats,
            refreshed_at: Some(Local::now()),
        });
        *self.snapshot.write().await = Arc::clone(&snapshot);
        debug!(entries = snapshot.entries.len(), "queue: snapshot replaced");
        let _ = self
            .events
            .send(QueueEvent::SnapshotUpdated(Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    pub async fn tick_clock(&self) -> DateTime<Local> {
        let now = Local::now();
        *self.clock.write().await = now;
        let _ = self.events.send(QueueEvent::ClockTick(now));
        now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub refresh_interval: Duration,
    pub clock_interval: Duration,
}

impl From<&ClientSettings> for PollSettings {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            refresh_interval: settings.queue_refresh_interval,
            clock_interval: settings.clock_interval,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

/// Owns the two timer tasks. Both are aborted on [`QueuePoller::shutdown`]
/// and on drop.
pub struct QueuePoller {
    sync: Arc<QueueSync>,
    refresh_task: Option<JoinHandle<()>>,
    clock_task: Option<JoinHandle<()>>,
}

impl QueuePoller {
    /// Starts both timers. The first data tick fires immediately.
    pub fn start(sync: Arc<QueueSync>, settings: PollSettings) -> Self {
        info!(
            refresh_ms = settings.refresh_interval.as_millis() as u64,
            clock_ms = settings.clock_interval.as_millis() as u64,
            "queue: poller started"
        );

        let refresh_sync = Arc::clone(&sync);
        let refresh_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = refresh_sync.poll_once().await;
            }
        });

        let clock_sync = Arc::clone(&sync);
        let clock_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.clock_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                clock_sync.tick_clock().await;
            }
        });

        Self {
            sync,
            refresh_task: Some(refresh_task),
            clock_task: Some(clock_task),
        }
    }

    pub fn sync(&self) -> &Arc<QueueSync> {
        &self.sync
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task.is_some() || self.clock_task.is_some()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let mut stopped = false;
        if let Some(task) = self.refresh_task.take() {
            task.abort();
            stopped = true;
        }
        if let Some(task) = self.clock_task.take() {
            task.abort();
            stopped = true;
        }
        if stopped {
            info!("queue: poller stopped");
        }
    }
}

impl Drop for QueuePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "tests/queue_tests.rs"]
mod tests;
