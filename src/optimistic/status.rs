//! Sync Status
//!
//! Aggregate indicator over in-flight mutations: syncing while any request is
//! out, synced for a while after the last one settles, then idle. A burst in
//! which any request failed ends in `Error` until the next request starts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStatus {
    pub state: SyncState,
    /// Requests currently in flight
    pub pending: usize,
}

#[derive(Default)]
struct Counter {
    pending: usize,
    failed: bool,
    /// Identifies the idle timer allowed to fire
    ticket: u64,
    idle_timer: Option<JoinHandle<()>>,
}

struct Shared {
    sender: watch::Sender<SyncStatus>,
    counter: Mutex<Counter>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Counter> {
        self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: SyncState, pending: usize) {
        self.sender.send_replace(SyncStatus { state, pending });
    }

    fn go_idle(&self, ticket: u64) {
        let mut counter = self.lock();
        if counter.ticket == ticket && counter.pending == 0 {
            counter.idle_timer = None;
            self.publish(SyncState::Idle, 0);
        }
    }
}

pub struct SyncStatusTracker {
    shared: Arc<Shared>,
    synced_duration: Duration,
}

impl SyncStatusTracker {
    pub fn new(synced_duration: Duration) -> Self {
        let (sender, _) = watch::channel(SyncStatus::default());
        Self {
            shared: Arc::new(Shared {
                sender,
                counter: Mutex::new(Counter::default()),
            }),
            synced_duration,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.sender.subscribe()
    }

    pub fn current(&self) -> SyncStatus {
        *self.shared.sender.borrow()
    }

    /// Count a request as in flight until the returned guard is dropped.
    /// Dropping without [`InFlight::succeed`] records a failure.
    pub fn track(&self) -> InFlight<'_> {
        self.start();
        InFlight {
            tracker: self,
            succeeded: false,
        }
    }

    fn start(&self) {
        let mut counter = self.shared.lock();
        if counter.pending == 0 {
            counter.failed = false;
        }
        counter.pending += 1;
        counter.ticket += 1;
        if let Some(timer) = counter.idle_timer.take() {
            timer.abort();
        }
        self.shared.publish(SyncState::Syncing, counter.pending);
    }

    fn finish(&self, succeeded: bool) {
        let mut counter = self.shared.lock();
        counter.pending = counter.pending.saturating_sub(1);
        counter.failed |= !succeeded;

        if counter.pending > 0 {
            self.shared.publish(SyncState::Syncing, counter.pending);
            return;
        }
        if counter.failed {
            self.shared.publish(SyncState::Error, 0);
            return;
        }

        self.shared.publish(SyncState::Synced, 0);
        counter.ticket += 1;
        let ticket = counter.ticket;
        match Handle::try_current() {
            Ok(handle) => {
                let weak: Weak<Shared> = Arc::downgrade(&self.shared);
                let delay = self.synced_duration;
                counter.idle_timer = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(shared) = weak.upgrade() {
                        shared.go_idle(ticket);
                    }
                }));
            }
            Err(_) => {
                debug!("[Sync] no runtime for the synced timer, going idle");
                self.shared.publish(SyncState::Idle, 0);
            }
        }
    }
}

impl Drop for SyncStatusTracker {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.lock().idle_timer.take() {
            timer.abort();
        }
    }
}

/// One request in flight
#[must_use = "dropping the guard ends the request"]
pub struct InFlight<'a> {
    tracker: &'a SyncStatusTracker,
    succeeded: bool,
}

impl InFlight<'_> {
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tracker.finish(self.succeeded);
    }
}
