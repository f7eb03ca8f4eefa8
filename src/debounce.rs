//! Debounce Coalescer
//!
//! Collapses bursts of same-key calls into one trailing call carrying the
//! latest arguments. Different keys are debounced independently.
//!
//! A merge hook can fold the replaced arguments into their successor, and a
//! discard hook sees every call dropped without firing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::{SyncConfig, TeardownPolicy, DEFAULT_DEBOUNCE_MS};

type MutateFn<A> = Box<dyn Fn(A) + Send + Sync>;
type KeyFn<A> = Box<dyn Fn(&A) -> String + Send + Sync>;
type MergeFn<A> = Box<dyn Fn(A, A) -> A + Send + Sync>;
type DiscardFn<A> = Box<dyn Fn(A) + Send + Sync>;

struct PendingCall<A> {
    args: A,
    /// Identifies the timer allowed to fire this entry
    ticket: u64,
    timer: JoinHandle<()>,
}

struct Registry<A> {
    calls: IndexMap<String, PendingCall<A>>,
    next_ticket: u64,
}

struct Inner<A> {
    mutate: MutateFn<A>,
    key: KeyFn<A>,
    registry: Mutex<Registry<A>>,
}

impl<A> Inner<A> {
    fn lock(&self) -> MutexGuard<'_, Registry<A>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer expiry. A timer that lost a race with a reschedule finds a
    /// different ticket and does nothing.
    fn fire(&self, key: &str, ticket: u64) {
        let args = {
            let mut registry = self.lock();
            let current = registry.calls.get(key).is_some_and(|call| call.ticket == ticket);
            if !current {
                return;
            }
            registry.calls.shift_remove(key).map(|call| call.args)
        };
        if let Some(args) = args {
            (self.mutate)(args);
        }
    }
}

/// Per-key trailing-edge debouncer.
///
/// Timers run as Tokio tasks, so [`schedule`](Self::schedule) must be called
/// from within a runtime. Dropping the coalescer applies its
/// [`TeardownPolicy`].
pub struct DebounceCoalescer<A: Send + 'static> {
    inner: Arc<Inner<A>>,
    delay: Duration,
    teardown: TeardownPolicy,
    /// `(replaced, latest) -> pending`; without it the latest args win outright
    merge: Option<MergeFn<A>>,
    discard: Option<DiscardFn<A>>,
}

impl<A: Send + 'static> DebounceCoalescer<A> {
    pub fn new<M, K>(mutate: M, key: K) -> Self
    where
        M: Fn(A) + Send + Sync + 'static,
        K: Fn(&A) -> String + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                mutate: Box::new(mutate),
                key: Box::new(key),
                registry: Mutex::new(Registry {
                    calls: IndexMap::new(),
                    next_ticket: 0,
                }),
            }),
            delay: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            teardown: TeardownPolicy::default(),
            merge: None,
            discard: None,
        }
    }

    pub fn from_config<M, K>(mutate: M, key: K, config: &SyncConfig) -> Self
    where
        M: Fn(A) + Send + Sync + 'static,
        K: Fn(&A) -> String + Send + Sync + 'static,
    {
        Self::new(mutate, key)
            .with_delay(config.debounce_delay())
            .with_teardown(config.teardown)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_teardown(mut self, teardown: TeardownPolicy) -> Self {
        self.teardown = teardown;
        self
    }

    /// Combine a replaced call with its successor instead of dropping it
    pub fn with_merge<F>(mut self, merge: F) -> Self
    where
        F: Fn(A, A) -> A + Send + Sync + 'static,
    {
        self.merge = Some(Box::new(merge));
        self
    }

    /// Called for each pending call dropped by `cancel_all` or a discarding teardown
    pub fn with_discard<F>(mut self, discard: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        self.discard = Some(Box::new(discard));
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule a call, replacing any pending call with the same key and
    /// restarting its timer.
    pub fn schedule(&self, args: A) {
        let key = (self.inner.key)(&args);
        let mut registry = self.inner.lock();

        registry.next_ticket += 1;
        let ticket = registry.next_ticket;

        let weak: Weak<Inner<A>> = Arc::downgrade(&self.inner);
        let delay = self.delay;
        let timer_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(&timer_key, ticket);
            }
        });

        // Replacing keeps the key's first slot in the flush order
        match registry.calls.shift_remove_full(&key) {
            Some((index, key, previous)) => {
                previous.timer.abort();
                let args = match &self.merge {
                    Some(merge) => merge(previous.args, args),
                    None => args,
                };
                registry.calls.shift_insert(index, key, PendingCall { args, ticket, timer });
            }
            None => {
                registry.calls.insert(key, PendingCall { args, ticket, timer });
            }
        }
    }

    /// Fire every pending call now, in registry order. Returns how many fired.
    pub fn flush(&self) -> usize {
        let drained = self.drain();
        let fired = drained.len();
        for args in drained {
            (self.inner.mutate)(args);
        }
        fired
    }

    /// Drop every pending call without firing. Returns how many were dropped.
    pub fn cancel_all(&self) -> usize {
        let drained = self.drain();
        let dropped = drained.len();
        if let Some(discard) = &self.discard {
            for args in drained {
                discard(args);
            }
        }
        dropped
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().calls.len()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.inner.lock().calls.contains_key(key)
    }

    fn drain(&self) -> Vec<A> {
        let mut registry = self.inner.lock();
        let drained: Vec<A> = registry
            .calls
            .drain(..)
            .map(|(_, call)| {
                call.timer.abort();
                call.args
            })
            .collect();
        drained
    }
}

impl<A: Send + 'static> Drop for DebounceCoalescer<A> {
    fn drop(&mut self) {
        match self.teardown {
            TeardownPolicy::Flush => {
                self.flush();
            }
            TeardownPolicy::Discard => {
                let dropped = self.cancel_all();
                if dropped > 0 {
                    debug!("[Debounce] discarded {} pending call(s) on teardown", dropped);
                }
            }
        }
    }
}
