//! Delayed resolution timers.
//!
//! Every in-flight outbound fax has at most one pending resolution timer.
//! Arming a fax replaces any previous timer, cancelling removes it before
//! it fires. Entries carry a generation so a stale timer that lost the
//! race against a re-arm can never evict its replacement.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

struct TimerEntry {
    generation: u64,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    timers: Mutex<HashMap<String, TimerEntry>>,
    generation: AtomicU64,
}

impl SchedulerInner {
    fn lock_timers(&self) -> MutexGuard<'_, HashMap<String, TimerEntry>> {
        match self.timers.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Timer registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Removes the entry for `fax_id` if it still belongs to `generation`.
    fn retire(&self, fax_id: &str, generation: u64) {
        let mut timers = self.lock_timers();
        if timers.get(fax_id).map(|e| e.generation) == Some(generation) {
            timers.remove(fax_id);
        }
    }
}

/// Registry of pending resolution timers, keyed by fax ID.
#[derive(Clone)]
pub struct ResolutionScheduler {
    inner: Arc<SchedulerInner>,
}

impl ResolutionScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                timers: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Arms a timer that runs `task` after `delay`. A previously armed
    /// timer for the same fax is aborted and replaced.
    ///
    /// The entry is retired right when the timer fires, before `task`
    /// starts, so a running resolution is no longer cancellable.
    pub fn arm<F>(&self, fax_id: &str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut timers = self.inner.lock_timers();
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::clone(&self.inner);
        let id = fax_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.retire(&id, generation);
            task.await;
        });

        if let Some(previous) = timers.insert(fax_id.to_string(), TimerEntry { generation, handle })
        {
            log::debug!("Replacing pending timer for fax {}", fax_id);
            previous.handle.abort();
        }
    }

    /// Cancels the pending timer for a fax. Returns `true` if one was
    /// armed. Has no effect on a resolution that already started.
    pub fn cancel(&self, fax_id: &str) -> bool {
        let mut timers = self.inner.lock_timers();
        match timers.remove(fax_id) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&self) {
        let mut timers = self.inner.lock_timers();
        for (_, entry) in timers.drain() {
            entry.handle.abort();
        }
    }

    pub fn is_armed(&self, fax_id: &str) -> bool {
        self.inner.lock_timers().contains_key(fax_id)
    }

    pub fn armed_count(&self) -> usize {
        self.inner.lock_timers().len()
    }
}

impl Default for ResolutionScheduler {
    fn default() -> Self {
        Self::new()
    }
}
