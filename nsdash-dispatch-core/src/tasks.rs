//! Background work started by effect handlers
//!
//! Two kinds of work exist. Remote calls are detached: they always run to
//! completion and may report back with several actions. Timers are keyed:
//! arming a timer under a key that is already armed aborts the old one, so a
//! key never has more than one pending deadline.
//!
//! ```ignore
//! use nsdash_dispatch::{TaskKey, TaskManager};
//! use std::time::Duration;
//!
//! let (action_tx, mut action_rx) = tokio::sync::mpsc::unbounded_channel();
//! let mut tasks = TaskManager::new(action_tx);
//!
//! tasks.detach_with(|tx| async move {
//!     let _ = tx.send(Action::DidFetch(fetch().await));
//! });
//!
//! tasks.schedule("session_expiry", Duration::from_secs(3600), Action::Expire);
//! tasks.cancel(&TaskKey::new("session_expiry"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::Action;

/// Name under which a timer is registered
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

/// Owns the keyed timers and the sender every task reports through.
///
/// Dropping the manager aborts the timers; detached tasks keep running.
pub struct TaskManager<A> {
    timers: HashMap<TaskKey, AbortHandle>,
    action_tx: mpsc::UnboundedSender<A>,
}

impl<A> std::fmt::Debug for TaskManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("timers", &self.timers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A> TaskManager<A>
where
    A: Action,
{
    pub fn new(action_tx: mpsc::UnboundedSender<A>) -> Self {
        Self {
            timers: HashMap::new(),
            action_tx,
        }
    }

    /// Send `action` once `delay` has elapsed.
    ///
    /// Aborts whatever timer was armed under `key` before.
    pub fn schedule(&mut self, key: impl Into<TaskKey>, delay: Duration, action: A) -> &mut Self {
        let key = key.into();
        self.cancel(&key);

        let deadline = tokio::time::Instant::now() + delay;
        let tx = self.action_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(action);
        });

        tracing::trace!(task = key.name(), ?delay, "Armed timer");
        self.timers.insert(key, handle.abort_handle());
        self
    }

    /// Run `task` to completion without registering it.
    ///
    /// The task gets its own sender and may report any number of actions.
    pub fn detach_with<F, Fut>(&self, task: F)
    where
        F: FnOnce(mpsc::UnboundedSender<A>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(task(self.action_tx.clone()));
    }

    /// Disarm the timer under `key`. No-op when nothing is armed.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.timers.remove(key) {
            handle.abort();
            tracing::trace!(task = key.name(), "Disarmed timer");
        }
    }

    /// Whether the timer under `key` has yet to fire.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.timers
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn handle(&self, key: &TaskKey) -> Option<AbortHandle> {
        self.timers.get(key).cloned()
    }

    /// True when no timer is pending
    pub fn is_empty(&self) -> bool {
        self.timers.values().all(|handle| handle.is_finished())
    }

    pub fn running_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.timers.keys()
    }
}

impl<A> TaskManager<A> {
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

impl<A> Drop for TaskManager<A> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
