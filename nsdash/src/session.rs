//! Session lifecycle: persistence and the single expiry timer
//!
//! The auth reducer decides *when* a session begins or ends; this module
//! performs the side of it that touches storage and timers. Exactly one
//! expiry timer exists per session, registered under [`EXPIRY_TASK`]:
//! beginning a session replaces whatever timer was pending.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nsdash_dispatch::{TaskKey, TaskManager};

use crate::action::Action;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::state::Session;
use crate::storage::{ClientStorage, EXPIRATION_KEY, TOKEN_KEY};

/// Task key of the expiry timer
pub const EXPIRY_TASK: &str = "session_expiry";

#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    storage: Arc<dyn ClientStorage>,
    clock: Arc<dyn Clock>,
    duration: chrono::TimeDelta,
}

impl SessionLifecycle {
    pub fn new(
        storage: Arc<dyn ClientStorage>,
        clock: Arc<dyn Clock>,
        duration: chrono::TimeDelta,
    ) -> Self {
        Self {
            storage,
            clock,
            duration,
        }
    }

    pub fn storage(&self) -> &Arc<dyn ClientStorage> {
        &self.storage
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A session for a freshly issued token, valid for the configured
    /// duration from now.
    pub fn new_session(&self, token: impl Into<String>) -> Session {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Session::new(token, expires_at)
    }

    /// Persist `session` and arm its expiry timer for the remaining time.
    ///
    /// Any timer of a previous session is aborted first.
    pub fn begin(&self, session: &Session, tasks: &mut TaskManager<Action>) {
        let key = TaskKey::new(EXPIRY_TASK);
        tasks.cancel(&key);

        if let Err(err) = self.persist(session) {
            tracing::warn!(error = %err, "Failed to persist session");
        }

        let remaining = session.remaining(self.clock.now());
        tasks.schedule(
            key,
            remaining,
            Action::AuthDidExpire {
                expires_at: session.expires_at,
            },
        );
        tracing::info!(expires_at = %session.expires_at, ?remaining, "Session started");
    }

    /// Abort the expiry timer and forget the persisted session.
    pub fn end(&self, tasks: &mut TaskManager<Action>) {
        tasks.cancel(&TaskKey::new(EXPIRY_TASK));
        if let Err(err) = self.clear() {
            tracing::warn!(error = %err, "Failed to clear persisted session");
        }
        tracing::info!("Session ended");
    }

    /// The persisted session if it has not expired yet.
    ///
    /// An expired session is removed from storage on the way.
    pub fn resume(&self) -> Option<Session> {
        let session = match self.load() {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable persisted session");
                self.clear_quietly();
                return None;
            }
        };

        if session.is_expired_at(self.clock.now()) {
            tracing::info!(expires_at = %session.expires_at, "Persisted session expired");
            self.clear_quietly();
            return None;
        }
        Some(session)
    }

    /// The session authenticated calls should use, without side effects.
    pub fn current(&self) -> Option<Session> {
        self.load()
            .ok()
            .flatten()
            .filter(|session| !session.is_expired_at(self.clock.now()))
    }

    fn persist(&self, session: &Session) -> AppResult<()> {
        self.storage.set(TOKEN_KEY, &session.token)?;
        self.storage
            .set(EXPIRATION_KEY, &session.expires_at.to_rfc3339())
    }

    fn load(&self) -> AppResult<Option<Session>> {
        let token = self.storage.get(TOKEN_KEY);
        let expiration = self.storage.get(EXPIRATION_KEY);
        match (token, expiration) {
            (Some(token), Some(expiration)) => {
                let expires_at = DateTime::parse_from_rfc3339(&expiration)
                    .map_err(|e| AppError::Storage(format!("bad {EXPIRATION_KEY}: {e}")))?
                    .with_timezone(&Utc);
                Ok(Some(Session::new(token, expires_at)))
            }
            (None, None) => Ok(None),
            _ => Err(AppError::Storage(
                "token and expiration must be stored together".into(),
            )),
        }
    }

    fn clear(&self) -> AppResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(EXPIRATION_KEY)
    }

    fn clear_quietly(&self) {
        if let Err(err) = self.clear() {
            tracing::warn!(error = %err, "Failed to clear persisted session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;
    use chrono::TimeDelta;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn lifecycle() -> (SessionLifecycle, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::default();
        let lifecycle = SessionLifecycle::new(
            Arc::new(storage.clone()),
            Arc::new(clock.clone()),
            TimeDelta::seconds(3600),
        );
        (lifecycle, storage, clock)
    }

    #[test]
    fn test_new_session_uses_fixed_duration() {
        let (lifecycle, _, clock) = lifecycle();
        clock.advance(TimeDelta::seconds(10));

        let session = lifecycle.new_session("tok");
        assert_eq!(
            session.expires_at,
            DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(3610)
        );
    }

    #[tokio::test]
    async fn test_begin_persists_and_resume_round_trips() {
        let (lifecycle, storage, clock) = lifecycle();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);

        let session = lifecycle.new_session("tok");
        lifecycle.begin(&session, &mut tasks);

        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok"));
        assert!(tasks.is_running(&TaskKey::new(EXPIRY_TASK)));
        assert_eq!(lifecycle.resume(), Some(session.clone()));

        clock.advance(TimeDelta::seconds(3600));
        assert_eq!(lifecycle.current(), None);
        assert_eq!(lifecycle.resume(), None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_end_cancels_timer_and_clears() {
        let (lifecycle, storage, _) = lifecycle();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);

        lifecycle.begin(&lifecycle.new_session("tok"), &mut tasks);
        let timer = tasks
            .handle(&TaskKey::new(EXPIRY_TASK))
            .expect("timer registered");

        lifecycle.end(&mut tasks);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        assert!(timer.is_finished());
        assert!(tasks.is_empty());
        assert!(storage.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_for_remaining_time() {
        let (lifecycle, _, clock) = lifecycle();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);

        let session = lifecycle.new_session("tok");
        clock.advance(TimeDelta::seconds(3000));
        lifecycle.begin(&session, &mut tasks);

        tokio::time::advance(Duration::from_secs(599)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            rx.recv().await,
            Some(Action::AuthDidExpire {
                expires_at: session.expires_at
            })
        );
    }

    #[test]
    fn test_half_written_session_is_discarded() {
        let (lifecycle, storage, _) = lifecycle();
        storage.set(TOKEN_KEY, "orphan").unwrap();

        assert_eq!(lifecycle.resume(), None);
        assert!(storage.is_empty());
    }
}
