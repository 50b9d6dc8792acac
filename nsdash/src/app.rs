//! The dashboard: one store, one runtime, one orchestrator
//!
//! Built once at startup and handed to whatever drives it (the CLI, a view
//! layer, a test). Tests build a fresh one each.

use std::sync::Arc;

use nsdash_dispatch::{
    ActionLog, ActionLogConfig, ActionLoggerMiddleware, Runtime, StoreWithMiddleware,
    SubscriptionId, TaskManager,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::api::Transport;
use crate::clock::Clock;
use crate::config::Settings;
use crate::effect::Effect;
use crate::orchestrator::Orchestrator;
use crate::reducer::reducer;
use crate::session::SessionLifecycle;
use crate::state::AppState;
use crate::storage::ClientStorage;

pub type DashboardStore = StoreWithMiddleware<AppState, Action, Effect, ActionLoggerMiddleware>;

pub struct Dashboard {
    runtime: Runtime<AppState, Action, Effect, DashboardStore>,
    orchestrator: Orchestrator,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("runtime", &self.runtime)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl Dashboard {
    pub fn new(
        settings: &Settings,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn ClientStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_logger(
            settings,
            transport,
            storage,
            clock,
            ActionLoggerMiddleware::with_log(ActionLogConfig::default()),
        )
    }

    pub fn with_logger(
        settings: &Settings,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn ClientStorage>,
        clock: Arc<dyn Clock>,
        logger: ActionLoggerMiddleware,
    ) -> Self {
        let session = SessionLifecycle::new(storage, clock, settings.session_duration());
        let orchestrator = Orchestrator::new(transport, session, settings.site_base_url.as_str());
        let store = StoreWithMiddleware::new(AppState::default(), reducer, logger);

        Self {
            runtime: Runtime::from_store(store),
            orchestrator,
        }
    }

    /// Reduce `action` now; effects start immediately.
    ///
    /// Returns whether the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        self.runtime.dispatch(action, &mut self.orchestrator)
    }

    pub fn state(&self) -> &AppState {
        self.runtime.state()
    }

    /// Call `listener` after every state change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + Send + 'static,
    {
        self.runtime.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.runtime.unsubscribe(id)
    }

    /// Restore a persisted session. Run once at startup.
    pub fn resume_session(&mut self) {
        self.dispatch(Action::AuthResume);
        self.drain();
    }

    /// Wait for one queued action (task result or timer) and dispatch it.
    pub async fn step(&mut self) -> Option<bool> {
        self.runtime.step(&mut self.orchestrator).await
    }

    /// Dispatch everything already queued.
    pub fn drain(&mut self) -> usize {
        self.runtime.drain(&mut self.orchestrator)
    }

    /// Process actions until `done` holds for the state.
    ///
    /// Returns `false` if the runtime shut down first.
    pub async fn run_until<F>(&mut self, mut done: F) -> bool
    where
        F: FnMut(&AppState) -> bool,
    {
        loop {
            self.drain();
            if done(self.state()) {
                return true;
            }
            if self.step().await.is_none() {
                return false;
            }
        }
    }

    /// Process actions until no slice is loading, then flush follow-ups.
    pub async fn settle(&mut self) -> bool {
        self.run_until(|state| !state.is_loading()).await
    }

    /// Recent actions, oldest first
    pub fn action_log(&self) -> Option<&ActionLog> {
        self.runtime.store().middleware().log()
    }

    pub fn tasks(&mut self) -> &mut TaskManager<Action> {
        self.runtime.tasks()
    }

    pub fn action_tx(&self) -> mpsc::UnboundedSender<Action> {
        self.runtime.action_tx()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.runtime.shutdown_token()
    }
}
