//! Test utilities for nsdash-dispatch applications
//!
//! - [`TestHarness`]: state plus an action channel to capture emitted actions
//! - Assertion macros for verifying emitted actions
//! - Time control helpers (with the `testing-time` feature)
//!
//! # Example
//!
//! ```ignore
//! use nsdash_dispatch::testing::TestHarness;
//!
//! let mut harness = TestHarness::<AppState, Action>::new(AppState::default());
//! harness.handle(&mut orchestrator, effect);
//! let actions = harness.drain_emitted();
//! assert_emitted!(actions, Action::StatsDidLoad { .. });
//! ```

use tokio::sync::mpsc;

use crate::runtime::{EffectContext, EffectHandler};
use crate::tasks::TaskManager;
use crate::{Action, ActionCategory};

/// Generic test harness for effect handlers and reducers.
///
/// Provides:
/// - State management with a simple `state` field
/// - An action channel capturing everything handlers and tasks emit
/// - A task manager wired to that channel
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type (must implement [`Action`])
pub struct TestHarness<S, A: Action> {
    /// The application state under test
    pub state: S,
    tx: mpsc::UnboundedSender<A>,
    rx: mpsc::UnboundedReceiver<A>,
    tasks: TaskManager<A>,
}

impl<S, A: Action> TestHarness<S, A> {
    /// Create a new test harness with the given initial state.
    pub fn new(state: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tasks = TaskManager::new(tx.clone());
        Self {
            state,
            tx,
            rx,
            tasks,
        }
    }

    /// Get a clone of the action sender for passing to handlers.
    pub fn sender(&self) -> mpsc::UnboundedSender<A> {
        self.tx.clone()
    }

    /// Emit an action (simulates what a handler would do).
    pub fn emit(&self, action: A) {
        let _ = self.tx.send(action);
    }

    /// Run an effect through a handler with this harness's channel and tasks.
    pub fn handle<E, H: EffectHandler<A, E>>(&mut self, handler: &mut H, effect: E) {
        let mut ctx = EffectContext::new(&self.tx, &mut self.tasks);
        handler.handle(effect, &mut ctx);
    }

    /// Access the harness task manager.
    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        &mut self.tasks
    }

    /// Drain all emitted actions from the channel.
    pub fn drain_emitted(&mut self) -> Vec<A> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Wait for the next emitted action.
    pub async fn next_emitted(&mut self) -> Option<A> {
        self.rx.recv().await
    }

    /// Check if any actions were emitted.
    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }
}

impl<S: Default, A: Action> Default for TestHarness<S, A> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S, A: ActionCategory> TestHarness<S, A> {
    /// Drain emitted actions belonging to one slice category.
    ///
    /// Actions of other categories stay queued.
    pub fn drain_category(&mut self, category: &str) -> Vec<A> {
        let (matching, rest): (Vec<A>, Vec<A>) = self
            .drain_emitted()
            .into_iter()
            .partition(|action| action.category() == Some(category));

        for action in rest {
            let _ = self.tx.send(action);
        }
        matching
    }
}

/// Assert that a specific action was emitted.
///
/// ```ignore
/// let actions = harness.drain_emitted();
/// assert_emitted!(actions, Action::StatsDidLoad { .. });
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that a specific action was NOT emitted.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Count how many actions match a pattern.
///
/// ```ignore
/// assert_eq!(count_emitted!(actions, Action::StatsDidError { .. }), 1);
/// ```
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}

/// Pause tokio time for deterministic timer tests.
#[cfg(feature = "testing-time")]
pub fn pause_time() {
    tokio::time::pause();
}

/// Resume real time after [`pause_time`].
#[cfg(feature = "testing-time")]
pub fn resume_time() {
    tokio::time::resume();
}

/// Advance paused time, letting due timers fire.
#[cfg(feature = "testing-time")]
pub async fn advance_time(duration: std::time::Duration) {
    tokio::time::advance(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        StatsFetch,
        StatsDidLoad(i32),
        AuthLogout,
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::StatsFetch => "StatsFetch",
                TestAction::StatsDidLoad(_) => "StatsDidLoad",
                TestAction::AuthLogout => "AuthLogout",
            }
        }
    }

    impl ActionCategory for TestAction {
        fn category(&self) -> Option<&'static str> {
            match self {
                TestAction::AuthLogout => Some("auth"),
                _ => Some("stats"),
            }
        }
    }

    #[test]
    fn test_harness_emit_and_drain() {
        let mut harness = TestHarness::<(), TestAction>::new(());

        harness.emit(TestAction::StatsFetch);
        harness.emit(TestAction::StatsDidLoad(42));

        let actions = harness.drain_emitted();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], TestAction::StatsFetch);
        assert_eq!(actions[1], TestAction::StatsDidLoad(42));

        assert!(harness.drain_emitted().is_empty());
    }

    #[test]
    fn test_assert_macros() {
        let actions = vec![TestAction::StatsFetch, TestAction::StatsDidLoad(1)];

        assert_emitted!(actions, TestAction::StatsFetch);
        assert_emitted!(actions, TestAction::StatsDidLoad(n) if *n == 1);
        assert_not_emitted!(actions, TestAction::AuthLogout);
        assert_eq!(count_emitted!(actions, TestAction::StatsDidLoad(_)), 1);
    }

    #[test]
    fn test_drain_category_keeps_others() {
        let mut harness = TestHarness::<(), TestAction>::default();
        harness.emit(TestAction::StatsFetch);
        harness.emit(TestAction::AuthLogout);
        harness.emit(TestAction::StatsDidLoad(3));

        assert_eq!(harness.drain_category("stats").len(), 2);
        assert_eq!(harness.drain_emitted(), vec![TestAction::AuthLogout]);
    }

    #[tokio::test]
    async fn test_handle_runs_effect_handler() {
        fn handler(effect: i32, ctx: &mut EffectContext<'_, TestAction>) {
            ctx.emit(TestAction::StatsDidLoad(effect));
        }

        let mut harness = TestHarness::<(), TestAction>::default();
        let mut handler = handler;
        harness.handle(&mut handler, 5);

        assert_eq!(harness.drain_emitted(), vec![TestAction::StatsDidLoad(5)]);
    }
}
