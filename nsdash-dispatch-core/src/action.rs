//! Action traits for type-safe state transitions

use std::fmt::Debug;

/// Marker trait for actions that can be dispatched to the store
///
/// Actions describe something that happened. They should be:
/// - Clone: Actions may be logged, replayed, or sent to multiple slice reducers
/// - Debug: For debugging and logging
/// - Send + 'static: Async tasks send them back across threads
///
/// Use `#[derive(Action)]` from `nsdash-dispatch-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}

/// Actions grouped by the state slice they target
///
/// `#[derive(Action)]` with `#[action(infer_categories)]` implements this from
/// the leading word of each variant name (`StatsFetch` -> `"stats"`).
pub trait ActionCategory: Action {
    /// Category of this action, or `None` for global actions
    fn category(&self) -> Option<&'static str>;
}

/// Concise, human-readable action text for logs
///
/// The default falls back to `Debug`. Override it for actions carrying
/// large payloads so logs show counts instead of full row lists.
pub trait ActionSummary: Action {
    /// One-line summary of the action
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}
