//! Core traits and types for nsdash-dispatch
//!
//! This crate provides the foundational abstractions for building dashboard
//! clients with centralized state management, following a Redux/Elm-inspired
//! architecture.
//!
//! # Core Concepts
//!
//! - **Action**: Events that describe state changes
//! - **Store**: Centralized state container with reducer pattern and subscribers
//! - **Effect**: Declarative side effects returned by reducers
//! - **Runtime**: Action loop connecting the store, effect handlers and tasks
//! - **Merge**: Shallow partial updates generated by `#[derive(Patch)]`
//!
//! # Basic Example
//!
//! ```ignore
//! use nsdash_dispatch_core::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum MyAction {
//!     Increment,
//!     Decrement,
//! }
//!
//! #[derive(Default)]
//! struct AppState {
//!     counter: i32,
//! }
//!
//! fn reducer(state: &mut AppState, action: MyAction) -> DispatchResult<()> {
//!     match action {
//!         MyAction::Increment => state.counter += 1,
//!         MyAction::Decrement => state.counter -= 1,
//!     }
//!     DispatchResult::changed()
//! }
//!
//! let mut store = Store::new(AppState::default(), reducer);
//! store.dispatch(MyAction::Increment);
//! ```
//!
//! # Async Operations
//!
//! Remote work uses a two-phase action pattern:
//!
//! 1. **Intent actions** start the work (e.g., `StatsFetch`)
//! 2. **Result actions** carry the outcome back (e.g., `StatsDidLoad`, `StatsDidError`)
//!
//! The reducer for an intent marks the slice as loading and returns an effect.
//! The [`EffectHandler`] starts a task through the [`TaskManager`]; when the
//! task completes its result action flows back through [`Runtime`].
//!
//! The `Did*` naming convention identifies result actions. With
//! `#[action(infer_categories)]`, `StatsFetch` and `StatsDidLoad` both get
//! category `"stats"`.

pub mod action;
pub mod effect;
pub mod logger;
pub mod merge;
pub mod runtime;
pub mod store;
pub mod tasks;
pub mod testing;

// Core trait exports
pub use action::{Action, ActionCategory, ActionSummary};
pub use merge::Merge;

// Store exports
pub use store::{
    DispatchStore, Middleware, NoopMiddleware, Reducer, Store, StoreWithMiddleware,
    SubscriptionId,
};

// Effect and runtime exports
pub use effect::DispatchResult;
pub use runtime::{EffectContext, EffectHandler, Runtime};
pub use tasks::{TaskKey, TaskManager};

// Logging exports
pub use logger::{
    ActionLog, ActionLogConfig, ActionLogEntry, ActionLoggerConfig, ActionLoggerMiddleware,
};

// Testing exports
pub use testing::TestHarness;

#[cfg(feature = "testing-time")]
pub use testing::{advance_time, pause_time, resume_time};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionCategory, ActionSummary};
    pub use crate::effect::DispatchResult;
    pub use crate::logger::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};
    pub use crate::merge::Merge;
    pub use crate::runtime::{EffectContext, EffectHandler, Runtime};
    pub use crate::store::{
        DispatchStore, Middleware, NoopMiddleware, Reducer, Store, StoreWithMiddleware,
        SubscriptionId,
    };
    pub use crate::tasks::{TaskKey, TaskManager};
}
