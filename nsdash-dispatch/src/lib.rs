//! nsdash-dispatch: Centralized state management for the nsdash dashboard core
//!
//! Like Redux/Elm, but for a headless client. All state mutations happen
//! through dispatched actions; reducers stay pure and describe side effects
//! declaratively so an effect handler can run them.
//!
//! # Example
//! ```ignore
//! use nsdash_dispatch::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! #[action(infer_categories)]
//! enum MyAction {
//!     StatsFetch,
//!     StatsDidLoad(Vec<String>),
//! }
//!
//! assert_eq!(MyAction::StatsFetch.category(), Some("stats"));
//! ```

// Re-export everything from core
pub use nsdash_dispatch_core::*;

// Re-export derive macros
pub use nsdash_dispatch_macros::{Action, Patch};

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use nsdash_dispatch_core::{Action, ActionCategory, ActionSummary, Merge};

    // Store, effects and runtime
    pub use nsdash_dispatch_core::{
        DispatchResult, DispatchStore, EffectContext, EffectHandler, Middleware, NoopMiddleware,
        Reducer, Runtime, Store, StoreWithMiddleware, SubscriptionId, TaskKey, TaskManager,
    };

    // Logging
    pub use nsdash_dispatch_core::{ActionLogConfig, ActionLoggerConfig, ActionLoggerMiddleware};

    // Derive macros
    pub use nsdash_dispatch_macros::{Action, Patch};
}
