//! Centralized state store with reducer pattern

use std::marker::PhantomData;

use crate::effect::DispatchResult;
use crate::Action;

/// A reducer function that handles actions and updates state
///
/// Returns whether the state changed plus any effects to run afterwards.
/// Reducers must stay free of side effects: no I/O, no clocks, no timers.
pub type Reducer<S, A, E> = fn(&mut S, A) -> DispatchResult<E>;

/// Handle returned by [`Store::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<S> = Box<dyn FnMut(&S) + Send>;

/// Centralized state store with Redux-like reducer pattern
///
/// The store holds the application state and provides a single point
/// for state transitions through the `dispatch` method. Subscribers are
/// notified synchronously after every dispatch that changed the state.
///
/// # Type Parameters
/// * `S` - The application state type
/// * `A` - The action type (must implement `Action`)
/// * `E` - The effect type reducers may emit
///
/// # Example
/// ```ignore
/// let mut store = Store::new(AppState::default(), reducer);
/// let id = store.subscribe(|state| println!("loading: {}", state.loading));
/// store.dispatch(AppAction::DataFetch);
/// store.unsubscribe(id);
/// ```
pub struct Store<S, A: Action, E> {
    state: S,
    reducer: Reducer<S, A, E>,
    listeners: Vec<(SubscriptionId, Listener<S>)>,
    next_listener: u64,
    _marker: PhantomData<A>,
}

impl<S, A: Action, E> std::fmt::Debug for Store<S, A, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<S, A: Action, E> Store<S, A, E> {
    /// Create a new store with initial state and reducer
    pub fn new(state: S, reducer: Reducer<S, A, E>) -> Self {
        Self {
            state,
            reducer,
            listeners: Vec::new(),
            next_listener: 0,
            _marker: PhantomData,
        }
    }

    /// Dispatch an action to the store
    ///
    /// The reducer runs with the current state and action; if it reports
    /// a change, every subscriber sees the new state before this returns.
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        let result = (self.reducer)(&mut self.state, action);
        if result.changed {
            for (_, listener) in &mut self.listeners {
                listener(&self.state);
            }
        }
        result
    }

    /// Get a reference to the current state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Register a listener called after each state change
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&S) + Send + 'static,
    {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of active listeners
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Store with middleware support
///
/// Wraps a `Store` and allows middleware to intercept actions
/// before and after they are processed by the reducer.
pub struct StoreWithMiddleware<S, A: Action, E, M: Middleware<A>> {
    store: Store<S, A, E>,
    middleware: M,
}

impl<S, A: Action, E, M: Middleware<A>> StoreWithMiddleware<S, A, E, M> {
    /// Create a new store with middleware
    pub fn new(state: S, reducer: Reducer<S, A, E>, middleware: M) -> Self {
        Self {
            store: Store::new(state, reducer),
            middleware,
        }
    }

    /// Dispatch an action through middleware and store
    pub fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        self.middleware.before(&action);
        let result = self.store.dispatch(action.clone());
        self.middleware.after(&action, result.changed);
        result
    }

    /// Get a reference to the current state
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// Access the wrapped store (for subscriptions)
    pub fn store_mut(&mut self) -> &mut Store<S, A, E> {
        &mut self.store
    }

    /// Get a reference to the middleware
    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// Get a mutable reference to the middleware
    pub fn middleware_mut(&mut self) -> &mut M {
        &mut self.middleware
    }
}

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging or other cross-cutting concerns
/// to your store.
pub trait Middleware<A: Action> {
    /// Called before the action is dispatched to the reducer
    fn before(&mut self, action: &A);

    /// Called after the action is processed by the reducer
    fn after(&mut self, action: &A, state_changed: bool);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Store interface used by [`Runtime`](crate::runtime::Runtime).
pub trait DispatchStore<S, A: Action, E> {
    /// Dispatch an action and return state changes plus effects.
    fn dispatch(&mut self, action: A) -> DispatchResult<E>;
    /// Get the current state.
    fn state(&self) -> &S;
    /// Get the underlying store for subscriptions.
    fn inner_mut(&mut self) -> &mut Store<S, A, E>;
}

impl<S, A: Action, E> DispatchStore<S, A, E> for Store<S, A, E> {
    fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        Store::dispatch(self, action)
    }

    fn state(&self) -> &S {
        Store::state(self)
    }

    fn inner_mut(&mut self) -> &mut Store<S, A, E> {
        self
    }
}

impl<S, A: Action, E, M: Middleware<A>> DispatchStore<S, A, E> for StoreWithMiddleware<S, A, E, M> {
    fn dispatch(&mut self, action: A) -> DispatchResult<E> {
        StoreWithMiddleware::dispatch(self, action)
    }

    fn state(&self) -> &S {
        StoreWithMiddleware::state(self)
    }

    fn inner_mut(&mut self) -> &mut Store<S, A, E> {
        self.store_mut()
    }
}
