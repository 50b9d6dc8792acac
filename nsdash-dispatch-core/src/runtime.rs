//! Action loop wiring store, effects and tasks together.
//!
//! The runtime owns the store, an action channel and a [`TaskManager`].
//! Actions arrive either directly ([`Runtime::dispatch`]) or through the
//! channel (async task completions, timers, [`Runtime::enqueue`]). Each one
//! is reduced synchronously; the effects it produced are then handed to an
//! [`EffectHandler`], which typically starts tasks that send more actions.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effect::DispatchResult;
use crate::store::{DispatchStore, Reducer, Store, SubscriptionId};
use crate::tasks::TaskManager;
use crate::Action;

/// Context passed to effect handlers.
pub struct EffectContext<'a, A: Action> {
    action_tx: &'a mpsc::UnboundedSender<A>,
    tasks: &'a mut TaskManager<A>,
}

impl<'a, A: Action> EffectContext<'a, A> {
    pub(crate) fn new(
        action_tx: &'a mpsc::UnboundedSender<A>,
        tasks: &'a mut TaskManager<A>,
    ) -> Self {
        Self { action_tx, tasks }
    }

    /// Queue an action for dispatch after the current one.
    pub fn emit(&self, action: A) {
        let _ = self.action_tx.send(action);
    }

    /// Access the action sender.
    pub fn action_tx(&self) -> &mpsc::UnboundedSender<A> {
        self.action_tx
    }

    /// Access the task manager.
    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        self.tasks
    }
}

/// Turns declarative effects into work.
///
/// Implemented for any `FnMut(E, &mut EffectContext<A>)`, so closures work
/// for small apps and tests.
pub trait EffectHandler<A: Action, E> {
    /// Perform (or start) the work an effect describes.
    fn handle(&mut self, effect: E, ctx: &mut EffectContext<'_, A>);
}

impl<A, E, F> EffectHandler<A, E> for F
where
    A: Action,
    F: FnMut(E, &mut EffectContext<'_, A>),
{
    fn handle(&mut self, effect: E, ctx: &mut EffectContext<'_, A>) {
        self(effect, ctx)
    }
}

/// Runtime helper for effect-based stores.
pub struct Runtime<S, A: Action, E, St: DispatchStore<S, A, E> = Store<S, A, E>> {
    store: St,
    action_tx: mpsc::UnboundedSender<A>,
    action_rx: mpsc::UnboundedReceiver<A>,
    tasks: TaskManager<A>,
    shutdown: CancellationToken,
    _state: std::marker::PhantomData<(S, E)>,
}

impl<S, A: Action, E, St: DispatchStore<S, A, E>> std::fmt::Debug for Runtime<S, A, E, St> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("tasks", &self.tasks)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<S, A: Action, E> Runtime<S, A, E, Store<S, A, E>> {
    /// Create a runtime from state + reducer.
    pub fn new(state: S, reducer: Reducer<S, A, E>) -> Self {
        Self::from_store(Store::new(state, reducer))
    }
}

impl<S, A: Action, E, St: DispatchStore<S, A, E>> Runtime<S, A, E, St> {
    /// Create a runtime from an existing store.
    pub fn from_store(store: St) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let tasks = TaskManager::new(action_tx.clone());
        Self {
            store,
            action_tx,
            action_rx,
            tasks,
            shutdown: CancellationToken::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Send an action into the runtime queue.
    pub fn enqueue(&self, action: A) {
        let _ = self.action_tx.send(action);
    }

    /// Clone the action sender.
    pub fn action_tx(&self) -> mpsc::UnboundedSender<A> {
        self.action_tx.clone()
    }

    /// Access the current state.
    pub fn state(&self) -> &S {
        self.store.state()
    }

    /// Access the store (middleware, history).
    pub fn store(&self) -> &St {
        &self.store
    }

    /// Register a state listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&S) + Send + 'static,
    {
        self.store.inner_mut().subscribe(listener)
    }

    /// Remove a state listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.inner_mut().unsubscribe(id)
    }

    /// Access the task manager.
    pub fn tasks(&mut self) -> &mut TaskManager<A> {
        &mut self.tasks
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Reduce one action now and hand its effects to `handler`.
    pub fn dispatch<H>(&mut self, action: A, handler: &mut H) -> bool
    where
        H: EffectHandler<A, E>,
    {
        let DispatchResult { changed, effects } = self.store.dispatch(action);
        let mut ctx = EffectContext::new(&self.action_tx, &mut self.tasks);
        for effect in effects {
            handler.handle(effect, &mut ctx);
        }
        changed
    }

    /// Wait for the next queued action and dispatch it.
    ///
    /// Returns `None` once the shutdown token is cancelled.
    pub async fn step<H>(&mut self, handler: &mut H) -> Option<bool>
    where
        H: EffectHandler<A, E>,
    {
        let action = tokio::select! {
            _ = self.shutdown.cancelled() => return None,
            action = self.action_rx.recv() => action?,
        };
        Some(self.dispatch(action, handler))
    }

    /// Dispatch every action already queued, without waiting.
    ///
    /// Returns how many actions were processed.
    pub fn drain<H>(&mut self, handler: &mut H) -> usize
    where
        H: EffectHandler<A, E>,
    {
        let mut processed = 0;
        while let Ok(action) = self.action_rx.try_recv() {
            self.dispatch(action, handler);
            processed += 1;
        }
        processed
    }

    /// Process actions until `should_quit` matches one or shutdown is requested.
    ///
    /// The quitting action itself is still dispatched.
    pub async fn run<H, FQuit>(&mut self, handler: &mut H, mut should_quit: FQuit)
    where
        H: EffectHandler<A, E>,
        FQuit: FnMut(&A) -> bool,
    {
        loop {
            let action = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                action = self.action_rx.recv() => match action {
                    Some(action) => action,
                    None => break,
                },
            };
            let quit = should_quit(&action);
            self.dispatch(action, handler);
            if quit {
                break;
            }
        }
        self.tasks.cancel_all();
    }
}
