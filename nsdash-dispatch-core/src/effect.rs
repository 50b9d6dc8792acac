//! Dispatch results carrying declarative effects
//!
//! Reducers never perform I/O. When an action needs a remote call, a timer or
//! a storage write, the reducer describes that work as an effect value and
//! returns it alongside the change flag. The runtime hands effects to an
//! [`EffectHandler`](crate::runtime::EffectHandler) after the state transition.
//!
//! ```ignore
//! fn reducer(state: &mut AppState, action: AppAction) -> DispatchResult<Effect> {
//!     match action {
//!         AppAction::DataFetch => {
//!             state.loading = true;
//!             DispatchResult::changed_with(Effect::FetchData)
//!         }
//!         AppAction::DataDidLoad(data) => {
//!             state.loading = false;
//!             state.data = data;
//!             DispatchResult::changed()
//!         }
//!     }
//! }
//! ```

/// Result of dispatching an action.
///
/// Contains both the state change indicator and any effects to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult<E> {
    /// Whether the state was modified by this action.
    pub changed: bool,
    /// Effects to be processed after dispatch.
    pub effects: Vec<E>,
}

impl<E> Default for DispatchResult<E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl<E> DispatchResult<E> {
    /// Create a result indicating no state change and no effects.
    #[inline]
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            effects: vec![],
        }
    }

    /// Create a result indicating state changed but no effects.
    #[inline]
    pub fn changed() -> Self {
        Self {
            changed: true,
            effects: vec![],
        }
    }

    /// Build from a plain change flag.
    #[inline]
    pub fn from_changed(changed: bool) -> Self {
        Self {
            changed,
            effects: vec![],
        }
    }

    /// Create a result with a single effect but no state change.
    #[inline]
    pub fn effect(effect: E) -> Self {
        Self {
            changed: false,
            effects: vec![effect],
        }
    }

    /// Create a result indicating state changed with a single effect.
    #[inline]
    pub fn changed_with(effect: E) -> Self {
        Self {
            changed: true,
            effects: vec![effect],
        }
    }

    /// Add an effect to this result.
    #[inline]
    pub fn with(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    /// Combine with the result of another reducer.
    ///
    /// Used when composing slice reducers: the combined result changed if
    /// either side changed, and carries both effect lists in order.
    #[inline]
    pub fn merge(mut self, other: DispatchResult<E>) -> Self {
        self.changed |= other.changed;
        self.effects.extend(other.effects);
        self
    }

    /// Returns true if there are any effects to process.
    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }
}
