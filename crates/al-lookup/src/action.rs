use crate::{Clock, Key, RegistryConfig, RegistryError, SystemClock, UniqueKeyedRegistry};
use std::sync::Arc;

/// Shared callback stored in an `ActionLookupTable`
pub type Action<E> = Arc<dyn Fn(E) + Send + Sync>;

/// `UniqueKeyedRegistry` of callbacks, for matching responses to the action waiting on them.
///
/// Store the action with `put`, send the key along with the request, and hand the response
/// to `resolve` with the key that comes back.
pub struct ActionLookupTable<E, C: Clock = SystemClock> {
    registry: UniqueKeyedRegistry<Action<E>, C>,
}

impl<E> ActionLookupTable<E> {
    pub fn new() -> Self {
        Self {
            registry: UniqueKeyedRegistry::new(),
        }
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: UniqueKeyedRegistry::with_config(config),
        }
    }
}

impl<E> Default for ActionLookupTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C: Clock> ActionLookupTable<E, C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            registry: UniqueKeyedRegistry::with_clock(clock),
        }
    }

    pub fn put(&self, action: impl Fn(E) + Send + Sync + 'static) -> Key {
        self.registry.put(Arc::new(action))
    }

    pub fn get(&self, key: Key) -> Option<Action<E>> {
        self.registry.get(key)
    }

    pub fn pull(&self, key: Key) -> Option<Action<E>> {
        self.registry.pull(key)
    }

    /// Pulls the action under `key` and runs it with `arg`.
    /// The lock is released before the action runs, so actions may use the table themselves
    pub fn resolve(&self, key: Key, arg: E) -> Result<(), RegistryError> {
        let action = self
            .registry
            .pull(key)
            .ok_or(RegistryError::UnknownKey(key))?;
        action(arg);
        Ok(())
    }

    pub fn registry(&self) -> &UniqueKeyedRegistry<Action<E>, C> {
        &self.registry
    }
}

impl<E, C: Clock> std::fmt::Debug for ActionLookupTable<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ActionLookupTable")
            .field(&self.registry)
            .finish()
    }
}
