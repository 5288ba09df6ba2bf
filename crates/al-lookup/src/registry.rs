use crate::{Clock, Key, KeyGenerator, RegistryError, SystemClock};
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Map guarded by a `UniqueKeyedRegistry`
pub type Registry<K, V> = HashMap<K, V>;

/// `RegistryConfig` contains the config used to initialize a `UniqueKeyedRegistry`
#[derive(Clone, PartialEq, Debug, Hash)]
pub struct RegistryConfig {
    pub initial_capacity: usize,
}

impl RegistryConfig {
    pub fn new(initial_capacity: usize) -> Self {
        Self { initial_capacity }
    }

    fn default_initial_capacity() -> usize {
        0
    }
}

impl Default for RegistryConfig {
    /// Creates a `RegistryConfig` that allocates on first insert
    fn default() -> Self {
        Self::new(RegistryConfig::default_initial_capacity())
    }
}

impl From<usize> for RegistryConfig {
    fn from(initial_capacity: usize) -> Self {
        Self::new(initial_capacity)
    }
}

/// Thread-safe table that stores values under keys it generates itself.
///
/// Keys come from a lock-free `KeyGenerator`, so they are unique for the lifetime of the
/// registry and never reused after a `pull`. Each map operation is a single `HashMap` call
/// under the lock, which makes `put`, `get` and `pull` linearizable.
pub struct UniqueKeyedRegistry<V, C: Clock = SystemClock> {
    keys: KeyGenerator<C>,
    store: RwLock<Registry<Key, V>>,
}

impl<V> UniqueKeyedRegistry<V> {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_config_and_clock(config, SystemClock::default())
    }
}

impl<V> Default for UniqueKeyedRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C: Clock> UniqueKeyedRegistry<V, C> {
    pub fn with_clock(clock: C) -> Self {
        Self::with_config_and_clock(RegistryConfig::default(), clock)
    }

    pub fn with_config_and_clock(config: RegistryConfig, clock: C) -> Self {
        Self {
            keys: KeyGenerator::new(clock),
            store: RwLock::new(Registry::with_capacity(config.initial_capacity)),
        }
    }

    /// Stores `value` under a freshly minted key and returns the key
    pub fn put(&self, value: V) -> Key {
        let key = self.keys.next_key();
        let previous = self.write().insert(key, value);
        debug_assert!(previous.is_none(), "key {key} minted twice");
        tracing::trace!(key, "registry put");
        key
    }

    /// Returns a clone of the value under `key` without removing it
    pub fn get(&self, key: Key) -> Option<V>
    where
        V: Clone,
    {
        self.read().get(&key).cloned()
    }

    /// Runs `f` on the value under `key` while holding the read lock
    pub fn with_value<R>(&self, key: Key, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.read().get(&key).map(f)
    }

    /// Removes and returns the value under `key`. Only one caller can ever receive it
    pub fn pull(&self, key: Key) -> Option<V> {
        let value = self.write().remove(&key);
        tracing::trace!(key, found = value.is_some(), "registry pull");
        value
    }

    /// Like `get`, but returns `Err(RegistryError::LockPoisoned)` instead of recovering
    pub fn try_get(&self, key: Key) -> Result<Option<V>, RegistryError>
    where
        V: Clone,
    {
        Ok(self.store.read()?.get(&key).cloned())
    }

    /// Like `pull`, but returns `Err(RegistryError::LockPoisoned)` instead of recovering
    pub fn try_pull(&self, key: Key) -> Result<Option<V>, RegistryError> {
        Ok(self.store.write()?.remove(&key))
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.read().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the last key handed out by `put`, or `None` before the first `put`
    pub fn last_key(&self) -> Option<Key> {
        self.keys.last_key()
    }

    pub fn clock(&self) -> &C {
        self.keys.clock()
    }

    // Every critical section is a single `HashMap` call, a panic inside one cannot leave the
    // map half updated, so poisoned guards are recovered
    fn read(&self) -> RwLockReadGuard<'_, Registry<Key, V>> {
        self.store.read().unwrap_or_else(|e| {
            tracing::warn!("registry read lock poisoned, recovering");
            PoisonError::into_inner(e)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry<Key, V>> {
        self.store.write().unwrap_or_else(|e| {
            tracing::warn!("registry write lock poisoned, recovering");
            PoisonError::into_inner(e)
        })
    }
}

impl<V, C: Clock> std::fmt::Debug for UniqueKeyedRegistry<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.store.read() {
            Ok(store) => f
                .debug_struct("UniqueKeyedRegistry")
                .field("len", &store.len())
                .field("last_key", &self.keys.last_key())
                .finish(),
            Err(e) => f
                .debug_struct("UniqueKeyedRegistry")
                .field("store", &format!("<lock poisoned>: {e}"))
                .field("last_key", &self.keys.last_key())
                .finish(),
        }
    }
}
