use crate::Key;
use std::{fmt, sync::PoisonError};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistryError {
    /// No entry is stored under the key, it was never issued or has already been pulled
    UnknownKey(Key),
    LockPoisoned(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownKey(key) => write!(f, "no entry for key {key}"),
            RegistryError::LockPoisoned(e) => write!(f, "registry lock poisoned: {e}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl<T> From<PoisonError<T>> for RegistryError {
    fn from(err: PoisonError<T>) -> Self {
        RegistryError::LockPoisoned(err.to_string())
    }
}
