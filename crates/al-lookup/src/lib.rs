#[cfg(feature = "actions")]
mod action;
mod error;
mod key_generator;
mod registry;
mod timestamp;

#[cfg(feature = "actions")]
pub use action::{Action, ActionLookupTable};
pub use error::RegistryError;
pub use key_generator::{Key, KeyGenerator};
pub use registry::{Registry, RegistryConfig, UniqueKeyedRegistry};
pub use timestamp::{
    get_epoch_timestamp, Clock, Granularity, Microseconds, Milliseconds, SystemClock, Ticks,
    TimestampGranularity,
};
