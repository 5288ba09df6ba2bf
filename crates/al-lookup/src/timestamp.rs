use std::{
    marker::PhantomData,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Ticks {}
    impl Sealed for super::Microseconds {}
    impl Sealed for super::Milliseconds {}
}

pub trait Granularity: sealed::Sealed + Send + Sync + 'static {
    /// Returns the `Granularity` type
    fn as_granularity() -> TimestampGranularity;

    /// Returns the units elapsed since `epoch` as an i64, saturating at `i64::MAX`
    fn get_ticks(epoch: SystemTime) -> i64;
}

/// 100 nanosecond ticks
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Ticks;
impl Granularity for Ticks {
    fn as_granularity() -> TimestampGranularity {
        TimestampGranularity::Ticks
    }

    fn get_ticks(epoch: SystemTime) -> i64 {
        i64::try_from(get_epoch_timestamp(epoch).as_nanos() / 100).unwrap_or(i64::MAX)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Microseconds;
impl Granularity for Microseconds {
    fn as_granularity() -> TimestampGranularity {
        TimestampGranularity::Microseconds
    }

    fn get_ticks(epoch: SystemTime) -> i64 {
        i64::try_from(get_epoch_timestamp(epoch).as_micros()).unwrap_or(i64::MAX)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Milliseconds;
impl Granularity for Milliseconds {
    fn as_granularity() -> TimestampGranularity {
        TimestampGranularity::Milliseconds
    }

    fn get_ticks(epoch: SystemTime) -> i64 {
        i64::try_from(get_epoch_timestamp(epoch).as_millis()).unwrap_or(i64::MAX)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum TimestampGranularity {
    #[default]
    Ticks,
    Microseconds,
    Milliseconds,
}

/// Returns the duration since the passed `epoch`, or zero if the wall clock is behind it
pub fn get_epoch_timestamp(epoch: SystemTime) -> Duration {
    SystemTime::now().duration_since(epoch).unwrap_or_default()
}

/// Source of the time readings keys are clamped to
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Any `Fn() -> i64` can act as a clock, mostly useful for pinning time in tests
impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now(&self) -> i64 {
        self()
    }
}

/// Wall clock reading in `G` units since `epoch`
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SystemClock<G: Granularity = Ticks> {
    epoch: SystemTime,
    _phantom: PhantomData<G>,
}

impl<G: Granularity> SystemClock<G> {
    pub fn new(epoch: SystemTime) -> Self {
        Self {
            epoch,
            _phantom: PhantomData,
        }
    }

    pub fn epoch(&self) -> SystemTime {
        self.epoch
    }

    pub fn granularity(&self) -> TimestampGranularity {
        G::as_granularity()
    }
}

impl<G: Granularity> Default for SystemClock<G> {
    /// Counts from the UNIX_EPOCH
    fn default() -> Self {
        Self::new(UNIX_EPOCH)
    }
}

impl<G: Granularity> Clock for SystemClock<G> {
    fn now(&self) -> i64 {
        G::get_ticks(self.epoch)
    }
}
