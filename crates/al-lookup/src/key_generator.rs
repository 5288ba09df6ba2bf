use crate::{Clock, SystemClock};
use std::sync::atomic::{AtomicI64, Ordering};

/// Key handed out by a `UniqueKeyedRegistry`
pub type Key = i64;

/// Lock-free source of strictly increasing keys clamped to a clock reading.
///
/// Every key is `max(clock.now(), last + 1)` committed with a compare-and-swap, so keys
/// follow the clock while it moves forward and keep increasing by one when it stalls or
/// steps backward. The counter is never reset, so keys are not reused.
///
/// Wraparound past `i64::MAX` is not handled: the `+ 1` overflows (panicking in debug
/// builds). With tick sized clock readings this is tens of thousands of years away.
#[derive(Debug)]
pub struct KeyGenerator<C: Clock = SystemClock> {
    last: AtomicI64,
    clock: C,
}

impl<C: Clock> KeyGenerator<C> {
    /// Starting counter value, below any clock reading
    pub const SENTINEL: Key = -1;

    pub fn new(clock: C) -> Self {
        Self {
            last: AtomicI64::new(Self::SENTINEL),
            clock,
        }
    }

    /// Mints a key no earlier call on this generator has returned
    pub fn next_key(&self) -> Key {
        let mut last = self.last.load(Ordering::Acquire);
        let mut retries = 0u32;
        loop {
            let candidate = self.clock.now().max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if retries > 0 {
                        tracing::trace!(key = candidate, retries, "key minted after contention");
                    }
                    return candidate;
                }
                Err(current) => {
                    last = current;
                    retries += 1;
                }
            }
        }
    }

    /// Returns the last key minted, or `None` if no key has been issued yet
    pub fn last_key(&self) -> Option<Key> {
        let last = self.last.load(Ordering::Acquire);
        (last != Self::SENTINEL).then_some(last)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock + Default> Default for KeyGenerator<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Key, KeyGenerator, SystemClock};
    use std::{
        collections::HashSet,
        sync::{
            atomic::{AtomicI64, Ordering},
            Arc,
        },
        thread,
    };

    #[test]
    fn starts_at_sentinel() {
        let generator = KeyGenerator::<SystemClock>::default();
        assert_eq!(generator.last_key(), None);
        let key = generator.next_key();
        assert!(key > KeyGenerator::<SystemClock>::SENTINEL);
        assert_eq!(generator.last_key(), Some(key));
    }

    #[test]
    fn tracks_clock() {
        let generator = KeyGenerator::new(|| 1_000i64);
        assert_eq!(generator.next_key(), 1_000);
    }

    #[test]
    fn frozen_clock_increments() {
        let generator = KeyGenerator::new(|| 500i64);
        let keys: Vec<Key> = (0..5).map(|_| generator.next_key()).collect();
        assert_eq!(keys, vec![500, 501, 502, 503, 504]);
    }

    #[test]
    fn clock_rollback_stays_monotonic() {
        let time = Arc::new(AtomicI64::new(10_000));
        let clock_time = time.clone();
        let generator = KeyGenerator::new(move || clock_time.load(Ordering::SeqCst));

        let before = generator.next_key();
        assert_eq!(before, 10_000);

        // Clock set backwards
        time.store(2_000, Ordering::SeqCst);
        let after = generator.next_key();
        assert_eq!(after, 10_001);

        // Clock catches up and passes the counter
        time.store(20_000, Ordering::SeqCst);
        assert_eq!(generator.next_key(), 20_000);
    }

    #[test]
    fn zero_clock_starts_at_zero() {
        let generator = KeyGenerator::new(|| 0i64);
        assert_eq!(generator.next_key(), 0);
        assert_eq!(generator.last_key(), Some(0));
        assert_eq!(generator.next_key(), 1);
    }

    #[test]
    fn serial_keys_increase() {
        let generator = KeyGenerator::<SystemClock>::default();
        let mut last = generator.next_key();
        for _ in 0..1_000 {
            let key = generator.next_key();
            assert!(key > last);
            last = key;
        }
    }

    #[test]
    fn concurrent_keys_unique() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 2_000;

        // A frozen clock forces every thread through the increment path
        let generator = Arc::new(KeyGenerator::new(|| 7i64));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = generator.clone();
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| generator.next_key())
                        .collect::<Vec<Key>>()
                })
            })
            .collect();

        let mut keys = HashSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(keys.insert(key), "duplicate key {key}");
            }
        }
        assert_eq!(keys.len(), THREADS * PER_THREAD);
        assert_eq!(*keys.iter().min().unwrap(), 7);
        assert_eq!(
            *keys.iter().max().unwrap(),
            7 + (THREADS * PER_THREAD) as i64 - 1
        );
    }
}
