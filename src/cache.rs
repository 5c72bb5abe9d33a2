use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CachedValue<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

/// A single-slot cache that refreshes on read once its value is older than
/// the TTL. The slot stays locked while a refresh runs, so concurrent
/// readers of a stale slot wait for one fetch instead of repeating it.
pub struct TtlCache<T, C = SystemClock> {
    ttl: Duration,
    clock: C,
    slot: Mutex<Option<CachedValue<T>>>,
}

impl<T: Clone> TtlCache<T, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<T: Clone, C: Clock> TtlCache<T, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        TtlCache {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    // A panic during a refresh leaves the previous value intact.
    fn lock(&self) -> MutexGuard<'_, Option<CachedValue<T>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, cached: &CachedValue<T>) -> bool {
        let age = self.clock.now().signed_duration_since(cached.fetched_at);
        age <= self.ttl
    }

    pub fn is_stale(&self) -> bool {
        match self.lock().as_ref() {
            Some(cached) => !self.is_fresh(cached),
            None => true,
        }
    }

    /// Returns the cached value, or runs `fetch` and overwrites the slot when
    /// it is empty or stale. A failed fetch leaves the slot untouched.
    pub fn get_or_refresh<E, F>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut slot = self.lock();
        if let Some(cached) = slot.as_ref() {
            if self.is_fresh(cached) {
                return Ok(cached.value.clone());
            }
            info!("Cache entry from {} is stale, refreshing", cached.fetched_at);
        }

        let value = fetch()?;
        *slot = Some(CachedValue {
            value: value.clone(),
            fetched_at: self.clock.now(),
        });
        Ok(value)
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.lock().as_ref().map(|cached| cached.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        fn new() -> Self {
            ManualClock(Arc::new(Mutex::new(
                DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            )))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn serves_cached_value_until_ttl_passes() {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::hours(24), clock.clone());
        let calls = Cell::new(0);
        let fetch = || -> Result<u32, ()> {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };

        assert!(cache.is_stale());
        assert_eq!(cache.get_or_refresh(fetch), Ok(1));
        clock.advance(Duration::hours(23));
        assert_eq!(cache.get_or_refresh(fetch), Ok(1));
        assert!(!cache.is_stale());

        clock.advance(Duration::hours(2));
        assert!(cache.is_stale());
        assert_eq!(cache.get_or_refresh(fetch), Ok(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failed_refresh_keeps_previous_value() {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::hours(1), clock.clone());
        assert_eq!(cache.get_or_refresh(|| Ok::<_, String>("first")), Ok("first"));
        let fetched_at = cache.fetched_at();

        clock.advance(Duration::hours(2));
        assert_eq!(
            cache.get_or_refresh(|| Err::<&str, _>("upstream down".to_string())),
            Err("upstream down".to_string())
        );
        assert_eq!(cache.fetched_at(), fetched_at);
        assert_eq!(cache.get_or_refresh(|| Ok::<_, String>("second")), Ok("second"));
    }

    #[test]
    fn concurrent_readers_share_one_fetch() {
        let cache = Arc::new(TtlCache::<u32>::new(Duration::hours(24)));
        let fetches = Arc::new(Mutex::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let fetches = Arc::clone(&fetches);
                std::thread::spawn(move || {
                    cache.get_or_refresh(|| {
                        *fetches.lock().unwrap() += 1;
                        Ok::<u32, ()>(42)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(42));
        }
        assert_eq!(*fetches.lock().unwrap(), 1);
    }
}
