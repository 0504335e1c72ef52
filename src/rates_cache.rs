//! Time-bounded cache for market exchange rates.
//!
//! The engine itself never fetches anything. Whatever performs the fetch
//! (an HTTP client, a file reader) implements [`RateSource`] and is wrapped in
//! a [`RateCache`], which guarantees:
//!
//! - an entry is never served once `ttl` has elapsed since it was fetched;
//! - concurrent callers asking for the same base currency trigger a single
//!   fetch, the rest wait for it and share the result;
//! - failed fetches are not cached.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Latest market rates quoted against one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRates {
    pub base: String,
    /// Quote date as reported by the source (`YYYY-MM-DD`).
    pub date: String,
    /// Units of each currency per one unit of `base`.
    pub rates: BTreeMap<String, Decimal>,
}

impl CurrencyRates {
    /// Units of `to` per unit of the base; the base itself is always 1.
    pub fn rate(&self, to: &str) -> Option<Decimal> {
        if to == self.base {
            return Some(dec!(1));
        }
        self.rates.get(to).copied()
    }

    pub fn convert(&self, amount: Decimal, to: &str) -> Option<Decimal> {
        self.rate(to).map(|rate| amount * rate)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *lock(&self.elapsed) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *lock(&self.elapsed)
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

pub trait RateSource: Send + Sync {
    fn fetch(&self, base: &str) -> anyhow::Result<CurrencyRates>;
}

struct Cached {
    rates: Arc<CurrencyRates>,
    fetched_at: Instant,
}

type Slot = Arc<Mutex<Option<Cached>>>;

pub struct RateCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<S: RateSource> RateCache<S> {
    pub fn new(source: S) -> Self {
        RateCache::with_clock(source, SystemClock, DEFAULT_TTL)
    }
}

impl<S: RateSource, C: Clock> RateCache<S, C> {
    pub fn with_clock(source: S, clock: C, ttl: Duration) -> Self {
        RateCache {
            source,
            clock,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Rates for `base`, fetching them if the cached copy is missing or stale.
    pub fn get(&self, base: &str) -> anyhow::Result<Arc<CurrencyRates>> {
        let slot = lock(&self.slots).entry(base.to_string()).or_default().clone();

        // Holding the per-key lock across the fetch keeps one request in
        // flight per base; other keys are unaffected.
        let mut entry = lock(&slot);
        if let Some(cached) = entry.as_ref() {
            if self.clock.now().saturating_duration_since(cached.fetched_at) < self.ttl {
                return Ok(Arc::clone(&cached.rates));
            }
        }

        debug!(base, "fetching currency rates");
        let rates = Arc::new(
            self.source
                .fetch(base)
                .with_context(|| format!("fetching rates for {base}"))?,
        );
        *entry = Some(Cached {
            rates: Arc::clone(&rates),
            fetched_at: self.clock.now(),
        });
        Ok(rates)
    }

    /// Drops the cached rates for `base`, forcing the next `get` to fetch.
    ///
    /// The slot itself stays in place, so a fetch already in flight for
    /// `base` finishes before the entry is cleared.
    pub fn invalidate(&self, base: &str) {
        let slot = lock(&self.slots).get(base).cloned();
        if let Some(slot) = slot {
            *lock(&slot) = None;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        delay: Duration,
    }

    impl RateSource for CountingSource {
        fn fetch(&self, base: &str) -> anyhow::Result<CurrencyRates> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(CurrencyRates {
                base: base.to_string(),
                date: format!("2024-01-{:02}", call + 1),
                rates: BTreeMap::from([("EUR".to_string(), dec!(0.92))]),
            })
        }
    }

    struct FlakySource {
        calls: AtomicUsize,
    }

    impl RateSource for FlakySource {
        fn fetch(&self, base: &str) -> anyhow::Result<CurrencyRates> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("API error: 503");
            }
            Ok(CurrencyRates {
                base: base.to_string(),
                date: "2024-01-01".to_string(),
                rates: BTreeMap::new(),
            })
        }
    }

    fn cache_with_clock() -> (RateCache<CountingSource, Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = RateCache::with_clock(CountingSource::default(), Arc::clone(&clock), DEFAULT_TTL);
        (cache, clock)
    }

    #[test]
    fn test_serves_fresh_entry_from_cache() {
        let (cache, clock) = cache_with_clock();

        let first = cache.get("USD").unwrap();
        clock.advance(Duration::from_secs(299));
        let second = cache.get("USD").unwrap();

        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_never_serves_expired_entry() {
        let (cache, clock) = cache_with_clock();

        cache.get("USD").unwrap();
        clock.advance(DEFAULT_TTL);
        let refreshed = cache.get("USD").unwrap();

        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.date, "2024-01-02");
    }

    #[test]
    fn test_keys_are_cached_separately() {
        let (cache, _clock) = cache_with_clock();

        cache.get("USD").unwrap();
        cache.get("EUR").unwrap();
        cache.get("USD").unwrap();

        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_forces_fetch() {
        let (cache, _clock) = cache_with_clock();

        cache.get("USD").unwrap();
        cache.invalidate("USD");
        cache.get("USD").unwrap();

        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_gets_share_one_fetch() {
        let source = CountingSource {
            delay: Duration::from_millis(50),
            ..Default::default()
        };
        let cache = RateCache::new(source);
        let barrier = Barrier::new(8);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    cache.get("USD").unwrap();
                });
            }
        });

        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_waits_for_fetch_in_flight() {
        let cache = RateCache::new(CountingSource {
            delay: Duration::from_millis(100),
            ..Default::default()
        });

        thread::scope(|scope| {
            scope.spawn(|| cache.get("USD").unwrap());
            thread::sleep(Duration::from_millis(20));
            scope.spawn(|| {
                cache.invalidate("USD");
                cache.get("USD").unwrap();
            });
            thread::sleep(Duration::from_millis(20));
            scope.spawn(|| cache.get("USD").unwrap());
        });

        assert_eq!(cache.source.peak_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = RateCache::new(FlakySource {
            calls: AtomicUsize::new(0),
        });

        let err = cache.get("USD").unwrap_err();
        assert_eq!(err.to_string(), "fetching rates for USD");
        assert!(cache.get("USD").is_ok());
    }

    #[test]
    fn test_rate_lookup_and_conversion() {
        let rates = CurrencyRates {
            base: "USD".to_string(),
            date: "2024-01-01".to_string(),
            rates: BTreeMap::from([("EUR".to_string(), dec!(0.92))]),
        };

        assert_eq!(rates.rate("USD"), Some(dec!(1)));
        assert_eq!(rates.convert(dec!(100), "EUR"), Some(dec!(92)));
        assert_eq!(rates.convert(dec!(100), "JPY"), None);
    }
}
