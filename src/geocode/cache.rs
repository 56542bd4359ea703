use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::key::cache_key;
use crate::api::{GeocodeError, ReverseGeocoder};
use crate::config::CacheConfig;
use crate::domain::Location;

/// Label returned when the lookup could not reach Nominatim
pub const UNKNOWN_LOCATION: &str = "unknown location (network error)";

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Outcome slot shared by every caller waiting on one upstream lookup
#[derive(Default)]
struct Pending {
    outcome: Mutex<Option<String>>,
    ready: Condvar,
}

impl Pending {
    fn wait(&self) -> String {
        let mut outcome = self.outcome.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(value) = outcome.as_ref() {
                return value.clone();
            }
            outcome = self.ready.wait(outcome).unwrap_or_else(|e| e.into_inner());
        }
    }

    fn publish(&self, value: String) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
        self.ready.notify_all();
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, Arc<Pending>>,
}

impl CacheState {
    fn prune(&mut self, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

/// Reverse-geocoding front end with a TTL cache and request collapsing.
///
/// Coordinates are bucketed by [`cache_key`]. Within a bucket, a live cache
/// entry is served directly and concurrent misses share a single upstream
/// lookup. Lookup failures are never cached and never surface as errors:
/// callers get a fallback label instead.
pub struct GeocodeCache<G, C = SystemClock> {
    geocoder: G,
    clock: C,
    ttl: Duration,
    precision: u32,
    state: Mutex<CacheState>,
}

impl<G: ReverseGeocoder> GeocodeCache<G> {
    pub fn new(geocoder: G, config: &CacheConfig) -> Self {
        Self::with_clock(geocoder, SystemClock, config)
    }
}

impl<G, C> GeocodeCache<G, C> {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of cached addresses, expired ones included until the next prune
    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<G: ReverseGeocoder, C: Clock> GeocodeCache<G, C> {
    pub fn with_clock(geocoder: G, clock: C, config: &CacheConfig) -> Self {
        Self {
            geocoder,
            clock,
            ttl: config.ttl(),
            precision: config.precision,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Resolve `location` to an address label. Never fails.
    pub fn resolve(&self, location: Location) -> String {
        let key = cache_key(location, self.precision);

        let pending = {
            let mut state = self.lock_state();
            state.prune(self.clock.now());

            if let Some(entry) = state.entries.get(&key) {
                debug!(%key, "reverse geocode cache hit");
                return entry.value.clone();
            }

            if let Some(pending) = state.in_flight.get(&key) {
                let pending = Arc::clone(pending);
                drop(state);
                debug!(%key, "joining in-flight reverse geocode");
                return pending.wait();
            }

            let pending = Arc::new(Pending::default());
            state.in_flight.insert(key.clone(), Arc::clone(&pending));
            pending
        };

        debug!(%key, "reverse geocode cache miss");
        let mut flight = InFlight {
            cache: self,
            key,
            pending,
            settled: false,
        };

        match self.geocoder.reverse(location) {
            Ok(address) => {
                let expires_at = self.clock.now() + self.ttl;
                flight.settle(address, Some(expires_at))
            }
            Err(err) => {
                warn!(key = %flight.key, error = %err, "reverse geocoding failed");
                flight.settle(fallback_label(&err), None)
            }
        }
    }
}

fn fallback_label(err: &GeocodeError) -> String {
    match err {
        GeocodeError::Upstream(message) => {
            format!("location lookup failed: {}", message).to_lowercase()
        }
        _ => UNKNOWN_LOCATION.to_string(),
    }
}

/// Owns the in-flight marker for one key until the lookup settles.
///
/// Dropping it unsettled (the geocoder panicked) still clears the marker and
/// wakes waiters with the fallback label.
struct InFlight<'a, G, C> {
    cache: &'a GeocodeCache<G, C>,
    key: String,
    pending: Arc<Pending>,
    settled: bool,
}

impl<G, C> InFlight<'_, G, C> {
    fn settle(&mut self, value: String, expires_at: Option<Instant>) -> String {
        {
            let mut state = self.cache.lock_state();
            if let Some(expires_at) = expires_at {
                state.entries.insert(
                    self.key.clone(),
                    CacheEntry {
                        value: value.clone(),
                        expires_at,
                    },
                );
            }
            state.in_flight.remove(&self.key);
        }
        self.pending.publish(value.clone());
        self.settled = true;
        value
    }
}

impl<G, C> Drop for InFlight<'_, G, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.settle(UNKNOWN_LOCATION.to_string(), None);
        }
    }
}
