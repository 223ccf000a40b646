//! Single-use `state` nonces binding a callback to the flow that started it, and
//! the authorization codes already redeemed through it.

use rand::{distributions::Uniform, Rng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const STATE_LENGTH: usize = 24;
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Upper bound on remembered entries per store.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Keys with an insertion instant. Expired keys are only swept once the map is
/// full; when every key is still live the oldest is evicted.
#[derive(Debug)]
struct Ledger {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, Instant>,
}

impl Ledger {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    fn is_live(&self, inserted: Instant, now: Instant) -> bool {
        now.duration_since(inserted) < self.ttl
    }

    fn insert(&mut self, key: String, now: Instant) {
        if self.entries.len() >= self.capacity {
            let ttl = self.ttl;
            self.entries
                .retain(|_, inserted| now.duration_since(*inserted) < ttl);
        }

        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, inserted)| **inserted)
                .map(|(key, _)| key.clone());

            let Some(key) = oldest else { break };
            self.entries.remove(&key);
        }

        self.entries.insert(key, now);
    }
}

/// Issued and not yet redeemed `state` values.
///
/// Each value is removed the first time it is presented, so a replayed callback
/// never reaches the token endpoint.
#[derive(Clone, Debug)]
pub struct PendingStates {
    inner: Arc<Mutex<Ledger>>,
}

impl Default for PendingStates {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL)
    }
}

impl PendingStates {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Ledger::new(ttl, capacity))),
        }
    }

    /// Generate and remember a new state value.
    pub async fn issue(&self) -> String {
        let state = generate_state();

        self.inner
            .lock()
            .await
            .insert(state.clone(), Instant::now());

        state
    }

    /// Redeem `state`; `true` only for a known, unexpired, unused value.
    pub async fn consume(&self, state: &str) -> bool {
        let mut pending = self.inner.lock().await;

        match pending.entries.remove(state) {
            Some(issued) => pending.is_live(issued, Instant::now()),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }
}

/// Authorization codes that already went to the token endpoint.
///
/// Codes are remembered for the same window as `state` values; a code presented
/// again inside that window is refused without another exchange.
#[derive(Clone, Debug)]
pub struct RedeemedCodes {
    inner: Arc<Mutex<Ledger>>,
}

impl Default for RedeemedCodes {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_TTL)
    }
}

impl RedeemedCodes {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Ledger::new(ttl, capacity))),
        }
    }

    /// Claim `code` for an exchange; `false` if it was claimed before.
    pub async fn claim(&self, code: &str) -> bool {
        let now = Instant::now();
        let mut redeemed = self.inner.lock().await;

        if let Some(&claimed) = redeemed.entries.get(code) {
            if redeemed.is_live(claimed, now) {
                return false;
            }
        }

        redeemed.insert(code.to_string(), now);
        true
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(Uniform::new_inclusive(b'a', b'z'))
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
