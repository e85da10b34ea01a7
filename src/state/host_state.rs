use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracks request timing for one host
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests started against this host
    pub request_count: u32,

    /// Earliest instant the next request may start
    pub next_request_at: Option<Instant>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how long to wait at `now` before the next request may start
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        self.next_request_at
            .filter(|at| *at > now)
            .map(|at| at.duration_since(now))
    }

    /// Claims the next request slot and returns the wait before it
    ///
    /// The slot after this one is pushed `gap` past the claimed start, so
    /// two workers claiming back to back are spaced by at least `gap`.
    pub fn reserve(&mut self, gap: Duration, now: Instant) -> Duration {
        let start = match self.next_request_at {
            Some(at) if at > now => at,
            _ => now,
        };
        self.next_request_at = Some(start + gap);
        self.request_count += 1;
        start.duration_since(now)
    }
}

/// Per-host politeness table shared by all workers of a crawl
///
/// This is the only structure workers mutate directly; every access goes
/// through the inner mutex and never holds it across an await.
#[derive(Debug)]
pub struct HostTable {
    gap: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl HostTable {
    /// Creates a table enforcing `gap` between request starts per host
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured minimum gap
    pub fn gap(&self) -> Duration {
        self.gap
    }

    /// Reserves a request slot for `host` and returns how long to sleep
    pub fn reserve(&self, host: &str) -> Duration {
        let now = Instant::now();
        let mut hosts = match self.hosts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hosts
            .entry(host.to_string())
            .or_insert_with(HostState::new)
            .reserve(self.gap, now)
    }

    /// Waits until a request to `host` may start
    pub async fn wait_turn(&self, host: &str) {
        let wait = self.reserve(host);
        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before requesting {}", wait, host);
            tokio::time::sleep(wait).await;
        }
    }

    /// Returns the number of requests started against `host`
    pub fn request_count(&self, host: &str) -> u32 {
        let hosts = match self.hosts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        hosts.get(host).map(|s| s.request_count).unwrap_or(0)
    }
}
