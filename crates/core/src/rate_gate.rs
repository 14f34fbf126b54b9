//! Fixed-window admission control keyed by (client, route).
//!
//! Each key owns a window that starts with its first call. Calls inside the
//! window are counted up to the limit; further calls are rejected with the
//! time left until the window closes. Once the window has elapsed the next
//! call opens a fresh one, whatever the previous count was.
//!
//! All windows sit behind one mutex, so the check-and-increment of a counter
//! is atomic and bursts from one client are never undercounted. The critical
//! section does no I/O.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Window length used for per-minute limits.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Outcome of [`RateGate::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed. `remaining` calls are left in this window.
    Allowed { remaining: u32 },
    /// The call must be refused until `retry_after` has passed.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Whole seconds a client should wait, rounded up and never zero.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

#[derive(Debug)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

/// In-process admission gate shared by every request task.
#[derive(Debug)]
pub struct RateGate {
    window: Duration,
    windows: Mutex<HashMap<(String, String), RateWindow>>,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl RateGate {
    /// Create a gate whose windows last `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit or reject one call from `client_key` on `route`.
    pub fn admit(&self, client_key: &str, route: &str, limit: u32) -> Admission {
        self.admit_at(client_key, route, limit, Instant::now())
    }

    /// [`admit`](Self::admit) with an explicit clock reading.
    pub fn admit_at(&self, client_key: &str, route: &str, limit: u32, now: Instant) -> Admission {
        let mut windows = self.windows.lock();
        let entry = windows
            .entry((client_key.to_owned(), route.to_owned()))
            .or_insert(RateWindow {
                window_start: now,
                count: 0,
            });

        let mut elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.window {
            *entry = RateWindow {
                window_start: now,
                count: 0,
            };
            elapsed = Duration::ZERO;
        }

        if entry.count >= limit {
            return Admission::Rejected {
                retry_after: self.window - elapsed,
            };
        }

        entry.count += 1;
        Admission::Allowed {
            remaining: limit - entry.count,
        }
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.window_start) < self.window);
        before - windows.len()
    }

    /// Number of (client, route) windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.windows.lock().len()
    }
}
