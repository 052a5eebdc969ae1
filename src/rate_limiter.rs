//! Client-side request throttling
//!
//! Enforces two independent, per-call policies in front of any operation:
//! 1. A cap on calls per rolling window (60 seconds unless configured otherwise)
//! 2. A fixed minimum sleep before every call
//!
//! Both waits elapse before the wrapped operation runs. The window counter
//! belongs to the limiter instance, so every call through one limiter shares it.
//!
//! The window is not aligned to clock boundaries: it starts at the first call
//! after the previous reset. A caller that overflows the window reserves the
//! first slot of the next window before sleeping, so concurrent callers queue
//! behind it instead of racing the counter.

use parking_lot::Mutex;
use std::future::Future;
use std::time::{Duration, Instant};

/// Length of the default rolling window
pub const SECONDS_IN_MINUTE: u64 = 60;

/// Per-call throttling parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum calls per rolling window. `None` disables the cap.
    pub max_requests_per_minute: Option<u32>,
    /// Mandatory sleep before every call
    pub min_sleep_per_request: Duration,
}

impl RateLimitPolicy {
    /// No cap and no spacing
    pub const fn unlimited() -> Self {
        Self {
            max_requests_per_minute: None,
            min_sleep_per_request: Duration::ZERO,
        }
    }

    /// Cap calls per rolling window
    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests_per_minute: Some(max_requests),
            min_sleep_per_request: Duration::ZERO,
        }
    }

    pub fn with_min_sleep(mut self, min_sleep: Duration) -> Self {
        self.min_sleep_per_request = min_sleep;
        self
    }

    /// Fractional seconds, as used in configuration files.
    /// Negative or non-finite values mean no spacing.
    pub fn with_min_sleep_secs(self, secs: f64) -> Self {
        let min_sleep = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
        self.with_min_sleep(min_sleep)
    }
}

#[derive(Debug)]
struct WindowState {
    requests_in_window: u32,
    window_start: Instant,
}

/// Rolling-window rate limiter
///
/// Owns the window counter and start timestamp for one throttled operation.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter with the default 60 second window
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(SECONDS_IN_MINUTE))
    }

    /// Create a limiter with a custom window length
    pub fn with_window(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    fn starting_at(window: Duration, origin: Instant) -> Self {
        Self {
            window,
            state: Mutex::new(WindowState {
                requests_in_window: 0,
                window_start: origin,
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Calls counted in the current window
    pub fn requests_in_window(&self) -> u32 {
        self.state.lock().requests_in_window
    }

    /// Count one call and return how long it must wait for the rate cap.
    ///
    /// Does not include the policy's minimum sleep.
    pub fn reserve(&self, policy: &RateLimitPolicy) -> Duration {
        self.reserve_at(Instant::now(), policy)
    }

    fn reserve_at(&self, now: Instant, policy: &RateLimitPolicy) -> Duration {
        let mut state = self.state.lock();

        if now.saturating_duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.requests_in_window = 1;
            return Duration::ZERO;
        }

        match policy.max_requests_per_minute {
            Some(max) if state.requests_in_window >= max.max(1) => {
                // Take the first slot of the next window
                match state.window_start.checked_add(self.window) {
                    Some(next_window) => {
                        state.window_start = next_window;
                        state.requests_in_window = 1;
                        next_window.saturating_duration_since(now)
                    }
                    // Next window start is not representable
                    None => self.window,
                }
            }
            _ => {
                state.requests_in_window = state.requests_in_window.saturating_add(1);
                // Non-zero only while an overflowing caller's window is still ahead
                state.window_start.saturating_duration_since(now)
            }
        }
    }

    /// Block the calling thread until a call is allowed under `policy`
    pub fn acquire(&self, policy: &RateLimitPolicy) {
        let wait = self.reserve(policy);
        if !wait.is_zero() {
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                max_requests = ?policy.max_requests_per_minute,
                "Rate limit reached, waiting for next window"
            );
            std::thread::sleep(wait);
        }
        if !policy.min_sleep_per_request.is_zero() {
            std::thread::sleep(policy.min_sleep_per_request);
        }
    }

    /// Async variant of [`RateLimiter::acquire`]
    pub async fn acquire_async(&self, policy: &RateLimitPolicy) {
        let wait = self.reserve(policy);
        if !wait.is_zero() {
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                max_requests = ?policy.max_requests_per_minute,
                "Rate limit reached, waiting for next window"
            );
            tokio::time::sleep(wait).await;
        }
        if !policy.min_sleep_per_request.is_zero() {
            tokio::time::sleep(policy.min_sleep_per_request).await;
        }
    }

    /// Throttle, then run `op` and return its result unchanged
    pub fn run<T>(&self, policy: &RateLimitPolicy, op: impl FnOnce() -> T) -> T {
        self.acquire(policy);
        op()
    }

    /// Throttle, then await `fut` and return its output unchanged
    pub async fn run_async<F: Future>(&self, policy: &RateLimitPolicy, fut: F) -> F::Output {
        self.acquire_async(policy).await;
        fut.await
    }

    /// Bind this limiter to an operation
    pub fn wrap<F>(self, op: F) -> RateLimited<F> {
        RateLimited { op, limiter: self }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// An operation paired with its own limiter
///
/// The operation takes its arguments as a single value (use a tuple for
/// several); the policy travels next to them on every call and is never
/// forwarded to the operation.
#[derive(Debug)]
pub struct RateLimited<F> {
    op: F,
    limiter: RateLimiter,
}

/// Wrap `op` with a fresh 60 second limiter
pub fn rate_limited<F>(op: F) -> RateLimited<F> {
    RateLimiter::new().wrap(op)
}

impl<F> RateLimited<F> {
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Blocking call
    pub fn call<Args, R>(&self, args: Args, policy: RateLimitPolicy) -> R
    where
        F: Fn(Args) -> R,
    {
        self.limiter.run(&policy, || (self.op)(args))
    }

    /// Async call for operations returning a future
    pub async fn call_async<Args, Fut>(&self, args: Args, policy: RateLimitPolicy) -> Fut::Output
    where
        F: Fn(Args) -> Fut,
        Fut: Future,
    {
        self.limiter.acquire_async(&policy).await;
        (self.op)(args).await
    }
}
