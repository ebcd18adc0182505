//! Clock abstraction and a trailing-edge debounce timer.
//!
//! The timer is polled rather than callback-driven: the host calls
//! [`crate::engine::EngineCore::tick`] once per animation frame, and the store
//! asks its [`Debouncer`] whether the quiet period has elapsed. Time comes from
//! an injected [`Clock`], so tests drive it with [`ManualClock`] and never
//! sleep.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::cell::Cell;
use std::rc::Rc;

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock backed by `Date.now()`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Clock backed by the host's system time.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
    }
}

/// The real clock for the current target.
#[must_use]
pub fn platform_clock() -> Box<dyn Clock> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(BrowserClock)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(SystemClock)
    }
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: f64) -> Self {
        Self { now: Rc::new(Cell::new(start_ms)) }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// A single resettable trailing-edge deadline.
///
/// At most one deadline is ever outstanding: every [`Debouncer::trigger`]
/// replaces the previous one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay_ms: f64) -> Self {
        Self { delay_ms: delay_ms.max(0.0), deadline: None }
    }

    /// (Re)arm the timer `delay_ms` after `now`.
    pub fn trigger(&mut self, now: f64) {
        self.deadline = Some(now + self.delay_ms);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    #[must_use]
    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Returns `true` exactly once per armed deadline, when `now` has reached it.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(due) if now >= due => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
