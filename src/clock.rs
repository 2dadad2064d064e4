//! Site clock.
//!
//! Every timestamp in the queue flows through a [`Clock`]. Production code
//! injects [`SystemClock`]; tests and the simulator inject [`ManualClock`], which
//! also turns the retry back-off pause into a clock advance so nothing sleeps.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Civil time at the site (America/São Paulo).
pub type CivilTime = DateTime<FixedOffset>;

/// São Paulo has been fixed at UTC-03:00 since daylight saving was abolished in 2019.
const SITE_OFFSET_WEST_SECS: i32 = 3 * 3600;

/// Fixed offset of the site's civil time zone.
pub fn site_offset() -> FixedOffset {
    FixedOffset::west_opt(SITE_OFFSET_WEST_SECS).expect("UTC-03:00 is a valid offset")
}

/// Source of wall-clock time and of the blocking pause between commit attempts.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current civil time at the site.
    fn now(&self) -> CivilTime;

    /// Block the caller for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Non-negative elapsed time from `earlier` to `later`; zero if the clock went backwards.
pub fn elapsed_between(earlier: CivilTime, later: CivilTime) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// Production clock backed by the system time and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> CivilTime {
        Utc::now().with_timezone(&site_offset())
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually advanced clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<CivilTime>>,
}

impl ManualClock {
    pub fn new(start: CivilTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Clock starting at a fixed, arbitrary site-local morning.
    pub fn at_opening() -> Self {
        let start = site_offset()
            .with_ymd_and_hms(2024, 3, 4, 8, 0, 0)
            .single()
            .unwrap_or_else(|| Utc::now().with_timezone(&site_offset()));
        Self::new(start)
    }

    /// Move time forward. Advances past the last representable instant clamp to it.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        let next = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta));
        *now = match next {
            Some(next) => next,
            None => {
                warn!(advance = ?by, "Manual clock advance out of range, clamping");
                DateTime::<Utc>::MAX_UTC.with_timezone(&site_offset())
            }
        };
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn set(&self, to: CivilTime) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> CivilTime {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
