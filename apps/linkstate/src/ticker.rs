//! # Clock and Ticker
//!
//! The core never reads a clock. This module is where the binary gets time:
//! a monotonic millisecond counter for hysteresis ticks, and wall-clock epoch
//! milliseconds for export timestamps.

use linkstate_core::{ApplyReport, Session};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Milliseconds since the clock was started. Never goes backwards.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl MonotonicClock {
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock milliseconds since the Unix epoch; 0 if the system clock is
/// set before 1970.
#[must_use]
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Log every accepted status flip in `report`.
pub fn log_transitions(report: &ApplyReport) {
    for t in &report.transitions {
        tracing::info!(
            link = %t.link,
            from = %t.from,
            to = %t.to,
            filtered = t.filtered,
            at_ms = t.at_ms,
            "Link status transition"
        );
    }
}

/// Drive `Session::tick` every `tick_ms` until the task is aborted.
///
/// `now_ms` comes from `clock`; `dt_ms` is the measured gap since the
/// previous tick, so a delayed tick reports the real elapsed time.
pub fn spawn_ticker(
    session: Arc<RwLock<Session>>,
    clock: MonotonicClock,
    tick_ms: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = clock.now_ms();

        tracing::debug!(tick_ms, "Ticker started");
        loop {
            interval.tick().await;
            let now = clock.now_ms();
            let dt = now.saturating_sub(last);
            last = now;

            let report = session.write().await.tick(now, dt);
            if let Some(report) = report {
                log_transitions(&report);
            }
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
