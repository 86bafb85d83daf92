//! Minute-window rate smoothing

use super::pulse::PulseCounter;

/// Length of one rate window
pub const WINDOW_MS: u32 = 60_000;

/// Extrapolate a pulse count over `elapsed_ms` to pulses per minute
pub fn rate_per_minute(pulses: u32, elapsed_ms: u32) -> u32 {
    let elapsed = elapsed_ms.max(1) as u64;
    let rate = (pulses as u64 * WINDOW_MS as u64) / elapsed;
    rate.min(u32::MAX as u64) as u32
}

/// Counter state and the displayed rate, taken once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseSnapshot {
    pub total: u32,
    pub accumulated: u32,
    /// Pulses per minute to display
    pub display_rate: u32,
    /// A counter save is pending
    pub persist_signal: bool,
    /// A counter upload is pending
    pub upload_signal: bool,
    /// A window closed during this snapshot
    pub window_closed: bool,
}

/// Fixed-length rate window
///
/// During the very first window the displayed rate is a live extrapolation
/// of the pulses seen so far. Once a full window has elapsed, the display
/// holds that window's rate until the next window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateWindow {
    window_start: u32,
    last_completed_rate: u32,
    has_completed_window: bool,
}

impl RateWindow {
    /// Start the first window at `now_ms`
    pub const fn new(now_ms: u32) -> Self {
        Self {
            window_start: now_ms,
            last_completed_rate: 0,
            has_completed_window: false,
        }
    }

    /// Restart the current window, discarding its pulses
    pub fn restart(&mut self, counter: &PulseCounter, now_ms: u32) {
        counter.take_window_pulses();
        self.window_start = now_ms;
    }

    /// Rate of the last full window, if one has completed
    pub fn last_completed_rate(&self) -> Option<u32> {
        self.has_completed_window
            .then_some(self.last_completed_rate)
    }

    /// Close the window if it has run its length and compute the display rate
    pub fn update(&mut self, counter: &PulseCounter, now_ms: u32) -> (u32, bool) {
        let elapsed = now_ms.wrapping_sub(self.window_start);

        if elapsed >= WINDOW_MS {
            let pulses = counter.take_window_pulses();
            self.last_completed_rate = rate_per_minute(pulses, elapsed);
            self.has_completed_window = true;
            self.window_start = now_ms;
            return (self.last_completed_rate, true);
        }

        if self.has_completed_window {
            (self.last_completed_rate, false)
        } else {
            (rate_per_minute(counter.window_pulses(), elapsed), false)
        }
    }

    /// Update the window and capture the counter state
    pub fn snapshot(&mut self, counter: &PulseCounter, now_ms: u32) -> PulseSnapshot {
        let (display_rate, window_closed) = self.update(counter, now_ms);
        let counters = counter.counters();
        PulseSnapshot {
            total: counters.total,
            accumulated: counters.accumulated,
            display_rate,
            persist_signal: counter.persist_pending(),
            upload_signal: counter.upload_pending(),
            window_closed,
        }
    }
}
