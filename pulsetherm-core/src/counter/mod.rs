//! Pulse counting and rate smoothing
//!
//! Counting is split across the two execution contexts:
//!
//! - [`PulseCounter`] is shared with the pulse interrupt. Every field is a
//!   single atomic, so [`PulseCounter::on_pulse`] never blocks or allocates.
//! - [`RateWindow`] is owned by the scheduler and turns the raw window
//!   pulse count into a per-minute rate once per tick.

mod pulse;
mod window;

use serde::{Deserialize, Serialize};

pub use pulse::PulseCounter;
pub use window::{rate_per_minute, PulseSnapshot, RateWindow, WINDOW_MS};

/// Persisted counter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseCounters {
    /// Resettable pulse total
    pub total: u32,
    /// Long-running accumulated total
    pub accumulated: u32,
    /// Pulses since the last persistence trigger
    pub divider: u32,
}
