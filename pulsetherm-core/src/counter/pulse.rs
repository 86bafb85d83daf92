//! Interrupt-shared pulse counter

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use super::PulseCounters;
use crate::config::CountingConfig;

/// Pulse counter shared between the pulse interrupt and the scheduler
///
/// Intended to live in a `static`. The interrupt calls [`on_pulse`]; the
/// scheduler reads counters, consumes signals and applies resets. Signals
/// are level flags: any number of triggers before the scheduler acts
/// collapse into one.
///
/// [`on_pulse`]: PulseCounter::on_pulse
#[derive(Debug)]
pub struct PulseCounter {
    total: AtomicU32,
    accumulated: AtomicU32,
    divider: AtomicU32,
    upload_accum: AtomicU32,
    window_pulses: AtomicU32,
    persist_divider: AtomicU32,
    upload_divider: AtomicU32,
    enabled: AtomicBool,
    persist_pending: AtomicBool,
    upload_pending: AtomicBool,
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseCounter {
    /// Create a counter with default dividers (10/10) and counting enabled
    pub const fn new() -> Self {
        Self {
            total: AtomicU32::new(0),
            accumulated: AtomicU32::new(0),
            divider: AtomicU32::new(0),
            upload_accum: AtomicU32::new(0),
            window_pulses: AtomicU32::new(0),
            persist_divider: AtomicU32::new(10),
            upload_divider: AtomicU32::new(10),
            enabled: AtomicBool::new(true),
            persist_pending: AtomicBool::new(false),
            upload_pending: AtomicBool::new(false),
        }
    }

    /// Record one pulse (interrupt context)
    pub fn on_pulse(&self) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }

        self.total.fetch_add(1, Ordering::Relaxed);
        self.accumulated.fetch_add(1, Ordering::Relaxed);
        self.window_pulses.fetch_add(1, Ordering::Relaxed);

        let upload = self.upload_accum.fetch_add(1, Ordering::Relaxed) + 1;
        if upload >= self.upload_divider.load(Ordering::Relaxed) {
            self.upload_accum.store(0, Ordering::Relaxed);
            self.upload_pending.store(true, Ordering::Relaxed);
        }

        let divider = self.divider.fetch_add(1, Ordering::Relaxed) + 1;
        if divider >= self.persist_divider.load(Ordering::Relaxed) {
            self.divider.store(0, Ordering::Relaxed);
            self.persist_pending.store(true, Ordering::Relaxed);
        }
    }

    /// Apply dividers and the enable flag
    pub fn configure(&self, config: &CountingConfig) {
        self.persist_divider
            .store(config.persist_divider.max(1), Ordering::Relaxed);
        self.upload_divider
            .store(config.upload_divider.max(1), Ordering::Relaxed);
        self.enabled.store(config.enabled, Ordering::Relaxed);
    }

    /// Whether pulses are being counted
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Load persisted counter values
    pub fn restore(&self, counters: &PulseCounters) {
        self.total.store(counters.total, Ordering::Relaxed);
        self.accumulated
            .store(counters.accumulated, Ordering::Relaxed);
        self.divider.store(counters.divider, Ordering::Relaxed);
    }

    /// Current persisted counter values
    pub fn counters(&self) -> PulseCounters {
        PulseCounters {
            total: self.total.load(Ordering::Relaxed),
            accumulated: self.accumulated.load(Ordering::Relaxed),
            divider: self.divider.load(Ordering::Relaxed),
        }
    }

    /// Pulses counted in the current rate window
    pub fn window_pulses(&self) -> u32 {
        self.window_pulses.load(Ordering::Relaxed)
    }

    /// Read and zero the window pulse count
    pub fn take_window_pulses(&self) -> u32 {
        self.window_pulses.swap(0, Ordering::Relaxed)
    }

    /// Whether a counter save has been triggered
    pub fn persist_pending(&self) -> bool {
        self.persist_pending.load(Ordering::Relaxed)
    }

    /// Consume the save trigger, returning whether it was set
    ///
    /// Taken before the save starts, so a trigger raised during the save
    /// stays set for the next tick.
    pub fn take_persist(&self) -> bool {
        self.persist_pending.swap(false, Ordering::Relaxed)
    }

    /// Re-arm the save trigger after a failed save
    pub fn request_persist(&self) {
        self.persist_pending.store(true, Ordering::Relaxed);
    }

    /// Whether a counter upload has been triggered
    pub fn upload_pending(&self) -> bool {
        self.upload_pending.load(Ordering::Relaxed)
    }

    /// Consume the upload trigger, returning whether it was set
    pub fn take_upload(&self) -> bool {
        self.upload_pending.swap(false, Ordering::Relaxed)
    }

    /// Zero the pulses-since-save counter
    pub fn clear_divider(&self) {
        self.divider.store(0, Ordering::Relaxed);
    }

    /// Zero the resettable total and the pulses-since-save counter
    pub fn reset_counters(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.divider.store(0, Ordering::Relaxed);
    }

    /// Zero the accumulated total along with the resettable counters
    pub fn reset_accumulator(&self) {
        self.accumulated.store(0, Ordering::Relaxed);
        self.reset_counters();
    }
}
