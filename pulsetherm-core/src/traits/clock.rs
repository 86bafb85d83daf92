//! Time source trait

/// Wall clock
///
/// Monotonic time is passed to [`Scheduler::tick`] directly; this trait
/// only supplies calendar time for the display and status report.
///
/// [`Scheduler::tick`]: crate::scheduler::Scheduler::tick
pub trait Clock {
    /// Seconds since the Unix epoch (UTC), or `None` until time is known
    fn unix_time(&self) -> Option<u32>;
}
