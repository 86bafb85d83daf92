//! Cooperative acquisition scheduler
//!
//! One `tick(now)` per loop iteration drives the rate window, counter
//! persistence, sensor polling, uploads, the admin interface and the
//! display rotation.

pub mod executor;
pub mod status;

pub use executor::{Collaborators, Scheduler, StartupReport, PAGE_INTERVAL_MS};
pub use status::{
    AcquisitionStatus, RestartReason, SendStatus, StatusReport, TickOutcome, TickReport,
};
