//! Collaborator traits
//!
//! These traits define the interface between the scheduler and everything
//! outside the acquisition core: storage, the upload transport, the local
//! display, the admin interface and time sources.

pub mod clock;
pub mod control;
pub mod display;
pub mod persistence;
pub mod reporting;
pub mod sensor;

pub use clock::Clock;
pub use control::{ApplyResult, Connectivity, ControlPlane, ControlRequest, ControlResponse};
pub use display::{Display, DisplayError, DisplayLine, LINE_WIDTH};
pub use persistence::{Persistence, PersistenceError};
pub use reporting::{CounterUpload, Reporting, TemperatureUpload, TransportError};
pub use sensor::RegisterSensor;
