//! Configuration type definitions
//!
//! The device configuration is an explicit object owned by the scheduler.
//! It is loaded once at boot, changed only through the control plane, and
//! persisted as a versioned binary record. The line-oriented format of older
//! firmware is still read for migration.

pub mod legacy;
pub mod record;
pub mod types;
pub mod update;

pub use record::{ConfigRecord, CounterRecord, RECORD_VERSION};
pub use types::{
    text, AcquisitionConfig, CountingConfig, DeviceConfig, NetworkConfig, NetworkMode,
    UploadConfig, UploadInterval,
};
pub use update::{
    ConfigError, NetworkUpdate, Settings, SettingsUpdate, UpdateSummary, UploadUpdate,
};
