//! Inter-task communication channels
//!
//! Defines the static channels and shared state used between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use pulsetherm_core::counter::PulseCounter;
use pulsetherm_core::traits::{Connectivity, ControlRequest};
use pulsetherm_protocol::Frame;

/// Channel capacity for admin requests from the bridge
const CONTROL_CHANNEL_SIZE: usize = 2;

/// Channel capacity for frames waiting to go to the bridge
const OUTBOX_SIZE: usize = 4;

/// Pulse counter shared between the pulse task and the scheduler
pub static PULSES: PulseCounter = PulseCounter::new();

/// Admin requests received from the bridge
pub static CONTROL_REQUESTS: Channel<CriticalSectionRawMutex, ControlRequest, CONTROL_CHANNEL_SIZE> =
    Channel::new();

/// Frames queued for the bridge TX task
pub static OUTBOX: Channel<CriticalSectionRawMutex, Frame, OUTBOX_SIZE> = Channel::new();

/// Signal that the bridge reported an IP address
pub static LINK_UP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Latest connectivity report from the bridge
pub static CONNECTIVITY: Mutex<CriticalSectionRawMutex, RefCell<Connectivity>> =
    Mutex::new(RefCell::new(Connectivity {
        ip: None,
        rssi_dbm: None,
    }));

/// Wall clock base: unix seconds at the given uptime (ms)
pub static TIME_BASE: Mutex<CriticalSectionRawMutex, Cell<Option<(u32, u64)>>> =
    Mutex::new(Cell::new(None));
