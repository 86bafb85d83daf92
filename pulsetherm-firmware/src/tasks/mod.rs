//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! The scheduler itself runs in the main task.

pub mod bridge_rx;
pub mod bridge_tx;
pub mod pulse;

pub use bridge_rx::bridge_rx_task;
pub use bridge_tx::bridge_tx_task;
pub use pulse::pulse_task;
