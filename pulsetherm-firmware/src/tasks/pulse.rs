//! Pulse input task
//!
//! Counts rising edges on the pulse input. Spawned on the interrupt
//! executor, so it preempts the scheduler loop in thread mode, including
//! its blocking sensor settle delay and flash writes.

use defmt::*;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::PIN_20;
use embassy_rp::Peri;

use crate::channels::PULSES;

#[embassy_executor::task]
pub async fn pulse_task(pin: Peri<'static, PIN_20>) {
    let mut input = Input::new(pin, Pull::Down);
    info!("Pulse task started");

    loop {
        input.wait_for_rising_edge().await;
        PULSES.on_pulse();
    }
}
