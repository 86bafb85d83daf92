//! Bridge UART receive task
//!
//! Receives frames from the network bridge and applies them to the shared
//! state in [`crate::channels`].

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use pulsetherm_protocol::FrameParser;

use crate::bridge::{self, Inbound};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn bridge_rx_task(mut rx: BufferedUartRx) {
    info!("Bridge RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };
        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            match parser.feed(byte) {
                Ok(Some(frame)) => match Inbound::from_frame(&frame) {
                    Ok(message) => bridge::dispatch(message),
                    Err(e) => warn!("Failed to decode bridge message: {:?}", e),
                },
                Ok(None) => {}
                Err(e) => warn!("Frame parse error: {:?}", e),
            }
        }
    }
}
