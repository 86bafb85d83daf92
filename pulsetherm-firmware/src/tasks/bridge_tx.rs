//! Bridge UART transmit task
//!
//! Drains the outbox and keeps the link alive with a periodic heartbeat.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{Duration, Ticker};
use embedded_io_async::Write;

use pulsetherm_protocol::link::MAX_FRAME_SIZE;
use pulsetherm_protocol::Frame;

use crate::bridge;
use crate::channels::OUTBOX;

/// Interval between heartbeat frames
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

#[embassy_executor::task]
pub async fn bridge_tx_task(mut tx: BufferedUartTx) {
    info!("Bridge TX task started");

    let mut heartbeat = Ticker::every(HEARTBEAT_INTERVAL);

    loop {
        let frame = match select(OUTBOX.receive(), heartbeat.next()).await {
            Either::First(frame) => frame,
            Either::Second(()) => match bridge::heartbeat() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to build heartbeat: {:?}", e);
                    continue;
                }
            },
        };
        send(&mut tx, &frame).await;
    }
}

async fn send(tx: &mut BufferedUartTx, frame: &Frame) {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    match frame.encode(&mut buf) {
        Ok(len) => {
            if let Err(e) = tx.write_all(&buf[..len]).await {
                warn!("Failed to send frame {:#x}: {:?}", frame.msg_type, e);
            } else {
                trace!("Frame {:#x} sent ({} bytes)", frame.msg_type, len);
            }
        }
        Err(e) => warn!("Failed to encode frame: {:?}", e),
    }
}
