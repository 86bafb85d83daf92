//! Network bridge link
//!
//! The controller has no network stack of its own. A bridge co-processor
//! joins Wi-Fi, performs the HTTP uploads and serves the admin dashboard;
//! both sides exchange postcard-encoded messages in link frames.
//!
//! This module defines the message payloads and implements the scheduler's
//! `Reporting`, `ControlPlane` and `Clock` collaborators on top of the
//! static channels in [`crate::channels`].

use defmt::*;
use embassy_time::Instant;
use serde::{Deserialize, Serialize};

use pulsetherm_core::config::{NetworkConfig, UploadConfig};
use pulsetherm_core::traits::{
    Clock, Connectivity, ControlPlane, ControlRequest, ControlResponse, CounterUpload, Reporting,
    TemperatureUpload, TransportError,
};
use pulsetherm_protocol::link::{
    MSG_CONNECTIVITY, MSG_CONTROL_REQUEST, MSG_CONTROL_RESPONSE, MSG_COUNTER_UPLOAD,
    MSG_HEARTBEAT, MSG_NETWORK_CONFIG, MSG_TEMP_UPLOAD, MSG_TIME_SYNC, MSG_UPLOAD_FAILED,
};
use pulsetherm_protocol::{Frame, FrameError, MAX_PAYLOAD_SIZE};

use crate::channels::{CONNECTIVITY, CONTROL_REQUESTS, LINK_UP, OUTBOX, TIME_BASE};

/// Temperature sample for the collector
#[derive(Serialize)]
struct TemperatureMessage<'a> {
    host: &'a str,
    path: &'a str,
    device_id: &'a str,
    value_x10: u32,
    scale_factor_percent: u16,
}

/// Counter state for the collector
#[derive(Serialize)]
struct CounterMessage<'a> {
    host: &'a str,
    path: &'a str,
    device_id: &'a str,
    production_order_id: &'a str,
    total: u32,
    accumulated: u32,
    rate_per_minute: u32,
}

/// The bridge gave up on an upload
#[derive(Debug, Clone, Copy, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadFailure {
    /// Message type of the failed upload
    pub msg_type: u8,
    /// HTTP status, 0 if no response
    pub status: u16,
}

/// Message from the bridge
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    Control(ControlRequest),
    TimeSync(u32),
    Connectivity(Connectivity),
    UploadFailed(UploadFailure),
}

/// Errors decoding a frame from the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Frame type is not a bridge-to-controller message
    UnknownType(u8),
    /// Payload does not decode as the expected message
    Payload,
}

impl Inbound {
    /// Decode a received frame
    pub fn from_frame(frame: &Frame) -> Result<Self, DecodeError> {
        let payload = &frame.payload;
        let message = match frame.msg_type {
            MSG_CONTROL_REQUEST => Inbound::Control(decode(payload)?),
            MSG_TIME_SYNC => Inbound::TimeSync(decode(payload)?),
            MSG_CONNECTIVITY => Inbound::Connectivity(decode(payload)?),
            MSG_UPLOAD_FAILED => Inbound::UploadFailed(decode(payload)?),
            other => return Err(DecodeError::UnknownType(other)),
        };
        Ok(message)
    }
}

fn decode<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, DecodeError> {
    postcard::from_bytes(payload).map_err(|_| DecodeError::Payload)
}

/// Encode a message into a link frame
fn encode<T: Serialize>(msg_type: u8, message: &T) -> Result<Frame, FrameError> {
    let mut buffer = [0u8; MAX_PAYLOAD_SIZE];
    let payload =
        postcard::to_slice(message, &mut buffer).map_err(|_| FrameError::PayloadTooLarge)?;
    Frame::new(msg_type, payload)
}

fn queue(frame: Frame) -> Result<(), TransportError> {
    OUTBOX.try_send(frame).map_err(|_| TransportError::Busy)
}

fn link_up() -> bool {
    CONNECTIVITY.lock(|c| c.borrow().ip.is_some())
}

/// Apply a message from the bridge to the shared state
pub fn dispatch(message: Inbound) {
    match message {
        Inbound::Control(request) => {
            debug!("Control request: {:?}", request);
            if CONTROL_REQUESTS.try_send(request).is_err() {
                warn!("Control channel full, dropping request");
            }
        }
        Inbound::TimeSync(unix) => {
            let now = Instant::now().as_millis();
            TIME_BASE.lock(|t| t.set(Some((unix, now))));
            info!("Time synced: {}", unix);
        }
        Inbound::Connectivity(state) => {
            if state.ip.is_some() {
                LINK_UP.signal(());
            }
            CONNECTIVITY.lock(|c| *c.borrow_mut() = state);
        }
        Inbound::UploadFailed(failure) => {
            warn!(
                "Bridge upload failed: type={:#x} status={}",
                failure.msg_type, failure.status
            );
        }
    }
}

/// Send the network identity the bridge should join with
pub fn announce_network(network: &NetworkConfig) -> Result<(), TransportError> {
    let frame = encode(MSG_NETWORK_CONFIG, network).map_err(|_| TransportError::SendFailed)?;
    queue(frame)
}

/// Heartbeat frame carrying uptime in seconds
pub fn heartbeat() -> Result<Frame, FrameError> {
    encode(MSG_HEARTBEAT, &(Instant::now().as_secs() as u32))
}

/// Uploads handed to the bridge
pub struct BridgeReporter;

impl Reporting for BridgeReporter {
    fn send_temperature(
        &mut self,
        target: &UploadConfig,
        sample: &TemperatureUpload,
    ) -> Result<(), TransportError> {
        if !link_up() {
            return Err(TransportError::NotConnected);
        }
        let message = TemperatureMessage {
            host: &target.host,
            path: &target.temp_path,
            device_id: &target.device_id,
            value_x10: sample.value_x10,
            scale_factor_percent: sample.scale_factor_percent,
        };
        let frame = encode(MSG_TEMP_UPLOAD, &message).map_err(|_| TransportError::SendFailed)?;
        queue(frame)
    }

    fn send_counter(
        &mut self,
        target: &UploadConfig,
        counters: &CounterUpload,
    ) -> Result<(), TransportError> {
        if !link_up() {
            return Err(TransportError::NotConnected);
        }
        let message = CounterMessage {
            host: &target.host,
            path: &target.counter_path,
            device_id: &target.device_id,
            production_order_id: &target.production_order_id,
            total: counters.total,
            accumulated: counters.accumulated,
            rate_per_minute: counters.rate_per_minute,
        };
        let frame =
            encode(MSG_COUNTER_UPLOAD, &message).map_err(|_| TransportError::SendFailed)?;
        queue(frame)
    }
}

/// Admin requests relayed by the bridge
pub struct BridgeControl;

impl ControlPlane for BridgeControl {
    fn poll_request(&mut self) -> Option<ControlRequest> {
        CONTROL_REQUESTS.try_receive().ok()
    }

    fn respond(&mut self, response: &ControlResponse) {
        match encode(MSG_CONTROL_RESPONSE, response) {
            Ok(frame) => {
                if queue(frame).is_err() {
                    warn!("Outbox full, dropping control response");
                }
            }
            Err(e) => warn!("Failed to encode control response: {:?}", e),
        }
    }

    fn connectivity(&self) -> Connectivity {
        CONNECTIVITY.lock(|c| c.borrow().clone())
    }
}

/// Wall clock set by the bridge's time sync
pub struct BridgeClock;

impl Clock for BridgeClock {
    fn unix_time(&self) -> Option<u32> {
        let (unix, at_ms) = TIME_BASE.lock(|t| t.get())?;
        let elapsed_s = Instant::now().as_millis().saturating_sub(at_ms) / 1000;
        Some(unix.wrapping_add(elapsed_s as u32))
    }
}
