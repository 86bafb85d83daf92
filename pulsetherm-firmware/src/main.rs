//! Pulsetherm - Temperature and Pulse Counter Firmware
//!
//! Main firmware binary for RP2040 boards. Polls a PT100 transmitter over
//! Modbus RTU, counts pulses from a flow or rotation sensor and reports
//! both to a 16x2 LCD and, through the network bridge, to a collector.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUart};
use embassy_time::{with_timeout, Delay, Duration, Instant, Ticker, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pulsetherm_core::acquisition::ProtocolClient;
use pulsetherm_core::scheduler::{Collaborators, Scheduler, TickOutcome, TickReport};
use pulsetherm_core::storage::RecordPersistence;
use pulsetherm_core::traits::Display;
use pulsetherm_drivers::display::{Lcd1602, DEFAULT_ADDRESS};
use pulsetherm_hal::uart::UartConfig;
use pulsetherm_hal_rp2040::flash::Rp2040RecordStore;
use pulsetherm_hal_rp2040::uart::{embassy_config, Rp2040SerialBus};

use crate::board::{Board, BRIDGE_BAUDRATE, LCD_I2C_FREQUENCY};
use crate::bridge::{BridgeClock, BridgeControl, BridgeReporter};
use crate::channels::{LINK_UP, PULSES};

mod board;
mod bridge;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

/// Runs the pulse task above the thread-mode scheduler loop
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Scheduler loop period
const TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Time the bridge gets to join the network after boot
const LINK_TIMEOUT: Duration = Duration::from_secs(15);

/// Time the link failure stays on screen before the reset
const LINK_FAIL_HOLD: Duration = Duration::from_secs(5);

// Static cells for UART buffers (must live forever)
static SENSOR_TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static SENSOR_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static BRIDGE_TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static BRIDGE_RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pulsetherm firmware starting...");

    let board = Board::new(embassy_rp::init(Default::default()));
    info!("Peripherals initialized");

    // Record storage in the last 64KB of flash
    let persistence =
        RecordPersistence::new(Rp2040RecordStore::new(board.flash, board.flash_dma));

    // LCD on I2C0
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = LCD_I2C_FREQUENCY;
    let i2c = I2c::new_blocking(board.lcd_i2c, board.lcd_scl, board.lcd_sda, i2c_config);
    let mut lcd = Lcd1602::new(i2c, Delay, DEFAULT_ADDRESS);
    if let Err(e) = lcd.init() {
        warn!("LCD init failed: {:?}", e);
    }

    // RS-485 sensor bus on UART0
    let sensor_uart = BufferedUart::new(
        board.sensor_uart,
        board.sensor_tx,
        board.sensor_rx,
        Irqs,
        SENSOR_TX_BUF.init([0u8; 64]),
        SENSOR_RX_BUF.init([0u8; 256]),
        embassy_config(&UartConfig::sensor_bus()),
    );
    let sensor = ProtocolClient::new(Rp2040SerialBus::new(sensor_uart), Delay);
    info!("Sensor bus initialized");

    // Network bridge on UART1
    let mut bridge_config = uart::Config::default();
    bridge_config.baudrate = BRIDGE_BAUDRATE;
    let bridge_uart = BufferedUart::new(
        board.bridge_uart,
        board.bridge_tx,
        board.bridge_rx,
        Irqs,
        BRIDGE_TX_BUF.init([0u8; 512]),
        BRIDGE_RX_BUF.init([0u8; 512]),
        bridge_config,
    );
    let (bridge_tx, bridge_rx) = bridge_uart.split();
    unwrap!(spawner.spawn(tasks::bridge_rx_task(bridge_rx)));
    unwrap!(spawner.spawn(tasks::bridge_tx_task(bridge_tx)));
    info!("Bridge link initialized");

    // Pulse input, preempting the scheduler loop
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    unwrap!(high_spawner.spawn(tasks::pulse_task(board.pulse)));

    let io = Collaborators {
        sensor,
        persistence,
        reporting: BridgeReporter,
        display: lcd,
        control: BridgeControl,
        clock: BridgeClock,
    };
    let mut scheduler = Scheduler::new(&PULSES, io, now_ms());

    let startup = scheduler.startup();
    match startup.config {
        Ok(()) => info!("Configuration loaded"),
        Err(e) => warn!("Using default configuration: {}", e.as_str()),
    }
    match startup.counters {
        Ok(()) => info!("Counters restored: {:?}", PULSES.counters()),
        Err(e) => warn!("Counters start at zero: {}", e.as_str()),
    }
    if let Err(e) = startup.display {
        warn!("Boot screen failed: {:?}", e);
    }

    // The bridge joins the network with the stored identity
    if let Err(e) = bridge::announce_network(&scheduler.config().network) {
        warn!("Failed to queue network config: {:?}", e);
    }

    if with_timeout(LINK_TIMEOUT, LINK_UP.wait()).await.is_err() {
        error!("Bridge did not connect, resetting");
        let mut io = scheduler.release();
        let _ = io.display.write_line(0, "WiFi fail");
        let _ = io.display.write_line(1, "");
        Timer::after(LINK_FAIL_HOLD).await;
        cortex_m::peripheral::SCB::sys_reset();
    }
    info!("Bridge connected");

    let mut ticker = Ticker::every(TICK_INTERVAL);
    loop {
        let report = scheduler.tick(now_ms());
        log_tick(&report);

        if let TickOutcome::Restart(reason) = report.outcome {
            info!("Restarting: {:?}", reason);
            // Let the bridge TX task flush the response
            Timer::after_millis(100).await;
            cortex_m::peripheral::SCB::sys_reset();
        }

        ticker.next().await;
    }
}

/// Monotonic milliseconds for the scheduler (wraps after ~49 days)
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Log what a scheduler tick did
fn log_tick(report: &TickReport) {
    if let Some(rate) = report.window_closed {
        debug!("Rate window closed: {} pulses/min", rate);
    }
    match report.counters_saved {
        Some(Ok(())) => trace!("Counters saved"),
        Some(Err(e)) => warn!("Counter save failed: {}", e.as_str()),
        None => {}
    }
    match report.reading {
        Some(Ok(reading)) => debug!("Sensor raw={}", reading.raw_register),
        Some(Err(e)) => warn!("Sensor read failed: {}", e.as_str()),
        None => {}
    }
    if let Some(Err(e)) = report.temperature_sent {
        warn!("Temperature upload failed: {:?}", e);
    }
    if let Some(Err(e)) = report.counter_sent {
        warn!("Counter upload failed: {:?}", e);
    }
    if report.control_served {
        debug!("Control request served");
    }
    if let Some(page) = report.page_shown {
        trace!("Page shown: {:?}", page);
    }
    if let Some(Err(e)) = report.display {
        warn!("Display update failed: {:?}", e);
    }
}
