//! Acquisition loop scheduler
//!
//! The scheduler owns the device configuration and all timing state. The
//! firmware calls [`Scheduler::tick`] with a monotonic millisecond clock
//! every loop iteration; each tick runs these steps in order:
//!
//! 1. Recompute the pulse rate window
//! 2. Save counters if the persist divider fired (retried until a save succeeds)
//! 3. Poll the sensor when the poll interval has elapsed
//! 4. Upload counters if the upload divider fired
//! 5. Serve at most one admin request
//! 6. Rotate the display page every [`PAGE_INTERVAL_MS`]
//!
//! No step's failure stops a later one. Errors are recorded in the status
//! and returned in the [`TickReport`].

use pulsetherm_protocol::modbus::{ProtocolError, ReadRequest};

use super::status::{
    AcquisitionStatus, RestartReason, SendStatus, StatusReport, TickOutcome, TickReport,
};
use crate::acquisition::SensorReading;
use crate::config::{DeviceConfig, Settings, SettingsUpdate, UploadUpdate};
use crate::counter::{PulseCounter, PulseSnapshot, RateWindow};
use crate::pages::{render, Page, PageContext, DEFAULT_UTC_OFFSET_S};
use crate::traits::{
    ApplyResult, Clock, ControlPlane, ControlRequest, ControlResponse, CounterUpload, Display,
    DisplayError, Persistence, PersistenceError, RegisterSensor, Reporting, TemperatureUpload, TransportError,
};

/// Time each display page stays up
pub const PAGE_INTERVAL_MS: u32 = 2_000;

/// Everything outside the core the scheduler talks to
pub struct Collaborators<S, P, R, D, C, K> {
    pub sensor: S,
    pub persistence: P,
    pub reporting: R,
    pub display: D,
    pub control: C,
    pub clock: K,
}

/// Result of restoring persisted state at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartupReport {
    /// Configuration load; defaults are used on error
    pub config: Result<(), PersistenceError>,
    /// Counter load; counters start at zero on error
    pub counters: Result<(), PersistenceError>,
    /// Boot screen push
    pub display: Result<(), DisplayError>,
}

/// Cooperative scheduler for one sensor and one pulse input
pub struct Scheduler<'a, S, P, R, D, C, K> {
    counter: &'a PulseCounter,
    io: Collaborators<S, P, R, D, C, K>,
    config: DeviceConfig,
    window: RateWindow,
    /// Latest pulse snapshot (taken at the start of each tick)
    pulses: PulseSnapshot,
    /// Last poll attempt, boot time until the first poll
    last_poll: u32,
    /// Last temperature upload, boot time until the first upload
    last_upload: u32,
    /// Last successful scaled reading
    last_value_x10: Option<u32>,
    page: Page,
    page_timer: u32,
    acquisition: AcquisitionStatus,
    last_error: Option<ProtocolError>,
    last_reading_unix: Option<u32>,
    last_temperature_send: SendStatus,
    last_counter_send: SendStatus,
    restart_required: bool,
    utc_offset_s: i32,
    startup: StartupReport,
}

impl<'a, S, P, R, D, C, K> Scheduler<'a, S, P, R, D, C, K>
where
    S: RegisterSensor,
    P: Persistence,
    R: Reporting,
    D: Display,
    C: ControlPlane,
    K: Clock,
{
    /// Restore configuration and counters and show the boot screen
    ///
    /// Missing or unreadable records fall back to defaults; see
    /// [`startup`](Self::startup) for what happened.
    pub fn new(
        counter: &'a PulseCounter,
        mut io: Collaborators<S, P, R, D, C, K>,
        now_ms: u32,
    ) -> Self {
        let (config, config_loaded) = match io.persistence.load_config() {
            Ok(config) => (config, Ok(())),
            Err(e) => (DeviceConfig::default(), Err(e)),
        };
        counter.configure(&config.counting);

        let counters_loaded = match io.persistence.load_counters() {
            Ok(counters) => {
                counter.restore(&counters);
                Ok(())
            }
            Err(e) => Err(e),
        };

        let mut scheduler = Self {
            counter,
            io,
            config,
            window: RateWindow::new(now_ms),
            pulses: PulseSnapshot::default(),
            last_poll: now_ms,
            last_upload: now_ms,
            last_value_x10: None,
            page: Page::Temperature,
            page_timer: now_ms,
            acquisition: AcquisitionStatus::NotYetRead,
            last_error: None,
            last_reading_unix: None,
            last_temperature_send: SendStatus::Never,
            last_counter_send: SendStatus::Never,
            restart_required: false,
            utc_offset_s: DEFAULT_UTC_OFFSET_S,
            startup: StartupReport {
                config: config_loaded,
                counters: counters_loaded,
                display: Ok(()),
            },
        };
        scheduler.pulses = scheduler.window.snapshot(counter, now_ms);
        scheduler.startup.display = scheduler.show_page(false);
        scheduler
    }

    /// Override the local time offset used on the display
    pub fn with_utc_offset(mut self, utc_offset_s: i32) -> Self {
        self.utc_offset_s = utc_offset_s;
        self
    }

    /// What was restored at construction
    pub fn startup(&self) -> StartupReport {
        self.startup
    }

    /// Run one loop iteration
    pub fn tick(&mut self, now_ms: u32) -> TickReport {
        let mut report = TickReport::default();

        self.pulses = self.window.snapshot(self.counter, now_ms);
        if self.pulses.window_closed {
            report.window_closed = Some(self.pulses.display_rate);
        }

        // Pulses arriving during the save raise the trigger again
        if self.counter.take_persist() {
            let result = self.io.persistence.save_counters(&self.counter.counters());
            if result.is_err() {
                self.counter.request_persist();
            }
            report.counters_saved = Some(result);
        }

        if now_ms.wrapping_sub(self.last_poll) >= self.config.acquisition.poll_interval_ms {
            self.last_poll = now_ms;
            if self.config.acquisition.enabled {
                let result = self.poll(now_ms, &mut report);
                report.reading = Some(result);
            } else {
                self.acquisition = AcquisitionStatus::Disabled;
                self.last_value_x10 = None;
            }
            if self.page == Page::Temperature {
                self.push_page(true, &mut report);
            }
        }

        // A disabled counter keeps the trigger for when counting resumes
        if self.pulses.upload_signal && self.config.counting.enabled {
            self.counter.take_upload();
            let upload = CounterUpload {
                total: self.pulses.total,
                accumulated: self.pulses.accumulated,
                rate_per_minute: self.pulses.display_rate,
            };
            let result = self.io.reporting.send_counter(&self.config.upload, &upload);
            self.last_counter_send = send_status(result);
            report.counter_sent = Some(result);
        }

        if let Some(request) = self.io.control.poll_request() {
            report.control_served = true;
            let response = match self.serve(request, now_ms) {
                Some(response) => response,
                None => {
                    self.io.control.respond(&ControlResponse::Restarting);
                    report.outcome = TickOutcome::Restart(RestartReason::OperatorReset);
                    return report;
                }
            };
            self.io.control.respond(&response);
        }

        if now_ms.wrapping_sub(self.page_timer) >= PAGE_INTERVAL_MS {
            self.page_timer = now_ms;
            self.page = self.page.next();
            self.push_page(false, &mut report);
        }

        report
    }

    /// Read the sensor and upload the scaled value when the upload is due
    fn poll(
        &mut self,
        now_ms: u32,
        report: &mut TickReport,
    ) -> Result<SensorReading, ProtocolError> {
        let acq = self.config.acquisition;
        let request = ReadRequest::new(
            acq.slave_address,
            acq.function_code,
            acq.register_address,
            acq.register_count,
        );

        let result = self.io.sensor.read(&request, now_ms);
        self.last_reading_unix = self.io.clock.unix_time();

        match result {
            Ok(reading) => {
                let value_x10 = reading.scaled_x10(acq.scale_factor_percent);
                self.acquisition = AcquisitionStatus::Ok { value_x10 };
                self.last_value_x10 = Some(value_x10);

                if now_ms.wrapping_sub(self.last_upload) >= self.config.upload.interval.as_ms() {
                    let sample = TemperatureUpload {
                        value_x10,
                        scale_factor_percent: acq.scale_factor_percent,
                    };
                    let sent = self
                        .io
                        .reporting
                        .send_temperature(&self.config.upload, &sample);
                    self.last_temperature_send = send_status(sent);
                    self.last_upload = now_ms;
                    report.temperature_sent = Some(sent);
                }
            }
            Err(e) => {
                self.acquisition = AcquisitionStatus::Failed(e);
                self.last_error = Some(e);
            }
        }

        result
    }

    /// Answer an admin request; `None` means restart
    fn serve(&mut self, request: ControlRequest, now_ms: u32) -> Option<ControlResponse> {
        let response = match request {
            ControlRequest::GetSettings => ControlResponse::Settings(self.settings()),
            ControlRequest::GetUpload => ControlResponse::Upload(self.config.upload.clone()),
            ControlRequest::ApplySettings(update) => {
                ControlResponse::Applied(self.apply_settings(&update, now_ms))
            }
            ControlRequest::ApplyUpload(update) => {
                ControlResponse::Applied(self.apply_upload(&update))
            }
            ControlRequest::ResetCounters => {
                ControlResponse::CountersReset(self.reset_counters().err())
            }
            ControlRequest::ResetAccumulator => {
                ControlResponse::CountersReset(self.reset_accumulator().err())
            }
            ControlRequest::ResetDevice => return None,
            ControlRequest::Status => ControlResponse::Status(self.status()),
        };
        Some(response)
    }

    fn push_page(&mut self, poll_result: bool, report: &mut TickReport) {
        let shown = self.show_page(poll_result);
        report.page_shown = Some(self.page);
        report.display = Some(report.display.unwrap_or(Ok(())).and(shown));
    }

    fn show_page(&mut self, poll_result: bool) -> Result<(), DisplayError> {
        let connectivity = self.io.control.connectivity();
        let ctx = PageContext {
            acquisition: &self.acquisition,
            last_value_x10: self.last_value_x10,
            poll_result,
            counting_enabled: self.config.counting.enabled,
            pulses: &self.pulses,
            connectivity: &connectivity,
            reading_time: self.last_reading_unix,
            now: self.io.clock.unix_time(),
            utc_offset_s: self.utc_offset_s,
        };
        let lines = render(self.page, &ctx);
        self.io.display.show(&lines)
    }

    /// Current tunable settings
    pub fn settings(&self) -> Settings {
        Settings::from_config(&self.config)
    }

    /// Current configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Apply acquisition, counting and network settings and save them
    ///
    /// Acquisition and counting changes take effect on the next tick.
    /// Network changes are saved but need a restart.
    pub fn apply_settings(&mut self, update: &SettingsUpdate, now_ms: u32) -> ApplyResult {
        let summary = update.apply_to(&mut self.config);

        self.counter.configure(&self.config.counting);
        self.counter.clear_divider();
        if summary.counting_reenabled {
            self.window.restart(self.counter, now_ms);
        }
        if summary.network_changed {
            self.restart_required = true;
        }

        ApplyResult {
            rejected: summary.rejected,
            save_error: self.io.persistence.save_config(&self.config).err(),
            restart_required: self.restart_required,
        }
    }

    /// Apply upload target settings and save them
    pub fn apply_upload(&mut self, update: &UploadUpdate) -> ApplyResult {
        let summary = update.apply_to(&mut self.config);
        self.counter.configure(&self.config.counting);

        ApplyResult {
            rejected: summary.rejected,
            save_error: self.io.persistence.save_config(&self.config).err(),
            restart_required: self.restart_required,
        }
    }

    /// Zero the resettable total and save the counters
    pub fn reset_counters(&mut self) -> Result<(), PersistenceError> {
        self.counter.reset_counters();
        self.io.persistence.save_counters(&self.counter.counters())
    }

    /// Zero the accumulated and resettable totals and save the counters
    pub fn reset_accumulator(&mut self) -> Result<(), PersistenceError> {
        self.counter.reset_accumulator();
        self.io.persistence.save_counters(&self.counter.counters())
    }

    /// Request a firmware restart
    pub fn reset_device(&self) -> TickOutcome {
        TickOutcome::Restart(RestartReason::OperatorReset)
    }

    /// Whether saved network settings wait for a restart
    pub fn restart_required(&self) -> bool {
        self.restart_required
    }

    /// Currently displayed page
    pub fn page(&self) -> Page {
        self.page
    }

    /// Dashboard status
    pub fn status(&self) -> StatusReport {
        StatusReport {
            acquisition: self.acquisition,
            last_error: self.last_error,
            last_reading_unix: self.last_reading_unix,
            last_temperature_send: self.last_temperature_send,
            last_counter_send: self.last_counter_send,
            total: self.pulses.total,
            accumulated: self.pulses.accumulated,
            display_rate: self.pulses.display_rate,
            counting_enabled: self.config.counting.enabled,
            acquisition_enabled: self.config.acquisition.enabled,
            clock_synced: self.io.clock.unix_time().is_some(),
            restart_required: self.restart_required,
        }
    }

    /// Give back the collaborators
    pub fn release(self) -> Collaborators<S, P, R, D, C, K> {
        self.io
    }
}

fn send_status(result: Result<(), TransportError>) -> SendStatus {
    match result {
        Ok(()) => SendStatus::Sent,
        Err(e) => SendStatus::Failed(e),
    }
}
