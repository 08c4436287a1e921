//! The scan loop: throttled decoding, duplicate error suppression and the
//! cancellable driver that owns the camera for the duration of a scan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, trace, warn};

use super::decoder::{DecodeOptions, FrameDecoder};
use super::device::{CaptureDevice, Facing, StreamLease, VideoStream};
use crate::compliance::MonthPeriod;
use crate::config::ScanConfig;
use crate::error::WorkflowError;
use crate::fleet::Fleet;
use crate::workflow::{resolve, Resolution};

/// Timing and preprocessing parameters for one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    /// Period of the loop tick.
    pub tick_interval: Duration,
    /// Minimum time between two decode attempts.
    pub decode_interval: Duration,
    /// Side of the sampled square relative to the shorter frame side.
    pub roi_fraction: f32,
    /// Side of the downscaled luma image.
    pub sample_size: u32,
    /// Also try the inverted image.
    pub try_both_polarities: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            decode_interval: config.decode_interval(),
            roi_fraction: config.roi_fraction,
            sample_size: config.sample_size,
            try_both_polarities: config.try_both_polarities,
        }
    }
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Not scanning.
    #[default]
    Idle,
    /// Ticking and decoding.
    Scanning,
    /// A code resolved; the loop has stopped itself.
    Resolved(Resolution),
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller is not scanning.
    Stopped,
    /// Too soon since the last decode attempt.
    Throttled,
    /// The stream had no usable frame yet.
    NoFrame,
    /// Nothing decoded in this frame.
    NoCode,
    /// A code resolved to a unit.
    Resolved(Resolution),
    /// A decoded code failed resolution and should be shown.
    Rejected {
        /// The decoded string.
        raw: String,
        /// Why it was rejected.
        error: WorkflowError,
    },
    /// Same failing code as last time; not reported again.
    Suppressed {
        /// The decoded string.
        raw: String,
    },
}

/// Scan loop state machine.
///
/// `Idle -> Scanning -> Resolved`, with rejected codes reported while the
/// controller stays in `Scanning`. [`ScanController::stop`] returns to `Idle`
/// from any state.
#[derive(Debug, Clone)]
pub struct ScanController {
    settings: ScanSettings,
    state: ScanState,
    last_decode_at: Option<Instant>,
    last_error: Option<String>,
}

impl ScanController {
    /// Create an idle controller.
    #[must_use]
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            state: ScanState::Idle,
            last_decode_at: None,
            last_error: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// The settings in use.
    #[must_use]
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// The raw string whose error is currently shown, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Begin scanning.
    pub fn start(&mut self) {
        self.state = ScanState::Scanning;
        self.last_decode_at = None;
    }

    /// Stop scanning and forget the suppressed code.
    pub fn stop(&mut self) {
        self.state = ScanState::Idle;
        self.last_decode_at = None;
        self.last_error = None;
    }

    /// Dismiss the current error so the same code is reported again.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Whether a decode attempt is allowed at `now`.
    #[must_use]
    pub fn should_decode(&self, now: Instant) -> bool {
        self.last_decode_at
            .map_or(true, |last| {
                now.saturating_duration_since(last) >= self.settings.decode_interval
            })
    }

    /// Run one tick: maybe decode the current frame and resolve the result.
    pub fn tick(
        &mut self,
        now: Instant,
        stream: &mut dyn VideoStream,
        decoder: &dyn FrameDecoder,
        fleet: &Fleet,
        period: MonthPeriod,
    ) -> TickOutcome {
        if self.state != ScanState::Scanning {
            return TickOutcome::Stopped;
        }
        if !self.should_decode(now) {
            return TickOutcome::Throttled;
        }

        let Some(frame) = stream.current_frame() else {
            return TickOutcome::NoFrame;
        };
        let region = frame.center_square(self.settings.roi_fraction);
        let Some(image) = frame.sample_luma(region, self.settings.sample_size) else {
            return TickOutcome::NoFrame;
        };

        self.last_decode_at = Some(now);
        let options = DecodeOptions {
            try_both_polarities: self.settings.try_both_polarities,
        };
        let Some(raw) = decoder.decode(&image, options) else {
            return TickOutcome::NoCode;
        };
        trace!(raw = %raw, "Decoded candidate code");

        match resolve(&raw, fleet, period) {
            Ok(resolution) => {
                self.last_error = None;
                self.state = ScanState::Resolved(resolution.clone());
                TickOutcome::Resolved(resolution)
            }
            Err(_) if self.last_error.as_deref() == Some(raw.as_str()) => {
                TickOutcome::Suppressed { raw }
            }
            Err(error) => {
                debug!(raw = %raw, error = %error, "Scanned code rejected");
                self.last_error = Some(raw.clone());
                TickOutcome::Rejected { raw, error }
            }
        }
    }
}

/// A handle to cancel a running scan from another task.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    stop_signal: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the scan to stop at the next tick.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Reset the stop signal.
    pub fn reset(&self) {
        self.stop_signal.store(false, Ordering::SeqCst);
    }
}

/// Progress reported while a scan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The camera is open and ticking.
    Started {
        /// Device name.
        device: &'static str,
    },
    /// A decoded code was rejected.
    Rejected {
        /// The decoded string.
        raw: String,
        /// Why it was rejected.
        error: WorkflowError,
    },
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanExit {
    /// A code resolved.
    Resolved(Resolution),
    /// Stopped by the handle or because the listener went away.
    Cancelled,
    /// The camera could not be opened; fall back to manual entry.
    DeviceUnavailable(WorkflowError),
}

/// Drives a [`ScanController`] against a capture device.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    settings: ScanSettings,
}

impl Scanner {
    /// Create a scanner with the given settings.
    #[must_use]
    pub fn new(settings: ScanSettings) -> Self {
        Self { settings }
    }

    /// Scan until a code resolves or `handle` is stopped.
    ///
    /// Runs on the caller's task, one tick per `tick_interval`. The stream is
    /// released exactly once whichever way the scan ends. Rejections are
    /// sent on `events`; a closed channel cancels the scan.
    pub async fn run(
        &self,
        device: &dyn CaptureDevice,
        decoder: &dyn FrameDecoder,
        fleet: &Fleet,
        period: MonthPeriod,
        handle: &ScanHandle,
        events: &mpsc::Sender<ScanEvent>,
    ) -> ScanExit {
        let mut lease = match StreamLease::acquire(device, Facing::Environment).await {
            Ok(lease) => lease,
            Err(error) => {
                warn!(device = device.name(), error = %error, "Camera unavailable, switching to manual entry");
                return ScanExit::DeviceUnavailable(error);
            }
        };

        info!(
            device = device.name(),
            tick_ms = self.settings.tick_interval.as_millis(),
            "Starting scan"
        );
        if events
            .send(ScanEvent::Started {
                device: device.name(),
            })
            .await
            .is_err()
        {
            debug!("Scan event channel closed, stopping scan");
            return ScanExit::Cancelled;
        }

        let mut controller = ScanController::new(self.settings);
        controller.start();
        let mut ticker = interval(self.settings.tick_interval);

        let exit = loop {
            ticker.tick().await;
            if handle.should_stop() {
                break ScanExit::Cancelled;
            }
            let Some(stream) = lease.stream() else {
                break ScanExit::Cancelled;
            };

            match controller.tick(Instant::now(), stream, decoder, fleet, period) {
                TickOutcome::Resolved(resolution) => break ScanExit::Resolved(resolution),
                TickOutcome::Rejected { raw, error } => {
                    if events.send(ScanEvent::Rejected { raw, error }).await.is_err() {
                        debug!("Scan event channel closed, stopping scan");
                        break ScanExit::Cancelled;
                    }
                }
                _ => {}
            }
        };

        controller.stop();
        lease.release();
        debug!(exit = ?exit, "Scan finished");
        exit
    }
}
