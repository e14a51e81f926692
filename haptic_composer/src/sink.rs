//! # Vibration sinks
//! A [`HapticSink`] is the device specific part of the haptic system. It turns a single
//! [`Effect`] into an actual vibration. The player never talks to hardware directly,
//! so any platform bridge only needs to implement this trait.

use core::fmt::Debug;
use core::future;

use embassy_time::Duration;
use log::{info, warn};
use thiserror::Error;

/// Longest single pulse a sink accepts unless it reports something else
pub const MAX_PULSE_DURATION: Duration = Duration::from_secs(10);

/// Failures a platform bridge may report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("device does not support vibration")]
    NoVibrator,
    #[error("failed to trigger vibration: {0}")]
    Vibration(String),
    #[error("failed to release the vibrator: {0}")]
    Release(String),
}

/// A single pulse as handed to a sink.
/// All values are already clamped into the range the sink is able to play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effect {
    pub intensity: f32,
    pub duration: Duration,
    pub sharpness: Option<f32>,
}

/// Clamp into 0.0 to 1.0, treating NaN as 0.0
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl Effect {
    /// Build an effect, silently clamping every value into its playable range
    pub fn clamped(
        intensity: f32,
        duration: Duration,
        sharpness: Option<f32>,
        max_duration: Duration,
    ) -> Self {
        let min_duration = Duration::from_millis(1);
        Self {
            intensity: unit(intensity),
            duration: duration.max(min_duration).min(max_duration.max(min_duration)),
            sharpness: sharpness.map(unit),
        }
    }

    /// Intensity mapped onto the 0 to 255 amplitude range of one-shot vibration APIs
    pub fn amplitude(&self) -> u8 {
        (unit(self.intensity) * 255.0) as u8
    }
}

/// The device capability the player drives
pub trait HapticSink {
    type Error: Debug;

    /// Prepare the vibrator. Returns whether the device is able to vibrate
    fn initialize(&mut self) -> impl future::Future<Output = Result<bool, Self::Error>>;

    /// Play a single pulse. This is best effort and failures are tolerated by the player
    fn trigger(&mut self, effect: Effect) -> impl future::Future<Output = Result<(), Self::Error>>;

    fn is_supported(&mut self) -> impl future::Future<Output = Result<bool, Self::Error>>;

    /// Stop any ongoing vibration and free the device
    fn release(&mut self) -> impl future::Future<Output = Result<(), Self::Error>>;

    /// Longest pulse this sink is able to play in one go
    fn max_duration(&self) -> Duration {
        MAX_PULSE_DURATION
    }
}

/// A sink which only writes every effect to the log.
/// Useful on hosts without a vibrator and for previewing patterns.
pub struct LogSink {
    supported: bool,
    initialized: bool,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            supported: true,
            initialized: false,
        }
    }

    /// Behave like a device without a vibrator
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            initialized: false,
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl HapticSink for LogSink {
    type Error = SinkError;

    async fn initialize(&mut self) -> Result<bool, SinkError> {
        self.initialized = true;
        Ok(self.supported)
    }

    async fn trigger(&mut self, effect: Effect) -> Result<(), SinkError> {
        if !self.supported {
            return Err(SinkError::NoVibrator);
        }
        if !self.initialized {
            warn!("Vibration triggered before the sink was initialized");
        }
        info!(
            "vibrate amplitude: {:3}/255; duration: {:4}ms; sharpness: {:?}",
            effect.amplitude(),
            effect.duration.as_millis(),
            effect.sharpness
        );
        Ok(())
    }

    async fn is_supported(&mut self) -> Result<bool, SinkError> {
        Ok(self.supported)
    }

    async fn release(&mut self) -> Result<(), SinkError> {
        self.initialized = false;
        Ok(())
    }
}
