use embassy_time::Duration;

/// How often a running playback checks whether it was cancelled.
/// Cancellation latency is bounded by this interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tuning of a [`HapticPlayer`](crate::HapticPlayer)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Interval at which waits are interrupted to check for cancellation
    pub(crate) poll_interval: Duration,
    /// Scale applied to the intensity of every pulse before it is clamped.
    /// This may be useful to scale down haptics on a device with a strong vibrator for example.
    pub(crate) scale: f32,
    /// Upper bound for a whole playback unless a call overrides it
    pub(crate) timeout: Option<Duration>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            scale: 1.0,
            timeout: None,
        }
    }
}

impl PlayerSettings {
    /// Set the cancellation poll interval. Anything below one millisecond is raised to it
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set a scale for the intensity of all pulses
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Fail every playback which takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
