use embassy_time::Duration;

use crate::ValidationError;

/// A single step of a haptic pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Vibrate the device
    Pulse(Pulse),
    /// Keep the device still
    Silence(Silence),
}

/// Vibrate with a given intensity for a given time.
/// Fields are only reachable through [`Event::pulse`] so their ranges always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    intensity: f32,
    duration_ms: u32,
    sharpness: Option<f32>,
}

/// A timed pause without any vibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Silence {
    duration_ms: u32,
}

fn check_unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

fn check_duration(duration_ms: u32) -> Result<u32, ValidationError> {
    if duration_ms == 0 {
        return Err(ValidationError::InvalidDuration(0));
    }
    Ok(duration_ms)
}

impl Event {
    /// Create a new pulse.
    /// - `intensity` must be in the range of 0.0 to 1.0
    /// - `duration_ms` must be at least 1
    /// - `sharpness` is a hint for sinks which can shape the pulse, it must also be within 0.0 to 1.0
    pub fn pulse(
        intensity: f32,
        duration_ms: u32,
        sharpness: Option<f32>,
    ) -> Result<Self, ValidationError> {
        if !check_unit(intensity) {
            return Err(ValidationError::IntensityOutOfRange(intensity));
        }
        if let Some(s) = sharpness {
            if !check_unit(s) {
                return Err(ValidationError::SharpnessOutOfRange(s));
            }
        }
        Ok(Self::Pulse(Pulse {
            intensity,
            duration_ms: check_duration(duration_ms)?,
            sharpness,
        }))
    }

    /// Create a new pause of `duration_ms` which must be at least 1
    pub fn silence(duration_ms: u32) -> Result<Self, ValidationError> {
        Ok(Self::Silence(Silence {
            duration_ms: check_duration(duration_ms)?,
        }))
    }

    pub fn duration_ms(&self) -> u32 {
        match self {
            Event::Pulse(p) => p.duration_ms,
            Event::Silence(s) => s.duration_ms,
        }
    }

    /// How long the player waits on this event before moving on
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms() as u64)
    }

    pub fn is_pulse(&self) -> bool {
        matches!(self, Event::Pulse(_))
    }
}

impl Pulse {
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn sharpness(&self) -> Option<f32> {
        self.sharpness
    }
}

impl Silence {
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    #[test]
    fn test_pulse_in_range() {
        let event = Event::pulse(0.8, 50, Some(0.3)).unwrap();
        let Event::Pulse(pulse) = event else {
            panic!("expected a pulse: {event:?}");
        };
        assert_eq!(pulse.intensity(), 0.8);
        assert_eq!(pulse.sharpness(), Some(0.3));
        assert_eq!(event.duration(), Duration::from_millis(50));
    }

    #[test]
    fn test_pulse_range_bounds_are_inclusive() {
        assert!(Event::pulse(0.0, 1, Some(0.0)).is_ok());
        assert!(Event::pulse(1.0, 1, Some(1.0)).is_ok());
    }

    #[test]
    fn test_intensity_out_of_range() {
        assert_matches!(
            Event::pulse(1.2, 10, None),
            Err(ValidationError::IntensityOutOfRange(_))
        );
        assert_matches!(
            Event::pulse(-0.1, 10, None),
            Err(ValidationError::IntensityOutOfRange(_))
        );
        assert_matches!(
            Event::pulse(f32::NAN, 10, None),
            Err(ValidationError::IntensityOutOfRange(_))
        );
    }

    #[test]
    fn test_sharpness_out_of_range() {
        assert_matches!(
            Event::pulse(0.5, 10, Some(2.0)),
            Err(ValidationError::SharpnessOutOfRange(_))
        );
    }

    #[test]
    fn test_zero_duration() {
        assert_matches!(
            Event::pulse(0.5, 0, None),
            Err(ValidationError::InvalidDuration(0))
        );
        assert_matches!(Event::silence(0), Err(ValidationError::InvalidDuration(0)));
    }

    #[test]
    fn test_silence() {
        let event = Event::silence(100).unwrap();
        assert!(!event.is_pulse());
        assert_eq!(event.duration_ms(), 100);
    }
}
