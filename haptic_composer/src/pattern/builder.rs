use core::marker::PhantomData;

use crate::{Event, HapticPattern, Repeat, ValidationError};

/// Marker for a builder which does not have any events yet
#[derive(Default)]
pub struct _Empty {}
/// Marker for a builder which has at least one event
pub struct _NonEmpty {}

/// A builder for creating a [`HapticPattern`] step by step.
/// Range errors of individual events are collected and reported by [`PatternBuilder::build`].
/// # Example usage:
/// ```
/// use haptic_composer::HapticPattern;
/// let pattern = HapticPattern::builder()
///     .pulse(0.8, 50)
///     .silence(100)
///     .pulse(0.5, 30)
///     .repeat(2)
///     .build()
///     .unwrap();
/// assert_eq!(pattern.events().len(), 3);
/// ```
#[derive(Default)]
pub struct PatternBuilder<M> {
    events: Vec<Event>,
    repeat: Repeat,
    delay_ms: Option<u32>,
    /// First error encountered while adding events
    error: Option<ValidationError>,
    phantom: PhantomData<M>,
}

impl<M> PatternBuilder<M> {
    fn push(mut self, event: Result<Event, ValidationError>) -> PatternBuilder<_NonEmpty> {
        match event {
            Ok(e) => self.events.push(e),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        PatternBuilder {
            events: self.events,
            repeat: self.repeat,
            delay_ms: self.delay_ms,
            error: self.error,
            phantom: PhantomData,
        }
    }

    /// Add an already constructed event
    pub fn event(self, event: Event) -> PatternBuilder<_NonEmpty> {
        self.push(Ok(event))
    }

    /// Add a pulse without a sharpness hint
    pub fn pulse(self, intensity: f32, duration_ms: u32) -> PatternBuilder<_NonEmpty> {
        self.push(Event::pulse(intensity, duration_ms, None))
    }

    /// Add a pulse with a sharpness hint for sinks which support shaping it
    pub fn sharp_pulse(
        self,
        intensity: f32,
        duration_ms: u32,
        sharpness: f32,
    ) -> PatternBuilder<_NonEmpty> {
        self.push(Event::pulse(intensity, duration_ms, Some(sharpness)))
    }

    pub fn silence(self, duration_ms: u32) -> PatternBuilder<_NonEmpty> {
        self.push(Event::silence(duration_ms))
    }

    /// Wait `delay_ms` once before the first event is played
    pub fn delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }
}

impl PatternBuilder<_NonEmpty> {
    /// Play all events `count` times
    pub fn repeat(mut self, count: u32) -> Self {
        match Repeat::times(count as i64) {
            Ok(r) => self.repeat = r,
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Play all events until playback is stopped
    pub fn forever(mut self) -> Self {
        self.repeat = Repeat::Forever;
        self
    }

    pub fn build(self) -> Result<HapticPattern, ValidationError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        HapticPattern::new(self.events, self.repeat, self.delay_ms)
    }
}
