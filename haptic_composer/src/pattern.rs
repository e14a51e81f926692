pub mod builder;

use core::num::NonZeroU32;

use embassy_time::{Duration, TICK_HZ};

use crate::{
    Event, ValidationError,
    pattern::builder::{_Empty, PatternBuilder},
};

/// How often the events of a pattern are played back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Play the events the given number of times
    Times(NonZeroU32),
    /// Keep playing until the playback is stopped or cancelled
    Forever,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::Times(NonZeroU32::MIN)
    }
}

impl Repeat {
    /// Create a finite repeat count. Zero and negative counts are rejected
    pub fn times(count: i64) -> Result<Self, ValidationError> {
        u32::try_from(count)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self::Times)
            .ok_or(ValidationError::InvalidRepeat(count))
    }

    /// Returns true if the zero based `iteration` still needs to be played
    pub(crate) fn covers(&self, iteration: u64) -> bool {
        match self {
            Repeat::Times(n) => iteration < n.get() as u64,
            Repeat::Forever => true,
        }
    }
}

/// Length of a pattern when played back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternDuration {
    Bounded(Duration),
    /// The pattern repeats forever
    Unbounded,
}

/// Milliseconds to a duration, capped at the longest representable duration
fn saturating_millis(ms: u64) -> Duration {
    Duration::from_ticks(ms.saturating_mul(TICK_HZ / 1000))
}

/// An immutable, non-empty sequence of haptic events
#[derive(Debug, Clone, PartialEq)]
pub struct HapticPattern {
    /// Events in playback order
    events: Vec<Event>,
    /// How often the events are played back before the pattern is considered complete
    repeat: Repeat,
    /// Wait this many milliseconds once before the first event
    delay_ms: Option<u32>,
}

impl HapticPattern {
    /// Create a new haptic pattern
    /// - `events` are played back in order and must not be empty.
    /// - `repeat` defines how many times the events are played. `None` plays them once.
    ///   Use [`HapticPattern::forever`] for a pattern which repeats until it is stopped.
    /// - `delay_ms` is waited once before the first event.
    pub fn create(
        events: Vec<Event>,
        repeat: Option<u32>,
        delay_ms: Option<u32>,
    ) -> Result<Self, ValidationError> {
        let repeat = match repeat {
            Some(n) => Repeat::times(n as i64)?,
            None => Repeat::default(),
        };
        Self::new(events, repeat, delay_ms)
    }

    pub(crate) fn new(
        events: Vec<Event>,
        repeat: Repeat,
        delay_ms: Option<u32>,
    ) -> Result<Self, ValidationError> {
        if events.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        Ok(Self {
            events,
            repeat,
            delay_ms,
        })
    }

    pub fn builder() -> PatternBuilder<_Empty> {
        PatternBuilder::default()
    }

    /// Turn this pattern into one which repeats until playback is stopped
    pub fn forever(mut self) -> Self {
        self.repeat = Repeat::Forever;
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn delay_ms(&self) -> Option<u32> {
        self.delay_ms
    }

    pub(crate) fn delay(&self) -> Option<Duration> {
        self.delay_ms
            .filter(|d| *d > 0)
            .map(|d| Duration::from_millis(d as u64))
    }

    /// Number of pulses in a single pass over the events
    pub fn pulse_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_pulse()).count()
    }

    fn pass_ms(&self) -> u64 {
        self.events
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.duration_ms() as u64))
    }

    /// Duration of a single pass over all events.
    /// Reported as unbounded if the pattern repeats forever
    pub fn total_duration(&self) -> PatternDuration {
        match self.repeat {
            Repeat::Forever => PatternDuration::Unbounded,
            Repeat::Times(_) => PatternDuration::Bounded(saturating_millis(self.pass_ms())),
        }
    }

    /// Expected wall time of a full playback including the initial delay and all repeats
    pub fn playback_duration(&self) -> PatternDuration {
        match self.repeat {
            Repeat::Forever => PatternDuration::Unbounded,
            Repeat::Times(n) => {
                let delay = self.delay_ms.unwrap_or_default() as u64;
                PatternDuration::Bounded(saturating_millis(
                    self.pass_ms()
                        .saturating_mul(n.get() as u64)
                        .saturating_add(delay),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn sample_events() -> Vec<Event> {
        vec![
            Event::pulse(0.8, 50, None).unwrap(),
            Event::silence(100).unwrap(),
            Event::pulse(0.5, 30, None).unwrap(),
        ]
    }

    #[test]
    fn test_empty_pattern() {
        assert_matches!(
            HapticPattern::create(vec![], None, None),
            Err(ValidationError::EmptyPattern)
        );
    }

    #[test]
    fn test_zero_repeat() {
        assert_matches!(
            HapticPattern::create(sample_events(), Some(0), None),
            Err(ValidationError::InvalidRepeat(0))
        );
        assert_matches!(Repeat::times(-3), Err(ValidationError::InvalidRepeat(-3)));
    }

    #[test]
    fn test_default_plays_once() {
        let pattern = HapticPattern::create(sample_events(), None, None).unwrap();
        assert_eq!(pattern.repeat(), Repeat::default());
        assert!(pattern.repeat().covers(0));
        assert!(!pattern.repeat().covers(1));
    }

    #[test]
    fn test_total_duration() {
        let pattern = HapticPattern::create(sample_events(), Some(2), Some(20)).unwrap();
        assert_eq!(
            pattern.total_duration(),
            PatternDuration::Bounded(Duration::from_millis(180))
        );
        assert_eq!(
            pattern.playback_duration(),
            PatternDuration::Bounded(Duration::from_millis(380))
        );
        assert_eq!(pattern.pulse_count(), 2);
    }

    #[test]
    fn test_forever_is_unbounded() {
        let pattern = HapticPattern::create(sample_events(), None, None)
            .unwrap()
            .forever();
        assert_eq!(pattern.total_duration(), PatternDuration::Unbounded);
        assert_eq!(pattern.playback_duration(), PatternDuration::Unbounded);
        assert!(pattern.repeat().covers(u64::MAX));
    }

    #[test]
    fn test_huge_pattern_duration_saturates() {
        let longest = Event::pulse(0.5, u32::MAX, None).unwrap();
        let pattern =
            HapticPattern::create(vec![longest, longest], Some(u32::MAX), Some(u32::MAX)).unwrap();
        assert_eq!(
            pattern.total_duration(),
            PatternDuration::Bounded(Duration::from_millis(2 * u32::MAX as u64))
        );
        assert_eq!(
            pattern.playback_duration(),
            PatternDuration::Bounded(Duration::from_ticks(u64::MAX))
        );

        let pattern = HapticPattern::create(
            vec![Event::pulse(0.5, 4_000_000_000, None).unwrap()],
            Some(10_000_000),
            None,
        )
        .unwrap();
        assert_eq!(
            pattern.playback_duration(),
            PatternDuration::Bounded(Duration::from_ticks(u64::MAX))
        );
    }

    #[test]
    fn test_zero_delay_is_skipped() {
        let pattern = HapticPattern::create(sample_events(), None, Some(0)).unwrap();
        assert_eq!(pattern.delay(), None);
        assert_eq!(pattern.delay_ms(), Some(0));
    }
}
