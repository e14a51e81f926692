//! Conversion of patterns to and from a structured record for storage and transport.
//!
//! A record is a JSON object:
//! ```json
//! {
//!   "events": [
//!     { "kind": "pulse", "intensity": 0.8, "durationMs": 50, "sharpness": 0.4 },
//!     { "kind": "silence", "durationMs": 100 }
//!   ],
//!   "repeat": 2,
//!   "delayMs": 20
//! }
//! ```
//! `repeat` may be omitted (play once), a positive count or `"infinite"`.
//! The event kinds `impact` and `continuous` are read as pulses and `pause` as a silence.

use core::num::NonZeroU32;

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Event, FormatError, HapticPattern, Repeat, ValidationError};

const INFINITE: &str = "infinite";

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum EventRecord {
    #[serde(alias = "impact", alias = "continuous")]
    Pulse {
        intensity: f32,
        #[serde(rename = "durationMs")]
        duration_ms: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sharpness: Option<f32>,
    },
    #[serde(alias = "pause")]
    Silence {
        #[serde(rename = "durationMs")]
        duration_ms: i64,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(untagged)]
enum RepeatRecord {
    Count(i64),
    Keyword(String),
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PatternRecord {
    events: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repeat: Option<RepeatRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delay_ms: Option<i64>,
}

fn duration_from_record(duration_ms: i64) -> Result<u32, ValidationError> {
    u32::try_from(duration_ms).map_err(|_| ValidationError::InvalidDuration(duration_ms))
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        match event {
            Event::Pulse(p) => EventRecord::Pulse {
                intensity: p.intensity(),
                duration_ms: p.duration_ms() as i64,
                sharpness: p.sharpness(),
            },
            Event::Silence(s) => EventRecord::Silence {
                duration_ms: s.duration_ms() as i64,
            },
        }
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = ValidationError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        match record {
            EventRecord::Pulse {
                intensity,
                duration_ms,
                sharpness,
            } => Event::pulse(intensity, duration_from_record(duration_ms)?, sharpness),
            EventRecord::Silence { duration_ms } => {
                Event::silence(duration_from_record(duration_ms)?)
            }
        }
    }
}

impl RepeatRecord {
    fn into_repeat(self) -> Result<Repeat, FormatError> {
        match self {
            RepeatRecord::Count(n) => Ok(Repeat::times(n)?),
            RepeatRecord::Keyword(k) if k == INFINITE => Ok(Repeat::Forever),
            RepeatRecord::Keyword(k) => Err(FormatError::UnknownRepeat(k)),
        }
    }
}

impl PatternRecord {
    fn into_pattern(self) -> Result<HapticPattern, FormatError> {
        let events = self
            .events
            .into_iter()
            .enumerate()
            .map(|(index, e)| {
                Event::try_from(e).map_err(|source| FormatError::InvalidEvent { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let repeat = match self.repeat {
            Some(r) => r.into_repeat()?,
            None => Repeat::default(),
        };
        let delay_ms = self
            .delay_ms
            .map(|d| u32::try_from(d).map_err(|_| ValidationError::InvalidDelay(d)))
            .transpose()?;
        Ok(HapticPattern::new(events, repeat, delay_ms)?)
    }
}

impl From<&HapticPattern> for PatternRecord {
    fn from(pattern: &HapticPattern) -> Self {
        let repeat = match pattern.repeat() {
            Repeat::Times(n) if n == NonZeroU32::MIN => None,
            Repeat::Times(n) => Some(RepeatRecord::Count(n.get() as i64)),
            Repeat::Forever => Some(RepeatRecord::Keyword(INFINITE.into())),
        };
        PatternRecord {
            events: pattern.events().iter().map(EventRecord::from).collect(),
            repeat,
            delay_ms: pattern.delay_ms().map(|d| d as i64),
        }
    }
}

impl HapticPattern {
    /// Convert this pattern into a structured record
    pub fn to_record(&self) -> Value {
        // A record only holds strings, integers and range checked floats, so serializing it
        // can not fail. Should that ever change the failure is logged and the record is empty
        match serde_json::to_value(PatternRecord::from(self)) {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to serialize pattern record: {e}");
                Value::Object(Default::default())
            }
        }
    }

    /// Read a pattern back from a structured record created by [`HapticPattern::to_record`]
    /// or written by hand
    pub fn from_record(record: &Value) -> Result<Self, FormatError> {
        PatternRecord::deserialize(record)?.into_pattern()
    }

    pub fn to_json(&self) -> String {
        self.to_record().to_string()
    }

    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        serde_json::from_str::<PatternRecord>(json)?.into_pattern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;
    use serde_json::json;

    fn sample() -> HapticPattern {
        HapticPattern::builder()
            .pulse(0.8, 50)
            .silence(100)
            .sharp_pulse(0.5, 30, 0.25)
            .repeat(2)
            .delay(15)
            .build()
            .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let pattern = sample();
        assert_eq!(HapticPattern::from_record(&pattern.to_record()).unwrap(), pattern);
        assert_eq!(HapticPattern::from_json(&pattern.to_json()).unwrap(), pattern);

        let forever = sample().forever();
        assert_eq!(HapticPattern::from_record(&forever.to_record()).unwrap(), forever);
    }

    #[test]
    fn test_record_layout() {
        let record = sample().to_record();
        assert_eq!(record["repeat"], json!(2));
        assert_eq!(record["delayMs"], json!(15));
        assert_eq!(record["events"][0]["kind"], json!("pulse"));
        assert_eq!(record["events"][1], json!({"kind": "silence", "durationMs": 100}));
        assert_eq!(record["events"][2]["sharpness"], json!(0.25));
    }

    #[test]
    fn test_record_is_an_object() {
        let pattern = HapticPattern::builder()
            .sharp_pulse(0.0, u32::MAX, 1.0)
            .silence(1)
            .repeat(u32::MAX)
            .delay(u32::MAX)
            .build()
            .unwrap();
        let record = pattern.to_record();
        assert!(record.is_object());
        assert_eq!(record["events"].as_array().map(Vec::len), Some(2));
        assert_eq!(HapticPattern::from_record(&record).unwrap(), pattern);
    }

    #[test]
    fn test_play_once_omits_repeat() {
        let pattern = HapticPattern::builder().pulse(1.0, 10).build().unwrap();
        let record = pattern.to_record();
        assert!(record.get("repeat").is_none());
        assert!(record.get("delayMs").is_none());
    }

    #[test]
    fn test_null_repeat_plays_once() {
        let pattern = HapticPattern::from_record(&json!({
            "events": [{"kind": "pulse", "intensity": 0.5, "durationMs": 10}],
            "repeat": null
        }))
        .unwrap();
        assert_eq!(pattern.repeat(), Repeat::default());
    }

    #[test]
    fn test_infinite_repeat() {
        let pattern = HapticPattern::from_record(&json!({
            "events": [{"kind": "silence", "durationMs": 10}],
            "repeat": "infinite"
        }))
        .unwrap();
        assert_eq!(pattern.repeat(), Repeat::Forever);
    }

    #[test]
    fn test_legacy_kinds() {
        let pattern = HapticPattern::from_record(&json!({
            "events": [
                {"kind": "impact", "intensity": 1.0, "durationMs": 20},
                {"kind": "pause", "durationMs": 40},
                {"kind": "continuous", "intensity": 0.3, "durationMs": 200}
            ]
        }))
        .unwrap();
        assert_eq!(pattern.pulse_count(), 2);
        assert!(!pattern.events()[1].is_pulse());
    }

    #[test]
    fn test_missing_events() {
        assert_matches!(
            HapticPattern::from_record(&json!({"repeat": 2})),
            Err(FormatError::Malformed(_))
        );
    }

    #[test]
    fn test_empty_events() {
        assert_matches!(
            HapticPattern::from_record(&json!({"events": []})),
            Err(FormatError::InvalidPattern(ValidationError::EmptyPattern))
        );
    }

    #[test]
    fn test_unknown_kind() {
        assert_matches!(
            HapticPattern::from_record(&json!({"events": [{"kind": "buzz", "durationMs": 10}]})),
            Err(FormatError::Malformed(_))
        );
    }

    #[test]
    fn test_missing_intensity() {
        assert_matches!(
            HapticPattern::from_record(&json!({"events": [{"kind": "pulse", "durationMs": 10}]})),
            Err(FormatError::Malformed(_))
        );
    }

    #[test]
    fn test_missing_duration() {
        assert_matches!(
            HapticPattern::from_record(&json!({"events": [{"kind": "silence"}]})),
            Err(FormatError::Malformed(_))
        );
    }

    #[test]
    fn test_invalid_event_reports_index() {
        let result = HapticPattern::from_record(&json!({
            "events": [
                {"kind": "silence", "durationMs": 10},
                {"kind": "pulse", "intensity": 3.0, "durationMs": 10}
            ]
        }));
        assert_matches!(
            result,
            Err(FormatError::InvalidEvent {
                index: 1,
                source: ValidationError::IntensityOutOfRange(_)
            })
        );
    }

    #[test]
    fn test_negative_duration() {
        assert_matches!(
            HapticPattern::from_record(&json!({"events": [{"kind": "silence", "durationMs": -5}]})),
            Err(FormatError::InvalidEvent {
                index: 0,
                source: ValidationError::InvalidDuration(-5)
            })
        );
    }

    #[test]
    fn test_invalid_repeat_and_delay() {
        let events = json!([{"kind": "silence", "durationMs": 10}]);
        assert_matches!(
            HapticPattern::from_record(&json!({"events": events, "repeat": 0})),
            Err(FormatError::InvalidPattern(ValidationError::InvalidRepeat(0)))
        );
        assert_matches!(
            HapticPattern::from_record(&json!({"events": events, "repeat": "often"})),
            Err(FormatError::UnknownRepeat(_))
        );
        assert_matches!(
            HapticPattern::from_record(&json!({"events": events, "delayMs": -1})),
            Err(FormatError::InvalidPattern(ValidationError::InvalidDelay(-1)))
        );
    }
}
