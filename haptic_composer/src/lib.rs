//! # Haptic pattern playback
//! This crate plays haptic feedback described as time ordered sequences of pulses and pauses.
//!
//! - A [`HapticPattern`] is an immutable list of [`Event`]s with an optional repeat count and
//!   an initial delay. It can be built with [`HapticPattern::builder`] and stored or
//!   transported as a JSON record.
//! - A [`HapticSink`] is the platform specific part which turns a single [`Effect`] into a vibration.
//! - The [`HapticPlayer`] walks a pattern and drives a sink, supporting cooperative cancellation,
//!   repeats and an optional overall timeout.
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use haptic_composer::{HapticPattern, HapticPlayer, LogSink, Playback};
//!
//! let pattern = HapticPattern::builder()
//!     .pulse(0.8, 20)
//!     .silence(30)
//!     .build()
//!     .unwrap();
//! let player = HapticPlayer::<NoopRawMutex, _>::new(LogSink::new());
//! let result = embassy_futures::block_on(player.play(&pattern));
//! assert_eq!(result, Ok(Playback::Completed));
//! ```

mod error;
mod event;
mod pattern;
mod player;
mod record;
mod settings;
mod sink;

pub use error::{FormatError, PlayerError, ValidationError};
pub use event::{Event, Pulse, Silence};
pub use pattern::builder::{_Empty, _NonEmpty, PatternBuilder};
pub use pattern::{HapticPattern, PatternDuration, Repeat};
pub use player::{CancelToken, HapticPlayer, PlayOptions, Playback, PlayerState};
pub use settings::{DEFAULT_POLL_INTERVAL, PlayerSettings};
pub use sink::{Effect, HapticSink, LogSink, MAX_PULSE_DURATION, SinkError};

pub use embassy_time::Duration;
