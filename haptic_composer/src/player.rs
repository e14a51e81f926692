//! # Pattern playback
//! The [`HapticPlayer`] walks the events of a [`HapticPattern`] in order, hands every pulse to its
//! [`HapticSink`] and waits out the duration of every event.
//!
//! A player runs at most one playback at a time. Starting a new one cancels the one in flight,
//! and [`HapticPlayer::stop`] cancels it without starting anything new.
//! Cancellation is cooperative: waits are chopped into slices of the configured poll interval
//! and the cancellation state is checked between them and before every sink call.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embassy_futures::select::{Either, select};
use embassy_sync::{
    blocking_mutex::{Mutex as BlockingMutex, raw::RawMutex},
    mutex::Mutex,
};
use embassy_time::{Duration, Instant, Timer};
use log::{debug, info, warn};

use crate::{Effect, Event, HapticPattern, HapticSink, PlayerError, PlayerSettings, event::Pulse};

/// Observable state of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing is playing
    Idle,
    /// Waiting out the initial delay of a pattern
    Delaying,
    /// Handing a pulse to the sink
    PlayingEvent,
    /// Waiting for the duration of the current event to pass
    WaitingOut,
}

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// All events of all iterations were played
    Completed,
    /// The playback was stopped, replaced by another one or its token was cancelled
    Cancelled,
}

/// Handle for cancelling a single playback from the outside
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per call options of [`HapticPlayer::play_with`]
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Overrides the timeout of the player settings
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl PlayOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Bookkeeping shared between the playback and the control calls of a player
struct SessionSlot {
    /// Bumped by every `play` and `stop`. A session whose id no longer matches is cancelled
    generation: u32,
    /// Id of the session which currently owns the sink
    owner: Option<u32>,
    state: PlayerState,
    disposed: bool,
}

/// Transient state of one playback
struct PlaybackSession {
    id: u32,
    cancel: Option<CancelToken>,
    iteration: u64,
    index: usize,
    triggered: u32,
    failed: u32,
}

/// Releases the session slot when a playback ends, including when its future is dropped
struct SessionGuard<'a, M: RawMutex> {
    slot: &'a BlockingMutex<M, RefCell<SessionSlot>>,
    id: u32,
}

impl<M: RawMutex> Drop for SessionGuard<'_, M> {
    fn drop(&mut self) {
        self.slot.lock(|s| {
            let mut s = s.borrow_mut();
            if s.owner == Some(self.id) {
                s.owner = None;
                s.state = PlayerState::Idle;
            }
        });
    }
}

/// Plays haptic patterns on a [`HapticSink`].
/// `M` selects the raw mutex guarding the internal state, use
/// [`NoopRawMutex`](embassy_sync::blocking_mutex::raw::NoopRawMutex) when the player never
/// leaves a single executor.
pub struct HapticPlayer<M: RawMutex, S: HapticSink> {
    sink: Mutex<M, S>,
    slot: BlockingMutex<M, RefCell<SessionSlot>>,
    settings: PlayerSettings,
}

impl<M: RawMutex, S: HapticSink> HapticPlayer<M, S> {
    pub fn new(sink: S) -> Self {
        Self::with_settings(sink, PlayerSettings::default())
    }

    pub fn with_settings(sink: S, settings: PlayerSettings) -> Self {
        Self {
            sink: Mutex::new(sink),
            slot: BlockingMutex::new(RefCell::new(SessionSlot {
                generation: 0,
                owner: None,
                state: PlayerState::Idle,
                disposed: false,
            })),
            settings,
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    fn ensure_usable(&self) -> Result<(), PlayerError> {
        if self.slot.lock(|s| s.borrow().disposed) {
            return Err(PlayerError::Disposed);
        }
        Ok(())
    }

    /// Initialize the sink. A failing sink is reported as not ready instead of an error
    pub async fn initialize(&self) -> Result<bool, PlayerError> {
        self.ensure_usable()?;
        match self.sink.lock().await.initialize().await {
            Ok(ready) => {
                info!("Haptic sink initialized. Vibration available: {ready}");
                Ok(ready)
            }
            Err(e) => {
                warn!("Failed to initialize haptic sink: {e:?}");
                Ok(false)
            }
        }
    }

    /// Ask the sink whether the device can vibrate. A failing sink is reported as unsupported
    pub async fn is_supported(&self) -> Result<bool, PlayerError> {
        self.ensure_usable()?;
        match self.sink.lock().await.is_supported().await {
            Ok(supported) => Ok(supported),
            Err(e) => {
                warn!("Failed to query haptic support: {e:?}");
                Ok(false)
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.slot.lock(|s| s.borrow().owner.is_some())
    }

    pub fn state(&self) -> PlayerState {
        self.slot.lock(|s| s.borrow().state)
    }

    /// Play `pattern` to the end using the timeout of the player settings.
    /// See [`HapticPlayer::play_with`]
    pub async fn play(&self, pattern: &HapticPattern) -> Result<Playback, PlayerError> {
        self.play_with(pattern, PlayOptions::default()).await
    }

    /// Play `pattern` to the end.
    /// Any playback already running on this player is cancelled first.
    /// - Resolves to [`Playback::Completed`] if every event of every iteration was played.
    /// - Resolves to [`Playback::Cancelled`] if the playback was stopped, replaced or
    ///   the token in `options` was cancelled.
    /// - Fails with [`PlayerError::Timeout`] if a timeout is set and the playback did not finish
    ///   in time. The playback is cancelled in that case.
    pub async fn play_with(
        &self,
        pattern: &HapticPattern,
        options: PlayOptions,
    ) -> Result<Playback, PlayerError> {
        let id = self.begin()?;
        if !self.claim(id, options.cancel.as_ref()).await {
            debug!("Playback {id} was replaced before it started");
            return Ok(Playback::Cancelled);
        }
        let _guard = SessionGuard {
            slot: &self.slot,
            id,
        };
        let mut session = PlaybackSession {
            id,
            cancel: options.cancel,
            iteration: 0,
            index: 0,
            triggered: 0,
            failed: 0,
        };
        debug!(
            "Starting playback {id}: {} events, repeat {:?}",
            pattern.events().len(),
            pattern.repeat()
        );

        match options.timeout.or(self.settings.timeout) {
            Some(limit) => {
                let raced = select(self.run(pattern, &mut session), Timer::after(limit)).await;
                match raced {
                    Either::First(playback) => Ok(playback),
                    Either::Second(_) => {
                        warn!(
                            "Playback {id} timed out after {}ms at event {} of iteration {}",
                            limit.as_millis(),
                            session.index,
                            session.iteration
                        );
                        Err(PlayerError::Timeout {
                            limit_ms: limit.as_millis(),
                        })
                    }
                }
            }
            None => Ok(self.run(pattern, &mut session).await),
        }
    }

    /// Stop the running playback and wait until it has been torn down.
    /// Does nothing if nothing is playing
    pub async fn stop(&self) {
        let stopped = self.slot.lock(|s| {
            let mut s = s.borrow_mut();
            s.generation = s.generation.wrapping_add(1);
            s.owner
        });
        let Some(id) = stopped else {
            return;
        };
        info!("Stopping haptic playback {id}");
        // Only wait for the session cancelled here, a playback started afterwards is not ours to wait on
        while self.slot.lock(|s| s.borrow().owner == Some(id)) {
            Timer::after(self.settings.poll_interval).await;
        }
    }

    /// Return to idle. Nothing but the running playback is kept by a player, so this equals [`HapticPlayer::stop`]
    pub async fn reset(&self) {
        self.stop().await
    }

    /// Stop playback and release the sink. Every following call to
    /// [`HapticPlayer::play`], [`HapticPlayer::initialize`] or [`HapticPlayer::is_supported`]
    /// fails with [`PlayerError::Disposed`]. Disposing twice does nothing
    pub async fn dispose(&self) {
        let already = self.slot.lock(|s| core::mem::replace(&mut s.borrow_mut().disposed, true));
        if already {
            return;
        }
        self.stop().await;
        if let Err(e) = self.sink.lock().await.release().await {
            warn!("Failed to release haptic sink: {e:?}");
        }
        info!("Haptic player disposed");
    }

    /// Start a new generation, which cancels whatever is in flight
    fn begin(&self) -> Result<u32, PlayerError> {
        self.slot.lock(|s| {
            let mut s = s.borrow_mut();
            if s.disposed {
                return Err(PlayerError::Disposed);
            }
            s.generation = s.generation.wrapping_add(1);
            Ok(s.generation)
        })
    }

    /// Wait for the previous playback to tear down and take ownership of the player.
    /// Returns false if this playback got cancelled while waiting
    async fn claim(&self, id: u32, cancel: Option<&CancelToken>) -> bool {
        loop {
            let claimed = self.slot.lock(|s| {
                let mut s = s.borrow_mut();
                if s.generation != id {
                    return None;
                }
                if s.owner.is_none() {
                    s.owner = Some(id);
                    return Some(true);
                }
                Some(false)
            });
            match claimed {
                None => return false,
                Some(true) => return true,
                Some(false) if cancel.is_some_and(CancelToken::is_cancelled) => return false,
                Some(false) => Timer::after(self.settings.poll_interval).await,
            }
        }
    }

    fn is_cancelled(&self, session: &PlaybackSession) -> bool {
        session.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.slot.lock(|s| s.borrow().generation != session.id)
    }

    fn enter(&self, session: &PlaybackSession, state: PlayerState) {
        self.slot.lock(|s| {
            let mut s = s.borrow_mut();
            if s.owner == Some(session.id) {
                s.state = state;
            }
        });
    }

    /// Wait for `duration` in slices of the poll interval.
    /// Returns false as soon as a cancellation is observed
    async fn wait_out(&self, session: &PlaybackSession, duration: Duration) -> bool {
        let end = Instant::now() + duration;
        loop {
            if self.is_cancelled(session) {
                return false;
            }
            let now = Instant::now();
            if now >= end {
                return true;
            }
            Timer::after((end - now).min(self.settings.poll_interval)).await;
        }
    }

    async fn trigger(&self, session: &mut PlaybackSession, pulse: &Pulse) {
        let mut sink = self.sink.lock().await;
        if self.is_cancelled(session) {
            return;
        }
        let effect = Effect::clamped(
            pulse.intensity() * self.settings.scale,
            Duration::from_millis(pulse.duration_ms() as u64),
            pulse.sharpness(),
            sink.max_duration(),
        );
        match sink.trigger(effect).await {
            Ok(()) => session.triggered += 1,
            Err(e) => {
                // Haptics are best effort, the sequence goes on without this pulse
                session.failed += 1;
                warn!(
                    "Haptic trigger failed at event {} of iteration {}: {e:?}",
                    session.index, session.iteration
                );
            }
        }
    }

    fn cancelled(&self, session: &PlaybackSession) -> Playback {
        info!(
            "Playback {} cancelled at event {} of iteration {} after {} pulses",
            session.id, session.index, session.iteration, session.triggered
        );
        Playback::Cancelled
    }

    async fn run(&self, pattern: &HapticPattern, session: &mut PlaybackSession) -> Playback {
        if let Some(delay) = pattern.delay() {
            self.enter(session, PlayerState::Delaying);
            if !self.wait_out(session, delay).await {
                return self.cancelled(session);
            }
        }

        while pattern.repeat().covers(session.iteration) {
            for (index, event) in pattern.events().iter().enumerate() {
                session.index = index;
                if self.is_cancelled(session) {
                    return self.cancelled(session);
                }
                if let Event::Pulse(pulse) = event {
                    self.enter(session, PlayerState::PlayingEvent);
                    self.trigger(session, pulse).await;
                }
                self.enter(session, PlayerState::WaitingOut);
                if !self.wait_out(session, event.duration()).await {
                    return self.cancelled(session);
                }
            }
            session.iteration = session.iteration.saturating_add(1);
        }

        debug!(
            "Playback {} completed: {} pulses played, {} failed",
            session.id, session.triggered, session.failed
        );
        Playback::Completed
    }
}
