// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback state machine.
//!
//! The scheduler does not own a timer. The host calls [`PlaybackScheduler::tick`]
//! at its own cadence (typically every 16 ms); each tick compares the clock to
//! the start of the current frame and advances as many frames as have elapsed,
//! carrying the remainder so that no time is lost between ticks.

use crate::events::EventEmitter;
use crate::reel::TileAnimationReel;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Default host tick cadence
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Slack when comparing elapsed time against a frame duration
const TIME_EPSILON_MS: f64 = 1e-6;

/// Shortest frame duration honoured by the catch-up loop
const MIN_FRAME_DURATION_MS: f64 = 1.0;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlaybackState {
    /// Not playing; frame pinned at 0
    #[default]
    Stopped,
    /// Advancing on ticks
    Playing,
    /// Not advancing; frame held
    Paused,
}

/// Direction of travel, used by ping-pong playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    /// Toward the last frame
    #[default]
    Forward,
    /// Toward frame 0
    Backward,
}

/// Something with frames to play
pub trait FrameSource {
    /// Number of frames
    fn frame_count(&self) -> usize;
    /// How long a frame stays on screen
    fn frame_duration_ms(&self, frame: usize) -> f64;
    /// Wrap (or bounce) at the ends instead of stopping
    fn looping(&self) -> bool;
    /// Bounce at the ends instead of wrapping
    fn ping_pong(&self) -> bool;
}

impl FrameSource for TileAnimationReel {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_duration_ms(&self, frame: usize) -> f64 {
        f64::from(TileAnimationReel::frame_duration_ms(self, frame))
    }

    fn looping(&self) -> bool {
        self.looping
    }

    fn ping_pong(&self) -> bool {
        self.ping_pong
    }
}

/// Monotonic time source
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> f64;
}

/// Wall clock
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock starting now
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Clock at time 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    /// Set the absolute time
    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Scheduler notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The current frame was set
    FrameChanged {
        /// Frame before the change
        previous: usize,
        /// New frame
        frame: usize,
    },
    /// Playback state changed
    StateChanged(PlaybackState),
    /// Playback wrapped (or bounced back to frame 0) while looping
    Looped,
}

/// Result of one single-frame advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to a frame
    Moved(usize),
    /// Moved to frame 0 through the loop policy
    Looped(usize),
    /// Reached the end without looping; playback stopped
    Stopped,
}

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Frames advanced during the tick
    pub frames_advanced: usize,
    /// Times the loop policy returned to frame 0
    pub loops: usize,
    /// Playback stopped at the end of the sequence
    pub stopped: bool,
}

impl TickOutcome {
    /// Whether the current frame changed
    pub fn changed(&self) -> bool {
        self.frames_advanced > 0 || self.stopped
    }
}

/// Drives the current frame of one timeline
pub struct PlaybackScheduler {
    state: PlaybackState,
    direction: Direction,
    current_frame: usize,
    frame_start_ms: f64,
    clock: Box<dyn Clock>,
    /// Host tick cadence
    pub tick_interval_ms: u64,
    /// Scheduler notifications
    pub events: EventEmitter<SchedulerEvent>,
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("current_frame", &self.current_frame)
            .finish()
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackScheduler {
    /// Stopped scheduler on the wall clock
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock::new()))
    }

    /// Stopped scheduler on a given clock
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            state: PlaybackState::Stopped,
            direction: Direction::Forward,
            current_frame: 0,
            frame_start_ms: 0.0,
            clock,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            events: EventEmitter::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current frame
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.events.emit(SchedulerEvent::StateChanged(state));
        }
    }

    fn set_frame(&mut self, frame: usize) {
        let previous = self.current_frame;
        self.current_frame = frame;
        self.events.emit(SchedulerEvent::FrameChanged { previous, frame });
    }

    /// Start playing; no-op when already playing or the source has no frames
    pub fn play(&mut self, source: &dyn FrameSource) -> bool {
        let count = source.frame_count();
        if self.state == PlaybackState::Playing || count == 0 {
            return false;
        }
        if self.current_frame >= count {
            self.set_frame(count - 1);
        }
        self.direction = Direction::Forward;
        self.frame_start_ms = self.clock.now_ms();
        self.set_state(PlaybackState::Playing);
        tracing::debug!("Playback started at frame {}", self.current_frame);
        true
    }

    /// Pause, holding the current frame; only valid while playing
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.set_state(PlaybackState::Paused);
        true
    }

    /// Stop and return to frame 0
    pub fn stop(&mut self) {
        self.direction = Direction::Forward;
        self.set_frame(0);
        self.set_state(PlaybackState::Stopped);
    }

    /// Play when not playing, pause otherwise
    pub fn toggle_play_pause(&mut self, source: &dyn FrameSource) -> bool {
        if self.is_playing() {
            self.pause()
        } else {
            self.play(source)
        }
    }

    /// Jump to a frame, clamped to the source
    pub fn set_current_frame(&mut self, frame: usize, frame_count: usize) {
        let frame = frame.min(frame_count.saturating_sub(1));
        self.set_frame(frame);
        if self.is_playing() {
            self.frame_start_ms = self.clock.now_ms();
        }
    }

    /// Advance as many frames as the clock says have elapsed
    pub fn tick(&mut self, source: &dyn FrameSource) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.is_playing() {
            return outcome;
        }

        let now = self.clock.now_ms();
        loop {
            let duration = source.frame_duration_ms(self.current_frame).max(MIN_FRAME_DURATION_MS);
            if now - self.frame_start_ms + TIME_EPSILON_MS < duration {
                break;
            }
            self.frame_start_ms += duration;
            match self.advance_playback(source) {
                Advance::Moved(_) => outcome.frames_advanced += 1,
                Advance::Looped(_) => {
                    outcome.frames_advanced += 1;
                    outcome.loops += 1;
                }
                Advance::Stopped => {
                    outcome.stopped = true;
                    break;
                }
            }
        }
        outcome
    }

    /// Move one frame according to the loop and ping-pong policy
    pub fn advance_playback(&mut self, source: &dyn FrameSource) -> Advance {
        let count = source.frame_count();
        if count == 0 {
            self.stop();
            return Advance::Stopped;
        }
        let looping = source.looping();

        if !source.ping_pong() {
            let next = self.current_frame + 1;
            if next < count {
                self.set_frame(next);
                return Advance::Moved(next);
            }
            return self.wrap_or_stop(looping);
        }

        if count == 1 {
            return self.wrap_or_stop(looping);
        }

        match self.direction {
            Direction::Forward => {
                let next = if self.current_frame + 1 >= count {
                    self.direction = Direction::Backward;
                    count - 2
                } else {
                    self.current_frame + 1
                };
                self.set_frame(next);
                Advance::Moved(next)
            }
            Direction::Backward => {
                if self.current_frame == 0 {
                    self.direction = Direction::Forward;
                    self.set_frame(1);
                    return Advance::Moved(1);
                }
                let next = self.current_frame - 1;
                if next > 0 {
                    self.set_frame(next);
                    return Advance::Moved(next);
                }
                self.direction = Direction::Forward;
                self.wrap_or_stop(looping)
            }
        }
    }

    fn wrap_or_stop(&mut self, looping: bool) -> Advance {
        if looping {
            self.set_frame(0);
            self.events.emit(SchedulerEvent::Looped);
            Advance::Looped(0)
        } else {
            self.stop();
            Advance::Stopped
        }
    }
}
