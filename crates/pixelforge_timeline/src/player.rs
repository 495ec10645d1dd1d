// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback coordinator.
//!
//! [`AnimationPlayer`] wires the scheduler to everything that depends on the
//! current frame: the document (through the canvas animation), the audio
//! tracks and the sub-routines.

use crate::audio::AudioTrackCollection;
use crate::canvas::{ApplyReport, CanvasAnimation};
use crate::config::TimelineSettings;
use crate::document::DocumentModel;
use crate::error::TimelineResult;
use crate::interpolation::Easing;
use crate::keyframe::StageKeyframe;
use crate::scheduler::{PlaybackScheduler, PlaybackState, TickOutcome};
use crate::subroutine::{AnimationSubRoutineState, SubRoutineTransform};

/// What was shown for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    /// Frame shown
    pub frame: usize,
    /// Document application details
    pub apply: ApplyReport,
    /// Averaged transform of the active sub-routines
    pub sub_routines: Option<SubRoutineTransform>,
}

/// Owns one canvas timeline and everything synchronised to it
#[derive(Debug)]
pub struct AnimationPlayer {
    /// Keyframed document state
    pub animation: CanvasAnimation,
    /// Current frame and play state
    pub scheduler: PlaybackScheduler,
    /// Reference audio
    pub audio: AudioTrackCollection,
    /// Embedded reels
    pub sub_routines: AnimationSubRoutineState,
    /// Easing given to stage keyframes captured through the player
    pub stage_easing: Easing,
}

impl AnimationPlayer {
    /// Create a player
    pub fn new(animation: CanvasAnimation, scheduler: PlaybackScheduler, audio: AudioTrackCollection) -> Self {
        Self {
            animation,
            scheduler,
            audio,
            sub_routines: AnimationSubRoutineState::new(),
            stage_easing: Easing::Linear,
        }
    }

    /// Adopt editor-wide preferences for ticking, waveforms and stage capture
    pub fn apply_settings(&mut self, settings: &TimelineSettings) {
        self.scheduler.tick_interval_ms = settings.tick_interval_ms;
        self.audio.waveform_points_per_second = settings.waveform_points_per_second;
        self.stage_easing = settings.stage_easing;
    }

    /// Capture the live stage settings at the current frame
    pub fn capture_stage_keyframe(&mut self) -> TimelineResult<StageKeyframe> {
        let frame = self.scheduler.current_frame();
        self.animation.capture_stage_keyframe(frame, self.stage_easing)
    }

    /// Current frame
    pub fn current_frame(&self) -> usize {
        self.scheduler.current_frame()
    }

    /// Playback state
    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    fn reconcile_audio(&mut self) {
        self.audio.update_playback_state_for_frame(
            self.scheduler.current_frame(),
            self.animation.fps(),
            self.animation.frame_count(),
            self.scheduler.is_playing(),
        );
    }

    /// Start playback
    pub fn play(&mut self) -> bool {
        let started = self.scheduler.play(&self.animation);
        if started {
            self.reconcile_audio();
        }
        started
    }

    /// Pause playback and audio
    pub fn pause(&mut self) -> bool {
        let paused = self.scheduler.pause();
        if paused {
            self.reconcile_audio();
        }
        paused
    }

    /// Stop, rewinding everything to frame 0
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.reconcile_audio();
        self.audio.seek_all(0, self.animation.fps());
    }

    /// Toggle between playing and paused
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.scheduler.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Jump to a frame and show it.
    ///
    /// Audio is re-seeked unless playback is running, where it follows on its own.
    pub fn seek(&mut self, frame: usize, doc: &mut dyn DocumentModel) -> FrameUpdate {
        self.scheduler.set_current_frame(frame, self.animation.frame_count());
        if !self.scheduler.is_playing() {
            self.audio.seek_all(self.scheduler.current_frame(), self.animation.fps());
        }
        self.show_current(doc)
    }

    /// Advance on the clock; returns the frame shown when it changed
    pub fn tick(&mut self, doc: &mut dyn DocumentModel) -> Option<FrameUpdate> {
        let outcome: TickOutcome = self.scheduler.tick(&self.animation);
        if outcome.loops > 0 {
            self.audio.resync_after_loop(self.scheduler.current_frame(), self.animation.fps());
        }
        self.audio.poll_waveforms();
        if !outcome.changed() {
            return None;
        }
        self.reconcile_audio();
        Some(self.show_current(doc))
    }

    /// Apply the current frame to the document and recompute sub-routines
    pub fn show_current(&mut self, doc: &mut dyn DocumentModel) -> FrameUpdate {
        let frame = self.scheduler.current_frame();
        let apply = self.animation.apply_frame_to_document(doc, frame);
        let sub_routines = self.sub_routines.update_for_frame(frame);
        if apply.has_skips() {
            tracing::debug!("Frame {} applied with skips: {:?}", frame, apply);
        }
        FrameUpdate {
            frame,
            apply,
            sub_routines,
        }
    }
}
