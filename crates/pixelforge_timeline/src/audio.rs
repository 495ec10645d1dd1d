// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reference audio tracks.
//!
//! Audio follows the timeline: the canvas frame decides the audio position,
//! never the other way round. Decoding and output belong to an external
//! [`AudioBackend`]; this module only maps frames to positions, reconciles
//! play/pause state and builds waveform peaks for display.
//!
//! Waveform extraction is the one piece of background work in the engine. A
//! job runs on its own thread, checks a shared cancel flag once per peak
//! bucket and sends its result over a channel that [`AudioTrackCollection::poll_waveforms`]
//! drains on the main thread.

use crate::error::{TimelineError, TimelineResult};
use crate::events::EventEmitter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use uuid::Uuid;

/// Peaks generated per second of audio unless configured otherwise
pub const DEFAULT_WAVEFORM_POINTS_PER_SECOND: u32 = 100;

/// Unique identifier for an audio track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioTrackId(pub Uuid);

impl AudioTrackId {
    /// Create a new random audio track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AudioTrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// A playing (or pausable) audio stream
pub trait AudioPlayback {
    /// Length of the stream
    fn duration_ms(&self) -> u64;
    /// Current position
    fn position_ms(&self) -> u64;
    /// Jump to a position
    fn seek(&mut self, position_ms: u64);
    /// Start or resume output
    fn play(&mut self);
    /// Pause output
    fn pause(&mut self);
    /// Whether output is running
    fn is_playing(&self) -> bool;
    /// Output gain, 0 to 1
    fn set_volume(&mut self, volume: f32);
}

/// Interleaved samples decoded for waveform extraction
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSamples {
    /// Frames per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Interleaved samples in -1..=1
    pub samples: Vec<f32>,
}

/// Decoder and output device
pub trait AudioBackend: Send + Sync {
    /// Open a file for playback; a missing file is [`TimelineError::MissingResource`]
    fn open(&self, path: &Path) -> TimelineResult<Box<dyn AudioPlayback>>;

    /// Decode a whole file; called from waveform worker threads
    fn decode_samples(&self, path: &Path) -> TimelineResult<DecodedSamples>;
}

/// Backend for hosts without audio output; every open fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudioBackend;

impl AudioBackend for NullAudioBackend {
    fn open(&self, path: &Path) -> TimelineResult<Box<dyn AudioPlayback>> {
        Err(TimelineError::Audio(format!("no audio output available for {:?}", path)))
    }

    fn decode_samples(&self, path: &Path) -> TimelineResult<DecodedSamples> {
        Err(TimelineError::Audio(format!("no audio decoder available for {:?}", path)))
    }
}

/// One waveform peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformPoint {
    /// Start of the bucket
    pub time_ms: u64,
    /// Peak magnitude of the left channel
    pub left_peak: f32,
    /// Peak magnitude of the right channel (left for mono)
    pub right_peak: f32,
}

/// A reference audio track placed on the timeline
#[derive(Serialize, Deserialize)]
pub struct AudioTrack {
    /// Unique ID
    pub id: AudioTrackId,
    /// Display name
    pub name: String,
    /// Source file
    pub file_path: PathBuf,
    /// Gain, 0 to 1
    pub volume: f32,
    /// Muted tracks never play
    pub muted: bool,
    /// Disabled tracks never play
    pub enabled: bool,
    /// Restart with the animation when it loops
    pub loop_with_animation: bool,
    /// Canvas frame where the audio starts
    pub start_frame_offset: usize,
    /// Peaks for display
    #[serde(skip)]
    pub waveform: Vec<WaveformPoint>,
    #[serde(skip)]
    duration_ms: Option<u64>,
    #[serde(skip)]
    playback: Option<Box<dyn AudioPlayback>>,
}

impl std::fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTrack")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("file_path", &self.file_path)
            .field("volume", &self.volume)
            .field("muted", &self.muted)
            .field("enabled", &self.enabled)
            .field("start_frame_offset", &self.start_frame_offset)
            .field("duration_ms", &self.duration_ms)
            .field("loaded", &self.playback.is_some())
            .finish()
    }
}

impl AudioTrack {
    /// Create an unloaded track named after its file
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Audio".to_string());
        Self {
            id: AudioTrackId::new(),
            name,
            file_path,
            volume: 1.0,
            muted: false,
            enabled: true,
            loop_with_animation: true,
            start_frame_offset: 0,
            waveform: Vec::new(),
            duration_ms: None,
            playback: None,
        }
    }

    /// Set the start offset
    pub fn with_offset(mut self, start_frame_offset: usize) -> Self {
        self.start_frame_offset = start_frame_offset;
        self
    }

    /// Open the file through the backend; on failure the track keeps its settings
    pub fn load(&mut self, backend: &dyn AudioBackend) -> TimelineResult<u64> {
        self.unload();
        let mut playback = backend.open(&self.file_path)?;
        playback.set_volume(self.volume);
        let duration = playback.duration_ms();
        self.duration_ms = Some(duration);
        self.playback = Some(playback);
        Ok(duration)
    }

    /// Drop the open stream
    pub fn unload(&mut self) {
        if let Some(playback) = &mut self.playback {
            playback.pause();
        }
        self.playback = None;
        self.duration_ms = None;
        self.waveform.clear();
    }

    /// Whether the file is open
    pub fn is_loaded(&self) -> bool {
        self.playback.is_some()
    }

    /// Audio length, once loaded
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Whether the track can produce sound at all
    pub fn is_audible(&self) -> bool {
        self.enabled && !self.muted && self.is_loaded()
    }

    /// Whether output is running
    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| p.is_playing())
    }

    /// Audio position for a canvas frame, clamped to the audio length
    pub fn audio_position_ms(&self, frame: usize, fps: u32) -> u64 {
        let audio_frame = frame.saturating_sub(self.start_frame_offset) as u64;
        let position = audio_frame * 1000 / u64::from(fps.max(1));
        match self.duration_ms {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Whether the audio has content at a canvas frame
    pub fn should_play_at_frame(&self, frame: usize, fps: u32, total_frames: usize) -> bool {
        let Some(duration) = self.duration_ms else {
            return false;
        };
        if frame >= total_frames || frame < self.start_frame_offset {
            return false;
        }
        let audio_frame = (frame - self.start_frame_offset) as u64;
        audio_frame * 1000 / u64::from(fps.max(1)) < duration
    }

    /// Canvas frames `[start, end)` where the audio has content
    pub fn audible_frame_range(&self, fps: u32, total_frames: usize) -> Option<(usize, usize)> {
        let duration = self.duration_ms?;
        let start = self.start_frame_offset;
        if start >= total_frames {
            return None;
        }
        let frames = (duration * u64::from(fps.max(1))).div_ceil(1000);
        let end = start.saturating_add(usize::try_from(frames).unwrap_or(usize::MAX)).min(total_frames);
        Some((start, end))
    }

    fn seek_to_frame(&mut self, frame: usize, fps: u32) {
        let position = self.audio_position_ms(frame, fps);
        if let Some(playback) = &mut self.playback {
            playback.seek(position);
        }
    }

    fn pause(&mut self) {
        if let Some(playback) = &mut self.playback {
            if playback.is_playing() {
                playback.pause();
            }
        }
    }

    fn start(&mut self, frame: usize, fps: u32) {
        let position = self.audio_position_ms(frame, fps);
        let volume = self.volume;
        if let Some(playback) = &mut self.playback {
            playback.set_volume(volume);
            playback.seek(position);
            playback.play();
        }
    }
}

/// Shared state of one waveform job
pub struct WaveformJobState {
    /// Progress 0 to 100
    pub progress: AtomicU32,
    /// Cooperative cancel flag
    pub cancelled: AtomicBool,
    /// Set when the worker finished, whatever the outcome
    pub complete: AtomicBool,
    /// Current step for display
    pub step: parking_lot::Mutex<String>,
}

impl WaveformJobState {
    /// Create a fresh job state
    pub fn new() -> Self {
        Self {
            progress: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            step: parking_lot::Mutex::new("Queued".to_string()),
        }
    }

    /// Update the progress
    pub fn set_progress(&self, progress: u32) {
        self.progress.store(progress.min(100), Ordering::Relaxed);
    }

    /// Update the step label
    pub fn set_step(&self, step: impl Into<String>) {
        *self.step.lock() = step.into();
    }

    /// Ask the worker to stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn mark_complete(&self) {
        self.complete.store(true, Ordering::Relaxed);
    }
}

impl Default for WaveformJobState {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce decoded samples to per-bucket peaks, checking `state` for cancellation
pub fn extract_peaks(
    decoded: &DecodedSamples,
    points_per_second: u32,
    state: &WaveformJobState,
) -> TimelineResult<Vec<WaveformPoint>> {
    if decoded.channels == 0 || decoded.sample_rate == 0 {
        return Err(TimelineError::Audio("decoded audio has no channels or sample rate".to_string()));
    }
    let channels = usize::from(decoded.channels);
    let frame_total = decoded.samples.len() / channels;
    let bucket = (decoded.sample_rate / points_per_second.max(1)).max(1) as usize;
    let bucket_total = frame_total.div_ceil(bucket);

    state.set_step("Extracting peaks");
    let mut points = Vec::with_capacity(bucket_total);
    for b in 0..bucket_total {
        if state.is_cancelled() {
            return Err(TimelineError::Cancelled);
        }
        let first = b * bucket;
        let last = (first + bucket).min(frame_total);
        let (mut left, mut right) = (0.0f32, 0.0f32);
        for frame in decoded.samples[first * channels..last * channels].chunks_exact(channels) {
            left = left.max(frame[0].abs());
            right = right.max(frame[if channels > 1 { 1 } else { 0 }].abs());
        }
        points.push(WaveformPoint {
            time_ms: first as u64 * 1000 / u64::from(decoded.sample_rate),
            left_peak: left,
            right_peak: right,
        });
        state.set_progress(((b + 1) * 100 / bucket_total) as u32);
    }
    Ok(points)
}

/// Notifications raised by the audio collection
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// A track opened successfully
    Loaded {
        /// Track
        track_id: AudioTrackId,
        /// Audio length
        duration_ms: u64,
    },
    /// A track could not be opened; its settings are kept for relinking
    LoadFailed {
        /// Track
        track_id: AudioTrackId,
        /// File that failed
        path: PathBuf,
        /// Error text
        message: String,
    },
    /// Waveform peaks arrived
    WaveformReady {
        /// Track
        track_id: AudioTrackId,
        /// Number of peaks
        points: usize,
    },
    /// A track was removed
    Removed(AudioTrackId),
}

struct WaveformDelivery {
    track_id: AudioTrackId,
    generation: u64,
    result: TimelineResult<Vec<WaveformPoint>>,
}

struct WaveformJob {
    generation: u64,
    state: Arc<WaveformJobState>,
}

/// Ordered set of audio tracks synchronised to one timeline
pub struct AudioTrackCollection {
    tracks: Vec<AudioTrack>,
    backend: Arc<dyn AudioBackend>,
    jobs: HashMap<AudioTrackId, WaveformJob>,
    next_generation: u64,
    result_tx: Sender<WaveformDelivery>,
    result_rx: Receiver<WaveformDelivery>,
    /// Peaks per second for new waveform jobs
    pub waveform_points_per_second: u32,
    /// Collection notifications
    pub events: EventEmitter<AudioEvent>,
}

impl std::fmt::Debug for AudioTrackCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTrackCollection")
            .field("tracks", &self.tracks)
            .field("waveform_jobs", &self.jobs.len())
            .finish()
    }
}

impl AudioTrackCollection {
    /// Create an empty collection using `backend` for decoding and output
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        let (result_tx, result_rx) = mpsc::channel();
        Self {
            tracks: Vec::new(),
            backend,
            jobs: HashMap::new(),
            next_generation: 0,
            result_tx,
            result_rx,
            waveform_points_per_second: DEFAULT_WAVEFORM_POINTS_PER_SECOND,
            events: EventEmitter::new(),
        }
    }

    /// Add an unloaded track at the end
    pub fn add_track(&mut self, track: AudioTrack) -> AudioTrackId {
        let id = track.id;
        tracing::debug!("Added audio track '{}' ({:?})", track.name, track.file_path);
        self.tracks.push(track);
        id
    }

    /// Open a track's file and start its waveform job.
    ///
    /// A failed load keeps the track, raises [`AudioEvent::LoadFailed`] and
    /// returns the error. Any waveform job already running for the track is
    /// cancelled first.
    pub fn load_track(&mut self, id: AudioTrackId) -> TimelineResult<u64> {
        self.cancel_waveform(id);
        let backend = Arc::clone(&self.backend);
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TimelineError::Audio(format!("unknown audio track {:?}", id)))?;

        match track.load(backend.as_ref()) {
            Ok(duration_ms) => {
                let path = track.file_path.clone();
                tracing::info!("Loaded audio '{}' ({} ms)", track.name, duration_ms);
                self.events.emit(AudioEvent::Loaded { track_id: id, duration_ms });
                self.start_waveform(id, path);
                Ok(duration_ms)
            }
            Err(e) => {
                tracing::warn!("Failed to load audio {:?}: {}", track.file_path, e);
                self.events.emit(AudioEvent::LoadFailed {
                    track_id: id,
                    path: track.file_path.clone(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Load every unloaded track; failures are reported through events
    pub fn load_all(&mut self) -> usize {
        let pending: Vec<AudioTrackId> = self.tracks.iter().filter(|t| !t.is_loaded()).map(|t| t.id).collect();
        pending.into_iter().filter(|id| self.load_track(*id).is_ok()).count()
    }

    fn start_waveform(&mut self, track_id: AudioTrackId, path: PathBuf) {
        let generation = self.next_generation;
        self.next_generation += 1;
        let state = Arc::new(WaveformJobState::new());
        self.jobs.insert(
            track_id,
            WaveformJob {
                generation,
                state: Arc::clone(&state),
            },
        );

        let backend = Arc::clone(&self.backend);
        let tx = self.result_tx.clone();
        let points_per_second = self.waveform_points_per_second;
        std::thread::spawn(move || {
            state.set_step("Decoding");
            let result = backend
                .decode_samples(&path)
                .and_then(|decoded| extract_peaks(&decoded, points_per_second, &state));
            state.mark_complete();
            // Receiver gone means the collection was dropped
            let _ = tx.send(WaveformDelivery {
                track_id,
                generation,
                result,
            });
        });
    }

    /// Cancel the waveform job of a track, if any
    pub fn cancel_waveform(&mut self, id: AudioTrackId) {
        if let Some(job) = self.jobs.remove(&id) {
            job.state.cancel();
        }
    }

    /// Progress (0 to 100) of a running waveform job
    pub fn waveform_progress(&self, id: AudioTrackId) -> Option<u32> {
        self.jobs.get(&id).map(|job| job.state.progress.load(Ordering::Relaxed))
    }

    /// Apply finished waveform jobs; returns how many tracks received peaks
    pub fn poll_waveforms(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(delivery) = self.result_rx.try_recv() {
            let current = self
                .jobs
                .get(&delivery.track_id)
                .is_some_and(|job| job.generation == delivery.generation);
            if !current {
                continue;
            }
            self.jobs.remove(&delivery.track_id);

            match delivery.result {
                Ok(points) => {
                    let Some(track) = self.tracks.iter_mut().find(|t| t.id == delivery.track_id) else {
                        continue;
                    };
                    let count = points.len();
                    track.waveform = points;
                    delivered += 1;
                    self.events.emit(AudioEvent::WaveformReady {
                        track_id: delivery.track_id,
                        points: count,
                    });
                }
                Err(e) if e.is_cancellation() => {
                    tracing::debug!("Waveform job for {:?} cancelled", delivery.track_id);
                }
                Err(e) => {
                    tracing::warn!("Waveform extraction failed for {:?}: {}", delivery.track_id, e);
                }
            }
        }
        delivered
    }

    /// Remove a track, stopping its output and waveform job
    pub fn remove_track(&mut self, id: AudioTrackId) -> Option<AudioTrack> {
        let idx = self.tracks.iter().position(|t| t.id == id)?;
        self.cancel_waveform(id);
        let mut track = self.tracks.remove(idx);
        track.pause();
        self.events.emit(AudioEvent::Removed(id));
        Some(track)
    }

    /// Move a track to another position
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return false;
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        true
    }

    /// Enable or disable a track; disabling pauses it
    pub fn set_enabled(&mut self, id: AudioTrackId, enabled: bool) -> bool {
        let Some(track) = self.track_mut(id) else {
            return false;
        };
        track.enabled = enabled;
        if !enabled {
            track.pause();
        }
        true
    }

    /// Mute or unmute a track; muting pauses it
    pub fn set_muted(&mut self, id: AudioTrackId, muted: bool) -> bool {
        let Some(track) = self.track_mut(id) else {
            return false;
        };
        track.muted = muted;
        if muted {
            track.pause();
        }
        true
    }

    /// Get a track
    pub fn track(&self, id: AudioTrackId) -> Option<&AudioTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Get a mutable track
    pub fn track_mut(&mut self, id: AudioTrackId) -> Option<&mut AudioTrack> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Tracks in display order
    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Seek every loaded track to the position matching `frame`
    pub fn seek_all(&mut self, frame: usize, fps: u32) {
        for track in &mut self.tracks {
            track.seek_to_frame(frame, fps);
        }
    }

    /// Start or pause each track so its output matches the timeline at `frame`.
    ///
    /// Everything is paused while the scheduler is not playing.
    pub fn update_playback_state_for_frame(&mut self, frame: usize, fps: u32, total_frames: usize, scheduler_playing: bool) {
        for track in &mut self.tracks {
            if !track.is_loaded() {
                continue;
            }
            if !scheduler_playing || !track.enabled || track.muted {
                track.pause();
                continue;
            }
            let should_play = track.should_play_at_frame(frame, fps, total_frames);
            let playing = track.is_playing();
            if should_play && !playing {
                track.start(frame, fps);
            } else if !should_play && playing {
                track.pause();
            }
        }
    }

    /// Re-seek audible tracks that follow the animation back to frame 0
    pub fn on_animation_looped(&mut self, fps: u32) {
        self.resync_after_loop(0, fps);
    }

    /// Re-seek audible tracks that follow the animation to `frame`, where
    /// playback landed after wrapping (a catch-up tick may pass frame 0)
    pub fn resync_after_loop(&mut self, frame: usize, fps: u32) {
        for track in self.tracks.iter_mut().filter(|t| t.is_audible() && t.loop_with_animation) {
            track.seek_to_frame(frame, fps);
        }
    }
}

impl Drop for AudioTrackCollection {
    fn drop(&mut self) {
        for job in self.jobs.values() {
            job.state.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    #[derive(Debug, Default)]
    struct MockOutput {
        playing: bool,
        position_ms: u64,
        plays: usize,
        seeks: Vec<u64>,
    }

    struct MockPlayback {
        duration_ms: u64,
        output: Arc<Mutex<MockOutput>>,
    }

    impl AudioPlayback for MockPlayback {
        fn duration_ms(&self) -> u64 {
            self.duration_ms
        }
        fn position_ms(&self) -> u64 {
            self.output.lock().position_ms
        }
        fn seek(&mut self, position_ms: u64) {
            let mut out = self.output.lock();
            out.position_ms = position_ms;
            out.seeks.push(position_ms);
        }
        fn play(&mut self) {
            let mut out = self.output.lock();
            out.playing = true;
            out.plays += 1;
        }
        fn pause(&mut self) {
            self.output.lock().playing = false;
        }
        fn is_playing(&self) -> bool {
            self.output.lock().playing
        }
        fn set_volume(&mut self, _volume: f32) {}
    }

    #[derive(Default)]
    struct MockBackend {
        durations: HashMap<PathBuf, u64>,
        outputs: Mutex<HashMap<PathBuf, Arc<Mutex<MockOutput>>>>,
    }

    impl MockBackend {
        fn with_file(mut self, path: &str, duration_ms: u64) -> Self {
            self.durations.insert(PathBuf::from(path), duration_ms);
            self
        }

        fn output(&self, path: &str) -> Arc<Mutex<MockOutput>> {
            Arc::clone(self.outputs.lock().entry(PathBuf::from(path)).or_default())
        }
    }

    impl AudioBackend for MockBackend {
        fn open(&self, path: &Path) -> TimelineResult<Box<dyn AudioPlayback>> {
            let duration_ms = *self
                .durations
                .get(path)
                .ok_or_else(|| TimelineError::MissingResource(path.to_path_buf()))?;
            let output = Arc::clone(self.outputs.lock().entry(path.to_path_buf()).or_default());
            Ok(Box::new(MockPlayback { duration_ms, output }))
        }

        fn decode_samples(&self, path: &Path) -> TimelineResult<DecodedSamples> {
            let duration_ms = *self
                .durations
                .get(path)
                .ok_or_else(|| TimelineError::MissingResource(path.to_path_buf()))?;
            let frames = duration_ms as usize;
            let samples = (0..frames).flat_map(|i| [(i % 10) as f32 / 10.0, -0.5]).collect();
            Ok(DecodedSamples {
                sample_rate: 1000,
                channels: 2,
                samples,
            })
        }
    }

    fn loaded_track(offset: usize, duration_ms: u64) -> AudioTrack {
        let backend = MockBackend::default().with_file("beat.wav", duration_ms);
        let mut track = AudioTrack::new("beat.wav").with_offset(offset);
        track.load(&backend).unwrap();
        track
    }

    #[test]
    fn test_audibility_window() {
        let track = loaded_track(10, 500);
        let audible: Vec<usize> = (0..100).filter(|f| track.should_play_at_frame(*f, 10, 100)).collect();
        assert_eq!(audible, (10..15).collect::<Vec<_>>());
        assert_eq!(track.audible_frame_range(10, 100), Some((10, 15)));
        assert_eq!(track.audible_frame_range(10, 12), Some((10, 12)));
        assert_eq!(track.audible_frame_range(10, 10), None);
        assert!(!track.should_play_at_frame(12, 10, 12));
    }

    #[test]
    fn test_audio_position_is_clamped() {
        let track = loaded_track(10, 500);
        assert_eq!(track.audio_position_ms(5, 10), 0);
        assert_eq!(track.audio_position_ms(12, 10), 200);
        assert_eq!(track.audio_position_ms(99, 10), 500);
    }

    #[test]
    fn test_unloaded_track_never_plays() {
        let track = AudioTrack::new("missing.wav");
        assert!(!track.should_play_at_frame(0, 24, 10));
        assert_eq!(track.audible_frame_range(24, 10), None);
        assert_eq!(track.name, "missing");
    }

    #[test]
    fn test_reconcile_playback_with_timeline() {
        let backend = Arc::new(MockBackend::default().with_file("beat.wav", 500));
        let output = backend.output("beat.wav");
        let mut audio = AudioTrackCollection::new(backend);
        let id = audio.add_track(AudioTrack::new("beat.wav").with_offset(10));
        audio.load_track(id).unwrap();

        audio.update_playback_state_for_frame(9, 10, 100, true);
        assert!(!output.lock().playing);

        audio.update_playback_state_for_frame(12, 10, 100, true);
        assert!(output.lock().playing);
        assert_eq!(output.lock().position_ms, 200);

        audio.update_playback_state_for_frame(13, 10, 100, true);
        assert_eq!(output.lock().plays, 1);

        audio.update_playback_state_for_frame(15, 10, 100, true);
        assert!(!output.lock().playing);

        audio.update_playback_state_for_frame(12, 10, 100, true);
        audio.update_playback_state_for_frame(12, 10, 100, false);
        assert!(!output.lock().playing);
    }

    #[test]
    fn test_muted_and_disabled_tracks_pause() {
        let backend = Arc::new(MockBackend::default().with_file("beat.wav", 1000));
        let output = backend.output("beat.wav");
        let mut audio = AudioTrackCollection::new(backend);
        let id = audio.add_track(AudioTrack::new("beat.wav"));
        audio.load_track(id).unwrap();

        audio.update_playback_state_for_frame(0, 10, 100, true);
        assert!(output.lock().playing);
        assert!(audio.set_muted(id, true));
        assert!(!output.lock().playing);
        audio.update_playback_state_for_frame(1, 10, 100, true);
        assert!(!output.lock().playing);

        audio.set_muted(id, false);
        audio.set_enabled(id, false);
        audio.update_playback_state_for_frame(1, 10, 100, true);
        assert!(!output.lock().playing);
    }

    #[test]
    fn test_missing_file_keeps_track_and_notifies() {
        let mut audio = AudioTrackCollection::new(Arc::new(MockBackend::default()));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        audio.events.subscribe(move |e: &AudioEvent| sink.borrow_mut().push(e.clone()));

        let id = audio.add_track(AudioTrack::new("gone.wav"));
        let err = audio.load_track(id).unwrap_err();

        assert!(matches!(err, TimelineError::MissingResource(_)));
        assert_eq!(audio.len(), 1);
        assert!(!audio.track(id).unwrap().is_loaded());
        assert!(matches!(events.borrow()[0], AudioEvent::LoadFailed { track_id, .. } if track_id == id));
    }

    #[test]
    fn test_loop_reseeks_to_start() {
        let backend = Arc::new(MockBackend::default().with_file("beat.wav", 1000));
        let output = backend.output("beat.wav");
        let mut audio = AudioTrackCollection::new(backend);
        let id = audio.add_track(AudioTrack::new("beat.wav"));
        audio.load_track(id).unwrap();

        audio.seek_all(7, 10);
        assert_eq!(output.lock().position_ms, 700);
        audio.on_animation_looped(10);
        assert_eq!(output.lock().position_ms, 0);
    }

    #[test]
    fn test_waveform_delivered_on_poll() {
        let backend = Arc::new(MockBackend::default().with_file("beat.wav", 1000));
        let mut audio = AudioTrackCollection::new(backend);
        let id = audio.add_track(AudioTrack::new("beat.wav"));
        audio.load_track(id).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while audio.poll_waveforms() == 0 {
            assert!(Instant::now() < deadline, "waveform never arrived");
            std::thread::sleep(Duration::from_millis(5));
        }

        let waveform = &audio.track(id).unwrap().waveform;
        assert_eq!(waveform.len(), 100);
        assert_eq!(waveform[1].time_ms, 10);
        assert!((waveform[0].left_peak - 0.9).abs() < 1e-6);
        assert!((waveform[0].right_peak - 0.5).abs() < 1e-6);
        assert_eq!(audio.waveform_progress(id), None);
    }

    #[test]
    fn test_cancelled_extraction_reports_cancellation() {
        let decoded = DecodedSamples {
            sample_rate: 100,
            channels: 1,
            samples: vec![0.5; 1000],
        };
        let state = WaveformJobState::new();
        state.cancel();
        let err = extract_peaks(&decoded, 10, &state).unwrap_err();
        assert!(err.is_cancellation());
    }

    #[test]
    fn test_reorder_and_remove() {
        let mut audio = AudioTrackCollection::new(Arc::new(MockBackend::default()));
        let a = audio.add_track(AudioTrack::new("a.wav"));
        let b = audio.add_track(AudioTrack::new("b.wav"));
        assert!(audio.move_track(1, 0));
        assert_eq!(audio.tracks()[0].id, b);
        assert!(!audio.move_track(0, 5));
        assert!(audio.remove_track(a).is_some());
        assert_eq!(audio.len(), 1);
    }
}
