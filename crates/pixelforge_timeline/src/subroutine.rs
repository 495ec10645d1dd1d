// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sub-routines: reels embedded on the canvas timeline.
//!
//! A sub-routine runs on two nested clocks. The canvas clock decides whether
//! it is active and how far through its span it is (`progress_at`), which
//! drives the transform keys. The reel clock maps the same canvas frame to a
//! tile frame (`tile_frame_index`) that loops or ping-pongs on its own.

use crate::document::TileSource;
use crate::error::{TimelineError, TimelineResult};
use crate::events::EventEmitter;
use crate::interpolation::{self, Easing, Lerp};
use crate::pixels::PixelBuffer;
use crate::reel::TileAnimationReel;
use crate::reel_io;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for a sub-routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRoutineId(pub Uuid);

impl SubRoutineId {
    /// Create a new random sub-routine ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubRoutineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved placement of a sub-routine at one canvas frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubRoutineTransform {
    /// Offset on the canvas, snapped to whole pixels
    pub position: [f32; 2],
    /// Scale per axis
    pub scale: [f32; 2],
    /// Rotation in degrees
    pub rotation: f32,
}

impl Default for SubRoutineTransform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            scale: [1.0, 1.0],
            rotation: 0.0,
        }
    }
}

/// Tile frame for a frame offset into a reel of `frame_count` frames.
///
/// Ping-pong reels bounce over a cycle of `(frame_count - 1) * 2` frames.
pub fn tile_frame_for(relative: usize, frame_count: usize, ping_pong: bool) -> Option<usize> {
    if frame_count == 0 {
        return None;
    }
    if !ping_pong {
        return Some(relative % frame_count);
    }
    let cycle = (frame_count - 1) * 2;
    if cycle == 0 {
        return Some(0);
    }
    let p = relative % cycle;
    Some(if p < frame_count { p } else { cycle - p })
}

/// A reel instance placed on the canvas timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRoutine {
    /// Unique ID
    pub id: SubRoutineId,
    /// Display name
    pub name: String,
    /// Reel file, relative to the document directory
    pub reel_path: PathBuf,
    /// First canvas frame
    pub start_frame: usize,
    duration_frames: usize,
    /// Position keys over normalized progress, sorted and unique
    #[serde(deserialize_with = "sorted_keys")]
    position_keys: Vec<(f32, [f32; 2])>,
    /// Scale keys over normalized progress
    #[serde(deserialize_with = "sorted_keys")]
    scale_keys: Vec<(f32, [f32; 2])>,
    /// Rotation keys in degrees
    #[serde(deserialize_with = "sorted_keys")]
    rotation_keys: Vec<(f32, f32)>,
    /// Easing for position
    pub position_easing: Easing,
    /// Easing for scale
    pub scale_easing: Easing,
    /// Easing for rotation
    pub rotation_easing: Easing,
    /// Draw order; higher draws on top
    pub z_order: i32,
    /// Disabled sub-routines are never active
    pub enabled: bool,
    #[serde(skip)]
    reel: Option<TileAnimationReel>,
    #[serde(skip)]
    frames: HashMap<usize, PixelBuffer>,
}

impl SubRoutine {
    /// Create an unloaded sub-routine spanning `duration_frames` (at least 1)
    pub fn new(name: impl Into<String>, reel_path: impl Into<PathBuf>, start_frame: usize, duration_frames: usize) -> Self {
        Self {
            id: SubRoutineId::new(),
            name: name.into(),
            reel_path: reel_path.into(),
            start_frame,
            duration_frames: duration_frames.max(1),
            position_keys: Vec::new(),
            scale_keys: Vec::new(),
            rotation_keys: Vec::new(),
            position_easing: Easing::Linear,
            scale_easing: Easing::Linear,
            rotation_easing: Easing::Linear,
            z_order: 0,
            enabled: true,
            reel: None,
            frames: HashMap::new(),
        }
    }

    /// Canvas frames covered
    pub fn duration_frames(&self) -> usize {
        self.duration_frames
    }

    /// Change the span; clamped to at least one frame
    pub fn set_duration_frames(&mut self, frames: usize) {
        self.duration_frames = frames.max(1);
    }

    /// First canvas frame after the span
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.duration_frames
    }

    fn contains(&self, canvas_frame: usize) -> bool {
        canvas_frame >= self.start_frame && canvas_frame < self.end_frame()
    }

    /// Whether the sub-routine is enabled and spans `canvas_frame`
    pub fn is_frame_in_range(&self, canvas_frame: usize) -> bool {
        self.enabled && self.contains(canvas_frame)
    }

    /// Normalized progress through the span, `None` outside it
    pub fn progress_at(&self, canvas_frame: usize) -> Option<f32> {
        self.contains(canvas_frame)
            .then(|| (canvas_frame - self.start_frame) as f32 / self.duration_frames as f32)
    }

    /// Tile frame shown at `canvas_frame`; `None` outside the span or before loading
    pub fn tile_frame_index(&self, canvas_frame: usize) -> Option<usize> {
        if !self.contains(canvas_frame) {
            return None;
        }
        let reel = self.reel.as_ref()?;
        tile_frame_for(canvas_frame - self.start_frame, reel.frame_count(), reel.ping_pong)
    }

    /// Pixels shown at `canvas_frame`
    pub fn frame_pixels(&self, canvas_frame: usize) -> Option<&PixelBuffer> {
        self.frames.get(&self.tile_frame_index(canvas_frame)?)
    }

    /// Loaded reel
    pub fn reel(&self) -> Option<&TileAnimationReel> {
        self.reel.as_ref()
    }

    /// Whether a reel is attached
    pub fn is_loaded(&self) -> bool {
        self.reel.is_some()
    }

    /// Load the reel file relative to `base_dir`.
    ///
    /// A missing file leaves the sub-routine in place so it can be relinked.
    pub fn load(&mut self, base_dir: &Path, host: Option<&dyn TileSource>) -> TimelineResult<usize> {
        let path = base_dir.join(&self.reel_path);
        match reel_io::load_reel(&path) {
            Ok(reel) => Ok(self.attach_reel(reel, host)),
            Err(e) => {
                tracing::warn!("Sub-routine '{}' failed to load {:?}: {}", self.name, path, e);
                Err(e)
            }
        }
    }

    /// Attach a reel and resolve its frame pixels; returns the number of frames resolved.
    ///
    /// Embedded pixels are used first; other frames are rendered from `host`.
    pub fn attach_reel(&mut self, reel: TileAnimationReel, host: Option<&dyn TileSource>) -> usize {
        self.frames.clear();
        for (i, frame) in reel.frames.iter().enumerate() {
            let pixels = match (&frame.embedded_pixels, host) {
                (Some(pixels), _) => Some(pixels.clone()),
                (None, Some(host)) => host.render_tile(frame.tile_x, frame.tile_y, reel.frame_width, reel.frame_height),
                (None, None) => None,
            };
            if let Some(pixels) = pixels {
                self.frames.insert(i, pixels);
            }
        }

        let resolved = self.frames.len();
        if resolved < reel.frame_count() {
            tracing::warn!(
                "Sub-routine '{}': {} of {} reel frames have no pixels",
                self.name,
                reel.frame_count() - resolved,
                reel.frame_count()
            );
        } else {
            tracing::debug!("Sub-routine '{}' loaded {} frames", self.name, resolved);
        }
        self.reel = Some(reel);
        resolved
    }

    /// Drop the loaded reel and frames
    pub fn unload(&mut self) {
        self.reel = None;
        self.frames.clear();
    }

    /// Position keys in progress order
    pub fn position_keys(&self) -> &[(f32, [f32; 2])] {
        &self.position_keys
    }

    /// Scale keys in progress order
    pub fn scale_keys(&self) -> &[(f32, [f32; 2])] {
        &self.scale_keys
    }

    /// Rotation keys in progress order
    pub fn rotation_keys(&self) -> &[(f32, f32)] {
        &self.rotation_keys
    }

    /// Insert or replace the position key at `progress` (clamped to 0..=1).
    ///
    /// Returns true when a key was replaced; non-finite progress is ignored.
    pub fn set_position_key(&mut self, progress: f32, position: [f32; 2]) -> bool {
        upsert_key(&mut self.position_keys, progress, position)
    }

    /// Insert or replace the scale key at `progress`
    pub fn set_scale_key(&mut self, progress: f32, scale: [f32; 2]) -> bool {
        upsert_key(&mut self.scale_keys, progress, scale)
    }

    /// Insert or replace the rotation key at `progress`
    pub fn set_rotation_key(&mut self, progress: f32, degrees: f32) -> bool {
        upsert_key(&mut self.rotation_keys, progress, degrees)
    }

    /// Remove the position key at exactly `progress`
    pub fn remove_position_key(&mut self, progress: f32) -> Option<[f32; 2]> {
        remove_key(&mut self.position_keys, progress)
    }

    /// Remove the scale key at exactly `progress`
    pub fn remove_scale_key(&mut self, progress: f32) -> Option<[f32; 2]> {
        remove_key(&mut self.scale_keys, progress)
    }

    /// Remove the rotation key at exactly `progress`
    pub fn remove_rotation_key(&mut self, progress: f32) -> Option<f32> {
        remove_key(&mut self.rotation_keys, progress)
    }

    /// Interpolated transform at `canvas_frame`; missing keys give identity values
    pub fn transform_at(&self, canvas_frame: usize) -> Option<SubRoutineTransform> {
        let progress = self.progress_at(canvas_frame)?;
        let identity = SubRoutineTransform::default();
        let position = keyed(&self.position_keys, progress, self.position_easing).unwrap_or(identity.position);
        let scale = keyed(&self.scale_keys, progress, self.scale_easing).unwrap_or(identity.scale);
        let rotation = keyed(&self.rotation_keys, progress, self.rotation_easing).unwrap_or(identity.rotation);
        Some(SubRoutineTransform {
            position: interpolation::snap_to_pixel(position),
            scale,
            rotation,
        })
    }
}

fn key_position<V>(keys: &[(f32, V)], progress: f32) -> Result<usize, usize> {
    keys.binary_search_by(|(p, _)| p.partial_cmp(&progress).unwrap_or(Ordering::Less))
}

fn upsert_key<V>(keys: &mut Vec<(f32, V)>, progress: f32, value: V) -> bool {
    if !progress.is_finite() {
        return false;
    }
    let progress = progress.clamp(0.0, 1.0);
    match key_position(keys, progress) {
        Ok(idx) => {
            keys[idx].1 = value;
            true
        }
        Err(idx) => {
            keys.insert(idx, (progress, value));
            false
        }
    }
}

fn remove_key<V>(keys: &mut Vec<(f32, V)>, progress: f32) -> Option<V> {
    let idx = key_position(keys, progress).ok()?;
    Some(keys.remove(idx).1)
}

fn sorted_keys<'de, D, V>(deserializer: D) -> Result<Vec<(f32, V)>, D::Error>
where
    D: serde::Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw: Vec<(f32, V)> = Vec::deserialize(deserializer)?;
    let mut keys = Vec::with_capacity(raw.len());
    for (progress, value) in raw {
        upsert_key(&mut keys, progress, value);
    }
    Ok(keys)
}

fn keyed<V: Lerp>(keys: &[(f32, V)], progress: f32, easing: Easing) -> Option<V> {
    if keys.is_empty() {
        return None;
    }
    interpolation::continuous_uniform(keys, progress, easing).ok()
}

/// Notifications raised while loading sub-routines
#[derive(Debug, Clone, PartialEq)]
pub enum SubRoutineEvent {
    /// A reel was attached
    Loaded {
        /// Sub-routine
        id: SubRoutineId,
        /// Frames with pixels
        frames: usize,
    },
    /// The reel could not be loaded; the sub-routine is kept for relinking
    LoadFailed {
        /// Sub-routine
        id: SubRoutineId,
        /// Reel file that failed
        path: PathBuf,
        /// Error text
        message: String,
    },
}

/// All sub-routines of a document and their combined state at the current frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationSubRoutineState {
    sub_routines: Vec<SubRoutine>,
    #[serde(skip)]
    active: Vec<SubRoutineId>,
    #[serde(skip)]
    transform: Option<SubRoutineTransform>,
    /// Load notifications
    #[serde(skip)]
    pub events: EventEmitter<SubRoutineEvent>,
}

impl AnimationSubRoutineState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sub-routine
    pub fn add(&mut self, sub_routine: SubRoutine) -> SubRoutineId {
        let id = sub_routine.id;
        self.sub_routines.push(sub_routine);
        id
    }

    /// Remove a sub-routine
    pub fn remove(&mut self, id: SubRoutineId) -> Option<SubRoutine> {
        let idx = self.sub_routines.iter().position(|s| s.id == id)?;
        self.active.retain(|a| *a != id);
        Some(self.sub_routines.remove(idx))
    }

    /// Get a sub-routine
    pub fn get(&self, id: SubRoutineId) -> Option<&SubRoutine> {
        self.sub_routines.iter().find(|s| s.id == id)
    }

    /// Get a mutable sub-routine
    pub fn get_mut(&mut self, id: SubRoutineId) -> Option<&mut SubRoutine> {
        self.sub_routines.iter_mut().find(|s| s.id == id)
    }

    /// All sub-routines
    pub fn iter(&self) -> impl Iterator<Item = &SubRoutine> {
        self.sub_routines.iter()
    }

    /// Number of sub-routines
    pub fn len(&self) -> usize {
        self.sub_routines.len()
    }

    /// Whether there are no sub-routines
    pub fn is_empty(&self) -> bool {
        self.sub_routines.is_empty()
    }

    /// Load every unloaded sub-routine.
    ///
    /// Each outcome is emitted as a [`SubRoutineEvent`]; failures are also returned.
    pub fn load_all(&mut self, base_dir: &Path, host: Option<&dyn TileSource>) -> Vec<(SubRoutineId, TimelineError)> {
        let mut failures = Vec::new();
        for sub in self.sub_routines.iter_mut().filter(|s| !s.is_loaded()) {
            match sub.load(base_dir, host) {
                Ok(frames) => self.events.emit(SubRoutineEvent::Loaded { id: sub.id, frames }),
                Err(e) => {
                    self.events.emit(SubRoutineEvent::LoadFailed {
                        id: sub.id,
                        path: base_dir.join(&sub.reel_path),
                        message: e.to_string(),
                    });
                    failures.push((sub.id, e));
                }
            }
        }
        failures
    }

    /// Recompute active sub-routines and their averaged transform
    pub fn update_for_frame(&mut self, canvas_frame: usize) -> Option<SubRoutineTransform> {
        let mut active: Vec<&SubRoutine> = self
            .sub_routines
            .iter()
            .filter(|s| s.is_frame_in_range(canvas_frame))
            .collect();
        active.sort_by_key(|s| s.z_order);

        let transforms: Vec<SubRoutineTransform> = active.iter().filter_map(|s| s.transform_at(canvas_frame)).collect();
        self.active = active.iter().map(|s| s.id).collect();
        self.transform = average(&transforms);
        self.transform
    }

    /// Active sub-routines from the last update, bottom to top
    pub fn active_ids(&self) -> &[SubRoutineId] {
        &self.active
    }

    /// Averaged transform from the last update
    pub fn current_transform(&self) -> Option<SubRoutineTransform> {
        self.transform
    }

    /// Blend the frame pixels of every active sub-routine onto `target` at
    /// their snapped positions, lowest z-order first
    pub fn composite_onto(&self, canvas_frame: usize, target: &mut PixelBuffer) -> usize {
        let mut drawn = 0;
        for id in &self.active {
            let Some(sub) = self.get(*id) else { continue };
            let (Some(pixels), Some(transform)) = (sub.frame_pixels(canvas_frame), sub.transform_at(canvas_frame)) else {
                continue;
            };
            target.blend_over(pixels, transform.position[0] as i32, transform.position[1] as i32, 255);
            drawn += 1;
        }
        drawn
    }
}

/// Component-wise mean; rotation is averaged as plain degrees
fn average(transforms: &[SubRoutineTransform]) -> Option<SubRoutineTransform> {
    if transforms.is_empty() {
        return None;
    }
    let n = transforms.len() as f32;
    let mut sum = SubRoutineTransform {
        position: [0.0, 0.0],
        scale: [0.0, 0.0],
        rotation: 0.0,
    };
    for t in transforms {
        sum.position[0] += t.position[0];
        sum.position[1] += t.position[1];
        sum.scale[0] += t.scale[0];
        sum.scale[1] += t.scale[1];
        sum.rotation += t.rotation;
    }
    Some(SubRoutineTransform {
        position: [sum.position[0] / n, sum.position[1] / n],
        scale: [sum.scale[0] / n, sum.scale[1] / n],
        rotation: sum.rotation / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reel::ReelFrame;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn reel(frames: usize, ping_pong: bool) -> TileAnimationReel {
        let mut reel = TileAnimationReel::new("Spark", 1, 1);
        reel.ping_pong = ping_pong;
        for i in 0..frames {
            reel.add_frame(ReelFrame::new(i as i32, 0).with_pixels(PixelBuffer::filled(1, 1, [i as u8, 0, 0, 255])));
        }
        reel
    }

    fn loaded(start: usize, duration: usize, frames: usize, ping_pong: bool) -> SubRoutine {
        let mut sub = SubRoutine::new("Spark", "spark.pxpr", start, duration);
        sub.attach_reel(reel(frames, ping_pong), None);
        sub
    }

    #[test]
    fn test_ping_pong_tile_mapping() {
        let sub = loaded(0, 20, 4, true);
        let frames: Vec<usize> = (0..10).filter_map(|f| sub.tile_frame_index(f)).collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 2, 1, 0, 1, 2, 3]);
    }

    #[test]
    fn test_looping_tile_mapping_is_relative_to_start() {
        let sub = loaded(5, 10, 3, false);
        assert_eq!(sub.tile_frame_index(4), None);
        assert_eq!(sub.tile_frame_index(5), Some(0));
        assert_eq!(sub.tile_frame_index(8), Some(0));
        assert_eq!(sub.tile_frame_index(9), Some(1));
        assert_eq!(sub.tile_frame_index(15), None);
        assert_eq!(sub.frame_pixels(9).unwrap().pixel(0, 0), Some([1, 0, 0, 255]));
    }

    #[test]
    fn test_single_frame_ping_pong() {
        assert_eq!(tile_frame_for(7, 1, true), Some(0));
        assert_eq!(tile_frame_for(7, 0, false), None);
    }

    #[test]
    fn test_duration_is_at_least_one() {
        let mut sub = SubRoutine::new("Empty", "x.pxpr", 3, 0);
        assert_eq!(sub.duration_frames(), 1);
        assert_eq!(sub.end_frame(), 4);
        sub.set_duration_frames(0);
        assert_eq!(sub.duration_frames(), 1);
    }

    #[test]
    fn test_disabled_is_never_in_range() {
        let mut sub = loaded(0, 4, 2, false);
        assert!(sub.is_frame_in_range(1));
        sub.enabled = false;
        assert!(!sub.is_frame_in_range(1));
    }

    #[test]
    fn test_transform_interpolates_and_snaps_position() {
        let mut sub = loaded(10, 10, 2, false);
        sub.set_position_key(0.0, [0.0, 0.0]);
        sub.set_position_key(1.0, [10.0, 5.0]);
        sub.set_rotation_key(0.0, 0.0);
        sub.set_rotation_key(1.0, 90.0);

        let t = sub.transform_at(13).unwrap();
        assert_eq!(t.position, [3.0, 2.0]);
        assert_eq!(t.scale, [1.0, 1.0]);
        assert!((t.rotation - 27.0).abs() < 1e-4);
        assert!(sub.transform_at(20).is_none());
    }

    #[test]
    fn test_update_for_frame_averages_active() {
        let mut state = AnimationSubRoutineState::new();
        let mut a = loaded(0, 10, 2, false);
        a.set_position_key(0.0, [2.0, 2.0]);
        a.set_rotation_key(0.0, 350.0);
        let mut b = loaded(5, 10, 2, false);
        b.set_position_key(0.0, [6.0, 4.0]);
        b.set_rotation_key(0.0, 10.0);
        b.z_order = -1;
        let a_id = state.add(a);
        let b_id = state.add(b);

        let t = state.update_for_frame(2).unwrap();
        assert_eq!(t.position, [2.0, 2.0]);

        let t = state.update_for_frame(6).unwrap();
        assert_eq!(t.position, [4.0, 3.0]);
        assert_eq!(t.rotation, 180.0);
        assert_eq!(state.active_ids(), &[b_id, a_id]);

        assert!(state.update_for_frame(20).is_none());
        assert!(state.active_ids().is_empty());
    }

    #[test]
    fn test_host_fallback_renders_tiles() {
        struct Checker;
        impl TileSource for Checker {
            fn render_tile(&self, tile_x: i32, _tile_y: i32, width: u32, height: u32) -> Option<PixelBuffer> {
                (tile_x < 2).then(|| PixelBuffer::filled(width, height, [tile_x as u8, 9, 9, 255]))
            }
        }

        let mut reel = TileAnimationReel::new("Legacy", 2, 2);
        for x in 0..3 {
            reel.add_frame(ReelFrame::new(x, 0));
        }
        let mut sub = SubRoutine::new("Legacy", "legacy.pxpr", 0, 3);
        assert_eq!(sub.attach_reel(reel, Some(&Checker as &dyn TileSource)), 2);
        assert!(sub.frame_pixels(1).is_some());
        assert!(sub.frame_pixels(2).is_none());
    }

    #[test]
    fn test_missing_reel_keeps_sub_routine() {
        let mut state = AnimationSubRoutineState::new();
        let id = state.add(SubRoutine::new("Gone", "missing-reel.pxpr", 0, 4));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        state.events.subscribe(move |e: &SubRoutineEvent| sink.borrow_mut().push(e.clone()));

        let base = std::env::temp_dir().join("pixelforge-no-such-dir");
        let failures = state.load_all(&base, None);

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].1, TimelineError::MissingResource(_)));
        assert!(state.get(id).is_some());
        assert!(!state.get(id).unwrap().is_loaded());

        let events = seen.borrow();
        assert_eq!(events.len(), 1);
        match &events[0] {
            SubRoutineEvent::LoadFailed { id: failed, path, .. } => {
                assert_eq!(*failed, id);
                assert_eq!(path, &base.join("missing-reel.pxpr"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_transform_keys_stay_sorted() {
        let mut sub = loaded(0, 10, 2, false);
        assert!(!sub.set_position_key(1.0, [10.0, 0.0]));
        assert!(!sub.set_position_key(0.0, [0.0, 0.0]));
        assert_eq!(sub.transform_at(5).unwrap().position, [5.0, 0.0]);

        assert!(sub.set_position_key(1.0, [20.0, 0.0]));
        assert!(sub.set_position_key(1.5, [30.0, 0.0]));
        assert_eq!(sub.position_keys().len(), 2);
        assert_eq!(sub.position_keys()[1], (1.0, [30.0, 0.0]));

        assert!(!sub.set_rotation_key(f32::NAN, 45.0));
        assert!(sub.rotation_keys().is_empty());
        assert_eq!(sub.remove_position_key(0.0), Some([0.0, 0.0]));
        assert_eq!(sub.remove_position_key(0.5), None);
    }

    #[test]
    fn test_deserialized_keys_are_sorted() {
        #[derive(Deserialize)]
        struct Keys {
            #[serde(deserialize_with = "sorted_keys")]
            keys: Vec<(f32, f32)>,
        }

        let parsed: Keys = ron::from_str("(keys: [(1.0, 10.0), (0.0, 0.0), (1.0, 20.0)])").unwrap();
        assert_eq!(parsed.keys, vec![(0.0, 0.0), (1.0, 20.0)]);
    }

    #[test]
    fn test_composite_onto_draws_at_position() {
        let mut state = AnimationSubRoutineState::new();
        let mut sub = loaded(0, 4, 2, false);
        sub.set_position_key(0.0, [1.0, 1.0]);
        state.add(sub);
        state.update_for_frame(1);

        let mut target = PixelBuffer::new(3, 3);
        assert_eq!(state.composite_onto(1, &mut target), 1);
        assert_eq!(target.pixel(1, 1), Some([1, 0, 0, 255]));
        assert_eq!(target.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
