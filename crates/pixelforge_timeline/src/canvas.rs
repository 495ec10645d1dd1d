// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas animation: layer tracks, the stage track and their pixel store.

use crate::config::{TimelineSettings, FPS_RANGE};
use crate::document::{DocumentModel, LayerId};
use crate::error::{TimelineError, TimelineResult};
use crate::events::EventEmitter;
use crate::interpolation::Easing;
use crate::keyframe::StageKeyframe;
use crate::onion::{OnionFrame, OnionSkinSettings};
use crate::scheduler::FrameSource;
use crate::stage::{StageSettings, StageState};
use crate::store::{KeyframeStore, PixelDataId};
use crate::track::{self, LayerTrack, StageTrack};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extension of the binary pixel store written next to an animation file
pub const STORE_EXTENSION: &str = "pxstore";

/// Track notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    /// A layer gained a track
    TrackAdded(LayerId),
    /// A layer's track was dropped
    TrackRemoved(LayerId),
    /// Keyframes changed on a layer track (`None` for the stage track)
    KeyframesChanged(Option<LayerId>),
    /// The frame count changed
    FrameCountChanged(usize),
}

/// Outcome of [`CanvasAnimation::sync_layers`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Layers that gained a track
    pub added: Vec<LayerId>,
    /// Layers whose track was dropped
    pub removed: Vec<LayerId>,
}

/// Outcome of [`CanvasAnimation::apply_frame_to_document`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Frame applied
    pub frame: usize,
    /// Layers that received keyframe state
    pub applied_layers: usize,
    /// Tracks before their first keyframe, left untouched
    pub untouched_layers: usize,
    /// Tracks whose layer is gone from the document
    pub missing_layers: Vec<LayerId>,
    /// Pixel or mask writes skipped for size
    pub size_mismatches: usize,
    /// Pixel ids that did not resolve
    pub missing_pixel_data: usize,
    /// Effect states with no matching effect instance
    pub unmatched_effects: usize,
    /// Interpolated camera, when the stage track has keyframes
    pub stage: Option<StageState>,
}

impl ApplyReport {
    /// Whether anything was skipped
    pub fn has_skips(&self) -> bool {
        !self.missing_layers.is_empty() || self.size_mismatches > 0 || self.missing_pixel_data > 0
    }
}

/// Keyframed animation of a whole document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasAnimation {
    /// Display name
    pub name: String,
    frame_count: usize,
    fps: u32,
    /// Document canvas size in pixels, recorded on layer sync
    #[serde(default = "default_canvas_size")]
    canvas_size: (u32, u32),
    /// Wrap at the end instead of stopping
    pub looping: bool,
    /// Bounce at the ends
    pub ping_pong: bool,
    /// Layer tracks, top layer first
    tracks: Vec<LayerTrack>,
    /// Camera keyframes
    pub stage_track: StageTrack,
    /// Camera configuration
    pub stage: StageSettings,
    /// Onion skin overlay
    pub onion_skin: OnionSkinSettings,
    #[serde(skip)]
    store: KeyframeStore,
    /// Track notifications
    #[serde(skip)]
    pub events: EventEmitter<TrackEvent>,
}

impl CanvasAnimation {
    /// Create an empty animation; `frame_count` is at least 1 and `fps` is clamped
    pub fn new(name: impl Into<String>, frame_count: usize, fps: u32) -> Self {
        Self {
            name: name.into(),
            frame_count: frame_count.max(1),
            fps: fps.clamp(*FPS_RANGE.start(), *FPS_RANGE.end()),
            canvas_size: default_canvas_size(),
            looping: true,
            ping_pong: false,
            tracks: Vec::new(),
            stage_track: StageTrack::new(),
            stage: StageSettings::default(),
            onion_skin: OnionSkinSettings::default(),
            store: KeyframeStore::new(),
            events: EventEmitter::new(),
        }
    }

    /// Create an animation for a document using configured defaults
    pub fn for_document(name: impl Into<String>, doc: &dyn DocumentModel, settings: &TimelineSettings) -> Self {
        let mut animation = Self::new(name, settings.default_frame_count, settings.default_fps);
        animation.looping = settings.default_looping;
        animation.onion_skin = settings.onion_skin;
        let (width, height) = doc.canvas_size();
        animation.stage = StageSettings::for_canvas(width, height);
        animation.sync_layers(doc);
        animation
    }

    /// Canvas size of the document the tracks were synced against
    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas_size
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Change the frame count; keyframes past the end are dropped
    pub fn set_frame_count(&mut self, frame_count: usize) {
        let frame_count = frame_count.max(1);
        if frame_count == self.frame_count {
            return;
        }
        self.frame_count = frame_count;
        for track in &mut self.tracks {
            track.truncate(frame_count);
        }
        self.stage_track.truncate(frame_count);
        self.events.emit(TrackEvent::FrameCountChanged(frame_count));
    }

    /// Frames per second
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Set frames per second, clamped to 1..=60
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.clamp(*FPS_RANGE.start(), *FPS_RANGE.end());
    }

    /// Duration of one frame
    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps)
    }

    /// Pixel snapshots
    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    /// Layer tracks, top layer first
    pub fn tracks(&self) -> &[LayerTrack] {
        &self.tracks
    }

    /// Layer tracks, mutably
    pub fn tracks_mut(&mut self) -> &mut [LayerTrack] {
        &mut self.tracks
    }

    /// Track of a layer
    pub fn track(&self, layer_id: LayerId) -> Option<&LayerTrack> {
        self.tracks.iter().find(|t| t.layer_id == layer_id)
    }

    /// Track of a layer, mutably
    pub fn track_mut(&mut self, layer_id: LayerId) -> Option<&mut LayerTrack> {
        self.tracks.iter_mut().find(|t| t.layer_id == layer_id)
    }

    /// Match tracks to the document's animatable layers.
    ///
    /// Existing tracks keep their keyframes, new layers get empty tracks,
    /// tracks of deleted layers are dropped and order follows the document
    /// top to bottom.
    pub fn sync_layers(&mut self, doc: &dyn DocumentModel) -> SyncReport {
        let mut report = SyncReport::default();
        self.canvas_size = doc.canvas_size();
        let mut old: Vec<LayerTrack> = std::mem::take(&mut self.tracks);

        for id in doc.layer_ids().into_iter().rev() {
            let Some(layer) = doc.layer(id) else { continue };
            if !layer.is_animatable() {
                continue;
            }
            let track = match old.iter().position(|t| t.layer_id == id) {
                Some(idx) => {
                    let mut track = old.swap_remove(idx);
                    track.layer_name.clone_from(&layer.name);
                    track
                }
                None => {
                    report.added.push(id);
                    LayerTrack::new(id, layer.name.clone())
                }
            };
            self.tracks.push(track);
        }
        report.removed = old.into_iter().map(|t| t.layer_id).collect();

        for id in &report.added {
            self.events.emit(TrackEvent::TrackAdded(*id));
        }
        for id in &report.removed {
            self.events.emit(TrackEvent::TrackRemoved(*id));
        }
        if !report.added.is_empty() || !report.removed.is_empty() {
            tracing::debug!(
                "Synced layer tracks: {} added, {} removed, {} total",
                report.added.len(),
                report.removed.len(),
                self.tracks.len()
            );
        }
        report
    }

    fn check_frame(&self, frame: usize) -> TimelineResult<()> {
        if frame >= self.frame_count {
            return Err(TimelineError::Invariant("frame is beyond the end of the animation"));
        }
        Ok(())
    }

    /// Capture one layer's current state at `frame`
    pub fn capture_keyframe(&mut self, doc: &dyn DocumentModel, layer_id: LayerId, frame: usize) -> TimelineResult<()> {
        self.check_frame(frame)?;
        let layer = doc
            .layer(layer_id)
            .ok_or_else(|| TimelineError::LayerNotFound(layer_id.to_string()))?;
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.layer_id == layer_id)
            .ok_or_else(|| TimelineError::LayerNotFound(layer_id.to_string()))?;
        track.capture_keyframe(layer, frame, &mut self.store);
        self.events.emit(TrackEvent::KeyframesChanged(Some(layer_id)));
        Ok(())
    }

    /// Capture every tracked layer at `frame`; returns the number captured
    pub fn capture_all(&mut self, doc: &dyn DocumentModel, frame: usize) -> TimelineResult<usize> {
        self.check_frame(frame)?;
        let mut captured = 0;
        for track in &mut self.tracks {
            match doc.layer(track.layer_id) {
                Some(layer) => {
                    track.capture_keyframe(layer, frame, &mut self.store);
                    captured += 1;
                }
                None => tracing::warn!("Layer '{}' missing during capture", track.layer_name),
            }
        }
        self.events.emit(TrackEvent::KeyframesChanged(None));
        Ok(captured)
    }

    /// Remove a layer keyframe
    pub fn remove_keyframe(&mut self, layer_id: LayerId, frame: usize) -> bool {
        let removed = self
            .track_mut(layer_id)
            .and_then(|t| t.remove_keyframe(frame))
            .is_some();
        if removed {
            self.events.emit(TrackEvent::KeyframesChanged(Some(layer_id)));
        }
        removed
    }

    /// Capture the current stage settings at `frame`
    pub fn capture_stage_keyframe(&mut self, frame: usize, easing: Easing) -> TimelineResult<StageKeyframe> {
        self.check_frame(frame)?;
        let keyframe = self.stage_track.capture_keyframe(frame, &self.stage, easing);
        self.events.emit(TrackEvent::KeyframesChanged(None));
        Ok(keyframe)
    }

    /// Camera state at `frame`: interpolated keyframes, or the live settings
    pub fn stage_state_at(&self, frame: usize) -> StageState {
        self.stage_track.interpolated_state_at(frame).unwrap_or(self.stage.current)
    }

    /// Write the state of every track at `frame` onto the document and recomposite.
    ///
    /// Missing layers, size mismatches and unknown effects are skipped and
    /// logged; the rest of the frame still applies.
    pub fn apply_frame_to_document(&self, doc: &mut dyn DocumentModel, frame: usize) -> ApplyReport {
        let mut report = ApplyReport {
            frame,
            ..ApplyReport::default()
        };

        for track in &self.tracks {
            let Some(keyframe) = track.effective_state_at(frame) else {
                report.untouched_layers += 1;
                continue;
            };
            let Some(layer) = doc.layer_mut(track.layer_id) else {
                tracing::warn!("Layer '{}' not found; skipping its track", track.layer_name);
                report.missing_layers.push(track.layer_id);
                continue;
            };
            let outcome = track::apply_keyframe_to_layer(keyframe, layer, &self.store);
            report.applied_layers += 1;
            report.size_mismatches += outcome.size_mismatches;
            report.missing_pixel_data += outcome.missing_pixel_data;
            report.unmatched_effects += outcome.unmatched_effects;
        }

        report.stage = self.stage_track.interpolated_state_at(frame);
        doc.recomposite();
        report
    }

    /// Insert an empty frame before `at`, shifting later keyframes right
    pub fn insert_frame(&mut self, at: usize) {
        let at = at.min(self.frame_count);
        for track in &mut self.tracks {
            track.shift_from(at, 1);
        }
        self.stage_track.shift_from(at, 1);
        self.frame_count += 1;
        self.events.emit(TrackEvent::FrameCountChanged(self.frame_count));
        self.events.emit(TrackEvent::KeyframesChanged(None));
    }

    /// Delete frame `at`, dropping its keyframes and shifting later ones left.
    ///
    /// The last remaining frame cannot be deleted.
    pub fn delete_frame(&mut self, at: usize) -> bool {
        if self.frame_count <= 1 || at >= self.frame_count {
            return false;
        }
        for track in &mut self.tracks {
            track.remove_keyframe(at);
            track.shift_from(at + 1, -1);
        }
        self.stage_track.remove_keyframe(at);
        self.stage_track.shift_from(at + 1, -1);
        self.frame_count -= 1;
        self.events.emit(TrackEvent::FrameCountChanged(self.frame_count));
        self.events.emit(TrackEvent::KeyframesChanged(None));
        true
    }

    /// Pixel ids referenced by any layer track
    pub fn referenced_pixel_ids(&self) -> HashSet<PixelDataId> {
        self.tracks.iter().flat_map(|t| t.referenced_pixel_ids()).collect()
    }

    /// Delete store entries no track references.
    ///
    /// `extra` keeps ids held elsewhere, such as the clipboard.
    pub fn sweep_orphaned_pixel_data(&mut self, extra: impl IntoIterator<Item = PixelDataId>) -> usize {
        let mut referenced = self.referenced_pixel_ids();
        referenced.extend(extra);
        let removed = self.store.retain_referenced(&referenced);
        if removed > 0 {
            tracing::info!("Reclaimed {} orphaned pixel snapshots", removed);
        }
        removed
    }

    /// Onion skin frames around `current`
    pub fn onion_frames(&self, current: usize) -> Vec<OnionFrame> {
        self.onion_skin.onion_frames(current, self.frame_count)
    }

    /// Serialize the animation (without pixel data) to RON
    pub fn to_ron(&self) -> TimelineResult<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Parse an animation from RON; the pixel store starts empty
    pub fn from_ron(s: &str) -> TimelineResult<Self> {
        let mut animation: CanvasAnimation = ron::from_str(s)?;
        animation.frame_count = animation.frame_count.max(1);
        animation.set_fps(animation.fps);
        Ok(animation)
    }

    /// Path of the pixel store written next to `path`
    pub fn store_path(path: &Path) -> PathBuf {
        path.with_extension(STORE_EXTENSION)
    }

    /// Save the animation as RON plus its pixel store as a binary sidecar
    pub fn save(&self, path: &Path) -> TimelineResult<()> {
        std::fs::write(path, self.to_ron()?)?;
        std::fs::write(Self::store_path(path), self.store.to_bytes()?)?;
        tracing::info!(
            "Saved animation '{}' ({} frames, {} snapshots) to {:?}",
            self.name,
            self.frame_count,
            self.store.len(),
            path
        );
        Ok(())
    }

    /// Load an animation and its pixel store
    pub fn load(path: &Path) -> TimelineResult<Self> {
        if !path.exists() {
            return Err(TimelineError::MissingResource(path.to_path_buf()));
        }
        let mut animation = Self::from_ron(&std::fs::read_to_string(path)?)?;
        let store_path = Self::store_path(path);
        if !store_path.exists() {
            return Err(TimelineError::MissingResource(store_path));
        }
        animation.store = KeyframeStore::from_bytes(&std::fs::read(&store_path)?)?;

        let dangling = animation
            .referenced_pixel_ids()
            .into_iter()
            .filter(|id| !animation.store.contains(*id))
            .count();
        if dangling > 0 {
            tracing::warn!("{} keyframe pixel references do not resolve in {:?}", dangling, store_path);
        }
        Ok(animation)
    }
}

fn default_canvas_size() -> (u32, u32) {
    let stage = StageSettings::default();
    (stage.viewport_width, stage.viewport_height)
}

impl FrameSource for CanvasAnimation {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn frame_duration_ms(&self, _frame: usize) -> f64 {
        CanvasAnimation::frame_duration_ms(self)
    }

    fn looping(&self) -> bool {
        self.looping
    }

    fn ping_pong(&self) -> bool {
        self.ping_pong
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Layer, LayerKind, MemoryDocument};
    use crate::pixels::PixelBuffer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc_with_layers() -> (MemoryDocument, LayerId, LayerId) {
        let mut doc = MemoryDocument::new(2, 2);
        let bottom = doc.push_layer(Layer::raster("Background", 2, 2));
        let top = doc.push_layer(Layer::raster("Ink", 2, 2));
        doc.push_layer(Layer::raster("Sketch", 2, 2).with_kind(LayerKind::Reference));
        (doc, bottom, top)
    }

    #[test]
    fn test_fps_and_frame_count_bounds() {
        let mut animation = CanvasAnimation::new("Clamp", 0, 0);
        assert_eq!(animation.frame_count(), 1);
        assert_eq!(animation.fps(), 1);
        animation.set_fps(120);
        assert_eq!(animation.fps(), 60);
    }

    #[test]
    fn test_sync_orders_top_to_bottom_and_skips_reference() {
        let (mut doc, bottom, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Walk", &doc, &TimelineSettings::default());
        let ids: Vec<LayerId> = animation.tracks().iter().map(|t| t.layer_id).collect();
        assert_eq!(ids, vec![top, bottom]);

        doc.remove_layer(bottom);
        let report = animation.sync_layers(&doc);
        assert_eq!(report.removed, vec![bottom]);
        assert_eq!(animation.tracks().len(), 1);
    }

    #[test]
    fn test_sync_records_canvas_size() {
        let mut animation = CanvasAnimation::new("Crop", 4, 12);
        assert_eq!(animation.canvas_size(), (64, 64));

        let mut doc = MemoryDocument::new(8, 6);
        doc.push_layer(Layer::raster("Ink", 8, 6));
        animation.stage.viewport_width = 4;
        animation.stage.viewport_height = 4;
        animation.sync_layers(&doc);
        assert_eq!(animation.canvas_size(), (8, 6));
    }

    #[test]
    fn test_capture_and_apply_roundtrip() {
        let (mut doc, _, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Blink", &doc, &TimelineSettings::default());

        doc.layer_mut(top).unwrap().pixels = PixelBuffer::filled(2, 2, [0, 0, 255, 255]);
        animation.capture_keyframe(&doc, top, 0).unwrap();
        doc.layer_mut(top).unwrap().visible = false;
        animation.capture_keyframe(&doc, top, 4).unwrap();

        doc.layer_mut(top).unwrap().visible = true;
        doc.layer_mut(top).unwrap().pixels = PixelBuffer::new(2, 2);

        let report = animation.apply_frame_to_document(&mut doc, 2);
        assert_eq!(report.applied_layers, 1);
        assert_eq!(report.untouched_layers, 1);
        assert!(doc.layer(top).unwrap().visible);
        assert_eq!(doc.layer(top).unwrap().pixels.pixel(1, 1), Some([0, 0, 255, 255]));

        animation.apply_frame_to_document(&mut doc, 5);
        assert!(!doc.layer(top).unwrap().visible);
        assert_eq!(doc.recomposite_count(), 2);
    }

    #[test]
    fn test_capture_twice_replaces() {
        let (doc, _, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Idle", &doc, &TimelineSettings::default());
        animation.capture_keyframe(&doc, top, 3).unwrap();
        animation.capture_keyframe(&doc, top, 3).unwrap();
        assert_eq!(animation.track(top).unwrap().keyframe_count(), 1);
        assert_eq!(animation.store().len(), 1);
        assert!(animation.capture_keyframe(&doc, top, 99).is_err());
    }

    #[test]
    fn test_missing_layer_is_skipped() {
        let (mut doc, bottom, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Gone", &doc, &TimelineSettings::default());
        animation.capture_all(&doc, 0).unwrap();
        doc.remove_layer(bottom);

        let report = animation.apply_frame_to_document(&mut doc, 0);
        assert_eq!(report.missing_layers, vec![bottom]);
        assert_eq!(report.applied_layers, 1);
        assert!(doc.layer(top).is_some());
    }

    #[test]
    fn test_insert_and_delete_frames_shift_keyframes() {
        let (doc, _, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Shift", &doc, &TimelineSettings::default());
        animation.set_frame_count(10);
        for frame in [1, 4, 6] {
            animation.capture_keyframe(&doc, top, frame).unwrap();
        }

        animation.insert_frame(4);
        assert_eq!(animation.frame_count(), 11);
        assert_eq!(animation.track(top).unwrap().keyframe_frames(), vec![1, 5, 7]);

        assert!(animation.delete_frame(5));
        assert_eq!(animation.frame_count(), 10);
        assert_eq!(animation.track(top).unwrap().keyframe_frames(), vec![1, 6]);
    }

    #[test]
    fn test_sweep_keeps_referenced_and_extra() {
        let (mut doc, _, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Sweep", &doc, &TimelineSettings::default());
        animation.capture_keyframe(&doc, top, 0).unwrap();
        doc.layer_mut(top).unwrap().pixels = PixelBuffer::filled(2, 2, [9, 9, 9, 255]);
        animation.capture_keyframe(&doc, top, 1).unwrap();
        doc.layer_mut(top).unwrap().pixels = PixelBuffer::filled(2, 2, [7, 7, 7, 255]);
        animation.capture_keyframe(&doc, top, 2).unwrap();
        assert_eq!(animation.store().len(), 3);

        let held = animation.track(top).unwrap().keyframe_at(1).unwrap().pixel_data_id.unwrap();
        animation.remove_keyframe(top, 1);
        animation.remove_keyframe(top, 2);

        assert_eq!(animation.sweep_orphaned_pixel_data([held]), 1);
        assert_eq!(animation.store().len(), 2);
        assert!(animation.store().contains(held));
    }

    #[test]
    fn test_stage_state_falls_back_to_live_settings() {
        let (doc, _, _) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Cam", &doc, &TimelineSettings::default());
        assert_eq!(animation.stage_state_at(5), animation.stage.current);

        animation.capture_stage_keyframe(0, Easing::Linear).unwrap();
        animation.stage.current.position = [11.0, 1.0];
        animation.capture_stage_keyframe(10, Easing::Linear).unwrap();
        assert_eq!(animation.stage_state_at(5).position, [6.0, 1.0]);
        assert_eq!(animation.stage_state_at(20).position, [11.0, 1.0]);
    }

    #[test]
    fn test_events_fire_on_changes() {
        let (doc, _, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Events", &doc, &TimelineSettings::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        animation.events.subscribe(move |e: &TrackEvent| sink.borrow_mut().push(e.clone()));

        animation.capture_keyframe(&doc, top, 0).unwrap();
        animation.set_frame_count(8);
        assert_eq!(
            *seen.borrow(),
            vec![TrackEvent::KeyframesChanged(Some(top)), TrackEvent::FrameCountChanged(8)]
        );
    }

    #[test]
    fn test_save_and_load_with_store() {
        let (mut doc, _, top) = doc_with_layers();
        let mut animation = CanvasAnimation::for_document("Disk", &doc, &TimelineSettings::default());
        doc.layer_mut(top).unwrap().pixels = PixelBuffer::filled(2, 2, [1, 2, 3, 255]);
        animation.capture_keyframe(&doc, top, 2).unwrap();

        let path = std::env::temp_dir().join(format!("pixelforge-anim-{}.ron", uuid::Uuid::new_v4()));
        animation.save(&path).unwrap();
        let loaded = CanvasAnimation::load(&path);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(CanvasAnimation::store_path(&path));

        let loaded = loaded.unwrap();
        assert_eq!(loaded.frame_count(), animation.frame_count());
        assert_eq!(loaded.canvas_size(), (2, 2));
        let kf = loaded.track(top).unwrap().keyframe_at(2).unwrap();
        let pixels = loaded.store().get(kf.pixel_data_id.unwrap()).unwrap();
        assert_eq!(pixels.pixel(0, 0), Some([1, 2, 3, 255]));
    }
}
