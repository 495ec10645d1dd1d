// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer and stage tracks.
//!
//! A [`LayerTrack`] holds keyframes for one document layer and resolves them
//! with hold interpolation: the layer shows the latest keyframe at or before
//! the current frame, and keeps its live state before the first keyframe.
//! The [`StageTrack`] holds camera keyframes and always interpolates.

use crate::document::{Layer, LayerId, LayerKind};
use crate::error::TimelineResult;
use crate::interpolation::{self, Easing};
use crate::keyframe::{LayerKeyframe, StageKeyframe};
use crate::pixels::PixelBuffer;
use crate::stage::{StageSettings, StageState};
use crate::store::{KeyframeStore, PixelDataId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyframes of one document layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerTrack {
    /// Unique track ID
    pub id: TrackId,
    /// Layer this track animates
    pub layer_id: LayerId,
    /// Cached layer name for display
    pub layer_name: String,
    /// Keyframes sorted by frame, unique per frame
    keyframes: Vec<LayerKeyframe>,
}

impl LayerTrack {
    /// Create an empty track for a layer
    pub fn new(layer_id: LayerId, layer_name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            layer_id,
            layer_name: layer_name.into(),
            keyframes: Vec::new(),
        }
    }

    fn position(&self, frame: usize) -> Result<usize, usize> {
        self.keyframes.binary_search_by_key(&frame, |k| k.frame_index)
    }

    /// Insert or replace the keyframe at its frame; returns true when replaced
    pub fn set_keyframe(&mut self, keyframe: LayerKeyframe) -> bool {
        match self.position(keyframe.frame_index) {
            Ok(idx) => {
                self.keyframes[idx] = keyframe;
                true
            }
            Err(idx) => {
                self.keyframes.insert(idx, keyframe);
                false
            }
        }
    }

    /// Remove the keyframe at a frame
    pub fn remove_keyframe(&mut self, frame: usize) -> Option<LayerKeyframe> {
        let idx = self.position(frame).ok()?;
        Some(self.keyframes.remove(idx))
    }

    /// Keyframe pinned exactly at `frame`
    pub fn keyframe_at(&self, frame: usize) -> Option<&LayerKeyframe> {
        let idx = self.position(frame).ok()?;
        Some(&self.keyframes[idx])
    }

    /// Mutable keyframe pinned exactly at `frame`
    pub fn keyframe_at_mut(&mut self, frame: usize) -> Option<&mut LayerKeyframe> {
        let idx = self.position(frame).ok()?;
        Some(&mut self.keyframes[idx])
    }

    /// Whether a keyframe exists at `frame`
    pub fn has_keyframe_at(&self, frame: usize) -> bool {
        self.position(frame).is_ok()
    }

    /// All keyframes in frame order
    pub fn keyframes(&self) -> &[LayerKeyframe] {
        &self.keyframes
    }

    /// Frames that carry a keyframe
    pub fn keyframe_frames(&self) -> Vec<usize> {
        self.keyframes.iter().map(|k| k.frame_index).collect()
    }

    /// Get keyframe count
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Effective state at `frame`; `None` before the first keyframe
    pub fn effective_state_at(&self, frame: usize) -> Option<&LayerKeyframe> {
        interpolation::hold_by(&self.keyframes, frame, |k| k.frame_index)
    }

    /// First keyframe strictly after `frame`
    pub fn next_keyframe_after(&self, frame: usize) -> Option<&LayerKeyframe> {
        self.keyframes.iter().find(|k| k.frame_index > frame)
    }

    /// Last keyframe strictly before `frame`
    pub fn previous_keyframe_before(&self, frame: usize) -> Option<&LayerKeyframe> {
        self.keyframes.iter().rev().find(|k| k.frame_index < frame)
    }

    /// Snapshot `layer` into a keyframe at `frame`, replacing any existing one
    pub fn capture_keyframe(&mut self, layer: &Layer, frame: usize, store: &mut KeyframeStore) -> &LayerKeyframe {
        let mut keyframe = LayerKeyframe::new(frame).with_visible(layer.visible);

        if layer.kind == LayerKind::Raster {
            keyframe.opacity = layer.opacity;
            keyframe.blend_mode = layer.blend_mode;
            keyframe.pixel_data_id = Some(store.insert(&layer.pixels));
            if let Some(mask) = &layer.mask {
                keyframe.mask_enabled = mask.enabled;
                keyframe.mask_inverted = mask.inverted;
                keyframe.mask_pixel_data_id = Some(store.insert(&mask.pixels));
            }
            keyframe.effect_states = layer.effects.iter().map(|e| e.snapshot()).collect();
        }

        self.layer_name.clone_from(&layer.name);
        let replaced = self.set_keyframe(keyframe);
        tracing::debug!(
            "Captured keyframe for layer '{}' at frame {}{}",
            layer.name,
            frame,
            if replaced { " (replaced)" } else { "" }
        );

        let idx = self.position(frame).unwrap_or_else(|idx| idx);
        &self.keyframes[idx]
    }

    /// Shift keyframes at or after `from` by `delta` frames.
    ///
    /// Keyframes pushed below frame 0 are dropped. Callers clear the
    /// destination range first; on collision the unshifted keyframe is kept.
    pub fn shift_from(&mut self, from: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        let mut kept = Vec::with_capacity(self.keyframes.len());
        let mut shifted = Vec::new();
        for mut kf in self.keyframes.drain(..) {
            if kf.frame_index < from {
                kept.push(kf);
                continue;
            }
            let target = kf.frame_index as isize + delta;
            if target < 0 {
                continue;
            }
            kf.frame_index = target as usize;
            shifted.push(kf);
        }
        kept.extend(shifted);
        kept.sort_by_key(|k| k.frame_index);
        kept.dedup_by_key(|k| k.frame_index);
        self.keyframes = kept;
    }

    /// Drop keyframes at or beyond `frame_count`
    pub fn truncate(&mut self, frame_count: usize) {
        self.keyframes.retain(|k| k.frame_index < frame_count);
    }

    /// Pixel snapshots referenced by this track
    pub fn referenced_pixel_ids(&self) -> impl Iterator<Item = PixelDataId> + '_ {
        self.keyframes.iter().flat_map(LayerKeyframe::pixel_ids)
    }
}

/// Result of writing one keyframe onto a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerApplyOutcome {
    /// Pixel or mask writes skipped because the sizes differ
    pub size_mismatches: usize,
    /// Pixel ids that did not resolve in the store
    pub missing_pixel_data: usize,
    /// Effects in the keyframe with no matching instance on the layer
    pub unmatched_effects: usize,
}

/// Write a keyframe's state onto a layer.
///
/// Visibility always applies. For raster layers, opacity, blend mode, mask
/// flags, mask pixels, pixels and effect properties apply; mismatched sizes
/// and unknown effects are skipped and counted.
pub fn apply_keyframe_to_layer(keyframe: &LayerKeyframe, layer: &mut Layer, store: &KeyframeStore) -> LayerApplyOutcome {
    let mut outcome = LayerApplyOutcome::default();
    layer.visible = keyframe.visible;
    if layer.kind != LayerKind::Raster {
        return outcome;
    }

    layer.opacity = keyframe.opacity;
    layer.blend_mode = keyframe.blend_mode;

    if let Some(mask) = layer.mask.as_mut() {
        mask.enabled = keyframe.mask_enabled;
        mask.inverted = keyframe.mask_inverted;
        if let Some(id) = keyframe.mask_pixel_data_id {
            match store.get(id) {
                Some(snapshot) => {
                    if let Err(e) = write_pixels(&mut mask.pixels, snapshot) {
                        tracing::warn!("Skipping mask pixels for layer '{}': {}", layer.name, e);
                        outcome.size_mismatches += 1;
                    }
                }
                None => outcome.missing_pixel_data += 1,
            }
        }
    }

    if let Some(id) = keyframe.pixel_data_id {
        match store.get(id) {
            Some(snapshot) => {
                if let Err(e) = write_pixels(&mut layer.pixels, snapshot) {
                    tracing::warn!("Skipping pixels for layer '{}': {}", layer.name, e);
                    outcome.size_mismatches += 1;
                }
            }
            None => {
                tracing::warn!("Pixel data {:?} missing for layer '{}'", id, layer.name);
                outcome.missing_pixel_data += 1;
            }
        }
    }

    for state in &keyframe.effect_states {
        match layer.effect_mut(&state.effect_id) {
            Some(effect) => {
                effect.apply_snapshot(state);
            }
            None => {
                tracing::debug!("No effect '{}' on layer '{}'", state.effect_id, layer.name);
                outcome.unmatched_effects += 1;
            }
        }
    }

    outcome
}

fn write_pixels(target: &mut PixelBuffer, snapshot: &PixelBuffer) -> TimelineResult<()> {
    if target.as_bytes() == snapshot.as_bytes() {
        return Ok(());
    }
    target.copy_from(snapshot)
}

/// Virtual camera keyframes of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTrack {
    /// Keyframes sorted by frame, unique per frame
    keyframes: Vec<StageKeyframe>,
}

impl StageTrack {
    /// Create an empty stage track
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, frame: usize) -> Result<usize, usize> {
        self.keyframes.binary_search_by_key(&frame, |k| k.frame_index)
    }

    /// Insert or replace the keyframe at its frame; returns true when replaced
    pub fn set_keyframe(&mut self, keyframe: StageKeyframe) -> bool {
        match self.position(keyframe.frame_index) {
            Ok(idx) => {
                self.keyframes[idx] = keyframe;
                true
            }
            Err(idx) => {
                self.keyframes.insert(idx, keyframe);
                false
            }
        }
    }

    /// Snapshot the current stage settings as a keyframe
    pub fn capture_keyframe(&mut self, frame: usize, settings: &StageSettings, easing: Easing) -> StageKeyframe {
        let keyframe = StageKeyframe::from_state(frame, settings.current, easing);
        self.set_keyframe(keyframe);
        keyframe
    }

    /// Remove the keyframe at a frame
    pub fn remove_keyframe(&mut self, frame: usize) -> Option<StageKeyframe> {
        let idx = self.position(frame).ok()?;
        Some(self.keyframes.remove(idx))
    }

    /// Keyframe pinned exactly at `frame`
    pub fn keyframe_at(&self, frame: usize) -> Option<&StageKeyframe> {
        let idx = self.position(frame).ok()?;
        Some(&self.keyframes[idx])
    }

    /// All keyframes in frame order
    pub fn keyframes(&self) -> &[StageKeyframe] {
        &self.keyframes
    }

    /// Whether the track has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Interpolated camera state; `None` when there are no keyframes
    pub fn interpolated_state_at(&self, frame: usize) -> Option<StageState> {
        if self.keyframes.is_empty() {
            return None;
        }
        let keys: Vec<(f32, StageState)> = self
            .keyframes
            .iter()
            .map(|k| (k.frame_index as f32, k.state()))
            .collect();
        interpolation::continuous(&keys, frame as f32, |i| self.keyframes[i].easing).ok()
    }

    /// Shift keyframes at or after `from` by `delta` frames
    pub fn shift_from(&mut self, from: usize, delta: isize) {
        let mut kept: Vec<StageKeyframe> = Vec::with_capacity(self.keyframes.len());
        for mut kf in self.keyframes.drain(..) {
            if kf.frame_index >= from {
                let target = kf.frame_index as isize + delta;
                if target < 0 {
                    continue;
                }
                kf.frame_index = target as usize;
            }
            kept.push(kf);
        }
        kept.sort_by_key(|k| k.frame_index);
        kept.dedup_by_key(|k| k.frame_index);
        self.keyframes = kept;
    }

    /// Drop keyframes at or beyond `frame_count`
    pub fn truncate(&mut self, frame_count: usize) {
        self.keyframes.retain(|k| k.frame_index < frame_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LayerMask;
    use crate::effect::{EffectKind, LayerEffect};

    fn red_layer() -> Layer {
        let mut layer = Layer::raster("Body", 2, 2);
        layer.pixels = PixelBuffer::filled(2, 2, [255, 0, 0, 255]);
        layer.effects.push(LayerEffect::new(
            "adjust",
            EffectKind::ColorAdjust {
                hue_shift: 0.0,
                saturation: 1.0,
                brightness: 0.0,
            },
        ));
        layer
    }

    #[test]
    fn test_hold_semantics() {
        let mut track = LayerTrack::new(LayerId::new(), "Layer");
        track.set_keyframe(LayerKeyframe::new(2).with_opacity(10));
        track.set_keyframe(LayerKeyframe::new(6).with_opacity(60));

        assert!(track.effective_state_at(0).is_none());
        assert!(track.effective_state_at(1).is_none());
        assert_eq!(track.effective_state_at(2).unwrap().opacity, 10);
        assert_eq!(track.effective_state_at(5).unwrap().opacity, 10);
        assert_eq!(track.effective_state_at(6).unwrap().opacity, 60);
        assert_eq!(track.effective_state_at(99).unwrap().opacity, 60);
    }

    #[test]
    fn test_set_keyframe_replaces() {
        let mut track = LayerTrack::new(LayerId::new(), "Layer");
        assert!(!track.set_keyframe(LayerKeyframe::new(4)));
        assert!(!track.set_keyframe(LayerKeyframe::new(1)));
        assert!(track.set_keyframe(LayerKeyframe::new(4).with_opacity(3)));
        assert_eq!(track.keyframe_frames(), vec![1, 4]);
        assert_eq!(track.keyframe_at(4).unwrap().opacity, 3);
    }

    #[test]
    fn test_capture_twice_is_idempotent() {
        let layer = red_layer();
        let mut store = KeyframeStore::new();
        let mut track = LayerTrack::new(layer.id, &layer.name);

        let first = track.capture_keyframe(&layer, 3, &mut store).clone();
        let second = track.capture_keyframe(&layer, 3, &mut store).clone();

        assert_eq!(track.keyframe_count(), 1);
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(first.effect_states.len(), 1);
    }

    #[test]
    fn test_apply_restores_captured_state() {
        let mut layer = red_layer();
        layer.mask = Some(LayerMask {
            enabled: true,
            inverted: false,
            pixels: PixelBuffer::filled(2, 2, [0, 0, 0, 255]),
        });
        let mut store = KeyframeStore::new();
        let mut track = LayerTrack::new(layer.id, &layer.name);
        let keyframe = track.capture_keyframe(&layer, 0, &mut store).clone();

        layer.pixels = PixelBuffer::filled(2, 2, [0, 0, 255, 255]);
        layer.opacity = 5;
        layer.mask.as_mut().unwrap().inverted = true;
        layer.effects[0].enabled = false;

        let outcome = apply_keyframe_to_layer(&keyframe, &mut layer, &store);
        assert_eq!(outcome, LayerApplyOutcome::default());
        assert_eq!(layer.pixels.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(layer.opacity, 255);
        assert!(!layer.mask.as_ref().unwrap().inverted);
        assert!(layer.effects[0].enabled);
    }

    #[test]
    fn test_apply_skips_mismatched_pixels() {
        let layer = red_layer();
        let mut store = KeyframeStore::new();
        let mut track = LayerTrack::new(layer.id, &layer.name);
        let keyframe = track.capture_keyframe(&layer, 0, &mut store).clone();

        let mut resized = Layer::raster("Body", 3, 3);
        resized.id = layer.id;
        resized.opacity = 1;
        let outcome = apply_keyframe_to_layer(&keyframe, &mut resized, &store);

        assert_eq!(outcome.size_mismatches, 1);
        assert_eq!(outcome.unmatched_effects, 1);
        assert_eq!(resized.opacity, 255);
        assert_eq!(resized.pixels.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_group_layers_only_capture_visibility() {
        let mut layer = Layer::raster("Group", 1, 1).with_kind(LayerKind::Group);
        layer.visible = false;
        let mut store = KeyframeStore::new();
        let mut track = LayerTrack::new(layer.id, &layer.name);
        let keyframe = track.capture_keyframe(&layer, 0, &mut store);
        assert!(!keyframe.visible);
        assert!(keyframe.pixel_data_id.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_shift_from() {
        let mut track = LayerTrack::new(LayerId::new(), "Layer");
        for frame in [0, 3, 5] {
            track.set_keyframe(LayerKeyframe::new(frame));
        }
        track.shift_from(3, 2);
        assert_eq!(track.keyframe_frames(), vec![0, 5, 7]);
        track.shift_from(5, -1);
        assert_eq!(track.keyframe_frames(), vec![0, 4, 6]);
        track.shift_from(0, -5);
        assert_eq!(track.keyframe_frames(), vec![1]);
    }

    #[test]
    fn test_stage_interpolation() {
        let mut stage = StageTrack::new();
        assert!(stage.interpolated_state_at(0).is_none());

        stage.set_keyframe(StageKeyframe::from_state(0, StageState::centered(0.0, 0.0), Easing::Linear));
        stage.set_keyframe(StageKeyframe::from_state(
            10,
            StageState {
                position: [100.0, 50.0],
                scale: [2.0, 2.0],
                rotation: 90.0,
            },
            Easing::Linear,
        ));

        let mid = stage.interpolated_state_at(5).unwrap();
        assert_eq!(mid.position, [50.0, 25.0]);
        assert_eq!(mid.scale, [1.5, 1.5]);
        assert_eq!(mid.rotation, 45.0);
        assert_eq!(stage.interpolated_state_at(10).unwrap().position, [100.0, 50.0]);
        assert_eq!(stage.interpolated_state_at(20).unwrap().position, [100.0, 50.0]);
    }

    #[test]
    fn test_stage_capture_and_remove() {
        let mut stage = StageTrack::new();
        let settings = StageSettings::for_canvas(32, 32);
        stage.capture_keyframe(4, &settings, Easing::EaseInQuad);
        stage.capture_keyframe(4, &settings, Easing::Linear);
        assert_eq!(stage.keyframes().len(), 1);
        assert_eq!(stage.keyframe_at(4).unwrap().easing, Easing::Linear);
        assert!(stage.remove_keyframe(4).is_some());
        assert!(stage.is_empty());
    }
}
