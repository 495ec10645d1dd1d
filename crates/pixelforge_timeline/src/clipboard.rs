// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe copy and paste.
//!
//! The clipboard is a plain value owned by whoever drives the editor; it is
//! passed to the operations that need it. Copies store keyframes relative to
//! the earliest copied frame, so pasting at a target frame keeps their spacing.

use crate::document::LayerId;
use crate::keyframe::LayerKeyframe;
use crate::store::PixelDataId;
use crate::track::LayerTrack;

/// One copied keyframe
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    /// Layer the keyframe was copied from
    pub layer_id: LayerId,
    /// Frame distance from the earliest copied keyframe
    pub relative_offset: usize,
    /// Deep copy of the keyframe
    pub keyframe: LayerKeyframe,
}

/// Copied keyframes waiting to be pasted
#[derive(Debug, Clone, Default)]
pub struct KeyframeClipboard {
    base_frame: usize,
    layer_ids: Vec<LayerId>,
    entries: Vec<ClipboardEntry>,
}

impl KeyframeClipboard {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is copied
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of copied keyframes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Earliest copied frame
    pub fn base_frame(&self) -> usize {
        self.base_frame
    }

    /// Layers that contributed keyframes, in copy order
    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layer_ids
    }

    /// Copied entries
    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    /// Drop the copied keyframes
    pub fn clear(&mut self) {
        self.base_frame = 0;
        self.layer_ids.clear();
        self.entries.clear();
    }

    /// Copy the keyframes of one track at `frames`.
    ///
    /// Frames without a keyframe are ignored. When none match, the clipboard
    /// keeps its previous content. Returns the number copied.
    pub fn copy_frames(&mut self, track: &LayerTrack, frames: &[usize]) -> usize {
        self.copy_multi(&[(track, frames)])
    }

    /// Copy keyframes from several tracks at once
    pub fn copy_multi(&mut self, selection: &[(&LayerTrack, &[usize])]) -> usize {
        let picked: Vec<(LayerId, &LayerKeyframe)> = selection
            .iter()
            .flat_map(|&(track, frames)| {
                frames
                    .iter()
                    .filter_map(move |f| track.keyframe_at(*f))
                    .map(move |kf| (track.layer_id, kf))
            })
            .collect();

        let Some(base) = picked.iter().map(|(_, kf)| kf.frame_index).min() else {
            return 0;
        };

        self.clear();
        self.base_frame = base;
        for (layer_id, keyframe) in picked {
            if !self.layer_ids.contains(&layer_id) {
                self.layer_ids.push(layer_id);
            }
            self.entries.push(ClipboardEntry {
                layer_id,
                relative_offset: keyframe.frame_index - base,
                keyframe: keyframe.clone(),
            });
        }
        tracing::debug!(
            "Copied {} keyframes from {} layers (base frame {})",
            self.entries.len(),
            self.layer_ids.len(),
            base
        );
        self.entries.len()
    }

    /// Paste every entry onto one track starting at `target_frame`.
    ///
    /// Returns the frames written.
    pub fn paste_to_layer(&self, track: &mut LayerTrack, target_frame: usize) -> Vec<usize> {
        let mut written = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let frame = target_frame + entry.relative_offset;
            track.set_keyframe(entry.keyframe.at_frame(frame));
            written.push(frame);
        }
        written
    }

    /// Paste each entry back onto the track of the layer it came from.
    ///
    /// Entries whose layer has no track are skipped. Returns the number pasted.
    pub fn paste_multi(&self, tracks: &mut [LayerTrack], target_frame: usize) -> usize {
        let mut pasted = 0;
        for entry in &self.entries {
            let Some(track) = tracks.iter_mut().find(|t| t.layer_id == entry.layer_id) else {
                tracing::debug!("Paste skipped: no track for layer {}", entry.layer_id);
                continue;
            };
            track.set_keyframe(entry.keyframe.at_frame(target_frame + entry.relative_offset));
            pasted += 1;
        }
        pasted
    }

    /// Pixel snapshots held by copied keyframes
    pub fn referenced_pixel_ids(&self) -> impl Iterator<Item = PixelDataId> + '_ {
        self.entries.iter().flat_map(|e| e.keyframe.pixel_ids())
    }
}
