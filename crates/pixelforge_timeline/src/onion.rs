// SPDX-License-Identifier: MIT OR Apache-2.0
//! Onion skin overlay parameters.

use crate::reel::TileAnimationReel;
use serde::{Deserialize, Serialize};

/// How many neighbouring frames to overlay and how strongly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnionSkinSettings {
    /// Overlay on or off
    pub enabled: bool,
    /// Frames shown before the current one
    pub frames_before: usize,
    /// Frames shown after the current one
    pub frames_after: usize,
    /// Opacity of the nearest neighbour, 0 to 1
    pub opacity: f32,
    /// Reach around the ends of the sequence
    pub wrap: bool,
}

impl Default for OnionSkinSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frames_before: 1,
            frames_after: 1,
            opacity: 0.3,
            wrap: false,
        }
    }
}

/// One overlaid frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnionFrame {
    /// Frame index in the sequence
    pub frame_index: usize,
    /// Signed distance from the current frame
    pub offset: isize,
    /// Overlay opacity, 0 to 1
    pub opacity: f32,
}

impl OnionSkinSettings {
    /// Opacity at `distance` frames away, fading linearly to the farthest frame
    fn opacity_at(&self, distance: usize, reach: usize) -> f32 {
        let falloff = (reach + 1 - distance) as f32 / reach as f32;
        (self.opacity * falloff).clamp(0.0, 1.0)
    }

    /// Frames to overlay around `current`, farthest first
    pub fn onion_frames(&self, current: usize, frame_count: usize) -> Vec<OnionFrame> {
        if !self.enabled || frame_count < 2 || current >= frame_count {
            return Vec::new();
        }

        let mut out = Vec::new();
        for distance in (1..=self.frames_before).rev() {
            let index = if distance <= current {
                Some(current - distance)
            } else if self.wrap && distance < frame_count {
                Some(frame_count + current - distance)
            } else {
                None
            };
            if let Some(frame_index) = index {
                out.push(OnionFrame {
                    frame_index,
                    offset: -(distance as isize),
                    opacity: self.opacity_at(distance, self.frames_before),
                });
            }
        }
        for distance in (1..=self.frames_after).rev() {
            let raw = current + distance;
            let index = if raw < frame_count {
                Some(raw)
            } else if self.wrap && distance < frame_count {
                Some(raw - frame_count)
            } else {
                None
            };
            if let Some(frame_index) = index {
                out.push(OnionFrame {
                    frame_index,
                    offset: distance as isize,
                    opacity: self.opacity_at(distance, self.frames_after),
                });
            }
        }
        out
    }

    /// Tile positions to overlay around frame `current` of a reel: `(tile_x, tile_y, opacity)`
    pub fn reel_onion_frames(&self, reel: &TileAnimationReel, current: usize) -> Vec<(i32, i32, f32)> {
        let wrapped = Self {
            wrap: self.wrap || reel.looping,
            ..*self
        };
        wrapped
            .onion_frames(current, reel.frame_count())
            .into_iter()
            .filter_map(|f| reel.frames.get(f.frame_index).map(|rf| (rf.tile_x, rf.tile_y, f.opacity)))
            .collect()
    }
}
