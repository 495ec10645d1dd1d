// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tile animation reels.
//!
//! A reel is a named sequence of tile-grid positions played at per-frame
//! durations. [`TileAnimationState`] manages the reels of one document, the
//! selected reel and frame navigation within it.

use crate::pixels::PixelBuffer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default per-frame duration for new reels
pub const DEFAULT_FRAME_TIME_MS: i32 = 100;

/// Unique identifier for a reel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReelId(pub Uuid);

impl ReelId {
    /// Create a new random reel ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReelId {
    fn default() -> Self {
        Self::new()
    }
}

/// One frame of a reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelFrame {
    /// Tile column in the source grid
    pub tile_x: i32,
    /// Tile row in the source grid
    pub tile_y: i32,
    /// Custom duration; the reel default applies when `None`
    pub duration_ms: Option<i32>,
    /// Pixels carried with the frame, making the reel self-contained
    pub embedded_pixels: Option<PixelBuffer>,
}

impl ReelFrame {
    /// Frame at a tile position with default timing
    pub fn new(tile_x: i32, tile_y: i32) -> Self {
        Self {
            tile_x,
            tile_y,
            duration_ms: None,
            embedded_pixels: None,
        }
    }

    /// Set a custom duration
    pub fn with_duration(mut self, duration_ms: i32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Embed pixels
    pub fn with_pixels(mut self, pixels: PixelBuffer) -> Self {
        self.embedded_pixels = Some(pixels);
        self
    }
}

/// A named tile animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileAnimationReel {
    /// Unique reel ID (not persisted in reel files)
    pub id: ReelId,
    /// Display name
    pub name: String,
    /// Frames in playback order
    pub frames: Vec<ReelFrame>,
    /// Tile width in pixels
    pub frame_width: u32,
    /// Tile height in pixels
    pub frame_height: u32,
    /// Duration of frames without a custom duration
    pub default_frame_time_ms: i32,
    /// Wrap at the end instead of stopping
    pub looping: bool,
    /// Reverse at the ends instead of wrapping
    pub ping_pong: bool,
}

impl TileAnimationReel {
    /// Create an empty looping reel
    pub fn new(name: impl Into<String>, frame_width: u32, frame_height: u32) -> Self {
        Self {
            id: ReelId::new(),
            name: name.into(),
            frames: Vec::new(),
            frame_width,
            frame_height,
            default_frame_time_ms: DEFAULT_FRAME_TIME_MS,
            looping: true,
            ping_pong: false,
        }
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Whether the reel has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Duration of one frame (custom or default), at least 1 ms
    pub fn frame_duration_ms(&self, index: usize) -> i32 {
        self.frames
            .get(index)
            .and_then(|f| f.duration_ms)
            .unwrap_or(self.default_frame_time_ms)
            .max(1)
    }

    /// Sum of all frame durations
    pub fn total_duration_ms(&self) -> i64 {
        (0..self.frames.len()).map(|i| i64::from(self.frame_duration_ms(i))).sum()
    }

    /// Start time of a frame (sum of the durations before it)
    pub fn time_at_frame(&self, index: usize) -> i64 {
        (0..index.min(self.frames.len()))
            .map(|i| i64::from(self.frame_duration_ms(i)))
            .sum()
    }

    /// Frame containing time `ms`.
    ///
    /// Beyond the end, looping reels wrap and others stay on the last frame.
    /// Returns `None` for an empty reel.
    pub fn frame_at_time(&self, ms: i64) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let total = self.total_duration_ms();
        let mut t = ms.max(0);
        if t >= total {
            if !self.looping {
                return Some(self.frames.len() - 1);
            }
            t %= total;
        }

        let mut elapsed = 0i64;
        for i in 0..self.frames.len() {
            elapsed += i64::from(self.frame_duration_ms(i));
            if t < elapsed {
                return Some(i);
            }
        }
        Some(self.frames.len() - 1)
    }

    /// Append a frame
    pub fn add_frame(&mut self, frame: ReelFrame) {
        self.frames.push(frame);
    }

    /// Insert a frame, clamping the index to the end
    pub fn insert_frame(&mut self, index: usize, frame: ReelFrame) {
        let index = index.min(self.frames.len());
        self.frames.insert(index, frame);
    }

    /// Remove a frame
    pub fn remove_frame(&mut self, index: usize) -> Option<ReelFrame> {
        (index < self.frames.len()).then(|| self.frames.remove(index))
    }

    /// Move a frame to another position
    pub fn move_frame(&mut self, from: usize, to: usize) -> bool {
        if from >= self.frames.len() || to >= self.frames.len() {
            return false;
        }
        let frame = self.frames.remove(from);
        self.frames.insert(to, frame);
        true
    }

    /// Set or clear a frame's custom duration
    pub fn set_frame_duration(&mut self, index: usize, duration_ms: Option<i32>) -> bool {
        match self.frames.get_mut(index) {
            Some(frame) => {
                frame.duration_ms = duration_ms;
                true
            }
            None => false,
        }
    }

    /// Whether every frame carries its own pixels
    pub fn is_self_contained(&self) -> bool {
        !self.frames.is_empty() && self.frames.iter().all(|f| f.embedded_pixels.is_some())
    }
}

/// Reels of one document plus selection and frame navigation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileAnimationState {
    reels: IndexMap<ReelId, TileAnimationReel>,
    selected: Option<ReelId>,
    current_frame: usize,
}

impl TileAnimationState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reel and select it
    pub fn add_reel(&mut self, reel: TileAnimationReel) -> ReelId {
        let id = reel.id;
        self.reels.insert(id, reel);
        self.select(Some(id));
        id
    }

    /// Remove a reel; the selection moves to the first remaining reel
    pub fn remove_reel(&mut self, id: ReelId) -> Option<TileAnimationReel> {
        let reel = self.reels.shift_remove(&id)?;
        if self.selected == Some(id) {
            let next = self.reels.keys().next().copied();
            self.select(next);
        }
        Some(reel)
    }

    /// Get a reel
    pub fn reel(&self, id: ReelId) -> Option<&TileAnimationReel> {
        self.reels.get(&id)
    }

    /// Get a mutable reel
    pub fn reel_mut(&mut self, id: ReelId) -> Option<&mut TileAnimationReel> {
        self.reels.get_mut(&id)
    }

    /// All reels in creation order
    pub fn reels(&self) -> impl Iterator<Item = &TileAnimationReel> {
        self.reels.values()
    }

    /// Number of reels
    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    /// Select a reel and reset to its first frame
    pub fn select(&mut self, id: Option<ReelId>) {
        self.selected = id.filter(|id| self.reels.contains_key(id));
        self.current_frame = 0;
    }

    /// Selected reel
    pub fn selected_reel(&self) -> Option<&TileAnimationReel> {
        self.selected.and_then(|id| self.reels.get(&id))
    }

    /// Selected reel, mutably
    pub fn selected_reel_mut(&mut self) -> Option<&mut TileAnimationReel> {
        let id = self.selected?;
        self.reels.get_mut(&id)
    }

    /// Current frame index within the selected reel
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Current frame of the selected reel
    pub fn current_reel_frame(&self) -> Option<&ReelFrame> {
        self.selected_reel()?.frames.get(self.current_frame)
    }

    fn nav(&mut self, step: impl FnOnce(usize, usize, bool) -> usize) -> Option<usize> {
        let (count, looping) = {
            let reel = self.selected_reel()?;
            (reel.frame_count(), reel.looping)
        };
        if count == 0 {
            return None;
        }
        self.current_frame = step(self.current_frame.min(count - 1), count, looping);
        Some(self.current_frame)
    }

    /// Jump to a frame, clamped to the reel
    pub fn set_current_frame(&mut self, frame: usize) -> Option<usize> {
        self.nav(|_, count, _| frame.min(count - 1))
    }

    /// Step forward; wraps when the reel loops, otherwise clamps
    pub fn next_frame(&mut self) -> Option<usize> {
        self.nav(|current, count, looping| {
            if current + 1 < count {
                current + 1
            } else if looping {
                0
            } else {
                current
            }
        })
    }

    /// Step backward; wraps when the reel loops, otherwise clamps
    pub fn previous_frame(&mut self) -> Option<usize> {
        self.nav(|current, count, looping| {
            if current > 0 {
                current - 1
            } else if looping {
                count - 1
            } else {
                0
            }
        })
    }

    /// Jump to the first frame
    pub fn first_frame(&mut self) -> Option<usize> {
        self.nav(|_, _, _| 0)
    }

    /// Jump to the last frame
    pub fn last_frame(&mut self) -> Option<usize> {
        self.nav(|_, count, _| count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_reel() -> TileAnimationReel {
        let mut reel = TileAnimationReel::new("Walk", 16, 16);
        reel.add_frame(ReelFrame::new(0, 0));
        reel.add_frame(ReelFrame::new(1, 0).with_duration(250));
        reel.add_frame(ReelFrame::new(2, 0));
        reel
    }

    #[test]
    fn test_frame_at_time_uses_custom_durations() {
        let reel = walk_reel();
        assert_eq!(reel.total_duration_ms(), 450);
        assert_eq!(reel.frame_at_time(0), Some(0));
        assert_eq!(reel.frame_at_time(99), Some(0));
        assert_eq!(reel.frame_at_time(100), Some(1));
        assert_eq!(reel.frame_at_time(349), Some(1));
        assert_eq!(reel.frame_at_time(350), Some(2));
        assert_eq!(reel.frame_at_time(460), Some(0));
    }

    #[test]
    fn test_frame_at_time_clamps_without_loop() {
        let mut reel = walk_reel();
        reel.looping = false;
        assert_eq!(reel.frame_at_time(10_000), Some(2));
        assert_eq!(TileAnimationReel::new("Empty", 8, 8).frame_at_time(0), None);
    }

    #[test]
    fn test_time_at_frame_inverts_frame_at_time() {
        let reel = walk_reel();
        for i in 0..reel.frame_count() {
            assert_eq!(reel.frame_at_time(reel.time_at_frame(i)), Some(i));
        }
        assert_eq!(reel.time_at_frame(2), 350);
    }

    #[test]
    fn test_frame_editing() {
        let mut reel = walk_reel();
        reel.insert_frame(0, ReelFrame::new(9, 9));
        assert_eq!(reel.frames[0].tile_x, 9);
        assert!(reel.move_frame(0, 3));
        assert_eq!(reel.frames[3].tile_x, 9);
        assert!(reel.set_frame_duration(3, Some(40)));
        assert_eq!(reel.frame_duration_ms(3), 40);
        assert!(reel.remove_frame(3).is_some());
        assert!(reel.remove_frame(3).is_none());
    }

    #[test]
    fn test_navigation_wraps_when_looping() {
        let mut state = TileAnimationState::new();
        state.add_reel(walk_reel());

        assert_eq!(state.previous_frame(), Some(2));
        assert_eq!(state.next_frame(), Some(0));
        assert_eq!(state.last_frame(), Some(2));
        assert_eq!(state.current_reel_frame().unwrap().tile_x, 2);
    }

    #[test]
    fn test_navigation_clamps_without_loop() {
        let mut state = TileAnimationState::new();
        let mut reel = walk_reel();
        reel.looping = false;
        state.add_reel(reel);

        assert_eq!(state.previous_frame(), Some(0));
        assert_eq!(state.last_frame(), Some(2));
        assert_eq!(state.next_frame(), Some(2));
        assert_eq!(state.first_frame(), Some(0));
    }

    #[test]
    fn test_remove_selected_reel_moves_selection() {
        let mut state = TileAnimationState::new();
        let first = state.add_reel(walk_reel());
        let second = state.add_reel(TileAnimationReel::new("Idle", 16, 16));
        assert_eq!(state.selected_reel().unwrap().id, second);

        state.remove_reel(second);
        assert_eq!(state.selected_reel().unwrap().id, first);
        assert_eq!(state.reel_count(), 1);
    }
}
