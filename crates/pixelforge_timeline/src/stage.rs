// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage (virtual camera) settings and frame rendering.
//!
//! The stage crops a rotated rectangle out of the composited canvas and
//! resamples it, nearest-neighbor, into an output buffer of fixed size.

use crate::interpolation::Lerp;
use crate::pixels::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Smallest scale accepted when sizing the crop rectangle
const MIN_SCALE: f32 = 0.01;

/// Camera transform at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    /// Camera center in canvas pixels
    pub position: [f32; 2],
    /// Zoom per axis
    pub scale: [f32; 2],
    /// Rotation in degrees
    pub rotation: f32,
}

impl StageState {
    /// Camera centered at `(x, y)` with no zoom or rotation
    pub fn centered(x: f32, y: f32) -> Self {
        Self {
            position: [x, y],
            scale: [1.0, 1.0],
            rotation: 0.0,
        }
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::centered(0.0, 0.0)
    }
}

impl Lerp for StageState {
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            scale: self.scale.lerp(other.scale, t),
            rotation: self.rotation.lerp(other.rotation, t),
        }
    }
}

/// Stage configuration of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Whether the stage is used for playback/export
    pub enabled: bool,
    /// Width of the camera view in canvas pixels at scale 1
    pub viewport_width: u32,
    /// Height of the camera view in canvas pixels at scale 1
    pub viewport_height: u32,
    /// Rendered output width
    pub output_width: u32,
    /// Rendered output height
    pub output_height: u32,
    /// Current (un-keyframed) camera state
    pub current: StageState,
}

impl StageSettings {
    /// Stage covering a whole canvas
    pub fn for_canvas(width: u32, height: u32) -> Self {
        Self {
            enabled: false,
            viewport_width: width,
            viewport_height: height,
            output_width: width,
            output_height: height,
            current: StageState::centered(width as f32 / 2.0, height as f32 / 2.0),
        }
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self::for_canvas(64, 64)
    }
}

/// Render the camera view of `canvas` into a new output buffer.
///
/// Pixels that fall outside the canvas are transparent.
pub fn render_stage_frame(canvas: &PixelBuffer, settings: &StageSettings, state: &StageState) -> PixelBuffer {
    let out_w = settings.output_width;
    let out_h = settings.output_height;
    let mut out = PixelBuffer::new(out_w, out_h);
    if out_w == 0 || out_h == 0 {
        return out;
    }

    let crop_w = settings.viewport_width as f32 / state.scale[0].abs().max(MIN_SCALE);
    let crop_h = settings.viewport_height as f32 / state.scale[1].abs().max(MIN_SCALE);
    let (sin, cos) = state.rotation.to_radians().sin_cos();
    let [cx, cy] = state.position;

    for oy in 0..out_h {
        let fy = ((oy as f32 + 0.5) / out_h as f32 - 0.5) * crop_h;
        for ox in 0..out_w {
            let fx = ((ox as f32 + 0.5) / out_w as f32 - 0.5) * crop_w;
            let sx = (cx + fx * cos - fy * sin).floor();
            let sy = (cy + fx * sin + fy * cos).floor();
            if sx < 0.0 || sy < 0.0 {
                continue;
            }
            if let Some(px) = canvas.pixel(sx as u32, sy as u32) {
                out.set_pixel(ox, oy, px);
            }
        }
    }
    out
}
