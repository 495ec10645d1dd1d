// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for layer and stage tracks.

use crate::document::BlendMode;
use crate::effect::EffectKeyframe;
use crate::interpolation::Easing;
use crate::stage::StageState;
use crate::store::PixelDataId;
use serde::{Deserialize, Serialize};

/// Captured state of one layer at one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerKeyframe {
    /// Frame this keyframe is pinned to
    pub frame_index: usize,
    /// Layer visibility
    pub visible: bool,
    /// Layer opacity (0 to 255)
    pub opacity: u8,
    /// Blend mode
    pub blend_mode: BlendMode,
    /// Snapshot of the layer pixels
    pub pixel_data_id: Option<PixelDataId>,
    /// Whether the mask applies
    pub mask_enabled: bool,
    /// Whether the mask is inverted
    pub mask_inverted: bool,
    /// Snapshot of the mask pixels
    pub mask_pixel_data_id: Option<PixelDataId>,
    /// Per-effect state, matched by effect id on apply
    pub effect_states: Vec<EffectKeyframe>,
}

impl LayerKeyframe {
    /// Create a visible, opaque keyframe without pixel data
    pub fn new(frame_index: usize) -> Self {
        Self {
            frame_index,
            visible: true,
            opacity: 255,
            blend_mode: BlendMode::Normal,
            pixel_data_id: None,
            mask_enabled: false,
            mask_inverted: false,
            mask_pixel_data_id: None,
            effect_states: Vec::new(),
        }
    }

    /// Deep copy pinned to another frame
    pub fn at_frame(&self, frame_index: usize) -> Self {
        Self {
            frame_index,
            ..self.clone()
        }
    }

    /// Set visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set opacity
    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    /// Pixel snapshots this keyframe depends on
    pub fn pixel_ids(&self) -> impl Iterator<Item = PixelDataId> {
        self.pixel_data_id.into_iter().chain(self.mask_pixel_data_id)
    }

    /// Find the captured state of one effect instance
    pub fn effect_state(&self, effect_id: &str) -> Option<&EffectKeyframe> {
        self.effect_states.iter().find(|e| e.effect_id == effect_id)
    }
}

/// Virtual camera keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageKeyframe {
    /// Frame this keyframe is pinned to
    pub frame_index: usize,
    /// Camera center X in canvas pixels
    pub position_x: f32,
    /// Camera center Y in canvas pixels
    pub position_y: f32,
    /// Horizontal zoom
    pub scale_x: f32,
    /// Vertical zoom
    pub scale_y: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Easing toward the next keyframe
    pub easing: Easing,
}

impl StageKeyframe {
    /// Create a keyframe from a camera state
    pub fn from_state(frame_index: usize, state: StageState, easing: Easing) -> Self {
        Self {
            frame_index,
            position_x: state.position[0],
            position_y: state.position[1],
            scale_x: state.scale[0],
            scale_y: state.scale[1],
            rotation: state.rotation,
            easing,
        }
    }

    /// Camera state stored in this keyframe
    pub fn state(&self) -> StageState {
        StageState {
            position: [self.position_x, self.position_y],
            scale: [self.scale_x, self.scale_y],
            rotation: self.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::PropertyValue;
    use indexmap::IndexMap;

    #[test]
    fn test_at_frame_is_deep_clone() {
        let mut original = LayerKeyframe::new(3);
        let mut values = IndexMap::new();
        values.insert("speed".to_string(), PropertyValue::Float(1.0));
        original.effect_states.push(EffectKeyframe {
            effect_id: "cycle".to_string(),
            enabled: true,
            property_values: values,
        });

        let mut copy = original.at_frame(9);
        copy.effect_states[0]
            .property_values
            .insert("speed".to_string(), PropertyValue::Float(2.0));

        assert_eq!(copy.frame_index, 9);
        assert_eq!(
            original.effect_state("cycle").unwrap().property_values["speed"],
            PropertyValue::Float(1.0)
        );
    }

    #[test]
    fn test_pixel_ids() {
        let mut kf = LayerKeyframe::new(0);
        assert_eq!(kf.pixel_ids().count(), 0);
        kf.pixel_data_id = Some(PixelDataId(1));
        kf.mask_pixel_data_id = Some(PixelDataId(2));
        assert_eq!(kf.pixel_ids().collect::<Vec<_>>(), vec![PixelDataId(1), PixelDataId(2)]);
    }
}
