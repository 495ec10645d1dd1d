// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layer effects and their keyframe snapshots.
//!
//! Every effect kind exposes a `{name: value}` contract: [`EffectKind::describe`]
//! lists its animatable properties and [`EffectKind::apply`] writes matching
//! names back with type coercion. Unknown names and values that cannot be
//! coerced are skipped, so snapshots from older or newer documents still
//! apply as far as they can.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A dynamically-typed effect property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f32),
    /// Free text
    Text(String),
    /// RGBA color
    Color([u8; 4]),
    /// Enum variant by name
    Enum(String),
}

impl PropertyValue {
    /// Coerce to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v != 0),
            PropertyValue::Text(s) | PropertyValue::Enum(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Coerce to integer (floats round)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Float(v) if v.is_finite() => Some(v.round() as i64),
            PropertyValue::Bool(v) => Some(i64::from(*v)),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce to float
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f32),
            PropertyValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce to color
    pub fn as_color(&self) -> Option<[u8; 4]> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            PropertyValue::Int(v) => {
                let v = *v as u32;
                Some([(v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8])
            }
            _ => None,
        }
    }
}

/// Where an outline is drawn relative to the layer's opaque edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutlinePosition {
    /// Outside the shape
    #[default]
    Outside,
    /// Inside the shape
    Inside,
    /// Centered on the edge
    Center,
}

impl OutlinePosition {
    const ALL: [OutlinePosition; 3] = [
        OutlinePosition::Outside,
        OutlinePosition::Inside,
        OutlinePosition::Center,
    ];

    /// Variant name used in snapshots
    pub fn name(&self) -> &'static str {
        match self {
            OutlinePosition::Outside => "Outside",
            OutlinePosition::Inside => "Inside",
            OutlinePosition::Center => "Center",
        }
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Enum(name) | PropertyValue::Text(name) => Self::ALL
                .into_iter()
                .find(|p| p.name().eq_ignore_ascii_case(name)),
            PropertyValue::Int(i) => usize::try_from(*i).ok().and_then(|i| Self::ALL.get(i).copied()),
            _ => None,
        }
    }
}

/// Effect parameters, one variant per effect type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Offset shadow behind the layer
    DropShadow {
        /// Horizontal offset in pixels
        offset_x: i32,
        /// Vertical offset in pixels
        offset_y: i32,
        /// Shadow color
        color: [u8; 4],
        /// Shadow opacity (0 to 1)
        opacity: f32,
    },
    /// Pixel outline around opaque areas
    Outline {
        /// Thickness in pixels
        thickness: u32,
        /// Outline color
        color: [u8; 4],
        /// Placement
        position: OutlinePosition,
    },
    /// Hue/saturation/brightness adjustment
    ColorAdjust {
        /// Hue rotation in degrees
        hue_shift: f32,
        /// Saturation multiplier
        saturation: f32,
        /// Brightness offset (-1 to 1)
        brightness: f32,
    },
    /// Rotates a palette index range over time
    PaletteCycle {
        /// First palette index in the cycle
        start_index: i32,
        /// Last palette index in the cycle
        end_index: i32,
        /// Steps per second
        speed: f32,
        /// Reverse the cycle direction
        reverse: bool,
    },
}

impl EffectKind {
    /// Stable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            EffectKind::DropShadow { .. } => "drop_shadow",
            EffectKind::Outline { .. } => "outline",
            EffectKind::ColorAdjust { .. } => "color_adjust",
            EffectKind::PaletteCycle { .. } => "palette_cycle",
        }
    }

    /// List the animatable properties by name
    pub fn describe(&self) -> IndexMap<String, PropertyValue> {
        let mut map = IndexMap::new();
        let mut put = |name: &str, value: PropertyValue| {
            map.insert(name.to_string(), value);
        };
        match self {
            EffectKind::DropShadow { offset_x, offset_y, color, opacity } => {
                put("offset_x", PropertyValue::Int(i64::from(*offset_x)));
                put("offset_y", PropertyValue::Int(i64::from(*offset_y)));
                put("color", PropertyValue::Color(*color));
                put("opacity", PropertyValue::Float(*opacity));
            }
            EffectKind::Outline { thickness, color, position } => {
                put("thickness", PropertyValue::Int(i64::from(*thickness)));
                put("color", PropertyValue::Color(*color));
                put("position", PropertyValue::Enum(position.name().to_string()));
            }
            EffectKind::ColorAdjust { hue_shift, saturation, brightness } => {
                put("hue_shift", PropertyValue::Float(*hue_shift));
                put("saturation", PropertyValue::Float(*saturation));
                put("brightness", PropertyValue::Float(*brightness));
            }
            EffectKind::PaletteCycle { start_index, end_index, speed, reverse } => {
                put("start_index", PropertyValue::Int(i64::from(*start_index)));
                put("end_index", PropertyValue::Int(i64::from(*end_index)));
                put("speed", PropertyValue::Float(*speed));
                put("reverse", PropertyValue::Bool(*reverse));
            }
        }
        map
    }

    /// Write matching properties back, returning how many were applied
    pub fn apply(&mut self, values: &IndexMap<String, PropertyValue>) -> usize {
        let mut applied = 0;
        for (name, value) in values {
            if self.set_property(name, value) {
                applied += 1;
            } else {
                tracing::trace!("Skipping property {} on {}", name, self.type_name());
            }
        }
        applied
    }

    fn set_property(&mut self, name: &str, value: &PropertyValue) -> bool {
        fn assign<T>(slot: &mut T, value: Option<T>) -> bool {
            match value {
                Some(v) => {
                    *slot = v;
                    true
                }
                None => false,
            }
        }
        let as_i32 = |v: &PropertyValue| v.as_i64().and_then(|i| i32::try_from(i).ok());

        match (self, name) {
            (EffectKind::DropShadow { offset_x, .. }, "offset_x") => assign(offset_x, as_i32(value)),
            (EffectKind::DropShadow { offset_y, .. }, "offset_y") => assign(offset_y, as_i32(value)),
            (EffectKind::DropShadow { color, .. }, "color")
            | (EffectKind::Outline { color, .. }, "color") => assign(color, value.as_color()),
            (EffectKind::DropShadow { opacity, .. }, "opacity") => {
                assign(opacity, value.as_f32().map(|v| v.clamp(0.0, 1.0)))
            }
            (EffectKind::Outline { thickness, .. }, "thickness") => {
                assign(thickness, value.as_i64().and_then(|i| u32::try_from(i).ok()))
            }
            (EffectKind::Outline { position, .. }, "position") => {
                assign(position, OutlinePosition::from_value(value))
            }
            (EffectKind::ColorAdjust { hue_shift, .. }, "hue_shift") => assign(hue_shift, value.as_f32()),
            (EffectKind::ColorAdjust { saturation, .. }, "saturation") => {
                assign(saturation, value.as_f32())
            }
            (EffectKind::ColorAdjust { brightness, .. }, "brightness") => {
                assign(brightness, value.as_f32().map(|v| v.clamp(-1.0, 1.0)))
            }
            (EffectKind::PaletteCycle { start_index, .. }, "start_index") => {
                assign(start_index, as_i32(value))
            }
            (EffectKind::PaletteCycle { end_index, .. }, "end_index") => assign(end_index, as_i32(value)),
            (EffectKind::PaletteCycle { speed, .. }, "speed") => assign(speed, value.as_f32()),
            (EffectKind::PaletteCycle { reverse, .. }, "reverse") => assign(reverse, value.as_bool()),
            _ => false,
        }
    }
}

/// An effect instance attached to a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerEffect {
    /// Identifier used to match keyframe snapshots back to this instance
    pub id: String,
    /// Whether the effect renders
    pub enabled: bool,
    /// Parameters
    pub kind: EffectKind,
}

impl LayerEffect {
    /// Create an enabled effect instance
    pub fn new(id: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            kind,
        }
    }

    /// Snapshot the current state
    pub fn snapshot(&self) -> EffectKeyframe {
        EffectKeyframe {
            effect_id: self.id.clone(),
            enabled: self.enabled,
            property_values: self.kind.describe(),
        }
    }

    /// Apply a snapshot taken from this instance
    pub fn apply_snapshot(&mut self, snapshot: &EffectKeyframe) -> usize {
        self.enabled = snapshot.enabled;
        self.kind.apply(&snapshot.property_values)
    }
}

/// Captured state of one effect instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectKeyframe {
    /// Matches [`LayerEffect::id`]
    pub effect_id: String,
    /// Captured enabled flag
    pub enabled: bool,
    /// Captured property values by name
    pub property_values: IndexMap<String, PropertyValue>,
}
