// SPDX-License-Identifier: MIT OR Apache-2.0
//! The document model seen by the animation engine.
//!
//! The engine only captures and restores layer state; it never draws. The
//! [`DocumentModel`] trait is the seam to the editor's real document, and
//! [`MemoryDocument`] is a plain in-memory implementation used by the player
//! and by tests.

use crate::effect::LayerEffect;
use crate::pixels::PixelBuffer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a document layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Create a new random layer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layer blend mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BlendMode {
    /// Source-over
    #[default]
    Normal,
    /// Multiply
    Multiply,
    /// Screen
    Screen,
    /// Overlay
    Overlay,
    /// Additive
    Add,
    /// Subtractive
    Subtract,
    /// Darken
    Darken,
    /// Lighten
    Lighten,
}

/// What kind of layer this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayerKind {
    /// Pixel layer
    #[default]
    Raster,
    /// Folder of other layers; only visibility animates
    Group,
    /// Tracing reference image, never animated
    Reference,
}

/// Layer mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMask {
    /// Whether the mask applies
    pub enabled: bool,
    /// Whether the mask is inverted
    pub inverted: bool,
    /// Mask pixels (alpha channel is used)
    pub pixels: PixelBuffer,
}

/// A document layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Stable identifier
    pub id: LayerId,
    /// Display name
    pub name: String,
    /// Layer kind
    pub kind: LayerKind,
    /// Visibility
    pub visible: bool,
    /// Opacity (0 to 255)
    pub opacity: u8,
    /// Blend mode
    pub blend_mode: BlendMode,
    /// Layer pixels
    pub pixels: PixelBuffer,
    /// Optional mask
    pub mask: Option<LayerMask>,
    /// Attached effects
    pub effects: Vec<LayerEffect>,
}

impl Layer {
    /// Create a visible, transparent raster layer
    pub fn raster(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            kind: LayerKind::Raster,
            visible: true,
            opacity: 255,
            blend_mode: BlendMode::Normal,
            pixels: PixelBuffer::new(width, height),
            mask: None,
            effects: Vec::new(),
        }
    }

    /// Change the layer kind
    pub fn with_kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this layer gets an animation track
    pub fn is_animatable(&self) -> bool {
        self.kind != LayerKind::Reference
    }

    /// Find an effect instance by id
    pub fn effect_mut(&mut self, effect_id: &str) -> Option<&mut LayerEffect> {
        self.effects.iter_mut().find(|e| e.id == effect_id)
    }
}

/// Document operations the animation engine depends on
pub trait DocumentModel {
    /// Layer ids bottom-to-top (composite order)
    fn layer_ids(&self) -> Vec<LayerId>;

    /// Shared access to a layer
    fn layer(&self, id: LayerId) -> Option<&Layer>;

    /// Mutable access to a layer
    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer>;

    /// Canvas size in pixels
    fn canvas_size(&self) -> (u32, u32);

    /// Rebuild the composited image after layer state changed
    fn recomposite(&mut self);
}

/// Source of tile pixels for reels that do not embed their frames
pub trait TileSource {
    /// Render the tile at grid position `(tile_x, tile_y)` sized `width x height`
    fn render_tile(&self, tile_x: i32, tile_y: i32, width: u32, height: u32) -> Option<PixelBuffer>;
}

/// Simple in-memory document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Canvas width
    pub width: u32,
    /// Canvas height
    pub height: u32,
    /// Layers bottom-to-top
    pub layers: Vec<Layer>,
    /// Last composited image
    #[serde(skip)]
    composite: Option<PixelBuffer>,
    /// Number of recomposites since creation
    #[serde(skip)]
    recomposite_count: usize,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
            composite: None,
            recomposite_count: 0,
        }
    }

    /// Add a layer on top, returning its id
    pub fn push_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layers.push(layer);
        id
    }

    /// Remove a layer
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }

    /// Composited image, building it if needed
    pub fn composite(&mut self) -> &PixelBuffer {
        if self.composite.is_none() {
            self.recomposite();
        }
        let (width, height) = (self.width, self.height);
        self.composite.get_or_insert_with(|| PixelBuffer::new(width, height))
    }

    /// How many times the document was recomposited
    pub fn recomposite_count(&self) -> usize {
        self.recomposite_count
    }

    fn flatten(&self) -> PixelBuffer {
        let mut out = PixelBuffer::new(self.width, self.height);
        for layer in &self.layers {
            if !layer.visible || layer.kind != LayerKind::Raster {
                continue;
            }
            let masked;
            let source = match &layer.mask {
                Some(mask) if mask.enabled && mask.pixels.same_size(&layer.pixels) => {
                    masked = apply_mask(&layer.pixels, mask);
                    &masked
                }
                _ => &layer.pixels,
            };
            out.blend_over(source, 0, 0, layer.opacity);
        }
        out
    }
}

fn apply_mask(pixels: &PixelBuffer, mask: &LayerMask) -> PixelBuffer {
    let mut out = pixels.clone();
    for y in 0..pixels.height {
        for x in 0..pixels.width {
            let (Some(mut px), Some(m)) = (pixels.pixel(x, y), mask.pixels.pixel(x, y)) else {
                continue;
            };
            let coverage = if mask.inverted { 255 - m[3] } else { m[3] };
            px[3] = (px[3] as u32 * coverage as u32 / 255) as u8;
            out.set_pixel(x, y, px);
        }
    }
    out
}

impl DocumentModel for MemoryDocument {
    fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn recomposite(&mut self) {
        self.composite = Some(self.flatten());
        self.recomposite_count += 1;
    }
}

impl TileSource for MemoryDocument {
    fn render_tile(&self, tile_x: i32, tile_y: i32, width: u32, height: u32) -> Option<PixelBuffer> {
        if tile_x < 0 || tile_y < 0 || width == 0 || height == 0 {
            return None;
        }
        let x = tile_x.checked_mul(width as i32)?;
        let y = tile_y.checked_mul(height as i32)?;
        if x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.flatten().region(x, y, width, height))
    }
}
