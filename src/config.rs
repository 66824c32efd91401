//! Render state configuration: asset names, capacities and filtering.

use crate::{buffers::{MAX_QUADS, SpriteBuffer}, state::Filtering};

/// Settings the render state is constructed with.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Asset name of the block atlas image.
    pub block_atlas: String,
    /// Asset name of the UI atlas image.
    pub ui_atlas: String,
    /// Asset name of the monospace font image.
    pub font: String,
    /// Glyph cell size of the font, width by height.
    pub font_glyph_size: (u32, u32),
    /// Edge length of one square atlas slot in texels.
    pub atlas_slot_size: u32,
    /// Sprites drawable from the shared sprite index buffer in one call.
    pub sprite_capacity: u32,
    /// Faces drawable from the shared block index buffer in one call.
    pub block_face_capacity: u32,
    /// Filtering of the block and UI atlases.
    pub atlas_filtering: Filtering,
}

impl RenderConfig {
    pub fn with_block_atlas(mut self, name: impl Into<String>) -> Self {
        self.block_atlas = name.into();
        self
    }

    pub fn with_ui_atlas(mut self, name: impl Into<String>) -> Self {
        self.ui_atlas = name.into();
        self
    }

    pub fn with_font(mut self, name: impl Into<String>, glyph_width: u32, glyph_height: u32) -> Self {
        self.font = name.into();
        self.font_glyph_size = (glyph_width, glyph_height);
        self
    }

    pub fn with_sprite_capacity(mut self, capacity: u32) -> Self {
        self.sprite_capacity = capacity;
        self
    }

    pub fn with_block_face_capacity(mut self, capacity: u32) -> Self {
        self.block_face_capacity = capacity;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_atlas: "textures/blocks.png".to_string(),
            ui_atlas: "textures/ui.png".to_string(),
            font: "fonts/monospace.png".to_string(),
            font_glyph_size: (8, 8),
            atlas_slot_size: 16,
            sprite_capacity: SpriteBuffer::DEFAULT_CAPACITY,
            block_face_capacity: MAX_QUADS,
            atlas_filtering: Filtering::NEAREST,
        }
    }
}
