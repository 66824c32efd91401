use anyhow::{Context as _, ensure};

use crate::{
    buffers::{MAX_QUADS, quad_indices},
    context::{BufferHandle, GraphicsContext},
};

/// Index layout shared by every sprite batch.
pub struct SpriteBuffer;

impl SpriteBuffer {
    /// Default number of sprites one batch can hold.
    pub const DEFAULT_CAPACITY: u32 = 2048;

    /// Creates the index buffer for batches of up to `capacity` sprites.
    pub fn create_index_buffer<G: GraphicsContext + ?Sized>(
        ctx: &mut G,
        capacity: u32,
    ) -> anyhow::Result<BufferHandle> {
        ensure!(
            capacity <= MAX_QUADS,
            "Sprite capacity {capacity} exceeds the {MAX_QUADS} quads addressable with u16 indices"
        );
        ctx.create_index_buffer("sprite index buffer", &quad_indices(capacity))
            .context("Failed to create sprite index buffer")
    }
}
