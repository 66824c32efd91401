use anyhow::{Context as _, ensure};

use crate::{
    buffers::{INDICES_PER_QUAD, MAX_QUADS, quad_indices},
    context::{BufferHandle, GraphicsContext},
};

/// Shared description of how chunk face buffers are indexed.
///
/// Chunk meshes only upload vertices; every face buffer is drawn through the
/// one block index buffer this builder creates. A single draw may therefore
/// cover at most [`face_capacity`](Self::face_capacity) faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBuilder {
    face_capacity: u32,
}

impl BlockBuilder {
    /// Fails when `face_capacity` quads cannot be addressed with `u16`
    /// indices.
    pub fn new(face_capacity: u32) -> anyhow::Result<Self> {
        ensure!(
            face_capacity <= MAX_QUADS,
            "Block face capacity {face_capacity} exceeds the {MAX_QUADS} quads addressable with u16 indices"
        );
        Ok(Self { face_capacity })
    }

    pub fn face_capacity(&self) -> u32 {
        self.face_capacity
    }

    /// Number of indices to draw for `faces` faces.
    pub fn index_count(&self, faces: u32) -> u32 {
        debug_assert!(faces <= self.face_capacity);
        faces.min(self.face_capacity) * INDICES_PER_QUAD
    }

    pub fn create_index_buffer<G: GraphicsContext + ?Sized>(
        &self,
        ctx: &mut G,
    ) -> anyhow::Result<BufferHandle> {
        ctx.create_index_buffer("block index buffer", &quad_indices(self.face_capacity))
            .context("Failed to create block index buffer")
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self {
            face_capacity: MAX_QUADS,
        }
    }
}
