//! Shared quad index buffers.
//!
//! Sprites and block faces are both drawn as quads, four vertices each, so a
//! single immutable index buffer per kind serves every draw. Only the
//! capacity differs.

pub mod block;
pub mod sprite;

pub use block::BlockBuilder;
pub use sprite::SpriteBuffer;

/// Vertices making up one quad.
pub const VERTICES_PER_QUAD: u32 = 4;

/// Indices drawing one quad as two triangles.
pub const INDICES_PER_QUAD: u32 = 6;

/// Largest quad count whose vertices are still addressable with `u16`
/// indices.
pub const MAX_QUADS: u32 = (u16::MAX as u32 + 1) / VERTICES_PER_QUAD;

/// Indices for `quads` quads laid out as `0 1 2, 0 2 3`, each quad offset by
/// four vertices.
///
/// # Panics
///
/// Panics if `quads` exceeds [`MAX_QUADS`].
pub fn quad_indices(quads: u32) -> Vec<u16> {
    assert!(
        quads <= MAX_QUADS,
        "{quads} quads exceed the u16 index range ({MAX_QUADS} max)"
    );
    (0..quads)
        .flat_map(|quad| {
            let base = (quad * VERTICES_PER_QUAD) as u16;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}
