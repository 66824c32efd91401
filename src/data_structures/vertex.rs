//! Vertex formats consumed by the line, face and sprite programs.
//!
//! Attribute slots line up with the vertex attribute arrays the render state
//! enables per mode: faces and sprites use slots 0-2, lines only 0-1.

use std::mem;

/// Describes how the bytes of a vertex map onto shader locations.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Position, texel coordinates and color in slots 0, 1 and 2.
const TEXTURED_ATTRIBS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x4];

/// Position and color in slots 0 and 1.
const LINE_ATTRIBS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

fn layout<V>(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<V>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// A corner of a block face.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceVertex {
    pub position: [f32; 3],
    /// Texel coordinates into the block atlas, normalized in the shader with
    /// the atlas size.
    pub tex_coords: [f32; 2],
    /// Per-vertex light and tint.
    pub color: [f32; 4],
}

impl Vertex for FaceVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        layout::<Self>(&TEXTURED_ATTRIBS)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        layout::<Self>(&LINE_ATTRIBS)
    }
}

/// A sprite corner; `tex_coords` are texels of whichever atlas is bound.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex for SpriteVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        layout::<Self>(&TEXTURED_ATTRIBS)
    }
}
