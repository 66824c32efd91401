//! The graphics device boundary.
//!
//! [`GraphicsContext`] is the set of GL-style primitives the render state is
//! written against: settable state objects, bind points, uniform uploads and
//! buffer/texture/program lifetimes. Two implementations live here:
//!
//! - [`recording::RecordingContext`] keeps no GPU at all and records every
//!   call, which makes the call stream itself testable.
//! - [`wgpu_context::WgpuContext`] tracks the bound state on top of `wgpu`
//!   and replays deferred draws into a single render pass on submit.

use crate::state::{BlendState, DepthState, Filtering, RasterizerState};

pub mod recording;
pub mod wgpu_context;

/// Handle of a GPU buffer owned by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle of a GPU texture owned by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Handle of a linked program owned by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// A uniform slot inside a specific program.
///
/// Every declared uniform occupies whole 16 byte rows so that vec2/vec3
/// values never straddle WGSL alignment boundaries. `offset` is in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub program: ProgramHandle,
    pub offset: u32,
}

/// Shape of a declared uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Vec2,
    Vec3,
    Mat4,
}

impl UniformKind {
    /// Size in bytes the uniform takes up in the program's uniform block.
    pub const fn padded_size(self) -> u32 {
        match self {
            UniformKind::Vec2 | UniformKind::Vec3 => 16,
            UniformKind::Mat4 => 64,
        }
    }
}

/// A uniform a program exposes, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

/// Everything a context needs to build a program.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub label: &'static str,
    pub wgsl: &'static str,
    pub vertex_layout: wgpu::VertexBufferLayout<'static>,
    pub topology: wgpu::PrimitiveTopology,
    pub uniforms: &'static [UniformDecl],
    /// Programs that sample the bound texture get a texture/sampler group.
    pub textured: bool,
}

impl ProgramSource {
    /// Byte offset of every uniform, following declaration order.
    pub fn uniform_offsets(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.uniforms.iter().scan(0u32, |offset, decl| {
            let current = *offset;
            *offset += decl.kind.padded_size();
            Some((decl.name, current))
        })
    }

    /// Total size of the uniform block in bytes, never zero.
    pub fn uniform_block_size(&self) -> u32 {
        self.uniforms
            .iter()
            .map(|decl| decl.kind.padded_size())
            .sum::<u32>()
            .max(16)
    }
}

/// Programs provided by the context itself rather than by its users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedProgram {
    Sprite,
}

/// Which buffers a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const DEPTH: ClearMask = ClearMask {
        color: false,
        depth: true,
    };

    pub const COLOR_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

/// Pixel rectangle rendering is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Number of vertex attribute slots a context tracks.
pub const MAX_VERTEX_ATTRIBS: usize = 8;

/// Snapshot of everything bound on a context.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundState {
    pub blend: BlendState,
    pub depth: DepthState,
    pub rasterizer: RasterizerState,
    pub viewport: Option<ViewportRect>,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub program: Option<ProgramHandle>,
    pub texture: Option<TextureHandle>,
    pub index_buffer: Option<BufferHandle>,
    pub vertex_buffer: Option<BufferHandle>,
    pub attribs: [bool; MAX_VERTEX_ATTRIBS],
}

impl BoundState {
    /// Slots currently enabled, in ascending order.
    pub fn enabled_attribs(&self) -> Vec<u32> {
        self.attribs
            .iter()
            .enumerate()
            .filter(|(_, enabled)| **enabled)
            .map(|(slot, _)| slot as u32)
            .collect()
    }

    pub(crate) fn set_attrib(&mut self, slot: u32, enabled: bool) {
        match self.attribs.get_mut(slot as usize) {
            Some(entry) => *entry = enabled,
            None => log::error!("vertex attribute slot {slot} out of range"),
        }
    }
}

impl Default for BoundState {
    fn default() -> Self {
        Self {
            blend: BlendState::DEFAULT,
            depth: DepthState::DEFAULT,
            rasterizer: RasterizerState::DEFAULT,
            viewport: None,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            clear_depth: 1.0,
            program: None,
            texture: None,
            index_buffer: None,
            vertex_buffer: None,
            attribs: [false; MAX_VERTEX_ATTRIBS],
        }
    }
}

/// The device primitives the render state drives.
///
/// All calls are immediate from the caller's point of view: a bind changes
/// what the next draw observes and nothing else. Binding `None` unbinds.
pub trait GraphicsContext {
    /// Size in pixels of the surface being rendered to.
    fn canvas_size(&self) -> (u32, u32);

    fn set_blend_state(&mut self, state: &BlendState);
    fn set_depth_state(&mut self, state: &DepthState);
    fn set_rasterizer_state(&mut self, state: &RasterizerState);

    fn set_viewport(&mut self, rect: ViewportRect);
    fn set_clear_color(&mut self, rgba: [f32; 4]);
    fn set_clear_depth(&mut self, depth: f32);
    fn clear(&mut self, mask: ClearMask);

    fn use_program(&mut self, program: Option<ProgramHandle>);
    fn bind_texture(&mut self, texture: Option<TextureHandle>);
    fn bind_index_buffer(&mut self, buffer: Option<BufferHandle>);
    fn bind_vertex_buffer(&mut self, buffer: Option<BufferHandle>);
    fn enable_vertex_attrib(&mut self, slot: u32);
    fn disable_vertex_attrib(&mut self, slot: u32);

    fn uniform2f(&mut self, location: UniformLocation, x: f32, y: f32);
    fn uniform3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32);
    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: [[f32; 4]; 4]);

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> anyhow::Result<BufferHandle>;
    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> anyhow::Result<BufferHandle>;
    /// Releasing a handle twice, or one the context never issued, is ignored.
    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn create_texture(
        &mut self,
        label: &str,
        image: &image::RgbaImage,
        filtering: Filtering,
    ) -> anyhow::Result<TextureHandle>;
    fn delete_texture(&mut self, texture: TextureHandle);

    fn create_program(&mut self, source: &ProgramSource) -> anyhow::Result<ProgramHandle>;
    fn delete_program(&mut self, program: ProgramHandle);
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn shared_program(&self, kind: SharedProgram) -> Option<ProgramHandle>;

    /// Draws `count` indices from the bound index buffer starting at `first`,
    /// with whatever program, texture and attribute set is currently bound.
    fn draw_elements(&mut self, count: u32, first: u32);
}
