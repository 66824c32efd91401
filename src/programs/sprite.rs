use anyhow::anyhow;

use crate::{
    context::{
        GraphicsContext, ProgramHandle, ProgramSource, SharedProgram, UniformDecl, UniformKind,
        UniformLocation,
    },
    data_structures::vertex::{SpriteVertex, Vertex},
    programs::{locate, upload2, upload_matrix},
};

/// The sprite program every context publishes as [`SharedProgram::Sprite`].
///
/// Unlike the line and face programs it is owned by the context, so the
/// render state only looks it up and never deletes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteProgram {
    pub handle: ProgramHandle,
    pub u_view_proj: Option<UniformLocation>,
    pub u_tex_size: Option<UniformLocation>,
}

impl SpriteProgram {
    pub const LABEL: &'static str = "sprite program";

    pub const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl {
            name: "view_proj",
            kind: UniformKind::Mat4,
        },
        UniformDecl {
            name: "tex_size",
            kind: UniformKind::Vec2,
        },
    ];

    pub fn source() -> ProgramSource {
        ProgramSource {
            label: Self::LABEL,
            wgsl: include_str!("sprite.wgsl"),
            vertex_layout: SpriteVertex::desc(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            uniforms: Self::UNIFORMS,
            textured: true,
        }
    }

    /// Fetches the shared program from the context.
    pub fn shared<G: GraphicsContext + ?Sized>(ctx: &G) -> anyhow::Result<Self> {
        let handle = ctx
            .shared_program(SharedProgram::Sprite)
            .ok_or_else(|| anyhow!("The graphics context has no shared sprite program"))?;
        Ok(Self {
            handle,
            u_view_proj: locate(ctx, handle, "view_proj"),
            u_tex_size: locate(ctx, handle, "tex_size"),
        })
    }

    pub fn set_view_proj<G: GraphicsContext + ?Sized>(
        &self,
        ctx: &mut G,
        view_proj: cgmath::Matrix4<f32>,
    ) {
        upload_matrix(ctx, self.u_view_proj, view_proj);
    }

    /// Uploads the size of the atlas sprites are sampled from.
    pub fn set_tex_size<G: GraphicsContext + ?Sized>(&self, ctx: &mut G, width: u32, height: u32) {
        upload2(ctx, self.u_tex_size, [width as f32, height as f32]);
    }
}
