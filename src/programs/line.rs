use anyhow::Context as _;

use crate::{
    context::{
        GraphicsContext, ProgramHandle, ProgramSource, UniformDecl, UniformKind, UniformLocation,
    },
    data_structures::vertex::{LineVertex, Vertex},
    programs::{locate, upload_matrix},
};

/// Program for debug and selection lines. Fogged like terrain so lines fade
/// out at the same distance as the blocks around them.
#[derive(Debug, Clone, PartialEq)]
pub struct LineProgram {
    pub handle: ProgramHandle,
    pub u_view_proj: Option<UniformLocation>,
    pub u_fog_info: Option<UniformLocation>,
    pub u_fog_color: Option<UniformLocation>,
}

impl LineProgram {
    pub const LABEL: &'static str = "line program";

    pub const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl {
            name: "view_proj",
            kind: UniformKind::Mat4,
        },
        UniformDecl {
            name: "fog_info",
            kind: UniformKind::Vec2,
        },
        UniformDecl {
            name: "fog_color",
            kind: UniformKind::Vec3,
        },
    ];

    pub fn source() -> ProgramSource {
        ProgramSource {
            label: Self::LABEL,
            wgsl: include_str!("line.wgsl"),
            vertex_layout: LineVertex::desc(),
            topology: wgpu::PrimitiveTopology::LineList,
            uniforms: Self::UNIFORMS,
            textured: false,
        }
    }

    pub fn create<G: GraphicsContext + ?Sized>(ctx: &mut G) -> anyhow::Result<Self> {
        let handle = ctx
            .create_program(&Self::source())
            .context("Failed to create line program")?;
        Ok(Self {
            handle,
            u_view_proj: locate(ctx, handle, "view_proj"),
            u_fog_info: locate(ctx, handle, "fog_info"),
            u_fog_color: locate(ctx, handle, "fog_color"),
        })
    }

    /// Uploads the view-projection matrix. The program must be in use.
    pub fn set_view_proj<G: GraphicsContext + ?Sized>(
        &self,
        ctx: &mut G,
        view_proj: cgmath::Matrix4<f32>,
    ) {
        upload_matrix(ctx, self.u_view_proj, view_proj);
    }

    pub fn delete<G: GraphicsContext + ?Sized>(self, ctx: &mut G) {
        ctx.delete_program(self.handle);
    }
}
