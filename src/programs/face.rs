use anyhow::Context as _;

use crate::{
    context::{
        GraphicsContext, ProgramHandle, ProgramSource, UniformDecl, UniformKind, UniformLocation,
    },
    data_structures::vertex::{FaceVertex, Vertex},
    programs::{locate, upload_matrix},
};

/// Program for block faces in both chunk passes.
///
/// Faces sample the block atlas in texel space; `tex_size` carries the atlas
/// dimensions used to normalize them.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceProgram {
    pub handle: ProgramHandle,
    pub u_view_proj: Option<UniformLocation>,
    pub u_tex_size: Option<UniformLocation>,
    pub u_ambient_light_color: Option<UniformLocation>,
    pub u_sun_light_direction: Option<UniformLocation>,
    pub u_sun_light_color: Option<UniformLocation>,
    pub u_fog_info: Option<UniformLocation>,
    pub u_fog_color: Option<UniformLocation>,
}

impl FaceProgram {
    pub const LABEL: &'static str = "face program";

    pub const UNIFORMS: &'static [UniformDecl] = &[
        UniformDecl {
            name: "view_proj",
            kind: UniformKind::Mat4,
        },
        UniformDecl {
            name: "tex_size",
            kind: UniformKind::Vec2,
        },
        UniformDecl {
            name: "ambient_light_color",
            kind: UniformKind::Vec3,
        },
        UniformDecl {
            name: "sun_light_direction",
            kind: UniformKind::Vec3,
        },
        UniformDecl {
            name: "sun_light_color",
            kind: UniformKind::Vec3,
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
            wgsl: include_str!("face.wgsl"),
            vertex_layout: FaceVertex::desc(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            uniforms: Self::UNIFORMS,
            textured: true,
        }
    }

    pub fn create<G: GraphicsContext + ?Sized>(ctx: &mut G) -> anyhow::Result<Self> {
        let handle = ctx
            .create_program(&Self::source())
            .context("Failed to create face program")?;
        Ok(Self {
            handle,
            u_view_proj: locate(ctx, handle, "view_proj"),
            u_tex_size: locate(ctx, handle, "tex_size"),
            u_ambient_light_color: locate(ctx, handle, "ambient_light_color"),
            u_sun_light_direction: locate(ctx, handle, "sun_light_direction"),
            u_sun_light_color: locate(ctx, handle, "sun_light_color"),
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
