//! Programs the render state binds per mode.
//!
//! - `line` draws colored, fogged line lists
//! - `face` draws textured, lit and fogged block faces
//! - `sprite` is the shared sprite program a context publishes itself
//! - `pipeline` bakes a program plus bound state into a wgpu render pipeline

use crate::context::{GraphicsContext, ProgramHandle, UniformLocation};

pub mod face;
pub mod line;
pub mod pipeline;
pub mod sprite;

pub use face::FaceProgram;
pub use line::LineProgram;
pub use sprite::SpriteProgram;

/// Looks up a uniform, warning when the program does not expose it.
pub(crate) fn locate<G: GraphicsContext + ?Sized>(
    ctx: &G,
    program: ProgramHandle,
    name: &str,
) -> Option<UniformLocation> {
    let location = ctx.uniform_location(program, name);
    if location.is_none() {
        log::warn!("program {program:?} has no uniform named {name}");
    }
    location
}

pub(crate) fn upload2<G: GraphicsContext + ?Sized>(
    ctx: &mut G,
    location: Option<UniformLocation>,
    value: [f32; 2],
) {
    if let Some(location) = location {
        ctx.uniform2f(location, value[0], value[1]);
    }
}

pub(crate) fn upload3<G: GraphicsContext + ?Sized>(
    ctx: &mut G,
    location: Option<UniformLocation>,
    value: cgmath::Vector3<f32>,
) {
    if let Some(location) = location {
        ctx.uniform3f(location, value.x, value.y, value.z);
    }
}

pub(crate) fn upload_matrix<G: GraphicsContext + ?Sized>(
    ctx: &mut G,
    location: Option<UniformLocation>,
    matrix: cgmath::Matrix4<f32>,
) {
    if let Some(location) = location {
        ctx.uniform_matrix4(location, matrix.into());
    }
}
