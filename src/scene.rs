//! Per-frame scene inputs: the camera viewport and lighting parameters.

use cgmath::{Matrix4, SquareMatrix, Vector3};

/// The camera a frame is rendered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Viewport {
    /// Identity camera covering `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Ambient, sun and fog parameters shared by the line and face programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient_light_color: Vector3<f32>,
    /// Normalized direction the sun light travels in.
    pub sun_light_direction: Vector3<f32>,
    pub sun_light_color: Vector3<f32>,
    pub fog_near: f32,
    pub fog_far: f32,
    pub fog_color: Vector3<f32>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient_light_color: Vector3::new(0.3, 0.3, 0.3),
            sun_light_direction: Vector3::new(0.0, -1.0, 0.0),
            sun_light_color: Vector3::new(1.0, 1.0, 1.0),
            fog_near: 64.0,
            fog_far: 128.0,
            fog_color: Vector3::new(0.6, 0.8, 1.0),
        }
    }
}
