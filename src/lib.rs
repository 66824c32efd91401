//! blk-render
//!
//! Render-state management for a block (voxel) game client. The crate
//! decides which fixed-function state, program, texture, index buffer and
//! vertex attributes are bound for each drawing pass of a frame, and keeps
//! the shared quad index buffers alive across device loss.
//!
//! High-level modules
//! - `context`: the GL-style device boundary plus a recording and a wgpu backend
//! - `render_state`: the per-frame mode state machine
//! - `mode`: render modes, their state bundles and re-entry policy
//! - `state`: blend, depth, rasterizer and filtering descriptions
//! - `programs`: the line, face and sprite shader programs
//! - `buffers`: quad index buffers for sprites and chunk faces
//! - `resources`: asset sources, texture atlases and the bitmap font
//! - `scene`: viewport and lighting inputs
//! - `config`: asset names and buffer capacities
//!

pub mod buffers;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod mode;
pub mod programs;
pub mod render_state;
pub mod resources;
pub mod scene;
pub mod state;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::RenderConfig;
pub use context::{GraphicsContext, recording::RecordingContext, wgpu_context::WgpuContext};
pub use mode::Mode;
pub use render_state::{IndexBuffers, RenderState, SpriteAtlas};
pub use scene::{Lighting, Viewport};
pub use wgpu;

/// Installs the platform logger: `env_logger` natively (filtered through
/// `RUST_LOG`), the browser console on wasm. Safe to call more than once.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize logger: {}", e);
        }
    }
}
