//! GPU-facing data types.
//!
//! - `texture` wraps wgpu textures: atlas uploads, color target and depth buffer
//! - `vertex` holds the vertex formats of the line, face and sprite programs

pub mod texture;
pub mod vertex;
