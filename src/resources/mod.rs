//! Loading textures and fonts from an asset source.
//!
//! - `atlas` contains [`TextureAtlas`], a tiled texture with a lazily created GPU handle
//! - `font` contains [`MonospaceFont`], a fixed-width glyph atlas

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, anyhow};

pub mod atlas;
pub mod font;

pub use atlas::TextureAtlas;
pub use font::MonospaceFont;

/// Where asset bytes come from.
pub trait AssetSource {
    fn load_binary(&self, name: &str) -> anyhow::Result<Vec<u8>>;
}

/// Reads assets from a directory, `./assets` by default.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for DirAssets {
    fn default() -> Self {
        Self::new(Path::new("./").join("assets"))
    }
}

impl AssetSource for DirAssets {
    fn load_binary(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.root.join(name);
        std::fs::read(&path).with_context(|| format!("Failed to read asset {}", path.display()))
    }
}

/// Assets held in memory, e.g. embedded with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetSource for MemoryAssets {
    fn load_binary(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Asset {name} not found"))
    }
}

/// Loads and decodes an image asset into RGBA8.
pub fn load_image<A: AssetSource + ?Sized>(assets: &A, name: &str) -> anyhow::Result<image::RgbaImage> {
    let bytes = assets.load_binary(name)?;
    let img = image::load_from_memory(&bytes).with_context(|| format!("Failed to decode {name}"))?;
    Ok(img.to_rgba8())
}
