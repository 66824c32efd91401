use anyhow::Context as _;

use crate::{
    context::{GraphicsContext, TextureHandle},
    resources::{AssetSource, load_image},
    state::{Filtering, TextureFilter},
};

/// A texture made of equally sized square slots (block faces, UI icons).
///
/// The GPU handle is absent until [`load`](Self::load) succeeds and again
/// after [`unload`](Self::unload). Code binding the atlas has to cope with
/// that, which is what [`bind`](Self::bind) does.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAtlas {
    name: String,
    pub handle: Option<TextureHandle>,
    pub width: u32,
    pub height: u32,
    slot_size: u32,
    filtering: Filtering,
}

impl TextureAtlas {
    pub fn new(name: impl Into<String>, slot_size: u32) -> Self {
        Self {
            name: name.into(),
            handle: None,
            width: 0,
            height: 0,
            slot_size: slot_size.max(1),
            filtering: Filtering::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot_size(&self) -> u32 {
        self.slot_size
    }

    pub fn filtering(&self) -> Filtering {
        self.filtering
    }

    /// Takes effect on the next [`load`](Self::load).
    pub fn set_filtering_mode(&mut self, min: TextureFilter, mag: TextureFilter) {
        self.filtering = Filtering { min, mag };
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Decodes the atlas image and uploads it, replacing a previous upload.
    ///
    /// On error the atlas is left unloaded.
    pub fn load<A, G>(&mut self, assets: &A, ctx: &mut G) -> anyhow::Result<()>
    where
        A: AssetSource + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        self.unload(ctx);
        let image = load_image(assets, &self.name)?;
        let handle = ctx
            .create_texture(&self.name, &image, self.filtering)
            .with_context(|| format!("Failed to upload atlas {}", self.name))?;
        self.width = image.width();
        self.height = image.height();
        self.handle = Some(handle);
        log::debug!("loaded atlas {} ({}x{})", self.name, self.width, self.height);
        Ok(())
    }

    pub fn unload<G: GraphicsContext + ?Sized>(&mut self, ctx: &mut G) {
        if let Some(handle) = self.handle.take() {
            ctx.delete_texture(handle);
        }
    }

    /// Binds the atlas texture, or unbinds the texture slot when the atlas
    /// has no GPU handle. Returns whether a texture is bound afterwards.
    pub fn bind<G: GraphicsContext + ?Sized>(&self, ctx: &mut G) -> bool {
        ctx.bind_texture(self.handle);
        self.handle.is_some()
    }

    pub fn slots_per_row(&self) -> u32 {
        self.width / self.slot_size
    }

    pub fn slot_count(&self) -> u32 {
        self.slots_per_row() * (self.height / self.slot_size)
    }

    /// Texel rectangle `[x, y, width, height]` of slot `index`, row-major.
    pub fn slot_rect(&self, index: u32) -> Option<[u32; 4]> {
        if index >= self.slot_count() {
            return None;
        }
        let per_row = self.slots_per_row();
        Some([
            (index % per_row) * self.slot_size,
            (index / per_row) * self.slot_size,
            self.slot_size,
            self.slot_size,
        ])
    }
}
