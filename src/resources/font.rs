use crate::{
    context::GraphicsContext,
    resources::{AssetSource, TextureAtlas},
    state::TextureFilter,
};

/// A fixed-width bitmap font.
///
/// Glyphs are stored row-major in an atlas image, starting at `first_char`
/// and advancing one code point per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MonospaceFont {
    pub atlas: TextureAtlas,
    glyph_width: u32,
    glyph_height: u32,
    first_char: char,
}

impl MonospaceFont {
    pub fn new(name: impl Into<String>, glyph_width: u32, glyph_height: u32) -> Self {
        let glyph_width = glyph_width.max(1);
        let glyph_height = glyph_height.max(1);
        let mut atlas = TextureAtlas::new(name, glyph_width);
        atlas.set_filtering_mode(TextureFilter::Nearest, TextureFilter::Nearest);
        Self {
            atlas,
            glyph_width,
            glyph_height,
            first_char: ' ',
        }
    }

    pub fn with_first_char(mut self, first_char: char) -> Self {
        self.first_char = first_char;
        self
    }

    pub fn glyph_size(&self) -> (u32, u32) {
        (self.glyph_width, self.glyph_height)
    }

    pub fn load<A, G>(&mut self, assets: &A, ctx: &mut G) -> anyhow::Result<()>
    where
        A: AssetSource + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        self.atlas.load(assets, ctx)
    }

    pub fn unload<G: GraphicsContext + ?Sized>(&mut self, ctx: &mut G) {
        self.atlas.unload(ctx);
    }

    /// Pixel size of `text` laid out with one glyph per char and `\n` line
    /// breaks.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }
        let (columns, lines) = text.split('\n').fold((0u32, 0u32), |(columns, lines), line| {
            (columns.max(line.chars().count() as u32), lines + 1)
        });
        (columns * self.glyph_width, lines * self.glyph_height)
    }

    /// Texel rectangle `[x, y, width, height]` of the glyph for `ch`, if the
    /// atlas is loaded and contains it.
    pub fn glyph_rect(&self, ch: char) -> Option<[u32; 4]> {
        let index = (ch as u32).checked_sub(self.first_char as u32)?;
        let columns = self.atlas.width / self.glyph_width;
        let rows = self.atlas.height / self.glyph_height;
        if index >= columns * rows {
            return None;
        }
        Some([
            (index % columns) * self.glyph_width,
            (index / columns) * self.glyph_height,
            self.glyph_width,
            self.glyph_height,
        ])
    }
}
