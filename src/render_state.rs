//! The per-frame render state coordinator.
//!
//! [`RenderState`] owns the programs, atlases and shared index buffers the
//! voxel renderer draws with, and knows which [`Mode`] the context is in.
//! A frame looks like:
//!
//! ```text
//! reset -> begin_chunk_pass1 -> draw.. -> begin_chunk_pass2 -> draw..
//!       -> begin_lines -> draw.. -> begin_sprites -> draw..
//! ```
//!
//! Entering a mode applies its state in a fixed order: blend, depth, program
//! and texture, index buffer, vertex attributes. Draws issued after a
//! `begin_*` call therefore never observe a half-switched context.

use crate::{
    buffers::{BlockBuilder, INDICES_PER_QUAD, SpriteBuffer},
    config::RenderConfig,
    context::{BufferHandle, ClearMask, GraphicsContext, ViewportRect},
    mode::{Mode, Transition},
    programs::{FaceProgram, LineProgram, SpriteProgram, upload2, upload3},
    resources::{AssetSource, MonospaceFont, TextureAtlas},
    scene::{Lighting, Viewport},
    state::RasterizerState,
};

/// Rasterizer state applied at the start of every frame.
pub const RASTERIZER_STATE: RasterizerState = RasterizerState::CULL_BACK;

/// The shared index buffers, present only while the device is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBuffers {
    /// Device lost, or never restored.
    #[default]
    Invalid,
    Valid {
        sprite: BufferHandle,
        block: BufferHandle,
    },
}

impl IndexBuffers {
    pub fn is_valid(&self) -> bool {
        matches!(self, IndexBuffers::Valid { .. })
    }

    pub fn sprite(&self) -> Option<BufferHandle> {
        match self {
            IndexBuffers::Valid { sprite, .. } => Some(*sprite),
            IndexBuffers::Invalid => None,
        }
    }

    pub fn block(&self) -> Option<BufferHandle> {
        match self {
            IndexBuffers::Valid { block, .. } => Some(*block),
            IndexBuffers::Invalid => None,
        }
    }
}

/// The atlas sprites are drawn from.
#[derive(Debug, Clone, Copy)]
pub enum SpriteAtlas<'a> {
    Blocks,
    Ui,
    Font,
    Other(&'a TextureAtlas),
}

impl<'a> From<&'a TextureAtlas> for SpriteAtlas<'a> {
    fn from(atlas: &'a TextureAtlas) -> Self {
        SpriteAtlas::Other(atlas)
    }
}

pub struct RenderState<G: GraphicsContext> {
    ctx: G,
    mode: Mode,
    config: RenderConfig,
    pub font: MonospaceFont,
    pub block_atlas: TextureAtlas,
    pub ui_atlas: TextureAtlas,
    pub line_program: LineProgram,
    pub face_program: FaceProgram,
    sprite_program: SpriteProgram,
    pub block_builder: BlockBuilder,
    index_buffers: IndexBuffers,
}

impl<G: GraphicsContext> RenderState<G> {
    /// Loads the font and atlases, creates the programs and restores the
    /// index buffers.
    ///
    /// Images that fail to load only produce a warning: the atlas stays
    /// without a handle and binding it unbinds the texture slot instead.
    /// Programs and the shared sprite program are required.
    pub fn new<A: AssetSource + ?Sized>(
        mut ctx: G,
        assets: &A,
        config: RenderConfig,
    ) -> anyhow::Result<Self> {
        let (glyph_width, glyph_height) = config.font_glyph_size;
        let mut font = MonospaceFont::new(config.font.as_str(), glyph_width, glyph_height);
        if let Err(e) = font.load(assets, &mut ctx) {
            log::warn!("Font unavailable: {e:#}");
        }

        let block_atlas = load_atlas(&config.block_atlas, &config, assets, &mut ctx);
        let ui_atlas = load_atlas(&config.ui_atlas, &config, assets, &mut ctx);

        let line_program = LineProgram::create(&mut ctx)?;
        let sprite_program = SpriteProgram::shared(&ctx)?;
        let block_builder = BlockBuilder::new(config.block_face_capacity)?;
        let face_program = FaceProgram::create(&mut ctx)?;

        let mut state = Self {
            ctx,
            mode: Mode::Unknown,
            config,
            font,
            block_atlas,
            ui_atlas,
            line_program,
            face_program,
            sprite_program,
            block_builder,
            index_buffers: IndexBuffers::Invalid,
        };
        state.restore()?;
        Ok(state)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn context(&self) -> &G {
        &self.ctx
    }

    /// Direct access for draw calls. Binding through it behind the render
    /// state's back is fine as long as the next frame starts with a
    /// [`reset`](Self::reset).
    pub fn context_mut(&mut self) -> &mut G {
        &mut self.ctx
    }

    pub fn index_buffers(&self) -> IndexBuffers {
        self.index_buffers
    }

    pub fn sprite_program(&self) -> &SpriteProgram {
        &self.sprite_program
    }

    /// Releases the index buffers after the device was lost. Safe to call
    /// any number of times.
    ///
    /// Whatever was bound died with the device, so the mode falls back to
    /// [`Mode::Unknown`].
    pub fn discard(&mut self) {
        let buffers = std::mem::take(&mut self.index_buffers);
        if let IndexBuffers::Valid { sprite, block } = buffers {
            log::debug!("discarding index buffers {sprite:?} and {block:?}");
            self.ctx.delete_buffer(sprite);
            self.ctx.delete_buffer(block);
        }
        self.mode = Mode::Unknown;
    }

    /// Recreates the index buffers once the device is valid again.
    ///
    /// Must only be called while the buffers are discarded; doing otherwise
    /// is a contract violation that panics in debug builds and is ignored in
    /// release builds.
    pub fn restore(&mut self) -> anyhow::Result<()> {
        debug_assert!(
            !self.index_buffers.is_valid(),
            "restore called while index buffers are allocated"
        );
        if self.index_buffers.is_valid() {
            log::error!("restore called while index buffers are allocated, ignoring");
            return Ok(());
        }

        let sprite = SpriteBuffer::create_index_buffer(&mut self.ctx, self.config.sprite_capacity)?;
        let block = match self.block_builder.create_index_buffer(&mut self.ctx) {
            Ok(block) => block,
            Err(e) => {
                self.ctx.delete_buffer(sprite);
                return Err(e);
            }
        };
        log::debug!("restored index buffers sprite={sprite:?} block={block:?}");
        self.index_buffers = IndexBuffers::Valid { sprite, block };
        Ok(())
    }

    /// Starts a frame: culling on, full-canvas viewport, depth cleared (and
    /// color too when `clear` is set), no mode.
    pub fn reset(&mut self, viewport: &Viewport, clear_color: [f32; 4], clear: bool) {
        let ctx = &mut self.ctx;
        ctx.set_rasterizer_state(&RASTERIZER_STATE);

        let (width, height) = ctx.canvas_size();
        if (viewport.width, viewport.height) != (width, height) {
            log::trace!(
                "viewport is {}x{}, rendering to the full {width}x{height} canvas",
                viewport.width,
                viewport.height
            );
        }
        ctx.set_viewport(ViewportRect {
            x: 0,
            y: 0,
            width,
            height,
        });
        ctx.set_clear_color(clear_color);
        ctx.set_clear_depth(1.0);
        ctx.clear(if clear {
            ClearMask::COLOR_DEPTH
        } else {
            ClearMask::DEPTH
        });

        self.mode = Mode::Unknown;
    }

    /// Uploads lighting and fog to the line and face programs.
    ///
    /// Leaves the face program in use and the mode untouched: a caller
    /// drawing in the current mode afterwards has to re-enter it after a
    /// [`reset`](Self::reset) or switch modes first.
    pub fn set_lighting(&mut self, lighting: &Lighting) {
        let ctx = &mut self.ctx;
        let fog_info = [lighting.fog_near, lighting.fog_far];

        let line = &self.line_program;
        ctx.use_program(Some(line.handle));
        upload2(ctx, line.u_fog_info, fog_info);
        upload3(ctx, line.u_fog_color, lighting.fog_color);

        let face = &self.face_program;
        ctx.use_program(Some(face.handle));
        upload3(ctx, face.u_ambient_light_color, lighting.ambient_light_color);
        upload3(ctx, face.u_sun_light_direction, lighting.sun_light_direction);
        upload3(ctx, face.u_sun_light_color, lighting.sun_light_color);
        upload2(ctx, face.u_fog_info, fog_info);
        upload3(ctx, face.u_fog_color, lighting.fog_color);
    }

    pub fn begin_chunk_pass1(&mut self) {
        self.begin_chunk_pass(Mode::ChunkPass1);
    }

    pub fn begin_chunk_pass2(&mut self) {
        self.begin_chunk_pass(Mode::ChunkPass2);
    }

    fn begin_chunk_pass(&mut self, mode: Mode) {
        if !self.enter(mode, true) {
            return;
        }
        let ctx = &mut self.ctx;
        let face = &self.face_program;
        ctx.use_program(Some(face.handle));
        if self.block_atlas.bind(ctx) {
            upload2(
                ctx,
                face.u_tex_size,
                [self.block_atlas.width as f32, self.block_atlas.height as f32],
            );
        }
        ctx.bind_index_buffer(self.index_buffers.block());
        self.apply_attribs(mode);
    }

    pub fn begin_lines(&mut self) {
        if !self.enter(Mode::Lines, true) {
            return;
        }
        self.ctx.use_program(Some(self.line_program.handle));
        self.apply_attribs(Mode::Lines);
    }

    /// Enters sprite mode with `atlas` bound.
    ///
    /// Unlike the other modes this always re-applies the full state, even if
    /// sprite mode is already active, since the atlas and depth flag may
    /// differ from the previous call.
    pub fn begin_sprites<'a>(&mut self, atlas: impl Into<SpriteAtlas<'a>>, depth_test: bool) {
        self.enter(Mode::Sprites, depth_test);

        let atlas = match atlas.into() {
            SpriteAtlas::Blocks => &self.block_atlas,
            SpriteAtlas::Ui => &self.ui_atlas,
            SpriteAtlas::Font => &self.font.atlas,
            SpriteAtlas::Other(atlas) => atlas,
        };
        let ctx = &mut self.ctx;
        ctx.use_program(Some(self.sprite_program.handle));
        if atlas.bind(ctx) {
            self.sprite_program.set_tex_size(ctx, atlas.width, atlas.height);
        }
        ctx.bind_index_buffer(self.index_buffers.sprite());
        self.apply_attribs(Mode::Sprites);
    }

    /// Draws `quads` quads from `vertices` through the bound quad index
    /// buffer. Only meaningful in the chunk and sprite modes.
    pub fn draw_quads(&mut self, vertices: BufferHandle, quads: u32) {
        debug_assert!(matches!(
            self.mode,
            Mode::ChunkPass1 | Mode::ChunkPass2 | Mode::Sprites
        ));
        let capacity = match self.mode {
            Mode::Sprites => self.config.sprite_capacity,
            _ => self.block_builder.face_capacity(),
        };
        let quads = quads.min(capacity);
        self.ctx.bind_vertex_buffer(Some(vertices));
        self.ctx.draw_elements(quads * INDICES_PER_QUAD, 0);
    }

    /// Deletes every GPU resource the render state owns and hands the
    /// context back. The shared sprite program stays with the context.
    pub fn dispose(mut self) -> G {
        self.discard();
        let Self {
            mut ctx,
            mut font,
            mut block_atlas,
            mut ui_atlas,
            line_program,
            face_program,
            ..
        } = self;
        font.unload(&mut ctx);
        block_atlas.unload(&mut ctx);
        ui_atlas.unload(&mut ctx);
        line_program.delete(&mut ctx);
        face_program.delete(&mut ctx);
        ctx
    }

    /// Switches the mode and applies its blend and depth state. Returns
    /// `false` when the transition is a no-op.
    fn enter(&mut self, mode: Mode, depth_test: bool) -> bool {
        if self.mode.transition(mode) == Transition::Skip {
            return false;
        }
        log::debug!("entering {mode:?} from {:?}", self.mode);
        self.mode = mode;
        if let Some(bundle) = mode.bundle(depth_test) {
            self.ctx.set_blend_state(&bundle.blend);
            self.ctx.set_depth_state(&bundle.depth);
        }
        true
    }

    fn apply_attribs(&mut self, mode: Mode) {
        for (slot, enabled) in mode.attribs().into_iter().enumerate() {
            if enabled {
                self.ctx.enable_vertex_attrib(slot as u32);
            } else {
                self.ctx.disable_vertex_attrib(slot as u32);
            }
        }
    }
}

fn load_atlas<A, G>(name: &str, config: &RenderConfig, assets: &A, ctx: &mut G) -> TextureAtlas
where
    A: AssetSource + ?Sized,
    G: GraphicsContext,
{
    let mut atlas = TextureAtlas::new(name, config.atlas_slot_size);
    atlas.set_filtering_mode(config.atlas_filtering.min, config.atlas_filtering.mag);
    if let Err(e) = atlas.load(assets, ctx) {
        log::warn!("Atlas {name} unavailable: {e:#}");
    }
    atlas
}
