use blk_render::{
    RecordingContext, RenderConfig, RenderState,
    context::{SharedProgram, recording::GpuCall},
    programs::SpriteProgram,
    resources::MemoryAssets,
};

pub(crate) const BLOCK_ATLAS: &str = "textures/blocks.png";
pub(crate) const UI_ATLAS: &str = "textures/ui.png";
pub(crate) const FONT: &str = "fonts/monospace.png";

/// Encodes a single-colored PNG.
pub(crate) fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}

/// Block atlas 64x32, UI atlas 32x32 and a 16x6 glyph font of 8x8 cells.
pub(crate) fn assets() -> MemoryAssets {
    MemoryAssets::new()
        .with(BLOCK_ATLAS, png(64, 32, [200, 120, 40, 255]))
        .with(UI_ATLAS, png(32, 32, [255, 0, 0, 255]))
        .with(FONT, png(128, 48, [255, 255, 255, 255]))
}

/// A recording context that publishes the shared sprite program, like any
/// real context does.
pub(crate) fn recording_context() -> RecordingContext {
    RecordingContext::default().with_shared_program(SharedProgram::Sprite, &SpriteProgram::source())
}

/// Small buffers so that index contents are quick to check.
pub(crate) fn small_config() -> RenderConfig {
    RenderConfig::default()
        .with_sprite_capacity(4)
        .with_block_face_capacity(8)
}

pub(crate) fn render_state_with(assets: &MemoryAssets) -> RenderState<RecordingContext> {
    RenderState::new(recording_context(), assets, small_config())
        .expect("Failed to construct render state")
}

/// A render state whose construction calls are already drained.
pub(crate) fn render_state() -> RenderState<RecordingContext> {
    let mut state = render_state_with(&assets());
    state.context_mut().take_calls();
    state
}

pub(crate) fn state_changes(calls: &[GpuCall]) -> usize {
    calls.iter().filter(|call| call.is_state_change()).count()
}

/// Position of the first call matching `predicate`.
pub(crate) fn position_of(calls: &[GpuCall], predicate: impl Fn(&GpuCall) -> bool) -> usize {
    calls
        .iter()
        .position(predicate)
        .unwrap_or_else(|| panic!("No matching call in {calls:#?}"))
}
