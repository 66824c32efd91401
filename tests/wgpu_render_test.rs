#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn offscreen_state() -> blk_render::RenderState<blk_render::WgpuContext> {
    use crate::common::test_utils::{assets, small_config};

    blk_render::init_logger();
    let ctx = blk_render::WgpuContext::new_blocking(64, 64).expect("Failed to set up wgpu");
    blk_render::RenderState::new(ctx, &assets(), small_config())
        .expect("Failed to construct render state")
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use blk_render::Viewport;

    let mut state = offscreen_state();
    state.reset(&Viewport::new(64, 64), [1.0, 1.0, 1.0, 1.0], true);

    let image = state.context_mut().read_pixels().unwrap();
    assert_eq!(image.dimensions(), (64, 64));
    for pixel in image.pixels() {
        assert_eq!(pixel.0, [255, 255, 255, 255]);
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_draw_sprite_from_ui_atlas() {
    use blk_render::{
        SpriteAtlas, Viewport,
        cgmath::{Matrix4, SquareMatrix},
        context::GraphicsContext,
        data_structures::vertex::SpriteVertex,
    };

    let mut state = offscreen_state();
    state.reset(&Viewport::new(64, 64), [0.0, 0.0, 0.0, 1.0], true);
    state.begin_sprites(SpriteAtlas::Ui, false);

    let sprite = state.sprite_program().clone();
    sprite.set_view_proj(state.context_mut(), Matrix4::identity());

    let white = [1.0, 1.0, 1.0, 1.0];
    let quad = [
        SpriteVertex {
            position: [-0.5, -0.5, 0.0],
            tex_coords: [0.0, 32.0],
            color: white,
        },
        SpriteVertex {
            position: [0.5, -0.5, 0.0],
            tex_coords: [32.0, 32.0],
            color: white,
        },
        SpriteVertex {
            position: [0.5, 0.5, 0.0],
            tex_coords: [32.0, 0.0],
            color: white,
        },
        SpriteVertex {
            position: [-0.5, 0.5, 0.0],
            tex_coords: [0.0, 0.0],
            color: white,
        },
    ];
    let vertices = state
        .context_mut()
        .create_vertex_buffer("sprite quad", bytemuck::cast_slice(&quad))
        .unwrap();
    state.draw_quads(vertices, 1);
    assert_eq!(state.context().pending_draws(), 1);

    let image = state.context_mut().read_pixels().unwrap();
    // The UI atlas is solid red; the quad covers the middle half.
    assert_eq!(image.get_pixel(32, 32).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0, 255]);
    assert_eq!(state.context().pending_draws(), 0);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_survive_device_style_discard_and_restore() {
    use blk_render::{SpriteAtlas, Viewport};

    let mut state = offscreen_state();
    state.discard();
    state.restore().unwrap();
    state.reset(&Viewport::new(64, 64), [0.0, 0.0, 1.0, 1.0], true);
    state.begin_chunk_pass1();
    state.begin_lines();
    state.begin_sprites(SpriteAtlas::Font, true);

    let image = state.context_mut().read_pixels().unwrap();
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 255, 255]);
    let ctx = state.dispose();
    assert_eq!(ctx.pending_draws(), 0);
}

#[cfg(feature = "integration-tests")]
fn sprite_quad(
    x: [f32; 2],
    tex: [f32; 2],
) -> [blk_render::data_structures::vertex::SpriteVertex; 4] {
    use blk_render::data_structures::vertex::SpriteVertex;

    let white = [1.0, 1.0, 1.0, 1.0];
    let corner = |px: f32, py: f32, u: f32, v: f32| SpriteVertex {
        position: [px, py, 0.0],
        tex_coords: [u, v],
        color: white,
    };
    [
        corner(x[0], -1.0, tex[0], tex[1]),
        corner(x[1], -1.0, tex[1], tex[1]),
        corner(x[1], 1.0, tex[1], tex[0]),
        corner(x[0], 1.0, tex[0], tex[0]),
    ]
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_keep_texture_size_per_sprite_batch() {
    use blk_render::{
        SpriteAtlas, Viewport,
        cgmath::{Matrix4, SquareMatrix},
        context::GraphicsContext,
        resources::{MemoryAssets, TextureAtlas},
    };

    // 64x64: green top-left quadrant, blue elsewhere.
    let split = image::RgbaImage::from_fn(64, 64, |x, y| {
        if x < 32 && y < 32 {
            image::Rgba([0, 255, 0, 255])
        } else {
            image::Rgba([0, 0, 255, 255])
        }
    });
    let mut bytes = Vec::new();
    split
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    let split_assets = MemoryAssets::new().with("textures/split.png", bytes);

    let mut state = offscreen_state();
    let mut split = TextureAtlas::new("textures/split.png", 16);
    split.load(&split_assets, state.context_mut()).unwrap();

    state.reset(&Viewport::new(64, 64), [0.0, 0.0, 0.0, 1.0], true);
    state.begin_sprites(&split, false);
    let sprite = state.sprite_program().clone();
    sprite.set_view_proj(state.context_mut(), Matrix4::identity());

    // Texels 0..32 of the 64x64 atlas are its green quadrant.
    let left = state
        .context_mut()
        .create_vertex_buffer("left quad", bytemuck::cast_slice(&sprite_quad([-1.0, 0.0], [0.0, 32.0])))
        .unwrap();
    state.draw_quads(left, 1);

    // Switching to the 32x32 UI atlas uploads a new texture size.
    state.begin_sprites(SpriteAtlas::Ui, false);
    let right = state
        .context_mut()
        .create_vertex_buffer("right quad", bytemuck::cast_slice(&sprite_quad([0.0, 1.0], [0.0, 32.0])))
        .unwrap();
    state.draw_quads(right, 1);

    let image = state.context_mut().read_pixels().unwrap();
    assert_eq!(image.get_pixel(28, 60).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(4, 4).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(48, 32).0, [255, 0, 0, 255]);
}
