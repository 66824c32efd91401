use std::collections::BTreeSet;

use blk_render::{
    Lighting, Mode, SpriteAtlas, Viewport,
    cgmath::Vector3,
    context::{ClearMask, GraphicsContext, ViewportRect, recording::GpuCall},
    render_state::RASTERIZER_STATE,
    resources::{MemoryAssets, TextureAtlas},
    state::{BlendState, DepthState},
};

use crate::common::test_utils::{
    UI_ATLAS, png, position_of, render_state, render_state_with, state_changes,
};

mod common;

#[test]
fn reset_then_chunk_pass1_scenario() {
    let mut state = render_state();
    state.reset(&Viewport::new(800, 600), [0.0, 0.0, 0.0, 1.0], true);
    state.begin_chunk_pass1();

    assert_eq!(state.mode(), Mode::ChunkPass1);
    let ctx = state.context();
    assert!(ctx.calls().contains(&GpuCall::Clear(ClearMask::COLOR_DEPTH)));
    assert!(ctx.bound().rasterizer.cull_face_enabled);
    assert!(state.block_atlas.is_loaded());
    assert_eq!(ctx.bound().texture, state.block_atlas.handle);
    assert_eq!(ctx.bound().program, Some(state.face_program.handle));
    assert_eq!(ctx.bound().index_buffer, state.index_buffers().block());
    assert_eq!(ctx.bound().enabled_attribs(), vec![0, 1, 2]);
}

#[test]
fn reset_issues_frame_start_calls_in_order() {
    let mut state = render_state();
    state.reset(&Viewport::new(800, 600), [0.1, 0.2, 0.3, 1.0], true);

    assert_eq!(
        state.context().calls(),
        &[
            GpuCall::SetRasterizerState(RASTERIZER_STATE),
            GpuCall::SetViewport(ViewportRect {
                x: 0,
                y: 0,
                width: 800,
                height: 600,
            }),
            GpuCall::SetClearColor([0.1, 0.2, 0.3, 1.0]),
            GpuCall::SetClearDepth(1.0),
            GpuCall::Clear(ClearMask::COLOR_DEPTH),
        ]
    );
    assert_eq!(state.mode(), Mode::Unknown);
}

#[test]
fn reset_without_color_clear_only_clears_depth() {
    let mut state = render_state();
    state.reset(&Viewport::new(800, 600), [0.0; 4], false);

    let calls = state.context().calls();
    assert!(calls.contains(&GpuCall::Clear(ClearMask::DEPTH)));
    assert!(!calls.contains(&GpuCall::Clear(ClearMask::COLOR_DEPTH)));
}

#[test]
fn reset_covers_the_whole_canvas() {
    let mut state = render_state();
    state.context_mut().resize(1024, 768);
    state.reset(&Viewport::new(10, 10), [0.0; 4], true);

    assert_eq!(
        state.context().bound().viewport,
        Some(ViewportRect {
            x: 0,
            y: 0,
            width: 1024,
            height: 768,
        })
    );
}

#[test]
fn reset_forces_the_next_pass_to_reapply_state() {
    let mut state = render_state();
    state.begin_chunk_pass1();
    state.reset(&Viewport::new(800, 600), [0.0; 4], true);
    assert_eq!(state.mode(), Mode::Unknown);

    state.context_mut().take_calls();
    state.begin_chunk_pass1();
    assert!(state_changes(state.context().calls()) > 0);
}

#[test]
fn chunk_passes_and_lines_skip_reentry() {
    type Begin = fn(&mut blk_render::RenderState<blk_render::RecordingContext>);
    let passes: [(Mode, Begin); 3] = [
        (Mode::ChunkPass1, |state| state.begin_chunk_pass1()),
        (Mode::ChunkPass2, |state| state.begin_chunk_pass2()),
        (Mode::Lines, |state| state.begin_lines()),
    ];
    for (mode, begin) in passes {
        let mut state = render_state();
        begin(&mut state);
        assert_eq!(state.mode(), mode);
        assert!(state_changes(&state.context_mut().take_calls()) > 0);

        begin(&mut state);
        assert!(
            state.context().calls().is_empty(),
            "{mode:?} re-entry touched the context: {:?}",
            state.context().calls()
        );
    }
}

#[test]
fn switching_between_chunk_passes_reapplies_state() {
    let mut state = render_state();
    state.begin_chunk_pass1();
    state.context_mut().take_calls();

    state.begin_chunk_pass2();
    assert_eq!(state.mode(), Mode::ChunkPass2);
    let calls = state.context().calls();
    assert!(calls.contains(&GpuCall::UseProgram(Some(state.face_program.handle))));
    assert!(calls.contains(&GpuCall::BindIndexBuffer(state.index_buffers().block())));
}

#[test]
fn sprites_reapply_everything_when_already_active() {
    let mut state = render_state();
    state.begin_sprites(SpriteAtlas::Ui, true);
    let first = state.context_mut().take_calls();

    state.begin_sprites(SpriteAtlas::Ui, true);
    let second = state.context_mut().take_calls();

    assert_eq!(state.mode(), Mode::Sprites);
    assert!(!second.is_empty());
    assert_eq!(first, second);
}

#[test]
fn sprites_follow_the_depth_flag_of_each_call() {
    let mut state = render_state();
    state.begin_sprites(SpriteAtlas::Ui, false);
    assert!(!state.context().bound().depth.depth_test_enabled);

    state.begin_sprites(SpriteAtlas::Ui, true);
    assert!(state.context().bound().depth.depth_test_enabled);
    assert_eq!(state.context().bound().depth, DepthState::LESS_EQUAL);
}

#[test]
fn chunk_pass_entry_applies_state_in_order() {
    let mut state = render_state();
    state.begin_chunk_pass1();
    let calls = state.context().calls();

    let blend = position_of(calls, |call| matches!(call, GpuCall::SetBlendState(_)));
    let depth = position_of(calls, |call| matches!(call, GpuCall::SetDepthState(_)));
    let program = position_of(calls, |call| matches!(call, GpuCall::UseProgram(_)));
    let texture = position_of(calls, |call| matches!(call, GpuCall::BindTexture(_)));
    let index = position_of(calls, |call| matches!(call, GpuCall::BindIndexBuffer(_)));
    let attrib = position_of(calls, |call| {
        matches!(
            call,
            GpuCall::EnableVertexAttrib(_) | GpuCall::DisableVertexAttrib(_)
        )
    });
    assert!(blend < depth);
    assert!(depth < program);
    assert!(program < texture);
    assert!(texture < index);
    assert!(index < attrib);
}

#[test]
fn sprite_entry_applies_state_in_order() {
    let mut state = render_state();
    state.begin_sprites(SpriteAtlas::Font, true);
    let calls = state.context().calls();

    let depth = position_of(calls, |call| matches!(call, GpuCall::SetDepthState(_)));
    let program = position_of(calls, |call| matches!(call, GpuCall::UseProgram(_)));
    let texture = position_of(calls, |call| matches!(call, GpuCall::BindTexture(_)));
    let index = position_of(calls, |call| matches!(call, GpuCall::BindIndexBuffer(_)));
    let attrib = position_of(calls, |call| matches!(call, GpuCall::EnableVertexAttrib(_)));
    assert!(depth < program);
    assert!(program < texture);
    assert!(texture < index);
    assert!(index < attrib);
}

#[test]
fn every_mode_uses_opaque_blending() {
    let mut state = render_state();
    state.begin_chunk_pass1();
    state.begin_chunk_pass2();
    state.begin_lines();
    state.begin_sprites(SpriteAtlas::Blocks, false);

    let blends: Vec<_> = state
        .context()
        .calls()
        .iter()
        .filter_map(|call| match call {
            GpuCall::SetBlendState(blend) => Some(*blend),
            _ => None,
        })
        .collect();
    assert_eq!(blends, vec![BlendState::DEFAULT; 4]);
}

#[test]
fn lines_disable_the_third_attribute_slot() {
    let mut state = render_state();
    state.begin_chunk_pass1();
    state.context_mut().take_calls();

    state.begin_lines();
    let calls = state.context().calls();
    assert!(calls.contains(&GpuCall::UseProgram(Some(state.line_program.handle))));
    assert!(calls.contains(&GpuCall::EnableVertexAttrib(0)));
    assert!(calls.contains(&GpuCall::EnableVertexAttrib(1)));
    assert!(calls.contains(&GpuCall::DisableVertexAttrib(2)));
    assert_eq!(state.context().bound().enabled_attribs(), vec![0, 1]);
}

#[test]
fn chunk_pass_uploads_block_atlas_size() {
    let mut state = render_state();
    state.begin_chunk_pass1();

    let location = state.face_program.u_tex_size.unwrap();
    assert!(
        state
            .context()
            .calls()
            .contains(&GpuCall::Uniform2f(location, [64.0, 32.0]))
    );
}

#[test]
fn missing_block_atlas_unbinds_the_texture() {
    let assets = MemoryAssets::new().with(UI_ATLAS, png(32, 32, [255, 0, 0, 255]));
    let mut state = render_state_with(&assets);
    assert!(!state.block_atlas.is_loaded());
    state.context_mut().take_calls();

    state.begin_chunk_pass1();
    let calls = state.context().calls();
    assert!(calls.contains(&GpuCall::BindTexture(None)));
    assert!(!calls.iter().any(|call| matches!(call, GpuCall::Uniform2f(..))));
    assert_eq!(state.mode(), Mode::ChunkPass1);
}

#[test]
fn sprites_bind_the_requested_atlas_and_upload_its_size() {
    let mut state = render_state();
    let sprite_tex_size = state.sprite_program().u_tex_size.unwrap();

    state.begin_sprites(SpriteAtlas::Font, true);
    assert_eq!(state.context().bound().texture, state.font.atlas.handle);
    assert_eq!(
        state.context().bound().program,
        Some(state.sprite_program().handle)
    );
    assert_eq!(
        state.context().bound().index_buffer,
        state.index_buffers().sprite()
    );
    assert!(
        state
            .context()
            .calls()
            .contains(&GpuCall::Uniform2f(sprite_tex_size, [128.0, 48.0]))
    );

    state.context_mut().take_calls();
    state.begin_sprites(SpriteAtlas::Ui, true);
    assert_eq!(state.context().bound().texture, state.ui_atlas.handle);
    assert!(
        state
            .context()
            .calls()
            .contains(&GpuCall::Uniform2f(sprite_tex_size, [32.0, 32.0]))
    );
}

#[test]
fn sprites_from_an_unloaded_atlas_unbind_the_texture() {
    let mut state = render_state();
    state.begin_chunk_pass1();
    assert!(state.context().bound().texture.is_some());

    let unloaded = TextureAtlas::new("textures/particles.png", 8);
    state.begin_sprites(&unloaded, false);

    assert_eq!(state.context().bound().texture, None);
    assert_eq!(state.mode(), Mode::Sprites);
}

#[test]
fn set_lighting_uploads_to_line_and_face_programs() {
    let mut state = render_state();
    state.begin_lines();
    state.context_mut().take_calls();

    let lighting = Lighting {
        ambient_light_color: Vector3::new(0.1, 0.2, 0.3),
        sun_light_direction: Vector3::new(0.0, -1.0, 0.0),
        sun_light_color: Vector3::new(1.0, 0.9, 0.8),
        fog_near: 16.0,
        fog_far: 96.0,
        fog_color: Vector3::new(0.5, 0.6, 0.7),
    };
    state.set_lighting(&lighting);

    let line = &state.line_program;
    let face = &state.face_program;
    assert_eq!(
        state.context().calls(),
        &[
            GpuCall::UseProgram(Some(line.handle)),
            GpuCall::Uniform2f(line.u_fog_info.unwrap(), [16.0, 96.0]),
            GpuCall::Uniform3f(line.u_fog_color.unwrap(), [0.5, 0.6, 0.7]),
            GpuCall::UseProgram(Some(face.handle)),
            GpuCall::Uniform3f(face.u_ambient_light_color.unwrap(), [0.1, 0.2, 0.3]),
            GpuCall::Uniform3f(face.u_sun_light_direction.unwrap(), [0.0, -1.0, 0.0]),
            GpuCall::Uniform3f(face.u_sun_light_color.unwrap(), [1.0, 0.9, 0.8]),
            GpuCall::Uniform2f(face.u_fog_info.unwrap(), [16.0, 96.0]),
            GpuCall::Uniform3f(face.u_fog_color.unwrap(), [0.5, 0.6, 0.7]),
        ]
    );

    let programs: BTreeSet<_> = state
        .context()
        .calls()
        .iter()
        .filter_map(|call| match call {
            GpuCall::Uniform2f(location, _) | GpuCall::Uniform3f(location, _) => {
                Some(location.program)
            }
            _ => None,
        })
        .collect();
    assert_eq!(programs, BTreeSet::from([line.handle, face.handle]));
}

#[test]
fn set_lighting_leaves_the_face_program_bound_and_the_mode_alone() {
    let mut state = render_state();
    state.begin_lines();
    state.set_lighting(&Lighting::default());

    assert_eq!(state.mode(), Mode::Lines);
    assert_eq!(
        state.context().bound().program,
        Some(state.face_program.handle)
    );
}

#[test]
fn draw_quads_is_clamped_to_the_index_buffer() {
    let mut state = render_state();
    let vertices = state
        .context_mut()
        .create_vertex_buffer("quads", &[0; 64])
        .unwrap();
    state.begin_sprites(SpriteAtlas::Ui, false);
    state.context_mut().take_calls();

    // The sprite index buffer holds 4 quads.
    state.draw_quads(vertices, 10);
    assert_eq!(
        state.context().calls(),
        &[
            GpuCall::BindVertexBuffer(Some(vertices)),
            GpuCall::DrawElements {
                count: 24,
                first: 0,
            },
        ]
    );

    state.begin_chunk_pass1();
    state.context_mut().take_calls();
    state.draw_quads(vertices, 3);
    assert!(state.context().calls().contains(&GpuCall::DrawElements {
        count: 18,
        first: 0,
    }));
}

#[test]
fn full_frame_switches_through_every_mode() {
    let mut state = render_state();
    let viewport = Viewport::new(800, 600);

    for _ in 0..2 {
        state.reset(&viewport, [0.0, 0.0, 0.0, 1.0], true);
        state.set_lighting(&Lighting::default());
        state.begin_chunk_pass1();
        assert_eq!(state.mode(), Mode::ChunkPass1);
        state.begin_chunk_pass2();
        assert_eq!(state.mode(), Mode::ChunkPass2);
        state.begin_lines();
        assert_eq!(state.mode(), Mode::Lines);
        state.begin_sprites(SpriteAtlas::Blocks, true);
        state.begin_sprites(SpriteAtlas::Ui, false);
        assert_eq!(state.mode(), Mode::Sprites);
    }
    assert_eq!(state.context().bound().texture, state.ui_atlas.handle);
}
