//! A headless [`GraphicsContext`] that records the call stream.

use std::collections::{BTreeSet, HashMap};

use anyhow::bail;

use crate::{
    context::{
        BoundState, BufferHandle, ClearMask, GraphicsContext, ProgramHandle, ProgramSource,
        SharedProgram, TextureHandle, UniformLocation, ViewportRect,
    },
    state::{BlendState, DepthState, Filtering, RasterizerState},
};

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    SetBlendState(BlendState),
    SetDepthState(DepthState),
    SetRasterizerState(RasterizerState),
    SetViewport(ViewportRect),
    SetClearColor([f32; 4]),
    SetClearDepth(f32),
    Clear(ClearMask),
    UseProgram(Option<ProgramHandle>),
    BindTexture(Option<TextureHandle>),
    BindIndexBuffer(Option<BufferHandle>),
    BindVertexBuffer(Option<BufferHandle>),
    EnableVertexAttrib(u32),
    DisableVertexAttrib(u32),
    Uniform2f(UniformLocation, [f32; 2]),
    Uniform3f(UniformLocation, [f32; 3]),
    UniformMatrix4(UniformLocation, [[f32; 4]; 4]),
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    CreateProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    DrawElements { count: u32, first: u32 },
}

impl GpuCall {
    /// Whether the call changes what a subsequent draw would observe.
    ///
    /// Resource creation and deletion are not state changes; binds, uniform
    /// uploads, clears and fixed-function state are.
    pub fn is_state_change(&self) -> bool {
        !matches!(
            self,
            GpuCall::CreateBuffer(_)
                | GpuCall::DeleteBuffer(_)
                | GpuCall::CreateTexture(_)
                | GpuCall::DeleteTexture(_)
                | GpuCall::CreateProgram(_)
                | GpuCall::DeleteProgram(_)
                | GpuCall::DrawElements { .. }
        )
    }
}

/// A buffer the recorder issued, with enough content to check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedBuffer {
    Index(Vec<u16>),
    Vertex(Vec<u8>),
}

#[derive(Debug, Clone)]
struct RecordedProgram {
    label: &'static str,
    uniforms: HashMap<&'static str, u32>,
}

/// Records calls instead of executing them.
///
/// Handles are allocated from one monotonically increasing counter per
/// resource kind, so a released handle is never handed out again.
#[derive(Debug)]
pub struct RecordingContext {
    canvas: (u32, u32),
    calls: Vec<GpuCall>,
    bound: BoundState,
    next_buffer: u32,
    next_texture: u32,
    next_program: u32,
    buffers: HashMap<BufferHandle, RecordedBuffer>,
    textures: HashMap<TextureHandle, (u32, u32, Filtering)>,
    programs: HashMap<ProgramHandle, RecordedProgram>,
    shared: HashMap<SharedProgram, ProgramHandle>,
    fail_programs: BTreeSet<&'static str>,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: (width, height),
            calls: Vec::new(),
            bound: BoundState::default(),
            next_buffer: 1,
            next_texture: 1,
            next_program: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            shared: HashMap::new(),
            fail_programs: BTreeSet::new(),
        }
    }

    /// Builds `source` and publishes it as the shared program `kind`.
    pub fn with_shared_program(mut self, kind: SharedProgram, source: &ProgramSource) -> Self {
        let handle = self.alloc_program(source);
        self.shared.insert(kind, handle);
        self
    }

    /// Makes [`create_program`](GraphicsContext::create_program) fail for the
    /// program with the given label, mimicking a link error.
    pub fn failing_program(mut self, label: &'static str) -> Self {
        self.fail_programs.insert(label);
        self
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas = (width, height);
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Drains the recorded calls, leaving bound state untouched.
    pub fn take_calls(&mut self) -> Vec<GpuCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&RecordedBuffer> {
        self.buffers.get(&handle)
    }

    pub fn live_buffers(&self) -> BTreeSet<BufferHandle> {
        self.buffers.keys().copied().collect()
    }

    pub fn live_textures(&self) -> BTreeSet<TextureHandle> {
        self.textures.keys().copied().collect()
    }

    /// Width, height and filtering a texture was created with.
    pub fn texture_info(&self, handle: TextureHandle) -> Option<(u32, u32, Filtering)> {
        self.textures.get(&handle).copied()
    }

    pub fn live_programs(&self) -> BTreeSet<ProgramHandle> {
        self.programs.keys().copied().collect()
    }

    pub fn program_label(&self, handle: ProgramHandle) -> Option<&'static str> {
        self.programs.get(&handle).map(|program| program.label)
    }

    fn record(&mut self, call: GpuCall) {
        log::trace!("{call:?}");
        self.calls.push(call);
    }

    fn alloc_program(&mut self, source: &ProgramSource) -> ProgramHandle {
        let handle = ProgramHandle(self.next_program);
        self.next_program += 1;
        self.programs.insert(
            handle,
            RecordedProgram {
                label: source.label,
                uniforms: source.uniform_offsets().collect(),
            },
        );
        handle
    }

    fn alloc_buffer(&mut self, contents: RecordedBuffer) -> BufferHandle {
        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(handle, contents);
        self.record(GpuCall::CreateBuffer(handle));
        handle
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl GraphicsContext for RecordingContext {
    fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        self.bound.blend = *state;
        self.record(GpuCall::SetBlendState(*state));
    }

    fn set_depth_state(&mut self, state: &DepthState) {
        self.bound.depth = *state;
        self.record(GpuCall::SetDepthState(*state));
    }

    fn set_rasterizer_state(&mut self, state: &RasterizerState) {
        self.bound.rasterizer = *state;
        self.record(GpuCall::SetRasterizerState(*state));
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.bound.viewport = Some(rect);
        self.record(GpuCall::SetViewport(rect));
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.bound.clear_color = rgba;
        self.record(GpuCall::SetClearColor(rgba));
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.bound.clear_depth = depth;
        self.record(GpuCall::SetClearDepth(depth));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(GpuCall::Clear(mask));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.bound.program = program;
        self.record(GpuCall::UseProgram(program));
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.bound.texture = texture;
        self.record(GpuCall::BindTexture(texture));
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.bound.index_buffer = buffer;
        self.record(GpuCall::BindIndexBuffer(buffer));
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.bound.vertex_buffer = buffer;
        self.record(GpuCall::BindVertexBuffer(buffer));
    }

    fn enable_vertex_attrib(&mut self, slot: u32) {
        self.bound.set_attrib(slot, true);
        self.record(GpuCall::EnableVertexAttrib(slot));
    }

    fn disable_vertex_attrib(&mut self, slot: u32) {
        self.bound.set_attrib(slot, false);
        self.record(GpuCall::DisableVertexAttrib(slot));
    }

    fn uniform2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.record(GpuCall::Uniform2f(location, [x, y]));
    }

    fn uniform3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32) {
        self.record(GpuCall::Uniform3f(location, [x, y, z]));
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: [[f32; 4]; 4]) {
        self.record(GpuCall::UniformMatrix4(location, matrix));
    }

    fn create_index_buffer(&mut self, _label: &str, indices: &[u16]) -> anyhow::Result<BufferHandle> {
        Ok(self.alloc_buffer(RecordedBuffer::Index(indices.to_vec())))
    }

    fn create_vertex_buffer(&mut self, _label: &str, contents: &[u8]) -> anyhow::Result<BufferHandle> {
        Ok(self.alloc_buffer(RecordedBuffer::Vertex(contents.to_vec())))
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            if self.bound.index_buffer == Some(buffer) {
                self.bound.index_buffer = None;
            }
            if self.bound.vertex_buffer == Some(buffer) {
                self.bound.vertex_buffer = None;
            }
            self.record(GpuCall::DeleteBuffer(buffer));
        }
    }

    fn create_texture(
        &mut self,
        _label: &str,
        image: &image::RgbaImage,
        filtering: Filtering,
    ) -> anyhow::Result<TextureHandle> {
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        self.textures
            .insert(handle, (image.width(), image.height(), filtering));
        self.record(GpuCall::CreateTexture(handle));
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            if self.bound.texture == Some(texture) {
                self.bound.texture = None;
            }
            self.record(GpuCall::DeleteTexture(texture));
        }
    }

    fn create_program(&mut self, source: &ProgramSource) -> anyhow::Result<ProgramHandle> {
        if self.fail_programs.contains(source.label) {
            bail!("failed to link program {}", source.label);
        }
        let handle = self.alloc_program(source);
        self.record(GpuCall::CreateProgram(handle));
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_some() {
            if self.bound.program == Some(program) {
                self.bound.program = None;
            }
            self.record(GpuCall::DeleteProgram(program));
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let offset = *self.programs.get(&program)?.uniforms.get(name)?;
        Some(UniformLocation { program, offset })
    }

    fn shared_program(&self, kind: SharedProgram) -> Option<ProgramHandle> {
        self.shared.get(&kind).copied()
    }

    fn draw_elements(&mut self, count: u32, first: u32) {
        self.record(GpuCall::DrawElements { count, first });
    }
}
