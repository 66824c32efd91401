//! A [`GraphicsContext`] on top of wgpu.
//!
//! wgpu has no global bind points, so this context keeps them itself in a
//! [`BoundState`]. A draw snapshots what it needs (pipeline key, program,
//! texture, buffers, viewport) and is queued; [`WgpuContext::submit`] replays
//! the queue into one render pass against an offscreen color target.
//!
//! Uniform uploads go straight to each program's uniform buffer through the
//! queue. Queued draws of the same program are submitted before the write,
//! so every draw sees the uniforms that were set when it was issued.

use std::collections::HashMap;

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::{
    context::{
        BoundState, BufferHandle, ClearMask, GraphicsContext, ProgramHandle, ProgramSource,
        SharedProgram, TextureHandle, UniformLocation, ViewportRect,
    },
    data_structures::texture::Texture,
    programs::{
        SpriteProgram,
        pipeline::{FixedState, mk_pipeline_layout, mk_render_pipeline, texture_layout, uniform_layout},
    },
    state::{BlendState, DepthState, Filtering, RasterizerState},
};

struct ProgramEntry {
    source: ProgramSource,
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    offsets: HashMap<&'static str, u32>,
}

struct TextureEntry {
    #[allow(unused)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramHandle,
    fixed: FixedState,
}

#[derive(Debug, Clone, Copy)]
struct DrawCommand {
    key: PipelineKey,
    viewport: Option<ViewportRect>,
    texture: Option<TextureHandle>,
    index_buffer: BufferHandle,
    vertex_buffer: BufferHandle,
    count: u32,
    first: u32,
}

pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    size: (u32, u32),
    color_target: Texture,
    depth_texture: Texture,
    bound: BoundState,
    next_handle: u32,
    buffers: HashMap<BufferHandle, wgpu::Buffer>,
    textures: HashMap<TextureHandle, TextureEntry>,
    programs: HashMap<ProgramHandle, ProgramEntry>,
    shared: HashMap<SharedProgram, ProgramHandle>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    fallback_texture: TextureEntry,
    pending_clear: ClearMask,
    draws: Vec<DrawCommand>,
}

impl WgpuContext {
    /// Requests an adapter and device and sets up a `width` x `height`
    /// offscreen target. The shared sprite program is created here.
    pub async fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request graphics device")?;

        Self::from_device(device, queue, width, height)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_blocking(width: u32, height: u32) -> anyhow::Result<Self> {
        futures::executor::block_on(Self::new(width, height))
    }

    /// Wraps an existing device, e.g. one shared with a windowing layer.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let (width, height) = (width.max(1), height.max(1));
        let color_target = Texture::create_color_target(&device, [width, height], "color target");
        let depth_texture = Texture::create_depth_texture(&device, [width, height], "depth_texture");
        let uniform_layout = uniform_layout(&device);
        let texture_layout = texture_layout(&device);

        let white = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let fallback = Texture::from_rgba(&device, &queue, &white, Some("fallback texture"), Filtering::NEAREST);
        let fallback_texture = mk_texture_entry(&device, &texture_layout, fallback)?;

        let mut ctx = Self {
            device,
            queue,
            size: (width, height),
            color_target,
            depth_texture,
            bound: BoundState::default(),
            next_handle: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            shared: HashMap::new(),
            pipelines: HashMap::new(),
            uniform_layout,
            texture_layout,
            fallback_texture,
            pending_clear: ClearMask::default(),
            draws: Vec::new(),
        };
        let sprite = ctx.create_program(&SpriteProgram::source())?;
        ctx.shared.insert(SharedProgram::Sprite, sprite);
        Ok(ctx)
    }

    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    /// The texture frames are rendered into.
    pub fn color_target(&self) -> &Texture {
        &self.color_target
    }

    /// Number of draws waiting for [`submit`](Self::submit).
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    /// Recreates the color and depth targets. Queued draws are submitted
    /// against the old targets first.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.draws.is_empty() {
            self.submit();
        }
        let (width, height) = (width.max(1), height.max(1));
        self.size = (width, height);
        self.color_target = Texture::create_color_target(&self.device, [width, height], "color target");
        self.depth_texture = Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    /// Encodes pending clears and draws into one render pass and submits it.
    pub fn submit(&mut self) -> wgpu::SubmissionIndex {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let [r, g, b, a] = self.bound.clear_color;
            let color_load = if self.pending_clear.color {
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                })
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if self.pending_clear.depth {
                wgpu::LoadOp::Clear(self.bound.clear_depth)
            } else {
                wgpu::LoadOp::Load
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            for draw in &self.draws {
                let (Some(pipeline), Some(program)) = (
                    self.pipelines.get(&draw.key),
                    self.programs.get(&draw.key.program),
                ) else {
                    continue;
                };
                let (Some(index), Some(vertex)) = (
                    self.buffers.get(&draw.index_buffer),
                    self.buffers.get(&draw.vertex_buffer),
                ) else {
                    log::warn!("skipping draw whose buffers were deleted before submit");
                    continue;
                };

                if let Some(viewport) = draw.viewport {
                    render_pass.set_viewport(
                        viewport.x as f32,
                        viewport.y as f32,
                        viewport.width as f32,
                        viewport.height as f32,
                        0.0,
                        1.0,
                    );
                }
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &program.uniform_bind_group, &[]);
                if program.source.textured {
                    let texture = draw
                        .texture
                        .and_then(|handle| self.textures.get(&handle))
                        .unwrap_or(&self.fallback_texture);
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                render_pass.set_vertex_buffer(0, vertex.slice(..));
                render_pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(draw.first..draw.first + draw.count, 0, 0..1);
            }
        }

        log::trace!("submitting {} draws", self.draws.len());
        self.draws.clear();
        self.pending_clear = ClearMask::default();
        self.queue.submit(std::iter::once(encoder.finish()))
    }

    /// Submits pending work and copies the color target back to the CPU.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read_pixels(&mut self) -> anyhow::Result<image::RgbaImage> {
        self.submit();
        let (width, height) = self.size;
        let u32_size = std::mem::size_of::<u32>() as u32;
        let unpadded_row = u32_size * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (padded_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("readback buffer"),
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.color_target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = futures::channel::oneshot::channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(std::time::Duration::from_secs(3)),
            })
            .context("Device poll failed during readback")?;
        futures::executor::block_on(rx)
            .context("Readback callback was dropped")?
            .context("Failed to map readback buffer")?;

        let data = buffer_slice.get_mapped_range();
        let pixels: Vec<u8> = data
            .chunks(padded_row as usize)
            .flat_map(|row| &row[..unpadded_row as usize])
            .copied()
            .collect();
        drop(data);
        output_buffer.unmap();
        image::RgbaImage::from_raw(width, height, pixels).context("Readback size mismatch")
    }

    fn alloc_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn write_uniform(&mut self, location: UniformLocation, bytes: &[u8]) {
        if self.bound.program != Some(location.program) {
            log::warn!(
                "uniform written to {:?} while {:?} is in use",
                location.program,
                self.bound.program
            );
        }
        if self
            .draws
            .iter()
            .any(|draw| draw.key.program == location.program)
        {
            self.submit();
        }
        match self.programs.get(&location.program) {
            Some(program) => {
                self.queue
                    .write_buffer(&program.uniform_buffer, location.offset as u64, bytes)
            }
            None => log::error!("uniform written to deleted program {:?}", location.program),
        }
    }

    /// Builds the pipeline for the bound program and fixed state if needed.
    /// Returns `None` when the bound state cannot draw.
    fn prepare_pipeline(&mut self) -> Option<PipelineKey> {
        let program_handle = self.bound.program?;
        let Some(program) = self.programs.get(&program_handle) else {
            log::error!("draw with deleted program {program_handle:?}");
            return None;
        };

        let missing: Vec<u32> = program
            .source
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| attribute.shader_location)
            .filter(|location| !self.bound.attribs.get(*location as usize).copied().unwrap_or(false))
            .collect();
        if !missing.is_empty() {
            log::error!(
                "{} needs vertex attributes {missing:?} which are disabled",
                program.source.label
            );
            return None;
        }

        let key = PipelineKey {
            program: program_handle,
            fixed: FixedState {
                blend: self.bound.blend,
                depth: self.bound.depth,
                rasterizer: self.bound.rasterizer,
                topology: program.source.topology,
            },
        };
        if !self.pipelines.contains_key(&key) {
            log::debug!("building pipeline for {} with {:?}", program.source.label, key.fixed);
            let pipeline = mk_render_pipeline(
                &self.device,
                &program.layout,
                Texture::COLOR_FORMAT,
                Some(Texture::DEPTH_FORMAT),
                &key.fixed,
                &[program.source.vertex_layout.clone()],
                &program.module,
            );
            self.pipelines.insert(key, pipeline);
        }
        Some(key)
    }
}

fn mk_texture_entry(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: Texture,
) -> anyhow::Result<TextureEntry> {
    let sampler = texture
        .sampler
        .as_ref()
        .context("Sampled textures need a sampler")?;
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("texture_bind_group"),
    });
    Ok(TextureEntry {
        texture,
        bind_group,
    })
}

impl GraphicsContext for WgpuContext {
    fn canvas_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        self.bound.blend = *state;
    }

    fn set_depth_state(&mut self, state: &DepthState) {
        self.bound.depth = *state;
    }

    fn set_rasterizer_state(&mut self, state: &RasterizerState) {
        self.bound.rasterizer = *state;
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        if rect.width == 0 || rect.height == 0 {
            log::warn!("ignoring empty viewport {rect:?}");
            return;
        }
        self.bound.viewport = Some(rect);
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.bound.clear_color = rgba;
    }

    fn set_clear_depth(&mut self, depth: f32) {
        self.bound.clear_depth = depth;
    }

    /// A clear lands before every later draw, so draws queued before it are
    /// submitted first.
    fn clear(&mut self, mask: ClearMask) {
        if !self.draws.is_empty() {
            self.submit();
        }
        self.pending_clear.color |= mask.color;
        self.pending_clear.depth |= mask.depth;
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.bound.program = program;
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.bound.texture = texture;
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.bound.index_buffer = buffer;
    }

    fn bind_vertex_buffer(&mut self, buffer: Option<BufferHandle>) {
        self.bound.vertex_buffer = buffer;
    }

    fn enable_vertex_attrib(&mut self, slot: u32) {
        self.bound.set_attrib(slot, true);
    }

    fn disable_vertex_attrib(&mut self, slot: u32) {
        self.bound.set_attrib(slot, false);
    }

    fn uniform2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.write_uniform(location, bytemuck::bytes_of(&[x, y]));
    }

    fn uniform3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32) {
        self.write_uniform(location, bytemuck::bytes_of(&[x, y, z]));
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: [[f32; 4]; 4]) {
        self.write_uniform(location, bytemuck::bytes_of(&matrix));
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> anyhow::Result<BufferHandle> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let handle = BufferHandle(self.alloc_handle());
        self.buffers.insert(handle, buffer);
        Ok(handle)
    }

    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> anyhow::Result<BufferHandle> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let handle = BufferHandle(self.alloc_handle());
        self.buffers.insert(handle, buffer);
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(removed) = self.buffers.remove(&buffer) {
            removed.destroy();
            if self.bound.index_buffer == Some(buffer) {
                self.bound.index_buffer = None;
            }
            if self.bound.vertex_buffer == Some(buffer) {
                self.bound.vertex_buffer = None;
            }
        }
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &image::RgbaImage,
        filtering: Filtering,
    ) -> anyhow::Result<TextureHandle> {
        let texture = Texture::from_rgba(&self.device, &self.queue, image, Some(label), filtering);
        let entry = mk_texture_entry(&self.device, &self.texture_layout, texture)?;
        let handle = TextureHandle(self.alloc_handle());
        self.textures.insert(handle, entry);
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() && self.bound.texture == Some(texture) {
            self.bound.texture = None;
        }
    }

    fn create_program(&mut self, source: &ProgramSource) -> anyhow::Result<ProgramHandle> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.label),
                source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
            });
        let layout = mk_pipeline_layout(
            &self.device,
            &self.uniform_layout,
            source.textured.then_some(&self.texture_layout),
        );
        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(source.label),
            size: source.uniform_block_size() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let handle = ProgramHandle(self.alloc_handle());
        self.programs.insert(
            handle,
            ProgramEntry {
                source: source.clone(),
                module,
                layout,
                uniform_buffer,
                uniform_bind_group,
                offsets: source.uniform_offsets().collect(),
            },
        );
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_some() {
            self.pipelines.retain(|key, _| key.program != program);
            if self.bound.program == Some(program) {
                self.bound.program = None;
            }
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let offset = *self.programs.get(&program)?.offsets.get(name)?;
        Some(UniformLocation { program, offset })
    }

    fn shared_program(&self, kind: SharedProgram) -> Option<ProgramHandle> {
        self.shared.get(&kind).copied()
    }

    fn draw_elements(&mut self, count: u32, first: u32) {
        let (Some(index_buffer), Some(vertex_buffer)) =
            (self.bound.index_buffer, self.bound.vertex_buffer)
        else {
            log::error!("draw without bound index and vertex buffers");
            return;
        };
        let Some(key) = self.prepare_pipeline() else {
            return;
        };
        self.draws.push(DrawCommand {
            key,
            viewport: self.bound.viewport,
            texture: self.bound.texture,
            index_buffer,
            vertex_buffer,
            count,
            first,
        });
    }
}
