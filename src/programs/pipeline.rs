use crate::state::{BlendState, DepthState, RasterizerState};

/// Group 0 of every program: its uniform block.
pub fn uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("program uniform_bind_group_layout"),
    })
}

/// Group 1 of textured programs: the bound texture and its sampler.
pub fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("program texture_bind_group_layout"),
    })
}

pub fn mk_pipeline_layout(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    texture_layout: Option<&wgpu::BindGroupLayout>,
) -> wgpu::PipelineLayout {
    let bind_group_layouts: Vec<Option<&wgpu::BindGroupLayout>> = match texture_layout {
        Some(texture_layout) => vec![Some(uniform_layout), Some(texture_layout)],
        None => vec![Some(uniform_layout)],
    };
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Program Pipeline Layout"),
        bind_group_layouts: &bind_group_layouts,
        immediate_size: 0,
    })
}

/// Fixed-function state a pipeline is baked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedState {
    pub blend: BlendState,
    pub depth: DepthState,
    pub rasterizer: RasterizerState,
    pub topology: wgpu::PrimitiveTopology,
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    fixed: &FixedState,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Program Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: fixed.blend.to_wgpu(),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: fixed.rasterizer.to_wgpu(fixed.topology),
        depth_stencil: depth_format.map(|format| fixed.depth.to_wgpu(format)),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
