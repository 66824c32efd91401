//! Fixed-function pipeline state objects.
//!
//! [`BlendState`], [`DepthState`] and [`RasterizerState`] are small immutable
//! value types. They are handed to a [`GraphicsContext`](crate::context::GraphicsContext)
//! as a whole, so a mode switch is always a handful of calls regardless of how
//! many individual settings differ. Every type converts into the matching
//! `wgpu` description for backends that bake state into pipelines.

/// Factor applied to a source or destination color during blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

impl BlendFactor {
    pub fn to_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

/// Blending configuration for color writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub enabled: bool,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

impl BlendState {
    /// Blending off, source replaces destination.
    pub const DEFAULT: BlendState = BlendState {
        enabled: false,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
    };

    /// Returns `None` when blending is disabled, which is what a
    /// `wgpu::ColorTargetState` expects for plain replacement.
    pub fn to_wgpu(&self) -> Option<wgpu::BlendState> {
        if !self.enabled {
            return None;
        }
        let component = wgpu::BlendComponent {
            src_factor: self.src_factor.to_wgpu(),
            dst_factor: self.dst_factor.to_wgpu(),
            operation: wgpu::BlendOperation::Add,
        };
        Some(wgpu::BlendState {
            color: component,
            alpha: component,
        })
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Comparison used by the depth test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl DepthFunc {
    pub fn to_wgpu(self) -> wgpu::CompareFunction {
        match self {
            DepthFunc::Never => wgpu::CompareFunction::Never,
            DepthFunc::Less => wgpu::CompareFunction::Less,
            DepthFunc::Equal => wgpu::CompareFunction::Equal,
            DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
            DepthFunc::Greater => wgpu::CompareFunction::Greater,
            DepthFunc::NotEqual => wgpu::CompareFunction::NotEqual,
            DepthFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            DepthFunc::Always => wgpu::CompareFunction::Always,
        }
    }
}

/// Depth test and depth write configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub depth_test_enabled: bool,
    pub depth_func: DepthFunc,
    pub depth_write: bool,
}

impl DepthState {
    /// Depth testing off, writes on.
    pub const DEFAULT: DepthState = DepthState {
        depth_test_enabled: false,
        depth_func: DepthFunc::Less,
        depth_write: true,
    };

    /// Depth testing with `LessEqual`, which lets coplanar passes (chunk pass
    /// 2 over pass 1) land on the same depth values.
    pub const LESS_EQUAL: DepthState = DepthState {
        depth_test_enabled: true,
        depth_func: DepthFunc::LessEqual,
        depth_write: true,
    };

    /// A disabled depth test is expressed as `Always` since wgpu has no
    /// separate enable flag.
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        let depth_compare = if self.depth_test_enabled {
            self.depth_func.to_wgpu()
        } else {
            wgpu::CompareFunction::Always
        };
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(self.depth_write),
            depth_compare: Some(depth_compare),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which face gets discarded when culling is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
}

/// Winding order of front-facing triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

/// Primitive assembly configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    pub cull_face_enabled: bool,
    pub cull_face: CullFace,
    pub front_face: FrontFace,
}

impl RasterizerState {
    pub const DEFAULT: RasterizerState = RasterizerState {
        cull_face_enabled: false,
        cull_face: CullFace::Back,
        front_face: FrontFace::Ccw,
    };

    pub const CULL_BACK: RasterizerState = RasterizerState {
        cull_face_enabled: true,
        ..Self::DEFAULT
    };

    pub fn to_wgpu(&self, topology: wgpu::PrimitiveTopology) -> wgpu::PrimitiveState {
        let cull_mode = match (self.cull_face_enabled, self.cull_face) {
            (false, _) => None,
            (true, CullFace::Back) => Some(wgpu::Face::Back),
            (true, CullFace::Front) => Some(wgpu::Face::Front),
        };
        wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: match self.front_face {
                FrontFace::Ccw => wgpu::FrontFace::Ccw,
                FrontFace::Cw => wgpu::FrontFace::Cw,
            },
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

impl TextureFilter {
    pub fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Minification and magnification filters of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filtering {
    pub min: TextureFilter,
    pub mag: TextureFilter,
}

impl Filtering {
    /// Crisp texels, as used by block and UI atlases.
    pub const NEAREST: Filtering = Filtering {
        min: TextureFilter::Nearest,
        mag: TextureFilter::Nearest,
    };

    pub const LINEAR: Filtering = Filtering {
        min: TextureFilter::Linear,
        mag: TextureFilter::Linear,
    };
}

impl Default for Filtering {
    fn default() -> Self {
        Self::LINEAR
    }
}
