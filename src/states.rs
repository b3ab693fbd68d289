//! Immutable Pipeline State Descriptors
//!
//! Value types describing one facet each of the fixed-function pipeline:
//! rasterization, multisampling, depth/stencil and blending. A descriptor is
//! plain data — never mutated after creation, hashed bit-exact, and
//! deduplicated through the registry's pools so that identical
//! configurations collapse to one live native object.
//!
//! # Float Fields
//!
//! Equality and hashing treat `f32` fields bit-exact (`to_bits`). Two
//! descriptors are "the same configuration" exactly when every field,
//! including float bit patterns, matches.
//!
//! # Presets
//!
//! `const` preset constructors cover the common parameterizations (filled,
//! back-culled, counter-clockwise triangles; standard depth test; alpha
//! blending). A preset flows through the same pools as a hand-built
//! descriptor, so both dedup to the same entry.

use std::hash::{Hash, Hasher};

use bitflags::bitflags;

use crate::hash::{ContentHash, hash_value};

// ─── Enums ────────────────────────────────────────────────────────────────────

/// Triangle fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

/// Which faces are discarded by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Winding order that defines the front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    #[default]
    Ccw,
    Cw,
}

/// Comparison function for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareOp {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Operation applied to a stencil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Source/destination factor of a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend equation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

bitflags! {
    /// Per-channel color write mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

// ─── RasterizationState ───────────────────────────────────────────────────────

/// Rasterizer configuration.
///
/// Default: filled, back-face culled, counter-clockwise front face, no
/// depth bias.
#[derive(Debug, Clone, Copy)]
pub struct RasterizationState {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_bias_constant: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope: f32,
    pub line_width: f32,
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
}

impl RasterizationState {
    /// The common parameterization: one interned instance per distinct
    /// (mode, cull, winding) triple once it flows through a pool.
    #[must_use]
    pub const fn preset(polygon_mode: PolygonMode, cull_mode: CullMode, front_face: FrontFace) -> Self {
        Self {
            polygon_mode,
            cull_mode,
            front_face,
            depth_bias_constant: 0.0,
            depth_bias_clamp: 0.0,
            depth_bias_slope: 0.0,
            line_width: 1.0,
            depth_clamp_enable: false,
            rasterizer_discard_enable: false,
        }
    }

    /// Content hash over all observable fields.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        hash_value(self)
    }
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self::preset(PolygonMode::Fill, CullMode::Back, FrontFace::Ccw)
    }
}

impl PartialEq for RasterizationState {
    fn eq(&self, other: &Self) -> bool {
        self.polygon_mode == other.polygon_mode
            && self.cull_mode == other.cull_mode
            && self.front_face == other.front_face
            && self.depth_bias_constant.to_bits() == other.depth_bias_constant.to_bits()
            && self.depth_bias_clamp.to_bits() == other.depth_bias_clamp.to_bits()
            && self.depth_bias_slope.to_bits() == other.depth_bias_slope.to_bits()
            && self.line_width.to_bits() == other.line_width.to_bits()
            && self.depth_clamp_enable == other.depth_clamp_enable
            && self.rasterizer_discard_enable == other.rasterizer_discard_enable
    }
}

impl Eq for RasterizationState {}

impl Hash for RasterizationState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.polygon_mode.hash(state);
        self.cull_mode.hash(state);
        self.front_face.hash(state);
        state.write_u32(self.depth_bias_constant.to_bits());
        state.write_u32(self.depth_bias_clamp.to_bits());
        state.write_u32(self.depth_bias_slope.to_bits());
        state.write_u32(self.line_width.to_bits());
        self.depth_clamp_enable.hash(state);
        self.rasterizer_discard_enable.hash(state);
    }
}

// ─── MultisampleState ─────────────────────────────────────────────────────────

/// Multisampling configuration. Default: single-sampled.
#[derive(Debug, Clone, Copy)]
pub struct MultisampleState {
    /// Samples per pixel. Common values: 1 (off), 2, 4, 8.
    pub sample_count: u32,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

impl MultisampleState {
    #[must_use]
    pub const fn with_samples(sample_count: u32) -> Self {
        Self {
            sample_count,
            sample_shading_enable: false,
            min_sample_shading: 0.0,
            alpha_to_coverage_enable: false,
            alpha_to_one_enable: false,
        }
    }

    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        hash_value(self)
    }
}

impl Default for MultisampleState {
    fn default() -> Self {
        Self::with_samples(1)
    }
}

impl PartialEq for MultisampleState {
    fn eq(&self, other: &Self) -> bool {
        self.sample_count == other.sample_count
            && self.sample_shading_enable == other.sample_shading_enable
            && self.min_sample_shading.to_bits() == other.min_sample_shading.to_bits()
            && self.alpha_to_coverage_enable == other.alpha_to_coverage_enable
            && self.alpha_to_one_enable == other.alpha_to_one_enable
    }
}

impl Eq for MultisampleState {}

impl Hash for MultisampleState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.sample_count);
        self.sample_shading_enable.hash(state);
        state.write_u32(self.min_sample_shading.to_bits());
        self.alpha_to_coverage_enable.hash(state);
        self.alpha_to_one_enable.hash(state);
    }
}

// ─── Depth / Stencil ──────────────────────────────────────────────────────────

/// Per-face stencil operation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

/// Depth and stencil test configuration.
///
/// Default: depth test and write enabled with `Less`, stencil disabled.
#[derive(Debug, Clone, Copy)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bounds_test_enable: bool,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
}

impl DepthStencilState {
    /// Depth fully disabled (UI / fullscreen passes).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: CompareOp::Always,
            depth_bounds_test_enable: false,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
            stencil_test_enable: false,
            front: StencilOpState {
                fail_op: StencilOp::Keep,
                pass_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Keep,
                compare_op: CompareOp::Always,
                compare_mask: 0,
                write_mask: 0,
                reference: 0,
            },
            back: StencilOpState {
                fail_op: StencilOp::Keep,
                pass_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Keep,
                compare_op: CompareOp::Always,
                compare_mask: 0,
                write_mask: 0,
                reference: 0,
            },
        }
    }

    /// Standard depth testing: test + write with `compare_op`.
    #[must_use]
    pub const fn depth(compare_op: CompareOp, depth_write_enable: bool) -> Self {
        let mut s = Self::disabled();
        s.depth_test_enable = true;
        s.depth_write_enable = depth_write_enable;
        s.depth_compare_op = compare_op;
        s
    }

    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        hash_value(self)
    }
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self::depth(CompareOp::Less, true)
    }
}

impl PartialEq for DepthStencilState {
    fn eq(&self, other: &Self) -> bool {
        self.depth_test_enable == other.depth_test_enable
            && self.depth_write_enable == other.depth_write_enable
            && self.depth_compare_op == other.depth_compare_op
            && self.depth_bounds_test_enable == other.depth_bounds_test_enable
            && self.min_depth_bounds.to_bits() == other.min_depth_bounds.to_bits()
            && self.max_depth_bounds.to_bits() == other.max_depth_bounds.to_bits()
            && self.stencil_test_enable == other.stencil_test_enable
            && self.front == other.front
            && self.back == other.back
    }
}

impl Eq for DepthStencilState {}

impl Hash for DepthStencilState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.depth_test_enable.hash(state);
        self.depth_write_enable.hash(state);
        self.depth_compare_op.hash(state);
        self.depth_bounds_test_enable.hash(state);
        state.write_u32(self.min_depth_bounds.to_bits());
        state.write_u32(self.max_depth_bounds.to_bits());
        self.stencil_test_enable.hash(state);
        self.front.hash(state);
        self.back.hash(state);
    }
}

// ─── BlendState ───────────────────────────────────────────────────────────────

/// Blend configuration for one color target. Default: blending disabled,
/// all channels written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
}

impl BlendState {
    /// No blending; source overwrites destination.
    #[must_use]
    pub const fn opaque() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }

    /// Standard premultiplied-style alpha blending.
    #[must_use]
    pub const fn alpha_blending() -> Self {
        Self {
            blend_enable: true,
            src_color_factor: BlendFactor::SrcAlpha,
            dst_color_factor: BlendFactor::OneMinusSrcAlpha,
            color_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::OneMinusSrcAlpha,
            alpha_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }

    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        hash_value(self)
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::opaque()
    }
}
