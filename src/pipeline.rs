//! Pipeline State Composition
//!
//! [`PipelineStateFixedInfo`] aggregates the fixed-function facet
//! descriptors (rasterization × multisample × depth-stencil × blend ×
//! viewports/scissors); [`PipelineStateInfo`] is the top-level composite
//! that adds the shader, vertex layout, render pass, binding layouts and
//! push constants, and hashes the whole configuration for deduplication.
//!
//! # Hash Composition
//!
//! The fixed-info hash is the XOR of its component hashes, with viewport
//! and scissor hashes mixed with their index first — XOR is commutative, so
//! the positional salt is what makes reordering observable. The full
//! pipeline hash then sequentially combines the fixed hash with every other
//! aggregated sub-hash.
//!
//! Realized pipelines ([`GpuPipelineState`]) own their native pipeline and
//! pipeline-layout handles and are owned by the registry's pipeline pool;
//! binding at draw time goes through the recording context and performs no
//! allocation.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::binding::{ShaderBindingsLayout, StageFlags};
use crate::error::{Result, RhiError};
use crate::handles::{NativePipeline, NativePipelineLayout, ShaderHandle};
use crate::hash::{ContentHash, HashCell, combine, combine_indexed, hash_value};
use crate::renderpass::GpuRenderPass;
use crate::states::{BlendState, DepthStencilState, MultisampleState, RasterizationState};

// ─── Viewport / Scissor ───────────────────────────────────────────────────────

/// One viewport rectangle with depth range. Hashed bit-exact.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with the standard [0, 1] depth range.
    #[must_use]
    pub const fn of_extent(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl PartialEq for Viewport {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.width.to_bits() == other.width.to_bits()
            && self.height.to_bits() == other.height.to_bits()
            && self.min_depth.to_bits() == other.min_depth.to_bits()
            && self.max_depth.to_bits() == other.max_depth.to_bits()
    }
}

impl Eq for Viewport {}

impl Hash for Viewport {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.x.to_bits());
        state.write_u32(self.y.to_bits());
        state.write_u32(self.width.to_bits());
        state.write_u32(self.height.to_bits());
        state.write_u32(self.min_depth.to_bits());
        state.write_u32(self.max_depth.to_bits());
    }
}

/// One scissor rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scissor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Scissor {
    #[must_use]
    pub const fn of_extent(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

// ─── Vertex Layout ────────────────────────────────────────────────────────────

/// Per-attribute data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
    Sint32,
    Unorm8x4,
    Uint16x2,
    Sint16x4,
}

/// Whether a vertex buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    #[default]
    Vertex,
    Instance,
}

/// One attribute within a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

/// One bound vertex buffer and its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferBinding {
    pub binding: u32,
    pub stride: u32,
    pub step_mode: VertexStepMode,
    pub attributes: SmallVec<[VertexAttribute; 4]>,
}

/// Complete vertex input layout. Order-sensitive hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub buffers: SmallVec<[VertexBufferBinding; 2]>,
}

impl VertexLayout {
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        hash_value(self)
    }
}

// ─── Push Constants ───────────────────────────────────────────────────────────

/// One push-constant range visible to `stages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushConstantRange {
    pub stages: StageFlags,
    pub offset: u32,
    pub size: u32,
}

// ─── PipelineStateFixedInfo ───────────────────────────────────────────────────

/// Aggregate of the fixed-function facet descriptors.
///
/// Immutable after construction; the hash is memoized on first access.
#[derive(Debug, Clone)]
pub struct PipelineStateFixedInfo {
    rasterization: RasterizationState,
    multisample: MultisampleState,
    depth_stencil: DepthStencilState,
    blend: BlendState,
    viewports: SmallVec<[Viewport; 1]>,
    scissors: SmallVec<[Scissor; 1]>,
    variable_rate_shading: bool,
    hash: HashCell,
}

impl PipelineStateFixedInfo {
    #[must_use]
    pub fn new(
        rasterization: RasterizationState,
        multisample: MultisampleState,
        depth_stencil: DepthStencilState,
        blend: BlendState,
        viewports: impl IntoIterator<Item = Viewport>,
        scissors: impl IntoIterator<Item = Scissor>,
        variable_rate_shading: bool,
    ) -> Self {
        Self {
            rasterization,
            multisample,
            depth_stencil,
            blend,
            viewports: viewports.into_iter().collect(),
            scissors: scissors.into_iter().collect(),
            variable_rate_shading,
            hash: HashCell::new(),
        }
    }

    /// Default states with one full-extent viewport/scissor pair.
    #[must_use]
    pub fn with_extent(width: u32, height: u32) -> Self {
        Self::new(
            RasterizationState::default(),
            MultisampleState::default(),
            DepthStencilState::default(),
            BlendState::default(),
            [Viewport::of_extent(width as f32, height as f32)],
            [Scissor::of_extent(width, height)],
            false,
        )
    }

    #[must_use]
    pub fn rasterization(&self) -> &RasterizationState {
        &self.rasterization
    }

    #[must_use]
    pub fn multisample(&self) -> &MultisampleState {
        &self.multisample
    }

    #[must_use]
    pub fn depth_stencil(&self) -> &DepthStencilState {
        &self.depth_stencil
    }

    #[must_use]
    pub fn blend(&self) -> &BlendState {
        &self.blend
    }

    #[must_use]
    pub fn viewports(&self) -> &[Viewport] {
        &self.viewports
    }

    #[must_use]
    pub fn scissors(&self) -> &[Scissor] {
        &self.scissors
    }

    #[must_use]
    pub fn variable_rate_shading(&self) -> bool {
        self.variable_rate_shading
    }

    /// XOR of the component hashes; viewport/scissor hashes are mixed with
    /// their index before folding so list order is observable.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.hash.get_or_compute(|| {
            let mut h = self.rasterization.content_hash()
                ^ self.multisample.content_hash()
                ^ self.depth_stencil.content_hash()
                ^ self.blend.content_hash()
                ^ hash_value(&self.variable_rate_shading);
            for (i, v) in self.viewports.iter().enumerate() {
                h ^= combine_indexed(hash_value(v), i);
            }
            for (i, s) in self.scissors.iter().enumerate() {
                h ^= combine_indexed(hash_value(s), i);
            }
            h
        })
    }
}

// ─── PipelineStateInfo ────────────────────────────────────────────────────────

/// Graphics or compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Graphics,
    Compute,
}

/// Top-level composite describing one complete pipeline configuration.
///
/// References into the owning pools (render pass, binding layouts) are held
/// as `Arc`s: a published pool entry cannot be invalidated under a live
/// reference.
#[derive(Debug, Clone)]
pub struct PipelineStateInfo {
    kind: PipelineKind,
    label: String,
    fixed: Option<PipelineStateFixedInfo>,
    shader: ShaderHandle,
    vertex_layout: Option<VertexLayout>,
    render_pass: Option<Arc<GpuRenderPass>>,
    subpass: u32,
    binding_layouts: SmallVec<[Arc<ShaderBindingsLayout>; 4]>,
    push_constants: SmallVec<[PushConstantRange; 2]>,
    hash: HashCell,
}

impl PipelineStateInfo {
    /// Describe a graphics pipeline. All fixed-function state, the vertex
    /// layout and the render pass are required.
    #[must_use]
    pub fn graphics(
        label: impl Into<String>,
        fixed: PipelineStateFixedInfo,
        shader: ShaderHandle,
        vertex_layout: VertexLayout,
        render_pass: Arc<GpuRenderPass>,
        subpass: u32,
        binding_layouts: impl IntoIterator<Item = Arc<ShaderBindingsLayout>>,
        push_constants: impl IntoIterator<Item = PushConstantRange>,
    ) -> Self {
        Self {
            kind: PipelineKind::Graphics,
            label: label.into(),
            fixed: Some(fixed),
            shader,
            vertex_layout: Some(vertex_layout),
            render_pass: Some(render_pass),
            subpass,
            binding_layouts: binding_layouts.into_iter().collect(),
            push_constants: push_constants.into_iter().collect(),
            hash: HashCell::new(),
        }
    }

    /// Describe a compute pipeline: shader, binding layouts and push
    /// constants only.
    #[must_use]
    pub fn compute(
        label: impl Into<String>,
        shader: ShaderHandle,
        binding_layouts: impl IntoIterator<Item = Arc<ShaderBindingsLayout>>,
        push_constants: impl IntoIterator<Item = PushConstantRange>,
    ) -> Self {
        Self {
            kind: PipelineKind::Compute,
            label: label.into(),
            fixed: None,
            shader,
            vertex_layout: None,
            render_pass: None,
            subpass: 0,
            binding_layouts: binding_layouts.into_iter().collect(),
            push_constants: push_constants.into_iter().collect(),
            hash: HashCell::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn fixed(&self) -> Option<&PipelineStateFixedInfo> {
        self.fixed.as_ref()
    }

    #[must_use]
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    #[must_use]
    pub fn vertex_layout(&self) -> Option<&VertexLayout> {
        self.vertex_layout.as_ref()
    }

    #[must_use]
    pub fn render_pass(&self) -> Option<&Arc<GpuRenderPass>> {
        self.render_pass.as_ref()
    }

    #[must_use]
    pub fn subpass(&self) -> u32 {
        self.subpass
    }

    #[must_use]
    pub fn binding_layouts(&self) -> &[Arc<ShaderBindingsLayout>] {
        &self.binding_layouts
    }

    #[must_use]
    pub fn push_constants(&self) -> &[PushConstantRange] {
        &self.push_constants
    }

    /// Memoized combination of every aggregated sub-hash. The debug label
    /// does not participate.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.hash.get_or_compute(|| {
            let mut h = hash_value(&self.kind);
            if let Some(fixed) = &self.fixed {
                h = combine(h, fixed.content_hash());
            }
            h = combine(h, hash_value(&self.shader));
            if let Some(vertex) = &self.vertex_layout {
                h = combine(h, vertex.content_hash());
            }
            if let Some(pass) = &self.render_pass {
                h = combine(h, pass.content_hash());
            }
            h = combine(h, hash_value(&self.subpass));
            for (i, layout) in self.binding_layouts.iter().enumerate() {
                h = combine(h, combine_indexed(layout.content_hash(), i));
            }
            combine(h, hash_value(&self.push_constants.as_slice()))
        })
    }

    /// Reject malformed composites before any backend call.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            PipelineKind::Graphics => {
                let fixed = self.fixed.as_ref().ok_or_else(|| {
                    RhiError::InvalidDescriptor("graphics pipeline without fixed state".into())
                })?;
                if fixed.viewports.is_empty() || fixed.scissors.is_empty() {
                    return Err(RhiError::InvalidDescriptor(
                        "graphics pipeline needs at least one viewport and scissor".into(),
                    ));
                }
                if self.render_pass.is_none() {
                    return Err(RhiError::InvalidDescriptor(
                        "graphics pipeline without a render pass".into(),
                    ));
                }
            }
            PipelineKind::Compute => {
                if self.fixed.is_some() || self.render_pass.is_some() {
                    return Err(RhiError::InvalidDescriptor(
                        "compute pipeline carries graphics-only state".into(),
                    ));
                }
            }
        }
        for range in &self.push_constants {
            if range.size == 0 {
                return Err(RhiError::InvalidDescriptor(
                    "zero-sized push constant range".into(),
                ));
            }
        }
        Ok(())
    }
}

// ─── GpuPipelineState ─────────────────────────────────────────────────────────

/// A realized pipeline: the composite descriptor plus the native pipeline
/// and pipeline-layout objects created for it. Owned by the registry's
/// pipeline pool.
#[derive(Debug)]
pub struct GpuPipelineState {
    info: PipelineStateInfo,
    native_pipeline: NativePipeline,
    native_layout: NativePipelineLayout,
}

impl GpuPipelineState {
    #[must_use]
    pub(crate) fn new(
        info: PipelineStateInfo,
        native_pipeline: NativePipeline,
        native_layout: NativePipelineLayout,
    ) -> Self {
        Self {
            info,
            native_pipeline,
            native_layout,
        }
    }

    #[must_use]
    pub fn info(&self) -> &PipelineStateInfo {
        &self.info
    }

    #[must_use]
    pub fn kind(&self) -> PipelineKind {
        self.info.kind
    }

    #[must_use]
    pub fn native_pipeline(&self) -> NativePipeline {
        self.native_pipeline
    }

    #[must_use]
    pub fn native_layout(&self) -> NativePipelineLayout {
        self.native_layout
    }

    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.info.content_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::{CullMode, FrontFace, PolygonMode};

    fn fixed() -> PipelineStateFixedInfo {
        PipelineStateFixedInfo::with_extent(1280, 720)
    }

    #[test]
    fn fixed_info_hash_is_idempotent() {
        let f = fixed();
        assert_eq!(f.content_hash(), f.content_hash());
        assert_eq!(f.content_hash(), fixed().content_hash());
    }

    #[test]
    fn viewport_order_changes_fixed_hash() {
        let a = Viewport::of_extent(640.0, 480.0);
        let b = Viewport::of_extent(64.0, 64.0);
        let scissors = [Scissor::of_extent(640, 480)];

        let ab = PipelineStateFixedInfo::new(
            RasterizationState::default(),
            MultisampleState::default(),
            DepthStencilState::default(),
            BlendState::default(),
            [a, b],
            scissors,
            false,
        );
        let ba = PipelineStateFixedInfo::new(
            RasterizationState::default(),
            MultisampleState::default(),
            DepthStencilState::default(),
            BlendState::default(),
            [b, a],
            scissors,
            false,
        );
        assert_ne!(ab.content_hash(), ba.content_hash());
    }

    #[test]
    fn cull_mode_changes_fixed_hash() {
        let mk = |cull| {
            PipelineStateFixedInfo::new(
                RasterizationState::preset(PolygonMode::Fill, cull, FrontFace::Ccw),
                MultisampleState::default(),
                DepthStencilState::default(),
                BlendState::default(),
                [Viewport::of_extent(64.0, 64.0)],
                [Scissor::of_extent(64, 64)],
                false,
            )
        };
        assert_ne!(
            mk(CullMode::Back).content_hash(),
            mk(CullMode::Front).content_hash()
        );
    }

    #[test]
    fn compute_info_validates() {
        let info = PipelineStateInfo::compute("lut", ShaderHandle(1), [], []);
        assert!(info.validate().is_ok());
        assert_eq!(info.kind(), PipelineKind::Compute);
    }

    #[test]
    fn zero_sized_push_constants_rejected() {
        let info = PipelineStateInfo::compute(
            "bad",
            ShaderHandle(1),
            [],
            [PushConstantRange {
                stages: StageFlags::COMPUTE,
                offset: 0,
                size: 0,
            }],
        );
        assert!(info.validate().is_err());
    }
}
