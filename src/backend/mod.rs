//! Backend Capability Trait
//!
//! The seam between the backend-agnostic cache layer and a concrete
//! graphics API. Each backend (Vulkan, OpenGL, …) implements
//! [`RenderBackend`] exactly once; every capability is a required method,
//! so missing functionality is a compile error rather than a silent no-op.
//!
//! Creation calls return `Result` — a driver rejection propagates to the
//! caller and the requesting pool stays unmodified. Command-stream calls
//! (`cmd_*`) are infallible: recording mistakes are caller bugs and are
//! caught by the recording context before the backend is reached.
//!
//! # Native Object Ownership
//!
//! Backends mint opaque handles and own the underlying driver objects
//! (keeping their own handle tables, the way `wgpu-core`-style hubs do).
//! The pools own the cache *entries*; `free_binding_set` is the only
//! per-object reclamation call the cache layer needs, because binding sets
//! are the only objects with sub-backend lifetimes.

pub mod headless;

use crate::binding::{BindingLifetime, BindingWrite, PoolSizes, ShaderBindingArray};
use crate::error::Result;
use crate::handles::{
    CommandStream, NativeBindingSet, NativeBindingsLayout, NativeBlendState,
    NativeDepthStencilState, NativeFramebuffer, NativeMultisampleState, NativePipeline,
    NativePipelineLayout, NativeRasterizerState, NativeRenderPass, ShaderHandle,
};
use crate::pipeline::{PipelineKind, PipelineStateFixedInfo, PushConstantRange, VertexLayout};
use crate::renderpass::RenderPassDesc;
use crate::states::{BlendState, DepthStencilState, MultisampleState, RasterizationState};

pub use headless::HeadlessBackend;

// ─── Creation Descriptors ─────────────────────────────────────────────────────

/// Borrowed view of everything a backend needs to realize a graphics
/// pipeline.
#[derive(Debug)]
pub struct GraphicsPipelineDesc<'a> {
    pub label: &'a str,
    pub fixed: &'a PipelineStateFixedInfo,
    pub shader: ShaderHandle,
    pub vertex_layout: &'a VertexLayout,
    pub render_pass: NativeRenderPass,
    pub subpass: u32,
    pub layout: NativePipelineLayout,
}

/// Borrowed view of everything a backend needs to realize a compute
/// pipeline.
#[derive(Debug)]
pub struct ComputePipelineDesc<'a> {
    pub label: &'a str,
    pub shader: ShaderHandle,
    pub layout: NativePipelineLayout,
}

// ─── RenderBackend ────────────────────────────────────────────────────────────

/// Capability set a graphics backend provides to the cache layer.
pub trait RenderBackend: Send + Sync {
    // ── State objects ────────────────────────────────────────────────────

    fn create_rasterization_state(
        &self,
        desc: &RasterizationState,
    ) -> Result<NativeRasterizerState>;

    fn create_multisample_state(&self, desc: &MultisampleState)
    -> Result<NativeMultisampleState>;

    fn create_depth_stencil_state(
        &self,
        desc: &DepthStencilState,
    ) -> Result<NativeDepthStencilState>;

    fn create_blend_state(&self, desc: &BlendState) -> Result<NativeBlendState>;

    // ── Shader bindings ──────────────────────────────────────────────────

    /// Realize a resource-free binding array into a native descriptor-set
    /// layout.
    fn create_shader_bindings_layout(
        &self,
        bindings: &ShaderBindingArray,
    ) -> Result<NativeBindingsLayout>;

    /// Allocate one binding set from the pool sized by `sizes`.
    fn allocate_binding_set(
        &self,
        layout: NativeBindingsLayout,
        sizes: &PoolSizes,
        lifetime: BindingLifetime,
    ) -> Result<NativeBindingSet>;

    /// Return a binding set's backing allocation to its pool.
    fn free_binding_set(&self, set: NativeBindingSet);

    /// Apply coalesced resource writes to a binding set.
    fn write_binding_set(&self, set: NativeBindingSet, writes: &[BindingWrite]) -> Result<()>;

    // ── Pipelines ────────────────────────────────────────────────────────

    fn create_pipeline_layout(
        &self,
        binding_layouts: &[NativeBindingsLayout],
        push_constants: &[PushConstantRange],
    ) -> Result<NativePipelineLayout>;

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc<'_>) -> Result<NativePipeline>;

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc<'_>) -> Result<NativePipeline>;

    // ── Render passes ────────────────────────────────────────────────────

    /// Realize an attachment description into a render-pass/framebuffer
    /// pairing.
    fn create_render_pass(
        &self,
        desc: &RenderPassDesc,
    ) -> Result<(NativeRenderPass, NativeFramebuffer)>;

    // ── Command-stream calls ─────────────────────────────────────────────
    // Single-threaded per stream by the surrounding renderer's discipline.

    fn cmd_begin_render_pass(
        &self,
        stream: CommandStream,
        pass: NativeRenderPass,
        framebuffer: NativeFramebuffer,
    );

    fn cmd_end_render_pass(&self, stream: CommandStream);

    fn cmd_bind_pipeline(&self, stream: CommandStream, kind: PipelineKind, pipeline: NativePipeline);

    fn cmd_bind_binding_set(
        &self,
        stream: CommandStream,
        kind: PipelineKind,
        layout: NativePipelineLayout,
        slot: u32,
        set: NativeBindingSet,
    );
}
