//! Headless Backend
//!
//! A [`RenderBackend`] that mints handles without touching a GPU. Used by
//! the test suite and by headless tools (asset baking, CI) that exercise
//! the cache layer's dedup and lifecycle behavior.
//!
//! Every creation call increments a per-category counter, which makes the
//! "exactly one construction per distinct configuration" property directly
//! observable. A one-shot failure can be armed with
//! [`HeadlessBackend::fail_next_creation`] to exercise error propagation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::binding::{BindingLifetime, BindingWrite, PoolSizes, ShaderBindingArray};
use crate::error::{Result, RhiError};
use crate::handles::{
    CommandStream, NativeBindingSet, NativeBindingsLayout, NativeBlendState,
    NativeDepthStencilState, NativeFramebuffer, NativeMultisampleState, NativePipeline,
    NativePipelineLayout, NativeRasterizerState, NativeRenderPass,
};
use crate::pipeline::PipelineKind;
use crate::renderpass::RenderPassDesc;
use crate::states::{BlendState, DepthStencilState, MultisampleState, RasterizationState};

use super::{ComputePipelineDesc, GraphicsPipelineDesc, RenderBackend};

/// Creation/recording counters, all relaxed.
#[derive(Debug, Default)]
pub struct HeadlessCounters {
    pub rasterization_states: AtomicU64,
    pub multisample_states: AtomicU64,
    pub depth_stencil_states: AtomicU64,
    pub blend_states: AtomicU64,
    pub binding_layouts: AtomicU64,
    pub binding_sets_allocated: AtomicU64,
    pub binding_sets_freed: AtomicU64,
    pub binding_writes: AtomicU64,
    pub pipeline_layouts: AtomicU64,
    pub graphics_pipelines: AtomicU64,
    pub compute_pipelines: AtomicU64,
    pub render_passes: AtomicU64,
    pub passes_begun: AtomicU64,
    pub passes_ended: AtomicU64,
    pub pipeline_binds: AtomicU64,
    pub binding_set_binds: AtomicU64,
}

/// GPU-less backend minting sequential handles.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: AtomicU64,
    fail_next: AtomicBool,
    counters: HeadlessCounters,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot failure: the next creation call returns
    /// `BackendCreation` instead of a handle.
    pub fn fail_next_creation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn counters(&self) -> &HeadlessCounters {
        &self.counters
    }

    fn mint(&self, counter: &AtomicU64, what: &'static str) -> Result<u64> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(RhiError::BackendCreation {
                what,
                reason: "injected failure".into(),
            });
        }
        counter.fetch_add(1, Ordering::Relaxed);
        // Start at 1 so a zero handle never occurs in the wild.
        Ok(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_rasterization_state(
        &self,
        _desc: &RasterizationState,
    ) -> Result<NativeRasterizerState> {
        self.mint(&self.counters.rasterization_states, "rasterization state")
            .map(NativeRasterizerState)
    }

    fn create_multisample_state(
        &self,
        _desc: &MultisampleState,
    ) -> Result<NativeMultisampleState> {
        self.mint(&self.counters.multisample_states, "multisample state")
            .map(NativeMultisampleState)
    }

    fn create_depth_stencil_state(
        &self,
        _desc: &DepthStencilState,
    ) -> Result<NativeDepthStencilState> {
        self.mint(&self.counters.depth_stencil_states, "depth/stencil state")
            .map(NativeDepthStencilState)
    }

    fn create_blend_state(&self, _desc: &BlendState) -> Result<NativeBlendState> {
        self.mint(&self.counters.blend_states, "blend state")
            .map(NativeBlendState)
    }

    fn create_shader_bindings_layout(
        &self,
        _bindings: &ShaderBindingArray,
    ) -> Result<NativeBindingsLayout> {
        self.mint(&self.counters.binding_layouts, "shader bindings layout")
            .map(NativeBindingsLayout)
    }

    fn allocate_binding_set(
        &self,
        _layout: NativeBindingsLayout,
        _sizes: &PoolSizes,
        _lifetime: BindingLifetime,
    ) -> Result<NativeBindingSet> {
        self.mint(&self.counters.binding_sets_allocated, "binding set")
            .map(NativeBindingSet)
    }

    fn free_binding_set(&self, _set: NativeBindingSet) {
        self.counters
            .binding_sets_freed
            .fetch_add(1, Ordering::Relaxed);
    }

    fn write_binding_set(&self, _set: NativeBindingSet, writes: &[BindingWrite]) -> Result<()> {
        self.counters
            .binding_writes
            .fetch_add(writes.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _binding_layouts: &[NativeBindingsLayout],
        _push_constants: &[crate::pipeline::PushConstantRange],
    ) -> Result<NativePipelineLayout> {
        self.mint(&self.counters.pipeline_layouts, "pipeline layout")
            .map(NativePipelineLayout)
    }

    fn create_graphics_pipeline(&self, _desc: &GraphicsPipelineDesc<'_>) -> Result<NativePipeline> {
        self.mint(&self.counters.graphics_pipelines, "graphics pipeline")
            .map(NativePipeline)
    }

    fn create_compute_pipeline(&self, _desc: &ComputePipelineDesc<'_>) -> Result<NativePipeline> {
        self.mint(&self.counters.compute_pipelines, "compute pipeline")
            .map(NativePipeline)
    }

    fn create_render_pass(
        &self,
        _desc: &RenderPassDesc,
    ) -> Result<(NativeRenderPass, NativeFramebuffer)> {
        let pass = self
            .mint(&self.counters.render_passes, "render pass")
            .map(NativeRenderPass)?;
        let framebuffer = NativeFramebuffer(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        Ok((pass, framebuffer))
    }

    fn cmd_begin_render_pass(
        &self,
        _stream: CommandStream,
        _pass: NativeRenderPass,
        _framebuffer: NativeFramebuffer,
    ) {
        self.counters.passes_begun.fetch_add(1, Ordering::Relaxed);
    }

    fn cmd_end_render_pass(&self, _stream: CommandStream) {
        self.counters.passes_ended.fetch_add(1, Ordering::Relaxed);
    }

    fn cmd_bind_pipeline(
        &self,
        _stream: CommandStream,
        _kind: PipelineKind,
        _pipeline: NativePipeline,
    ) {
        self.counters
            .pipeline_binds
            .fetch_add(1, Ordering::Relaxed);
    }

    fn cmd_bind_binding_set(
        &self,
        _stream: CommandStream,
        _kind: PipelineKind,
        _layout: NativePipelineLayout,
        _slot: u32,
        _set: NativeBindingSet,
    ) {
        self.counters
            .binding_set_binds
            .fetch_add(1, Ordering::Relaxed);
    }
}
