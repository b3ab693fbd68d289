//! RHI Resource Registry
//!
//! Central, explicitly owned home of every deduplication pool in the cache
//! layer. There is no process-wide state: the renderer constructs one
//! [`RhiRegistry`] from a backend and settings, threads references to it
//! into pass setup, and tears it down once all consumers have released
//! their references.
//!
//! # What It Owns
//!
//! - One [`ResourcePool`] per descriptor family: rasterization,
//!   multisample, depth-stencil and blend states; shader-bindings layouts;
//!   pipelines; render passes.
//! - The [`BindingInstanceAllocator`] (single-frame ring + persistent
//!   pool).
//!
//! # Concurrency
//!
//! All `*_state` / layout / pipeline / render-pass lookups are safe from
//! any number of setup threads (shadow pass and base pass populate the
//! caches concurrently). Frame advance and shutdown are serial points the
//! surrounding renderer must provide.
//!
//! # Teardown
//!
//! [`shutdown`](RhiRegistry::shutdown) releases pools in reverse dependency
//! order — pipelines first, then render passes, binding instances and
//! layouts, state descriptors last — and is only valid once no other thread
//! is touching the registry.

use std::sync::Arc;

use crate::backend::{ComputePipelineDesc, GraphicsPipelineDesc, RenderBackend};
use crate::binding::{
    BindingInstanceAllocator, BindingLifetime, PoolSizes, ShaderBindingArray,
    ShaderBindingInstance, ShaderBindingsLayout,
};
use crate::error::Result;
use crate::handles::{
    CommandStream, NativeBindingsLayout, NativeBlendState, NativeDepthStencilState,
    NativeMultisampleState, NativeRasterizerState,
};
use crate::pipeline::{GpuPipelineState, PipelineKind, PipelineStateInfo};
use crate::pool::{PoolStats, ResourcePool};
use crate::recording::RecordingContext;
use crate::renderpass::{Attachment, GpuRenderPass, RenderPassDesc};
use crate::settings::RhiSettings;
use crate::states::{
    BlendState, CompareOp, DepthStencilState, MultisampleState, RasterizationState,
};

// ─── Realized State Objects ───────────────────────────────────────────────────

/// A state descriptor paired with the native object realized from it.
#[derive(Debug)]
pub struct GpuState<D, N> {
    desc: D,
    native: N,
}

impl<D, N: Copy> GpuState<D, N> {
    #[must_use]
    pub fn desc(&self) -> &D {
        &self.desc
    }

    #[must_use]
    pub fn native(&self) -> N {
        self.native
    }
}

pub type GpuRasterizationState = GpuState<RasterizationState, NativeRasterizerState>;
pub type GpuMultisampleState = GpuState<MultisampleState, NativeMultisampleState>;
pub type GpuDepthStencilState = GpuState<DepthStencilState, NativeDepthStencilState>;
pub type GpuBlendState = GpuState<BlendState, NativeBlendState>;

// ─── Stats ────────────────────────────────────────────────────────────────────

/// Aggregate cache-effectiveness snapshot across every pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStats {
    pub rasterization: PoolStats,
    pub multisample: PoolStats,
    pub depth_stencil: PoolStats,
    pub blend: PoolStats,
    pub binding_layouts: PoolStats,
    pub pipelines: PoolStats,
    pub render_passes: PoolStats,
    /// Outstanding multi-frame binding sets.
    pub persistent_binding_sets: usize,
}

// ─── RhiRegistry ──────────────────────────────────────────────────────────────

/// Owner of all deduplication pools and the binding-instance allocator.
pub struct RhiRegistry {
    backend: Arc<dyn RenderBackend>,
    settings: RhiSettings,

    rasterization: ResourcePool<GpuRasterizationState>,
    multisample: ResourcePool<GpuMultisampleState>,
    depth_stencil: ResourcePool<GpuDepthStencilState>,
    blend: ResourcePool<GpuBlendState>,
    binding_layouts: ResourcePool<ShaderBindingsLayout>,
    pipelines: ResourcePool<GpuPipelineState>,
    render_passes: ResourcePool<GpuRenderPass>,

    binding_allocator: BindingInstanceAllocator,
}

impl RhiRegistry {
    #[must_use]
    pub fn new(backend: Arc<dyn RenderBackend>, settings: RhiSettings) -> Self {
        Self {
            backend,
            settings,
            rasterization: ResourcePool::new("rasterization"),
            multisample: ResourcePool::new("multisample"),
            depth_stencil: ResourcePool::new("depth-stencil"),
            blend: ResourcePool::new("blend"),
            binding_layouts: ResourcePool::new("bindings-layout"),
            pipelines: ResourcePool::new("pipeline"),
            render_passes: ResourcePool::new("render-pass"),
            binding_allocator: BindingInstanceAllocator::new(settings.frames_in_flight),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn RenderBackend> {
        &self.backend
    }

    #[must_use]
    pub fn settings(&self) -> &RhiSettings {
        &self.settings
    }

    // ── State Descriptors ────────────────────────────────────────────────

    pub fn rasterization_state(
        &self,
        desc: &RasterizationState,
    ) -> Result<Arc<GpuRasterizationState>> {
        self.rasterization.get_or_create(desc.content_hash(), || {
            let native = self.backend.create_rasterization_state(desc)?;
            Ok(GpuState {
                desc: *desc,
                native,
            })
        })
    }

    pub fn multisample_state(&self, desc: &MultisampleState) -> Result<Arc<GpuMultisampleState>> {
        self.multisample.get_or_create(desc.content_hash(), || {
            let native = self.backend.create_multisample_state(desc)?;
            Ok(GpuState {
                desc: *desc,
                native,
            })
        })
    }

    pub fn depth_stencil_state(
        &self,
        desc: &DepthStencilState,
    ) -> Result<Arc<GpuDepthStencilState>> {
        self.depth_stencil.get_or_create(desc.content_hash(), || {
            let native = self.backend.create_depth_stencil_state(desc)?;
            Ok(GpuState {
                desc: *desc,
                native,
            })
        })
    }

    pub fn blend_state(&self, desc: &BlendState) -> Result<Arc<GpuBlendState>> {
        self.blend.get_or_create(desc.content_hash(), || {
            let native = self.backend.create_blend_state(desc)?;
            Ok(GpuState {
                desc: *desc,
                native,
            })
        })
    }

    // ── Well-Known Default States ────────────────────────────────────────
    // Named accessors for the common parameterizations; each flows through
    // the same pool as a hand-built descriptor and dedups with it.

    pub fn default_rasterization_state(&self) -> Result<Arc<GpuRasterizationState>> {
        self.rasterization_state(&RasterizationState::default())
    }

    pub fn default_depth_stencil_state(&self) -> Result<Arc<GpuDepthStencilState>> {
        self.depth_stencil_state(&DepthStencilState::default())
    }

    pub fn depth_read_only_state(&self) -> Result<Arc<GpuDepthStencilState>> {
        self.depth_stencil_state(&DepthStencilState::depth(CompareOp::Less, false))
    }

    pub fn opaque_blend_state(&self) -> Result<Arc<GpuBlendState>> {
        self.blend_state(&BlendState::opaque())
    }

    pub fn alpha_blend_state(&self) -> Result<Arc<GpuBlendState>> {
        self.blend_state(&BlendState::alpha_blending())
    }

    // ── Shader Bindings ──────────────────────────────────────────────────

    /// Deduplicated native binding-set layout for a binding array.
    ///
    /// Resources carried by the array are ignored: only slots, kinds and
    /// stage masks define layout identity. Pool sizing is frozen in from
    /// [`RhiSettings::max_concurrent_binding_sets`].
    pub fn shader_bindings_layout(
        &self,
        bindings: &ShaderBindingArray,
    ) -> Result<Arc<ShaderBindingsLayout>> {
        bindings.validate()?;
        let layout_only = bindings.as_layout_only();
        let hash = layout_only.layout_hash();

        self.binding_layouts.get_or_create(hash, || {
            let native = self.backend.create_shader_bindings_layout(&layout_only)?;
            let sizes =
                PoolSizes::from_bindings(&layout_only, self.settings.max_concurrent_binding_sets);
            Ok(ShaderBindingsLayout::new(layout_only, native, sizes, hash))
        })
    }

    /// Allocate a binding instance of `layout` with the given lifetime.
    pub fn create_binding_instance(
        &self,
        layout: &Arc<ShaderBindingsLayout>,
        lifetime: BindingLifetime,
    ) -> Result<ShaderBindingInstance> {
        self.binding_allocator
            .allocate(self.backend.as_ref(), layout, lifetime)
    }

    /// Explicitly free a multi-frame binding instance.
    pub fn free_binding_instance(&self, instance: ShaderBindingInstance) -> Result<()> {
        self.binding_allocator.free(self.backend.as_ref(), instance)
    }

    // ── Pipelines ────────────────────────────────────────────────────────

    /// Deduplicated realized pipeline for a composite description.
    ///
    /// On a miss the backend realizes the pipeline layout and the pipeline
    /// itself; both are owned by the returned entry. A backend failure
    /// leaves the pool unmodified.
    pub fn pipeline_state(&self, info: PipelineStateInfo) -> Result<Arc<GpuPipelineState>> {
        info.validate()?;
        let hash = info.content_hash();

        self.pipelines.get_or_create(hash, || {
            let native_binding_layouts: Vec<NativeBindingsLayout> = info
                .binding_layouts()
                .iter()
                .map(|l| l.native())
                .collect();
            let layout = self
                .backend
                .create_pipeline_layout(&native_binding_layouts, info.push_constants())?;

            let pipeline = match info.kind() {
                PipelineKind::Graphics => {
                    // validate() guarantees the graphics-only fields.
                    let (Some(fixed), Some(vertex_layout), Some(render_pass)) =
                        (info.fixed(), info.vertex_layout(), info.render_pass())
                    else {
                        return Err(crate::error::RhiError::InvalidDescriptor(
                            "graphics pipeline missing fixed state, vertex layout or render pass"
                                .into(),
                        ));
                    };
                    self.backend.create_graphics_pipeline(&GraphicsPipelineDesc {
                        label: info.label(),
                        fixed,
                        shader: info.shader(),
                        vertex_layout,
                        render_pass: render_pass.native(),
                        subpass: info.subpass(),
                        layout,
                    })?
                }
                PipelineKind::Compute => {
                    self.backend.create_compute_pipeline(&ComputePipelineDesc {
                        label: info.label(),
                        shader: info.shader(),
                        layout,
                    })?
                }
            };

            Ok(GpuPipelineState::new(info, pipeline, layout))
        })
    }

    // ── Render Passes ────────────────────────────────────────────────────

    /// Deduplicated render-pass/framebuffer pairing for a full description.
    pub fn render_pass(&self, desc: RenderPassDesc) -> Result<Arc<GpuRenderPass>> {
        desc.validate()?;
        let hash = desc.content_hash();

        self.render_passes.get_or_create(hash, || {
            let (native, framebuffer) = self.backend.create_render_pass(&desc)?;
            Ok(GpuRenderPass::new(desc, native, framebuffer))
        })
    }

    /// Color-only convenience form.
    pub fn get_or_create_render_pass(
        &self,
        color_attachments: impl IntoIterator<Item = Attachment>,
        offset: (i32, i32),
        extent: (u32, u32),
    ) -> Result<Arc<GpuRenderPass>> {
        self.render_pass(RenderPassDesc::new(color_attachments, offset, extent))
    }

    /// Color + depth convenience form.
    pub fn get_or_create_render_pass_with_depth(
        &self,
        color_attachments: impl IntoIterator<Item = Attachment>,
        depth_attachment: Attachment,
        offset: (i32, i32),
        extent: (u32, u32),
    ) -> Result<Arc<GpuRenderPass>> {
        self.render_pass(
            RenderPassDesc::new(color_attachments, offset, extent).with_depth(depth_attachment),
        )
    }

    // ── Frame & Recording ────────────────────────────────────────────────

    /// Advance to the next frame: reclaims the single-frame binding sets
    /// whose ring slot has cycled back around. Serial point — must not race
    /// with allocation or recording.
    pub fn begin_frame(&self) {
        self.binding_allocator.begin_frame(self.backend.as_ref());
    }

    /// Current absolute frame serial.
    #[must_use]
    pub fn frame_serial(&self) -> u64 {
        self.binding_allocator.frame_serial()
    }

    /// Start recording into `stream` for the current frame.
    #[must_use]
    pub fn begin_recording(&self, stream: CommandStream) -> RecordingContext {
        RecordingContext::new(Arc::clone(&self.backend), stream, self.frame_serial())
    }

    // ── Introspection & Teardown ─────────────────────────────────────────

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            rasterization: self.rasterization.stats(),
            multisample: self.multisample.stats(),
            depth_stencil: self.depth_stencil.stats(),
            blend: self.blend.stats(),
            binding_layouts: self.binding_layouts.stats(),
            pipelines: self.pipelines.stats(),
            render_passes: self.render_passes.stats(),
            persistent_binding_sets: self.binding_allocator.persistent_count(),
        }
    }

    /// Release a pipeline by its content hash, transferring ownership to
    /// the caller. A subsequent identical request constructs afresh.
    pub fn release_pipeline(&self, hash: crate::hash::ContentHash) -> Option<Arc<GpuPipelineState>> {
        self.pipelines.release(hash)
    }

    /// Release a render pass by its content hash.
    pub fn release_render_pass(&self, hash: crate::hash::ContentHash) -> Option<Arc<GpuRenderPass>> {
        self.render_passes.release(hash)
    }

    /// Tear down every pool, composites before the objects they reference.
    ///
    /// Only valid once no other thread is using the registry; entries still
    /// referenced by outstanding `Arc`s stay alive until those drop.
    pub fn shutdown(&self) {
        log::debug!("rhi registry shutdown");
        self.pipelines.release_all();
        self.render_passes.release_all();
        self.binding_allocator.release_all(self.backend.as_ref());
        self.binding_layouts.release_all();
        self.blend.release_all();
        self.depth_stencil.release_all();
        self.multisample.release_all();
        self.rasterization.release_all();
    }
}

impl std::fmt::Debug for RhiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhiRegistry")
            .field("settings", &self.settings)
            .field("stats", &self.stats())
            .finish()
    }
}
