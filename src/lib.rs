//! # glint-rhi
//!
//! Resource-deduplication and pipeline-composition layer of the Glint
//! engine's hardware abstraction layer.
//!
//! Given a description of a GPU object — rasterization mode, blend mode,
//! binding layout, render pass attachments, full pipeline state — this
//! crate returns a single live native object representing that exact
//! configuration: created on first request, reused on every subsequent
//! identical request, across concurrent setup threads.
//!
//! Three pieces make that work:
//!
//! - the generic content-addressable [`ResourcePool`] (hash → pooled
//!   object, thread-safe lazy creation),
//! - the hash-composition protocol in [`hash`] that lets composite state
//!   (pipeline = rasterizer × multisample × depth-stencil × blend × vertex
//!   layout × shader × render pass × bindings) deduplicate correctly, and
//! - the shader-binding abstraction in [`binding`] that turns a
//!   backend-neutral "slot → resource" list into backend descriptor
//!   objects with correct lifetime and pool sizing.
//!
//! Backends implement the [`RenderBackend`] capability trait; the cache
//! layer itself is backend-agnostic. The [`RhiRegistry`] is the explicitly
//! owned entry point — there is no global state.
//!
//! ```rust
//! use std::sync::Arc;
//! use glint_rhi::{HeadlessBackend, RhiRegistry, RhiSettings, RasterizationState};
//!
//! let registry = RhiRegistry::new(Arc::new(HeadlessBackend::new()), RhiSettings::default());
//! let a = registry.rasterization_state(&RasterizationState::default()).unwrap();
//! let b = registry.rasterization_state(&RasterizationState::default()).unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

pub mod backend;
pub mod binding;
pub mod error;
pub mod handles;
pub mod hash;
pub mod pipeline;
pub mod pool;
pub mod recording;
pub mod registry;
pub mod renderpass;
pub mod settings;
pub mod states;

pub use backend::{ComputePipelineDesc, GraphicsPipelineDesc, HeadlessBackend, RenderBackend};
pub use binding::{
    BindingLifetime, BindingResource, BindingWrite, PoolSizes, ShaderBinding, ShaderBindingArray,
    ShaderBindingInstance, ShaderBindingKind, ShaderBindingsLayout, StageFlags,
};
pub use error::{Result, RhiError};
pub use handles::{
    BufferHandle, CommandStream, RenderTargetHandle, SamplerHandle, ShaderHandle, TextureHandle,
};
pub use hash::{ContentHash, HashCell, Hashed};
pub use pipeline::{
    GpuPipelineState, PipelineKind, PipelineStateFixedInfo, PipelineStateInfo, PushConstantRange,
    Scissor, VertexAttribute, VertexBufferBinding, VertexFormat, VertexLayout, VertexStepMode,
    Viewport,
};
pub use pool::{PoolStats, ResourcePool};
pub use recording::RecordingContext;
pub use registry::{
    GpuBlendState, GpuDepthStencilState, GpuMultisampleState, GpuRasterizationState, GpuState,
    RegistryStats, RhiRegistry,
};
pub use renderpass::{
    Attachment, AttachmentLoadOp, AttachmentStoreOp, ClearValue, GpuRenderPass, ImageLayout,
    RenderPassDesc, TextureFormat,
};
pub use settings::RhiSettings;
pub use states::{
    BlendFactor, BlendOp, BlendState, ColorWriteMask, CompareOp, CullMode, DepthStencilState,
    FrontFace, MultisampleState, PolygonMode, RasterizationState, StencilOp, StencilOpState,
};
