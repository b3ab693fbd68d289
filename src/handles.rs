//! Opaque Handles
//!
//! Lightweight typed handles exchanged across the RHI seam.
//!
//! Two families live here:
//!
//! - **Collaborator handles** (`BufferHandle`, `TextureHandle`, …) identify
//!   resources owned by external subsystems (buffer/texture upload, shader
//!   loading, swapchain). This crate never dereferences them; it only hashes
//!   and forwards them.
//! - **Native handles** (`NativePipeline`, `NativeRenderPass`, …) identify
//!   driver objects minted by the active [`RenderBackend`]. The backend owns
//!   the underlying storage and reclaims it when the backend itself is torn
//!   down; the pools own the *entries* that reference them.
//!
//! All handles are plain 64-bit ids: cheap to copy, hash and compare, and
//! meaningless outside the subsystem that minted them.
//!
//! [`RenderBackend`]: crate::backend::RenderBackend

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

// ─── Collaborator Handles ─────────────────────────────────────────────────────

define_handle!(
    /// A GPU buffer owned by the buffer-upload collaborator.
    BufferHandle
);
define_handle!(
    /// A GPU texture owned by the texture-upload collaborator.
    TextureHandle
);
define_handle!(
    /// A sampler object owned by the texture collaborator.
    SamplerHandle
);
define_handle!(
    /// A compiled shader program owned by the shader-loading collaborator.
    ShaderHandle
);
define_handle!(
    /// A render target surface (color/depth image) owned by the swapchain
    /// or render-target collaborator.
    RenderTargetHandle
);
define_handle!(
    /// A command stream (command buffer) owned by the command-recording
    /// collaborator. Recording into one stream is single-threaded by
    /// contract.
    CommandStream
);

// ─── Native Handles ───────────────────────────────────────────────────────────

define_handle!(
    /// Backend rasterization state object.
    NativeRasterizerState
);
define_handle!(
    /// Backend multisample state object.
    NativeMultisampleState
);
define_handle!(
    /// Backend depth/stencil state object.
    NativeDepthStencilState
);
define_handle!(
    /// Backend blend state object.
    NativeBlendState
);
define_handle!(
    /// Backend descriptor-set layout realized from a resource-free binding
    /// array.
    NativeBindingsLayout
);
define_handle!(
    /// One allocated descriptor set (a binding instance's backing object).
    NativeBindingSet
);
define_handle!(
    /// Backend pipeline-layout object (binding layouts + push constants).
    NativePipelineLayout
);
define_handle!(
    /// Backend graphics or compute pipeline object.
    NativePipeline
);
define_handle!(
    /// Backend render-pass object.
    NativeRenderPass
);
define_handle!(
    /// Backend framebuffer paired with a render pass.
    NativeFramebuffer
);
