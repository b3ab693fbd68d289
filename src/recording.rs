//! Recording Context
//!
//! Per-command-stream state for the small slice of command recording this
//! subsystem owns: render-pass bracketing, pipeline binds and binding-set
//! binds. The surrounding renderer guarantees that one command stream is
//! recorded by one thread at a time; the context's `&mut self` methods
//! encode that discipline, while the caches it reads from stay fully
//! thread-safe.
//!
//! # Enforced Discipline
//!
//! - `begin_render_pass` / `end_render_pass` must be strictly paired; a
//!   stray end or a nested begin is a [`LifecycleViolation`].
//! - Binding an instance requires it to have been updated with resources,
//!   and a single-frame instance must still belong to the current frame.
//! - Re-binding the already-current pipeline is elided — no backend call,
//!   no allocation.
//!
//! [`LifecycleViolation`]: crate::error::RhiError::LifecycleViolation

use std::sync::Arc;

use crate::backend::RenderBackend;
use crate::binding::{BindingLifetime, ShaderBindingInstance};
use crate::error::{Result, RhiError};
use crate::handles::{CommandStream, NativePipeline, NativeRenderPass};
use crate::pipeline::GpuPipelineState;
use crate::renderpass::GpuRenderPass;

/// Recording state for one command stream during one frame.
pub struct RecordingContext {
    backend: Arc<dyn RenderBackend>,
    stream: CommandStream,
    /// Frame serial this context records for; bounds single-frame binding
    /// instance validity.
    frame_serial: u64,
    active_pass: Option<NativeRenderPass>,
    bound_pipeline: Option<NativePipeline>,
}

impl RecordingContext {
    #[must_use]
    pub(crate) fn new(
        backend: Arc<dyn RenderBackend>,
        stream: CommandStream,
        frame_serial: u64,
    ) -> Self {
        Self {
            backend,
            stream,
            frame_serial,
            active_pass: None,
            bound_pipeline: None,
        }
    }

    #[must_use]
    pub fn stream(&self) -> CommandStream {
        self.stream
    }

    #[must_use]
    pub fn frame_serial(&self) -> u64 {
        self.frame_serial
    }

    /// Begin recording into `pass`. Passes never nest.
    pub fn begin_render_pass(&mut self, pass: &GpuRenderPass) -> Result<()> {
        if self.active_pass.is_some() {
            debug_assert!(false, "begin_render_pass inside an open render pass");
            return Err(RhiError::LifecycleViolation(
                "begin_render_pass while a render pass is already open".into(),
            ));
        }
        self.backend
            .cmd_begin_render_pass(self.stream, pass.native(), pass.framebuffer());
        self.active_pass = Some(pass.native());
        Ok(())
    }

    /// End the open render pass. Must match a prior begin.
    pub fn end_render_pass(&mut self) -> Result<()> {
        if self.active_pass.take().is_none() {
            debug_assert!(false, "end_render_pass without an open render pass");
            return Err(RhiError::LifecycleViolation(
                "end_render_pass without a matching begin".into(),
            ));
        }
        self.backend.cmd_end_render_pass(self.stream);
        Ok(())
    }

    /// Make `pipeline` current for subsequent draws/dispatches.
    ///
    /// Performs no allocation and no cache traffic; re-binding the current
    /// pipeline is skipped entirely.
    pub fn bind_pipeline(&mut self, pipeline: &GpuPipelineState) {
        let native = pipeline.native_pipeline();
        if self.bound_pipeline == Some(native) {
            return;
        }
        self.backend
            .cmd_bind_pipeline(self.stream, pipeline.kind(), native);
        self.bound_pipeline = Some(native);
    }

    /// Bind a binding instance at `slot` for the pipeline's kind.
    pub fn bind_bindings(
        &mut self,
        pipeline: &GpuPipelineState,
        slot: u32,
        instance: &ShaderBindingInstance,
    ) -> Result<()> {
        if !instance.is_written() {
            debug_assert!(false, "binding instance bound before update");
            return Err(RhiError::LifecycleViolation(
                "binding instance was never updated with resources".into(),
            ));
        }
        if instance.lifetime() == BindingLifetime::SingleFrame
            && instance.frame_serial() != self.frame_serial
        {
            debug_assert!(false, "single-frame binding instance crossed a frame boundary");
            return Err(RhiError::LifecycleViolation(
                "single-frame binding instance used outside its frame".into(),
            ));
        }
        self.backend.cmd_bind_binding_set(
            self.stream,
            pipeline.kind(),
            pipeline.native_layout(),
            slot,
            instance.native(),
        );
        Ok(())
    }

    /// Finish recording, verifying pairing: an open render pass at this
    /// point is a caller bug.
    pub fn finish(self) -> Result<()> {
        if let Some(pass) = self.active_pass {
            debug_assert!(false, "recording finished with render pass {pass:?} open");
            return Err(RhiError::LifecycleViolation(
                "recording finished with an open render pass".into(),
            ));
        }
        Ok(())
    }
}
