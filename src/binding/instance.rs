//! Shader Binding Instances
//!
//! A [`ShaderBindingInstance`] is the live realization of a
//! [`ShaderBindingsLayout`] with concrete resources bound. Instances are
//! allocated from one of two pools, selected by [`BindingLifetime`]:
//!
//! - **Single-frame** — backed by a per-frame ring. Reclaimed automatically
//!   when the ring slot comes around again (`frames_in_flight` frames
//!   later); using one past its frame is a lifecycle violation.
//! - **Multi-frame** — backed by a persistent pool; must be explicitly
//!   freed with [`BindingInstanceAllocator::free`].
//!
//! An instance must be updated with resources
//! ([`ShaderBindingInstance::update`]) before it can be bound at draw or
//! dispatch time.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::RenderBackend;
use crate::error::{Result, RhiError};
use crate::handles::NativeBindingSet;

use super::layout::ShaderBindingsLayout;
use super::{ShaderBindingArray, coalesce_writes};

// ─── Lifetime Classes ─────────────────────────────────────────────────────────

/// Allocation strategy for a binding instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingLifetime {
    /// Ring-allocated; valid only for the frame it was allocated in.
    SingleFrame,
    /// Persistently allocated; freed explicitly.
    MultiFrame,
}

// ─── ShaderBindingInstance ────────────────────────────────────────────────────

/// A layout realized with concrete resources.
#[derive(Debug)]
pub struct ShaderBindingInstance {
    layout: Arc<ShaderBindingsLayout>,
    native: NativeBindingSet,
    lifetime: BindingLifetime,
    /// Absolute frame serial at allocation; bounds single-frame validity.
    frame_serial: u64,
    written: bool,
}

impl ShaderBindingInstance {
    /// Write concrete resources into the native set.
    ///
    /// `array` must match the instance's layout slot-for-slot and carry a
    /// resource on every binding. Same-kind bindings at contiguous slots
    /// collapse into one native write; the number of writes issued is
    /// returned.
    pub fn update(
        &mut self,
        backend: &dyn RenderBackend,
        array: &ShaderBindingArray,
    ) -> Result<usize> {
        if !self.layout.is_compatible(array) {
            return Err(RhiError::InvalidDescriptor(
                "binding array does not match the instance's layout".into(),
            ));
        }
        let writes = coalesce_writes(array)?;
        backend.write_binding_set(self.native, &writes)?;
        self.written = true;
        Ok(writes.len())
    }

    #[must_use]
    pub fn layout(&self) -> &Arc<ShaderBindingsLayout> {
        &self.layout
    }

    #[must_use]
    pub fn native(&self) -> NativeBindingSet {
        self.native
    }

    #[must_use]
    pub fn lifetime(&self) -> BindingLifetime {
        self.lifetime
    }

    /// Frame serial this instance was allocated in.
    #[must_use]
    pub fn frame_serial(&self) -> u64 {
        self.frame_serial
    }

    /// Whether [`update`](Self::update) has run. Binding an unwritten
    /// instance is a lifecycle violation.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.written
    }
}

// ─── Allocator ────────────────────────────────────────────────────────────────

struct AllocatorState {
    /// Absolute frame counter; never wraps in practice.
    frame_serial: u64,
    /// `ring[serial % frames_in_flight]` holds the single-frame sets to
    /// reclaim when that slot comes around again.
    ring: Vec<Vec<NativeBindingSet>>,
    /// Outstanding multi-frame sets, for shutdown accounting.
    persistent: Vec<NativeBindingSet>,
}

/// Allocates binding instances from the per-frame ring or the persistent
/// pool, and reclaims ring slots on frame advance.
pub struct BindingInstanceAllocator {
    state: Mutex<AllocatorState>,
}

impl BindingInstanceAllocator {
    #[must_use]
    pub fn new(frames_in_flight: u32) -> Self {
        let frames = frames_in_flight.max(1) as usize;
        Self {
            state: Mutex::new(AllocatorState {
                frame_serial: 0,
                ring: (0..frames).map(|_| Vec::new()).collect(),
                persistent: Vec::new(),
            }),
        }
    }

    /// Allocate one native binding set from the pool matching `lifetime`.
    ///
    /// The returned instance must be updated with resources before use.
    pub fn allocate(
        &self,
        backend: &dyn RenderBackend,
        layout: &Arc<ShaderBindingsLayout>,
        lifetime: BindingLifetime,
    ) -> Result<ShaderBindingInstance> {
        let native = backend.allocate_binding_set(layout.native(), layout.pool_sizes(), lifetime)?;

        let mut state = self.state.lock();
        let frame_serial = state.frame_serial;
        match lifetime {
            BindingLifetime::SingleFrame => {
                let frames = state.ring.len();
                let slot = (frame_serial % frames as u64) as usize;
                state.ring[slot].push(native);
            }
            BindingLifetime::MultiFrame => state.persistent.push(native),
        }

        Ok(ShaderBindingInstance {
            layout: Arc::clone(layout),
            native,
            lifetime,
            frame_serial,
            written: false,
        })
    }

    /// Explicitly free a multi-frame instance.
    ///
    /// Single-frame instances are reclaimed by the frame ring; freeing one
    /// here is a lifecycle violation.
    pub fn free(&self, backend: &dyn RenderBackend, instance: ShaderBindingInstance) -> Result<()> {
        if instance.lifetime != BindingLifetime::MultiFrame {
            debug_assert!(false, "explicit free of a single-frame binding instance");
            return Err(RhiError::LifecycleViolation(
                "single-frame binding instances are reclaimed by the frame ring".into(),
            ));
        }
        let mut state = self.state.lock();
        if let Some(pos) = state.persistent.iter().position(|&s| s == instance.native) {
            state.persistent.swap_remove(pos);
        }
        drop(state);
        backend.free_binding_set(instance.native);
        Ok(())
    }

    /// Advance to the next frame, reclaiming the single-frame sets whose
    /// ring slot has cycled back around.
    pub fn begin_frame(&self, backend: &dyn RenderBackend) {
        let mut state = self.state.lock();
        state.frame_serial += 1;
        let frames = state.ring.len();
        let slot = (state.frame_serial % frames as u64) as usize;
        let reclaimed = std::mem::take(&mut state.ring[slot]);
        drop(state);

        if !reclaimed.is_empty() {
            log::trace!("reclaiming {} single-frame binding sets", reclaimed.len());
        }
        for set in reclaimed {
            backend.free_binding_set(set);
        }
    }

    /// Current absolute frame serial.
    #[must_use]
    pub fn frame_serial(&self) -> u64 {
        self.state.lock().frame_serial
    }

    /// Number of outstanding multi-frame sets.
    #[must_use]
    pub fn persistent_count(&self) -> usize {
        self.state.lock().persistent.len()
    }

    /// Free every outstanding set. Only valid at shutdown.
    pub fn release_all(&self, backend: &dyn RenderBackend) {
        let mut state = self.state.lock();
        let ring: Vec<NativeBindingSet> = state.ring.iter_mut().flat_map(std::mem::take).collect();
        let persistent = std::mem::take(&mut state.persistent);
        drop(state);

        log::debug!(
            "binding allocator teardown: {} ring sets, {} persistent sets",
            ring.len(),
            persistent.len()
        );
        for set in ring.into_iter().chain(persistent) {
            backend.free_binding_set(set);
        }
    }
}
