//! RHI Settings
//!
//! Configuration for the cache layer, fixed at registry construction.
//! Values are frozen into derived objects where noted — changing a setting
//! requires rebuilding the registry.

/// Configuration for [`RhiRegistry`] construction.
///
/// [`RhiRegistry`]: crate::registry::RhiRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RhiSettings {
    /// Number of frames that may be in flight simultaneously.
    ///
    /// Sizes the single-frame binding-instance ring: a ring slot is
    /// reclaimed `frames_in_flight` frames after its allocations were made,
    /// once the GPU can no longer be reading them.
    pub frames_in_flight: u32,

    /// Maximum number of binding sets concurrently live per layout.
    ///
    /// Drives descriptor pool sizing: each layout's pool holds
    /// `per-kind binding count × max_concurrent_binding_sets` descriptors.
    /// Frozen into the layout at creation time.
    pub max_concurrent_binding_sets: u32,
}

impl Default for RhiSettings {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            max_concurrent_binding_sets: 128,
        }
    }
}
