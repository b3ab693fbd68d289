//! Shader Bindings Layout
//!
//! A [`ShaderBindingsLayout`] is the pooled realization of a resource-free
//! [`ShaderBindingArray`]: a deduplicated native descriptor-set layout plus
//! the allocation-pool sizing derived from it.
//!
//! Pool sizing follows the per-kind formula: for each binding kind, the
//! descriptor count is the number of bindings of that kind in the layout
//! multiplied by the maximum number of concurrently live binding sets
//! (from [`RhiSettings`]). Sizing is frozen into the layout at creation
//! time.
//!
//! [`RhiSettings`]: crate::settings::RhiSettings

use crate::handles::NativeBindingsLayout;
use crate::hash::ContentHash;

use super::{ShaderBindingArray, ShaderBindingKind};

// ─── PoolSizes ────────────────────────────────────────────────────────────────

/// Per-kind descriptor counts for the allocation pool backing a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSizes {
    counts: [u32; ShaderBindingKind::COUNT],
    /// Maximum number of binding sets live at once from this pool.
    max_sets: u32,
}

impl PoolSizes {
    /// Derive sizing from a binding array: per-kind count × `max_sets`.
    #[must_use]
    pub fn from_bindings(bindings: &ShaderBindingArray, max_sets: u32) -> Self {
        let mut counts = [0u32; ShaderBindingKind::COUNT];
        for binding in bindings {
            counts[binding.kind.index()] += max_sets;
        }
        Self { counts, max_sets }
    }

    /// Total descriptors of `kind` across all `max_sets` slots.
    #[must_use]
    pub const fn count(&self, kind: ShaderBindingKind) -> u32 {
        self.counts[kind.index()]
    }

    /// Descriptors of `kind` in a single set.
    #[must_use]
    pub const fn count_per_set(&self, kind: ShaderBindingKind) -> u32 {
        if self.max_sets == 0 {
            0
        } else {
            self.counts[kind.index()] / self.max_sets
        }
    }

    #[must_use]
    pub const fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

// ─── ShaderBindingsLayout ─────────────────────────────────────────────────────

/// Pooled, deduplicated binding-set layout.
///
/// Owned by the registry's layout pool; composites (pipelines, instances)
/// hold `Arc` references to it. Immutable after creation.
#[derive(Debug)]
pub struct ShaderBindingsLayout {
    bindings: ShaderBindingArray,
    native: NativeBindingsLayout,
    pool_sizes: PoolSizes,
    hash: ContentHash,
}

impl ShaderBindingsLayout {
    /// Assemble a realized layout. Called by the registry on a pool miss;
    /// `bindings` must already be validated and resource-free.
    #[must_use]
    pub(crate) fn new(
        bindings: ShaderBindingArray,
        native: NativeBindingsLayout,
        pool_sizes: PoolSizes,
        hash: ContentHash,
    ) -> Self {
        Self {
            bindings,
            native,
            pool_sizes,
            hash,
        }
    }

    /// The layout-only binding declarations this layout was built from.
    #[must_use]
    pub fn bindings(&self) -> &ShaderBindingArray {
        &self.bindings
    }

    #[must_use]
    pub fn native(&self) -> NativeBindingsLayout {
        self.native
    }

    #[must_use]
    pub fn pool_sizes(&self) -> &PoolSizes {
        &self.pool_sizes
    }

    /// The hash this layout is pooled under.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.hash
    }

    /// Whether `array` has the same slots, kinds and stages as this layout,
    /// in the same order. Used to validate instance updates.
    #[must_use]
    pub fn is_compatible(&self, array: &ShaderBindingArray) -> bool {
        self.bindings.len() == array.len()
            && self
                .bindings
                .iter()
                .zip(array)
                .all(|(a, b)| a.slot == b.slot && a.kind == b.kind && a.stages == b.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ShaderBinding, StageFlags};

    #[test]
    fn pool_sizes_follow_per_kind_formula() {
        let array: ShaderBindingArray = [
            ShaderBinding::layout_only(0, ShaderBindingKind::UniformBuffer, StageFlags::VERTEX),
            ShaderBinding::layout_only(1, ShaderBindingKind::SampledTexture, StageFlags::FRAGMENT),
            ShaderBinding::layout_only(2, ShaderBindingKind::SampledTexture, StageFlags::FRAGMENT),
        ]
        .into_iter()
        .collect();

        let sizes = PoolSizes::from_bindings(&array, 16);
        assert_eq!(sizes.count(ShaderBindingKind::UniformBuffer), 16);
        assert_eq!(sizes.count(ShaderBindingKind::SampledTexture), 32);
        assert_eq!(sizes.count(ShaderBindingKind::StorageBuffer), 0);
        assert_eq!(sizes.count_per_set(ShaderBindingKind::SampledTexture), 2);
        assert_eq!(sizes.max_sets(), 16);
    }
}
