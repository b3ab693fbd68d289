//! Shader Bindings
//!
//! Backend-neutral description of "which slot, what resource kind, which
//! pipeline stages may access it".
//!
//! A [`ShaderBinding`] *without* a resource is a layout-only description —
//! the unit of deduplication for native descriptor-set layouts. A binding
//! *with* a resource belongs to a binding *instance* (see
//! [`instance::ShaderBindingInstance`]): the live, resource-bound
//! realization, which is shorter-lived than the layout it was allocated
//! from.
//!
//! The layout hash therefore covers `(slot, kind, stages)` only; bound
//! resources never affect layout identity.

pub mod instance;
pub mod layout;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::error::{Result, RhiError};
use crate::handles::{BufferHandle, SamplerHandle, TextureHandle};
use crate::hash::{ContentHash, combine, hash_value};

pub use instance::{BindingInstanceAllocator, BindingLifetime, ShaderBindingInstance};
pub use layout::{PoolSizes, ShaderBindingsLayout};

// ─── Binding Kinds & Stages ───────────────────────────────────────────────────

/// What kind of resource a binding slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderBindingKind {
    UniformBuffer,
    StorageBuffer,
    SampledTexture,
    StorageImage,
    InputAttachment,
}

impl ShaderBindingKind {
    /// Number of distinct kinds; sizes the per-kind pool table.
    pub const COUNT: usize = 5;

    /// Dense index for per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::UniformBuffer => 0,
            Self::StorageBuffer => 1,
            Self::SampledTexture => 2,
            Self::StorageImage => 3,
            Self::InputAttachment => 4,
        }
    }

    /// Whether this kind is backed by a buffer resource.
    #[must_use]
    pub const fn is_buffer(self) -> bool {
        matches!(self, Self::UniformBuffer | Self::StorageBuffer)
    }
}

bitflags! {
    /// Pipeline stages that may access a binding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StageFlags: u8 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
        const ALL_GRAPHICS = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        const ALL = Self::ALL_GRAPHICS.bits() | Self::COMPUTE.bits();
    }
}

// ─── Bound Resources ──────────────────────────────────────────────────────────

/// A concrete resource bound into a binding slot.
///
/// Handles are owned by external collaborators; this crate only forwards
/// them to the backend's write calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingResource {
    Buffer {
        buffer: BufferHandle,
        offset: u64,
        /// `None` = bind the whole remaining range.
        size: Option<u64>,
    },
    Texture {
        texture: TextureHandle,
        /// Sampler for sampled-texture bindings; `None` for storage images
        /// and input attachments.
        sampler: Option<SamplerHandle>,
    },
}

impl BindingResource {
    /// Whether this resource can satisfy a binding of `kind`.
    #[must_use]
    pub const fn matches_kind(&self, kind: ShaderBindingKind) -> bool {
        match self {
            Self::Buffer { .. } => kind.is_buffer(),
            Self::Texture { .. } => !kind.is_buffer(),
        }
    }
}

// ─── ShaderBinding ────────────────────────────────────────────────────────────

/// One binding slot declaration, optionally carrying a bound resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderBinding {
    pub slot: u32,
    pub kind: ShaderBindingKind,
    pub stages: StageFlags,
    pub resource: Option<BindingResource>,
}

impl ShaderBinding {
    /// A layout-only binding (no resource).
    #[must_use]
    pub const fn layout_only(slot: u32, kind: ShaderBindingKind, stages: StageFlags) -> Self {
        Self {
            slot,
            kind,
            stages,
            resource: None,
        }
    }

    /// A binding with a concrete resource, for instance updates.
    #[must_use]
    pub const fn with_resource(
        slot: u32,
        kind: ShaderBindingKind,
        stages: StageFlags,
        resource: BindingResource,
    ) -> Self {
        Self {
            slot,
            kind,
            stages,
            resource: Some(resource),
        }
    }

    /// Hash of the layout-relevant fields only. Bound resources do not
    /// participate in layout identity.
    #[must_use]
    pub fn layout_hash(&self) -> ContentHash {
        hash_value(&(self.slot, self.kind, self.stages))
    }

    /// Copy of this binding with the resource stripped.
    #[must_use]
    pub const fn as_layout_only(&self) -> Self {
        Self::layout_only(self.slot, self.kind, self.stages)
    }
}

// ─── ShaderBindingArray ───────────────────────────────────────────────────────

/// Ordered, fixed-capacity collection of bindings.
///
/// The hash is an order-sensitive combination of each binding's layout
/// hash: `[A, B]` and `[B, A]` are different layouts.
#[derive(Debug, Clone, Default)]
pub struct ShaderBindingArray {
    bindings: SmallVec<[ShaderBinding; 8]>,
}

impl ShaderBindingArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, binding: ShaderBinding) {
        self.bindings.push(binding);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShaderBinding> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ShaderBinding] {
        &self.bindings
    }

    /// Order-sensitive layout hash over all bindings.
    #[must_use]
    pub fn layout_hash(&self) -> ContentHash {
        self.bindings
            .iter()
            .fold(hash_value(&self.bindings.len()), |acc, b| {
                combine(acc, b.layout_hash())
            })
    }

    /// Copy with every resource stripped; this is what layouts are built
    /// from.
    #[must_use]
    pub fn as_layout_only(&self) -> Self {
        Self {
            bindings: self.bindings.iter().map(ShaderBinding::as_layout_only).collect(),
        }
    }

    /// Number of bindings of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: ShaderBindingKind) -> u32 {
        self.bindings.iter().filter(|b| b.kind == kind).count() as u32
    }

    /// Reject malformed arrays before any backend call: empty arrays and
    /// duplicate slots are contract violations.
    pub fn validate(&self) -> Result<()> {
        if self.bindings.is_empty() {
            return Err(RhiError::InvalidDescriptor(
                "shader binding array is empty".into(),
            ));
        }
        for (i, a) in self.bindings.iter().enumerate() {
            for b in &self.bindings[i + 1..] {
                if a.slot == b.slot {
                    return Err(RhiError::InvalidDescriptor(format!(
                        "duplicate binding slot {}",
                        a.slot
                    )));
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<ShaderBinding> for ShaderBindingArray {
    fn from_iter<I: IntoIterator<Item = ShaderBinding>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ShaderBindingArray {
    type Item = &'a ShaderBinding;
    type IntoIter = std::slice::Iter<'a, ShaderBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

// ─── Write Coalescing ─────────────────────────────────────────────────────────

/// One native write batch: a run of same-kind bindings at contiguous slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingWrite {
    pub first_slot: u32,
    pub kind: ShaderBindingKind,
    pub resources: SmallVec<[BindingResource; 4]>,
}

/// Collapse a resource-carrying binding array into the minimum number of
/// native write operations by grouping same-kind bindings at contiguous
/// slots.
///
/// Every binding must carry a resource matching its kind.
pub fn coalesce_writes(array: &ShaderBindingArray) -> Result<SmallVec<[BindingWrite; 4]>> {
    let mut writes: SmallVec<[BindingWrite; 4]> = SmallVec::new();

    for binding in array {
        let Some(resource) = binding.resource else {
            return Err(RhiError::InvalidDescriptor(format!(
                "binding slot {} has no resource bound",
                binding.slot
            )));
        };
        if !resource.matches_kind(binding.kind) {
            return Err(RhiError::InvalidDescriptor(format!(
                "binding slot {} resource does not match kind {:?}",
                binding.slot, binding.kind
            )));
        }

        match writes.last_mut() {
            Some(run)
                if run.kind == binding.kind
                    && run.first_slot + run.resources.len() as u32 == binding.slot =>
            {
                run.resources.push(resource);
            }
            _ => writes.push(BindingWrite {
                first_slot: binding.slot,
                kind: binding.kind,
                resources: smallvec::smallvec![resource],
            }),
        }
    }

    Ok(writes)
}
