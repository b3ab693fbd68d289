//! Render Pass Descriptions & Cache Objects
//!
//! An [`Attachment`] describes one render target's role in a pass: format,
//! load/store behavior for color and stencil, clear value, and the layout
//! transition across the pass. A [`RenderPassDesc`] aggregates the color /
//! depth / resolve attachments plus the render area, and hashes the whole
//! description so that identical attachment sets collapse to one cached
//! native render-pass/framebuffer pairing ([`GpuRenderPass`]).
//!
//! Begin/end bracketing lives on the recording context
//! ([`RecordingContext`]), which enforces strict pairing.
//!
//! [`RecordingContext`]: crate::recording::RecordingContext

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::handles::{NativeFramebuffer, NativeRenderPass, RenderTargetHandle};
use crate::hash::{ContentHash, HashCell, combine, combine_indexed, hash_value};

// ─── Formats & Ops ────────────────────────────────────────────────────────────

/// Texture formats this subsystem needs to distinguish for attachment and
/// pipeline identity. Backend-neutral; each backend maps these to its own
/// format enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rg16Float,
    Rgba16Float,
    Rgba32Float,
    Depth16Unorm,
    Depth32Float,
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Whether this is a depth or depth/stencil format.
    #[must_use]
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            Self::Depth16Unorm | Self::Depth32Float | Self::Depth24PlusStencil8
        )
    }
}

/// What happens to an attachment's contents at pass begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentLoadOp {
    Load,
    #[default]
    Clear,
    DontCare,
}

/// What happens to an attachment's contents at pass end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentStoreOp {
    #[default]
    Store,
    DontCare,
}

/// Image layout an attachment is in before/after the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    #[default]
    Undefined,
    ColorAttachment,
    DepthStencilAttachment,
    ShaderReadOnly,
    Present,
    General,
}

/// Clear value applied when the load op is `Clear`. Hashed bit-exact.
#[derive(Debug, Clone, Copy)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

impl ClearValue {
    pub const TRANSPARENT: Self = Self::Color([0.0, 0.0, 0.0, 0.0]);
    pub const DEPTH_ONE: Self = Self::DepthStencil {
        depth: 1.0,
        stencil: 0,
    };
}

impl PartialEq for ClearValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Color(a), Self::Color(b)) => {
                a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (
                Self::DepthStencil {
                    depth: da,
                    stencil: sa,
                },
                Self::DepthStencil {
                    depth: db,
                    stencil: sb,
                },
            ) => da.to_bits() == db.to_bits() && sa == sb,
            _ => false,
        }
    }
}

impl Eq for ClearValue {}

impl Hash for ClearValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Color(c) => {
                state.write_u8(0);
                for v in c {
                    state.write_u32(v.to_bits());
                }
            }
            Self::DepthStencil { depth, stencil } => {
                state.write_u8(1);
                state.write_u32(depth.to_bits());
                state.write_u32(*stencil);
            }
        }
    }
}

// ─── Attachment ───────────────────────────────────────────────────────────────

/// One render target's role in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
    pub target: RenderTargetHandle,
    pub format: TextureFormat,
    pub sample_count: u32,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub stencil_load_op: AttachmentLoadOp,
    pub stencil_store_op: AttachmentStoreOp,
    pub clear_value: ClearValue,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

impl Attachment {
    /// Cleared, stored color attachment ending in `ColorAttachment` layout.
    #[must_use]
    pub fn color(target: RenderTargetHandle, format: TextureFormat, clear: [f32; 4]) -> Self {
        Self {
            target,
            format,
            sample_count: 1,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            stencil_load_op: AttachmentLoadOp::DontCare,
            stencil_store_op: AttachmentStoreOp::DontCare,
            clear_value: ClearValue::Color(clear),
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ColorAttachment,
        }
    }

    /// Cleared, stored depth attachment.
    #[must_use]
    pub fn depth(target: RenderTargetHandle, format: TextureFormat) -> Self {
        Self {
            target,
            format,
            sample_count: 1,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            stencil_load_op: AttachmentLoadOp::DontCare,
            stencil_store_op: AttachmentStoreOp::DontCare,
            clear_value: ClearValue::DEPTH_ONE,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        }
    }

    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        hash_value(self)
    }
}

// ─── RenderPassDesc ───────────────────────────────────────────────────────────

/// Full description of a render pass: attachments plus render area.
///
/// The hash combines all color attachments (index-salted), the depth and
/// resolve attachments, and the render offset/extent.
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    color_attachments: SmallVec<[Attachment; 4]>,
    depth_attachment: Option<Attachment>,
    resolve_attachment: Option<Attachment>,
    offset: (i32, i32),
    extent: (u32, u32),
    hash: HashCell,
}

impl RenderPassDesc {
    #[must_use]
    pub fn new(
        color_attachments: impl IntoIterator<Item = Attachment>,
        offset: (i32, i32),
        extent: (u32, u32),
    ) -> Self {
        Self {
            color_attachments: color_attachments.into_iter().collect(),
            depth_attachment: None,
            resolve_attachment: None,
            offset,
            extent,
            hash: HashCell::new(),
        }
    }

    #[must_use]
    pub fn with_depth(mut self, attachment: Attachment) -> Self {
        self.depth_attachment = Some(attachment);
        self.hash = HashCell::new();
        self
    }

    #[must_use]
    pub fn with_resolve(mut self, attachment: Attachment) -> Self {
        self.resolve_attachment = Some(attachment);
        self.hash = HashCell::new();
        self
    }

    #[must_use]
    pub fn color_attachments(&self) -> &[Attachment] {
        &self.color_attachments
    }

    #[must_use]
    pub fn depth_attachment(&self) -> Option<&Attachment> {
        self.depth_attachment.as_ref()
    }

    #[must_use]
    pub fn resolve_attachment(&self) -> Option<&Attachment> {
        self.resolve_attachment.as_ref()
    }

    #[must_use]
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    /// Memoized hash of the full attachment description.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.hash.get_or_compute(|| {
            let mut h = hash_value(&self.color_attachments.len());
            for (i, a) in self.color_attachments.iter().enumerate() {
                h = combine(h, combine_indexed(a.content_hash(), i));
            }
            h = combine(h, hash_value(&self.depth_attachment));
            h = combine(h, hash_value(&self.resolve_attachment));
            h = combine(h, hash_value(&self.offset));
            combine(h, hash_value(&self.extent))
        })
    }

    /// Reject malformed descriptions before any backend call.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.color_attachments.is_empty() && self.depth_attachment.is_none() {
            return Err(crate::error::RhiError::InvalidDescriptor(
                "render pass has no attachments".into(),
            ));
        }
        if self.extent.0 == 0 || self.extent.1 == 0 {
            return Err(crate::error::RhiError::InvalidDescriptor(
                "render pass extent is zero".into(),
            ));
        }
        if let Some(depth) = &self.depth_attachment {
            if !depth.format.is_depth() {
                return Err(crate::error::RhiError::InvalidDescriptor(
                    "depth attachment has a color format".into(),
                ));
            }
        }
        Ok(())
    }
}

// ─── GpuRenderPass ────────────────────────────────────────────────────────────

/// Cached native render-pass/framebuffer pairing, owned by the registry's
/// render-pass pool.
#[derive(Debug)]
pub struct GpuRenderPass {
    desc: RenderPassDesc,
    native: NativeRenderPass,
    framebuffer: NativeFramebuffer,
}

impl GpuRenderPass {
    #[must_use]
    pub(crate) fn new(
        desc: RenderPassDesc,
        native: NativeRenderPass,
        framebuffer: NativeFramebuffer,
    ) -> Self {
        Self {
            desc,
            native,
            framebuffer,
        }
    }

    #[must_use]
    pub fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    #[must_use]
    pub fn native(&self) -> NativeRenderPass {
        self.native
    }

    #[must_use]
    pub fn framebuffer(&self) -> NativeFramebuffer {
        self.framebuffer
    }

    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.desc.content_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(clear: [f32; 4]) -> RenderPassDesc {
        RenderPassDesc::new(
            [Attachment::color(
                RenderTargetHandle(1),
                TextureFormat::Rgba8Unorm,
                clear,
            )],
            (0, 0),
            (1920, 1080),
        )
    }

    #[test]
    fn identical_descriptions_hash_equal() {
        assert_eq!(
            pass([0.0; 4]).content_hash(),
            pass([0.0; 4]).content_hash()
        );
    }

    #[test]
    fn clear_value_changes_hash() {
        assert_ne!(
            pass([0.0; 4]).content_hash(),
            pass([1.0, 0.0, 0.0, 1.0]).content_hash()
        );
    }

    #[test]
    fn attachment_order_changes_hash() {
        let a = Attachment::color(RenderTargetHandle(1), TextureFormat::Rgba8Unorm, [0.0; 4]);
        let b = Attachment::color(RenderTargetHandle(2), TextureFormat::Rgba16Float, [0.0; 4]);

        let ab = RenderPassDesc::new([a, b], (0, 0), (64, 64));
        let ba = RenderPassDesc::new([b, a], (0, 0), (64, 64));
        assert_ne!(ab.content_hash(), ba.content_hash());
    }

    #[test]
    fn depth_attachment_changes_hash() {
        let base = pass([0.0; 4]);
        let with_depth = pass([0.0; 4]).with_depth(Attachment::depth(
            RenderTargetHandle(9),
            TextureFormat::Depth32Float,
        ));
        assert_ne!(base.content_hash(), with_depth.content_hash());
    }

    #[test]
    fn validate_rejects_empty_and_bad_formats() {
        let empty = RenderPassDesc::new([], (0, 0), (64, 64));
        assert!(empty.validate().is_err());

        let zero_extent = pass([0.0; 4]);
        let zero_extent = RenderPassDesc::new(
            zero_extent.color_attachments().iter().copied(),
            (0, 0),
            (0, 0),
        );
        assert!(zero_extent.validate().is_err());

        let bad_depth = pass([0.0; 4]).with_depth(Attachment::depth(
            RenderTargetHandle(9),
            TextureFormat::Rgba8Unorm,
        ));
        assert!(bad_depth.validate().is_err());
    }
}
