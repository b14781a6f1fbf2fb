/// Native render pass object and its description

use std::any::Any;
use crate::graphics_device::{ImageLayout, SampleCount, TextureFormat};

/// Attachment index meaning "no attachment in this slot"
pub const ATTACHMENT_UNUSED: u32 = u32::MAX;

/// What happens to attachment contents when the render pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadAction {
    DontCare,
    Load,
    Clear,
}

/// What happens to attachment contents when the render pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    DontCare,
    Store,
    /// Resolve into the resolve texture, discard the multisample contents
    MultisampleResolve,
    /// Resolve into the resolve texture and keep the multisample contents
    StoreAndMultisampleResolve,
}

/// Role of an attachment inside the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Color,
    Depth,
    Stencil,
}

impl AttachmentKind {
    /// Layout the attachment is held in for the duration of the pass
    pub fn attachment_layout(&self) -> ImageLayout {
        match self {
            AttachmentKind::Color => ImageLayout::ColorAttachment,
            AttachmentKind::Depth => ImageLayout::DepthAttachment,
            AttachmentKind::Stencil => ImageLayout::StencilAttachment,
        }
    }
}

/// One entry of the render pass attachment list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDescriptor {
    pub format: TextureFormat,
    pub sample_count: SampleCount,
    pub kind: AttachmentKind,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
}

/// Reference from the subpass into the attachment list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    /// Index into `RenderPassDesc::attachments`, or ATTACHMENT_UNUSED
    pub attachment: u32,
    pub layout: ImageLayout,
}

impl AttachmentReference {
    pub fn new(attachment: u32, layout: ImageLayout) -> Self {
        Self { attachment, layout }
    }

    pub fn unused() -> Self {
        Self {
            attachment: ATTACHMENT_UNUSED,
            layout: ImageLayout::Undefined,
        }
    }

    pub fn is_unused(&self) -> bool {
        self.attachment == ATTACHMENT_UNUSED
    }
}

/// Pipeline type a subpass binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineBindPoint {
    Graphics,
}

/// Single graphics subpass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpassDesc {
    pub bind_point: PipelineBindPoint,
    /// One entry per color slot 0..=max bound slot
    pub color_refs: Vec<AttachmentReference>,
    /// Same length as `color_refs`
    pub resolve_refs: Vec<AttachmentReference>,
    pub depth_stencil_ref: AttachmentReference,
}

/// Everything needed to create a native render pass object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub attachments: Vec<AttachmentDescriptor>,
    pub subpass: SubpassDesc,
}

/// Native render pass object
///
/// Created by `Context::create_render_pass`, kept alive by the render pass
/// that built it and by the command encoder once tracked.
pub trait RenderPassObject: Send + Sync {
    /// Number of attachments the object was created with
    fn attachment_count(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
