/// Image layouts, access/stage masks and layout transitions

use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::{CommandBuffer, Texture};

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    /// Undefined layout (initial state)
    Undefined,
    /// General layout (any access, slow path)
    General,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth-only attachment
    DepthAttachment,
    /// Layout for stencil-only attachment
    StencilAttachment,
    /// Layout for combined depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for shader read-only access
    ShaderReadOnly,
    /// Layout for transfer source
    TransferSrc,
    /// Layout for transfer destination
    TransferDst,
    /// Layout for presenting to swapchain
    PresentSrc,
}

bitflags! {
    /// Memory access mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const COLOR_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 3;
        const SHADER_READ = 1 << 4;
        const SHADER_WRITE = 1 << 5;
        const TRANSFER_READ = 1 << 6;
        const TRANSFER_WRITE = 1 << 7;
    }
}

bitflags! {
    /// Pipeline stage mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStageFlags: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const VERTEX_SHADER = 1 << 1;
        const EARLY_FRAGMENT_TESTS = 1 << 2;
        const FRAGMENT_SHADER = 1 << 3;
        const LATE_FRAGMENT_TESTS = 1 << 4;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 5;
        const TRANSFER = 1 << 6;
        const BOTTOM_OF_PIPE = 1 << 7;
        const ALL_GRAPHICS = 1 << 8;
    }
}

/// Request to move a texture into a new layout
///
/// Carries the command buffer the barrier is recorded into together with
/// the source/destination access and stage masks.
#[derive(Clone, Copy)]
pub struct LayoutTransition<'a> {
    pub cmd_buffer: &'a dyn CommandBuffer,
    pub new_layout: ImageLayout,
    pub src_access: AccessFlags,
    pub src_stage: PipelineStageFlags,
    pub dst_access: AccessFlags,
    pub dst_stage: PipelineStageFlags,
}

impl<'a> LayoutTransition<'a> {
    /// Same masks, different target layout
    pub fn with_layout(self, new_layout: ImageLayout) -> Self {
        Self { new_layout, ..self }
    }

    /// Record the barrier moving `texture` from `old_layout` to `new_layout`
    ///
    /// Texture implementations call this after swapping their tracked layout.
    /// Nothing is recorded when the layout does not change.
    pub fn encode_barrier(&self, texture: &dyn Texture, old_layout: ImageLayout) -> Result<()> {
        if old_layout == self.new_layout {
            return Ok(());
        }
        self.cmd_buffer.pipeline_barrier(&ImageBarrier {
            texture,
            old_layout,
            new_layout: self.new_layout,
            src_access: self.src_access,
            src_stage: self.src_stage,
            dst_access: self.dst_access,
            dst_stage: self.dst_stage,
        })
    }
}

/// A single image memory barrier, as handed to the command buffer
pub struct ImageBarrier<'a> {
    pub texture: &'a dyn Texture,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_access: AccessFlags,
    pub src_stage: PipelineStageFlags,
    pub dst_access: AccessFlags,
    pub dst_stage: PipelineStageFlags,
}
