/// Attachment descriptor builder
///
/// One traversal of the render target decides the attachment order:
/// each color in ascending bind index, its resolve texture right after it,
/// then depth, else stencil. The render pass descriptor list, the
/// framebuffer view list and the clear value list are all produced from
/// that traversal, so their lengths and orders always agree.

use std::sync::Arc;
use crate::graphics_device::{
    AttachmentDescriptor, AttachmentKind, AttachmentReference, ClearValue, ImageLayout,
    PipelineBindPoint, RenderPassDesc, SubpassDesc, Texture,
};
use crate::render_pass::{Attachment, ColorAttachment, RenderTarget};

/// One emitted attachment, in pass order
#[derive(Clone, Copy)]
pub enum AttachmentSlot<'a> {
    Color { bind_index: usize, color: &'a ColorAttachment },
    Resolve { bind_index: usize, color: &'a ColorAttachment },
    Depth { attachment: &'a Attachment, clear_depth: f32 },
    Stencil { attachment: &'a Attachment, clear_stencil: u32 },
}

impl<'a> AttachmentSlot<'a> {
    /// Texture whose view fills this slot
    pub fn texture(&self) -> &'a Arc<dyn Texture> {
        match *self {
            AttachmentSlot::Color { color, .. } => &color.attachment.texture,
            // Resolve slots are only emitted when the resolve texture exists
            AttachmentSlot::Resolve { color, .. } => color
                .attachment
                .resolve_texture
                .as_ref()
                .unwrap_or(&color.attachment.texture),
            AttachmentSlot::Depth { attachment, .. } => &attachment.texture,
            AttachmentSlot::Stencil { attachment, .. } => &attachment.texture,
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        match self {
            AttachmentSlot::Color { .. } | AttachmentSlot::Resolve { .. } => AttachmentKind::Color,
            AttachmentSlot::Depth { .. } => AttachmentKind::Depth,
            AttachmentSlot::Stencil { .. } => AttachmentKind::Stencil,
        }
    }

    fn attachment(&self) -> &'a Attachment {
        match *self {
            AttachmentSlot::Color { color, .. } | AttachmentSlot::Resolve { color, .. } => &color.attachment,
            AttachmentSlot::Depth { attachment, .. } => attachment,
            AttachmentSlot::Stencil { attachment, .. } => attachment,
        }
    }

    /// Descriptor built from the slot texture's format and sample count
    pub fn descriptor(&self) -> AttachmentDescriptor {
        let texture = self.texture().descriptor();
        let attachment = self.attachment();
        AttachmentDescriptor {
            format: texture.format,
            sample_count: texture.sample_count,
            kind: self.kind(),
            load_action: attachment.load_action,
            store_action: attachment.store_action,
        }
    }

    /// Resolve slots repeat the clear color of their color attachment
    pub fn clear_value(&self) -> ClearValue {
        match *self {
            AttachmentSlot::Color { color, .. } | AttachmentSlot::Resolve { color, .. } => {
                ClearValue::Color(color.clear_color.to_array())
            }
            AttachmentSlot::Depth { clear_depth, .. } => ClearValue::DepthStencil { depth: clear_depth, stencil: 0 },
            AttachmentSlot::Stencil { clear_stencil, .. } => ClearValue::DepthStencil { depth: 0.0, stencil: clear_stencil },
        }
    }
}

/// Walk the target in pass order
pub fn attachment_slots(target: &RenderTarget) -> Vec<AttachmentSlot<'_>> {
    let mut slots = Vec::new();

    for (&bind_index, color) in target.color_attachments() {
        slots.push(AttachmentSlot::Color { bind_index, color });
        if color.attachment.resolve_texture.is_some() {
            slots.push(AttachmentSlot::Resolve { bind_index, color });
        }
    }

    // Only one depth/stencil slot exists; depth wins when both are supplied
    if let Some(depth) = target.depth_attachment() {
        slots.push(AttachmentSlot::Depth {
            attachment: &depth.attachment,
            clear_depth: depth.clear_depth,
        });
    } else if let Some(stencil) = target.stencil_attachment() {
        slots.push(AttachmentSlot::Stencil {
            attachment: &stencil.attachment,
            clear_stencil: stencil.clear_stencil,
        });
    }

    slots
}

/// Attachment list and subpass reference tables for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLayout {
    pub attachments: Vec<AttachmentDescriptor>,
    /// `max_color_attachment_bind_index + 1` entries, unused where unbound
    pub color_refs: Vec<AttachmentReference>,
    /// Same shape as `color_refs`, unused where there is no resolve texture
    pub resolve_refs: Vec<AttachmentReference>,
    pub depth_stencil_ref: AttachmentReference,
}

impl AttachmentLayout {
    /// Build the descriptor list and reference tables for `target`
    ///
    /// A target without attachments yields empty lists; rejecting it is the
    /// caller's concern.
    pub fn new(target: &RenderTarget) -> Self {
        let ref_count = if target.color_attachments().is_empty() {
            0
        } else {
            target.max_color_attachment_bind_index() + 1
        };

        let mut layout = Self {
            attachments: Vec::new(),
            color_refs: vec![AttachmentReference::unused(); ref_count],
            resolve_refs: vec![AttachmentReference::unused(); ref_count],
            depth_stencil_ref: AttachmentReference::unused(),
        };

        for slot in attachment_slots(target) {
            let index = layout.attachments.len() as u32;
            match slot {
                AttachmentSlot::Color { bind_index, .. } => {
                    layout.color_refs[bind_index] = AttachmentReference::new(index, ImageLayout::ColorAttachment);
                }
                AttachmentSlot::Resolve { bind_index, .. } => {
                    layout.resolve_refs[bind_index] = AttachmentReference::new(index, ImageLayout::ColorAttachment);
                }
                AttachmentSlot::Depth { .. } | AttachmentSlot::Stencil { .. } => {
                    layout.depth_stencil_ref = AttachmentReference::new(index, ImageLayout::DepthStencilAttachment);
                }
            }
            layout.attachments.push(slot.descriptor());
        }

        layout
    }

    /// Single graphics subpass over this layout
    pub fn into_render_pass_desc(self) -> RenderPassDesc {
        RenderPassDesc {
            attachments: self.attachments,
            subpass: SubpassDesc {
                bind_point: PipelineBindPoint::Graphics,
                color_refs: self.color_refs,
                resolve_refs: self.resolve_refs,
                depth_stencil_ref: self.depth_stencil_ref,
            },
        }
    }
}

/// Clear values in attachment order
pub fn clear_values(target: &RenderTarget) -> Vec<ClearValue> {
    attachment_slots(target).iter().map(|slot| slot.clear_value()).collect()
}

#[cfg(test)]
#[path = "attachments_tests.rs"]
mod tests;
