/// Framebuffer factory

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Context, Framebuffer, FramebufferDesc, RenderPassObject};
use crate::render_pass::attachments::attachment_slots;
use crate::render_pass::RenderTarget;
use crate::engine_error;

/// Create a framebuffer whose views follow the render pass attachment order
pub(crate) fn create_framebuffer(
    context: &dyn Context,
    render_pass: &Arc<dyn RenderPassObject>,
    target: &RenderTarget,
) -> Result<Arc<dyn Framebuffer>> {
    let size = target.size();
    let desc = FramebufferDesc {
        render_pass,
        attachments: attachment_slots(target)
            .iter()
            .map(|slot| slot.texture().clone())
            .collect(),
        width: size.x,
        height: size.y,
        layers: 1,
    };

    context.create_framebuffer(&desc).map_err(|e| {
        engine_error!("galaxy3d::pass", "Could not create framebuffer ({}x{}): {}", size.x, size.y, e);
        e
    })
}
