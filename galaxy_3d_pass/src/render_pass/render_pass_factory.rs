/// Render pass object factory

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{Context, RenderPassObject};
use crate::render_pass::{AttachmentLayout, RenderTarget};
use crate::{engine_debug, engine_error};

/// Create the native single-subpass render pass object for `target`
pub(crate) fn create_render_pass_object(
    context: &dyn Context,
    target: &RenderTarget,
) -> Result<Arc<dyn RenderPassObject>> {
    let desc = AttachmentLayout::new(target).into_render_pass_desc();
    let attachment_count = desc.attachments.len();

    let render_pass = context.create_render_pass(&desc).map_err(|e| {
        engine_error!("galaxy3d::pass", "Failed to create render pass object: {}", e);
        Error::InitializationFailed(format!("render pass object: {}", e))
    })?;

    engine_debug!("galaxy3d::pass", "Created render pass object with {} attachments", attachment_count);
    Ok(render_pass)
}
