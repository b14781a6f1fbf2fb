/// Framebuffer trait and framebuffer descriptor

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{RenderPassObject, Texture};

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// Render pass the framebuffer must be compatible with
    pub render_pass: &'a Arc<dyn RenderPassObject>,
    /// Views in the same order as the render pass attachment list
    pub attachments: Vec<Arc<dyn Texture>>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// Framebuffer resource trait
pub trait Framebuffer: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
