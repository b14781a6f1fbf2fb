/// Context trait - the device-level factory the render pass uses

use std::sync::Arc;
use crate::config::Config;
use crate::error::Result;
use crate::graphics_device::{
    Allocator, DescriptorSet, DescriptorWrite, Framebuffer, FramebufferDesc, RenderPassDesc,
    RenderPassObject,
};

/// Graphics context trait
///
/// Implemented by backends (e.g., VulkanContext). Render passes hold a weak
/// reference to it; creating objects requires the context to be alive.
pub trait Context: Send + Sync {
    fn config(&self) -> &Config;

    /// Allocator used to make host buffers resident
    fn resource_allocator(&self) -> &dyn Allocator;

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPassObject>>;

    fn create_framebuffer(&self, desc: &FramebufferDesc<'_>) -> Result<Arc<dyn Framebuffer>>;

    /// Apply `writes` to `descriptor_set` in one call
    fn update_descriptor_set(&self, descriptor_set: &dyn DescriptorSet, writes: &[DescriptorWrite]) -> Result<()>;

    /// Attach a debug name to a native render pass object
    fn set_debug_name(&self, render_pass: &dyn RenderPassObject, label: &str);
}
