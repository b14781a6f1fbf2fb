/// VulkanRenderPass - Vulkan implementation of the RenderPassObject trait

use galaxy_3d_pass::galaxy3d::device::RenderPassObject;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan render pass implementation
///
/// Simple wrapper around vk::RenderPass
pub struct VulkanRenderPass {
    ctx: Arc<GpuContext>,
    /// Vulkan render pass handle
    pub(crate) render_pass: vk::RenderPass,
    attachment_count: u32,
}

impl VulkanRenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, render_pass: vk::RenderPass, attachment_count: u32) -> Self {
        Self { ctx, render_pass, attachment_count }
    }

    /// Raw Vulkan handle
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl RenderPassObject for VulkanRenderPass {
    fn attachment_count(&self) -> u32 {
        self.attachment_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
