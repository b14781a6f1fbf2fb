/// Command encoder trait and resource tracking

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    CommandBuffer, DescriptorSet, DescriptorSetLayout, DeviceBuffer, Framebuffer,
    RenderPassObject, Sampler, Texture,
};

/// A resource whose lifetime must be extended until GPU execution completes
#[derive(Clone)]
pub enum TrackedResource {
    Texture(Arc<dyn Texture>),
    DeviceBuffer(Arc<dyn DeviceBuffer>),
    Sampler(Arc<dyn Sampler>),
    Framebuffer(Arc<dyn Framebuffer>),
    RenderPass(Arc<dyn RenderPassObject>),
}

/// Command encoder trait
///
/// Owns the command buffer a render pass records into. Render passes hold
/// only a weak reference and check the encoder is still alive at encode time.
pub trait CommandEncoder: Send + Sync {
    /// Command buffer in the recording state
    fn command_buffer(&self) -> &dyn CommandBuffer;

    /// Keep `resource` alive until the recorded work completes
    fn track(&self, resource: TrackedResource) -> Result<()>;

    /// Open a named debug group (no-op when debug labels are disabled)
    fn push_debug_group(&self, label: &str);

    /// Close the innermost debug group
    fn pop_debug_group(&self);

    /// Allocate a transient descriptor set for one draw
    fn allocate_descriptor_set(&self, layout: &dyn DescriptorSetLayout) -> Result<Arc<dyn DescriptorSet>>;
}
