/*!
# Galaxy 3D Pass - Vulkan Backend

Vulkan implementation of the collaborator traits of `galaxy_3d_pass`.

This crate provides a headless Vulkan backend built on Ash for the Vulkan
bindings and gpu-allocator for memory management:

- `VulkanContext`: render pass / framebuffer creation, descriptor updates,
  debug names, device-buffer allocation
- `VulkanCommandEncoder`: command buffer recording, descriptor pool pages,
  resource tracking and one-shot submission
- `VulkanTexture`, `VulkanDeviceBuffer`, `VulkanSampler`, `VulkanPipeline`

The device must support Vulkan 1.2 separate depth/stencil layouts.

## Example

```no_run
use galaxy_3d_pass::galaxy3d::{Config, RenderPass};
use galaxy_3d_pass::galaxy3d::device::{Context, CommandEncoder, SampleCount, TextureDescriptor, TextureFormat};
use galaxy_3d_pass::galaxy3d::pass::{Attachment, ColorAttachment, RenderTarget};
use galaxy_3d_pass::glam::{UVec2, Vec4};
use galaxy_3d_pass_vulkan::VulkanContext;
use std::sync::Arc;

let context = VulkanContext::new(Config::default())?;
let color = context.create_texture(TextureDescriptor {
    format: TextureFormat::R8G8B8A8_UNORM,
    sample_count: SampleCount::S1,
    size: UVec2::new(256, 256),
    mip_count: 1,
})?;

let mut target = RenderTarget::new();
target.set_color_attachment(0, ColorAttachment::new(Attachment::new(color), Vec4::ZERO))?;

let encoder = context.create_command_encoder()?;
let encoder_dyn: Arc<dyn CommandEncoder> = encoder.clone();
let context_dyn: Arc<dyn Context> = context.clone();
let mut pass = RenderPass::new(&context_dyn, target, Arc::downgrade(&encoder_dyn));
pass.encode()?;
encoder.submit()?;
# Ok::<(), galaxy_3d_pass::galaxy3d::Error>(())
```
*/

mod vulkan_format;
mod vulkan_debug;
mod vulkan_context;
mod vulkan_allocator;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_descriptor_set;
mod vulkan_command_encoder;

pub use vulkan_context::{GpuContext, VulkanContext};
pub use vulkan_allocator::VulkanAllocator;
pub use vulkan_buffer::VulkanDeviceBuffer;
pub use vulkan_texture::VulkanTexture;
pub use vulkan_sampler::VulkanSampler;
pub use vulkan_pipeline::{VulkanDescriptorSetLayout, VulkanPipeline};
pub use vulkan_render_pass::VulkanRenderPass;
pub use vulkan_frame_buffer::VulkanFramebuffer;
pub use vulkan_descriptor_set::VulkanDescriptorSet;
pub use vulkan_command_encoder::{VulkanCommandBuffer, VulkanCommandEncoder};

// Re-export ash so applications building pipelines use the same version
pub use ash;
