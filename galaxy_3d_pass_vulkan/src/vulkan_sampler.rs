/// VulkanSampler - Vulkan implementation of the Sampler trait

use galaxy_3d_pass::galaxy3d::Result;
use galaxy_3d_pass::galaxy3d::device::{Sampler as PassSampler, SamplerDescriptor};
use galaxy_3d_pass::engine_err;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{address_mode_to_vk, filter_to_vk, mip_filter_to_vk};

/// Wraps a VkSampler. Destroyed when dropped.
pub struct VulkanSampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
    descriptor: SamplerDescriptor,
}

impl VulkanSampler {
    pub(crate) fn new(ctx: Arc<GpuContext>, descriptor: SamplerDescriptor) -> Result<Self> {
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(descriptor.mag_filter))
            .min_filter(filter_to_vk(descriptor.min_filter))
            .mipmap_mode(mip_filter_to_vk(descriptor.mip_filter))
            .address_mode_u(address_mode_to_vk(descriptor.address_mode_u))
            .address_mode_v(address_mode_to_vk(descriptor.address_mode_v))
            .address_mode_w(address_mode_to_vk(descriptor.address_mode_w))
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .anisotropy_enable(false)
            .max_anisotropy(1.0);

        let sampler = unsafe {
            ctx.device.create_sampler(&create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create VkSampler: {:?}", e))?
        };

        Ok(Self { ctx, sampler, descriptor })
    }
}

impl PassSampler for VulkanSampler {
    fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}
