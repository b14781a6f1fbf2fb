/// VulkanDescriptorSet - Vulkan implementation of the DescriptorSet trait

use galaxy_3d_pass::galaxy3d::device::DescriptorSet as PassDescriptorSet;
use ash::vk;
use std::any::Any;

/// Vulkan descriptor set implementation
///
/// Wraps a Vulkan descriptor set handle (vk::DescriptorSet).
/// The set is freed together with the descriptor pool page it was allocated
/// from, when the owning command encoder is dropped.
pub struct VulkanDescriptorSet {
    pub(crate) descriptor_set: vk::DescriptorSet,
}

impl VulkanDescriptorSet {
    pub(crate) fn new(descriptor_set: vk::DescriptorSet) -> Self {
        Self { descriptor_set }
    }
}

impl PassDescriptorSet for VulkanDescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
