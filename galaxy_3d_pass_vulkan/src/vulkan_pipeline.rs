/// VulkanPipeline - Vulkan implementation of the Pipeline trait
///
/// Pipelines are compiled by the application; this wrapper takes ownership
/// of the handles so the render pass can bind them and allocate descriptor
/// sets against set 0.

use galaxy_3d_pass::galaxy3d::Result;
use galaxy_3d_pass::galaxy3d::device::{DescriptorSetLayout, Pipeline as PassPipeline};
use galaxy_3d_pass::engine_err;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan descriptor set layout
pub struct VulkanDescriptorSetLayout {
    ctx: Arc<GpuContext>,
    pub(crate) layout: vk::DescriptorSetLayout,
}

impl VulkanDescriptorSetLayout {
    pub fn new(ctx: Arc<GpuContext>, bindings: &[vk::DescriptorSetLayoutBinding<'_>]) -> Result<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            ctx.device.create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create descriptor set layout: {:?}", e))?
        };

        Ok(Self { ctx, layout })
    }

    /// Raw Vulkan handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl DescriptorSetLayout for VulkanDescriptorSetLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanDescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Vulkan pipeline implementation
pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    label: String,
    /// Vulkan graphics pipeline
    pub(crate) pipeline: vk::Pipeline,
    /// Pipeline layout (accessed internally for descriptor set binding)
    pub(crate) pipeline_layout: vk::PipelineLayout,
    set_layout: VulkanDescriptorSetLayout,
}

impl VulkanPipeline {
    /// Create a pipeline layout with `set_layout` as its only descriptor set
    pub fn create_layout(ctx: &GpuContext, set_layout: &VulkanDescriptorSetLayout) -> Result<vk::PipelineLayout> {
        let set_layouts = [set_layout.layout];
        let create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);

        unsafe {
            ctx.device.create_pipeline_layout(&create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create pipeline layout: {:?}", e))
        }
    }

    /// Take ownership of an application-built graphics pipeline
    ///
    /// `pipeline` and `pipeline_layout` are destroyed when the wrapper drops.
    pub fn from_raw(
        ctx: Arc<GpuContext>,
        label: impl Into<String>,
        pipeline: vk::Pipeline,
        pipeline_layout: vk::PipelineLayout,
        set_layout: VulkanDescriptorSetLayout,
    ) -> Self {
        let label = label.into();
        ctx.set_object_name(pipeline, &label);
        Self { ctx, label, pipeline, pipeline_layout, set_layout }
    }
}

impl PassPipeline for VulkanPipeline {
    fn label(&self) -> &str {
        &self.label
    }

    fn descriptor_set_layout(&self) -> &dyn DescriptorSetLayout {
        &self.set_layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
