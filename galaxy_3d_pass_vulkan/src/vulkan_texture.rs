/// VulkanTexture - Vulkan implementation of the Texture trait

use galaxy_3d_pass::galaxy3d::{Error, Result};
use galaxy_3d_pass::galaxy3d::device::{
    ImageLayout, LayoutTransition, SampleCount, Texture as PassTexture, TextureDescriptor,
};
use galaxy_3d_pass::{engine_err, engine_error};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_for_format, format_to_vk, sample_count_to_vk};

/// Vulkan texture implementation
///
/// Tracks the layout its image was last transitioned to. The tracked layout
/// follows recording order, not GPU execution.
pub struct VulkanTexture {
    ctx: Arc<GpuContext>,
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view (whole image, all aspects)
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    allocation: Option<Allocation>,
    /// Read-only texture properties
    descriptor: TextureDescriptor,
    layout: Mutex<ImageLayout>,
}

impl VulkanTexture {
    /// Create a 2D texture usable as attachment, sampled image and transfer target
    pub(crate) fn new(ctx: Arc<GpuContext>, descriptor: TextureDescriptor) -> Result<Self> {
        if descriptor.size.x == 0 || descriptor.size.y == 0 {
            engine_error!("galaxy3d::vulkan", "Refusing to create a {}x{} texture", descriptor.size.x, descriptor.size.y);
            return Err(Error::InvalidResource("Texture size must be greater than zero".to_string()));
        }

        let format = format_to_vk(descriptor.format);
        let aspect_mask = aspect_for_format(descriptor.format);
        let mip_levels = descriptor.mip_count.max(1);

        let attachment_usage = if descriptor.format.has_depth() || descriptor.format.has_stencil() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::TRANSFER_SRC
        };
        let mut usage = attachment_usage | vk::ImageUsageFlags::TRANSFER_DST;
        if descriptor.sample_count == SampleCount::S1 {
            usage |= vk::ImageUsageFlags::SAMPLED;
        }

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: descriptor.size.x,
                    height: descriptor.size.y,
                    depth: 1,
                })
                .mip_levels(mip_levels)
                .array_layers(1)
                .samples(sample_count_to_vk(descriptor.sample_count))
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create texture image: {:?}", e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocation = match ctx.allocator.lock() {
                Ok(mut allocator) => allocator.allocate(&AllocationCreateDesc {
                    name: "pass_texture",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                }).ok(),
                Err(_) => None,
            };
            let Some(allocation) = allocation else {
                ctx.device.destroy_image(image, None);
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("galaxy3d::vulkan", "Out of GPU memory for texture (size: {}x{}, {:.2} MB)",
                    descriptor.size.x, descriptor.size.y, size_mb);
                return Err(Error::OutOfMemory);
            };

            let mut texture = Self {
                ctx,
                image,
                view: vk::ImageView::null(),
                allocation: Some(allocation),
                descriptor,
                layout: Mutex::new(ImageLayout::Undefined),
            };

            let (memory, offset) = match &texture.allocation {
                Some(allocation) => (allocation.memory(), allocation.offset()),
                None => (vk::DeviceMemory::null(), 0),
            };
            texture.ctx.device.bind_image_memory(image, memory, offset)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to bind texture memory: {:?}", e))?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level: 0,
                    level_count: mip_levels,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            texture.view = texture.ctx.device.create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create texture image view: {:?}", e))?;

            Ok(texture)
        }
    }

    /// Raw Vulkan image handle
    pub fn image(&self) -> vk::Image {
        self.image
    }

    pub fn mip_levels(&self) -> u32 {
        self.descriptor.mip_count.max(1)
    }

    /// Name the image and its view for debugging tools
    pub fn set_debug_name(&self, name: &str) {
        self.ctx.set_object_name(self.image, name);
        self.ctx.set_object_name(self.view, name);
    }
}

impl PassTexture for VulkanTexture {
    fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    fn layout(&self) -> ImageLayout {
        self.layout.lock().map(|layout| *layout).unwrap_or(ImageLayout::Undefined)
    }

    fn set_layout(&self, transition: &LayoutTransition<'_>) -> Result<()> {
        let old_layout = {
            let mut layout = self.layout
                .lock()
                .map_err(|_| engine_err!("galaxy3d::vulkan", "Texture layout lock poisoned"))?;
            std::mem::replace(&mut *layout, transition.new_layout)
        };

        if let Err(e) = transition.encode_barrier(self, old_layout) {
            if let Ok(mut layout) = self.layout.lock() {
                *layout = old_layout;
            }
            return Err(e);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
