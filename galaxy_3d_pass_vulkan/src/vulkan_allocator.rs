/// Allocator - Vulkan implementation of the device buffer allocator

use galaxy_3d_pass::galaxy3d::{Error, Result};
use galaxy_3d_pass::galaxy3d::device::{
    Allocator as PassAllocator, DeviceBuffer as PassDeviceBuffer, DeviceBufferDesc, StorageMode,
};
use galaxy_3d_pass::{engine_err, engine_error, engine_trace};
use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_buffer::VulkanDeviceBuffer;
use crate::vulkan_context::GpuContext;

/// Creates device buffers usable as vertex, index and uniform sources
pub struct VulkanAllocator {
    ctx: Arc<GpuContext>,
}

impl VulkanAllocator {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx }
    }

    /// Create a concrete Vulkan buffer
    pub fn create_vulkan_buffer(&self, desc: &DeviceBufferDesc) -> Result<VulkanDeviceBuffer> {
        if desc.size == 0 {
            engine_error!("galaxy3d::vulkan", "Refusing to create a zero-sized buffer");
            return Err(Error::InvalidResource("Buffer size must be greater than zero".to_string()));
        }

        let location = match desc.storage_mode {
            StorageMode::HostVisible => MemoryLocation::CpuToGpu,
            StorageMode::DevicePrivate => MemoryLocation::GpuOnly,
        };

        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(
                    vk::BufferUsageFlags::VERTEX_BUFFER
                        | vk::BufferUsageFlags::INDEX_BUFFER
                        | vk::BufferUsageFlags::UNIFORM_BUFFER
                        | vk::BufferUsageFlags::TRANSFER_SRC
                        | vk::BufferUsageFlags::TRANSFER_DST
                )
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self.ctx.device.create_buffer(&buffer_create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create buffer of size {} bytes: {:?}", desc.size, e))?;

            let requirements = self.ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = {
                let mut allocator = match self.ctx.allocator.lock() {
                    Ok(allocator) => allocator,
                    Err(_) => {
                        self.ctx.device.destroy_buffer(buffer, None);
                        return Err(engine_err!("galaxy3d::vulkan", "GPU allocator lock poisoned"));
                    }
                };
                allocator.allocate(&AllocationCreateDesc {
                    name: "pass_buffer",
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };

            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    self.ctx.device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("galaxy3d::vulkan", "Out of GPU memory for buffer (required: {:.2} MB)", size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            let vk_buffer = VulkanDeviceBuffer::new(Arc::clone(&self.ctx), buffer, allocation, desc.size);

            self.ctx.device.bind_buffer_memory(buffer, vk_buffer.memory(), vk_buffer.memory_offset())
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to bind buffer memory: {:?}", e))?;

            engine_trace!("galaxy3d::vulkan", "Allocated {} byte buffer ({:?})", desc.size, desc.storage_mode);

            Ok(vk_buffer)
        }
    }
}

impl PassAllocator for VulkanAllocator {
    fn create_buffer(&self, desc: &DeviceBufferDesc) -> Result<Arc<dyn PassDeviceBuffer>> {
        Ok(Arc::new(self.create_vulkan_buffer(desc)?))
    }
}
