/// VulkanDeviceBuffer - Vulkan implementation of the DeviceBuffer trait

use galaxy_3d_pass::galaxy3d::{Error, Result};
use galaxy_3d_pass::galaxy3d::device::DeviceBuffer as PassDeviceBuffer;
use galaxy_3d_pass::engine_error;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan buffer implementation
pub struct VulkanDeviceBuffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    allocation: Option<Allocation>,
    /// Buffer size
    size: u64,
}

impl VulkanDeviceBuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        }
    }

    pub(crate) fn memory(&self) -> vk::DeviceMemory {
        self.allocation
            .as_ref()
            .map(|a| unsafe { a.memory() })
            .unwrap_or(vk::DeviceMemory::null())
    }

    pub(crate) fn memory_offset(&self) -> u64 {
        self.allocation.as_ref().map(|a| a.offset()).unwrap_or(0)
    }

    /// Raw Vulkan handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }
}

impl PassDeviceBuffer for VulkanDeviceBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn copy_from(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            engine_error!("galaxy3d::vulkan", "Buffer write of {} bytes at offset {} exceeds size {}",
                data.len(), offset, self.size);
            return Err(Error::InvalidResource(format!(
                "Write of {} bytes at offset {} exceeds buffer size {}", data.len(), offset, self.size
            )));
        }

        let Some(allocation) = &self.allocation else {
            engine_error!("galaxy3d::vulkan", "Buffer update failed: no GPU allocation");
            return Err(Error::BackendError("Buffer has no allocation".to_string()));
        };

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "Buffer update failed: memory is not CPU-accessible");
                Error::BackendError("Buffer is not CPU-accessible".to_string())
            })?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_ptr.add(offset as usize),
                data.len(),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanDeviceBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
