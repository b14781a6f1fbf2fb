/// Resource allocator trait

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::DeviceBuffer;

/// Where the buffer memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Host-visible, mappable memory
    HostVisible,
    /// Device-local memory
    DevicePrivate,
}

/// Descriptor for creating a device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceBufferDesc {
    /// Size in bytes
    pub size: u64,
    pub storage_mode: StorageMode,
}

/// Creates GPU buffers on behalf of the render pass core
pub trait Allocator: Send + Sync {
    fn create_buffer(&self, desc: &DeviceBufferDesc) -> Result<Arc<dyn DeviceBuffer>>;
}
