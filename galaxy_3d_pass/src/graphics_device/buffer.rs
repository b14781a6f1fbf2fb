/// Buffer traits, buffer views and the two buffer sources the core accepts

use std::any::Any;
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::{Allocator, DeviceBufferDesc, StorageMode};
use crate::engine_error;

/// Byte range inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub offset: u64,
    pub length: u64,
}

impl Range {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }
}

/// GPU-resident buffer
///
/// Implemented by backend-specific buffer types (e.g., VulkanDeviceBuffer).
pub trait DeviceBuffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Copy `data` into the buffer at `offset`
    fn copy_from(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Anything that can be resolved to a device buffer at encode time
pub trait Buffer: Send + Sync {
    /// Resolve to a device buffer, uploading through `allocator` if needed
    ///
    /// Returns None when the buffer cannot be made resident.
    fn device_buffer(&self, allocator: &dyn Allocator) -> Option<Arc<dyn DeviceBuffer>>;
}

/// A buffer plus a byte range
#[derive(Clone)]
pub struct BufferView {
    pub buffer: Arc<dyn Buffer>,
    pub range: Range,
}

impl BufferView {
    pub fn new(buffer: Arc<dyn Buffer>, range: Range) -> Self {
        Self { buffer, range }
    }
}

// ===== HOST BUFFER =====

/// CPU-side bytes uploaded to the GPU on first use
///
/// A device buffer is created lazily through the allocator handed to
/// `device_buffer()` and cached per allocator: later calls with the same
/// allocator return the same buffer, another allocator gets its own upload.
pub struct HostBuffer {
    data: Vec<u8>,
    /// Keyed by the address of the allocator that created the buffer
    device_buffers: Mutex<FxHashMap<usize, Arc<dyn DeviceBuffer>>>,
}

impl HostBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            device_buffers: Mutex::new(FxHashMap::default()),
        }
    }

    /// Build from a slice of plain values (vertices, indices, uniforms)
    pub fn from_slice<T: bytemuck::Pod>(values: &[T]) -> Self {
        Self::new(bytemuck::cast_slice(values).to_vec())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// View over the whole buffer
    pub fn view(self: &Arc<Self>) -> BufferView {
        BufferView::new(self.clone(), Range::new(0, self.data.len() as u64))
    }

    fn upload(&self, allocator: &dyn Allocator) -> Result<Arc<dyn DeviceBuffer>> {
        let device_buffer = allocator.create_buffer(&DeviceBufferDesc {
            size: self.data.len() as u64,
            storage_mode: StorageMode::HostVisible,
        })?;
        device_buffer.copy_from(0, &self.data)?;
        Ok(device_buffer)
    }
}

impl Buffer for HostBuffer {
    fn device_buffer(&self, allocator: &dyn Allocator) -> Option<Arc<dyn DeviceBuffer>> {
        let key = allocator as *const dyn Allocator as *const () as usize;
        let mut cached = self.device_buffers.lock().ok()?;
        if let Some(buffer) = cached.get(&key) {
            return Some(buffer.clone());
        }

        match self.upload(allocator) {
            Ok(buffer) => {
                cached.insert(key, buffer.clone());
                Some(buffer)
            }
            Err(e) => {
                engine_error!("galaxy3d::pass", "Host buffer upload of {} bytes failed: {}", self.data.len(), e);
                None
            }
        }
    }
}

// ===== RESIDENT BUFFER =====

/// Wraps a buffer that already lives on the GPU
pub struct ResidentBuffer {
    device_buffer: Arc<dyn DeviceBuffer>,
}

impl ResidentBuffer {
    pub fn new(device_buffer: Arc<dyn DeviceBuffer>) -> Self {
        Self { device_buffer }
    }
}

impl Buffer for ResidentBuffer {
    fn device_buffer(&self, _allocator: &dyn Allocator) -> Option<Arc<dyn DeviceBuffer>> {
        Some(self.device_buffer.clone())
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
