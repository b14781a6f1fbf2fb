/// Descriptor set trait and descriptor writes

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{DeviceBuffer, ImageLayout, Sampler, Texture};

/// Descriptor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    CombinedImageSampler,
}

/// One write into a descriptor set
#[derive(Clone)]
pub enum DescriptorWrite {
    UniformBuffer {
        binding: u32,
        buffer: Arc<dyn DeviceBuffer>,
        offset: u64,
        range: u64,
    },
    CombinedImageSampler {
        binding: u32,
        texture: Arc<dyn Texture>,
        sampler: Arc<dyn Sampler>,
        layout: ImageLayout,
    },
}

impl DescriptorWrite {
    pub fn binding(&self) -> u32 {
        match self {
            DescriptorWrite::UniformBuffer { binding, .. } => *binding,
            DescriptorWrite::CombinedImageSampler { binding, .. } => *binding,
        }
    }

    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            DescriptorWrite::UniformBuffer { .. } => DescriptorType::UniformBuffer,
            DescriptorWrite::CombinedImageSampler { .. } => DescriptorType::CombinedImageSampler,
        }
    }
}

/// Descriptor set resource trait
pub trait DescriptorSet: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
