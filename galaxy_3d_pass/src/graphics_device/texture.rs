/// Texture trait and texture metadata

use std::any::Any;
use glam::UVec2;
use crate::error::Result;
use crate::graphics_device::{ImageLayout, LayoutTransition};

/// Texture pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    // Color formats
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,

    // Depth / stencil formats
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
    S8_UINT,
}

impl TextureFormat {
    /// Returns true if the format has a depth component
    pub fn has_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D32_SFLOAT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_SFLOAT_S8_UINT
        )
    }

    /// Returns true if the format has a stencil component
    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_SFLOAT_S8_UINT
                | TextureFormat::S8_UINT
        )
    }
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleCount {
    S1,
    S2,
    S4,
    S8,
}

/// Read-only texture properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub format: TextureFormat,
    pub sample_count: SampleCount,
    /// Size in pixels
    pub size: UVec2,
    pub mip_count: u32,
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types (e.g., VulkanTexture).
/// Textures are owned elsewhere; the render pass core only reads their
/// metadata and asks them to change layout.
pub trait Texture: Send + Sync {
    /// Texture metadata (format, sample count, size)
    fn descriptor(&self) -> &TextureDescriptor;

    /// Layout the texture was last transitioned to
    fn layout(&self) -> ImageLayout;

    /// Transition the texture to `transition.new_layout`
    ///
    /// Records the new layout and encodes an image barrier into
    /// `transition.cmd_buffer`. Requesting the current layout records nothing.
    fn set_layout(&self, transition: &LayoutTransition<'_>) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
