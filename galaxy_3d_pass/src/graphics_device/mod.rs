/// Graphics device module - collaborator traits the render pass core encodes against
///
/// Backends (Vulkan, mock) implement these traits; the core never sees
/// native handles directly.

// Module declarations
pub mod texture;
pub mod layout;
pub mod buffer;
pub mod allocator;
pub mod sampler;
pub mod pipeline;
pub mod render_pass;
pub mod frame_buffer;
pub mod descriptor_set;
pub mod command_buffer;
pub mod command_encoder;
pub mod context;

// Re-export everything
pub use texture::*;
pub use layout::*;
pub use buffer::*;
pub use allocator::*;
pub use sampler::*;
pub use pipeline::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use descriptor_set::*;
pub use command_buffer::*;
pub use command_encoder::*;
pub use context::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
