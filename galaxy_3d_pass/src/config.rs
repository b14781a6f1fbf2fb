/// Configuration shared by the render pass core and its backends

/// Render pass configuration
///
/// Backends read the descriptor pool sizing when they grow their pools,
/// and `enable_debug_labels` when they emit debug groups and object names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Emit debug-group markers and native object names
    pub enable_debug_labels: bool,
    /// Maximum descriptor sets per descriptor pool page
    pub descriptor_pool_max_sets: u32,
    /// Uniform buffer descriptors per descriptor pool page
    pub descriptor_pool_uniform_buffers: u32,
    /// Combined image sampler descriptors per descriptor pool page
    pub descriptor_pool_combined_image_samplers: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_debug_labels: cfg!(debug_assertions),
            descriptor_pool_max_sets: 1024,
            descriptor_pool_uniform_buffers: 1024,
            descriptor_pool_combined_image_samplers: 2048,
        }
    }
}
