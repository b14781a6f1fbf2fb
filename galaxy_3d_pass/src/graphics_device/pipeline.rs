/// Pipeline trait

use std::any::Any;

/// Layout of descriptor set 0 of a pipeline
pub trait DescriptorSetLayout: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Graphics pipeline resource trait
///
/// Pipelines are built elsewhere; the render pass only binds them and
/// allocates descriptor sets against their layout.
pub trait Pipeline: Send + Sync {
    /// Human-readable name, used in logs
    fn label(&self) -> &str;

    /// Layout of the pipeline's only descriptor set
    fn descriptor_set_layout(&self) -> &dyn DescriptorSetLayout;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
