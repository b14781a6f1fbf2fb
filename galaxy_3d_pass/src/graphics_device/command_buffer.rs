/// Command buffer trait and recording parameters

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    DescriptorSet, DeviceBuffer, Framebuffer, ImageBarrier, Pipeline, PipelineBindPoint,
    RenderPassObject,
};

/// Viewport, as recorded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Integer rectangle (scissor, render area)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for one attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

/// Stencil face selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilFace {
    Front,
    Back,
    FrontAndBack,
}

/// How subpass contents are provided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubpassContents {
    Inline,
}

/// Command buffer trait
///
/// Every method records one native command. Errors are reported when the
/// backend rejects the recording (e.g., buffer not in the recording state).
pub trait CommandBuffer: Send + Sync {
    /// Record an image memory barrier (outside a render pass)
    fn pipeline_barrier(&self, barrier: &ImageBarrier<'_>) -> Result<()>;

    fn begin_render_pass(
        &self,
        render_pass: &Arc<dyn RenderPassObject>,
        framebuffer: &Arc<dyn Framebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()>;

    fn end_render_pass(&self) -> Result<()>;

    fn bind_pipeline(&self, bind_point: PipelineBindPoint, pipeline: &dyn Pipeline) -> Result<()>;

    fn bind_descriptor_set(
        &self,
        bind_point: PipelineBindPoint,
        pipeline: &dyn Pipeline,
        first_set: u32,
        descriptor_set: &dyn DescriptorSet,
    ) -> Result<()>;

    fn set_viewport(&self, viewport: &Viewport) -> Result<()>;

    fn set_scissor(&self, scissor: &Rect2D) -> Result<()>;

    fn set_stencil_reference(&self, face: StencilFace, reference: u32) -> Result<()>;

    fn bind_vertex_buffer(&self, binding: u32, buffer: &dyn DeviceBuffer, offset: u64) -> Result<()>;

    fn bind_index_buffer(&self, buffer: &dyn DeviceBuffer, offset: u64, index_type: IndexType) -> Result<()>;

    fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()>;
}
