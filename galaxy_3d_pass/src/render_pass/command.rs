/// Draw commands and their resource bindings

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::graphics_device::{BufferView, IndexType, Pipeline, Rect2D, Sampler, Texture};

/// Buffer slot reserved for per-vertex data
///
/// A buffer bound here is bound directly as vertex buffer 0, never through
/// a descriptor set.
pub const RESERVED_VERTEX_BUFFER_INDEX: usize = 14;

/// Uniform block metadata declared by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderUniformSlot {
    pub name: String,
    /// Descriptor binding number
    pub binding: u32,
}

impl ShaderUniformSlot {
    pub fn new(name: &str, binding: u32) -> Self {
        Self { name: name.to_string(), binding }
    }
}

/// Sampled image metadata declared by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledImageSlot {
    pub name: String,
    /// Descriptor binding number
    pub binding: u32,
}

impl SampledImageSlot {
    pub fn new(name: &str, binding: u32) -> Self {
        Self { name: name.to_string(), binding }
    }
}

/// Resources bound for one shader stage, keyed by logical slot index
#[derive(Clone, Default)]
pub struct Bindings {
    pub uniforms: FxHashMap<usize, ShaderUniformSlot>,
    pub sampled_images: FxHashMap<usize, SampledImageSlot>,
    pub buffers: FxHashMap<usize, BufferView>,
    pub textures: FxHashMap<usize, Arc<dyn Texture>>,
    pub samplers: FxHashMap<usize, Arc<dyn Sampler>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_buffer(&mut self, index: usize, slot: ShaderUniformSlot, view: BufferView) -> &mut Self {
        self.uniforms.insert(index, slot);
        self.buffers.insert(index, view);
        self
    }

    pub fn bind_texture(&mut self, index: usize, slot: SampledImageSlot, texture: Arc<dyn Texture>) -> &mut Self {
        self.sampled_images.insert(index, slot);
        self.textures.insert(index, texture);
        self
    }

    pub fn bind_sampler(&mut self, index: usize, slot: SampledImageSlot, sampler: Arc<dyn Sampler>) -> &mut Self {
        self.sampled_images.insert(index, slot);
        self.samplers.insert(index, sampler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty() && self.textures.is_empty() && self.samplers.is_empty()
    }
}

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Vertex data of one draw
#[derive(Clone)]
pub struct VertexBuffer {
    pub vertex_buffer: BufferView,
    pub index_buffer: BufferView,
    pub index_count: u32,
    pub index_type: IndexType,
}

/// One indexed draw
#[derive(Clone)]
pub struct Command {
    /// Debug label; empty means no debug group
    pub label: String,
    /// Commands without a pipeline are skipped at encode time
    pub pipeline: Option<Arc<dyn Pipeline>>,
    pub vertex_bindings: Bindings,
    pub fragment_bindings: Bindings,
    pub index_buffer: Option<BufferView>,
    pub index_count: u32,
    pub instance_count: u32,
    pub base_vertex: i32,
    pub index_type: IndexType,
    /// Full target when None
    pub viewport: Option<Rect>,
    /// Full target when None
    pub scissor: Option<Rect2D>,
    pub stencil_reference: u32,
}

impl Default for Command {
    fn default() -> Self {
        Self {
            label: String::new(),
            pipeline: None,
            vertex_bindings: Bindings::default(),
            fragment_bindings: Bindings::default(),
            index_buffer: None,
            index_count: 0,
            instance_count: 1,
            base_vertex: 0,
            index_type: IndexType::U16,
            viewport: None,
            scissor: None,
            stencil_reference: 0,
        }
    }
}

impl Command {
    pub fn new(pipeline: Arc<dyn Pipeline>) -> Self {
        Self {
            pipeline: Some(pipeline),
            ..Self::default()
        }
    }

    /// Bind vertex data: vertex buffer in the reserved slot, index buffer,
    /// index count and index type
    pub fn bind_vertices(&mut self, buffer: VertexBuffer) -> &mut Self {
        self.vertex_bindings
            .buffers
            .insert(RESERVED_VERTEX_BUFFER_INDEX, buffer.vertex_buffer);
        self.index_buffer = Some(buffer.index_buffer);
        self.index_count = buffer.index_count;
        self.index_type = buffer.index_type;
        self
    }

    /// Vertex buffer view bound in the reserved slot
    pub fn vertex_buffer(&self) -> Option<&BufferView> {
        self.vertex_bindings.buffers.get(&RESERVED_VERTEX_BUFFER_INDEX)
    }

    /// True when the draw would produce nothing
    pub fn is_empty_draw(&self) -> bool {
        self.index_count == 0 || self.instance_count == 0
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
