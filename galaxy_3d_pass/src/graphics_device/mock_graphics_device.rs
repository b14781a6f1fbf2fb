/// Mock graphics device for unit tests (no GPU required)
///
/// Every mock shares one ordered call log (`MockDevice`) so tests can assert
/// on the exact sequence of native calls a render pass issues. Each mock has
/// failure injection switches for the error paths.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use glam::UVec2;

use std::sync::Weak;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Allocator, BufferView, ClearValue, Context, Range, ResidentBuffer, CommandBuffer, CommandEncoder, DescriptorSet, DescriptorSetLayout,
    DescriptorWrite, DeviceBuffer, DeviceBufferDesc, Framebuffer, FramebufferDesc, ImageBarrier,
    ImageLayout, IndexType, LayoutTransition, Pipeline, PipelineBindPoint, Rect2D,
    RenderPassDesc, RenderPassObject, SampleCount, Sampler, SamplerDescriptor, StencilFace,
    SubpassContents, Texture, TextureDescriptor, TextureFormat, TrackedResource, Viewport,
};

// ============================================================================
// Mock Device (shared call log)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.lock().unwrap().iter().position(|c| c.starts_with(prefix))
    }

    /// Calls starting with `prefix`, in order
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }
}

fn texture_name(texture: &dyn Texture) -> String {
    texture
        .as_any()
        .downcast_ref::<MockTexture>()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "<foreign texture>".to_string())
}

fn buffer_name(buffer: &dyn DeviceBuffer) -> String {
    buffer
        .as_any()
        .downcast_ref::<MockDeviceBuffer>()
        .map(|b| b.name.clone())
        .unwrap_or_else(|| "<foreign buffer>".to_string())
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub name: String,
    pub descriptor: TextureDescriptor,
    pub layout: Mutex<ImageLayout>,
    pub fail_set_layout: AtomicBool,
}

impl MockTexture {
    pub fn new(name: &str, format: TextureFormat, sample_count: SampleCount, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            descriptor: TextureDescriptor {
                format,
                sample_count,
                size: UVec2::new(width, height),
                mip_count: 1,
            },
            layout: Mutex::new(ImageLayout::Undefined),
            fail_set_layout: AtomicBool::new(false),
        }
    }

    pub fn color(name: &str, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self::new(name, TextureFormat::R8G8B8A8_UNORM, SampleCount::S1, width, height))
    }

    pub fn multisampled(name: &str, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self::new(name, TextureFormat::R8G8B8A8_UNORM, SampleCount::S4, width, height))
    }

    pub fn depth(name: &str, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self::new(name, TextureFormat::D32_SFLOAT, SampleCount::S1, width, height))
    }

    pub fn stencil(name: &str, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self::new(name, TextureFormat::S8_UINT, SampleCount::S1, width, height))
    }
}

impl Texture for MockTexture {
    fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    fn layout(&self) -> ImageLayout {
        *self.layout.lock().unwrap()
    }

    fn set_layout(&self, transition: &LayoutTransition<'_>) -> Result<()> {
        if self.fail_set_layout.load(Ordering::SeqCst) {
            return Err(Error::BackendError(format!("set_layout failed for {}", self.name)));
        }
        let old_layout = std::mem::replace(&mut *self.layout.lock().unwrap(), transition.new_layout);
        transition.encode_barrier(self, old_layout)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Device Buffer + Allocator
// ============================================================================

#[derive(Debug)]
pub struct MockDeviceBuffer {
    pub name: String,
    pub data: Mutex<Vec<u8>>,
}

impl MockDeviceBuffer {
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            data: Mutex::new(vec![0; size as usize]),
        }
    }
}

impl DeviceBuffer for MockDeviceBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn copy_from(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(Error::InvalidResource(format!("copy of {} bytes at {} overflows {}", data.len(), offset, self.name)));
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockAllocator {
    pub device: MockDevice,
    pub created: AtomicUsize,
    pub fail_create_buffer: AtomicBool,
}

impl MockAllocator {
    pub fn new(device: &MockDevice) -> Self {
        Self {
            device: device.clone(),
            created: AtomicUsize::new(0),
            fail_create_buffer: AtomicBool::new(false),
        }
    }
}

impl Allocator for MockAllocator {
    fn create_buffer(&self, desc: &DeviceBufferDesc) -> Result<Arc<dyn DeviceBuffer>> {
        if self.fail_create_buffer.load(Ordering::SeqCst) {
            return Err(Error::OutOfMemory);
        }
        let id = self.created.fetch_add(1, Ordering::SeqCst);
        self.device.record(format!("create_buffer {}", desc.size));
        Ok(Arc::new(MockDeviceBuffer::new(&format!("host#{}", id), desc.size)))
    }
}

// ============================================================================
// Mock Sampler
// ============================================================================

#[derive(Debug)]
pub struct MockSampler {
    pub name: String,
    pub descriptor: SamplerDescriptor,
}

impl MockSampler {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            descriptor: SamplerDescriptor::default(),
        })
    }
}

impl Sampler for MockSampler {
    fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

#[derive(Debug)]
pub struct MockDescriptorSetLayout;

impl DescriptorSetLayout for MockDescriptorSetLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockPipeline {
    pub name: String,
    pub layout: MockDescriptorSetLayout,
}

impl MockPipeline {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            layout: MockDescriptorSetLayout,
        })
    }
}

impl Pipeline for MockPipeline {
    fn label(&self) -> &str {
        &self.name
    }

    fn descriptor_set_layout(&self) -> &dyn DescriptorSetLayout {
        &self.layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Render Pass Object / Framebuffer / Descriptor Set
// ============================================================================

#[derive(Debug)]
pub struct MockRenderPassObject {
    pub desc: RenderPassDesc,
    pub debug_name: Mutex<Option<String>>,
}

impl RenderPassObject for MockRenderPassObject {
    fn attachment_count(&self) -> u32 {
        self.desc.attachments.len() as u32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<String>,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct MockDescriptorSet {
    pub id: usize,
}

impl DescriptorSet for MockDescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Context
// ============================================================================

#[derive(Debug)]
pub struct MockContext {
    pub device: MockDevice,
    pub config: Config,
    pub allocator: MockAllocator,
    pub render_pass_descs: Mutex<Vec<RenderPassDesc>>,
    pub fail_create_render_pass: AtomicBool,
    pub fail_create_framebuffer: AtomicBool,
    pub fail_update_descriptor_set: AtomicBool,
}

impl MockContext {
    pub fn new(device: &MockDevice) -> Arc<Self> {
        Arc::new(Self {
            device: device.clone(),
            config: Config::default(),
            allocator: MockAllocator::new(device),
            render_pass_descs: Mutex::new(Vec::new()),
            fail_create_render_pass: AtomicBool::new(false),
            fail_create_framebuffer: AtomicBool::new(false),
            fail_update_descriptor_set: AtomicBool::new(false),
        })
    }
}

impl Context for MockContext {
    fn config(&self) -> &Config {
        &self.config
    }

    fn resource_allocator(&self) -> &dyn Allocator {
        &self.allocator
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPassObject>> {
        if self.fail_create_render_pass.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock render pass creation failed".to_string()));
        }
        self.device.record(format!("create_render_pass attachments={}", desc.attachments.len()));
        self.render_pass_descs.lock().unwrap().push(desc.clone());
        Ok(Arc::new(MockRenderPassObject {
            desc: desc.clone(),
            debug_name: Mutex::new(None),
        }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc<'_>) -> Result<Arc<dyn Framebuffer>> {
        if self.fail_create_framebuffer.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock framebuffer creation failed".to_string()));
        }
        let attachments: Vec<String> = desc.attachments.iter().map(|t| texture_name(t.as_ref())).collect();
        self.device.record(format!(
            "create_framebuffer {}x{}x{} [{}]",
            desc.width,
            desc.height,
            desc.layers,
            attachments.join(", ")
        ));
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            attachments,
        }))
    }

    fn update_descriptor_set(&self, _descriptor_set: &dyn DescriptorSet, writes: &[DescriptorWrite]) -> Result<()> {
        if self.fail_update_descriptor_set.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock descriptor update failed".to_string()));
        }
        let summary: Vec<String> = writes
            .iter()
            .map(|w| match w {
                DescriptorWrite::UniformBuffer { binding, buffer, offset, range } => {
                    format!("{}:uniform {} {}+{}", binding, buffer_name(buffer.as_ref()), offset, range)
                }
                DescriptorWrite::CombinedImageSampler { binding, texture, layout, .. } => {
                    format!("{}:image {} {:?}", binding, texture_name(texture.as_ref()), layout)
                }
            })
            .collect();
        self.device.record(format!("update_descriptor_set [{}]", summary.join(", ")));
        Ok(())
    }

    fn set_debug_name(&self, render_pass: &dyn RenderPassObject, label: &str) {
        if let Some(object) = render_pass.as_any().downcast_ref::<MockRenderPassObject>() {
            *object.debug_name.lock().unwrap() = Some(label.to_string());
        }
        self.device.record(format!("set_debug_name {}", label));
    }
}

// ============================================================================
// Mock Command Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockCommandBuffer {
    pub device: MockDevice,
    pub in_render_pass: AtomicBool,
    /// Barriers recorded while a render pass was active
    pub barriers_inside_pass: AtomicUsize,
    pub clear_values: Mutex<Vec<Vec<ClearValue>>>,
    pub fail_draw: AtomicBool,
}

impl MockCommandBuffer {
    pub fn new(device: &MockDevice) -> Self {
        Self {
            device: device.clone(),
            in_render_pass: AtomicBool::new(false),
            barriers_inside_pass: AtomicUsize::new(0),
            clear_values: Mutex::new(Vec::new()),
            fail_draw: AtomicBool::new(false),
        }
    }
}

impl CommandBuffer for MockCommandBuffer {
    fn pipeline_barrier(&self, barrier: &ImageBarrier<'_>) -> Result<()> {
        if self.in_render_pass.load(Ordering::SeqCst) {
            self.barriers_inside_pass.fetch_add(1, Ordering::SeqCst);
        }
        self.device.record(format!(
            "barrier {} {:?}->{:?}",
            texture_name(barrier.texture),
            barrier.old_layout,
            barrier.new_layout
        ));
        Ok(())
    }

    fn begin_render_pass(
        &self,
        _render_pass: &Arc<dyn RenderPassObject>,
        _framebuffer: &Arc<dyn Framebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
        _contents: SubpassContents,
    ) -> Result<()> {
        self.in_render_pass.store(true, Ordering::SeqCst);
        self.clear_values.lock().unwrap().push(clear_values.to_vec());
        self.device.record(format!(
            "begin_render_pass {}x{} clears={}",
            render_area.width,
            render_area.height,
            clear_values.len()
        ));
        Ok(())
    }

    fn end_render_pass(&self) -> Result<()> {
        self.in_render_pass.store(false, Ordering::SeqCst);
        self.device.record("end_render_pass");
        Ok(())
    }

    fn bind_pipeline(&self, _bind_point: PipelineBindPoint, pipeline: &dyn Pipeline) -> Result<()> {
        self.device.record(format!("bind_pipeline {}", pipeline.label()));
        Ok(())
    }

    fn bind_descriptor_set(
        &self,
        _bind_point: PipelineBindPoint,
        _pipeline: &dyn Pipeline,
        first_set: u32,
        descriptor_set: &dyn DescriptorSet,
    ) -> Result<()> {
        let id = descriptor_set
            .as_any()
            .downcast_ref::<MockDescriptorSet>()
            .map(|s| s.id)
            .unwrap_or(usize::MAX);
        self.device.record(format!("bind_descriptor_set {} set#{}", first_set, id));
        Ok(())
    }

    fn set_viewport(&self, viewport: &Viewport) -> Result<()> {
        self.device.record(format!(
            "set_viewport {} {} {} {} {}..{}",
            viewport.x, viewport.y, viewport.width, viewport.height, viewport.min_depth, viewport.max_depth
        ));
        Ok(())
    }

    fn set_scissor(&self, scissor: &Rect2D) -> Result<()> {
        self.device.record(format!(
            "set_scissor {} {} {} {}",
            scissor.x, scissor.y, scissor.width, scissor.height
        ));
        Ok(())
    }

    fn set_stencil_reference(&self, face: StencilFace, reference: u32) -> Result<()> {
        self.device.record(format!("set_stencil_reference {:?} {}", face, reference));
        Ok(())
    }

    fn bind_vertex_buffer(&self, binding: u32, buffer: &dyn DeviceBuffer, offset: u64) -> Result<()> {
        self.device.record(format!("bind_vertex_buffer {} {} {}", binding, buffer_name(buffer), offset));
        Ok(())
    }

    fn bind_index_buffer(&self, buffer: &dyn DeviceBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.device.record(format!("bind_index_buffer {} {} {:?}", buffer_name(buffer), offset, index_type));
        Ok(())
    }

    fn draw_indexed(
        &self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        if self.fail_draw.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock draw failed".to_string()));
        }
        self.device.record(format!(
            "draw_indexed {} {} {} {} {}",
            index_count, instance_count, first_index, vertex_offset, first_instance
        ));
        Ok(())
    }
}

// ============================================================================
// Mock Command Encoder
// ============================================================================

pub struct MockCommandEncoder {
    pub device: MockDevice,
    pub cmd_buffer: MockCommandBuffer,
    pub tracked_count: AtomicUsize,
    pub descriptor_sets: AtomicUsize,
    pub fail_track: AtomicBool,
    pub fail_allocate_descriptor_set: AtomicBool,
    tracked: Mutex<Vec<TrackedResource>>,
}

impl MockCommandEncoder {
    pub fn new(device: &MockDevice) -> Arc<Self> {
        Arc::new(Self {
            device: device.clone(),
            cmd_buffer: MockCommandBuffer::new(device),
            tracked_count: AtomicUsize::new(0),
            descriptor_sets: AtomicUsize::new(0),
            fail_track: AtomicBool::new(false),
            fail_allocate_descriptor_set: AtomicBool::new(false),
            tracked: Mutex::new(Vec::new()),
        })
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.lock().unwrap().len()
    }
}

fn describe(resource: &TrackedResource) -> String {
    match resource {
        TrackedResource::Texture(t) => format!("texture {}", texture_name(t.as_ref())),
        TrackedResource::DeviceBuffer(b) => format!("buffer {}", buffer_name(b.as_ref())),
        TrackedResource::Sampler(s) => {
            let name = s.as_any().downcast_ref::<MockSampler>().map(|s| s.name.clone()).unwrap_or_default();
            format!("sampler {}", name)
        }
        TrackedResource::Framebuffer(_) => "framebuffer".to_string(),
        TrackedResource::RenderPass(_) => "render_pass".to_string(),
    }
}

impl CommandEncoder for MockCommandEncoder {
    fn command_buffer(&self) -> &dyn CommandBuffer {
        &self.cmd_buffer
    }

    fn track(&self, resource: TrackedResource) -> Result<()> {
        if self.fail_track.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock tracking failed".to_string()));
        }
        self.device.record(format!("track {}", describe(&resource)));
        self.tracked_count.fetch_add(1, Ordering::SeqCst);
        self.tracked.lock().unwrap().push(resource);
        Ok(())
    }

    fn push_debug_group(&self, label: &str) {
        self.device.record(format!("push_debug_group {}", label));
    }

    fn pop_debug_group(&self) {
        self.device.record("pop_debug_group");
    }

    fn allocate_descriptor_set(&self, _layout: &dyn DescriptorSetLayout) -> Result<Arc<dyn DescriptorSet>> {
        if self.fail_allocate_descriptor_set.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock descriptor pool exhausted".to_string()));
        }
        let id = self.descriptor_sets.fetch_add(1, Ordering::SeqCst);
        self.device.record(format!("allocate_descriptor_set set#{}", id));
        Ok(Arc::new(MockDescriptorSet { id }))
    }
}

// ============================================================================
// Fixture helpers
// ============================================================================

/// Device, context and encoder sharing one call log
pub struct MockSetup {
    pub device: MockDevice,
    pub context: Arc<MockContext>,
    pub encoder: Arc<MockCommandEncoder>,
}

impl MockSetup {
    pub fn new() -> Self {
        let device = MockDevice::new();
        Self {
            context: MockContext::new(&device),
            encoder: MockCommandEncoder::new(&device),
            device,
        }
    }

    pub fn context(&self) -> Arc<dyn Context> {
        self.context.clone()
    }

    pub fn weak_encoder(&self) -> Weak<dyn CommandEncoder> {
        let encoder: Arc<dyn CommandEncoder> = self.encoder.clone();
        Arc::downgrade(&encoder)
    }
}

/// View over a resident mock buffer of `size` bytes
pub fn resident_view(name: &str, size: u64) -> BufferView {
    let device_buffer = Arc::new(MockDeviceBuffer::new(name, size));
    BufferView::new(Arc::new(ResidentBuffer::new(device_buffer)), Range::new(0, size))
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
