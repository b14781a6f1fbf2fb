/// VulkanCommandEncoder and VulkanCommandBuffer
///
/// The encoder owns one primary command buffer (recording from creation),
/// the descriptor pool pages its descriptor sets come from, and every
/// resource the recorded commands reference. `submit()` hands the buffer to
/// the graphics queue once, waits for it, then releases the tracked resources.

use galaxy_3d_pass::galaxy3d::{Config, Error, Result};
use galaxy_3d_pass::galaxy3d::device::{
    ClearValue, CommandBuffer as PassCommandBuffer, CommandEncoder, DescriptorSet as PassDescriptorSet,
    DescriptorSetLayout, DeviceBuffer as PassDeviceBuffer, Framebuffer as PassFramebuffer,
    ImageBarrier, IndexType, Pipeline as PassPipeline, PipelineBindPoint, Rect2D,
    RenderPassObject, StencilFace, SubpassContents, Texture as PassTexture, TrackedResource, Viewport,
};
use galaxy_3d_pass::{engine_bail, engine_debug, engine_err, engine_error, engine_trace, engine_warn};
use ash::vk;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::vulkan_buffer::VulkanDeviceBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::VulkanDescriptorSet;
use crate::vulkan_format::{
    access_to_vk, barrier_aspect, bind_point_to_vk, clear_value_to_vk, index_type_to_vk,
    stage_to_vk, stencil_face_to_vk, texture_layout_to_vk,
};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::{VulkanDescriptorSetLayout, VulkanPipeline};
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_texture::VulkanTexture;

// ===== COMMAND BUFFER =====

#[derive(Debug, Default)]
struct RecordingState {
    is_recording: bool,
    in_render_pass: bool,
}

/// Vulkan command buffer implementation
///
/// Records into a primary command buffer owned by a `VulkanCommandEncoder`.
pub struct VulkanCommandBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) command_buffer: vk::CommandBuffer,
    state: Mutex<RecordingState>,
}

impl VulkanCommandBuffer {
    fn new(ctx: Arc<GpuContext>, command_buffer: vk::CommandBuffer) -> Self {
        Self {
            ctx,
            command_buffer,
            state: Mutex::new(RecordingState::default()),
        }
    }

    /// Underlying Vulkan command buffer
    pub fn handle(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Check the recording state, then hand the state to `f`
    fn with_state<T>(&self, f: impl FnOnce(&mut RecordingState) -> Result<T>) -> Result<T> {
        let mut state = self.state
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "Command buffer state lock poisoned"))?;
        if !state.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }
        f(&mut state)
    }

    fn require_render_pass(&self) -> Result<()> {
        self.with_state(|state| {
            if !state.in_render_pass {
                return Err(Error::BackendError("Not inside a render pass".to_string()));
            }
            Ok(())
        })
    }

    fn begin(&self) -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }

        let mut state = self.state
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "Command buffer state lock poisoned"))?;
        state.is_recording = true;
        state.in_render_pass = false;
        Ok(())
    }

    fn end(&self) -> Result<()> {
        self.with_state(|state| {
            if state.in_render_pass {
                return Err(Error::BackendError("Render pass not ended before ending command buffer".to_string()));
            }
            unsafe {
                self.ctx.device
                    .end_command_buffer(self.command_buffer)
                    .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to end command buffer: {:?}", e))?;
            }
            state.is_recording = false;
            Ok(())
        })
    }
}

fn downcast_buffer(buffer: &dyn PassDeviceBuffer) -> Result<&VulkanDeviceBuffer> {
    buffer
        .as_any()
        .downcast_ref::<VulkanDeviceBuffer>()
        .ok_or_else(|| Error::InvalidResource("Buffer is not a Vulkan buffer".to_string()))
}

fn downcast_pipeline(pipeline: &dyn PassPipeline) -> Result<&VulkanPipeline> {
    pipeline
        .as_any()
        .downcast_ref::<VulkanPipeline>()
        .ok_or_else(|| Error::InvalidResource(format!("Pipeline '{}' is not a Vulkan pipeline", pipeline.label())))
}

impl PassCommandBuffer for VulkanCommandBuffer {
    fn pipeline_barrier(&self, barrier: &ImageBarrier<'_>) -> Result<()> {
        let texture = barrier.texture
            .as_any()
            .downcast_ref::<VulkanTexture>()
            .ok_or_else(|| Error::InvalidResource("Barrier texture is not a Vulkan texture".to_string()))?;

        self.with_state(|state| {
            if state.in_render_pass {
                return Err(Error::BackendError("Image barrier recorded inside a render pass".to_string()));
            }

            let format = texture.descriptor().format;
            let aspect_mask = barrier_aspect(barrier.new_layout, format);

            let image_barrier = vk::ImageMemoryBarrier::default()
                .src_access_mask(access_to_vk(barrier.src_access))
                .dst_access_mask(access_to_vk(barrier.dst_access))
                .old_layout(texture_layout_to_vk(barrier.old_layout, format))
                .new_layout(texture_layout_to_vk(barrier.new_layout, format))
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(texture.image)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask,
                    base_mip_level: 0,
                    level_count: texture.mip_levels(),
                    base_array_layer: 0,
                    layer_count: 1,
                });

            unsafe {
                self.ctx.device.cmd_pipeline_barrier(
                    self.command_buffer,
                    stage_to_vk(barrier.src_stage),
                    stage_to_vk(barrier.dst_stage),
                    vk::DependencyFlags::empty(),
                    &[],
                    &[],
                    &[image_barrier],
                );
            }
            Ok(())
        })
    }

    fn begin_render_pass(
        &self,
        render_pass: &Arc<dyn RenderPassObject>,
        framebuffer: &Arc<dyn PassFramebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
        contents: SubpassContents,
    ) -> Result<()> {
        let vk_render_pass = render_pass
            .as_any()
            .downcast_ref::<VulkanRenderPass>()
            .ok_or_else(|| Error::InvalidResource("Render pass is not a Vulkan render pass".to_string()))?;
        let vk_framebuffer = framebuffer
            .as_any()
            .downcast_ref::<VulkanFramebuffer>()
            .ok_or_else(|| Error::InvalidResource("Framebuffer is not a Vulkan framebuffer".to_string()))?;

        self.with_state(|state| {
            if state.in_render_pass {
                return Err(Error::BackendError("Already inside a render pass".to_string()));
            }

            let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();

            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .framebuffer(vk_framebuffer.framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: render_area.x, y: render_area.y },
                    extent: vk::Extent2D { width: render_area.width, height: render_area.height },
                })
                .clear_values(&vk_clear_values);

            let contents = match contents {
                SubpassContents::Inline => vk::SubpassContents::INLINE,
            };

            unsafe {
                self.ctx.device.cmd_begin_render_pass(self.command_buffer, &render_pass_info, contents);
            }
            state.in_render_pass = true;
            Ok(())
        })
    }

    fn end_render_pass(&self) -> Result<()> {
        self.with_state(|state| {
            if !state.in_render_pass {
                return Err(Error::BackendError("Not inside a render pass".to_string()));
            }
            unsafe {
                self.ctx.device.cmd_end_render_pass(self.command_buffer);
            }
            state.in_render_pass = false;
            Ok(())
        })
    }

    fn bind_pipeline(&self, bind_point: PipelineBindPoint, pipeline: &dyn PassPipeline) -> Result<()> {
        let vk_pipeline = downcast_pipeline(pipeline)?;
        self.require_render_pass()?;

        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                bind_point_to_vk(bind_point),
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_descriptor_set(
        &self,
        bind_point: PipelineBindPoint,
        pipeline: &dyn PassPipeline,
        first_set: u32,
        descriptor_set: &dyn PassDescriptorSet,
    ) -> Result<()> {
        let vk_pipeline = downcast_pipeline(pipeline)?;
        let vk_set = descriptor_set
            .as_any()
            .downcast_ref::<VulkanDescriptorSet>()
            .ok_or_else(|| Error::InvalidResource("Descriptor set is not a Vulkan descriptor set".to_string()))?;
        self.require_render_pass()?;

        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                bind_point_to_vk(bind_point),
                vk_pipeline.pipeline_layout,
                first_set,
                &[vk_set.descriptor_set],
                &[], // dynamic_offsets
            );
        }
        Ok(())
    }

    fn set_viewport(&self, viewport: &Viewport) -> Result<()> {
        self.require_render_pass()?;

        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&self, scissor: &Rect2D) -> Result<()> {
        self.require_render_pass()?;

        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D { width: scissor.width, height: scissor.height });

        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn set_stencil_reference(&self, face: StencilFace, reference: u32) -> Result<()> {
        self.require_render_pass()?;

        unsafe {
            self.ctx.device.cmd_set_stencil_reference(self.command_buffer, stencil_face_to_vk(face), reference);
        }
        Ok(())
    }

    fn bind_vertex_buffer(&self, binding: u32, buffer: &dyn PassDeviceBuffer, offset: u64) -> Result<()> {
        let vk_buffer = downcast_buffer(buffer)?;
        self.require_render_pass()?;

        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                binding,
                &[vk_buffer.buffer],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(&self, buffer: &dyn PassDeviceBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        let vk_buffer = downcast_buffer(buffer)?;
        self.require_render_pass()?;

        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
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
        self.require_render_pass()?;

        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }
}

// ===== DESCRIPTOR POOLS =====

/// Descriptor pool pages, grown when the current page is exhausted
struct DescriptorPools {
    pools: Vec<vk::DescriptorPool>,
    max_sets: u32,
    uniform_buffers: u32,
    combined_image_samplers: u32,
}

impl DescriptorPools {
    fn new(config: &Config) -> Self {
        Self {
            pools: Vec::new(),
            max_sets: config.descriptor_pool_max_sets.max(1),
            uniform_buffers: config.descriptor_pool_uniform_buffers.max(1),
            combined_image_samplers: config.descriptor_pool_combined_image_samplers.max(1),
        }
    }

    fn create_page(&mut self, device: &ash::Device) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: self.combined_image_samplers,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: self.uniform_buffers,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(self.max_sets);

        let pool = unsafe {
            device.create_descriptor_pool(&info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create descriptor pool: {:?}", e);
                    Error::BackendError(format!("Failed to create descriptor pool: {:?}", e))
                })?
        };
        self.pools.push(pool);
        engine_trace!("galaxy3d::vulkan", "Descriptor pool page {} created", self.pools.len());
        Ok(pool)
    }

    fn allocate(&mut self, device: &ash::Device, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let pool = match self.pools.last() {
            Some(pool) => *pool,
            None => self.create_page(device)?,
        };

        let set_layouts = [layout];
        match Self::allocate_from(device, pool, &set_layouts) {
            Ok(set) => Ok(set),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                let pool = self.create_page(device)?;
                Self::allocate_from(device, pool, &set_layouts)
                    .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to allocate descriptor set from fresh pool: {:?}", e))
            }
            Err(e) => Err(engine_err!("galaxy3d::vulkan", "Failed to allocate descriptor set: {:?}", e)),
        }
    }

    fn allocate_from(
        device: &ash::Device,
        pool: vk::DescriptorPool,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> std::result::Result<vk::DescriptorSet, vk::Result> {
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(set_layouts);

        let sets = unsafe { device.allocate_descriptor_sets(&info)? };
        sets.into_iter().next().ok_or(vk::Result::ERROR_UNKNOWN)
    }

    fn destroy(&mut self, device: &ash::Device) {
        for pool in self.pools.drain(..) {
            unsafe {
                device.destroy_descriptor_pool(pool, None);
            }
        }
    }
}

// ===== COMMAND ENCODER =====

/// Vulkan command encoder implementation
pub struct VulkanCommandEncoder {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    cmd_buffer: VulkanCommandBuffer,
    descriptor_pools: Mutex<DescriptorPools>,
    tracked: Mutex<Vec<TrackedResource>>,
    debug_labels: bool,
    submitted: AtomicBool,
}

impl VulkanCommandEncoder {
    pub(crate) fn new(ctx: Arc<GpuContext>, config: &Config) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT);

            let command_pool = ctx.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create command pool: {:?}", e);
                    Error::BackendError(format!("Failed to create command pool: {:?}", e))
                })?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) if !buffers.is_empty() => buffers[0],
                Ok(_) | Err(_) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    engine_error!("galaxy3d::vulkan", "Failed to allocate command buffer");
                    return Err(Error::BackendError("Failed to allocate command buffer".to_string()));
                }
            };

            let encoder = Self {
                cmd_buffer: VulkanCommandBuffer::new(Arc::clone(&ctx), command_buffer),
                descriptor_pools: Mutex::new(DescriptorPools::new(config)),
                tracked: Mutex::new(Vec::new()),
                debug_labels: ctx.debug_labels_enabled()
                    && (config.enable_debug_labels || cfg!(feature = "vulkan-validation")),
                submitted: AtomicBool::new(false),
                command_pool,
                ctx,
            };
            encoder.cmd_buffer.begin()?;
            Ok(encoder)
        }
    }

    /// Concrete command buffer
    pub fn vulkan_command_buffer(&self) -> &VulkanCommandBuffer {
        &self.cmd_buffer
    }

    /// Number of resources currently kept alive by this encoder
    pub fn tracked_count(&self) -> usize {
        self.tracked.lock().map(|tracked| tracked.len()).unwrap_or(0)
    }

    /// Whether `submit()` has been called
    pub fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::Acquire)
    }

    /// End recording, submit to the graphics queue and wait for completion
    ///
    /// Tracked resources are released once the GPU is done with them. An
    /// encoder submits at most once; later calls fail.
    pub fn submit(&self) -> Result<()> {
        if self.submitted.swap(true, Ordering::AcqRel) {
            engine_bail!("galaxy3d::vulkan", "Command encoder already submitted");
        }

        if let Err(e) = self.cmd_buffer.end() {
            self.release_tracked();
            return Err(e);
        }

        unsafe {
            let fence = match self.ctx.device.create_fence(&vk::FenceCreateInfo::default(), None) {
                Ok(fence) => fence,
                Err(e) => {
                    self.release_tracked();
                    engine_bail!("galaxy3d::vulkan", "Failed to create submit fence: {:?}", e);
                }
            };

            let command_buffers = [self.cmd_buffer.command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let submitted = match self.ctx.queue_lock.lock() {
                Ok(_queue) => self.ctx.device
                    .queue_submit(self.ctx.graphics_queue, &[submit_info], fence)
                    .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to submit commands to GPU queue: {:?}", e)),
                Err(_) => Err(engine_err!("galaxy3d::vulkan", "Graphics queue lock poisoned")),
            };
            if let Err(e) = submitted {
                self.ctx.device.destroy_fence(fence, None);
                self.release_tracked();
                return Err(e);
            }

            let waited = self.ctx.device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to wait for submit fence: {:?}", e));
            self.ctx.device.destroy_fence(fence, None);
            waited?;
        }

        let released = self.release_tracked();
        engine_debug!("galaxy3d::vulkan", "Command encoder submitted, released {} tracked resources", released);
        Ok(())
    }

    fn release_tracked(&self) -> usize {
        match self.tracked.lock() {
            Ok(mut tracked) => {
                let count = tracked.len();
                tracked.clear();
                count
            }
            Err(_) => 0,
        }
    }
}

impl CommandEncoder for VulkanCommandEncoder {
    fn command_buffer(&self) -> &dyn PassCommandBuffer {
        &self.cmd_buffer
    }

    fn track(&self, resource: TrackedResource) -> Result<()> {
        if self.is_submitted() {
            engine_bail!("galaxy3d::vulkan", "Cannot track resources on a submitted command encoder");
        }
        let mut tracked = self.tracked
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "Tracked resource lock poisoned"))?;
        tracked.push(resource);
        Ok(())
    }

    fn push_debug_group(&self, label: &str) {
        if !self.debug_labels {
            return;
        }
        let Some(debug_utils) = &self.ctx.debug_utils_device else {
            return;
        };
        let Ok(name) = CString::new(label) else {
            engine_warn!("galaxy3d::vulkan", "Debug group '{}' contains a NUL byte, not emitted", label);
            return;
        };

        let label_info = vk::DebugUtilsLabelEXT::default().label_name(&name);
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(self.cmd_buffer.command_buffer, &label_info);
        }
    }

    fn pop_debug_group(&self) {
        if !self.debug_labels {
            return;
        }
        if let Some(debug_utils) = &self.ctx.debug_utils_device {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.cmd_buffer.command_buffer);
            }
        }
    }

    fn allocate_descriptor_set(&self, layout: &dyn DescriptorSetLayout) -> Result<Arc<dyn PassDescriptorSet>> {
        let vk_layout = layout
            .as_any()
            .downcast_ref::<VulkanDescriptorSetLayout>()
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "Descriptor set layout is not a Vulkan layout");
                Error::InvalidResource("Descriptor set layout is not a Vulkan layout".to_string())
            })?;

        let mut pools = self.descriptor_pools
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "Descriptor pool lock poisoned"))?;
        let set = pools.allocate(&self.ctx.device, vk_layout.layout)?;

        Ok(Arc::new(VulkanDescriptorSet::new(set)))
    }
}

impl Drop for VulkanCommandEncoder {
    fn drop(&mut self) {
        unsafe {
            if let Ok(pools) = self.descriptor_pools.get_mut() {
                pools.destroy(&self.ctx.device);
            }
            // Command buffer is freed with its pool
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
