/// GpuContext and VulkanContext - device ownership and the Context implementation
///
/// `GpuContext` holds everything needed for GPU operations (device, allocator,
/// graphics queue, debug-utils loaders) and is shared via `Arc` by every
/// Vulkan object, so the device always outlives the objects created from it.
/// `VulkanContext` is the `Context` the render pass core talks to.

use galaxy_3d_pass::galaxy3d::{Config, Error, Result};
use galaxy_3d_pass::galaxy3d::device::{
    Allocator as PassAllocator, Context, DescriptorSet as PassDescriptorSet, DescriptorWrite,
    Framebuffer as PassFramebuffer, FramebufferDesc, RenderPassDesc, RenderPassObject,
    SamplerDescriptor, TextureDescriptor, AttachmentReference,
};
use galaxy_3d_pass::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::vulkan_allocator::VulkanAllocator;
use crate::vulkan_buffer::VulkanDeviceBuffer;
use crate::vulkan_command_encoder::VulkanCommandEncoder;
use crate::vulkan_descriptor_set::VulkanDescriptorSet;
use crate::vulkan_format::{attachment_description_to_vk, image_layout_to_vk};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_sampler::VulkanSampler;
use crate::vulkan_texture::VulkanTexture;

// ===== GPU CONTEXT =====

/// Shared GPU context for all Vulkan resources
///
/// Dropped when the last resource referencing it goes away; the drop
/// frees the allocator before destroying the device and the instance.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Serializes submissions to the graphics queue
    pub(crate) queue_lock: Mutex<()>,

    /// Debug utils device functions (labels, object names)
    pub(crate) debug_utils_device: Option<ash::ext::debug_utils::Device>,

    /// Debug utils instance functions (validation messenger)
    debug_utils_instance: Option<ash::ext::debug_utils::Instance>,

    /// Validation messenger handle
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    instance: ash::Instance,

    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
}

impl GpuContext {
    /// Whether debug labels and object names are emitted
    pub fn debug_labels_enabled(&self) -> bool {
        self.debug_utils_device.is_some()
    }

    /// Attach a debug name to any Vulkan handle (no-op without debug utils)
    pub(crate) fn set_object_name<H: vk::Handle>(&self, handle: H, name: &str) {
        let Some(debug_utils) = &self.debug_utils_device else {
            return;
        };
        let Ok(name) = CString::new(name) else {
            engine_warn!("galaxy3d::vulkan", "Debug name '{}' contains a NUL byte, not applied", name);
            return;
        };

        let name_info = vk::DebugUtilsObjectNameInfoEXT::default()
            .object_handle(handle)
            .object_name(&name);

        unsafe {
            if let Err(e) = debug_utils.set_debug_utils_object_name(&name_info) {
                engine_warn!("galaxy3d::vulkan", "Failed to set debug name: {:?}", e);
            }
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Free VkDeviceMemory pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_instance, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

// ===== VULKAN CONTEXT =====

/// Vulkan implementation of the render pass `Context`
///
/// Headless: no surface or swapchain is created. Rendering goes to textures
/// created through `create_texture`.
pub struct VulkanContext {
    gpu: Arc<GpuContext>,
    config: Config,
    allocator: VulkanAllocator,
}

impl VulkanContext {
    /// Create a Vulkan instance, pick the first GPU with a graphics queue
    /// and create the logical device
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let debug_labels = config.enable_debug_labels || cfg!(feature = "vulkan-validation");
        let validation = cfg!(feature = "vulkan-validation");

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Galaxy3D Pass")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Galaxy3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let mut extension_names = Vec::new();
            if debug_labels {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_instance, debug_messenger) = if debug_labels {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let messenger = if validation {
                    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                        .message_severity(
                            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                        )
                        .message_type(
                            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                        )
                        .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));

                    match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                        Ok(messenger) => Some(messenger),
                        Err(e) => {
                            instance.destroy_instance(None);
                            engine_error!("galaxy3d::vulkan", "Failed to create debug messenger: {:?}", e);
                            return Err(Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e)));
                        }
                    }
                } else {
                    None
                };
                (Some(debug_utils), messenger)
            } else {
                (None, None)
            };

            let destroy_instance = |instance: &ash::Instance| {
                if let (Some(debug_utils), Some(messenger)) = (&debug_utils_instance, debug_messenger) {
                    debug_utils.destroy_debug_utils_messenger(messenger, None);
                }
                instance.destroy_instance(None);
            };

            // Pick the first physical device exposing a graphics queue
            let physical_devices = match instance.enumerate_physical_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    destroy_instance(&instance);
                    engine_error!("galaxy3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e)));
                }
            };

            let selected = physical_devices.into_iter().find_map(|physical_device| {
                instance
                    .get_physical_device_queue_family_properties(physical_device)
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                    .map(|index| (physical_device, index as u32))
            });

            let Some((physical_device, graphics_family_index)) = selected else {
                destroy_instance(&instance);
                engine_error!("galaxy3d::vulkan", "No Vulkan-capable GPU with a graphics queue found");
                return Err(Error::InitializationFailed("No Vulkan-capable GPU found".to_string()));
            };

            // Separate depth/stencil layouts let depth-only and stencil-only
            // attachments sit in their own attachment layouts
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];

            let mut vulkan12_features = vk::PhysicalDeviceVulkan12Features::default()
                .separate_depth_stencil_layouts(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .push_next(&mut vulkan12_features);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    destroy_instance(&instance);
                    engine_error!("galaxy3d::vulkan", "Failed to create logical device: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to create device: {:?}", e)));
                }
            };

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    destroy_instance(&instance);
                    engine_error!("galaxy3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            let debug_utils_device = if debug_labels {
                Some(ash::ext::debug_utils::Device::new(&instance, &device))
            } else {
                None
            };

            let gpu = Arc::new(GpuContext {
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                queue_lock: Mutex::new(()),
                debug_utils_device,
                debug_utils_instance,
                debug_messenger,
                instance,
                _entry: entry,
            });

            engine_info!("galaxy3d::vulkan", "Vulkan context created (queue family {}, debug labels: {})",
                graphics_family_index, debug_labels);

            Ok(Arc::new(Self {
                allocator: VulkanAllocator::new(Arc::clone(&gpu)),
                gpu,
                config,
            }))
        }
    }

    /// Shared GPU context
    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    /// Create a 2D texture usable as attachment and sampled image
    pub fn create_texture(&self, descriptor: TextureDescriptor) -> Result<Arc<VulkanTexture>> {
        VulkanTexture::new(Arc::clone(&self.gpu), descriptor).map(Arc::new)
    }

    pub fn create_sampler(&self, descriptor: SamplerDescriptor) -> Result<Arc<VulkanSampler>> {
        VulkanSampler::new(Arc::clone(&self.gpu), descriptor).map(Arc::new)
    }

    /// Create a command encoder recording into a fresh command buffer
    pub fn create_command_encoder(&self) -> Result<Arc<VulkanCommandEncoder>> {
        VulkanCommandEncoder::new(Arc::clone(&self.gpu), &self.config).map(Arc::new)
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.gpu.device
                .device_wait_idle()
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to wait idle: {:?}", e))
        }
    }
}

/// Convert a subpass reference, keeping unused slots unused
fn attachment_reference_to_vk(reference: &AttachmentReference) -> vk::AttachmentReference {
    if reference.is_unused() {
        vk::AttachmentReference {
            attachment: vk::ATTACHMENT_UNUSED,
            layout: vk::ImageLayout::UNDEFINED,
        }
    } else {
        vk::AttachmentReference {
            attachment: reference.attachment,
            layout: image_layout_to_vk(reference.layout),
        }
    }
}

impl Context for VulkanContext {
    fn config(&self) -> &Config {
        &self.config
    }

    fn resource_allocator(&self) -> &dyn PassAllocator {
        &self.allocator
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPassObject>> {
        let attachments: Vec<vk::AttachmentDescription> = desc.attachments
            .iter()
            .map(attachment_description_to_vk)
            .collect();

        let color_refs: Vec<vk::AttachmentReference> = desc.subpass.color_refs
            .iter()
            .map(attachment_reference_to_vk)
            .collect();
        let resolve_refs: Vec<vk::AttachmentReference> = desc.subpass.resolve_refs
            .iter()
            .map(attachment_reference_to_vk)
            .collect();
        let depth_stencil_ref = attachment_reference_to_vk(&desc.subpass.depth_stencil_ref);

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(crate::vulkan_format::bind_point_to_vk(desc.subpass.bind_point))
            .color_attachments(&color_refs);

        if desc.subpass.resolve_refs.iter().any(|r| !r.is_unused()) {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }
        let has_depth_stencil = !desc.subpass.depth_stencil_ref.is_unused();
        if has_depth_stencil {
            subpass = subpass.depth_stencil_attachment(&depth_stencil_ref);
        }

        // External dependency covers attachment writes, plus depth tests when present
        let (stage_mask, access_mask) = if has_depth_stencil {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
        } else {
            (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            )
        };

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe {
            self.gpu.device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create render pass: {:?}", e))?
        };

        engine_debug!("galaxy3d::vulkan", "Created render pass with {} attachments", attachments.len());

        Ok(Arc::new(VulkanRenderPass::new(
            Arc::clone(&self.gpu),
            render_pass,
            attachments.len() as u32,
        )))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc<'_>) -> Result<Arc<dyn PassFramebuffer>> {
        let render_pass = desc.render_pass
            .as_any()
            .downcast_ref::<VulkanRenderPass>()
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "Framebuffer render pass is not a Vulkan render pass");
                Error::InvalidResource("Render pass is not a Vulkan render pass".to_string())
            })?;

        let mut views = Vec::with_capacity(desc.attachments.len());
        for texture in &desc.attachments {
            let vk_texture = texture
                .as_any()
                .downcast_ref::<VulkanTexture>()
                .ok_or_else(|| {
                    engine_error!("galaxy3d::vulkan", "Framebuffer attachment is not a Vulkan texture");
                    Error::InvalidResource("Attachment is not a Vulkan texture".to_string())
                })?;
            views.push(vk_texture.view);
        }

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(desc.layers);

        let framebuffer = unsafe {
            self.gpu.device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan",
                    "Failed to create framebuffer {}x{}: {:?}", desc.width, desc.height, e))?
        };

        Ok(Arc::new(VulkanFramebuffer::new(
            Arc::clone(&self.gpu),
            framebuffer,
            desc.width,
            desc.height,
        )))
    }

    fn update_descriptor_set(&self, descriptor_set: &dyn PassDescriptorSet, writes: &[DescriptorWrite]) -> Result<()> {
        let vk_set = descriptor_set
            .as_any()
            .downcast_ref::<VulkanDescriptorSet>()
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "Descriptor set is not a Vulkan descriptor set");
                Error::InvalidResource("Descriptor set is not a Vulkan descriptor set".to_string())
            })?;

        // Resolve every native handle first so the writes can borrow stable infos
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        for write in writes {
            match write {
                DescriptorWrite::UniformBuffer { binding, buffer, offset, range } => {
                    let vk_buffer = buffer
                        .as_any()
                        .downcast_ref::<VulkanDeviceBuffer>()
                        .ok_or_else(|| {
                            engine_error!("galaxy3d::vulkan", "Uniform at binding {} is not a Vulkan buffer", binding);
                            Error::InvalidResource(format!("Uniform at binding {} is not a Vulkan buffer", binding))
                        })?;
                    let range = if *range == 0 { vk::WHOLE_SIZE } else { *range };
                    buffer_infos.push(vk::DescriptorBufferInfo::default()
                        .buffer(vk_buffer.buffer)
                        .offset(*offset)
                        .range(range));
                }
                DescriptorWrite::CombinedImageSampler { binding, texture, sampler, layout } => {
                    let vk_texture = texture
                        .as_any()
                        .downcast_ref::<VulkanTexture>()
                        .ok_or_else(|| {
                            engine_error!("galaxy3d::vulkan", "Image at binding {} is not a Vulkan texture", binding);
                            Error::InvalidResource(format!("Image at binding {} is not a Vulkan texture", binding))
                        })?;
                    let vk_sampler = sampler
                        .as_any()
                        .downcast_ref::<VulkanSampler>()
                        .ok_or_else(|| {
                            engine_error!("galaxy3d::vulkan", "Sampler at binding {} is not a Vulkan sampler", binding);
                            Error::InvalidResource(format!("Sampler at binding {} is not a Vulkan sampler", binding))
                        })?;
                    image_infos.push(vk::DescriptorImageInfo::default()
                        .image_view(vk_texture.view)
                        .sampler(vk_sampler.sampler)
                        .image_layout(image_layout_to_vk(*layout)));
                }
            }
        }

        let mut next_buffer = 0;
        let mut next_image = 0;
        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .map(|write| {
                let vk_write = vk::WriteDescriptorSet::default()
                    .dst_set(vk_set.descriptor_set)
                    .dst_binding(write.binding())
                    .dst_array_element(0);
                match write {
                    DescriptorWrite::UniformBuffer { .. } => {
                        let info = &buffer_infos[next_buffer..next_buffer + 1];
                        next_buffer += 1;
                        vk_write
                            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                            .buffer_info(info)
                    }
                    DescriptorWrite::CombinedImageSampler { .. } => {
                        let info = &image_infos[next_image..next_image + 1];
                        next_image += 1;
                        vk_write
                            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                            .image_info(info)
                    }
                }
            })
            .collect();

        unsafe {
            self.gpu.device.update_descriptor_sets(&vk_writes, &[]);
        }
        Ok(())
    }

    fn set_debug_name(&self, render_pass: &dyn RenderPassObject, label: &str) {
        if !self.gpu.debug_labels_enabled() {
            return;
        }
        match render_pass.as_any().downcast_ref::<VulkanRenderPass>() {
            Some(vk_render_pass) => self.gpu.set_object_name(vk_render_pass.render_pass, label),
            None => engine_warn!("galaxy3d::vulkan", "Cannot name non-Vulkan render pass '{}'", label),
        }
    }
}
