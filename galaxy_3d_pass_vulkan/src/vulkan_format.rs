/// Conversions from galaxy_3d_pass types to their Vulkan counterparts

use galaxy_3d_pass::galaxy3d::device::{
    AccessFlags, AddressMode, AttachmentDescriptor, AttachmentKind, ClearValue, Filter,
    ImageLayout, IndexType, LoadAction, MipFilter, PipelineBindPoint, PipelineStageFlags,
    SampleCount, StencilFace, StoreAction, TextureFormat,
};
use ash::vk;

/// Convert TextureFormat to Vulkan format
pub(crate) fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        TextureFormat::S8_UINT => vk::Format::S8_UINT,
    }
}

pub(crate) fn sample_count_to_vk(count: SampleCount) -> vk::SampleCountFlags {
    match count {
        SampleCount::S1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::S2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::S4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::S8 => vk::SampleCountFlags::TYPE_8,
    }
}

/// Convert LoadAction to Vulkan
pub(crate) fn load_op_to_vk(action: LoadAction) -> vk::AttachmentLoadOp {
    match action {
        LoadAction::Load => vk::AttachmentLoadOp::LOAD,
        LoadAction::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadAction::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

/// Convert StoreAction to Vulkan
///
/// Resolving is expressed through the subpass resolve references, so only
/// whether the multisample contents survive the pass matters here.
pub(crate) fn store_op_to_vk(action: StoreAction) -> vk::AttachmentStoreOp {
    match action {
        StoreAction::Store | StoreAction::StoreAndMultisampleResolve => vk::AttachmentStoreOp::STORE,
        StoreAction::DontCare | StoreAction::MultisampleResolve => vk::AttachmentStoreOp::DONT_CARE,
    }
}

/// Convert ImageLayout to Vulkan
pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthAttachment => vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
        ImageLayout::StencilAttachment => vk::ImageLayout::STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

/// Layout of a texture of `format` once it is in `layout`
///
/// Packed depth/stencil formats cannot sit in a depth-only or stencil-only
/// layout inside a render pass; both collapse to the combined layout.
pub(crate) fn texture_layout_to_vk(layout: ImageLayout, format: TextureFormat) -> vk::ImageLayout {
    match layout {
        ImageLayout::DepthAttachment | ImageLayout::StencilAttachment if is_packed_depth_stencil(format) => {
            vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
        }
        _ => image_layout_to_vk(layout),
    }
}

fn is_packed_depth_stencil(format: TextureFormat) -> bool {
    format.has_depth() && format.has_stencil()
}

/// Image aspect touched by a barrier into `layout`
pub(crate) fn aspect_for_layout(layout: ImageLayout) -> vk::ImageAspectFlags {
    match layout {
        ImageLayout::ColorAttachment
        | ImageLayout::ShaderReadOnly
        | ImageLayout::TransferSrc
        | ImageLayout::TransferDst
        | ImageLayout::PresentSrc
        | ImageLayout::General => vk::ImageAspectFlags::COLOR,
        ImageLayout::DepthAttachment => vk::ImageAspectFlags::DEPTH,
        ImageLayout::StencilAttachment => vk::ImageAspectFlags::STENCIL,
        ImageLayout::DepthStencilAttachment => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        ImageLayout::Undefined => vk::ImageAspectFlags::empty(),
    }
}

/// Aspect of a barrier moving a texture of `format` into `layout`
///
/// Follows the new layout, widened to every aspect of the format when the
/// layout collapses to the combined one or names no aspect.
pub(crate) fn barrier_aspect(layout: ImageLayout, format: TextureFormat) -> vk::ImageAspectFlags {
    let aspect = if texture_layout_to_vk(layout, format) == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL {
        aspect_for_format(format)
    } else {
        aspect_for_layout(layout)
    };

    if aspect.is_empty() {
        aspect_for_format(format)
    } else {
        aspect
    }
}

/// Aspect of a whole texture, used for image views
pub(crate) fn aspect_for_format(format: TextureFormat) -> vk::ImageAspectFlags {
    let mut aspect = vk::ImageAspectFlags::empty();
    if format.has_depth() {
        aspect |= vk::ImageAspectFlags::DEPTH;
    }
    if format.has_stencil() {
        aspect |= vk::ImageAspectFlags::STENCIL;
    }
    if aspect.is_empty() {
        aspect = vk::ImageAspectFlags::COLOR;
    }
    aspect
}

pub(crate) fn access_to_vk(access: AccessFlags) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if access.contains(AccessFlags::COLOR_ATTACHMENT_READ) { flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ; }
    if access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE) { flags |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE; }
    if access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ) { flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ; }
    if access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE) { flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE; }
    if access.contains(AccessFlags::SHADER_READ) { flags |= vk::AccessFlags::SHADER_READ; }
    if access.contains(AccessFlags::SHADER_WRITE) { flags |= vk::AccessFlags::SHADER_WRITE; }
    if access.contains(AccessFlags::TRANSFER_READ) { flags |= vk::AccessFlags::TRANSFER_READ; }
    if access.contains(AccessFlags::TRANSFER_WRITE) { flags |= vk::AccessFlags::TRANSFER_WRITE; }
    flags
}

/// Convert a stage mask to Vulkan
///
/// An empty mask becomes TOP_OF_PIPE, since Vulkan rejects a zero stage mask.
pub(crate) fn stage_to_vk(stage: PipelineStageFlags) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();
    if stage.contains(PipelineStageFlags::TOP_OF_PIPE) { flags |= vk::PipelineStageFlags::TOP_OF_PIPE; }
    if stage.contains(PipelineStageFlags::VERTEX_SHADER) { flags |= vk::PipelineStageFlags::VERTEX_SHADER; }
    if stage.contains(PipelineStageFlags::EARLY_FRAGMENT_TESTS) { flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS; }
    if stage.contains(PipelineStageFlags::FRAGMENT_SHADER) { flags |= vk::PipelineStageFlags::FRAGMENT_SHADER; }
    if stage.contains(PipelineStageFlags::LATE_FRAGMENT_TESTS) { flags |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS; }
    if stage.contains(PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT) { flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; }
    if stage.contains(PipelineStageFlags::TRANSFER) { flags |= vk::PipelineStageFlags::TRANSFER; }
    if stage.contains(PipelineStageFlags::BOTTOM_OF_PIPE) { flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE; }
    if stage.contains(PipelineStageFlags::ALL_GRAPHICS) { flags |= vk::PipelineStageFlags::ALL_GRAPHICS; }
    if flags.is_empty() {
        flags = vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    flags
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn stencil_face_to_vk(face: StencilFace) -> vk::StencilFaceFlags {
    match face {
        StencilFace::Front => vk::StencilFaceFlags::FRONT,
        StencilFace::Back => vk::StencilFaceFlags::BACK,
        StencilFace::FrontAndBack => vk::StencilFaceFlags::FRONT_AND_BACK,
    }
}

pub(crate) fn bind_point_to_vk(bind_point: PipelineBindPoint) -> vk::PipelineBindPoint {
    match bind_point {
        PipelineBindPoint::Graphics => vk::PipelineBindPoint::GRAPHICS,
    }
}

pub(crate) fn filter_to_vk(filter: Filter) -> vk::Filter {
    match filter {
        Filter::Nearest => vk::Filter::NEAREST,
        Filter::Linear => vk::Filter::LINEAR,
    }
}

pub(crate) fn mip_filter_to_vk(filter: MipFilter) -> vk::SamplerMipmapMode {
    match filter {
        MipFilter::Nearest => vk::SamplerMipmapMode::NEAREST,
        MipFilter::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

pub(crate) fn address_mode_to_vk(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
    }
}

pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: *color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: *depth,
                stencil: *stencil,
            },
        },
    }
}

/// Build the Vulkan attachment description for one render pass attachment
///
/// The attachment starts undefined unless its contents are loaded, and stays
/// in its attachment layout at the end of the pass. Stencil-only attachments
/// carry their actions on the stencil ops; depth formats with a stencil
/// component apply the same actions to both and use the combined layout.
pub(crate) fn attachment_description_to_vk(desc: &AttachmentDescriptor) -> vk::AttachmentDescription {
    let attachment_layout = texture_layout_to_vk(desc.kind.attachment_layout(), desc.format);
    let initial_layout = if desc.load_action == LoadAction::Load {
        attachment_layout
    } else {
        vk::ImageLayout::UNDEFINED
    };

    let load_op = load_op_to_vk(desc.load_action);
    let store_op = store_op_to_vk(desc.store_action);
    let (load_op, store_op, stencil_load_op, stencil_store_op) = match desc.kind {
        AttachmentKind::Color => (
            load_op,
            store_op,
            vk::AttachmentLoadOp::DONT_CARE,
            vk::AttachmentStoreOp::DONT_CARE,
        ),
        AttachmentKind::Depth if desc.format.has_stencil() => (load_op, store_op, load_op, store_op),
        AttachmentKind::Depth => (
            load_op,
            store_op,
            vk::AttachmentLoadOp::DONT_CARE,
            vk::AttachmentStoreOp::DONT_CARE,
        ),
        AttachmentKind::Stencil => (
            vk::AttachmentLoadOp::DONT_CARE,
            vk::AttachmentStoreOp::DONT_CARE,
            load_op,
            store_op,
        ),
    };

    vk::AttachmentDescription::default()
        .format(format_to_vk(desc.format))
        .samples(sample_count_to_vk(desc.sample_count))
        .load_op(load_op)
        .store_op(store_op)
        .stencil_load_op(stencil_load_op)
        .stencil_store_op(stencil_store_op)
        .initial_layout(initial_layout)
        .final_layout(attachment_layout)
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
