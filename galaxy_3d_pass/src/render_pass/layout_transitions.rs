/// Resource layout transition engine
///
/// Runs before the render pass begins: barriers are illegal inside an
/// active render pass. Every transitioned texture is also tracked so it
/// stays alive until the command buffer completes. Failures abort without
/// rolling back transitions already recorded.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    AccessFlags, CommandEncoder, ImageLayout, LayoutTransition, PipelineStageFlags, Texture,
    TrackedResource,
};
use crate::render_pass::{Bindings, Command, RenderTarget};
use crate::engine_error;

fn transition_and_track(
    texture: &Arc<dyn Texture>,
    transition: &LayoutTransition<'_>,
    encoder: &dyn CommandEncoder,
) -> Result<()> {
    texture.set_layout(transition)?;
    encoder.track(TrackedResource::Texture(texture.clone()))
}

fn prior_writes(encoder: &dyn CommandEncoder, new_layout: ImageLayout) -> LayoutTransition<'_> {
    LayoutTransition {
        cmd_buffer: encoder.command_buffer(),
        new_layout,
        src_access: AccessFlags::COLOR_ATTACHMENT_WRITE
            | AccessFlags::SHADER_WRITE
            | AccessFlags::TRANSFER_WRITE,
        src_stage: PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | PipelineStageFlags::FRAGMENT_SHADER
            | PipelineStageFlags::TRANSFER,
        dst_access: AccessFlags::SHADER_READ,
        dst_stage: PipelineStageFlags::FRAGMENT_SHADER,
    }
}

fn update_bindings(bindings: &Bindings, transition: &LayoutTransition<'_>, encoder: &dyn CommandEncoder) -> Result<()> {
    let mut indices: Vec<usize> = bindings.textures.keys().copied().collect();
    indices.sort_unstable();
    for index in indices {
        if let Some(texture) = bindings.textures.get(&index) {
            transition_and_track(texture, transition, encoder)?;
        }
    }
    Ok(())
}

/// Move every bound texture of every command to the shader read-only layout
pub(crate) fn update_binding_layouts(commands: &[Command], encoder: &dyn CommandEncoder) -> Result<()> {
    let transition = prior_writes(encoder, ImageLayout::ShaderReadOnly);

    for (i, command) in commands.iter().enumerate() {
        update_bindings(&command.vertex_bindings, &transition, encoder)
            .and_then(|_| update_bindings(&command.fragment_bindings, &transition, encoder))
            .map_err(|e| {
                engine_error!("galaxy3d::pass", "Binding layout transition failed for command {} '{}': {}", i, command.label, e);
                e
            })?;
    }
    Ok(())
}

fn transition_attachments(target: &RenderTarget, encoder: &dyn CommandEncoder) -> Result<()> {
    let color_transition = prior_writes(encoder, ImageLayout::ColorAttachment);
    for color in target.color_attachments().values() {
        transition_and_track(&color.attachment.texture, &color_transition, encoder)?;
        if let Some(resolve) = &color.attachment.resolve_texture {
            transition_and_track(resolve, &color_transition, encoder)?;
        }
    }

    let depth_transition = LayoutTransition {
        cmd_buffer: encoder.command_buffer(),
        new_layout: ImageLayout::DepthAttachment,
        src_access: AccessFlags::empty(),
        src_stage: PipelineStageFlags::TOP_OF_PIPE,
        dst_access: AccessFlags::SHADER_READ,
        dst_stage: PipelineStageFlags::FRAGMENT_SHADER,
    };
    if let Some(depth) = target.depth_attachment() {
        transition_and_track(&depth.attachment.texture, &depth_transition, encoder)?;
    }

    let stencil_transition = depth_transition.with_layout(ImageLayout::StencilAttachment);
    if let Some(stencil) = target.stencil_attachment() {
        transition_and_track(&stencil.attachment.texture, &stencil_transition, encoder)?;
    }
    Ok(())
}

/// Move every attachment of `target` to its attachment layout
///
/// Colors and their resolve textures go to the color attachment layout;
/// depth and stencil are transitioned independently, each to its own layout.
pub(crate) fn configure_attachments(target: &RenderTarget, encoder: &dyn CommandEncoder) -> Result<()> {
    transition_attachments(target, encoder).map_err(|e| {
        engine_error!("galaxy3d::pass", "Could not complete attachment layout transitions: {}", e);
        e
    })
}

#[cfg(test)]
#[path = "layout_transitions_tests.rs"]
mod tests;
