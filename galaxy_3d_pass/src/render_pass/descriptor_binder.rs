/// Descriptor binder: one descriptor set per draw

use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandEncoder, Context, DescriptorWrite, ImageLayout, Pipeline, PipelineBindPoint,
    TrackedResource,
};
use crate::render_pass::{Bindings, Command, RESERVED_VERTEX_BUFFER_INDEX};
use crate::engine_error;

fn invalid_binding(message: String) -> Error {
    engine_error!("galaxy3d::pass", "{}", message);
    Error::InvalidResource(message)
}

fn sorted_keys<V>(map: &rustc_hash::FxHashMap<usize, V>) -> Vec<usize> {
    let mut keys: Vec<usize> = map.keys().copied().collect();
    keys.sort_unstable();
    keys
}

/// Every sampler needs a texture and slot metadata at the same index
fn validate_sampled_images(bindings: &Bindings, stage: &str) -> Result<()> {
    for index in sorted_keys(&bindings.samplers) {
        if !bindings.textures.contains_key(&index) {
            return Err(invalid_binding(format!("{} sampler at index {} has no matching texture", stage, index)));
        }
        if !bindings.sampled_images.contains_key(&index) {
            return Err(invalid_binding(format!("{} sampler at index {} has no sampled image slot", stage, index)));
        }
    }
    Ok(())
}

fn bind_buffers(
    context: &dyn Context,
    bindings: &Bindings,
    encoder: &dyn CommandEncoder,
    writes: &mut Vec<DescriptorWrite>,
) -> Result<()> {
    let allocator = context.resource_allocator();

    for index in sorted_keys(&bindings.buffers) {
        if index == RESERVED_VERTEX_BUFFER_INDEX {
            continue;
        }
        let Some(view) = bindings.buffers.get(&index) else {
            continue;
        };

        let uniform = bindings
            .uniforms
            .get(&index)
            .ok_or_else(|| invalid_binding(format!("Buffer at index {} has no uniform slot", index)))?;

        let device_buffer = view
            .buffer
            .device_buffer(allocator)
            .ok_or_else(|| invalid_binding(format!("Failed to get device buffer for uniform '{}'", uniform.name)))?;

        encoder.track(TrackedResource::DeviceBuffer(device_buffer.clone()))?;

        writes.push(DescriptorWrite::UniformBuffer {
            binding: uniform.binding,
            buffer: device_buffer,
            offset: view.range.offset,
            range: view.range.length,
        });
    }
    Ok(())
}

fn bind_images(bindings: &Bindings, encoder: &dyn CommandEncoder, writes: &mut Vec<DescriptorWrite>) -> Result<()> {
    for index in sorted_keys(&bindings.samplers) {
        let (Some(sampler), Some(texture), Some(slot)) = (
            bindings.samplers.get(&index),
            bindings.textures.get(&index),
            bindings.sampled_images.get(&index),
        ) else {
            return Err(invalid_binding(format!("Sampled image at index {} is incomplete", index)));
        };

        encoder.track(TrackedResource::Texture(texture.clone()))?;
        encoder.track(TrackedResource::Sampler(sampler.clone()))?;

        writes.push(DescriptorWrite::CombinedImageSampler {
            binding: slot.binding,
            texture: texture.clone(),
            sampler: sampler.clone(),
            layout: ImageLayout::ShaderReadOnly,
        });
    }
    Ok(())
}

/// Allocate, fill and bind the descriptor set of `command`
///
/// Binding numbers come from the slot metadata and writes are ordered by
/// binding number, so the update is identical whatever the map order.
/// Sampler/texture pairing is checked before anything is allocated.
pub(crate) fn allocate_and_bind_descriptor_sets(
    context: &dyn Context,
    command: &Command,
    pipeline: &dyn Pipeline,
    encoder: &dyn CommandEncoder,
) -> Result<()> {
    validate_sampled_images(&command.vertex_bindings, "Vertex")?;
    validate_sampled_images(&command.fragment_bindings, "Fragment")?;

    let descriptor_set = encoder
        .allocate_descriptor_set(pipeline.descriptor_set_layout())
        .map_err(|e| {
            engine_error!("galaxy3d::pass", "Descriptor set allocation failed for pipeline '{}': {}", pipeline.label(), e);
            e
        })?;

    let mut writes = Vec::new();
    bind_buffers(context, &command.vertex_bindings, encoder, &mut writes)?;
    bind_buffers(context, &command.fragment_bindings, encoder, &mut writes)?;
    bind_images(&command.vertex_bindings, encoder, &mut writes)?;
    bind_images(&command.fragment_bindings, encoder, &mut writes)?;
    writes.sort_by_key(|write| write.binding());

    context.update_descriptor_set(descriptor_set.as_ref(), &writes)?;

    encoder.command_buffer().bind_descriptor_set(
        PipelineBindPoint::Graphics,
        pipeline,
        0,
        descriptor_set.as_ref(),
    )
}

#[cfg(test)]
#[path = "descriptor_binder_tests.rs"]
mod tests;
