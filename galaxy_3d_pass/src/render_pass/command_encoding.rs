/// Per-command encoding: state, buffers and the indexed draw

use glam::UVec2;
use scopeguard::ScopeGuard;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandEncoder, Context, Pipeline, PipelineBindPoint, Rect2D, StencilFace, TrackedResource,
    Viewport,
};
use crate::render_pass::descriptor_binder::allocate_and_bind_descriptor_sets;
use crate::render_pass::{Command, Rect};
use crate::engine_error;

/// Viewport for `command`, flipped vertically with depth 0..1
fn viewport_for(command: &Command, target_size: UVec2) -> Viewport {
    let rect = command
        .viewport
        .unwrap_or_else(|| Rect::new(0.0, 0.0, target_size.x as f32, target_size.y as f32));
    Viewport {
        x: rect.x,
        y: rect.y + rect.height,
        width: rect.width,
        height: -rect.height,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

fn scissor_for(command: &Command, target_size: UVec2) -> Rect2D {
    command.scissor.unwrap_or(Rect2D {
        x: 0,
        y: 0,
        width: target_size.x,
        height: target_size.y,
    })
}

/// Encode one draw
///
/// Empty draws return before touching the encoder. A non-empty label
/// brackets the draw in a debug group.
pub(crate) fn encode_command(
    context: &dyn Context,
    command: &Command,
    pipeline: &dyn Pipeline,
    encoder: &dyn CommandEncoder,
    target_size: UVec2,
) -> Result<()> {
    if command.is_empty_draw() {
        return Ok(());
    }

    let pop_marker = scopeguard::guard((), |_| encoder.pop_debug_group());
    if !command.label.is_empty() {
        encoder.push_debug_group(&command.label);
    } else {
        ScopeGuard::into_inner(pop_marker);
    }

    let cmd_buffer = encoder.command_buffer();

    allocate_and_bind_descriptor_sets(context, command, pipeline, encoder)?;

    cmd_buffer.bind_pipeline(PipelineBindPoint::Graphics, pipeline)?;
    cmd_buffer.set_viewport(&viewport_for(command, target_size))?;
    cmd_buffer.set_scissor(&scissor_for(command, target_size))?;
    cmd_buffer.set_stencil_reference(StencilFace::FrontAndBack, command.stencil_reference)?;

    let (Some(vertex_view), Some(index_view)) = (command.vertex_buffer(), command.index_buffer.as_ref()) else {
        engine_error!("galaxy3d::pass", "Command '{}' has no vertex or index buffer", command.label);
        return Err(Error::InvalidResource(format!("command '{}' is missing vertex data", command.label)));
    };

    let allocator = context.resource_allocator();
    let (Some(vertex_buffer), Some(index_buffer)) = (
        vertex_view.buffer.device_buffer(allocator),
        index_view.buffer.device_buffer(allocator),
    ) else {
        engine_error!("galaxy3d::pass", "Failed to acquire device buffers for vertex and index buffer views");
        return Err(Error::InvalidResource("vertex or index device buffer".to_string()));
    };

    encoder.track(TrackedResource::DeviceBuffer(vertex_buffer.clone()))?;
    encoder.track(TrackedResource::DeviceBuffer(index_buffer.clone()))?;

    cmd_buffer.bind_vertex_buffer(0, vertex_buffer.as_ref(), vertex_view.range.offset)?;
    cmd_buffer.bind_index_buffer(index_buffer.as_ref(), index_view.range.offset, command.index_type)?;

    cmd_buffer.draw_indexed(
        command.index_count,
        command.instance_count,
        0,
        command.base_vertex,
        0,
    )
}

#[cfg(test)]
#[path = "command_encoding_tests.rs"]
mod tests;
