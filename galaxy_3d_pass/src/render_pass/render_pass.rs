/// Render pass orchestrator

use std::sync::{Arc, Weak};
use scopeguard::ScopeGuard;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandEncoder, Context, Rect2D, RenderPassObject, SubpassContents, TrackedResource,
};
use crate::render_pass::attachments::clear_values;
use crate::render_pass::command_encoding::encode_command;
use crate::render_pass::framebuffer_factory::create_framebuffer;
use crate::render_pass::layout_transitions::{configure_attachments, update_binding_layouts};
use crate::render_pass::render_pass_factory::create_render_pass_object;
use crate::render_pass::{Command, RenderTarget};
use crate::{engine_debug, engine_error, engine_trace};

/// Lifecycle of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPassState {
    /// The native render pass object could not be created
    Invalid,
    /// Ready to record commands and encode
    Ready,
    Encoding,
    Encoded,
    /// An encode step failed; the pass cannot be encoded again
    Failed,
}

/// One logical render pass over a render target
///
/// Holds weak references to the context and to the command encoder it
/// records into; both are re-validated when they are used.
pub struct RenderPass {
    context: Weak<dyn Context>,
    target: RenderTarget,
    render_pass: Option<Arc<dyn RenderPassObject>>,
    encoder: Weak<dyn CommandEncoder>,
    commands: Vec<Command>,
    label: String,
    state: RenderPassState,
}

impl RenderPass {
    /// Create the native render pass object for `target`
    ///
    /// On failure the pass is returned in the `Invalid` state and can never
    /// be encoded.
    pub fn new(context: &Arc<dyn Context>, target: RenderTarget, encoder: Weak<dyn CommandEncoder>) -> Self {
        let render_pass = create_render_pass_object(context.as_ref(), &target).ok();
        let state = if render_pass.is_some() {
            RenderPassState::Ready
        } else {
            RenderPassState::Invalid
        };

        Self {
            context: Arc::downgrade(context),
            target,
            render_pass,
            encoder,
            commands: Vec::new(),
            label: String::new(),
            state,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state != RenderPassState::Invalid
    }

    pub fn state(&self) -> RenderPassState {
        self.state
    }

    pub fn render_target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name the native render pass object and label the encoded pass
    pub fn set_label(&mut self, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        if self.state != RenderPassState::Ready {
            return Err(Error::PreconditionFailed(format!(
                "cannot label render pass in state {:?}",
                self.state
            )));
        }

        let Some(context) = self.context.upgrade() else {
            engine_error!("galaxy3d::pass", "Context died before render pass '{}' could be labeled", label);
            return Err(Error::PreconditionFailed("context no longer exists".to_string()));
        };

        if let Some(render_pass) = &self.render_pass {
            context.set_debug_name(render_pass.as_ref(), &label);
        }
        self.label = label;
        Ok(())
    }

    /// Append a command; commands are encoded in insertion order
    pub fn add_command(&mut self, command: Command) -> Result<()> {
        if self.state != RenderPassState::Ready {
            return Err(Error::PreconditionFailed(format!(
                "cannot add command to render pass in state {:?}",
                self.state
            )));
        }
        self.commands.push(command);
        Ok(())
    }

    /// Encode the pass into the command encoder
    ///
    /// A pass encodes once. Any failure leaves it `Failed`; the render pass
    /// is still ended if it had begun.
    pub fn encode(&mut self) -> Result<()> {
        if self.state != RenderPassState::Ready {
            engine_error!("galaxy3d::pass", "Render pass '{}' cannot encode in state {:?}", self.label, self.state);
            return Err(Error::PreconditionFailed(format!(
                "render pass is not ready to encode (state {:?})",
                self.state
            )));
        }

        self.state = RenderPassState::Encoding;
        let result = self.encode_commands();
        self.state = match result {
            Ok(()) => RenderPassState::Encoded,
            Err(_) => RenderPassState::Failed,
        };
        result
    }

    fn encode_commands(&self) -> Result<()> {
        if !self.target.has_color_attachment(0) {
            engine_error!("galaxy3d::pass", "Render target doesn't have a color attachment at index 0");
            return Err(Error::PreconditionFailed("missing color attachment 0".to_string()));
        }

        let Some(encoder) = self.encoder.upgrade() else {
            engine_error!("galaxy3d::pass", "Command encoder died before commands could be encoded");
            return Err(Error::PreconditionFailed("command encoder no longer exists".to_string()));
        };

        let Some(context) = self.context.upgrade() else {
            engine_error!("galaxy3d::pass", "Context died before commands could be encoded");
            return Err(Error::PreconditionFailed("context no longer exists".to_string()));
        };

        let Some(render_pass) = &self.render_pass else {
            return Err(Error::PreconditionFailed("render pass object missing".to_string()));
        };

        let encoder = encoder.as_ref();
        let pop_marker = scopeguard::guard((), |_| encoder.pop_debug_group());
        if !self.label.is_empty() {
            encoder.push_debug_group(&self.label);
        } else {
            ScopeGuard::into_inner(pop_marker);
        }

        update_binding_layouts(&self.commands, encoder)?;
        configure_attachments(&self.target, encoder)?;

        if self.commands.is_empty() {
            // Attachments are already in their layouts; nothing to draw
            engine_trace!("galaxy3d::pass", "Render pass '{}' has no commands", self.label);
            return Ok(());
        }

        let target_size = self.target.size();

        let framebuffer = create_framebuffer(context.as_ref(), render_pass, &self.target)?;
        encoder.track(TrackedResource::Framebuffer(framebuffer.clone()))?;
        encoder.track(TrackedResource::RenderPass(render_pass.clone()))?;

        let clears = clear_values(&self.target);
        let render_area = Rect2D {
            x: 0,
            y: 0,
            width: target_size.x,
            height: target_size.y,
        };

        let cmd_buffer = encoder.command_buffer();
        cmd_buffer.begin_render_pass(render_pass, &framebuffer, render_area, &clears, SubpassContents::Inline)?;

        let _end_render_pass = scopeguard::guard((), |_| {
            if let Err(e) = cmd_buffer.end_render_pass() {
                engine_error!("galaxy3d::pass", "Failed to end render pass: {}", e);
            }
        });

        for (i, command) in self.commands.iter().enumerate() {
            let Some(pipeline) = command.pipeline.as_deref() else {
                continue;
            };

            encode_command(context.as_ref(), command, pipeline, encoder, target_size).map_err(|e| {
                engine_error!("galaxy3d::pass", "Failed to encode command {} '{}': {}", i, command.label, e);
                e
            })?;
        }

        engine_debug!("galaxy3d::pass", "Encoded render pass '{}' with {} commands", self.label, self.commands.len());
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
