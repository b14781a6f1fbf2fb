//! Render pass module
//!
//! Encodes one logical render pass: attachment descriptors, the native
//! render pass and framebuffer objects, layout transitions, descriptor
//! binding and per-command draw encoding, sequenced by `RenderPass`.

pub mod render_target;
pub mod command;
pub mod attachments;
mod render_pass_factory;
mod framebuffer_factory;
mod layout_transitions;
mod descriptor_binder;
mod command_encoding;
mod render_pass;

pub use render_target::{
    Attachment, ColorAttachment, DepthAttachment, StencilAttachment, RenderTarget,
    MAX_COLOR_ATTACHMENTS,
};
pub use command::{
    Bindings, Command, Rect, SampledImageSlot, ShaderUniformSlot, VertexBuffer,
    RESERVED_VERTEX_BUFFER_INDEX,
};
pub use attachments::{AttachmentLayout, AttachmentSlot};
pub use render_pass::{RenderPass, RenderPassState};
