/// Render target: the attachment set a render pass draws into

use std::collections::BTreeMap;
use std::sync::Arc;
use glam::{UVec2, Vec4};
use crate::error::{Error, Result};
use crate::graphics_device::{LoadAction, StoreAction, Texture};

/// Color bind indices run from 0 to `MAX_COLOR_ATTACHMENTS - 1`
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Texture plus load/store behavior
#[derive(Clone)]
pub struct Attachment {
    pub texture: Arc<dyn Texture>,
    /// Single-sample texture the attachment resolves into
    pub resolve_texture: Option<Arc<dyn Texture>>,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
}

impl Attachment {
    /// Cleared on load, stored on end
    pub fn new(texture: Arc<dyn Texture>) -> Self {
        Self {
            texture,
            resolve_texture: None,
            load_action: LoadAction::Clear,
            store_action: StoreAction::Store,
        }
    }

    pub fn with_resolve(mut self, resolve_texture: Arc<dyn Texture>) -> Self {
        self.resolve_texture = Some(resolve_texture);
        self
    }

    pub fn with_actions(mut self, load_action: LoadAction, store_action: StoreAction) -> Self {
        self.load_action = load_action;
        self.store_action = store_action;
        self
    }
}

#[derive(Clone)]
pub struct ColorAttachment {
    pub attachment: Attachment,
    pub clear_color: Vec4,
}

impl ColorAttachment {
    pub fn new(attachment: Attachment, clear_color: Vec4) -> Self {
        Self { attachment, clear_color }
    }
}

#[derive(Clone)]
pub struct DepthAttachment {
    pub attachment: Attachment,
    pub clear_depth: f32,
}

impl DepthAttachment {
    pub fn new(attachment: Attachment, clear_depth: f32) -> Self {
        Self { attachment, clear_depth }
    }
}

#[derive(Clone)]
pub struct StencilAttachment {
    pub attachment: Attachment,
    pub clear_stencil: u32,
}

impl StencilAttachment {
    pub fn new(attachment: Attachment, clear_stencil: u32) -> Self {
        Self { attachment, clear_stencil }
    }
}

/// Attachment set of one render pass
///
/// Color attachments are keyed by bind index (the fragment shader output
/// location). Indices may be sparse; iteration is always in ascending order.
#[derive(Clone, Default)]
pub struct RenderTarget {
    colors: BTreeMap<usize, ColorAttachment>,
    depth: Option<DepthAttachment>,
    stencil: Option<StencilAttachment>,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a color attachment at `index`, replacing any previous one
    ///
    /// Fails with `InvalidResource` when `index` is not below `MAX_COLOR_ATTACHMENTS`.
    pub fn set_color_attachment(&mut self, index: usize, attachment: ColorAttachment) -> Result<&mut Self> {
        if index >= MAX_COLOR_ATTACHMENTS {
            return Err(Error::InvalidResource(format!(
                "color attachment index {} exceeds the limit of {}",
                index, MAX_COLOR_ATTACHMENTS
            )));
        }
        self.colors.insert(index, attachment);
        Ok(self)
    }

    pub fn set_depth_attachment(&mut self, attachment: DepthAttachment) -> &mut Self {
        self.depth = Some(attachment);
        self
    }

    pub fn set_stencil_attachment(&mut self, attachment: StencilAttachment) -> &mut Self {
        self.stencil = Some(attachment);
        self
    }

    pub fn color_attachments(&self) -> &BTreeMap<usize, ColorAttachment> {
        &self.colors
    }

    pub fn color_attachment(&self, index: usize) -> Option<&ColorAttachment> {
        self.colors.get(&index)
    }

    pub fn has_color_attachment(&self, index: usize) -> bool {
        self.colors.contains_key(&index)
    }

    pub fn depth_attachment(&self) -> Option<&DepthAttachment> {
        self.depth.as_ref()
    }

    pub fn stencil_attachment(&self) -> Option<&StencilAttachment> {
        self.stencil.as_ref()
    }

    /// Highest bound color index, 0 when no color is bound
    pub fn max_color_attachment_bind_index(&self) -> usize {
        self.colors.keys().next_back().copied().unwrap_or(0)
    }

    /// Pixel size of the target
    ///
    /// Taken from the lowest-indexed color attachment, falling back to
    /// depth then stencil. Zero for an empty target.
    pub fn size(&self) -> UVec2 {
        self.colors
            .values()
            .next()
            .map(|c| &c.attachment)
            .or(self.depth.as_ref().map(|d| &d.attachment))
            .or(self.stencil.as_ref().map(|s| &s.attachment))
            .map(|a| a.texture.descriptor().size)
            .unwrap_or(UVec2::ZERO)
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
