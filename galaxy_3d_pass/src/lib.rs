/*!
# Galaxy 3D Pass

Backend-agnostic render pass encoding for the Galaxy 3D engine.

Given a render target (color, resolve, depth and stencil attachments) and an
ordered list of draw commands, a `RenderPass` produces the native render pass
and framebuffer objects and the command stream needed to execute the draws:
layout transitions first, then one render pass with one descriptor set and
one indexed draw per command.

## Architecture

- **graphics_device**: collaborator traits implemented by backends
  (`Context`, `CommandEncoder`, `CommandBuffer`, `Texture`, `Buffer`, ...)
- **render_pass**: render target and command model, attachment descriptor
  builder, render pass / framebuffer factories, layout transitions,
  descriptor binder, command encoding and the `RenderPass` state machine

Backend implementations (e.g., `galaxy_3d_pass_vulkan`) provide concrete
types that implement the collaborator traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod render_pass;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine (global logger)
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::Config;

    // Render pass entry point
    pub use crate::render_pass::{RenderPass, RenderPassState};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are exported at the crate root
    }

    // Collaborator traits and native object descriptions
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Render target, commands and the pass encoder
    pub mod pass {
        pub use crate::render_pass::*;
    }
}

// Re-export math library at crate root
pub use glam;
