//! homelab-hud: A rotating status display for homelab services
//!
//! This library wires the engine from `homelab-hud-core` to the real world:
//! - Slide type descriptors for every built-in slide kind
//! - The default frame renderer and output sinks (PNG export, framebuffer)
//! - File-backed configuration
//! - The status / preview HTTP API

pub mod api;
pub mod config;
pub mod output;
pub mod render;
pub mod slides;

// Re-export commonly used types
pub use config::{ConfigError, FileConfigProvider};
pub use output::{FrameExportSink, FramebufferSink};
pub use render::PlaceholderRenderer;
pub use slides::builtin_registry;
