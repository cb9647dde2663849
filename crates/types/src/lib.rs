//! homelab-hud-types: Shared data types for the homelab HUD.
//!
//! This crate contains pure data types (slide configs, service configs and
//! the dynamic data payload) that are shared across all homelab-hud crates.
//! Nothing in here performs I/O.

pub mod data;
pub mod service;
pub mod slide;

// Re-export commonly used types at the crate root for convenience
pub use data::{extract_path, into_slide_data, SlideData};
pub use service::{ApiConfig, GenericApiConfig, HeaderSpec, MountList, ServiceConfig};
pub use slide::{SlideConfig, SlidesConfig};
