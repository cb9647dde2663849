//! homelab-hud-core: Slide lifecycle engine for the homelab HUD.
//!
//! This crate contains the collector contract and its TTL cache, the
//! slide-type descriptor trait with its registry, the shared current-slide
//! snapshot, and the scheduler that drives the display rotation.

pub mod collector;
pub mod config;
pub mod constants;
pub mod current_slide;
pub mod error;
pub mod frame;
pub mod pool;
pub mod registry;
pub mod scheduler;
pub mod slide_type;

pub use collector::{Collector, CollectorStatus, DataCollector, FetchLogEntry, FetchOutcome};
pub use config::{ConfigProvider, StaticConfigProvider};
pub use current_slide::{CurrentSlide, CurrentSlidePublisher, SlideStatus};
pub use error::CollectorError;
pub use frame::{Frame, OutputSink, SlideRenderer};
pub use pool::CollectorPool;
pub use registry::SlideTypeRegistry;
pub use scheduler::{PassReport, SchedulerTiming, SlideScheduler};
pub use slide_type::{CollectorContext, SlideType};

// Re-export types used in trait signatures for convenience
pub use homelab_hud_types::{ApiConfig, SlideConfig, SlideData, SlidesConfig};
