//! homelab-hud-collectors: Service collectors for the homelab HUD.
//!
//! Every collector implements [`homelab_hud_core::DataCollector`]. Response
//! parsing lives in plain functions next to each collector so it can be
//! tested without a network.

mod arm;
mod generic;
mod http;
pub mod mock;
mod octopi;
mod pihole;
mod plex;
mod system;
mod weather;

pub use arm::ArmCollector;
pub use generic::GenericCollector;
pub use octopi::OctoPrintCollector;
pub use pihole::PiholeCollector;
pub use plex::PlexCollector;
pub use system::SystemCollector;
pub use weather::{WeatherCollector, DEFAULT_CITY};

use homelab_hud_types::SlideData;
use serde::Serialize;

/// Serialize a typed payload into slide data
pub(crate) fn to_slide_data<T: Serialize>(value: &T) -> Result<SlideData, serde_json::Error> {
    serde_json::to_value(value).map(homelab_hud_types::into_slide_data)
}
