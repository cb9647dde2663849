//! Configuration source consumed by the scheduler

use anyhow::Result;
use homelab_hud_types::{ApiConfig, SlidesConfig};
use std::sync::{Arc, Mutex};

/// Where the scheduler reads its slide list and service defaults from.
///
/// Both methods are called at the start of every pass. Implementations fall
/// back to defaults for missing data but return errors for genuine I/O or
/// parse failures; the scheduler backs off and retries on error.
pub trait ConfigProvider: Send + Sync {
    fn get_slides_config(&self) -> Result<SlidesConfig>;

    fn get_api_config(&self) -> Result<ApiConfig>;
}

/// In-memory provider, swappable at runtime
#[derive(Clone, Default)]
pub struct StaticConfigProvider {
    inner: Arc<Mutex<(SlidesConfig, ApiConfig)>>,
}

impl StaticConfigProvider {
    pub fn new(slides: SlidesConfig, api: ApiConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new((slides, api))),
        }
    }

    /// Replace the slide list; picked up on the next pass
    pub fn set_slides(&self, slides: SlidesConfig) {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).0 = slides;
    }

    pub fn set_api_config(&self, api: ApiConfig) {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).1 = api;
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn get_slides_config(&self) -> Result<SlidesConfig> {
        Ok(self.inner.lock().unwrap_or_else(|p| p.into_inner()).0.clone())
    }

    fn get_api_config(&self) -> Result<ApiConfig> {
        Ok(self.inner.lock().unwrap_or_else(|p| p.into_inner()).1.clone())
    }
}
