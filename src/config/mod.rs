//! File-backed configuration
//!
//! `slides.json` and `api_config.json` live in one data directory and are
//! re-read on every scheduler pass, so edits take effect on the next
//! rotation without a restart.

use homelab_hud_core::ConfigProvider;
use homelab_hud_types::{ApiConfig, SlidesConfig};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SLIDES_FILE: &str = "slides.json";
pub const API_CONFIG_FILE: &str = "api_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine a data directory")]
    NoDataDir,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write via a sibling temp file and rename, so readers never see half a file
fn write_atomic(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    std::fs::write(&tmp, contents).map_err(io_error(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_error(path))
}

/// Reads slide and service configuration from a data directory
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    dir: PathBuf,
}

impl FileConfigProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Provider rooted at the platform data directory
    pub fn from_project_dirs() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from("io", "homelab", "homelab-hud").ok_or(ConfigError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slides_path(&self) -> PathBuf {
        self.dir.join(SLIDES_FILE)
    }

    pub fn api_config_path(&self) -> PathBuf {
        self.dir.join(API_CONFIG_FILE)
    }

    pub fn load_slides(&self) -> Result<SlidesConfig, ConfigError> {
        load_or_init(&self.slides_path())
    }

    pub fn load_api_config(&self) -> Result<ApiConfig, ConfigError> {
        load_or_init(&self.api_config_path())
    }

    pub fn save_slides(&self, slides: &SlidesConfig) -> Result<(), ConfigError> {
        save(&self.slides_path(), slides)
    }
}

fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &content)
}

/// Parse `path`, or write and return the built-in default when it is missing
fn load_or_init<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Serialize + Default,
{
    if !path.exists() {
        let defaults = T::default();
        match save(path, &defaults) {
            Ok(()) => info!("Wrote default configuration to {}", path.display()),
            Err(e) => warn!("Using built-in defaults, could not write them out: {}", e),
        }
        return Ok(defaults);
    }

    let content = std::fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ConfigProvider for FileConfigProvider {
    fn get_slides_config(&self) -> anyhow::Result<SlidesConfig> {
        Ok(self.load_slides()?)
    }

    fn get_api_config(&self) -> anyhow::Result<ApiConfig> {
        Ok(self.load_api_config()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelab_hud_types::SlideConfig;

    #[test]
    fn test_missing_files_are_initialised() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("data"));

        let slides = provider.get_slides_config().unwrap();
        assert_eq!(slides, SlidesConfig::default());
        assert!(provider.slides_path().exists());

        let api = provider.get_api_config().unwrap();
        assert!(api.service("pihole").is_some());
        assert!(provider.api_config_path().exists());
    }

    #[test]
    fn test_edits_are_seen_on_next_read() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path());
        provider.get_slides_config().unwrap();

        let mut clock = SlideConfig::new(9, "clock", "Clock");
        clock.duration = 3.0;
        provider.save_slides(&SlidesConfig { slides: vec![clock] }).unwrap();

        let slides = provider.get_slides_config().unwrap();
        assert_eq!(slides.slides.len(), 1);
        assert_eq!(slides.slides[0].duration, 3.0);
        assert!(!dir.path().join(".slides.json.tmp").exists());
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path());
        std::fs::write(provider.api_config_path(), "{ not json").unwrap();

        match provider.load_api_config() {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, provider.api_config_path()),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(provider.get_api_config().is_err());
    }
}
