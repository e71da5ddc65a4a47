//! Store configuration.
//!
//! A [`StoreConfig`] is handed to [`crate::CollectionRegistry::new`]; nothing
//! in the library reads ambient state. It can be built in code or loaded from
//! a TOML file where every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per collection.
    pub root: PathBuf,

    /// Thumbnail derivation settings
    pub thumbnail: ThumbnailConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("collections"),
            thumbnail: ThumbnailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Longest edge of a thumbnail, in pixels.
    pub max_dimension: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: 400,
            quality: 80,
        }
    }
}

impl StoreConfig {
    /// Default settings rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load and validate configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StoreConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::Config("root must not be empty".to_string()));
        }
        if self.thumbnail.max_dimension == 0 {
            return Err(Error::Config(
                "thumbnail.max_dimension must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.thumbnail.quality) {
            return Err(Error::Config(format!(
                "thumbnail.quality must be within 1-100, got {}",
                self.thumbnail.quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.root, PathBuf::from("collections"));
        assert_eq!(config.thumbnail.max_dimension, 400);
        assert_eq!(config.thumbnail.quality, 80);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shelf.toml");
        std::fs::write(&path, "root = \"/srv/shelf\"\n\n[thumbnail]\nquality = 90\n").unwrap();

        let config = StoreConfig::load_from(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/shelf"));
        assert_eq!(config.thumbnail.quality, 90);
        assert_eq!(config.thumbnail.max_dimension, 400);
    }

    #[test]
    fn test_load_rejects_invalid_quality() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shelf.toml");
        std::fs::write(&path, "[thumbnail]\nquality = 0\n").unwrap();

        let err = StoreConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shelf.toml");
        std::fs::write(&path, "root = [").unwrap();

        assert!(matches!(
            StoreConfig::load_from(&path),
            Err(Error::Config(_))
        ));
    }
}
