//! On-disk layout of a single collection.
//!
//! ```text
//! <root>/<collection-id>/
//!   collection.db
//!   images/original/<image-id>.<ext>
//!   images/thumbnails/<image-id>.jpg
//! ```
//!
//! Every identifier is checked before it is joined onto a path, so nothing
//! derived from caller input can escape the collection directory.

use std::path::{Path, PathBuf};

use crate::domain::ImageFormat;
use crate::error::{Error, Result};

pub const CATALOG_FILE: &str = "collection.db";
pub const ORIGINALS_DIR: &str = "images/original";
pub const THUMBNAILS_DIR: &str = "images/thumbnails";
pub const THUMBNAIL_EXTENSION: &str = "jpg";

const MAX_ID_LEN: usize = 256;

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Collection names: `^[A-Za-z0-9-]+$`, at most 256 characters.
pub fn validate_collection_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Validation("name cannot be empty".to_string()));
    }
    if !is_safe_id(id) {
        return Err(Error::Validation(format!("{id} is not a valid name")));
    }
    Ok(())
}

/// Image ids share the collection-name alphabet (UUIDs fit it).
pub fn validate_image_id(id: &str) -> Result<()> {
    if !is_safe_id(id) {
        return Err(Error::Validation("invalid image id".to_string()));
    }
    Ok(())
}

/// Resolved paths for one collection directory.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    id: String,
    dir: PathBuf,
}

impl CollectionStore {
    pub fn new(root: &Path, id: &str) -> Result<Self> {
        validate_collection_id(id)?;
        Ok(Self {
            id: id.to_string(),
            dir: root.join(id),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }

    pub fn originals_dir(&self) -> PathBuf {
        self.dir.join(ORIGINALS_DIR)
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.dir.join(THUMBNAILS_DIR)
    }

    pub fn original_path(&self, image_id: &str, format: ImageFormat) -> Result<PathBuf> {
        validate_image_id(image_id)?;
        Ok(self
            .originals_dir()
            .join(format!("{image_id}.{}", format.extension())))
    }

    pub fn thumbnail_path(&self, image_id: &str) -> Result<PathBuf> {
        validate_image_id(image_id)?;
        Ok(self
            .thumbnails_dir()
            .join(format!("{image_id}.{THUMBNAIL_EXTENSION}")))
    }

    /// Create the image directories. The collection directory itself must
    /// already exist.
    pub fn create_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.originals_dir())?;
        std::fs::create_dir_all(self.thumbnails_dir())?;
        Ok(())
    }
}
