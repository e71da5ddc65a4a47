use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{SubsecRound, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Collection;
use crate::catalog::is_unique_violation;
use crate::domain::{ImageFormat, ImageRecord, ImageStatus};
use crate::error::{Error, Result};
use crate::hasher;
use crate::rollback::{remove_file_if_present, Rollback};

const MAX_FILENAME_LEN: usize = 256;
const SAVE_FAILED: &str = "unable to save image";
const DUPLICATE: &str = "image already exists in collection";

/// Name and format of an ingest candidate, derived from its path alone.
#[derive(Debug, PartialEq, Eq)]
struct SourceName {
    original_name: String,
    format: ImageFormat,
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_FILENAME_LEN
        && name != "."
        && name != ".."
        && !name.chars().any(|c| {
            c.is_control()
                || matches!(
                    c,
                    '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*'
                )
        })
}

fn inspect_source(path: &Path) -> Result<SourceName> {
    if !fs::metadata(path).map(|m| m.is_file()).unwrap_or(false) {
        return Err(Error::not_a_file(path));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| is_safe_filename(n))
        .ok_or_else(|| Error::Validation("unsafe or invalid filename".to_string()))?;

    let unsupported = || Error::Validation("unsupported file type".to_string());
    let (stem, extension) = file_name
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .ok_or_else(unsupported)?;
    let format = ImageFormat::from_extension(extension).ok_or_else(unsupported)?;

    Ok(SourceName {
        original_name: stem.to_string(),
        format,
    })
}

/// Write `bytes` to a file that must not exist yet. A partially written file
/// is removed before the error is returned.
fn write_new_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = file.write_all(bytes).and_then(|()| file.sync_all()) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial file");
        }
        return Err(e);
    }
    Ok(())
}

impl Collection {
    /// Ingest the image at `source`.
    ///
    /// On success the original, its thumbnail and the catalog row all exist.
    /// On any failure none of them do: validation and duplicate detection run
    /// before the first write, and later failures undo what was written.
    pub fn add_image(&mut self, source: &Path) -> Result<ImageRecord> {
        let name = inspect_source(source)?;

        let bytes = fs::read(source).map_err(|e| Error::storage("unable to read image", e))?;
        let content_hash = hasher::content_hash(&bytes);
        let decoded = image::load_from_memory(&bytes).map_err(|e| Error::Processing {
            message: "invalid or corrupted image file".to_string(),
            source: e,
        })?;

        if let Some(existing) = self.catalog.find_by_hash(&content_hash)? {
            debug!(
                collection = self.id(),
                existing = %existing,
                source = %source.display(),
                "duplicate content rejected"
            );
            return Err(Error::Duplicate(DUPLICATE.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let original_path = self.store.original_path(&id, name.format)?;
        let thumbnail_path = self.store.thumbnail_path(&id)?;
        let (width, height) = (decoded.width(), decoded.height());
        // Catalog timestamps carry millisecond precision.
        let now = Utc::now().trunc_subsecs(3);
        let record = ImageRecord {
            id,
            collection_id: self.id().to_string(),
            original_name: name.original_name,
            format: name.format,
            size_bytes: bytes.len() as u64,
            content_hash,
            width,
            height,
            aspect_ratio: width as f64 / height as f64,
            status: ImageStatus::Inbox,
            created_at: now,
            updated_at: now,
        };

        let mut rollback = Rollback::new("add_image");

        write_new_file(&original_path, &bytes).map_err(|e| Error::storage(SAVE_FAILED, e))?;
        rollback.push("remove original", || remove_file_if_present(&original_path));

        let thumbnail = self
            .thumbnails
            .generate(&decoded)
            .map_err(|e| Error::storage(SAVE_FAILED, e))?;
        write_new_file(&thumbnail_path, &thumbnail).map_err(|e| Error::storage(SAVE_FAILED, e))?;
        rollback.push("remove thumbnail", || remove_file_if_present(&thumbnail_path));

        match self.catalog.insert_image(&record) {
            Ok(()) => {}
            // Lost a race with another writer holding the same content.
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::Duplicate(DUPLICATE.to_string()));
            }
            Err(e) => return Err(Error::storage(SAVE_FAILED, e)),
        }
        rollback.commit();

        info!(
            collection = self.id(),
            image = %record.id,
            name = %record.original_name,
            width,
            height,
            "image added"
        );
        Ok(record)
    }
}
