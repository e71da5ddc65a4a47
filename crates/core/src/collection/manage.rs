use chrono::Utc;
use tracing::{debug, info, warn};

use super::Collection;
use crate::domain::{ImageQuery, ImageRecord, ImageStatus};
use crate::error::{Error, Result};
use crate::rollback::remove_file_if_present;
use crate::store::validate_image_id;

fn image_not_found(id: &str) -> Error {
    Error::NotFound(format!("image not found with id: {id}"))
}

impl Collection {
    pub fn get_image(&self, id: &str) -> Result<ImageRecord> {
        validate_image_id(id)?;
        self.catalog
            .get_image(id)?
            .ok_or_else(|| image_not_found(id))
    }

    /// Images matching `query`. An empty result is not an error.
    pub fn images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>> {
        let images = self.catalog.list_images(query)?;
        debug!(
            collection = self.id(),
            status = ?query.status,
            count = images.len(),
            "listed images"
        );
        Ok(images)
    }

    /// Move an image to `status` and bump its `updated_at`. Every status may
    /// move to every other, including itself.
    pub fn update_image_status(&mut self, id: &str, status: ImageStatus) -> Result<ImageRecord> {
        validate_image_id(id)?;
        let record = self
            .catalog
            .update_status(id, status, Utc::now())?
            .ok_or_else(|| image_not_found(id))?;
        debug!(collection = self.id(), image = id, %status, "status updated");
        Ok(record)
    }

    /// Remove an image: the catalog row first, then the original and the
    /// thumbnail.
    ///
    /// Files are removed last because their removal cannot be undone. If one
    /// of them cannot be removed, the row is already gone; the leftover file
    /// is logged for the operator and a storage error is returned.
    pub fn delete_image(&mut self, id: &str) -> Result<bool> {
        let record = self.get_image(id)?;
        let original = self.store.original_path(&record.id, record.format)?;
        let thumbnail = self.store.thumbnail_path(&record.id)?;

        if !self.catalog.delete_image(&record.id)? {
            return Err(image_not_found(id));
        }

        let mut failure = None;
        for path in [&original, &thumbnail] {
            if let Err(e) = remove_file_if_present(path) {
                warn!(
                    collection = self.id(),
                    image = id,
                    path = %path.display(),
                    error = %e,
                    "orphaned file left behind after image delete"
                );
                failure.get_or_insert(e);
            }
        }
        if let Some(e) = failure {
            return Err(Error::storage("unable to process file change", e));
        }

        info!(collection = self.id(), image = id, "image deleted");
        Ok(true)
    }
}
