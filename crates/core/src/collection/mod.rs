//! An open collection: its directory layout plus a live catalog connection.

mod ingest;
mod manage;

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::domain::{CollectionSummary, ImageRecord};
use crate::error::Result;
use crate::store::CollectionStore;
use crate::thumbnail::ThumbnailGenerator;

/// Handle to one collection, obtained from
/// [`crate::CollectionRegistry::create`] or [`crate::CollectionRegistry::load`].
///
/// The handle owns the catalog connection. Dropping it releases the
/// connection; [`Collection::close`] does the same but reports close errors.
/// Calls on one handle must be serialized by the caller.
pub struct Collection {
    store: CollectionStore,
    catalog: Catalog,
    thumbnails: ThumbnailGenerator,
}

impl Collection {
    pub(crate) fn new(
        store: CollectionStore,
        catalog: Catalog,
        thumbnails: ThumbnailGenerator,
    ) -> Self {
        Self {
            store,
            catalog,
            thumbnails,
        }
    }

    pub fn id(&self) -> &str {
        self.store.id()
    }

    /// The collection directory, `<root>/<id>`.
    pub fn path(&self) -> &Path {
        self.store.dir()
    }

    /// Where the original file of `record` is stored.
    pub fn original_path(&self, record: &ImageRecord) -> Result<PathBuf> {
        self.store.original_path(&record.id, record.format)
    }

    /// Where the thumbnail of `record` is stored.
    pub fn thumbnail_path(&self, record: &ImageRecord) -> Result<PathBuf> {
        self.store.thumbnail_path(&record.id)
    }

    pub fn summary(&self) -> Result<CollectionSummary> {
        self.catalog.summary()
    }

    /// Release the catalog connection.
    pub fn close(self) -> Result<()> {
        self.catalog.close()
    }
}
