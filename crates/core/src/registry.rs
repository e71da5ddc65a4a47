//! Creation, lookup and removal of collections under one root directory.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::rollback::Rollback;
use crate::store::{validate_collection_id, CollectionStore};
use crate::thumbnail::ThumbnailGenerator;

fn collection_not_found(id: &str) -> Error {
    Error::NotFound(format!("collection not found: {id}"))
}

/// Entry point of the library. Several registries may coexist in a process,
/// each bound to its own root.
#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    config: StoreConfig,
}

impl CollectionRegistry {
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn open_handle(&self, store: CollectionStore, catalog: Catalog) -> Collection {
        Collection::new(
            store,
            catalog,
            ThumbnailGenerator::new(self.config.thumbnail),
        )
    }

    /// Create an empty collection: directory tree plus a fresh catalog.
    ///
    /// Fails with [`Error::Duplicate`] if `<root>/<id>` already exists. If any
    /// step after the directory was made fails, the whole directory is
    /// removed and [`Error::Create`] wraps the original cause.
    pub fn create(&self, id: &str) -> Result<Collection> {
        self.create_with(id, |store| Catalog::create(&store.catalog_path()))
    }

    fn create_with(
        &self,
        id: &str,
        init_catalog: impl FnOnce(&CollectionStore) -> Result<Catalog>,
    ) -> Result<Collection> {
        let store = CollectionStore::new(self.root(), id)?;
        let create_failed = |source: Error| Error::Create {
            id: id.to_string(),
            source: Box::new(source),
        };

        fs::create_dir_all(self.root()).map_err(|e| create_failed(e.into()))?;
        match fs::create_dir(store.dir()) {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(Error::Duplicate(format!("collection {id} already exists")));
            }
            Err(e) => return Err(create_failed(e.into())),
        }

        let mut rollback = Rollback::new("create_collection");
        rollback.push("remove collection directory", || {
            fs::remove_dir_all(store.dir())
        });

        let built = store
            .create_layout()
            .map_err(Error::from)
            .and_then(|()| init_catalog(&store));
        let catalog = match built {
            Ok(catalog) => catalog,
            Err(e) => {
                rollback.unwind();
                return Err(create_failed(e));
            }
        };
        rollback.commit();

        info!(collection = id, path = %store.dir().display(), "collection created");
        Ok(self.open_handle(store, catalog))
    }

    /// Open an existing collection and its catalog.
    pub fn load(&self, id: &str) -> Result<Collection> {
        let store = CollectionStore::new(self.root(), id)?;
        if !store.dir().is_dir() {
            return Err(collection_not_found(id));
        }
        let catalog = Catalog::open(&store.catalog_path()).map_err(|e| Error::Load {
            id: id.to_string(),
            source: Box::new(e),
        })?;
        debug!(collection = id, "collection loaded");
        Ok(self.open_handle(store, catalog))
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        let store = CollectionStore::new(self.root(), id)?;
        Ok(store.dir().is_dir())
    }

    /// Load `id`, run `f` on it and release the handle on every exit path.
    /// An error from `f` takes precedence over an error closing the catalog.
    pub fn with_collection<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Collection) -> Result<T>,
    ) -> Result<T> {
        let mut collection = self.load(id)?;
        let result = f(&mut collection);
        let closed = collection.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(collection = id, error = %close_err, "failed to close catalog");
                }
                Err(e)
            }
        }
    }

    /// Remove a collection directory and everything in it.
    ///
    /// A partial failure is reported as [`Error::Delete`]; whatever could not
    /// be removed stays on disk.
    pub fn delete(&self, id: &str) -> Result<()> {
        let store = CollectionStore::new(self.root(), id)?;
        if !store.dir().is_dir() {
            return Err(collection_not_found(id));
        }
        fs::remove_dir_all(store.dir()).map_err(|e| Error::Delete {
            id: id.to_string(),
            source: e,
        })?;
        info!(collection = id, "collection deleted");
        Ok(())
    }

    /// Names of all collections, sorted. A missing root has none.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if validate_collection_id(&name).is_ok() => ids.push(name),
                Ok(name) => debug!(name = %name, "skipping directory with invalid collection name"),
                Err(name) => debug!(name = ?name, "skipping non UTF-8 directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Delete every collection. Not transactional: on the first failure the
    /// collections already deleted stay deleted and [`Error::Clear`] is
    /// returned.
    pub fn clear(&self) -> Result<()> {
        self.clear_with(|id| self.delete(id))
    }

    fn clear_with(&self, mut delete: impl FnMut(&str) -> Result<()>) -> Result<()> {
        let clear_failed = |source: Error| Error::Clear {
            source: Box::new(source),
        };
        let ids = self.list().map_err(clear_failed)?;
        for id in &ids {
            delete(id).map_err(clear_failed)?;
        }
        info!(count = ids.len(), root = %self.root().display(), "collections cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn registry(tmp: &tempfile::TempDir) -> CollectionRegistry {
        CollectionRegistry::new(StoreConfig::with_root(tmp.path().join("collections"))).unwrap()
    }

    #[test]
    fn test_create_builds_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);

        let collection = registry.create("c1").unwrap();
        let dir = registry.root().join("c1");
        assert_eq!(collection.path(), dir);
        assert!(dir.join("collection.db").is_file());
        assert!(dir.join("images/original").is_dir());
        assert!(dir.join("images/thumbnails").is_dir());
    }

    #[test]
    fn test_create_validates_before_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);

        let err = registry.create("").err().unwrap();
        assert_eq!(err.to_string(), "name cannot be empty");
        let err = registry.create("bad name!").err().unwrap();
        assert_eq!(err.to_string(), "bad name! is not a valid name");
        assert!(!registry.root().exists());
    }

    #[test]
    fn test_create_twice_is_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);

        registry.create("x").unwrap();
        let err = registry.create("x").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(registry.list().unwrap(), vec!["x"]);
    }

    #[test]
    fn test_failed_create_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);

        let err = registry
            .create_with("c1", |store| {
                assert!(store.originals_dir().is_dir());
                assert!(store.thumbnails_dir().is_dir());
                fs::write(store.catalog_path(), b"half written").unwrap();
                Err(Error::CorruptCatalog("catalog init failed".to_string()))
            })
            .err()
            .unwrap();

        assert_eq!(err.kind(), ErrorKind::Storage);
        match err {
            Error::Create { id, source } => {
                assert_eq!(id, "c1");
                assert!(
                    matches!(*source, Error::CorruptCatalog(ref m) if m == "catalog init failed")
                );
            }
            other => panic!("expected Error::Create, got {other:?}"),
        }
        assert!(!registry.root().join("c1").exists());
        assert!(registry.list().unwrap().is_empty());

        registry.create("c1").unwrap();
        assert_eq!(registry.list().unwrap(), vec!["c1"]);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        let err = registry.load("ghost").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_load_without_catalog_is_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        fs::create_dir_all(registry.root().join("bare")).unwrap();

        let err = registry.load("bare").err().unwrap();
        assert!(matches!(err, Error::Load { ref id, .. } if id == "bare"));
        assert!(!registry.root().join("bare/collection.db").exists());
    }

    #[test]
    fn test_load_corrupt_catalog_is_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        registry.create("c1").unwrap().close().unwrap();
        fs::write(
            registry.root().join("c1/collection.db"),
            b"garbage garbage garbage garbage garbage",
        )
        .unwrap();

        let err = registry.load("c1").err().unwrap();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_list_sorted_and_ignores_files() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        assert!(registry.list().unwrap().is_empty());

        for id in ["zeta", "alpha", "Mid"] {
            registry.create(id).unwrap();
        }
        fs::write(registry.root().join("stray.txt"), b"x").unwrap();

        assert_eq!(registry.list().unwrap(), vec!["Mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_delete_and_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        registry.create("c1").unwrap();
        assert!(registry.exists("c1").unwrap());

        registry.delete("c1").unwrap();
        assert!(!registry.exists("c1").unwrap());
        assert_eq!(
            registry.delete("c1").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            registry.delete("../c1").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_clear_removes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        for id in ["a", "b", "c"] {
            registry.create(id).unwrap();
        }
        registry.clear().unwrap();
        assert!(registry.list().unwrap().is_empty());
        registry.clear().unwrap();
    }

    #[test]
    fn test_clear_stops_at_first_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        for id in ["a", "b", "c"] {
            registry.create(id).unwrap();
        }

        let err = registry
            .clear_with(|id| {
                if id == "b" {
                    return Err(Error::Delete {
                        id: id.to_string(),
                        source: std::io::Error::other("device busy"),
                    });
                }
                registry.delete(id)
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        match err {
            Error::Clear { source } => {
                assert!(matches!(*source, Error::Delete { ref id, .. } if id == "b"));
            }
            other => panic!("expected Error::Clear, got {other:?}"),
        }
        assert_eq!(registry.list().unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn test_clear_with_unreadable_root_is_clear_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("collections");
        fs::write(&root, b"not a directory").unwrap();
        let registry = CollectionRegistry::new(StoreConfig::with_root(&root)).unwrap();

        let err = registry.clear().unwrap_err();
        assert!(matches!(err, Error::Clear { .. }));
        assert!(root.is_file());
    }

    #[test]
    fn test_with_collection_closes_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry(&tmp);
        registry.create("c1").unwrap();

        let id = registry
            .with_collection("c1", |c| Ok(c.id().to_string()))
            .unwrap();
        assert_eq!(id, "c1");

        let err = registry
            .with_collection("c1", |_| -> Result<()> {
                Err(Error::Validation("stop".to_string()))
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "stop");
    }

    #[test]
    fn test_registries_are_independent() {
        let tmp_a = tempfile::tempdir().unwrap();
        let tmp_b = tempfile::tempdir().unwrap();
        let a = registry(&tmp_a);
        let b = registry(&tmp_b);

        a.create("shared").unwrap();
        assert!(b.list().unwrap().is_empty());
        b.create("shared").unwrap();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = StoreConfig::with_root("/tmp/x");
        config.thumbnail.max_dimension = 0;
        assert!(CollectionRegistry::new(config).is_err());
    }
}
