use std::path::Path;

/// Boxed cause carried by storage failures (filesystem, encoder, driver).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of every [`Error`], for callers that map failures
/// onto transport codes without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Duplicate,
    Processing,
    Storage,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{message}")]
    Processing {
        message: String,
        #[source]
        source: image::ImageError,
    },

    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("unable to create collection {id}: {source}")]
    Create {
        id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("unable to load collection {id}: {source}")]
    Load {
        id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("unable to delete collection {id}: {source}")]
    Delete {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to clear collections: {source}")]
    Clear {
        #[source]
        source: Box<Error>,
    },

    #[error("catalog schema version {db} is newer than supported version {code}")]
    SchemaTooNew { db: i64, code: i64 },

    #[error("catalog is corrupt: {0}")]
    CorruptCatalog(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Duplicate(_) => ErrorKind::Duplicate,
            Error::Processing { .. } => ErrorKind::Processing,
            Error::Storage { .. }
            | Error::Create { .. }
            | Error::Load { .. }
            | Error::Delete { .. }
            | Error::Clear { .. }
            | Error::Io(_) => ErrorKind::Storage,
            Error::SchemaTooNew { .. }
            | Error::CorruptCatalog(_)
            | Error::Config(_)
            | Error::Database(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn storage(message: &str, source: impl Into<BoxError>) -> Self {
        Error::Storage {
            message: message.to_string(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn not_a_file(path: &Path) -> Self {
        Error::Validation(format!("{} is not a file", path.display()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_registry_failures_report_storage_kind() {
        let cause = Error::storage("disk full", std::io::Error::other("ENOSPC"));
        let err = Error::Create {
            id: "c1".to_string(),
            source: Box::new(cause),
        };
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().starts_with("unable to create collection c1"));
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err = Error::from(rusqlite::Error::InvalidQuery);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_storage_keeps_cause_chain() {
        let err = Error::storage("unable to save image", std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "unable to save image");
        assert_eq!(err.source().unwrap().to_string(), "boom");
    }
}
