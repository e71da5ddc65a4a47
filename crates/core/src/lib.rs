//! Collection storage engine.
//!
//! A collection is a directory holding original images, their JPEG
//! thumbnails and a SQLite catalog describing them. [`CollectionRegistry`]
//! creates, opens and removes collections; a [`Collection`] handle ingests,
//! queries, re-labels and deletes images while keeping the files and the
//! catalog in agreement, even when an operation fails halfway.

pub mod catalog;
pub mod collection;
pub mod config;
pub mod domain;
pub mod error;
pub mod hasher;
pub mod registry;
pub mod rollback;
pub mod store;
pub mod thumbnail;

pub use collection::Collection;
pub use config::{StoreConfig, ThumbnailConfig};
pub use domain::{
    CollectionSummary, ImageFormat, ImageQuery, ImageRecord, ImageStatus, SortDirection,
    SortField,
};
pub use error::{Error, ErrorKind, Result};
pub use registry::CollectionRegistry;
