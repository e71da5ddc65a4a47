use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Workflow state of an image. Any state may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageStatus {
    #[default]
    Inbox,
    Collection,
    Archive,
}

impl ImageStatus {
    pub const ALL: [ImageStatus; 3] = [
        ImageStatus::Inbox,
        ImageStatus::Collection,
        ImageStatus::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Inbox => "INBOX",
            ImageStatus::Collection => "COLLECTION",
            ImageStatus::Archive => "ARCHIVE",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ImageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INBOX" => Ok(ImageStatus::Inbox),
            "COLLECTION" => Ok(ImageStatus::Collection),
            "ARCHIVE" => Ok(ImageStatus::Archive),
            _ => Err(Error::Validation("invalid status value".to_string())),
        }
    }
}

/// Stored original formats. `jpeg` is folded into `jpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Map a file extension (case-insensitive) to a supported format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// One catalog row. The matching files live at
/// `images/original/<id>.<extension>` and `images/thumbnails/<id>.jpg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub collection_id: String,
    pub original_name: String,
    pub format: ImageFormat,
    pub size_bytes: u64,
    pub content_hash: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub status: ImageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortField {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created",
            SortField::UpdatedAt => "updated",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "created_at" => Ok(SortField::CreatedAt),
            "updated_at" => Ok(SortField::UpdatedAt),
            _ => Err(Error::Validation(format!("invalid sort field: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(Error::Validation(format!("invalid sort direction: {s}"))),
        }
    }
}

/// Filter and ordering for listing images. Defaults to every status,
/// most recently updated first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageQuery {
    pub status: Option<ImageStatus>,
    pub order_by: SortField,
    pub direction: SortDirection,
}

impl ImageQuery {
    pub fn with_status(status: ImageStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Build a query from untyped parameters, as received at an API boundary.
    pub fn parse(
        status: Option<&str>,
        order_by: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Self> {
        let status = status
            .map(|s| {
                s.parse::<ImageStatus>()
                    .map_err(|_| Error::Validation(format!("invalid status filter: {s}")))
            })
            .transpose()?;
        Ok(Self {
            status,
            order_by: order_by.map(str::parse::<SortField>).transpose()?.unwrap_or_default(),
            direction: direction.map(str::parse::<SortDirection>).transpose()?.unwrap_or_default(),
        })
    }
}

/// Per-status counts for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub total: usize,
    pub inbox: usize,
    pub collection: usize,
    pub archive: usize,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in ImageStatus::ALL {
            assert_eq!(status.as_str().parse::<ImageStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown_and_lowercase() {
        assert!(matches!(
            "DELETED".parse::<ImageStatus>(),
            Err(Error::Validation(msg)) if msg == "invalid status value"
        ));
        assert!("inbox".parse::<ImageStatus>().is_err());
    }

    #[test]
    fn test_jpeg_normalized_to_jpg() {
        assert_eq!(ImageFormat::from_extension("JPEG"), Some(ImageFormat::Jpg));
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(ImageFormat::Webp.mime_type(), "image/webp");
    }

    #[test]
    fn test_query_parse_defaults() {
        let q = ImageQuery::parse(None, None, None).unwrap();
        assert_eq!(q, ImageQuery::default());
        assert_eq!(q.order_by, SortField::UpdatedAt);
        assert_eq!(q.direction, SortDirection::Desc);
    }

    #[test]
    fn test_query_parse_values() {
        let q = ImageQuery::parse(Some("ARCHIVE"), Some("created_at"), Some("asc")).unwrap();
        assert_eq!(q.status, Some(ImageStatus::Archive));
        assert_eq!(q.order_by, SortField::CreatedAt);
        assert_eq!(q.direction, SortDirection::Asc);
    }

    #[test]
    fn test_query_parse_rejects_bad_values() {
        for (s, o, d) in [
            (Some("TRASH"), None, None),
            (None, Some("name"), None),
            (None, None, Some("sideways")),
        ] {
            let err = ImageQuery::parse(s, o, d).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        }
    }
}
