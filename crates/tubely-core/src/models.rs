//! Domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::{
    LANDSCAPE_PREFIX, OTHER_PREFIX, PORTRAIT_PREFIX, THUMBNAIL_CONTENT_TYPES, VIDEO_CONTENT_TYPES,
};

/// A video record owned by a single user.
///
/// `thumbnail_url` and `video_url` are only ever set after the referenced
/// object has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Which media pointer an upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Thumbnail,
    Video,
}

impl MediaKind {
    /// Sniffed content types accepted for this kind.
    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Thumbnail => THUMBNAIL_CONTENT_TYPES,
            MediaKind::Video => VIDEO_CONTENT_TYPES,
        }
    }

    /// Multipart field carrying the file.
    pub fn form_field(&self) -> &'static str {
        match self {
            MediaKind::Thumbnail => "thumbnail",
            MediaKind::Video => "video",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Thumbnail => write!(f, "thumbnail"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Geometry class of a video's primary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Storage key namespace, including the trailing slash.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Orientation::Landscape => LANDSCAPE_PREFIX,
            Orientation::Portrait => PORTRAIT_PREFIX,
            Orientation::Other => OTHER_PREFIX,
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Orientation::Landscape => write!(f, "landscape"),
            Orientation::Portrait => write!(f, "portrait"),
            Orientation::Other => write!(f, "other"),
        }
    }
}
