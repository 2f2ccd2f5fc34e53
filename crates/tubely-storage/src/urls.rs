//! Public URL construction for stored media.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::traits::StoredObject;

/// How a stored object's public URL is formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicUrlFormat {
    /// `{distribution}/{key}` behind a CDN
    Cdn { distribution: String },
    /// The backend's own URL for the object
    Direct,
}

impl PublicUrlFormat {
    pub fn from_distribution(distribution: Option<&str>) -> Self {
        match distribution {
            Some(base) => PublicUrlFormat::Cdn {
                distribution: base.to_string(),
            },
            None => PublicUrlFormat::Direct,
        }
    }

    pub fn object_url(&self, stored: &StoredObject) -> String {
        match self {
            PublicUrlFormat::Cdn { distribution } => {
                if distribution.ends_with('/') {
                    format!("{}{}", distribution, stored.key)
                } else {
                    format!("{}/{}", distribution, stored.key)
                }
            }
            PublicUrlFormat::Direct => stored.url.clone(),
        }
    }
}

/// `data:` URL embedding the payload. Only meant for small images.
pub fn inline_data_url(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}
