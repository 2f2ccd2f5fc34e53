//! Probe results for staged videos

use serde::{Deserialize, Serialize};
use tubely_core::Orientation;

/// Geometry and codec of a video's primary stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaProfile {
    pub orientation: Orientation,
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub width: i64,
    pub height: i64,
    pub display_aspect_ratio: Option<String>,
}

impl MediaProfile {
    pub fn new(codec_type: impl Into<String>, width: i64, height: i64) -> Self {
        Self {
            orientation: classify_orientation(width, height),
            codec_type: codec_type.into(),
            codec_name: None,
            width,
            height,
            display_aspect_ratio: None,
        }
    }
}

/// Classify a frame size as 16:9, 9:16 or anything else.
///
/// Uses truncating integer arithmetic, so only sizes whose long side equals
/// `16 * short / 9` exactly qualify. 854x480 is `Other`.
pub fn classify_orientation(width: i64, height: i64) -> Orientation {
    if width == 16 * height / 9 {
        Orientation::Landscape
    } else if height == 16 * width / 9 {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}
