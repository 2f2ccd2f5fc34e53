//! Constants shared across crates.

/// Content types accepted for thumbnails, matched against sniffed bytes.
pub const THUMBNAIL_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// Content types accepted for videos, matched against sniffed bytes.
pub const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4"];

/// Number of random bytes behind every storage key (256 bits).
pub const STORAGE_KEY_ENTROPY_BYTES: usize = 32;

/// Bytes inspected when sniffing an upload's content type.
pub const SNIFF_WINDOW_BYTES: usize = 512;

/// Key namespace for landscape videos.
pub const LANDSCAPE_PREFIX: &str = "landscape/";
/// Key namespace for portrait videos.
pub const PORTRAIT_PREFIX: &str = "portrait/";
/// Key namespace for everything that is not exactly 16:9 or 9:16.
pub const OTHER_PREFIX: &str = "other/";
