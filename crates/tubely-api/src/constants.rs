//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Route serving the local storage backend's files
pub const ASSETS_ROUTE: &str = "/assets";

/// Allowance on top of the payload cap for multipart framing and other fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// `iss` claim of access tokens
pub const JWT_ISSUER: &str = "tubely-access";
