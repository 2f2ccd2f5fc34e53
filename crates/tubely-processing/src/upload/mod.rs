//! Upload orchestration

mod error;
mod pipeline;
mod types;

#[cfg(test)]
mod tests;

pub use error::IngestError;
pub use pipeline::IngestPipeline;
pub use types::{AuthorizedUpload, IngestSettings, IngestStage, UploadBody, UploadRequest};
