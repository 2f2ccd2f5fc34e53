//! Shared application state handed to every handler.

use std::sync::Arc;

use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::IngestPipeline;

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt: JwtService,
    pub videos: Arc<dyn VideoRepository>,
    pub pipeline: Arc<IngestPipeline>,
}
